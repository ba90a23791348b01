//! In-memory classes and objects implementing [`OpaqueObject`]
//!
//! Embedders without a reflective runtime, and tests, describe classes with
//! [`ClassBuilder`] and instantiate them as [`DynObject`]s. Method behavior is
//! supplied as closures over the instance's field slots.

use crate::model::{
    ClassDescriptor, ClassId, FieldDescriptor, MethodDescriptor, OpaqueObject, TypeRef, Value,
};
use crate::IntrospectError;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub type MethodBody =
    Arc<dyn Fn(&mut Slots, &[Value]) -> Result<Value, IntrospectError> + Send + Sync>;

type SignatureKey = (String, Vec<TypeRef>);

/// Field storage of one instance, keyed by field name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Slots {
    values: HashMap<String, Value>,
}

impl Slots {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_text)
    }

    pub fn int(&self, name: &str) -> Option<i32> {
        self.get(name).and_then(Value::as_int)
    }
}

pub struct ClassBuilder {
    id: ClassId,
    parent: Option<Arc<DynClass>>,
    interfaces: Vec<Arc<ClassDescriptor>>,
    fields: Vec<FieldDescriptor>,
    methods: Vec<MethodDescriptor>,
    bodies: HashMap<SignatureKey, MethodBody>,
    is_base: bool,
}

impl ClassBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: ClassId::new(id.into()),
            parent: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            bodies: HashMap::new(),
            is_base: false,
        }
    }

    /// Mark this class as the universal base class
    pub fn base(mut self) -> Self {
        self.is_base = true;
        self
    }

    pub fn extends(mut self, parent: &Arc<DynClass>) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    pub fn implements(mut self, iface: &Arc<DynClass>) -> Self {
        self.interfaces.push(iface.descriptor.clone());
        self
    }

    pub fn field(self, name: &str, ty: TypeRef) -> Self {
        self.add_field(name, ty, false)
    }

    pub fn static_field(self, name: &str, ty: TypeRef) -> Self {
        self.add_field(name, ty, true)
    }

    /// Public instance method with behavior
    pub fn method<F>(self, name: &str, params: &[TypeRef], ret: TypeRef, body: F) -> Self
    where
        F: Fn(&mut Slots, &[Value]) -> Result<Value, IntrospectError> + Send + Sync + 'static,
    {
        self.add_method(name, params, ret, true, Some(Arc::new(body)))
    }

    /// Non-public instance method with behavior
    pub fn private_method<F>(self, name: &str, params: &[TypeRef], ret: TypeRef, body: F) -> Self
    where
        F: Fn(&mut Slots, &[Value]) -> Result<Value, IntrospectError> + Send + Sync + 'static,
    {
        self.add_method(name, params, ret, false, Some(Arc::new(body)))
    }

    /// Public method without behavior; invoking it yields the return type's default
    pub fn signature(self, name: &str, params: &[TypeRef], ret: TypeRef) -> Self {
        self.add_method(name, params, ret, true, None)
    }

    pub fn build(self) -> Arc<DynClass> {
        let descriptor = ClassDescriptor {
            id: self.id,
            superclass: self.parent.as_ref().map(|p| p.descriptor.clone()),
            interfaces: self.interfaces,
            fields: self.fields,
            methods: self.methods,
            is_base: self.is_base,
        };
        Arc::new(DynClass {
            descriptor: Arc::new(descriptor),
            parent: self.parent,
            bodies: self.bodies,
        })
    }

    fn add_field(mut self, name: &str, ty: TypeRef, is_static: bool) -> Self {
        self.fields.push(FieldDescriptor {
            name: name.to_string(),
            ty,
            declaring: self.id.clone(),
            is_static,
        });
        self
    }

    fn add_method(
        mut self,
        name: &str,
        params: &[TypeRef],
        ret: TypeRef,
        is_public: bool,
        body: Option<MethodBody>,
    ) -> Self {
        self.methods.push(MethodDescriptor {
            name: name.to_string(),
            params: params.to_vec(),
            ret,
            declaring: self.id.clone(),
            is_static: false,
            is_public,
        });
        if let Some(body) = body {
            self.bodies.insert((name.to_string(), params.to_vec()), body);
        }
        self
    }
}

pub struct DynClass {
    descriptor: Arc<ClassDescriptor>,
    parent: Option<Arc<DynClass>>,
    bodies: HashMap<SignatureKey, MethodBody>,
}

impl DynClass {
    pub fn descriptor(&self) -> &Arc<ClassDescriptor> {
        &self.descriptor
    }

    pub fn id(&self) -> &ClassId {
        &self.descriptor.id
    }

    /// Most derived body for the signature
    fn body(&self, method: &MethodDescriptor) -> Option<&MethodBody> {
        let key = (method.name.clone(), method.params.clone());
        let mut current = Some(self);
        while let Some(class) = current {
            if let Some(body) = class.bodies.get(&key) {
                return Some(body);
            }
            current = class.parent.as_deref();
        }
        None
    }

    fn declares(&self, method: &MethodDescriptor) -> bool {
        let class = &self.descriptor;
        let mut current = Some(class.as_ref());
        while let Some(c) = current {
            if c.methods.iter().any(|m| m.same_signature(method)) {
                return true;
            }
            current = c.superclass.as_deref();
        }
        class
            .all_interfaces()
            .iter()
            .any(|iface| iface.methods.iter().any(|m| m.same_signature(method)))
    }
}

impl fmt::Debug for DynClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynClass")
            .field("id", &self.descriptor.id)
            .field("bodies", &self.bodies.len())
            .finish()
    }
}

#[derive(Debug)]
pub struct DynObject {
    class: Arc<DynClass>,
    slots: Slots,
    children: HashMap<String, DynObject>,
}

impl DynObject {
    /// New instance with every field at its type's default
    pub fn new(class: &Arc<DynClass>) -> Self {
        let mut slots = Slots::default();
        let mut current = Some(class.descriptor.as_ref());
        while let Some(c) = current {
            for field in &c.fields {
                if slots.get(&field.name).is_none() {
                    slots.set(field.name.clone(), field.ty.default_value());
                }
            }
            current = c.superclass.as_deref();
        }
        Self {
            class: class.clone(),
            slots,
            children: HashMap::new(),
        }
    }

    /// Builder-style slot initialization
    pub fn with(mut self, name: &str, value: Value) -> Self {
        self.slots.set(name, value);
        self
    }

    /// Store `child` in an object-typed field
    pub fn with_child(mut self, name: &str, child: DynObject) -> Self {
        self.slots
            .set(name, Value::Object(child.class.descriptor.clone()));
        self.children.insert(name.to_string(), child);
        self
    }

    pub fn dyn_class(&self) -> &Arc<DynClass> {
        &self.class
    }

    pub fn slots(&self) -> &Slots {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut Slots {
        &mut self.slots
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.slots.text(name)
    }

    pub fn int(&self, name: &str) -> Option<i32> {
        self.slots.int(name)
    }

    pub fn child(&self, name: &str) -> Option<&DynObject> {
        self.children.get(name)
    }

    pub fn child_named_mut(&mut self, name: &str) -> Option<&mut DynObject> {
        self.children.get_mut(name)
    }

    fn check_field(&self, field: &FieldDescriptor) -> Result<(), IntrospectError> {
        match self.class.descriptor.field_named(&field.name) {
            Some(declared) if declared.ty == field.ty => Ok(()),
            _ => Err(IntrospectError::NoSuchField {
                class: self.class.descriptor.id.clone(),
                field: field.name.clone(),
            }),
        }
    }
}

impl OpaqueObject for DynObject {
    fn class(&self) -> Arc<ClassDescriptor> {
        self.class.descriptor.clone()
    }

    fn get(&self, field: &FieldDescriptor) -> Result<Value, IntrospectError> {
        self.check_field(field)?;
        Ok(self
            .slots
            .get(&field.name)
            .cloned()
            .unwrap_or_else(|| field.ty.default_value()))
    }

    fn set(&mut self, field: &FieldDescriptor, value: Value) -> Result<(), IntrospectError> {
        self.check_field(field)?;
        if !value.conforms_to(&field.ty) {
            return Err(IntrospectError::TypeMismatch {
                member: field.name.clone(),
                expected: field.ty.to_string(),
                actual: value.type_name(),
            });
        }
        if matches!(value, Value::Null) {
            self.children.remove(&field.name);
        }
        self.slots.set(field.name.clone(), value);
        Ok(())
    }

    fn invoke(
        &mut self,
        method: &MethodDescriptor,
        args: &[Value],
    ) -> Result<Value, IntrospectError> {
        if !self.class.declares(method) {
            return Err(IntrospectError::NoSuchMethod {
                class: self.class.descriptor.id.clone(),
                method: method.name.clone(),
            });
        }
        if args.len() != method.params.len()
            || !args.iter().zip(&method.params).all(|(a, p)| a.conforms_to(p))
        {
            return Err(IntrospectError::InvocationFailed {
                method: method.name.clone(),
                reason: "argument mismatch".to_string(),
            });
        }

        match self.class.body(method).cloned() {
            Some(body) => body(&mut self.slots, args),
            None => Ok(method.ret.default_value()),
        }
    }

    fn child_mut(&mut self, field: &FieldDescriptor) -> Option<&mut dyn OpaqueObject> {
        self.children
            .get_mut(&field.name)
            .map(|child| child as &mut dyn OpaqueObject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> Arc<DynClass> {
        ClassBuilder::new("Counter")
            .field("count", TypeRef::Int)
            .method("bump", &[TypeRef::Int], TypeRef::Int, |slots, args| {
                let next = slots.int("count").unwrap_or(0) + args[0].as_int().unwrap_or(0);
                slots.set("count", Value::Int(next));
                Ok(Value::Int(next))
            })
            .signature("reset", &[], TypeRef::Void)
            .build()
    }

    fn method(class: &Arc<DynClass>, name: &str) -> MethodDescriptor {
        class
            .descriptor()
            .methods
            .iter()
            .find(|m| m.name == name)
            .cloned()
            .unwrap()
    }

    #[test]
    fn invoke_runs_body_against_slots() {
        let class = counter();
        let mut obj = DynObject::new(&class);
        let bump = method(&class, "bump");

        assert_eq!(obj.invoke(&bump, &[Value::Int(2)]).unwrap(), Value::Int(2));
        assert_eq!(obj.invoke(&bump, &[Value::Int(3)]).unwrap(), Value::Int(5));
        assert_eq!(obj.int("count"), Some(5));
    }

    #[test]
    fn bodyless_signature_returns_default() {
        let class = counter();
        let mut obj = DynObject::new(&class);
        let reset = method(&class, "reset");
        assert_eq!(obj.invoke(&reset, &[]).unwrap(), Value::Null);
    }

    #[test]
    fn argument_mismatch_is_reported() {
        let class = counter();
        let mut obj = DynObject::new(&class);
        let bump = method(&class, "bump");
        let err = obj.invoke(&bump, &[Value::Text("x".into())]).unwrap_err();
        assert!(matches!(err, IntrospectError::InvocationFailed { .. }));
    }

    #[test]
    fn set_rejects_wrong_type() {
        let class = counter();
        let mut obj = DynObject::new(&class);
        let field = class.descriptor().fields[0].clone();
        let err = obj.set(&field, Value::Bool(true)).unwrap_err();
        assert!(matches!(err, IntrospectError::TypeMismatch { .. }));
        assert_eq!(obj.int("count"), Some(0));
    }

    #[test]
    fn subclass_overrides_parent_body() {
        let parent = counter();
        let child = ClassBuilder::new("DoubleCounter")
            .extends(&parent)
            .method("bump", &[TypeRef::Int], TypeRef::Int, |slots, args| {
                let next = slots.int("count").unwrap_or(0) + 2 * args[0].as_int().unwrap_or(0);
                slots.set("count", Value::Int(next));
                Ok(Value::Int(next))
            })
            .build();
        let mut obj = DynObject::new(&child);
        let bump = method(&parent, "bump");
        assert_eq!(obj.invoke(&bump, &[Value::Int(4)]).unwrap(), Value::Int(8));
    }
}
