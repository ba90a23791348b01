//! Runtime class and value model
//!
//! Mirrors what a reflective host can tell us about its objects: classes with
//! a superclass chain, implemented interfaces, fields and methods, plus the
//! dynamically typed values read from or written to them.

use crate::IntrospectError;
use std::fmt;
use std::sync::Arc;

/// Identity of a runtime class (its fully qualified name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(String);

impl ClassId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name without the package path or outer class
    pub fn simple_name(&self) -> &str {
        self.0.rsplit(['.', '$']).next().unwrap_or(&self.0)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClassId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Declared type of a field, parameter or return value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Void,
    Bool,
    Int,
    Long,
    Float,
    Double,
    Char,
    Text,
    Object(ClassId),
}

impl TypeRef {
    pub fn object(name: &str) -> Self {
        TypeRef::Object(ClassId::new(name))
    }

    /// Primitive types cannot carry an object payload
    pub fn is_primitive(&self) -> bool {
        !matches!(self, TypeRef::Text | TypeRef::Object(_))
    }

    /// Value a freshly constructed instance holds for this type
    pub fn default_value(&self) -> Value {
        match self {
            TypeRef::Void | TypeRef::Text | TypeRef::Object(_) => Value::Null,
            TypeRef::Bool => Value::Bool(false),
            TypeRef::Int => Value::Int(0),
            TypeRef::Long => Value::Long(0),
            TypeRef::Float => Value::Float(0.0),
            TypeRef::Double => Value::Double(0.0),
            TypeRef::Char => Value::Char('\0'),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Void => f.write_str("void"),
            TypeRef::Bool => f.write_str("boolean"),
            TypeRef::Int => f.write_str("int"),
            TypeRef::Long => f.write_str("long"),
            TypeRef::Float => f.write_str("float"),
            TypeRef::Double => f.write_str("double"),
            TypeRef::Char => f.write_str("char"),
            TypeRef::Text => f.write_str("String"),
            TypeRef::Object(id) => f.write_str(id.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    pub name: String,
    pub ty: TypeRef,
    /// Class that declares the field
    pub declaring: ClassId,
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    pub name: String,
    pub params: Vec<TypeRef>,
    pub ret: TypeRef,
    /// Class that declares the method
    pub declaring: ClassId,
    pub is_static: bool,
    pub is_public: bool,
}

impl MethodDescriptor {
    /// Same name and parameter list, i.e. one overrides the other
    pub fn same_signature(&self, other: &MethodDescriptor) -> bool {
        self.name == other.name && self.params == other.params
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_public {
            f.write_str("public ")?;
        }
        if self.is_static {
            f.write_str("static ")?;
        }
        write!(f, "{} {}.{}(", self.ret, self.declaring, self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        f.write_str(")")
    }
}

/// Shape of one runtime class
#[derive(Debug, Clone)]
pub struct ClassDescriptor {
    pub id: ClassId,
    pub superclass: Option<Arc<ClassDescriptor>>,
    pub interfaces: Vec<Arc<ClassDescriptor>>,
    /// Fields declared by this class only
    pub fields: Vec<FieldDescriptor>,
    /// Methods declared by this class only
    pub methods: Vec<MethodDescriptor>,
    /// Universal base class every object inherits from. Its members are
    /// never candidates for discovery.
    pub is_base: bool,
}

impl ClassDescriptor {
    /// This class followed by its ancestors, stopping before the base class
    pub fn lineage(&self) -> Lineage<'_> {
        Lineage { next: Some(self) }
    }

    pub fn declared_methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    /// Public methods visible on an instance, most derived first, including
    /// inherited and interface methods. Overridden methods appear once.
    pub fn public_methods(&self) -> Vec<&MethodDescriptor> {
        fn push_unique<'a>(out: &mut Vec<&'a MethodDescriptor>, method: &'a MethodDescriptor) {
            if !out.iter().any(|seen| seen.same_signature(method)) {
                out.push(method);
            }
        }

        let mut out: Vec<&MethodDescriptor> = Vec::new();
        let mut current = Some(self);
        while let Some(class) = current {
            for method in class.methods.iter().filter(|m| m.is_public) {
                push_unique(&mut out, method);
            }
            current = class.superclass.as_deref();
        }

        for iface in self.all_interfaces() {
            for method in iface.methods.iter().filter(|m| m.is_public) {
                push_unique(&mut out, method);
            }
        }

        out
    }

    /// Non-static fields from this class upward through its ancestors
    pub fn instance_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.lineage()
            .flat_map(|class| class.fields.iter())
            .filter(|field| !field.is_static)
    }

    /// Interfaces implemented by this class or any ancestor, transitively
    pub fn all_interfaces(&self) -> Vec<&ClassDescriptor> {
        let mut out: Vec<&ClassDescriptor> = Vec::new();
        let mut stack: Vec<&ClassDescriptor> = Vec::new();

        let mut current = Some(self);
        while let Some(class) = current {
            stack.extend(class.interfaces.iter().map(|i| i.as_ref()));
            current = class.superclass.as_deref();
        }

        while let Some(iface) = stack.pop() {
            if out.iter().any(|seen| seen.id == iface.id) {
                continue;
            }
            stack.extend(iface.interfaces.iter().map(|i| i.as_ref()));
            out.push(iface);
        }

        out
    }

    /// Locate a class by id among this class, its ancestors and interfaces
    pub fn find_in_hierarchy(&self, id: &ClassId) -> Option<&ClassDescriptor> {
        let mut current = Some(self);
        while let Some(class) = current {
            if &class.id == id {
                return Some(class);
            }
            current = class.superclass.as_deref();
        }
        self.all_interfaces().into_iter().find(|iface| &iface.id == id)
    }

    /// True when `id` names this class or one of its supertypes
    pub fn is_a(&self, id: &ClassId) -> bool {
        self.find_in_hierarchy(id).is_some()
    }

    /// True when the member was declared by the universal base class
    pub fn declared_by_base(&self, declaring: &ClassId) -> bool {
        self.find_in_hierarchy(declaring)
            .map(|class| class.is_base)
            .unwrap_or(false)
    }

    /// Any field, static or not, visible from this class
    pub fn field_named(&self, name: &str) -> Option<&FieldDescriptor> {
        let mut current = Some(self);
        while let Some(class) = current {
            if let Some(field) = class.fields.iter().find(|f| f.name == name) {
                return Some(field);
            }
            current = class.superclass.as_deref();
        }
        None
    }
}

pub struct Lineage<'a> {
    next: Option<&'a ClassDescriptor>,
}

impl<'a> Iterator for Lineage<'a> {
    type Item = &'a ClassDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        if current.is_base {
            return None;
        }
        self.next = current.superclass.as_deref();
        Some(current)
    }
}

/// Dynamically typed value read from or written to an opaque object
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(char),
    Text(String),
    /// Non-null object reference, described by its runtime class
    Object(Arc<ClassDescriptor>),
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Arc<ClassDescriptor>> {
        match self {
            Value::Object(class) => Some(class),
            _ => None,
        }
    }

    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => TypeRef::Bool.to_string(),
            Value::Int(_) => TypeRef::Int.to_string(),
            Value::Long(_) => TypeRef::Long.to_string(),
            Value::Float(_) => TypeRef::Float.to_string(),
            Value::Double(_) => TypeRef::Double.to_string(),
            Value::Char(_) => TypeRef::Char.to_string(),
            Value::Text(_) => TypeRef::Text.to_string(),
            Value::Object(class) => class.id.to_string(),
        }
    }

    /// Whether this value may be stored in a slot of type `ty`
    pub fn conforms_to(&self, ty: &TypeRef) -> bool {
        match (self, ty) {
            (Value::Null, TypeRef::Text | TypeRef::Object(_)) => true,
            (Value::Bool(_), TypeRef::Bool)
            | (Value::Int(_), TypeRef::Int)
            | (Value::Long(_), TypeRef::Long)
            | (Value::Float(_), TypeRef::Float)
            | (Value::Double(_), TypeRef::Double)
            | (Value::Char(_), TypeRef::Char)
            | (Value::Text(_), TypeRef::Text) => true,
            (Value::Object(class), TypeRef::Object(id)) => class.is_a(id),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.id == b.id,
            _ => false,
        }
    }
}

/// An instance living in the host's object graph
///
/// Implementations must never panic on unknown members; they report
/// [`IntrospectError`] instead so callers can degrade.
pub trait OpaqueObject {
    /// Runtime class of this instance
    fn class(&self) -> Arc<ClassDescriptor>;

    fn get(&self, field: &FieldDescriptor) -> Result<Value, IntrospectError>;

    fn set(&mut self, field: &FieldDescriptor, value: Value) -> Result<(), IntrospectError>;

    fn invoke(
        &mut self,
        method: &MethodDescriptor,
        args: &[Value],
    ) -> Result<Value, IntrospectError>;

    /// Mutable access to the object referenced by an object-typed field
    fn child_mut(&mut self, field: &FieldDescriptor) -> Option<&mut dyn OpaqueObject>;
}
