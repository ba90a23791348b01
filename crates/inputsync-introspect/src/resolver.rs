//! Cached capability resolution
//!
//! Resolution results are memoized per (class, capability). A negative result
//! is cached too, so a missing capability costs one scan per class rather than
//! one per call. Results for one class are never consulted for another.

use crate::capability::{Accessor, Capability, PackedHandler, Resolved};
use crate::model::{ClassId, FieldDescriptor, OpaqueObject, Value};
use crate::strategy::{strategies_for, Probe};
use crate::IntrospectError;
use std::collections::HashMap;
use tracing::debug;

/// How a text write was carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextWrite {
    Setter,
    Field,
}

#[derive(Debug, Default)]
pub struct StructuralResolver {
    cache: HashMap<ClassId, HashMap<Capability, Option<Resolved>>>,
    scans: u64,
}

impl StructuralResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a capability on the object's class, scanning on first use
    pub fn resolve(
        &mut self,
        object: &dyn OpaqueObject,
        capability: &Capability,
    ) -> Option<Resolved> {
        let class = object.class();
        if let Some(entry) = self
            .cache
            .get(&class.id)
            .and_then(|per_class| per_class.get(capability))
        {
            return entry.clone();
        }

        self.scans += 1;
        let probe = Probe {
            class: &class,
            instance: object,
        };
        let found = strategies_for(capability).iter().find_map(|strategy| {
            (strategy.probe)(&probe, capability).map(|accessor| Resolved {
                accessor,
                strategy: strategy.name,
            })
        });

        match &found {
            Some(resolved) => debug!(
                "Resolved {} on {} via {}",
                capability, class.id, resolved.strategy
            ),
            None => debug!("No {} on {}", capability, class.id),
        }

        self.cache
            .entry(class.id.clone())
            .or_default()
            .insert(capability.clone(), found.clone());
        found
    }

    /// Like [`resolve`](Self::resolve) but absence is an error
    pub fn require(
        &mut self,
        object: &dyn OpaqueObject,
        capability: &Capability,
    ) -> Result<Resolved, IntrospectError> {
        self.resolve(object, capability)
            .ok_or_else(|| IntrospectError::Unsupported {
                class: object.class().id.clone(),
                capability: capability.clone(),
            })
    }

    /// Number of strategy-chain runs so far (cache misses)
    pub fn scans(&self) -> u64 {
        self.scans
    }

    /// Cached outcome, if this capability was ever resolved for the class
    pub fn cached(&self, class: &ClassId, capability: &Capability) -> Option<&Option<Resolved>> {
        self.cache.get(class).and_then(|per_class| per_class.get(capability))
    }

    /// Drop everything learned about one class
    pub fn forget_class(&mut self, class: &ClassId) {
        self.cache.remove(class);
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Current text content, through an accessor method or the buffer field
    pub fn read_text(&mut self, object: &mut dyn OpaqueObject) -> Result<String, IntrospectError> {
        if let Some(Resolved {
            accessor: Accessor::Method(getter),
            ..
        }) = self.resolve(object, &Capability::ReadableText)
        {
            if let Value::Text(text) = object.invoke(&getter, &[])? {
                return Ok(text);
            }
        }

        let field = self.require_field(object, &Capability::TextValueField)?;
        match object.get(&field)? {
            Value::Text(text) => Ok(text),
            Value::Null => Ok(String::new()),
            other => Err(IntrospectError::TypeMismatch {
                member: field.name,
                expected: "String".to_string(),
                actual: other.type_name(),
            }),
        }
    }

    /// Replace the whole text content. Never appends.
    pub fn write_text(
        &mut self,
        object: &mut dyn OpaqueObject,
        text: &str,
    ) -> Result<TextWrite, IntrospectError> {
        let resolved = self.require(object, &Capability::WritableText)?;
        match resolved.accessor {
            Accessor::Method(setter) => {
                object.invoke(&setter, &[Value::Text(text.to_string())])?;
                Ok(TextWrite::Setter)
            }
            Accessor::Field(field) => {
                object.set(&field, Value::Text(text.to_string()))?;
                Ok(TextWrite::Field)
            }
            _ => Err(self.unsupported(object, Capability::WritableText)),
        }
    }

    /// Move caret and selection to `position` through real mutators only.
    /// Returns how many mutators were invoked; zero when none exist.
    pub fn place_cursor(
        &mut self,
        object: &mut dyn OpaqueObject,
        position: i32,
    ) -> Result<usize, IntrospectError> {
        let Some(resolved) = self.resolve(object, &Capability::CursorPlacement) else {
            return Ok(0);
        };
        let Accessor::Methods(methods) = resolved.accessor else {
            return Ok(0);
        };
        for method in &methods {
            object.invoke(method, &[Value::Int(position)])?;
        }
        Ok(methods.len())
    }

    /// Read an int capability. Bounded ints outside their range read as `None`.
    pub fn read_int(&mut self, object: &dyn OpaqueObject, capability: &Capability) -> Option<i32> {
        let field = self.require_field(object, capability).ok()?;
        let value = object.get(&field).ok()?.as_int()?;
        match capability.int_range() {
            Some(range) if !range.contains(&value) => None,
            _ => Some(value),
        }
    }

    /// Write an int capability, clamping into the capability's range.
    /// Returns the value actually written.
    pub fn write_int(
        &mut self,
        object: &mut dyn OpaqueObject,
        capability: &Capability,
        value: i32,
    ) -> Result<i32, IntrospectError> {
        let field = self.require_field(object, capability)?;
        let value = match capability.int_range() {
            Some(range) => value.clamp(*range.start(), *range.end()),
            None => value,
        };
        object.set(&field, Value::Int(value))?;
        Ok(value)
    }

    /// Current values of the first two in-range int fields, as (x, y)
    pub fn int_pair(&mut self, object: &dyn OpaqueObject, capability: &Capability) -> Option<(i32, i32)> {
        let Accessor::FieldPair { x, y } = self.resolve(object, capability)?.accessor else {
            return None;
        };
        let x = object.get(&x).ok()?.as_int()?;
        let y = object.get(&y).ok()?.as_int()?;
        Some((x, y))
    }

    pub fn typed_field(&mut self, object: &dyn OpaqueObject, marker: &str) -> Option<FieldDescriptor> {
        self.require_field(object, &Capability::typed_field(marker)).ok()
    }

    pub fn text_widget(&mut self, object: &dyn OpaqueObject) -> Option<FieldDescriptor> {
        self.require_field(object, &Capability::TextWidget).ok()
    }

    pub fn packed_handler(&mut self, object: &dyn OpaqueObject) -> Option<PackedHandler> {
        match self.resolve(object, &Capability::PackedHandler)?.accessor {
            Accessor::Packed(handler) => Some(handler),
            _ => None,
        }
    }

    fn require_field(
        &mut self,
        object: &dyn OpaqueObject,
        capability: &Capability,
    ) -> Result<FieldDescriptor, IntrospectError> {
        match self.require(object, capability)?.accessor {
            Accessor::Field(field) => Ok(field),
            _ => Err(self.unsupported(object, capability.clone())),
        }
    }

    fn unsupported(&self, object: &dyn OpaqueObject, capability: Capability) -> IntrospectError {
        IntrospectError::Unsupported {
            class: object.class().id.clone(),
            capability,
        }
    }
}
