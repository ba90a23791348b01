//! Discovery strategies
//!
//! Each capability maps to an ordered list of named strategies. The resolver
//! runs them in order and keeps the first hit. Strategies only look; they
//! never mutate the instance.

use crate::capability::{Accessor, Capability, PackedHandler};
use crate::model::{ClassDescriptor, FieldDescriptor, MethodDescriptor, OpaqueObject, TypeRef, Value};

/// Input handed to every strategy
pub struct Probe<'a> {
    pub class: &'a ClassDescriptor,
    pub instance: &'a dyn OpaqueObject,
}

pub type ProbeFn = fn(&Probe<'_>, &Capability) -> Option<Accessor>;

#[derive(Clone, Copy)]
pub struct Strategy {
    pub name: &'static str,
    pub probe: ProbeFn,
}

impl std::fmt::Debug for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Strategy").field("name", &self.name).finish()
    }
}

const READABLE_TEXT: &[Strategy] = &[
    Strategy {
        name: "conventional-getter",
        probe: conventional_getter,
    },
    Strategy {
        name: "first-text-getter",
        probe: first_text_getter,
    },
];

// A text mutator other than setText(String) tends to insert at the caret,
// so repeated application would corrupt the buffer. Only the strict setter
// is accepted before falling back to replacing the field directly.
const WRITABLE_TEXT: &[Strategy] = &[
    Strategy {
        name: "strict-setter",
        probe: strict_setter,
    },
    Strategy {
        name: "named-text-field",
        probe: named_text_field,
    },
    Strategy {
        name: "longest-text-field",
        probe: longest_text_field,
    },
];

const TEXT_VALUE_FIELD: &[Strategy] = &[
    Strategy {
        name: "named-text-field",
        probe: named_text_field,
    },
    Strategy {
        name: "longest-text-field",
        probe: longest_text_field,
    },
];

const CURSOR_PLACEMENT: &[Strategy] = &[Strategy {
    name: "cursor-mutators",
    probe: cursor_mutators,
}];

const BOUNDED_INT: &[Strategy] = &[
    Strategy {
        name: "named-int-field",
        probe: named_int_field,
    },
    Strategy {
        name: "int-field-in-range",
        probe: int_field_in_range,
    },
];

const INT_PAIR: &[Strategy] = &[Strategy {
    name: "int-pair-in-range",
    probe: int_pair_in_range,
}];

const TYPED_FIELD: &[Strategy] = &[Strategy {
    name: "declared-type-match",
    probe: declared_type_match,
}];

const PACKED_HANDLER: &[Strategy] = &[Strategy {
    name: "packed-event-probe",
    probe: packed_event_probe,
}];

const TEXT_WIDGET: &[Strategy] = &[Strategy {
    name: "embedded-text-widget",
    probe: embedded_text_widget,
}];

/// Ordered fallback chain for a capability
pub fn strategies_for(capability: &Capability) -> &'static [Strategy] {
    match capability {
        Capability::ReadableText => READABLE_TEXT,
        Capability::WritableText => WRITABLE_TEXT,
        Capability::TextValueField => TEXT_VALUE_FIELD,
        Capability::CursorPlacement => CURSOR_PLACEMENT,
        Capability::BoundedInt { .. } => BOUNDED_INT,
        Capability::IntPair { .. } => INT_PAIR,
        Capability::TypedField { .. } => TYPED_FIELD,
        Capability::PackedHandler => PACKED_HANDLER,
        Capability::TextWidget => TEXT_WIDGET,
    }
}

/// Public methods first, then the ones the class declares itself
fn method_candidates(class: &ClassDescriptor) -> impl Iterator<Item = &MethodDescriptor> {
    class
        .public_methods()
        .into_iter()
        .chain(class.declared_methods().iter())
}

/// Zero-argument `getText()` returning text
pub fn find_getter(class: &ClassDescriptor) -> Option<&MethodDescriptor> {
    method_candidates(class).find(|m| {
        m.name == "getText" && m.params.is_empty() && !m.is_static && m.ret == TypeRef::Text
    })
}

/// First zero-argument text accessor not inherited from the base class
pub fn find_text_getter(class: &ClassDescriptor) -> Option<&MethodDescriptor> {
    method_candidates(class).find(|m| {
        m.params.is_empty()
            && !m.is_static
            && m.ret == TypeRef::Text
            && !class.declared_by_base(&m.declaring)
    })
}

/// `setText(String)` and nothing else
pub fn find_strict_setter(class: &ClassDescriptor) -> Option<&MethodDescriptor> {
    method_candidates(class)
        .find(|m| m.name == "setText" && m.params == [TypeRef::Text] && !m.is_static)
}

fn text_fields(class: &ClassDescriptor) -> impl Iterator<Item = &FieldDescriptor> {
    class.instance_fields().filter(|f| f.ty == TypeRef::Text)
}

fn conventional_getter(probe: &Probe<'_>, _: &Capability) -> Option<Accessor> {
    find_getter(probe.class).cloned().map(Accessor::Method)
}

fn first_text_getter(probe: &Probe<'_>, _: &Capability) -> Option<Accessor> {
    find_text_getter(probe.class).cloned().map(Accessor::Method)
}

fn strict_setter(probe: &Probe<'_>, _: &Capability) -> Option<Accessor> {
    find_strict_setter(probe.class).cloned().map(Accessor::Method)
}

fn named_text_field(probe: &Probe<'_>, _: &Capability) -> Option<Accessor> {
    text_fields(probe.class)
        .find(|f| {
            let name = f.name.to_lowercase();
            name.contains("text") || name.contains("value")
        })
        .cloned()
        .map(Accessor::Field)
}

// The longest string is most likely the typed buffer rather than a label
// or placeholder.
fn longest_text_field(probe: &Probe<'_>, _: &Capability) -> Option<Accessor> {
    let mut best: Option<(&FieldDescriptor, usize)> = None;
    for field in text_fields(probe.class) {
        let Ok(Value::Text(current)) = probe.instance.get(field) else {
            continue;
        };
        let len = current.chars().count();
        if best.map_or(true, |(_, best_len)| len > best_len) {
            best = Some((field, len));
        }
    }
    best.map(|(field, _)| Accessor::Field(field.clone()))
}

fn cursor_mutators(probe: &Probe<'_>, _: &Capability) -> Option<Accessor> {
    const GROUPS: [&[&str]; 3] = [&["cursor"], &["selectionstart"], &["selectionend"]];

    let candidates: Vec<&MethodDescriptor> = method_candidates(probe.class)
        .filter(|m| m.params == [TypeRef::Int] && m.ret == TypeRef::Void && !m.is_static)
        .collect();

    let found: Vec<MethodDescriptor> = GROUPS
        .iter()
        .filter_map(|hints| {
            candidates.iter().find(|m| {
                let name = m.name.to_lowercase();
                hints.iter().any(|hint| name.contains(*hint))
            })
        })
        .map(|m| (*m).clone())
        .collect();

    if found.is_empty() {
        None
    } else {
        Some(Accessor::Methods(found))
    }
}

fn int_fields(class: &ClassDescriptor) -> impl Iterator<Item = &FieldDescriptor> {
    class.instance_fields().filter(|f| f.ty == TypeRef::Int)
}

fn named_int_field(probe: &Probe<'_>, capability: &Capability) -> Option<Accessor> {
    let Capability::BoundedInt { name, .. } = capability else {
        return None;
    };
    int_fields(probe.class)
        .find(|f| &f.name == name)
        .cloned()
        .map(Accessor::Field)
}

fn int_field_in_range(probe: &Probe<'_>, capability: &Capability) -> Option<Accessor> {
    let range = capability.int_range()?;
    int_fields(probe.class)
        .find(|f| {
            matches!(probe.instance.get(f), Ok(Value::Int(v)) if range.contains(&v))
        })
        .cloned()
        .map(Accessor::Field)
}

fn int_pair_in_range(probe: &Probe<'_>, capability: &Capability) -> Option<Accessor> {
    let range = capability.int_range()?;
    let mut hits = int_fields(probe.class)
        .filter(|f| matches!(probe.instance.get(f), Ok(Value::Int(v)) if range.contains(&v)));
    let x = hits.next()?.clone();
    let y = hits.next()?.clone();
    Some(Accessor::FieldPair { x, y })
}

fn declared_type_match(probe: &Probe<'_>, capability: &Capability) -> Option<Accessor> {
    let Capability::TypedField { marker } = capability else {
        return None;
    };
    probe
        .class
        .instance_fields()
        .find(|f| matches!(&f.ty, TypeRef::Object(id) if id == marker))
        .cloned()
        .map(Accessor::Field)
}

/// `boolean m(NonPrimitive, boolean)`
pub fn is_packed_handler(method: &MethodDescriptor) -> bool {
    method.ret == TypeRef::Bool
        && method.params.len() == 2
        && !method.params[0].is_primitive()
        && method.params[1] == TypeRef::Bool
}

fn packed_event_probe(probe: &Probe<'_>, _: &Capability) -> Option<Accessor> {
    let class = probe.class;
    let from_class = class
        .public_methods()
        .into_iter()
        .chain(class.declared_methods().iter())
        .find(|m| is_packed_handler(m));

    let method = match from_class {
        Some(m) => Some(m),
        None => class
            .interfaces
            .iter()
            .find_map(|iface| iface.public_methods().into_iter().find(|m| is_packed_handler(m))),
    }?;

    Some(Accessor::Packed(PackedHandler {
        method: method.clone(),
        payload: method.params[0].clone(),
    }))
}

/// A widget class we can read, and either set through `setText` or by
/// replacing one of its text fields
pub fn looks_like_text_widget(class: &ClassDescriptor) -> bool {
    if find_getter(class).is_none() && find_text_getter(class).is_none() {
        return false;
    }
    find_strict_setter(class).is_some() || text_fields(class).next().is_some()
}

fn embedded_text_widget(probe: &Probe<'_>, _: &Capability) -> Option<Accessor> {
    probe
        .class
        .instance_fields()
        .find(|f| match probe.instance.get(f) {
            Ok(Value::Object(held)) => looks_like_text_widget(&held),
            _ => false,
        })
        .cloned()
        .map(Accessor::Field)
}
