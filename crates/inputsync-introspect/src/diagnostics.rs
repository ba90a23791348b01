//! Human-readable dumps of event entry points, used when UI replay fails

use crate::capability::PackedHandler;
use crate::model::{ClassDescriptor, MethodDescriptor, TypeRef};
use crate::strategy::is_packed_handler;

fn params_are(method: &MethodDescriptor, expected: &[TypeRef]) -> bool {
    method.params == expected
}

/// Signatures shaped like a UI input handler
pub fn is_event_candidate(method: &MethodDescriptor) -> bool {
    use TypeRef::{Char, Double, Int};

    is_packed_handler(method)
        || params_are(method, &[Int, Int, Int])
        || params_are(method, &[Char, Int])
        || params_are(method, &[Double, Double])
        || params_are(method, &[Double, Double, Double, Double])
}

/// Public candidates followed by declared ones, the latter marked `(decl)`
pub fn describe_candidates(class: &ClassDescriptor) -> Vec<String> {
    let public = class
        .public_methods()
        .into_iter()
        .filter(|m| is_event_candidate(m))
        .map(|m| m.to_string());
    let declared = class
        .declared_methods()
        .iter()
        .filter(|m| is_event_candidate(m))
        .map(|m| format!("(decl) {m}"));
    public.chain(declared).collect()
}

pub fn describe_packed(class: &ClassDescriptor, handler: &PackedHandler) -> Vec<String> {
    vec![
        format!("Screen = {}", class.id),
        format!("Handler = {}", handler.method),
        format!("Packed = {}", handler.payload),
    ]
}
