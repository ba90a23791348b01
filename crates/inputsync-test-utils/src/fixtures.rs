//! Object graphs shaped like the host's screens and widgets
//!
//! Names are deliberately mixed: some classes use readable member names,
//! others only single-letter ones, so both the named and the structural
//! discovery paths get exercised.

use inputsync_introspect::{ClassBuilder, DynClass, DynObject, IntrospectError, Slots, TypeRef, Value};
use std::sync::Arc;

pub const OBJECT_CLASS: &str = "lang.Object";
pub const SLOT_CLASS: &str = "ui.Slot";
pub const TEXT_FIELD_CLASS: &str = "ui.TextField";

type Body = Result<Value, IntrospectError>;

fn set_slot(slots: &mut Slots, name: &str, args: &[Value]) -> Body {
    slots.set(name, args[0].clone());
    Ok(Value::Null)
}

pub fn object_class() -> Arc<DynClass> {
    ClassBuilder::new(OBJECT_CLASS)
        .base()
        .signature("toString", &[], TypeRef::Text)
        .build()
}

/// Text field with `getText`/`setText`, an inserting `write`, and caret
/// mutators
pub fn text_field_class() -> Arc<DynClass> {
    ClassBuilder::new(TEXT_FIELD_CLASS)
        .extends(&object_class())
        .field("text", TypeRef::Text)
        .field("cursor", TypeRef::Int)
        .field("selectionStart", TypeRef::Int)
        .field("selectionEnd", TypeRef::Int)
        .method("getText", &[], TypeRef::Text, |slots, _| {
            Ok(slots.get("text").cloned().unwrap_or(Value::Null))
        })
        .method("setText", &[TypeRef::Text], TypeRef::Void, |slots, args| {
            set_slot(slots, "text", args)
        })
        .method("write", &[TypeRef::Text], TypeRef::Void, |slots, args| {
            let mut text = slots.text("text").unwrap_or_default().to_string();
            text.push_str(args[0].as_text().unwrap_or_default());
            slots.set("text", Value::Text(text));
            Ok(Value::Null)
        })
        .method("setCursor", &[TypeRef::Int], TypeRef::Void, |slots, args| {
            set_slot(slots, "cursor", args)
        })
        .method("setSelectionStart", &[TypeRef::Int], TypeRef::Void, |slots, args| {
            set_slot(slots, "selectionStart", args)
        })
        .method("setSelectionEnd", &[TypeRef::Int], TypeRef::Void, |slots, args| {
            set_slot(slots, "selectionEnd", args)
        })
        .build()
}

pub fn text_field(text: &str) -> DynObject {
    DynObject::new(&text_field_class()).with("text", Value::Text(text.to_string()))
}

/// Chat screen holding its text field in `input`
pub fn chat_screen_class() -> Arc<DynClass> {
    ClassBuilder::new("ui.ChatScreen")
        .extends(&object_class())
        .field("title", TypeRef::Text)
        .field("input", TypeRef::object(TEXT_FIELD_CLASS))
        .signature("keyPressed", &[TypeRef::Int, TypeRef::Int, TypeRef::Int], TypeRef::Bool)
        .signature("charTyped", &[TypeRef::Char, TypeRef::Int], TypeRef::Bool)
        .build()
}

pub fn chat_screen(text: &str) -> DynObject {
    DynObject::new(&chat_screen_class())
        .with("title", Value::Text("Chat".to_string()))
        .with_child("input", text_field(text))
}

pub fn inventory_class() -> Arc<DynClass> {
    ClassBuilder::new("player.Inventory")
        .extends(&object_class())
        .field("size", TypeRef::Int)
        .field("selectedSlot", TypeRef::Int)
        .build()
}

pub fn inventory(selected: i32) -> DynObject {
    DynObject::new(&inventory_class())
        .with("size", Value::Int(36))
        .with("selectedSlot", Value::Int(selected))
}

/// Inventory whose members carry no meaningful names
pub fn obfuscated_inventory(selected: i32) -> DynObject {
    let class = ClassBuilder::new("a.b")
        .extends(&object_class())
        .field("a", TypeRef::Int)
        .field("b", TypeRef::Int)
        .build();
    DynObject::new(&class)
        .with("a", Value::Int(-1))
        .with("b", Value::Int(selected))
}

pub fn slot_class() -> Arc<DynClass> {
    ClassBuilder::new(SLOT_CLASS)
        .extends(&object_class())
        .field("index", TypeRef::Int)
        .field("id", TypeRef::Int)
        .field("x", TypeRef::Int)
        .field("y", TypeRef::Int)
        .build()
}

pub fn slot(id: i32) -> DynObject {
    DynObject::new(&slot_class())
        .with("index", Value::Int(id))
        .with("id", Value::Int(id))
}

/// Container screen that tracks its hovered slot
pub fn container_screen_class() -> Arc<DynClass> {
    let element = ClassBuilder::new("ui.Element")
        .signature(
            "mouseClicked",
            &[TypeRef::object("input.Click"), TypeRef::Bool],
            TypeRef::Bool,
        )
        .build();
    ClassBuilder::new("ui.ContainerScreen")
        .extends(&object_class())
        .implements(&element)
        .field("x", TypeRef::Int)
        .field("y", TypeRef::Int)
        .field("focusedSlot", TypeRef::object(SLOT_CLASS))
        .signature("keyPressed", &[TypeRef::Int, TypeRef::Int, TypeRef::Int], TypeRef::Bool)
        .build()
}

pub fn container_screen(origin: (i32, i32), hovered: Option<i32>) -> DynObject {
    let screen = DynObject::new(&container_screen_class())
        .with("x", Value::Int(origin.0))
        .with("y", Value::Int(origin.1));
    match hovered {
        Some(id) => screen.with_child("focusedSlot", slot(id)),
        None => screen,
    }
}

/// Container screen with no slot-typed field; only its origin is findable
pub fn obfuscated_container_screen(origin: (i32, i32)) -> DynObject {
    let class = ClassBuilder::new("a.c")
        .extends(&object_class())
        .field("a", TypeRef::Int)
        .field("b", TypeRef::Int)
        .build();
    DynObject::new(&class)
        .with("a", Value::Int(origin.0))
        .with("b", Value::Int(origin.1))
}

pub fn menu_screen() -> DynObject {
    let class = ClassBuilder::new("ui.GameMenuScreen")
        .extends(&object_class())
        .signature("mouseClicked", &[TypeRef::Double, TypeRef::Double], TypeRef::Bool)
        .build();
    DynObject::new(&class)
}
