//! Field declarations and resolved field descriptors

use super::{ClassId, ValueType};

/// Field visibility as declared on the class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    /// Accessible everywhere
    #[default]
    Public,
    /// Accessible from the declaring class and subclasses
    Protected,
    /// Accessible from the declaring class only
    Private,
}

/// A field as written in a class declaration
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    /// Field name
    pub name: String,
    /// Declared slot type
    pub ty: ValueType,
    /// Declared visibility
    pub visibility: Visibility,
}

impl FieldDecl {
    /// Create a new field declaration
    pub fn new(name: impl Into<String>, ty: ValueType, visibility: Visibility) -> Self {
        Self {
            name: name.into(),
            ty,
            visibility,
        }
    }
}

/// A field resolved against the instance layout of its declaring class
///
/// `slot` is the index into `Object::fields`. Two descriptors with the
/// same name but different declaring classes (a shadowed field) have
/// different slots.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Class that declares this field
    pub declaring_class: ClassId,
    /// Field name
    pub name: String,
    /// Declared slot type
    pub ty: ValueType,
    /// Declared visibility
    pub visibility: Visibility,
    /// Slot index within the instance
    pub slot: usize,
}

impl FieldDescriptor {
    /// Check if the slot is copied by plain assignment
    pub fn is_primitive(&self) -> bool {
        self.ty.is_primitive()
    }

    /// Check if the field is visible outside its declaring class
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}
