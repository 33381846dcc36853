//! Object model and class system

use crate::types::{ClassId, FieldDecl, FieldDescriptor, ValueType, Visibility};
use crate::value::Value;

/// Object instance (heap-allocated)
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    /// Class ID (index into the class registry)
    pub class_id: ClassId,
    /// Field values, ancestor slots first
    pub fields: Vec<Value>,
}

impl Object {
    /// Create a new object with null fields
    pub fn new(class_id: ClassId, field_count: usize) -> Self {
        Self {
            class_id,
            fields: vec![Value::null(); field_count],
        }
    }

    /// Get a field value by slot
    pub fn get_field(&self, index: usize) -> Option<&Value> {
        self.fields.get(index)
    }

    /// Set a field value by slot
    pub fn set_field(&mut self, index: usize, value: Value) -> Result<(), String> {
        if index < self.fields.len() {
            self.fields[index] = value;
            Ok(())
        } else {
            Err(format!(
                "Field index {} out of bounds (object has {} fields)",
                index,
                self.fields.len()
            ))
        }
    }

    /// Get number of fields
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

/// Class definition metadata
///
/// A class only lists the fields it declares itself; inherited fields
/// live on the ancestors. The registry fills in `field_offset` and
/// `field_count` when the class is registered.
#[derive(Debug, Clone)]
pub struct Class {
    /// Class ID (assigned by the registry)
    pub id: ClassId,
    /// Class name
    pub name: String,
    /// Parent class ID (None for root classes)
    pub parent_id: Option<ClassId>,
    /// Fields declared on this class only
    pub declared: Vec<FieldDecl>,
    /// Instances are owned by the host and must never be duplicated
    pub host_managed: bool,
    /// First slot used by this class's own fields
    pub field_offset: usize,
    /// Number of fields (including inherited)
    pub field_count: usize,
}

impl Class {
    /// Create a new root class with no fields
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            parent_id: None,
            declared: Vec::new(),
            host_managed: false,
            field_offset: 0,
            field_count: 0,
        }
    }

    /// Set the parent class
    pub fn with_parent(mut self, parent_id: ClassId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Declare a field
    pub fn field(mut self, name: impl Into<String>, ty: ValueType, visibility: Visibility) -> Self {
        self.declared.push(FieldDecl::new(name, ty, visibility));
        self
    }

    /// Declare a public field
    pub fn public(self, name: impl Into<String>, ty: ValueType) -> Self {
        self.field(name, ty, Visibility::Public)
    }

    /// Declare a private field
    pub fn private(self, name: impl Into<String>, ty: ValueType) -> Self {
        self.field(name, ty, Visibility::Private)
    }

    /// Mark instances of this class as host-managed
    pub fn host_managed(mut self) -> Self {
        self.host_managed = true;
        self
    }

    /// Descriptor of the `index`-th field this class declares itself
    pub fn own_field_at(&self, index: usize) -> Option<FieldDescriptor> {
        self.declared.get(index).map(|decl| FieldDescriptor {
            declaring_class: self.id,
            name: decl.name.clone(),
            ty: decl.ty,
            visibility: decl.visibility,
            slot: self.field_offset + index,
        })
    }
}

/// Rank-N array object (heap-allocated)
///
/// Cells are stored with the first dimension varying fastest, so the
/// linear position of `[i0, i1, .., in]` is
/// `i0 + d0 * (i1 + d1 * (i2 + ..))`.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    /// Declared element type
    pub element: ValueType,
    /// Length of each dimension
    dims: Vec<usize>,
    /// Array cells
    cells: Vec<Value>,
}

impl Array {
    /// Create a new array with every cell set to the element default
    ///
    /// An empty shape is treated as a single empty dimension.
    pub fn new(element: ValueType, dims: Vec<usize>) -> Self {
        let dims = if dims.is_empty() { vec![0] } else { dims };
        let len = dims.iter().product();
        Self {
            element,
            dims,
            cells: vec![element.default_value(); len],
        }
    }

    /// Create a one-dimensional array from existing cells
    pub fn from_vec(element: ValueType, cells: Vec<Value>) -> Self {
        Self {
            element,
            dims: vec![cells.len()],
            cells,
        }
    }

    /// Create an array of the given shape from existing cells
    pub fn with_cells(element: ValueType, dims: Vec<usize>, cells: Vec<Value>) -> Result<Self, String> {
        let expected: usize = dims.iter().product();
        if dims.is_empty() || expected != cells.len() {
            return Err(format!(
                "Shape {:?} does not match {} cells",
                dims,
                cells.len()
            ));
        }
        Ok(Self {
            element,
            dims,
            cells,
        })
    }

    /// Number of dimensions
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Length of each dimension
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if array has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All cells in storage order
    pub fn cells(&self) -> &[Value] {
        &self.cells
    }

    /// All cells in storage order (mutable)
    pub fn cells_mut(&mut self) -> &mut [Value] {
        &mut self.cells
    }

    /// Linear storage position of an index tuple
    pub fn offset_of(&self, indices: &[usize]) -> Option<usize> {
        if indices.len() != self.dims.len() {
            return None;
        }
        let mut offset = 0;
        let mut stride = 1;
        for (&i, &d) in indices.iter().zip(&self.dims) {
            if i >= d {
                return None;
            }
            offset += i * stride;
            stride *= d;
        }
        Some(offset)
    }

    /// Get cell at an index tuple
    pub fn get(&self, indices: &[usize]) -> Option<&Value> {
        self.offset_of(indices).map(|o| &self.cells[o])
    }

    /// Set cell at an index tuple
    pub fn set(&mut self, indices: &[usize], value: Value) -> Result<(), String> {
        match self.offset_of(indices) {
            Some(o) => {
                self.cells[o] = value;
                Ok(())
            }
            None => Err(format!(
                "Array index {:?} out of bounds (dims: {:?})",
                indices, self.dims
            )),
        }
    }
}

/// Callback handle (heap-allocated)
///
/// The clone engine never copies callbacks: a cloned slot that held one
/// becomes null.
#[derive(Debug, Clone, PartialEq)]
pub struct Callback {
    /// Function name (for diagnostics)
    pub name: String,
    /// Captured environment
    pub captures: Vec<Value>,
}

impl Callback {
    /// Create a callback with no captures
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            captures: Vec::new(),
        }
    }
}

/// Opaque native handle whose contents cannot be enumerated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeHandle {
    /// Handle kind (for diagnostics)
    pub kind: String,
    /// Raw handle value
    pub raw: u64,
}

impl NativeHandle {
    /// Create a native handle
    pub fn new(kind: impl Into<String>, raw: u64) -> Self {
        Self {
            kind: kind.into(),
            raw,
        }
    }
}

/// Payload of a heap slot
#[derive(Debug, Clone, PartialEq)]
pub enum HeapObject {
    /// Class instance
    Object(Object),
    /// Rank-N array
    Array(Array),
    /// Callback handle
    Callback(Callback),
    /// Opaque native handle
    Native(NativeHandle),
}

impl HeapObject {
    /// Get the kind name for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            HeapObject::Object(_) => "object",
            HeapObject::Array(_) => "array",
            HeapObject::Callback(_) => "callback",
            HeapObject::Native(_) => "native",
        }
    }

    /// View as a class instance
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            HeapObject::Object(o) => Some(o),
            _ => None,
        }
    }

    /// View as a class instance (mutable)
    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            HeapObject::Object(o) => Some(o),
            _ => None,
        }
    }

    /// View as an array
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            HeapObject::Array(a) => Some(a),
            _ => None,
        }
    }

    /// View as an array (mutable)
    pub fn as_array_mut(&mut self) -> Option<&mut Array> {
        match self {
            HeapObject::Array(a) => Some(a),
            _ => None,
        }
    }
}
