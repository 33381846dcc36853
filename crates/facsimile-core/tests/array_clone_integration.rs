//! Integration tests for array cloning
//!
//! Tests cover:
//! - Rank-2 and rank-3 arrays of objects keep shape and cell positions
//! - Primitive arrays are copied, not shared
//! - Shared cells and self-containing arrays
//! - Empty arrays

use facsimile_core::clone::array::for_each_index;
use facsimile_core::object::{Array, Callback, HeapObject};
use facsimile_core::{Class, ClassId, Heap, ObjectRef, Value, ValueType};

fn item_class(heap: &mut Heap) -> ClassId {
    heap.register_class(Class::new("Item").public("id", ValueType::I32))
        .unwrap()
}

fn item(heap: &mut Heap, class: ClassId, id: i32) -> ObjectRef {
    let r = heap.alloc_object(class).unwrap();
    heap.set_field(r, 0, Value::i32(id)).unwrap();
    r
}

fn clone_ref(heap: &mut Heap, r: ObjectRef) -> ObjectRef {
    heap.deep_clone(&Value::Ref(r)).unwrap().as_object_ref().unwrap()
}

#[test]
fn test_rank_two_object_array() {
    let mut heap = Heap::new();
    let class = item_class(&mut heap);
    let arr = heap.alloc_array(ValueType::Object(class), vec![2, 3]).unwrap();

    let mut originals = Vec::new();
    for_each_index(&[2, 3], |idx| originals.push(idx.to_vec()));
    for (n, idx) in originals.iter().enumerate() {
        let r = item(&mut heap, class, n as i32);
        heap.array_mut(arr).unwrap().set(idx, Value::Ref(r)).unwrap();
    }

    let copy = clone_ref(&mut heap, arr);
    let src = heap.array(arr).unwrap().clone();
    let dst = heap.array(copy).unwrap().clone();
    assert_eq!(dst.dims(), &[2, 3]);
    assert_eq!(dst.element, ValueType::Object(class));

    for idx in &originals {
        let a = src.get(idx).unwrap().as_object_ref().unwrap();
        let b = dst.get(idx).unwrap().as_object_ref().unwrap();
        assert_ne!(a, b, "cell {:?} must be a new object", idx);
        assert_eq!(heap.field(a, 0).unwrap(), heap.field(b, 0).unwrap());
    }
}

#[test]
fn test_rank_three_object_array() {
    let mut heap = Heap::new();
    let class = item_class(&mut heap);
    let dims = [2, 3, 2];
    let arr = heap.alloc_array(ValueType::Object(class), dims.to_vec()).unwrap();

    let mut indices = Vec::new();
    for_each_index(&dims, |idx| indices.push(idx.to_vec()));
    assert_eq!(indices.len(), 12);

    // Every cell gets its own item except the two corners, which share one
    let corner = item(&mut heap, class, 100);
    for (n, idx) in indices.iter().enumerate() {
        let r = if idx == &[0, 0, 0] || idx == &[1, 2, 1] {
            corner
        } else {
            item(&mut heap, class, n as i32)
        };
        heap.array_mut(arr).unwrap().set(idx, Value::Ref(r)).unwrap();
    }

    let before = heap.len();
    let copy = clone_ref(&mut heap, arr);
    // The array, the shared corner, and ten distinct items
    assert_eq!(heap.len(), before + 12);

    let src = heap.array(arr).unwrap().clone();
    let dst = heap.array(copy).unwrap().clone();
    assert_eq!(dst.dims(), &dims);

    for idx in &indices {
        let a = src.get(idx).unwrap().as_object_ref().unwrap();
        let b = dst.get(idx).unwrap().as_object_ref().unwrap();
        assert_ne!(a, b, "cell {:?} must be a new object", idx);
        assert_eq!(heap.field(a, 0).unwrap(), heap.field(b, 0).unwrap());
    }

    let first = dst.get(&[0, 0, 0]).unwrap();
    assert_eq!(first, dst.get(&[1, 2, 1]).unwrap());
    assert_ne!(first, dst.get(&[1, 0, 0]).unwrap());
    assert_ne!(dst.get(&[0, 1, 0]), dst.get(&[0, 0, 1]));

    // Cells of the copy are independent of the original
    let b = dst.get(&[1, 1, 1]).unwrap().as_object_ref().unwrap();
    heap.set_field(b, 0, Value::i32(-1)).unwrap();
    let a = src.get(&[1, 1, 1]).unwrap().as_object_ref().unwrap();
    assert_ne!(heap.field(a, 0).unwrap(), &Value::i32(-1));
}

#[test]
fn test_nested_arrays_with_shared_element() {
    // [[A, B], [C, D]] with A == C
    let mut heap = Heap::new();
    let class = item_class(&mut heap);
    let a = item(&mut heap, class, 1);
    let b = item(&mut heap, class, 2);
    let d = item(&mut heap, class, 4);

    let row0 = heap
        .alloc(HeapObject::Array(Array::from_vec(
            ValueType::Object(class),
            vec![Value::Ref(a), Value::Ref(b)],
        )))
        .unwrap();
    let row1 = heap
        .alloc(HeapObject::Array(Array::from_vec(
            ValueType::Object(class),
            vec![Value::Ref(a), Value::Ref(d)],
        )))
        .unwrap();
    let outer = heap
        .alloc(HeapObject::Array(Array::from_vec(
            ValueType::Array,
            vec![Value::Ref(row0), Value::Ref(row1)],
        )))
        .unwrap();

    let before = heap.len();
    let copy = clone_ref(&mut heap, outer);
    // outer, two rows, A, B, D
    assert_eq!(heap.len(), before + 6);

    let rows = heap.array(copy).unwrap().cells().to_vec();
    let r0 = heap.array(rows[0].as_object_ref().unwrap()).unwrap().cells().to_vec();
    let r1 = heap.array(rows[1].as_object_ref().unwrap()).unwrap().cells().to_vec();

    assert_eq!(r0[0], r1[0], "A and C stay one object");
    assert_ne!(r0[0], Value::Ref(a));
    assert_ne!(r0[1], r1[1]);
    assert_ne!(r1[1], Value::Ref(d));
}

#[test]
fn test_primitive_array_is_independent() {
    let mut heap = Heap::new();
    let arr = heap
        .alloc(HeapObject::Array(
            Array::with_cells(
                ValueType::F64,
                vec![2, 2],
                vec![Value::f64(1.0), Value::f64(2.0), Value::f64(3.0), Value::f64(4.0)],
            )
            .unwrap(),
        ))
        .unwrap();

    let copy = clone_ref(&mut heap, arr);
    assert_ne!(copy, arr);
    assert_eq!(heap.array(copy).unwrap(), heap.array(arr).unwrap());

    heap.array_mut(copy).unwrap().set(&[1, 1], Value::f64(-1.0)).unwrap();
    assert_eq!(heap.array(arr).unwrap().get(&[1, 1]), Some(&Value::f64(4.0)));
}

#[test]
fn test_string_array() {
    let mut heap = Heap::new();
    let arr = heap
        .alloc(HeapObject::Array(Array::from_vec(
            ValueType::Str,
            vec![Value::str("a"), Value::Null, Value::str("c")],
        )))
        .unwrap();

    let copy = clone_ref(&mut heap, arr);
    assert_eq!(
        heap.array(copy).unwrap().cells(),
        &[Value::str("a"), Value::Null, Value::str("c")]
    );
}

#[test]
fn test_array_containing_itself() {
    let mut heap = Heap::new();
    let arr = heap.alloc_array(ValueType::Any, vec![2]).unwrap();
    heap.array_mut(arr).unwrap().set(&[0], Value::Ref(arr)).unwrap();
    heap.array_mut(arr).unwrap().set(&[1], Value::i32(7)).unwrap();

    let copy = clone_ref(&mut heap, arr);
    let cells = heap.array(copy).unwrap().cells().to_vec();
    assert_eq!(cells, vec![Value::Ref(copy), Value::i32(7)]);
}

#[test]
fn test_untyped_array_excludes_callbacks() {
    let mut heap = Heap::new();
    let class = item_class(&mut heap);
    let it = item(&mut heap, class, 3);
    let cb = heap.alloc_callback(Callback::new("tick")).unwrap();
    let arr = heap
        .alloc(HeapObject::Array(Array::from_vec(
            ValueType::Any,
            vec![Value::Ref(it), Value::Ref(cb), Value::str("s")],
        )))
        .unwrap();

    let copy = clone_ref(&mut heap, arr);
    let cells = heap.array(copy).unwrap().cells().to_vec();
    assert!(cells[0].is_ref() && cells[0] != Value::Ref(it));
    assert_eq!(cells[1], Value::Null);
    assert_eq!(cells[2], Value::str("s"));
}

#[test]
fn test_empty_arrays() {
    let mut heap = Heap::new();
    let class = item_class(&mut heap);
    for dims in [vec![0], vec![3, 0], vec![0, 0, 2]] {
        let arr = heap.alloc_array(ValueType::Object(class), dims.clone()).unwrap();
        let copy = clone_ref(&mut heap, arr);
        assert_ne!(copy, arr);
        assert_eq!(heap.array(copy).unwrap().dims(), dims.as_slice());
        assert!(heap.array(copy).unwrap().is_empty());
    }
}
