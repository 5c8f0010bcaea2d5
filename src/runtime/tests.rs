//! Tests for the reference heap

use super::*;

#[test]
fn test_alloc_and_get() {
    let heap = Heap::new();
    let i = heap.int(42);
    let s = heap.str("abc");

    assert_eq!(heap.get(i), Some(Value::Int(42)));
    assert_eq!(heap.get(s), Some(Value::Str("abc".to_string())));
    assert_eq!(heap.object_type(s), Some(ObjectType::String));
    assert_eq!(heap.live_objects(), 2);
}

#[test]
fn test_null_handle() {
    let heap = Heap::new();
    assert!(heap.is_null(&ObjRef::NULL));
    assert_eq!(heap.get(ObjRef::NULL), None);
    assert_eq!(heap.refcount(ObjRef::NULL), 0);

    // Closing null is a no-op
    heap.close(ObjRef::NULL);
}

#[test]
fn test_dup_and_close() {
    let heap = Heap::new();
    let obj = heap.float(1.5);

    let again = heap.dup(&obj);
    assert_eq!(again, obj);
    assert_eq!(heap.refcount(obj), 2);

    heap.close(again);
    assert_eq!(heap.refcount(obj), 1);
    heap.close(obj);
    assert_eq!(heap.refcount(obj), 0);
    assert_eq!(heap.live_objects(), 0);
}

#[test]
fn test_close_after_free_is_ignored() {
    let heap = Heap::new();
    let obj = heap.none();
    heap.close(obj);
    heap.close(obj);
    assert_eq!(heap.live_objects(), 0);
}

#[test]
fn test_number_view() {
    let heap = Heap::new();
    let i = heap.int(-3);
    let b = heap.bool(true);
    let f = heap.float(2.5);
    let s = heap.str("x");

    assert_eq!(heap.number(&i), Some(Number::Int(-3)));
    assert_eq!(heap.number(&b), Some(Number::Int(1)));
    assert_eq!(heap.number(&f), Some(Number::Float(2.5)));
    assert_eq!(heap.number(&s), None);
    assert_eq!(heap.number(&ObjRef::NULL), None);
}

#[test]
fn test_add() {
    let heap = Heap::new();
    let a = heap.int(1);
    let b = heap.long_from(5);
    let sum = heap.add(a, b).unwrap();
    assert_eq!(heap.get(sum), Some(Value::Int(6)));

    let x = heap.str("x");
    let y = heap.str("y");
    let xy = heap.add(x, y).unwrap();
    assert_eq!(heap.get(xy), Some(Value::Str("xy".to_string())));

    let f = heap.float_from(0.5);
    let mixed = heap.add(a, f).unwrap();
    assert_eq!(heap.get(mixed), Some(Value::Float(1.5)));
}

#[test]
fn test_add_unsupported() {
    let heap = Heap::new();
    let a = heap.int(1);
    let s = heap.str("s");

    let err = heap.add(a, s).unwrap_err();
    assert_eq!(err.to_string(), "unsupported operand type(s) for +: 'int' and 'str'");
    assert_eq!(heap.add(a, ObjRef::NULL), Err(OpError::NullHandle));
}

#[test]
fn test_value_display() {
    assert_eq!(Value::Int(5).to_string(), "5");
    assert_eq!(Value::Float(2.0).to_string(), "2.0");
    assert_eq!(Value::Str("a".into()).to_string(), "\"a\"");
    assert_eq!(Value::Bool(false).to_string(), "False");
}
