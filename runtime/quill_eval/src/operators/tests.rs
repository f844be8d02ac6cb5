use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;
use quill_value::ErrorKind;

fn eval(left: Value, right: Value, op: BinaryOp) -> EvalResult {
    let store = ContainerStore::new();
    evaluate_binary(&store, &left, &right, op)
}

// Arithmetic

#[test]
fn integer_arithmetic() {
    assert_eq!(eval(Value::number(7), Value::number(3), BinaryOp::Add), Ok(Value::number(10)));
    assert_eq!(eval(Value::number(7), Value::number(3), BinaryOp::Sub), Ok(Value::number(4)));
    assert_eq!(eval(Value::number(7), Value::number(3), BinaryOp::Mul), Ok(Value::number(21)));
    assert_eq!(eval(Value::number(7), Value::number(3), BinaryOp::Div), Ok(Value::number(2)));
    assert_eq!(eval(Value::number(-7), Value::number(3), BinaryOp::Mod), Ok(Value::number(-1)));
}

#[test]
fn strings_coerce_to_numbers() {
    assert_eq!(eval(Value::string("12"), Value::number(1), BinaryOp::Add), Ok(Value::number(13)));
    assert_eq!(eval(Value::string("abc"), Value::number(1), BinaryOp::Add), Ok(Value::number(1)));
}

#[test]
fn float_promotion() {
    assert_eq!(eval(Value::number(1), Value::float(0.5), BinaryOp::Add), Ok(Value::float(1.5)));
    assert_eq!(eval(Value::float(3.0), Value::number(2), BinaryOp::Div), Ok(Value::float(1.5)));
}

#[test]
fn float_modulo_is_an_error() {
    let err = eval(Value::float(3.0), Value::number(2), BinaryOp::Mod).unwrap_err();
    assert!(err.message.starts_with("E804"));
}

#[test]
fn division_by_zero_sentinels() {
    assert_eq!(int_div(5, 0), i64::MAX);
    assert_eq!(int_div(-5, 0), -i64::MAX);
    assert_eq!(int_div(0, 0), i64::MIN);
    assert_eq!(int_mod(5, 0), 0);
    assert_eq!(int_div(i64::MIN, -1), i64::MIN);
}

#[test]
fn list_plus_list_is_a_new_list() {
    let store = ContainerStore::new();
    let a = store.list_from([Value::number(1)]);
    let b = store.list_from([Value::number(2)]);
    let sum = evaluate_binary(&store, &Value::List(a.clone()), &Value::List(b), BinaryOp::Add).unwrap();
    let sum = sum.as_list().unwrap();
    assert!(!sum.ptr_eq(&a));
    assert_eq!(sum.to_vec(), vec![Value::number(1), Value::number(2)]);
    assert_eq!(a.len(), 1);
}

#[test]
fn list_plus_number_is_a_type_error() {
    let store = ContainerStore::new();
    let err = evaluate_binary(&store, &Value::List(store.new_list()), &Value::number(1), BinaryOp::Add)
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Type);
}

// Concatenation

#[test]
fn concat_strings_and_numbers() {
    assert_eq!(eval(Value::string("a"), Value::string("b"), BinaryOp::Concat), Ok(Value::string("ab")));
    assert_eq!(eval(Value::string("a"), Value::number(1), BinaryOp::Concat), Ok(Value::string("a1")));
}

#[test]
fn concat_rejects_other_types() {
    let store = ContainerStore::new();
    for bad in [
        Value::List(store.new_list()),
        Value::float(1.0),
        Value::boolean(true),
        Value::func_ref("F"),
    ] {
        let err = evaluate_binary(&store, &Value::string("a"), &bad, BinaryOp::Concat).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
    }
}

// Compound assignment

#[test]
fn compound_on_numbers_and_strings() {
    assert_eq!(
        evaluate_compound(&Value::number(1), &Value::number(2), BinaryOp::Add),
        Ok(Value::number(3))
    );
    assert_eq!(
        evaluate_compound(&Value::string("5"), &Value::number(2), BinaryOp::Sub),
        Ok(Value::number(3))
    );
    assert_eq!(
        evaluate_compound(&Value::number(1), &Value::float(0.5), BinaryOp::Add),
        Ok(Value::float(1.5))
    );
    assert_eq!(
        evaluate_compound(&Value::string("a"), &Value::number(1), BinaryOp::Concat),
        Ok(Value::string("a1"))
    );
    assert_eq!(
        evaluate_compound(&Value::float(1.0), &Value::number(1), BinaryOp::Sub),
        Ok(Value::float(0.0))
    );
}

#[test]
fn compound_list_extends_in_place() {
    let store = ContainerStore::new();
    let list = store.list_from([Value::number(1)]);
    let other = store.list_from([Value::number(2)]);
    let result =
        evaluate_compound(&Value::List(list.clone()), &Value::List(other), BinaryOp::Add).unwrap();
    assert!(result.as_list().unwrap().ptr_eq(&list));
    assert_eq!(list.len(), 2);
}

#[test]
fn compound_wrong_types() {
    let store = ContainerStore::new();
    let cases = [
        (Value::number(1), Value::Dict(store.new_dict()), BinaryOp::Add),
        (Value::number(1), Value::List(store.new_list()), BinaryOp::Add),
        (Value::List(store.new_list()), Value::number(1), BinaryOp::Add),
        (Value::float(1.0), Value::string("x"), BinaryOp::Concat),
        (Value::string("a"), Value::float(1.0), BinaryOp::Concat),
        (Value::boolean(true), Value::number(1), BinaryOp::Add),
    ];
    for (target, rhs, op) in cases {
        let err = evaluate_compound(&target, &rhs, op).unwrap_err();
        assert!(err.message.starts_with("E734"), "{target:?} {op:?} {rhs:?}");
    }
}

proptest! {
    #[test]
    fn division_never_fails(a in any::<i64>(), b in any::<i64>()) {
        let result = eval(Value::number(a), Value::number(b), BinaryOp::Div);
        prop_assert!(result.is_ok());
        let result = eval(Value::number(a), Value::number(b), BinaryOp::Mod);
        prop_assert!(result.is_ok());
    }

    #[test]
    fn division_by_zero_follows_dividend_sign(a in any::<i64>()) {
        let q = int_div(a, 0);
        prop_assert_eq!(q.signum(), if a == 0 { -1 } else { a.signum() });
        prop_assert_eq!(int_mod(a, 0), 0);
    }

    #[test]
    fn addition_wraps(a in any::<i64>(), b in any::<i64>()) {
        prop_assert_eq!(
            eval(Value::number(a), Value::number(b), BinaryOp::Add),
            Ok(Value::number(a.wrapping_add(b)))
        );
    }
}
