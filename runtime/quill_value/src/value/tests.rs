use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;
use crate::store::ContainerStore;
use crate::{Callee, ErrorKind};

// Factories and type codes

#[test]
fn test_factory_methods() {
    assert_eq!(Value::string("hi").as_str(), Some("hi"));
    assert_eq!(Value::truth(true), Value::Number(1));
    assert_eq!(Value::truth(false), Value::Number(0));
    assert!(matches!(Value::boolean(true), Value::Special(Special::True)));
    assert!(matches!(Value::null(), Value::Special(Special::Null)));
}

#[test]
fn test_type_codes() {
    let store = ContainerStore::new();
    assert_eq!(Value::number(1).type_code(), type_code::NUMBER);
    assert_eq!(Value::string("").type_code(), type_code::STRING);
    assert_eq!(Value::func_ref("F").type_code(), type_code::FUNC);
    assert_eq!(Value::List(store.new_list()).type_code(), type_code::LIST);
    assert_eq!(Value::Dict(store.new_dict()).type_code(), type_code::DICT);
    assert_eq!(Value::float(1.0).type_code(), type_code::FLOAT);
    assert_eq!(Value::boolean(false).type_code(), type_code::BOOL);
    assert_eq!(Value::null().type_code(), type_code::NONE);
}

// Number coercion

#[test]
fn test_str_to_number_radixes() {
    assert_eq!(str_to_number("42"), 42);
    assert_eq!(str_to_number("-42"), -42);
    assert_eq!(str_to_number("0x1F"), 31);
    assert_eq!(str_to_number("0X1f"), 31);
    assert_eq!(str_to_number("0b101"), 5);
    assert_eq!(str_to_number("017"), 15);
    assert_eq!(str_to_number("019"), 19);
    assert_eq!(str_to_number("0"), 0);
}

#[test]
fn test_str_to_number_stops_at_first_non_digit() {
    assert_eq!(str_to_number("12abc"), 12);
    assert_eq!(str_to_number("abc"), 0);
    assert_eq!(str_to_number(""), 0);
    assert_eq!(str_to_number("-"), 0);
    assert_eq!(str_to_number("0x"), 0);
    assert_eq!(str_to_number("1.5"), 1);
}

#[test]
fn test_str_to_number_saturates() {
    assert_eq!(str_to_number("99999999999999999999"), i64::MAX);
    assert_eq!(str_to_number("-99999999999999999999"), i64::MIN);
}

#[test]
fn test_parse_number_prefix_reports_length() {
    assert_eq!(parse_number_prefix("123 + 4"), (123, 3));
    assert_eq!(parse_number_prefix("0x10]"), (16, 4));
    assert_eq!(parse_number_prefix("x"), (0, 0));
}

#[test]
fn test_to_number_per_variant() {
    let store = ContainerStore::new();
    assert_eq!(Value::string("7").to_number(), Ok(7));
    assert_eq!(Value::boolean(true).to_number(), Ok(1));
    assert_eq!(Value::null().to_number(), Ok(0));
    let err = Value::float(1.5).to_number().unwrap_err();
    assert_eq!(err.kind, ErrorKind::Type);
    let err = Value::List(store.new_list()).to_number().unwrap_err();
    assert!(err.message.starts_with("E745"));
    let err = Value::Dict(store.new_dict()).to_number().unwrap_err();
    assert!(err.message.starts_with("E728"));
}

// Text coercion

#[test]
fn test_concat_text_accepts_strings_and_numbers_only() {
    let store = ContainerStore::new();
    assert_eq!(Value::number(-3).to_concat_text().unwrap(), "-3");
    assert_eq!(Value::string("x").to_concat_text().unwrap(), "x");
    assert!(Value::List(store.new_list()).to_concat_text().is_err());
    assert!(Value::float(1.0).to_concat_text().is_err());
    assert!(Value::boolean(true).to_concat_text().is_err());
}

#[test]
fn test_to_text_names_specials() {
    assert_eq!(Value::boolean(false).to_text().unwrap(), "v:false");
    assert!(Value::float(2.0).to_text().is_err());
}

// Floats

#[test]
fn test_str_to_float() {
    assert_eq!(str_to_float("1.5"), (1.5, 3));
    assert_eq!(str_to_float("1.5e3x"), (1500.0, 5));
    assert_eq!(str_to_float("-2"), (-2.0, 2));
    assert_eq!(str_to_float("1."), (1.0, 1));
    assert_eq!(str_to_float("abc"), (0.0, 0));
    assert!(str_to_float("inf").0.is_infinite());
}

#[test]
fn test_format_float() {
    assert_eq!(format_float(1.0), "1.0");
    assert_eq!(format_float(0.5), "0.5");
    assert_eq!(format_float(-2.25), "-2.25");
    assert_eq!(format_float(123_456.0), "123456.0");
    assert_eq!(format_float(1.0e20), "1.0e20");
    assert_eq!(format_float(1.5e-5), "1.5e-5");
    assert_eq!(format_float(0.0), "0.0");
    assert_eq!(format_float(f64::INFINITY), "inf");
    assert_eq!(format_float(f64::NAN), "nan");
}

// Display

#[test]
fn test_display_scalars() {
    assert_eq!(Value::number(42).to_string(), "42");
    assert_eq!(Value::string("it's").to_string(), "'it''s'");
    assert_eq!(Value::boolean(true).to_string(), "v:true");
    assert_eq!(Value::func_ref("Foo").to_string(), "function('Foo')");
}

#[test]
fn test_display_containers() {
    let store = ContainerStore::new();
    let inner = store.list_from([Value::number(1), Value::string("a")]);
    let dict = store.dict_from([("k", Value::List(inner))]);
    assert_eq!(Value::Dict(dict).to_string(), "{'k': [1, 'a']}");
}

#[test]
fn test_display_self_reference() {
    let store = ContainerStore::new();
    let list = store.list_from([Value::number(1)]);
    list.push(Value::List(list.clone())).unwrap();
    assert_eq!(Value::List(list.clone()).to_string(), "[1, [...]]");

    // Break the cycle so the test does not leak.
    list.remove(1).unwrap();
}

#[test]
fn test_display_shared_but_acyclic() {
    let store = ContainerStore::new();
    let shared = store.list_from([Value::number(1)]);
    let outer = store.list_from([Value::List(shared.clone()), Value::List(shared)]);
    assert_eq!(Value::List(outer).to_string(), "[[1], [1]]");
}

#[test]
fn test_display_partial() {
    let store = ContainerStore::new();
    let partial = Partial::new(
        Callee::Name("Add".into()),
        vec![Value::number(1)],
        Some(store.new_dict()),
        false,
    );
    assert_eq!(Value::partial(partial).to_string(), "function('Add', [1], {})");
}

#[test]
fn test_echo_string() {
    assert_eq!(Value::string("bare").to_echo_string(), "bare");
    assert_eq!(Value::number(5).to_echo_string(), "5");
    assert_eq!(Value::float(5.0).to_echo_string(), "5.0");
}

proptest! {
    #[test]
    fn decimal_strings_round_trip(n in -1_000_000_000_000i64..1_000_000_000_000i64) {
        prop_assert_eq!(str_to_number(&n.to_string()), n);
    }

    #[test]
    fn number_text_is_decimal(n in any::<i64>()) {
        let value = Value::number(n);
        prop_assert_eq!(value.to_concat_text().unwrap().into_owned(), n.to_string());
    }
}
