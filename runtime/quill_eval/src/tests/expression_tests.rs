//! Tests for operator precedence, coercion and comparison as seen through
//! `eval_expr`.

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::{EvalError, Interpreter, Value};

fn echo(interp: &mut Interpreter, text: &str) -> String {
    interp
        .eval_expr(text)
        .unwrap_or_else(|err| panic!("{text}: {err}"))
        .to_echo_string()
}

fn code<T: std::fmt::Debug>(result: Result<T, EvalError>) -> String {
    let err = result.unwrap_err();
    err.message.split(':').next().unwrap_or_default().to_string()
}

mod precedence_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn multiplicative_binds_tighter_than_additive() {
        let mut interp = Interpreter::new().unwrap();
        assert_eq!(echo(&mut interp, "1 + 2 * 3"), "7");
        assert_eq!(echo(&mut interp, "(1 + 2) * 3"), "9");
        assert_eq!(echo(&mut interp, "2 * 3 % 4"), "2");
    }

    #[test]
    fn additive_level_is_left_associative() {
        let mut interp = Interpreter::new().unwrap();
        assert_eq!(echo(&mut interp, "10 - 4 - 3"), "3");
        assert_eq!(echo(&mut interp, "1 + 2 . 3"), "33");
        assert_eq!(echo(&mut interp, "'a' . 1 + 2"), "2");
    }

    #[test]
    fn prefix_operators_apply_to_the_operand() {
        let mut interp = Interpreter::new().unwrap();
        assert_eq!(echo(&mut interp, "-2 * 3"), "-6");
        assert_eq!(echo(&mut interp, "!0 + 1"), "2");
        assert_eq!(echo(&mut interp, "- - 3"), "3");
        assert_eq!(echo(&mut interp, "-'7'"), "-7");
        assert_eq!(echo(&mut interp, "!'abc'"), "1");
    }

    #[test]
    fn ternary_nests_to_the_right() {
        let mut interp = Interpreter::new().unwrap();
        assert_eq!(echo(&mut interp, "1 ? 2 : 3"), "2");
        assert_eq!(echo(&mut interp, "0 ? 2 : 0 ? 3 : 4"), "4");
        assert_eq!(code(interp.eval_expr("1 ? 2")), "E109");
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let mut interp = Interpreter::new().unwrap();
        assert_eq!(echo(&mut interp, "1 || 0 && 0"), "1");
        assert_eq!(echo(&mut interp, "0 && 1 || 1"), "1");
        assert_eq!(echo(&mut interp, "'abc' || 0"), "0");
        assert_eq!(echo(&mut interp, "'1' && 2"), "1");
    }

    #[test]
    fn comparisons_do_not_chain() {
        let mut interp = Interpreter::new().unwrap();
        assert_eq!(code(interp.eval_expr("1 < 2 == 1")), "E488");
    }
}

mod short_circuit_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn skipped_operands_are_not_evaluated() {
        let mut interp = Interpreter::new().unwrap();
        assert_eq!(echo(&mut interp, "0 && Missing()"), "0");
        assert_eq!(echo(&mut interp, "1 || nosuch"), "1");
        assert_eq!(echo(&mut interp, "1 ? 'yes' : nosuch"), "yes");
        assert_eq!(echo(&mut interp, "0 ? nosuch[3] : 'no'"), "no");
    }

    #[test]
    fn skipped_operands_still_report_syntax_errors() {
        let mut interp = Interpreter::new().unwrap();
        assert!(interp.eval_expr("0 && (1 +").is_err());
        assert!(interp.eval_expr("1 || [1, 2").is_err());
    }

    #[test]
    fn skipped_calls_have_no_side_effects() {
        let mut interp = Interpreter::new().unwrap();
        interp.execute(&["let l = []"]).unwrap();
        assert_eq!(echo(&mut interp, "0 && add(l, 1) is l"), "0");
        assert_eq!(echo(&mut interp, "len(l)"), "0");
    }
}

mod comparison_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn numbers_and_strings_compare_as_numbers() {
        let mut interp = Interpreter::new().unwrap();
        assert_eq!(echo(&mut interp, "'10' == 10"), "1");
        assert_eq!(echo(&mut interp, "'abc' == 0"), "1");
        assert_eq!(echo(&mut interp, "1.5 > 1"), "1");
    }

    #[test]
    fn case_suffixes_override_the_option() {
        let mut interp = Interpreter::new().unwrap();
        assert_eq!(echo(&mut interp, "'abc' == 'ABC'"), "0");
        assert_eq!(echo(&mut interp, "'abc' ==? 'ABC'"), "1");
        assert_eq!(echo(&mut interp, "'abc' ==# 'abc'"), "1");

        let mut folding = Interpreter::builder().ignore_case(true).build().unwrap();
        assert_eq!(echo(&mut folding, "'abc' == 'ABC'"), "1");
        assert_eq!(echo(&mut folding, "'abc' ==# 'ABC'"), "0");
    }

    #[test]
    fn containers_compare_by_value_or_identity() {
        let mut interp = Interpreter::new().unwrap();
        interp.execute(&["let l = [1]", "let m = l"]).unwrap();
        assert_eq!(echo(&mut interp, "[1, 2] == [1, 2]"), "1");
        assert_eq!(echo(&mut interp, "[1, 2] is [1, 2]"), "0");
        assert_eq!(echo(&mut interp, "l is m"), "1");
        assert_eq!(echo(&mut interp, "{'a': 1} != {'a': 2}"), "1");
    }

    #[test]
    fn identity_across_types_is_false() {
        let mut interp = Interpreter::new().unwrap();
        assert_eq!(echo(&mut interp, "1 is '1'"), "0");
        assert_eq!(echo(&mut interp, "1 isnot '1'"), "1");
    }

    #[test]
    fn invalid_container_comparisons() {
        let mut interp = Interpreter::new().unwrap();
        assert_eq!(code(interp.eval_expr("[1] < [2]")), "E692");
        assert_eq!(code(interp.eval_expr("[1] == 1")), "E691");
        assert_eq!(code(interp.eval_expr("{} > {}")), "E736");
        assert_eq!(code(interp.eval_expr("{} == 0")), "E735");
        assert_eq!(code(interp.eval_expr("function('len') < 1")), "E694");
    }

    #[test]
    fn pattern_operators_compare_text() {
        let mut interp = Interpreter::new().unwrap();
        assert_eq!(echo(&mut interp, "'foobar' =~ '^foo'"), "1");
        assert_eq!(echo(&mut interp, "'foobar' !~ 'bar$'"), "0");
        assert_eq!(echo(&mut interp, "'FOO' =~? 'foo'"), "1");
        assert_eq!(echo(&mut interp, "'foobar' =~ 'o\\+b'"), "1");
        assert_eq!(echo(&mut interp, "'a+b' =~ '^a+b$'"), "1");
        assert_eq!(echo(&mut interp, "'dog' =~ '^\\(cat\\|dog\\)$'"), "1");
    }

    #[test]
    fn function_values_compare_by_name() {
        let mut interp = Interpreter::new().unwrap();
        assert_eq!(echo(&mut interp, "function('len') == function('len')"), "1");
        assert_eq!(echo(&mut interp, "function('len') is function('len')"), "1");
        assert_eq!(echo(&mut interp, "function('len') == function('copy')"), "0");
    }
}

mod arithmetic_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn integer_division_truncates() {
        let mut interp = Interpreter::new().unwrap();
        assert_eq!(echo(&mut interp, "7 / 2"), "3");
        assert_eq!(echo(&mut interp, "-7 / 2"), "-3");
        assert_eq!(echo(&mut interp, "7 % -3"), "1");
    }

    #[test]
    fn division_by_zero_saturates() {
        let mut interp = Interpreter::new().unwrap();
        assert_eq!(
            interp.eval_expr("1 / 0").unwrap(),
            Value::number(i64::MAX)
        );
        assert_eq!(
            interp.eval_expr("-1 / 0").unwrap(),
            Value::number(-i64::MAX)
        );
        assert_eq!(
            interp.eval_expr("0 / 0").unwrap(),
            Value::number(i64::MIN)
        );
        assert_eq!(echo(&mut interp, "5 % 0"), "0");
    }

    #[test]
    fn integer_overflow_wraps() {
        let mut interp = Interpreter::new().unwrap();
        assert_eq!(
            interp.eval_expr("9223372036854775807 + 1").unwrap(),
            Value::number(i64::MIN)
        );
    }

    #[test]
    fn strings_convert_by_numeric_prefix() {
        let mut interp = Interpreter::new().unwrap();
        assert_eq!(echo(&mut interp, "'3' + '4'"), "7");
        assert_eq!(echo(&mut interp, "'0x10' + 0"), "16");
        assert_eq!(echo(&mut interp, "'010' + 0"), "8");
        assert_eq!(echo(&mut interp, "'12abc' * 2"), "24");
        assert_eq!(echo(&mut interp, "'abc' + 1"), "1");
    }

    #[test]
    fn float_arithmetic() {
        let mut interp = Interpreter::new().unwrap();
        assert_eq!(echo(&mut interp, "1.5 + 1 == 2.5"), "1");
        assert_eq!(echo(&mut interp, "3 / 2.0 == 1.5"), "1");
        assert_eq!(code(interp.eval_expr("1.5 % 2")), "E804");
    }

    #[test]
    fn list_addition_builds_a_new_list() {
        let mut interp = Interpreter::new().unwrap();
        interp.execute(&["let a = [1]", "let b = a + [2]"]).unwrap();
        assert_eq!(echo(&mut interp, "string(b)"), "[1, 2]");
        assert_eq!(echo(&mut interp, "string(a)"), "[1]");
        assert_eq!(code(interp.eval_expr("[1] + {}")), "E745");
    }

    proptest! {
        #[test]
        fn integer_operators_match_machine_arithmetic(
            a in -100_000i64..100_000,
            b in -100_000i64..100_000,
        ) {
            let mut interp = Interpreter::new().unwrap();
            let eval = |interp: &mut Interpreter, text: String| interp.eval_expr(&text).unwrap();
            prop_assert_eq!(eval(&mut interp, format!("{a} + {b}")), Value::number(a + b));
            prop_assert_eq!(eval(&mut interp, format!("{a} - {b}")), Value::number(a - b));
            prop_assert_eq!(eval(&mut interp, format!("{a} * {b}")), Value::number(a * b));
            if b != 0 {
                prop_assert_eq!(eval(&mut interp, format!("{a} / {b}")), Value::number(a / b));
                prop_assert_eq!(eval(&mut interp, format!("{a} % {b}")), Value::number(a % b));
            }
        }

        #[test]
        fn decimal_strings_convert_to_their_number(n in -1_000_000_000_000i64..1_000_000_000_000) {
            let mut interp = Interpreter::new().unwrap();
            let value = interp.eval_expr(&format!("'{n}' + 0")).unwrap();
            prop_assert_eq!(value, Value::number(n));
        }
    }
}

mod string_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn quoting_forms() {
        let mut interp = Interpreter::new().unwrap();
        assert_eq!(echo(&mut interp, r#"len("a\tb")"#), "3");
        assert_eq!(echo(&mut interp, r#""\x41""#), "A");
        assert_eq!(echo(&mut interp, "'it''s'"), "it's");
        assert_eq!(echo(&mut interp, r"'a\tb'"), r"a\tb");
    }

    #[test]
    fn concatenation() {
        let mut interp = Interpreter::new().unwrap();
        assert_eq!(echo(&mut interp, "'abc' . 'def'"), "abcdef");
        assert_eq!(echo(&mut interp, "'abc' .. 1"), "abc1");
        assert_eq!(code(interp.eval_expr("'x' . 1.5")), "E806");
        assert_eq!(code(interp.eval_expr("'x' . [1]")), "E730");
    }

    #[test]
    fn indexing_and_slicing() {
        let mut interp = Interpreter::new().unwrap();
        assert_eq!(echo(&mut interp, "'hello'[1]"), "e");
        assert_eq!(echo(&mut interp, "'hello'[1:3]"), "ell");
        assert_eq!(echo(&mut interp, "'hello'[-2:]"), "lo");
        assert_eq!(echo(&mut interp, "'hello'[9]"), "");
    }

    #[test]
    fn display_of_nested_values() {
        let mut interp = Interpreter::new().unwrap();
        assert_eq!(
            echo(&mut interp, "string({'a': [1, 'x']})"),
            "{'a': [1, 'x']}"
        );
        interp.execute(&["let l = [1]", "call add(l, l)"]).unwrap();
        assert_eq!(echo(&mut interp, "string(l)"), "[1, [...]]");
    }
}

mod literal_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn dict_keys_are_converted_to_strings() {
        let mut interp = Interpreter::new().unwrap();
        assert_eq!(echo(&mut interp, "{1: 'a'}['1']"), "a");
        assert_eq!(echo(&mut interp, "{'k': 2}.k"), "2");
        assert_eq!(code(interp.eval_expr("{'a': 1, 'a': 2}")), "E721");
    }

    #[test]
    fn trailing_commas_are_allowed() {
        let mut interp = Interpreter::new().unwrap();
        assert_eq!(echo(&mut interp, "len([1, 2,])"), "2");
        assert_eq!(echo(&mut interp, "len({'a': 1,})"), "1");
    }

    #[test]
    fn malformed_literals() {
        let mut interp = Interpreter::new().unwrap();
        assert_eq!(code(interp.eval_expr("[1 2]")), "E696");
        assert_eq!(code(interp.eval_expr("[1, 2")), "E697");
        assert_eq!(code(interp.eval_expr("{'a' 1}")), "E720");
        assert_eq!(code(interp.eval_expr("{'a': 1 'b': 2}")), "E722");
        assert_eq!(code(interp.eval_expr("(1 + 2")), "E110");
    }
}
