//! Tests for the statement layer: blocks, loops, function definitions and
//! line handling.

use pretty_assertions::assert_eq;

use crate::{EvalError, Interpreter};

fn run(lines: &[&str]) -> Interpreter {
    let mut interp = Interpreter::new().unwrap();
    interp
        .execute(lines)
        .unwrap_or_else(|err| panic!("{lines:?}: {err}"));
    interp
}

fn show(interp: &mut Interpreter, text: &str) -> String {
    interp
        .eval_expr(text)
        .unwrap_or_else(|err| panic!("{text}: {err}"))
        .to_echo_string()
}

fn code<T: std::fmt::Debug>(result: Result<T, EvalError>) -> String {
    let err = result.unwrap_err();
    err.message.split(':').next().unwrap_or_default().to_string()
}

mod conditional_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn classify() -> Interpreter {
        run(&[
            "function! Classify(n)",
            "  if a:n < 0",
            "    return 'neg'",
            "  elseif a:n == 0",
            "    return 'zero'",
            "  else",
            "    return 'pos'",
            "  endif",
            "endfunction",
        ])
    }

    #[test]
    fn branches_are_tried_in_order() {
        let mut interp = classify();
        assert_eq!(show(&mut interp, "Classify(-3)"), "neg");
        assert_eq!(show(&mut interp, "Classify(0)"), "zero");
        assert_eq!(show(&mut interp, "Classify(8)"), "pos");
    }

    #[test]
    fn nested_conditionals_at_top_level() {
        let mut interp = run(&[
            "let out = ''",
            "if 1",
            "  if 0",
            "    let out = 'inner'",
            "  else",
            "    let out = 'else'",
            "  endif",
            "endif",
        ]);
        assert_eq!(show(&mut interp, "out"), "else");
    }
}

mod loop_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn while_with_break_and_continue() {
        let mut interp = run(&[
            "let total = 0",
            "let i = 0",
            "while i < 10",
            "  let i += 1",
            "  if i % 2",
            "    continue",
            "  endif",
            "  if i > 8",
            "    break",
            "  endif",
            "  let total += i",
            "endwhile",
        ]);
        assert_eq!(show(&mut interp, "total"), "20");
        assert_eq!(show(&mut interp, "i"), "10");
    }

    #[test]
    fn for_destructures_items() {
        let mut interp = run(&[
            "let acc = ''",
            "for [k, v] in items({'a': 1, 'b': 2})",
            "  let acc .= k . v",
            "endfor",
        ]);
        assert_eq!(show(&mut interp, "acc"), "a1b2");
    }

    #[test]
    fn for_sees_items_added_by_the_body() {
        let mut interp = run(&[
            "let seen = []",
            "let src = [1, 2]",
            "for x in src",
            "  call add(seen, x)",
            "  if x == 1",
            "    call add(src, 3)",
            "  endif",
            "endfor",
        ]);
        assert_eq!(show(&mut interp, "string(seen)"), "[1, 2, 3]");
    }

    #[test]
    fn for_needs_a_list() {
        let mut interp = Interpreter::new().unwrap();
        assert_eq!(code(interp.execute(&["for x in 5", "endfor"])), "E714");
        assert_eq!(code(interp.execute(&["for x [1]", "endfor"])), "E690");
    }

    #[test]
    fn return_leaves_nested_loops() {
        let mut interp = run(&[
            "function! Find(list, wanted)",
            "  for row in a:list",
            "    for item in row",
            "      if item == a:wanted",
            "        return row",
            "      endif",
            "    endfor",
            "  endfor",
            "  return []",
            "endfunction",
        ]);
        assert_eq!(show(&mut interp, "string(Find([[1, 2], [3, 4]], 3))"), "[3, 4]");
        assert_eq!(show(&mut interp, "string(Find([[1]], 9))"), "[]");
    }
}

mod block_structure_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unbalanced_blocks() {
        let mut interp = Interpreter::new().unwrap();
        assert_eq!(code(interp.execute(&["if 1", "let x = 1"])), "E171");
        assert_eq!(code(interp.execute(&["while 0"])), "E170");
        assert_eq!(code(interp.execute(&["for x in []"])), "E170");
        assert_eq!(code(interp.execute(&["endif"])), "E580");
        assert_eq!(code(interp.execute(&["else"])), "E581");
        assert_eq!(code(interp.execute(&["endwhile"])), "E588");
        assert_eq!(code(interp.execute(&["function! F()", "return 1"])), "E126");
        assert_eq!(code(interp.execute(&["endfunction"])), "E193");
    }

    #[test]
    fn structure_errors_come_before_any_line_runs() {
        let mut interp = Interpreter::new().unwrap();
        assert!(interp.execute(&["let g:ran = 1", "endif"]).is_err());
        assert_eq!(interp.global("ran"), None);
    }

    #[test]
    fn flow_commands_outside_their_blocks() {
        let mut interp = Interpreter::new().unwrap();
        assert_eq!(code(interp.execute(&["break"])), "E587");
        assert_eq!(code(interp.execute(&["continue"])), "E586");
        assert_eq!(code(interp.execute(&["return 1"])), "E133");
    }
}

mod line_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn abbreviations() {
        let mut interp = run(&["fu! Abbrev()", "retu 5", "endf", "cal Abbrev()"]);
        assert_eq!(show(&mut interp, "Abbrev()"), "5");
    }

    #[test]
    fn continuation_lines_and_comments() {
        let mut interp = run(&[
            "\" leading comment",
            "let l = [1,",
            "      \\ 2,",
            "      \\ 3]",
            "",
            ":let y = len(l) \" trailing comment",
        ]);
        assert_eq!(show(&mut interp, "y"), "3");
    }

    #[test]
    fn unknown_commands() {
        let mut interp = Interpreter::new().unwrap();
        assert_eq!(code(interp.execute(&["frobnicate"])), "E492");
        assert_eq!(code(interp.execute(&["1 + 1"])), "E492");
    }

    #[test]
    fn call_discards_the_result() {
        let mut interp = run(&["let l = []", "call add(l, 1)", "call len(l)"]);
        assert_eq!(show(&mut interp, "string(l)"), "[1]");
        assert_eq!(code(interp.execute(&["call len(l) junk"])), "E488");
    }
}

mod definition_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn nested_definitions_happen_when_the_body_runs() {
        let mut interp = run(&[
            "function! Outer()",
            "  function! Inner()",
            "    return 'inner'",
            "  endfunction",
            "  return Inner()",
            "endfunction",
        ]);
        assert!(!interp.function_exists("Inner"));
        assert_eq!(show(&mut interp, "Outer()"), "inner");
        assert!(interp.function_exists("Inner"));
    }

    #[test]
    fn delfunction() {
        let mut interp = run(&["function! Temp()", "endfunction", "delfunction Temp"]);
        assert!(!interp.function_exists("Temp"));
        assert_eq!(code(interp.execute(&["delfunction Nope"])), "E130");
        interp.execute(&["delfunction! Nope"]).unwrap();
    }

    #[test]
    fn delfunction_on_dict_entries() {
        let mut interp = run(&[
            "let obj = {}",
            "function! obj.go() dict",
            "endfunction",
            "delfunction obj.go",
        ]);
        assert_eq!(show(&mut interp, "has_key(obj, 'go')"), "0");
    }

    #[test]
    fn varargs() {
        let mut interp = run(&[
            "function! Collect(first, ...)",
            "  return a:0 . ':' . a:first . ':' . join(a:000, ',') . ':' . a:1",
            "endfunction",
        ]);
        assert_eq!(show(&mut interp, "Collect('x', 1, 2)"), "2:x:1,2:1");
        assert_eq!(code(interp.eval_expr("Collect()")), "E119");
    }

    #[test]
    fn fixed_arity() {
        let mut interp = run(&["function! One(a)", "  return a:a", "endfunction"]);
        assert_eq!(code(interp.eval_expr("One()")), "E119");
        assert_eq!(code(interp.eval_expr("One(1, 2)")), "E118");
    }

    #[test]
    fn header_errors() {
        let mut interp = Interpreter::new().unwrap();
        assert_eq!(code(interp.execute(&["function! NoParens", "endfunction"])), "E124");
        assert_eq!(code(interp.execute(&["function! Bad(a, a)", "endfunction"])), "E853");
        assert_eq!(code(interp.execute(&["function! Odd() sometimes", "endfunction"])), "E488");
        assert_eq!(code(interp.execute(&["function! lower()", "endfunction"])), "E128");
    }

    #[test]
    fn return_without_value_is_zero() {
        let mut interp = run(&["function! Nothing()", "  return", "endfunction"]);
        assert_eq!(show(&mut interp, "Nothing()"), "0");
    }

    #[test]
    fn local_variables_are_per_call() {
        let mut interp = run(&[
            "function! Fact(n)",
            "  if a:n <= 1",
            "    return 1",
            "  endif",
            "  let below = Fact(a:n - 1)",
            "  return a:n * below",
            "endfunction",
        ]);
        assert_eq!(show(&mut interp, "Fact(10)"), "3628800");
    }
}
