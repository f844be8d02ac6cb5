use super::*;

// Kind and message

#[test]
fn undefined_variable_has_correct_kind() {
    let err = undefined_variable("g:nope");
    assert_eq!(err.kind, ErrorKind::UndefinedName);
    assert_eq!(err.message, "E121: Undefined variable: g:nope");
}

#[test]
fn list_index_reports_the_index() {
    let err = list_index_out_of_range(-7);
    assert_eq!(err.kind, ErrorKind::Index);
    assert_eq!(err.message, "E684: list index out of range: -7");
}

#[test]
fn not_a_number_picks_message_per_type() {
    assert_eq!(not_a_number("Float").message, "E805: Using a Float as a Number");
    assert_eq!(not_a_number("List").message, "E745: Using a List as a Number");
    assert_eq!(
        not_a_number("Dictionary").message,
        "E728: Using a Dictionary as a Number"
    );
    assert_eq!(not_a_number("Funcref").kind, ErrorKind::Type);
}

#[test]
fn not_a_string_picks_message_per_type() {
    assert_eq!(not_a_string("List").message, "E730: using List as a String");
    assert_eq!(
        not_a_string("Dictionary").message,
        "E731: using Dictionary as a String"
    );
    assert_eq!(not_a_string("Special").kind, ErrorKind::Type);
}

#[test]
fn lock_errors_are_locked_kind() {
    assert_eq!(value_locked("l").kind, ErrorKind::Locked);
    assert_eq!(value_fixed("a:000").kind, ErrorKind::Locked);
    assert_eq!(read_only_variable("v:true").kind, ErrorKind::Locked);
    assert_eq!(cannot_delete_variable("a:x").kind, ErrorKind::Locked);
}

#[test]
fn arity_errors_are_arity_kind() {
    assert_eq!(too_many_arguments("F").kind, ErrorKind::Arity);
    assert_eq!(not_enough_arguments("F").kind, ErrorKind::Arity);
    assert_eq!(
        not_enough_arguments("F").message,
        "E119: Not enough arguments for function: F"
    );
}

// Display

#[test]
fn block_errors_name_the_command() {
    assert!(block_without_start("endwhile").message.starts_with("E588"));
    assert!(block_without_start("return").message.starts_with("E133"));
    assert!(missing_block_end("if").message.starts_with("E171"));
    assert!(missing_block_end("function").message.starts_with("E126"));
    assert!(missing_block_end("for").is_syntax());
}

#[test]
fn display_is_the_message() {
    let err = missing_paren("(1 + 2");
    assert_eq!(err.to_string(), "E110: Missing ')': (1 + 2");
}

#[test]
fn long_excerpts_are_truncated() {
    let text = "x".repeat(200);
    let err = invalid_expression(&text);
    assert!(err.message.len() < 100);
}

#[test]
fn excerpt_truncation_respects_char_boundaries() {
    let text = "é".repeat(100);
    let err = trailing_characters(&text);
    assert!(err.message.starts_with("E488: Trailing characters: é"));
}

// Predicates

#[test]
fn syntax_predicate() {
    assert!(missing_list_end("[1").is_syntax());
    assert!(!list_required().is_syntax());
}

#[test]
fn interrupt_predicate() {
    assert!(interrupted().is_interrupt());
    assert!(!internal_error("x").is_interrupt());
}
