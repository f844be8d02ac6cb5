//! Error types for evaluation.
//!
//! Every failure the runtime can produce is an [`EvalError`]: a coarse
//! [`ErrorKind`] that hosts and tests match on, plus a rendered message that
//! carries the legacy `Exxx:` code so hosts can show it verbatim.
//!
//! Factory functions below are the only way errors are built. Keeping the
//! messages in one place lets hosts replace them wholesale (translation,
//! alternative wording) without touching the evaluator.

use thiserror::Error;

use crate::value::Value;

/// Result of evaluation.
pub type EvalResult = Result<Value, EvalError>;

/// Coarse error category.
///
/// The category decides how an error propagates: only `Syntax` survives
/// parse-only mode, and `Interrupted` is never written to the error log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed expression or statement text.
    Syntax,
    /// Operator or operand type mismatch.
    Type,
    /// Unknown variable, function or option.
    UndefinedName,
    /// A name that is not allowed where it was used.
    IllegalName,
    /// Mutation of a locked or fixed container, or a read-only slot.
    Locked,
    /// Out-of-range list index or missing dictionary key.
    Index,
    /// Too few or too many arguments.
    Arity,
    /// Call depth or nesting depth exceeded.
    RecursionLimit,
    /// The host asked the evaluation to stop.
    Interrupted,
    /// A should-never-happen condition.
    Internal,
}

/// Evaluation error.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EvalError {
    /// Category used for propagation decisions and programmatic matching.
    pub kind: ErrorKind,
    /// Human-readable message, including the legacy error code.
    pub message: String,
}

impl EvalError {
    /// Create an error from a kind and a message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        EvalError {
            kind,
            message: message.into(),
        }
    }

    /// Whether this error is a syntax error.
    #[inline]
    pub fn is_syntax(&self) -> bool {
        self.kind == ErrorKind::Syntax
    }

    /// Whether this error came from the host abort flag.
    #[inline]
    pub fn is_interrupt(&self) -> bool {
        self.kind == ErrorKind::Interrupted
    }
}

/// Truncate a source excerpt so messages stay on one reasonable line.
fn excerpt(text: &str) -> &str {
    const MAX: usize = 60;
    if text.len() <= MAX {
        return text;
    }
    let mut end = MAX;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

// Syntax errors

pub fn invalid_expression(text: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Syntax,
        format!("E15: Invalid expression: \"{}\"", excerpt(text)),
    )
}

pub fn missing_colon_in_ternary(text: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Syntax,
        format!("E109: Missing ':' after '?': {}", excerpt(text)),
    )
}

pub fn missing_paren(text: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Syntax,
        format!("E110: Missing ')': {}", excerpt(text)),
    )
}

pub fn missing_bracket(text: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Syntax,
        format!("E111: Missing ']': {}", excerpt(text)),
    )
}

pub fn option_name_missing(text: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Syntax,
        format!("E112: Option name missing: {}", excerpt(text)),
    )
}

pub fn missing_double_quote(text: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Syntax,
        format!("E114: Missing quote: {}", excerpt(text)),
    )
}

pub fn missing_single_quote(text: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Syntax,
        format!("E115: Missing quote: {}", excerpt(text)),
    )
}

pub fn invalid_arguments(name: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Syntax,
        format!("E116: Invalid arguments for function {name}"),
    )
}

pub fn missing_list_comma(text: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Syntax,
        format!("E696: Missing comma in List: {}", excerpt(text)),
    )
}

pub fn missing_list_end(text: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Syntax,
        format!("E697: Missing end of List ']': {}", excerpt(text)),
    )
}

pub fn missing_dict_colon(text: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Syntax,
        format!("E720: Missing colon in Dictionary: {}", excerpt(text)),
    )
}

pub fn duplicate_key(key: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Syntax,
        format!("E721: Duplicate key in Dictionary: \"{key}\""),
    )
}

pub fn missing_dict_comma(text: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Syntax,
        format!("E722: Missing comma in Dictionary: {}", excerpt(text)),
    )
}

pub fn missing_dict_end(text: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Syntax,
        format!("E723: Missing end of Dictionary '}}': {}", excerpt(text)),
    )
}

pub fn trailing_characters(text: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Syntax,
        format!("E488: Trailing characters: {}", excerpt(text)),
    )
}

pub fn invalid_argument(text: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Syntax,
        format!("E475: Invalid argument: {}", excerpt(text)),
    )
}

pub fn missing_open_paren(text: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Syntax,
        format!("E124: Missing '(': {}", excerpt(text)),
    )
}

pub fn illegal_argument(name: &str) -> EvalError {
    EvalError::new(ErrorKind::Syntax, format!("E125: Illegal argument: {name}"))
}

pub fn duplicate_argument(name: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Syntax,
        format!("E853: Duplicate argument name: {name}"),
    )
}

pub fn closure_at_top_level(name: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Syntax,
        format!("E932: Closure function should not be at top level: {name}"),
    )
}

pub fn not_a_command(text: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Syntax,
        format!("E492: Not an editor command: {}", excerpt(text)),
    )
}

pub fn expected_closing_brace(text: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Syntax,
        format!("E451: Expected }}: {}", excerpt(text)),
    )
}

pub fn missing_in_after_for(text: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Syntax,
        format!("E690: Missing \"in\" after :for: {}", excerpt(text)),
    )
}

pub fn invalid_pattern(pattern: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Syntax,
        format!("E383: Invalid search string: {}", excerpt(pattern)),
    )
}

// Block structure errors

/// A block closer or continuation (`endif`, `else`, ...) with no opener.
pub fn block_without_start(command: &str) -> EvalError {
    let message = match command {
        "endif" => "E580: :endif without :if",
        "else" => "E581: :else without :if",
        "elseif" => "E582: :elseif without :if",
        "endwhile" => "E588: :endwhile without :while",
        "endfor" => "E588: :endfor without :for",
        "break" => "E587: :break without :while or :for",
        "continue" => "E586: :continue without :while or :for",
        "return" => "E133: :return not inside a function",
        _ => "E193: :endfunction not inside a function",
    };
    EvalError::new(ErrorKind::Syntax, message)
}

/// A block opener whose closer never comes.
pub fn missing_block_end(command: &str) -> EvalError {
    let message = match command {
        "if" => "E171: Missing :endif",
        "while" => "E170: Missing :endwhile",
        "for" => "E170: Missing :endfor",
        _ => "E126: Missing :endfunction",
    };
    EvalError::new(ErrorKind::Syntax, message)
}

// Type errors

/// Error for using a value of the given type where a Number is required.
pub fn not_a_number(type_name: &str) -> EvalError {
    let message = match type_name {
        "Float" => "E805: Using a Float as a Number",
        "List" => "E745: Using a List as a Number",
        "Dictionary" => "E728: Using a Dictionary as a Number",
        "Funcref" => "E703: Using a Funcref as a Number",
        _ => "E685: using an invalid value as a Number",
    };
    EvalError::new(ErrorKind::Type, message)
}

/// Error for using a value of the given type where a String is required.
pub fn not_a_string(type_name: &str) -> EvalError {
    let message = match type_name {
        "Float" => "E806: using Float as a String",
        "List" => "E730: using List as a String",
        "Dictionary" => "E731: using Dictionary as a String",
        "Funcref" => "E729: using Funcref as a String",
        _ => "E908: using an invalid value as a String",
    };
    EvalError::new(ErrorKind::Type, message)
}

/// Error for using a value of the given type where a Float is required.
pub fn not_a_float(type_name: &str) -> EvalError {
    let message = match type_name {
        "Funcref" => "E891: Using a Funcref as a Float",
        "String" => "E892: Using a String as a Float",
        "List" => "E893: Using a List as a Float",
        "Dictionary" => "E894: Using a Dictionary as a Float",
        _ => "E907: Using a special value as a Float",
    };
    EvalError::new(ErrorKind::Type, message)
}

pub fn list_compare_mismatch() -> EvalError {
    EvalError::new(ErrorKind::Type, "E691: Can only compare List with List")
}

pub fn invalid_list_operation() -> EvalError {
    EvalError::new(ErrorKind::Type, "E692: Invalid operation for List")
}

pub fn dict_compare_mismatch() -> EvalError {
    EvalError::new(
        ErrorKind::Type,
        "E735: Can only compare Dictionary with Dictionary",
    )
}

pub fn invalid_dict_operation() -> EvalError {
    EvalError::new(ErrorKind::Type, "E736: Invalid operation for Dictionary")
}

pub fn invalid_func_operation() -> EvalError {
    EvalError::new(ErrorKind::Type, "E694: Invalid operation for Funcrefs")
}

pub fn float_modulo() -> EvalError {
    EvalError::new(ErrorKind::Type, "E804: Cannot use '%' with Float")
}

pub fn cannot_index_funcref() -> EvalError {
    EvalError::new(ErrorKind::Type, "E695: Cannot index a Funcref")
}

pub fn cannot_slice_dict() -> EvalError {
    EvalError::new(ErrorKind::Type, "E719: Cannot use [:] with a Dictionary")
}

pub fn cannot_index_special() -> EvalError {
    EvalError::new(ErrorKind::Type, "E909: Cannot index a special variable")
}

pub fn cannot_index_for_assignment(type_name: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Type,
        format!("E689: Can only index a List or Dictionary, not a {type_name}"),
    )
}

pub fn list_required() -> EvalError {
    EvalError::new(ErrorKind::Type, "E714: List required")
}

pub fn dict_required() -> EvalError {
    EvalError::new(ErrorKind::Type, "E715: Dictionary required")
}

pub fn list_or_dict_required(function: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Type,
        format!("E712: Argument of {function} must be a List or Dictionary"),
    )
}

pub fn funcref_required() -> EvalError {
    EvalError::new(ErrorKind::Type, "E718: Funcref required")
}

pub fn wrong_variable_type(op: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Type,
        format!("E734: Wrong variable type for {op}="),
    )
}

pub fn slice_requires_list() -> EvalError {
    EvalError::new(ErrorKind::Type, "E709: [:] requires a List value")
}

pub fn slice_has_more_items() -> EvalError {
    EvalError::new(
        ErrorKind::Type,
        "E710: List value has more items than target",
    )
}

pub fn slice_has_fewer_items() -> EvalError {
    EvalError::new(ErrorKind::Type, "E711: List value has not enough items")
}

pub fn fewer_targets_than_items() -> EvalError {
    EvalError::new(ErrorKind::Type, "E687: Less targets than List items")
}

pub fn more_targets_than_items() -> EvalError {
    EvalError::new(ErrorKind::Type, "E688: More targets than List items")
}

pub fn invalid_len_argument() -> EvalError {
    EvalError::new(ErrorKind::Type, "E701: Invalid type for len()")
}

pub fn range_start_past_end() -> EvalError {
    EvalError::new(ErrorKind::Type, "E727: Start past end")
}

pub fn range_stride_is_zero() -> EvalError {
    EvalError::new(ErrorKind::Type, "E726: Stride is zero")
}

pub fn invalid_native_argument(text: &str) -> EvalError {
    EvalError::new(ErrorKind::Type, format!("E474: Invalid argument: {text}"))
}

// Undefined names

pub fn undefined_variable(name: &str) -> EvalError {
    EvalError::new(
        ErrorKind::UndefinedName,
        format!("E121: Undefined variable: {name}"),
    )
}

pub fn unknown_function(name: &str) -> EvalError {
    EvalError::new(
        ErrorKind::UndefinedName,
        format!("E117: Unknown function: {name}"),
    )
}

pub fn unknown_option(name: &str) -> EvalError {
    EvalError::new(
        ErrorKind::UndefinedName,
        format!("E113: Unknown option: {name}"),
    )
}

pub fn no_such_variable(name: &str) -> EvalError {
    EvalError::new(
        ErrorKind::UndefinedName,
        format!("E108: No such variable: \"{name}\""),
    )
}

pub fn unknown_function_reference(name: &str) -> EvalError {
    EvalError::new(
        ErrorKind::UndefinedName,
        format!("E700: Unknown function: {name}"),
    )
}

pub fn cannot_delete_unknown_function(name: &str) -> EvalError {
    EvalError::new(
        ErrorKind::UndefinedName,
        format!("E130: Unknown function: {name}"),
    )
}

// Illegal names

pub fn illegal_variable_name(name: &str) -> EvalError {
    EvalError::new(
        ErrorKind::IllegalName,
        format!("E461: Illegal variable name: {name}"),
    )
}

pub fn funcref_name_not_capitalized(name: &str) -> EvalError {
    EvalError::new(
        ErrorKind::IllegalName,
        format!("E704: Funcref variable name must start with a capital: {name}"),
    )
}

pub fn variable_conflicts_with_function(name: &str) -> EvalError {
    EvalError::new(
        ErrorKind::IllegalName,
        format!("E705: Variable name conflicts with existing function: {name}"),
    )
}

pub fn function_name_not_capitalized(name: &str) -> EvalError {
    EvalError::new(
        ErrorKind::IllegalName,
        format!("E128: Function name must start with a capital or \"s:\": {name}"),
    )
}

// Locked values

pub fn value_locked(name: &str) -> EvalError {
    EvalError::new(ErrorKind::Locked, format!("E741: Value is locked: {name}"))
}

pub fn value_fixed(name: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Locked,
        format!("E742: Cannot change value of {name}"),
    )
}

pub fn read_only_variable(name: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Locked,
        format!("E46: Cannot change read-only variable \"{name}\""),
    )
}

pub fn cannot_delete_variable(name: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Locked,
        format!("E795: Cannot delete variable {name}"),
    )
}

pub fn function_exists(name: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Locked,
        format!("E122: Function {name} already exists, add ! to replace it"),
    )
}

pub fn function_in_use(name: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Locked,
        format!("E127: Cannot redefine function {name}: It is in use"),
    )
}

// Index errors

pub fn list_index_out_of_range(index: i64) -> EvalError {
    EvalError::new(
        ErrorKind::Index,
        format!("E684: list index out of range: {index}"),
    )
}

pub fn key_not_present(key: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Index,
        format!("E716: Key not present in Dictionary: {key}"),
    )
}

pub fn key_already_exists(key: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Index,
        format!("E737: Key already exists: {key}"),
    )
}

pub fn dict_entry_exists(key: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Index,
        format!("E717: Dictionary entry already exists: {key}"),
    )
}

// Arity errors

pub fn too_many_arguments(name: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Arity,
        format!("E118: Too many arguments for function: {name}"),
    )
}

pub fn not_enough_arguments(name: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Arity,
        format!("E119: Not enough arguments for function: {name}"),
    )
}

pub fn too_many_parameters(name: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Arity,
        format!("E740: Too many arguments for function {name}"),
    )
}

pub fn dict_function_without_dict(name: &str) -> EvalError {
    EvalError::new(
        ErrorKind::Arity,
        format!("E725: Calling dict function without Dictionary: {name}"),
    )
}

// Recursion limits

pub fn call_depth_exceeded() -> EvalError {
    EvalError::new(
        ErrorKind::RecursionLimit,
        "E132: Function call depth is higher than 'maxfuncdepth'",
    )
}

pub fn copy_nested_too_deep() -> EvalError {
    EvalError::new(
        ErrorKind::RecursionLimit,
        "E698: variable nested too deep for making a copy",
    )
}

pub fn lock_nested_too_deep() -> EvalError {
    EvalError::new(
        ErrorKind::RecursionLimit,
        "E743: variable nested too deep for (un)lock",
    )
}

// Host interaction and internal errors

pub fn interrupted() -> EvalError {
    EvalError::new(ErrorKind::Interrupted, "Interrupted")
}

pub fn internal_error(what: &str) -> EvalError {
    EvalError::new(ErrorKind::Internal, format!("E685: Internal error: {what}"))
}

#[cfg(test)]
mod tests;
