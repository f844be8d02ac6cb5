//! Lexical helpers for the text-walking evaluator.
//!
//! There is no token stream: every grammar level reads directly from a
//! [`Cursor`] over the source text. This module holds the cursor and the
//! literal scanners shared by the evaluator and the command layer.

mod cursor;
mod literal;

pub use cursor::Cursor;
pub use literal::{scan_double_quoted, scan_number, scan_single_quoted};
