//! Language-level tests that drive the interpreter through its host entry
//! points.
//!
//! Unit tests for individual modules live next to them; these exercise
//! whole statements and expressions the way scripts use them.

mod command_tests;
mod expression_tests;
