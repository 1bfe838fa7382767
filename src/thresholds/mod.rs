//! Threshold expressions and their evaluation over a metrics snapshot.
mod evaluator;
mod expr;


pub use evaluator::{ThresholdOutcome, all_passed, evaluate, evaluate_one};
pub use expr::{Aggregation, Comparison, Threshold};
