//! Virtual-user iteration loop, its fixed checks and think-time pacing.
mod checks;
mod runner;
mod think;


pub use checks::{Check, CheckCount, CheckResults, CheckTally, run_checks};
pub use runner::{VuContext, VuExit, VuRunner};
pub use think::{DEFAULT_THINK_MAX, DEFAULT_THINK_MIN, ThinkTime};
