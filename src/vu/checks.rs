use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::error::TransportError;
use crate::http::RequestResult;

const FAST_RESPONSE: Duration = Duration::from_millis(500);
const SLOW_RESPONSE: Duration = Duration::from_millis(1000);
const EXPECTED_STATUS: u16 = 200;

/// The fixed per-iteration checks, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    StatusIs200,
    Under500ms,
    Under1000ms,
    HasBody,
}

impl Check {
    pub const ALL: [Check; 4] = [
        Check::StatusIs200,
        Check::Under500ms,
        Check::Under1000ms,
        Check::HasBody,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Check::StatusIs200 => "status is 200",
            Check::Under500ms => "response time < 500ms",
            Check::Under1000ms => "response time < 1000ms",
            Check::HasBody => "response has body",
        }
    }

    const fn index(self) -> usize {
        match self {
            Check::StatusIs200 => 0,
            Check::Under500ms => 1,
            Check::Under1000ms => 2,
            Check::HasBody => 3,
        }
    }

    /// A transport failure fails every check.
    #[must_use]
    pub fn evaluate(self, outcome: &Result<RequestResult, TransportError>) -> bool {
        let Ok(result) = outcome else {
            return false;
        };
        match self {
            Check::StatusIs200 => result.status == EXPECTED_STATUS,
            Check::Under500ms => result.duration < FAST_RESPONSE,
            Check::Under1000ms => result.duration < SLOW_RESPONSE,
            Check::HasBody => result.body_bytes > 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckResults {
    passed: [bool; 4],
}

impl CheckResults {
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.passed.iter().all(|passed| *passed)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Check, bool)> + '_ {
        Check::ALL.into_iter().zip(self.passed.iter().copied())
    }
}

#[must_use]
pub fn run_checks(outcome: &Result<RequestResult, TransportError>) -> CheckResults {
    CheckResults {
        passed: Check::ALL.map(|check| check.evaluate(outcome)),
    }
}

/// Pass/fail tallies per check across the whole run.
#[derive(Debug, Default)]
pub struct CheckTally {
    passes: [AtomicU64; 4],
    fails: [AtomicU64; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckCount {
    pub check: Check,
    pub passes: u64,
    pub fails: u64,
}

impl CheckTally {
    pub fn record(&self, results: &CheckResults) {
        for (check, passed) in results.iter() {
            let cells = if passed { &self.passes } else { &self.fails };
            if let Some(cell) = cells.get(check.index()) {
                cell.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    #[must_use]
    pub fn counts(&self) -> Vec<CheckCount> {
        Check::ALL
            .iter()
            .map(|check| CheckCount {
                check: *check,
                passes: load(&self.passes, check.index()),
                fails: load(&self.fails, check.index()),
            })
            .collect()
    }
}

fn load(cells: &[AtomicU64; 4], idx: usize) -> u64 {
    cells
        .get(idx)
        .map_or(0, |cell| cell.load(Ordering::Relaxed))
}
