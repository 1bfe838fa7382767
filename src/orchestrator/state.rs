use std::fmt;

/// Why a run ended without a threshold verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// The health check failed; carries the rendered error.
    SetupFailed(String),
    /// Ctrl-C or SIGTERM during the run.
    Interrupted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    /// Sources of the thresholds that failed, e.g. `http_req_duration: p(95)<500`.
    Failed { failed: Vec<String> },
    Aborted { reason: AbortReason },
}

pub const EXIT_PASSED: u8 = 0;
pub const EXIT_THRESHOLDS_FAILED: u8 = 99;
pub const EXIT_INTERRUPTED: u8 = 105;
pub const EXIT_SETUP_FAILED: u8 = 107;

impl Verdict {
    #[must_use]
    pub const fn is_pass(&self) -> bool {
        matches!(self, Verdict::Passed)
    }

    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Verdict::Passed => EXIT_PASSED,
            Verdict::Failed { .. } => EXIT_THRESHOLDS_FAILED,
            Verdict::Aborted {
                reason: AbortReason::Interrupted,
            } => EXIT_INTERRUPTED,
            Verdict::Aborted {
                reason: AbortReason::SetupFailed(_),
            } => EXIT_SETUP_FAILED,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Passed => f.write_str("passed"),
            Verdict::Failed { failed } => {
                write!(f, "failed ({} threshold(s) crossed)", failed.len())
            }
            Verdict::Aborted {
                reason: AbortReason::Interrupted,
            } => f.write_str("aborted (interrupted)"),
            Verdict::Aborted {
                reason: AbortReason::SetupFailed(err),
            } => write!(f, "aborted (setup failed: {})", err),
        }
    }
}

/// Lifecycle of a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestState {
    Idle,
    Setup,
    Running,
    TearingDown,
    Completed(Verdict),
}

impl TestState {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            TestState::Idle => "idle",
            TestState::Setup => "setup",
            TestState::Running => "running",
            TestState::TearingDown => "tearing_down",
            TestState::Completed(_) => "completed",
        }
    }

    /// Setup may skip straight to `Completed` when the health check fails.
    #[must_use]
    pub const fn can_transition_to(&self, next: &TestState) -> bool {
        matches!(
            (self, next),
            (TestState::Idle, TestState::Setup)
                | (TestState::Setup, TestState::Running | TestState::Completed(_))
                | (TestState::Running, TestState::TearingDown)
                | (TestState::TearingDown, TestState::Completed(_))
        )
    }
}

/// Ordered record of every state a run passed through.
#[derive(Debug, Clone)]
pub struct StateLog {
    history: Vec<TestState>,
}

impl StateLog {
    #[must_use]
    pub fn new() -> Self {
        Self {
            history: vec![TestState::Idle],
        }
    }

    #[must_use]
    pub fn current(&self) -> &TestState {
        self.history.last().unwrap_or(&TestState::Idle)
    }

    /// Record `next`; illegal moves are logged and ignored.
    pub fn transition(&mut self, next: TestState) {
        if !self.current().can_transition_to(&next) {
            tracing::warn!(
                "Ignoring illegal state transition {} -> {}",
                self.current().name(),
                next.name()
            );
            return;
        }
        tracing::debug!("State {} -> {}", self.current().name(), next.name());
        self.history.push(next);
    }

    #[must_use]
    pub fn into_history(self) -> Vec<TestState> {
        self.history
    }
}

impl Default for StateLog {
    fn default() -> Self {
        Self::new()
    }
}
