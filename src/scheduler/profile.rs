use std::time::Duration;

use crate::error::ConfigError;

/// One ramp segment: move linearly from the previous target to `target`
/// over `duration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub duration: Duration,
    pub target: u64,
}

impl Stage {
    #[must_use]
    pub const fn new(duration: Duration, target: u64) -> Self {
        Self { duration, target }
    }
}

/// Ordered, validated stage list. The run starts from zero VUs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RampProfile {
    stages: Vec<Stage>,
    total: Duration,
}

impl RampProfile {
    /// # Errors
    ///
    /// Returns an error when `stages` is empty or a stage has a zero
    /// duration.
    pub fn new(stages: Vec<Stage>) -> Result<Self, ConfigError> {
        if stages.is_empty() {
            return Err(ConfigError::NoStages);
        }
        if let Some(index) = stages.iter().position(|stage| stage.duration.is_zero()) {
            return Err(ConfigError::StageDurationZero { index });
        }
        let total = stages
            .iter()
            .fold(Duration::ZERO, |acc, stage| acc.saturating_add(stage.duration));
        Ok(Self { stages, total })
    }

    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    #[must_use]
    pub const fn total_duration(&self) -> Duration {
        self.total
    }

    /// Highest target of any stage.
    #[must_use]
    pub fn peak(&self) -> u64 {
        self.stages
            .iter()
            .map(|stage| stage.target)
            .max()
            .unwrap_or(0)
    }

    /// Index of the stage active at `elapsed`, `None` once the profile is
    /// exhausted.
    #[must_use]
    pub fn stage_index_at(&self, elapsed: Duration) -> Option<usize> {
        let mut end = Duration::ZERO;
        for (index, stage) in self.stages.iter().enumerate() {
            end = end.saturating_add(stage.duration);
            if elapsed < end {
                return Some(index);
            }
        }
        None
    }

    /// Desired VU count at `elapsed`.
    ///
    /// Linear interpolation inside a stage, rounded away from the previous
    /// target while ramping up and toward fewer VUs while ramping down, so a
    /// rising stage gets its first VU within the stage. Every stage boundary
    /// yields the configured target exactly. Past the end the last target
    /// holds.
    #[must_use]
    pub fn target_at(&self, elapsed: Duration) -> u64 {
        let mut start_target: u64 = 0;
        let mut stage_start = Duration::ZERO;
        for stage in &self.stages {
            let stage_end = stage_start.saturating_add(stage.duration);
            if elapsed < stage_end {
                let offset = elapsed.saturating_sub(stage_start);
                return interpolate(start_target, stage.target, offset, stage.duration);
            }
            start_target = stage.target;
            stage_start = stage_end;
        }
        start_target
    }
}

fn interpolate(start: u64, target: u64, offset: Duration, duration: Duration) -> u64 {
    let start_i128 = i128::from(start);
    let delta = i128::from(target).saturating_sub(start_i128);
    let offset_us = i128::try_from(offset.as_micros()).unwrap_or(i128::MAX);
    let duration_us = i128::try_from(duration.as_micros()).unwrap_or(i128::MAX);

    let scaled = delta.saturating_mul(offset_us);
    let step = if delta > 0 {
        scaled
            .saturating_add(duration_us.saturating_sub(1))
            .checked_div_euclid(duration_us)
    } else {
        scaled.checked_div_euclid(duration_us)
    }
    .unwrap_or(0);
    let value = start_i128.saturating_add(step);
    if value < 0 {
        0
    } else {
        u64::try_from(value).unwrap_or(u64::MAX)
    }
}
