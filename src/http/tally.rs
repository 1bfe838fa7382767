use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{TransportError, TransportErrorKind};

/// Per-kind count of requests that never produced a complete response.
#[derive(Debug, Default)]
pub struct TransportTally {
    counts: [AtomicU64; 6],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportErrorCount {
    pub kind: TransportErrorKind,
    pub count: u64,
}

impl TransportTally {
    pub fn record(&self, error: &TransportError) {
        if let Some(cell) = self.counts.get(error.kind.index()) {
            cell.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Kinds seen at least once, in declaration order.
    #[must_use]
    pub fn counts(&self) -> Vec<TransportErrorCount> {
        TransportErrorKind::ALL
            .iter()
            .filter_map(|kind| {
                let count = self
                    .counts
                    .get(kind.index())
                    .map_or(0, |cell| cell.load(Ordering::Relaxed));
                (count > 0).then_some(TransportErrorCount { kind: *kind, count })
            })
            .collect()
    }
}
