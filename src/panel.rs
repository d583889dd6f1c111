//! Lifecycle adapter between the host and the collection scopes.
//!
//! The host creates one [`InspectionPanel`] per logical unit of work
//! (one inbound request), calls [`on_unit_start`] before any
//! application code runs and [`on_unit_finish`] once the unit is done,
//! then reads the captured calls and summary for display. Because the
//! panel instance itself is per-unit, concurrent units each see their
//! own results without any shared registry.
//!
//! [`on_unit_start`]: InspectionPanel::on_unit_start
//! [`on_unit_finish`]: InspectionPanel::on_unit_finish

use crate::record::CapturedCall;
use crate::scope::CallScope;
use serde::Serialize;
use std::time::Duration;

/// Summary over one unit of work's captured calls.
///
/// Recomputed fresh from the drained records at unit end; never
/// persisted or accumulated across units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SummaryStats {
    /// Number of captured calls.
    pub count: usize,
    /// Sum of response elapsed durations, in milliseconds.
    pub total_elapsed_ms: u64,
}

impl SummaryStats {
    /// Compute statistics from a drained record sequence.
    pub fn from_calls(calls: &[CapturedCall]) -> Self {
        let total: Duration = calls.iter().map(CapturedCall::elapsed).sum();
        Self {
            count: calls.len(),
            total_elapsed_ms: total.as_millis() as u64,
        }
    }
}

/// Per-unit-of-work inspection results.
#[derive(Debug, Default)]
pub struct InspectionPanel {
    scope: Option<CallScope>,
    calls: Vec<CapturedCall>,
    stats: SummaryStats,
}

impl InspectionPanel {
    /// Create an empty panel for one unit of work.
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin the unit of work: opens a fresh scope and returns the
    /// handle for the host to bind around the unit's execution (see
    /// [`CallScope::enter`]). Calling this again discards any scope
    /// from an earlier start; the unit always starts clean.
    pub fn on_unit_start(&mut self) -> CallScope {
        let scope = CallScope::begin();
        self.scope = Some(scope.clone());
        scope
    }

    /// Finish the unit of work: drains the scope opened by
    /// [`on_unit_start`](Self::on_unit_start) and computes the summary.
    /// Without a matching start this yields an empty result, not an
    /// error.
    pub fn on_unit_finish(&mut self) {
        self.calls = match self.scope.take() {
            Some(scope) => scope.take(),
            None => Vec::new(),
        };
        self.stats = SummaryStats::from_calls(&self.calls);
    }

    /// Captured calls of the finished unit, in completion order.
    pub fn calls(&self) -> &[CapturedCall] {
        &self.calls
    }

    /// Summary over the finished unit.
    pub fn stats(&self) -> &SummaryStats {
        &self.stats
    }

    /// Panel title for display.
    pub fn title(&self) -> &'static str {
        "HTTP Requests"
    }

    /// Human-readable one-line summary, e.g. `3 requests in 45 ms`.
    pub fn subtitle(&self) -> String {
        let noun = if self.stats.count == 1 {
            "request"
        } else {
            "requests"
        };
        format!(
            "{} {} in {} ms",
            self.stats.count, noun, self.stats.total_elapsed_ms
        )
    }
}
