//! Per-call routing diagnostics.

/// Degenerate-routing counters for one routing decision.
///
/// Neither a dropped unit nor an idle expert is an error; these counters
/// exist so callers can log or alert on them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingStats {
    /// Units routed to no expert.
    pub dropped_units: usize,
    /// Experts that received no units.
    pub idle_experts: usize,
    /// Units per expert.
    pub part_sizes: Vec<usize>,
}

impl RoutingStats {
    /// Total routed (unit, expert) edges.
    #[must_use]
    pub fn total_edges(&self) -> usize {
        self.part_sizes.iter().sum()
    }

    /// True when every unit was routed and every expert received work.
    #[must_use]
    pub fn is_balanced_coverage(&self) -> bool {
        self.dropped_units == 0 && self.idle_experts == 0
    }
}
