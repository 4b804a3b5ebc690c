//! Health-state merge lattice.
//!
//! States are totally ordered best to worst:
//! `Healthy < Progressing < Unknown < Unhealthy`. Merging two states yields the
//! worse one, so folding any number of check outcomes never hides the worst
//! condition observed. `Healthy` is the identity element.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Aggregate or per-check health verdict.
///
/// Variant order is significant: the derived `Ord` is the lattice order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum HealthState {
    #[default]
    Healthy,
    Progressing,
    Unknown,
    Unhealthy,
}

impl HealthState {
    /// All states, best first.
    pub const ALL: [HealthState; 4] = [
        HealthState::Healthy,
        HealthState::Progressing,
        HealthState::Unknown,
        HealthState::Unhealthy,
    ];

    /// Return the worse of `self` and `other`.
    pub fn merge(self, other: HealthState) -> HealthState {
        self.max(other)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HealthState::Healthy => "Healthy",
            HealthState::Progressing => "Progressing",
            HealthState::Unknown => "Unknown",
            HealthState::Unhealthy => "Unhealthy",
        }
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fold a sequence of states with [`HealthState::merge`].
///
/// An empty sequence yields `Healthy`.
pub fn merge_all<I>(states: I) -> HealthState
where
    I: IntoIterator<Item = HealthState>,
{
    states
        .into_iter()
        .fold(HealthState::Healthy, HealthState::merge)
}
