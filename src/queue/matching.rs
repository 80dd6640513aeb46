//! Preference compatibility rules for pairing players
//!
//! This module holds the matching policy the waiting queue applies when it
//! scans for a pair: two players are compatible when every preference axis
//! agrees or is left open by at least one side.

use crate::types::{MatchPreferences, Player};

/// Check a single preference axis.
///
/// An axis is compatible when either side leaves it unspecified, or both
/// sides specify the same value.
fn axis_compatible(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(lhs), Some(rhs)) => lhs == rhs,
        _ => true,
    }
}

/// Check whether two preference sets allow a pairing.
///
/// Any axis where both sides specify different values rejects the pair.
pub fn preferences_compatible(a: &MatchPreferences, b: &MatchPreferences) -> bool {
    axis_compatible(a.difficulty.as_deref(), b.difficulty.as_deref())
        && axis_compatible(a.game_type.as_deref(), b.game_type.as_deref())
}

/// Check whether two players can be paired
pub fn players_compatible(a: &Player, b: &Player) -> bool {
    preferences_compatible(&a.preferences, &b.preferences)
}
