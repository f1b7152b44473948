//! Reduces the set of running players to a single authoritative one.

use scrobblebar_core::{Player, PlayerStatus};

/// Picks the active player: a Playing player always beats a Paused one, and
/// within a tier the last player in the input ordering wins. Two
/// simultaneously playing apps are otherwise indistinguishable, so the
/// enumeration order is the tie-break. Stopped and NotOpen players are never
/// selected.
pub fn resolve(players: &[Player]) -> Option<Player> {
    if let Some(playing) = players
        .iter()
        .rev()
        .find(|p| p.status == PlayerStatus::Playing)
    {
        return Some(*playing);
    }
    players
        .iter()
        .rev()
        .find(|p| p.status == PlayerStatus::Paused)
        .copied()
}
