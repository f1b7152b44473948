//! Assembles fresh [`Player`] snapshots for every running player.

use crate::registry;
use scrobblebar_core::{ListenerKind, Player, PlayerKind, PlayerStatus};
use scrobblebar_osa::{invoke, ScriptBridge};
use tracing::debug;

/// Collects the state of every running candidate player.
///
/// Costs two batched channel calls (players running, listeners running) plus
/// one status query per running player. A player whose status query fails is
/// dropped for this tick; the others still come back.
pub async fn collect(bridge: &dyn ScriptBridge, kinds: &[PlayerKind]) -> Vec<Player> {
    let player_ids: Vec<&str> = kinds.iter().map(|k| k.bundle_id()).collect();
    let running = registry::check_running(bridge, &player_ids).await;

    let listener_ids: Vec<&str> = ListenerKind::ALL.iter().map(|l| l.bundle_id()).collect();
    let listener_flags = registry::check_running(bridge, &listener_ids).await;
    let running_listeners: Vec<ListenerKind> = ListenerKind::ALL
        .iter()
        .zip(listener_flags)
        .filter_map(|(listener, up)| up.then_some(*listener))
        .collect();

    let mut players = Vec::new();
    for (kind, is_running) in kinds.iter().zip(running) {
        if !is_running {
            continue;
        }
        let raw = match invoke(bridge, kind.bundle_id(), "player state as string").await {
            Ok(raw) => raw,
            Err(err) => {
                debug!(player = kind.display_name(), error = %err, "status query failed; skipping player this tick");
                continue;
            }
        };
        players.push(Player {
            kind: *kind,
            status: PlayerStatus::from_raw(&raw),
            scrobbling: scrobbling_ready(*kind, &running_listeners),
        });
    }
    players
}

/// A player can log plays when it needs no listener at all, or when at least
/// one compatible listener is up.
fn scrobbling_ready(kind: PlayerKind, running_listeners: &[ListenerKind]) -> bool {
    let compatible = kind.compatible_listeners();
    compatible.is_empty()
        || compatible
            .iter()
            .any(|listener| running_listeners.contains(listener))
}

#[cfg(test)]
mod tests {
    use super::collect;
    use crate::testutil::FakeBridge;
    use scrobblebar_core::{PlayerKind, PlayerStatus};

    #[tokio::test]
    async fn collects_running_players_with_status_and_eligibility() {
        let bridge = FakeBridge::new();
        // Music and Spotify running, Swinsian and Vox not.
        bridge.push_ok("true\nfalse\nfalse\ntrue");
        // NepTunes up, LastFm and Bowtie down.
        bridge.push_ok("false\ntrue\nfalse");
        bridge.push_ok("playing"); // Music
        bridge.push_ok("paused"); // Spotify

        let players = collect(&bridge, &PlayerKind::ALL).await;

        assert_eq!(players.len(), 2);
        assert_eq!(players[0].kind, PlayerKind::Music);
        assert_eq!(players[0].status, PlayerStatus::Playing);
        assert!(players[0].scrobbling); // NepTunes covers Music
        assert_eq!(players[1].kind, PlayerKind::Spotify);
        assert_eq!(players[1].status, PlayerStatus::Paused);
        assert!(players[1].scrobbling); // native scrobbler, no listener needed
    }

    #[tokio::test]
    async fn listener_gap_clears_eligibility() {
        let bridge = FakeBridge::new();
        bridge.push_ok("false\nfalse\ntrue\nfalse"); // only Vox running
        bridge.push_ok("false\ntrue\nfalse"); // NepTunes up, but Vox needs LastFm
        bridge.push_ok("playing");

        let players = collect(&bridge, &PlayerKind::ALL).await;

        assert_eq!(players.len(), 1);
        assert_eq!(players[0].kind, PlayerKind::Vox);
        assert!(!players[0].scrobbling);
    }

    #[tokio::test]
    async fn one_failing_player_does_not_abort_the_rest() {
        let bridge = FakeBridge::new();
        bridge.push_ok("true\ntrue\nfalse\nfalse"); // Music and Swinsian running
        bridge.push_ok("false\nfalse\nfalse");
        bridge.push_err("Music got an error: connection is invalid");
        bridge.push_ok("1"); // legacy numeric code from Swinsian

        let players = collect(&bridge, &PlayerKind::ALL).await;

        assert_eq!(players.len(), 1);
        assert_eq!(players[0].kind, PlayerKind::Swinsian);
        assert_eq!(players[0].status, PlayerStatus::Playing);
    }

    #[tokio::test]
    async fn unrecognized_status_counts_as_stopped() {
        let bridge = FakeBridge::new();
        bridge.push_ok("true\nfalse\nfalse\nfalse");
        bridge.push_ok("false\nfalse\nfalse");
        bridge.push_ok("rewinding");

        let players = collect(&bridge, &PlayerKind::ALL).await;

        assert_eq!(players.len(), 1);
        assert_eq!(players[0].status, PlayerStatus::Stopped);
    }

    #[tokio::test]
    async fn nothing_running_costs_exactly_two_batched_calls() {
        let bridge = FakeBridge::new();
        bridge.push_ok("false\nfalse\nfalse\nfalse");
        bridge.push_ok("false\nfalse\nfalse");

        let players = collect(&bridge, &PlayerKind::ALL).await;

        assert!(players.is_empty());
        assert_eq!(bridge.call_count(), 2);
    }
}
