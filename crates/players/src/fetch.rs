//! Fetches the current track of the active player in one round trip.

use scrobblebar_core::{Player, PlayerKind, Track};
use scrobblebar_osa::{split_lines, ScriptBridge};
use tracing::debug;

/// Property names for the five track fields, per player kind. Vox speaks its
/// own dialect; everything else follows the iTunes suite.
struct TrackQueries {
    title: &'static str,
    artist: &'static str,
    album: &'static str,
    position: &'static str,
    duration: &'static str,
}

fn queries(kind: PlayerKind) -> TrackQueries {
    match kind {
        PlayerKind::Vox => TrackQueries {
            title: "track",
            artist: "artist",
            album: "album",
            position: "current time",
            duration: "total time",
        },
        _ => TrackQueries {
            title: "name of current track",
            artist: "artist of current track",
            album: "album of current track",
            position: "player position",
            duration: "duration of current track",
        },
    }
}

/// One script fetching all five fields. Each field sits in its own `try`
/// block so a missing value lands as an empty string instead of failing the
/// batch.
fn track_script(kind: PlayerKind) -> String {
    let q = queries(kind);
    let mut body = String::new();
    for property in [q.title, q.artist, q.album, q.position, q.duration] {
        body.push_str(&format!(
            "    try\n        set end of out to ({property} as text)\n    on error\n        set end of out to \"\"\n    end try\n"
        ));
    }
    format!(
        "tell application id \"{id}\"\n    set out to {{}}\n{body}end tell\nset AppleScript's text item delimiters to linefeed\nreturn out as text",
        id = kind.bundle_id()
    )
}

/// Fetches the player's current track, or `None` when the player refuses the
/// whole query (e.g. it quit between the running check and this call).
pub async fn fetch_track(bridge: &dyn ScriptBridge, player: &Player) -> Option<Track> {
    let source = track_script(player.kind);
    let output = match bridge.run_script(&source, &[]).await {
        Ok(output) => output,
        Err(err) => {
            debug!(player = player.kind.display_name(), error = %err, "track fetch failed");
            return None;
        }
    };

    let fields = split_lines(&output);
    if fields.len() != 5 {
        debug!(
            player = player.kind.display_name(),
            got = fields.len(),
            "track fetch returned wrong field count"
        );
        return None;
    }

    let track = Track {
        title: fields[0].clone(),
        artist: fields[1].clone(),
        album: fields[2].clone(),
        position: parse_seconds(&fields[3]),
        duration: parse_seconds(&fields[4]),
    };

    // All identity fields empty means no track is loaded at all.
    if track.title.is_empty() && track.artist.is_empty() && track.album.is_empty() {
        return None;
    }
    Some(track)
}

/// Players report positions as reals ("12.7"); anything unparsable is 0.
fn parse_seconds(raw: &str) -> i64 {
    raw.trim().parse::<f64>().map(|v| v as i64).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{fetch_track, track_script};
    use crate::testutil::FakeBridge;
    use scrobblebar_core::{Player, PlayerKind, PlayerStatus};

    fn player(kind: PlayerKind) -> Player {
        Player {
            kind,
            status: PlayerStatus::Playing,
            scrobbling: true,
        }
    }

    #[tokio::test]
    async fn fetch_is_one_call_and_parses_all_fields() {
        let bridge = FakeBridge::new();
        bridge.push_ok("Harvest Moon\nNeil Young\nHarvest Moon\n12.7\n303.5");

        let track = fetch_track(&bridge, &player(PlayerKind::Music)).await.unwrap();

        assert_eq!(bridge.call_count(), 1);
        assert_eq!(track.title, "Harvest Moon");
        assert_eq!(track.artist, "Neil Young");
        assert_eq!(track.album, "Harvest Moon");
        assert_eq!(track.position, 12);
        assert_eq!(track.duration, 303);
    }

    #[tokio::test]
    async fn commas_in_titles_survive_the_round_trip() {
        let bridge = FakeBridge::new();
        bridge.push_ok("Me, Myself and I\nDe La Soul\n3 Feet High and Rising\n0.0\n230.0");

        let track = fetch_track(&bridge, &player(PlayerKind::Music)).await.unwrap();

        assert_eq!(track.title, "Me, Myself and I");
    }

    #[tokio::test]
    async fn missing_fields_become_empty_strings() {
        let bridge = FakeBridge::new();
        bridge.push_ok("Untagged\n\n\nmissing value\n");

        let track = fetch_track(&bridge, &player(PlayerKind::Spotify)).await.unwrap();

        assert_eq!(track.title, "Untagged");
        assert_eq!(track.artist, "");
        assert_eq!(track.album, "");
        assert_eq!(track.position, 0);
        assert_eq!(track.duration, 0);
    }

    #[tokio::test]
    async fn command_failure_is_no_track() {
        let bridge = FakeBridge::new();
        bridge.push_err("application isn't running");

        assert!(fetch_track(&bridge, &player(PlayerKind::Music)).await.is_none());
    }

    #[tokio::test]
    async fn fully_empty_reply_is_no_track() {
        let bridge = FakeBridge::new();
        bridge.push_ok("\n\n\n\n");

        assert!(fetch_track(&bridge, &player(PlayerKind::Vox)).await.is_none());
    }

    #[test]
    fn vox_uses_its_own_property_names() {
        let vox = track_script(PlayerKind::Vox);
        assert!(vox.contains("com.coppertino.Vox"));
        assert!(vox.contains("(current time as text)"));
        assert!(vox.contains("(total time as text)"));
        assert!(!vox.contains("current track"));

        let music = track_script(PlayerKind::Music);
        assert!(music.contains("(name of current track as text)"));
        assert!(music.contains("(player position as text)"));
    }
}
