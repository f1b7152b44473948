//! Transport commands for the presentation layer's buttons.

use scrobblebar_core::PlayerKind;
use scrobblebar_osa::{invoke, ScriptBridge, ScriptError};

/// Brings the player to the foreground, launching it if needed.
pub async fn activate(bridge: &dyn ScriptBridge, kind: PlayerKind) -> Result<(), ScriptError> {
    invoke(bridge, kind.bundle_id(), "activate").await.map(drop)
}

pub async fn play(bridge: &dyn ScriptBridge, kind: PlayerKind) -> Result<(), ScriptError> {
    invoke(bridge, kind.bundle_id(), "play").await.map(drop)
}

pub async fn pause(bridge: &dyn ScriptBridge, kind: PlayerKind) -> Result<(), ScriptError> {
    invoke(bridge, kind.bundle_id(), "pause").await.map(drop)
}

/// Skips forward. Some players land the skip in a paused state, so a play
/// command follows the jump.
pub async fn next_track(bridge: &dyn ScriptBridge, kind: PlayerKind) -> Result<(), ScriptError> {
    invoke(bridge, kind.bundle_id(), "next track").await?;
    play(bridge, kind).await
}

/// Skips backward, then resumes like [`next_track`].
pub async fn previous_track(
    bridge: &dyn ScriptBridge,
    kind: PlayerKind,
) -> Result<(), ScriptError> {
    invoke(bridge, kind.bundle_id(), "previous track").await?;
    play(bridge, kind).await
}
