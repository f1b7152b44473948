//! The scrobble gate: decides, on every poll tick, whether the previous
//! track earned a submission and whether a now-playing notice should fire.
//!
//! The gate is pure state-machine logic. It returns [`GateAction`]s for the
//! caller to dispatch, so tests drive it with plain values and the app layer
//! owns every side effect.

use anyhow::Result;
use async_trait::async_trait;
use scrobblebar_core::{Player, PlayerStatus, Track};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

/// What changed between two consecutive observations, for the presentation
/// layer's change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
    TrackChanged,
    StatusChanged,
    Nothing,
}

/// Side effect requested by the gate; at most one of each per tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateAction {
    NowPlaying(Track),
    Submit(Track),
}

#[derive(Debug, Clone)]
pub struct GateOutput {
    pub actions: Vec<GateAction>,
    pub diff: DiffKind,
}

/// Observable pipeline result published to the presentation layer once per
/// change (and unconditionally on the slow refresh tick).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollSnapshot {
    pub player: Option<Player>,
    pub track: Option<Track>,
}

/// The submission rules of the logging service: a track qualifies once it is
/// longer than 30 seconds and has played past half its duration or four
/// minutes, whichever comes first.
pub fn scrobble_eligible(track: &Track) -> bool {
    track.duration >= 30 && track.position >= (track.duration / 2).min(240)
}

/// Tick-to-tick state: the previously observed track and status, plus the
/// bounded recent-submission history. The previous observation is committed
/// only at the end of a tick, never partially.
pub struct ScrobbleGate {
    prev: Option<(Track, PlayerStatus)>,
    history: VecDeque<Track>,
    history_limit: usize,
}

impl ScrobbleGate {
    pub fn new(history_limit: usize) -> Self {
        Self {
            prev: None,
            history: VecDeque::new(),
            history_limit,
        }
    }

    /// Feeds one observation through the gate.
    ///
    /// A track equal to the previous one (by artist/title/album) with
    /// `position >= 1` is the same play continuing. Equality alone cannot
    /// spot a restarted track, so a position wrapped back below one second
    /// counts as a transition to a repeat play.
    pub fn tick(&mut self, track: Option<Track>, status: PlayerStatus) -> GateOutput {
        let diff = self.diff(track.as_ref(), status);
        let mut actions = Vec::new();

        let next = match (self.prev.take(), track) {
            // No active track: back to idle, nothing to submit.
            (_, None) => None,
            (None, Some(new_track)) => {
                if status == PlayerStatus::Playing {
                    actions.push(GateAction::NowPlaying(new_track.clone()));
                }
                Some((new_track, status))
            }
            (Some((prev_track, _)), Some(new_track)) => {
                if new_track == prev_track && new_track.position >= 1 {
                    // Same play continuing; refresh position/status bookkeeping.
                    Some((new_track, status))
                } else {
                    if scrobble_eligible(&prev_track) {
                        debug!(
                            title = %prev_track.title,
                            artist = %prev_track.artist,
                            position = prev_track.position,
                            "track transition; previous play qualifies"
                        );
                        self.remember(prev_track.clone());
                        actions.push(GateAction::Submit(prev_track));
                    }
                    if status == PlayerStatus::Playing {
                        actions.push(GateAction::NowPlaying(new_track.clone()));
                    }
                    Some((new_track, status))
                }
            }
        };
        self.prev = next;

        GateOutput { actions, diff }
    }

    fn diff(&self, track: Option<&Track>, status: PlayerStatus) -> DiffKind {
        match (&self.prev, track) {
            (None, None) => DiffKind::Nothing,
            (None, Some(_)) | (Some(_), None) => DiffKind::TrackChanged,
            (Some((prev_track, prev_status)), Some(current)) => {
                if prev_track != current {
                    DiffKind::TrackChanged
                } else if *prev_status != status {
                    DiffKind::StatusChanged
                } else {
                    DiffKind::Nothing
                }
            }
        }
    }

    /// The track currently being tracked, if any.
    pub fn current(&self) -> Option<&Track> {
        self.prev.as_ref().map(|(track, _)| track)
    }

    /// Submitted tracks, most recent first.
    pub fn recent(&self) -> impl Iterator<Item = &Track> {
        self.history.iter()
    }

    fn remember(&mut self, track: Track) {
        self.history.push_front(track);
        self.history.truncate(self.history_limit);
    }
}

/// Capability object for the external track-logging service. The gate's
/// caller dispatches [`GateAction`]s through this; implementations own their
/// protocol, credentials, and persistence entirely.
#[async_trait]
pub trait ScrobbleService: Send + Sync {
    async fn report_now_playing(&self, track: &Track) -> Result<()>;
    /// `start_unix` is the wall-clock second the play began (now minus the
    /// track position at submission time).
    async fn submit_play(&self, track: &Track, start_unix: i64) -> Result<()>;
    fn username(&self) -> Option<String>;
    async fn begin_login(&self) -> Result<()>;
    async fn logout(&self) -> Result<()>;
}
