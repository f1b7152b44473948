use serde::{Deserialize, Serialize};

/// A supported music player, identified by its application bundle id.
///
/// The set is fixed at compile time; discovery works over [`PlayerKind::ALL`]
/// so enumeration order is stable (later kinds win resolver ties).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlayerKind {
    Music,
    Swinsian,
    Vox,
    Spotify,
}

impl PlayerKind {
    pub const ALL: [PlayerKind; 4] = [
        PlayerKind::Music,
        PlayerKind::Swinsian,
        PlayerKind::Vox,
        PlayerKind::Spotify,
    ];

    pub fn bundle_id(self) -> &'static str {
        match self {
            PlayerKind::Music => "com.apple.itunes",
            PlayerKind::Swinsian => "com.swinsian.Swinsian",
            PlayerKind::Vox => "com.coppertino.Vox",
            PlayerKind::Spotify => "com.spotify.client",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            PlayerKind::Music => "Music",
            PlayerKind::Swinsian => "Swinsian",
            PlayerKind::Vox => "Vox",
            PlayerKind::Spotify => "Spotify",
        }
    }

    /// Listeners that can scrobble on this player's behalf.
    ///
    /// An empty slice means the player scrobbles natively and needs no
    /// listener at all.
    pub fn compatible_listeners(self) -> &'static [ListenerKind] {
        match self {
            PlayerKind::Music => &[
                ListenerKind::NepTunes,
                ListenerKind::LastFm,
                ListenerKind::Bowtie,
            ],
            PlayerKind::Swinsian => &[ListenerKind::NepTunes, ListenerKind::LastFm],
            PlayerKind::Vox => &[ListenerKind::LastFm],
            PlayerKind::Spotify => &[],
        }
    }
}

/// A supported scrobbling listener application.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ListenerKind {
    LastFm,
    NepTunes,
    Bowtie,
}

impl ListenerKind {
    pub const ALL: [ListenerKind; 3] = [
        ListenerKind::LastFm,
        ListenerKind::NepTunes,
        ListenerKind::Bowtie,
    ];

    pub fn bundle_id(self) -> &'static str {
        match self {
            ListenerKind::LastFm => "fm.last.Scrobbler",
            ListenerKind::NepTunes => "pl.micropixels.NepTunes",
            ListenerKind::Bowtie => "com.13bold.Bowtie",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ListenerKind::LastFm => "Last.fm Scrobbler",
            ListenerKind::NepTunes => "NepTunes",
            ListenerKind::Bowtie => "Bowtie",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlayerStatus {
    NotOpen,
    Playing,
    Paused,
    Stopped,
}

impl PlayerStatus {
    /// Maps a raw `player state` result to a status.
    ///
    /// Older player versions report numeric codes instead of the status
    /// strings; anything unrecognized counts as Stopped.
    pub fn from_raw(raw: &str) -> PlayerStatus {
        match raw.trim() {
            "playing" | "1" => PlayerStatus::Playing,
            "paused" | "0" => PlayerStatus::Paused,
            _ => PlayerStatus::Stopped,
        }
    }
}

/// Snapshot of one player for the current poll cycle. Rebuilt every tick,
/// never cached across ticks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Player {
    pub kind: PlayerKind,
    pub status: PlayerStatus,
    /// True when a compatible listener is running, or the player scrobbles
    /// natively.
    pub scrobbling: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Seconds into the track at observation time.
    pub position: i64,
    /// Total length in seconds; 0 when the player does not report one.
    pub duration: i64,
}

/// Track identity is (artist, title, album). Position and duration change
/// while the same logical track plays, so they stay out of equality.
impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.artist == other.artist && self.title == other.title && self.album == other.album
    }
}

impl Eq for Track {}

#[cfg(test)]
mod tests {
    use super::{PlayerStatus, Track};

    fn track(position: i64, duration: i64) -> Track {
        Track {
            title: "Title".to_string(),
            artist: "Artist".to_string(),
            album: "Album".to_string(),
            position,
            duration,
        }
    }

    #[test]
    fn equality_ignores_position_and_duration() {
        assert_eq!(track(0, 240), track(130, 200));

        let mut other = track(0, 240);
        other.title = "Other".to_string();
        assert_ne!(track(0, 240), other);
    }

    #[test]
    fn status_mapping_accepts_legacy_numeric_codes() {
        assert_eq!(PlayerStatus::from_raw("playing"), PlayerStatus::Playing);
        assert_eq!(PlayerStatus::from_raw("1"), PlayerStatus::Playing);
        assert_eq!(PlayerStatus::from_raw("paused"), PlayerStatus::Paused);
        assert_eq!(PlayerStatus::from_raw("0"), PlayerStatus::Paused);
        assert_eq!(PlayerStatus::from_raw("stopped"), PlayerStatus::Stopped);
        assert_eq!(
            PlayerStatus::from_raw("fast forwarding"),
            PlayerStatus::Stopped
        );
    }
}
