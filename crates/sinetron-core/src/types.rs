//! Core types for the playback engine

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pseudo-resolution tag for the server-chosen adaptive URL
pub const AUTO_RESOLUTION: &str = "auto";

/// One episode of a series, as listed by the detail endpoint.
/// Owned by the detail-loading collaborator; the session only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    /// Stream identifier used to fetch this episode's sources
    pub id: String,
    /// Episode title, when the catalog carries one
    pub title: Option<String>,
    /// 1-based episode number
    pub index: u32,
    /// Listed duration in seconds, if known
    pub duration_seconds: Option<f64>,
    /// Freshly published flag from the catalog
    pub is_new: bool,
}

impl Episode {
    /// Display title, falling back to the episode number
    pub fn display_title(&self) -> String {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => format!("Episode {}", self.index),
        }
    }
}

/// A single playable rendition of an episode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSource {
    /// Resolution tag, e.g. "720p" or "auto"
    pub resolution: String,
    /// Human-readable label for the quality picker
    pub label: String,
    /// Directly fetchable address; transport obfuscation already removed
    pub url: String,
}

/// The resolved collection of playable URLs for one episode
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSet {
    /// Server-chosen adaptive URL, if the payload carried one
    pub main_url: Option<String>,
    /// Explicit quality tiers, descending by numeric resolution
    pub sources: Vec<VideoSource>,
    /// Definition the server recommends for "auto", if stated
    pub auto_definition: Option<String>,
}

impl SourceSet {
    /// A set with no main URL and no entries cannot start playback
    pub fn is_playable(&self) -> bool {
        self.main_url.is_some() || !self.sources.is_empty()
    }

    /// URL for a resolution tag; "auto" maps to the main URL when present
    pub fn url_for(&self, resolution: &str) -> Option<&str> {
        if resolution == AUTO_RESOLUTION {
            if let Some(main) = &self.main_url {
                return Some(main);
            }
        }
        self.sources
            .iter()
            .find(|s| s.resolution == resolution)
            .map(|s| s.url.as_str())
    }

    /// Initial pick for a fresh session: the main URL as "auto" when
    /// present, otherwise the best explicit tier
    pub fn initial_selection(&self) -> Option<(String, &str)> {
        if let Some(main) = &self.main_url {
            return Some((AUTO_RESOLUTION.to_string(), main.as_str()));
        }
        self.sources
            .first()
            .map(|s| (s.resolution.clone(), s.url.as_str()))
    }
}

/// Playback session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaybackStatus {
    /// No episode bound
    Idle,
    /// A source load is in flight, or the sink stalled for data
    Loading,
    /// Content is playing
    Playing,
    /// Playback paused
    Paused,
    /// A seek is settling
    Seeking,
    /// The current load failed; explicit retry or switch required
    Error,
    /// Session torn down
    Closed,
}

impl PlaybackStatus {
    /// Check if a transition to the target state is expected.
    /// Sink events are ground truth, so an off-matrix transition is
    /// logged rather than rejected.
    pub fn can_transition_to(&self, target: PlaybackStatus) -> bool {
        use PlaybackStatus::*;
        if target == Closed {
            return true;
        }
        matches!(
            (self, target),
            (Idle, Loading) | (Idle, Error) |
            (Loading, Playing) | (Loading, Paused) | (Loading, Seeking) | (Loading, Error) |
            (Playing, Paused) | (Playing, Loading) | (Playing, Seeking) | (Playing, Error) |
            (Paused, Playing) | (Paused, Loading) | (Paused, Seeking) | (Paused, Error) |
            (Seeking, Playing) | (Seeking, Paused) | (Seeking, Loading) | (Seeking, Error) |
            (Error, Loading)
        )
    }

    /// States during which the sink is not ready to present frames
    pub fn is_busy(&self) -> bool {
        matches!(self, PlaybackStatus::Loading | PlaybackStatus::Seeking)
    }
}

impl std::fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackStatus::Idle => write!(f, "idle"),
            PlaybackStatus::Loading => write!(f, "loading"),
            PlaybackStatus::Playing => write!(f, "playing"),
            PlaybackStatus::Paused => write!(f, "paused"),
            PlaybackStatus::Seeking => write!(f, "seeking"),
            PlaybackStatus::Error => write!(f, "error"),
            PlaybackStatus::Closed => write!(f, "closed"),
        }
    }
}

/// A scheduled auto-advance to the next episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAdvance {
    /// Zero-based index of the episode to advance to
    pub next_index: usize,
    /// Seconds remaining in the countdown window
    pub countdown: u32,
    /// Set when the user dismissed the countdown
    pub cancelled: bool,
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Seconds in the next-episode countdown window
    pub advance_countdown_secs: u32,
    /// Begin playback as soon as the first load signals ready
    pub autoplay: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            advance_countdown_secs: 5,
            autoplay: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiered_set() -> SourceSet {
        SourceSet {
            main_url: Some("https://cdn.example/adaptive.m3u8".into()),
            sources: vec![
                VideoSource {
                    resolution: "1080p".into(),
                    label: "1080p".into(),
                    url: "https://cdn.example/1080.mp4".into(),
                },
                VideoSource {
                    resolution: "720p".into(),
                    label: "720p".into(),
                    url: "https://cdn.example/720.mp4".into(),
                },
            ],
            auto_definition: None,
        }
    }

    #[test]
    fn test_source_set_playability() {
        assert!(tiered_set().is_playable());
        assert!(!SourceSet::default().is_playable());

        let main_only = SourceSet {
            main_url: Some("https://cdn.example/a.mp4".into()),
            ..SourceSet::default()
        };
        assert!(main_only.is_playable());
    }

    #[test]
    fn test_url_for_auto_prefers_main_url() {
        let set = tiered_set();
        assert_eq!(set.url_for("auto"), Some("https://cdn.example/adaptive.m3u8"));
        assert_eq!(set.url_for("720p"), Some("https://cdn.example/720.mp4"));
        assert_eq!(set.url_for("480p"), None);
    }

    #[test]
    fn test_url_for_auto_without_main_url_matches_entries() {
        let mut set = tiered_set();
        set.main_url = None;
        set.sources[0].resolution = "auto".into();
        assert_eq!(set.url_for("auto"), Some("https://cdn.example/1080.mp4"));
    }

    #[test]
    fn test_initial_selection() {
        let set = tiered_set();
        let (resolution, url) = set.initial_selection().unwrap();
        assert_eq!(resolution, "auto");
        assert_eq!(url, "https://cdn.example/adaptive.m3u8");

        let mut without_main = tiered_set();
        without_main.main_url = None;
        let (resolution, url) = without_main.initial_selection().unwrap();
        assert_eq!(resolution, "1080p");
        assert_eq!(url, "https://cdn.example/1080.mp4");

        assert!(SourceSet::default().initial_selection().is_none());
    }

    #[test]
    fn test_status_transitions() {
        use PlaybackStatus::*;

        assert!(Idle.can_transition_to(Loading));
        assert!(Loading.can_transition_to(Error));
        assert!(Error.can_transition_to(Loading));
        assert!(Playing.can_transition_to(Loading));
        assert!(Paused.can_transition_to(Closed));

        assert!(!Idle.can_transition_to(Playing));
        assert!(!Error.can_transition_to(Playing));
        assert!(!Closed.can_transition_to(Loading));
    }

    #[test]
    fn test_episode_display_title() {
        let mut episode = Episode {
            id: "v1".into(),
            title: Some("The Reveal".into()),
            index: 7,
            duration_seconds: None,
            is_new: false,
        };
        assert_eq!(episode.display_title(), "The Reveal");

        episode.title = None;
        assert_eq!(episode.display_title(), "Episode 7");

        episode.title = Some(String::new());
        assert_eq!(episode.display_title(), "Episode 7");
    }
}
