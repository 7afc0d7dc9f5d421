//! Sinetron Core - playback engine for short-drama streaming
//!
//! This crate provides the client-side playback core:
//! - Video source resolution from raw stream payloads
//! - Playback session state machine with resolution switching
//! - Next-episode auto-advance with a cancellable countdown
//! - Injected media-sink / timer / preference seams so the state
//!   machine runs against any rendering surface
//!
//! # Architecture
//!
//! ```text
//!   raw stream payload
//!          |
//!   ┌──────┴───────┐        ┌──────────────┐
//!   │    Source    │        │  Preference  │
//!   │   Resolver   │        │    Store     │
//!   └──────┬───────┘        └──────┬───────┘
//!          │ SourceSet             │ volume
//!   ┌──────┴───────────────────────┴───────┐
//!   │            Player Session            │
//!   └──┬────────────────┬───────────────┬──┘
//!      │ requests       │ events        │ callbacks
//!   ┌──┴───────┐   ┌────┴─────┐   ┌─────┴────┐
//!   │  Media   │   │ Advance  │   │ Session  │
//!   │  Sink    │   │  Timer   │   │ Observer │
//!   └──────────┘   └──────────┘   └──────────┘
//! ```

pub mod error;
pub mod format;
pub mod prefs;
pub mod session;
pub mod sink;
pub mod source;
pub mod types;

pub use error::{PlayerError, Result};
pub use prefs::{MemoryPrefs, PreferenceStore};
pub use session::{PlayerSession, SessionObserver};
pub use sink::{AdvanceTimer, LoadSeq, MediaSink, SinkEvent};
pub use source::{decode_url, resolve};
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
