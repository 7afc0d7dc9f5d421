//! Seams between the session and its host environment
//!
//! The session never touches a real video element or a real timer; both
//! are injected behind the traits here so the state machine stays
//! host-agnostic and deterministic under test.

use serde::{Deserialize, Serialize};

/// Monotonically increasing tag attached to every sink load request.
/// Completion events carry the tag of the load they belong to; events
/// from a superseded load are discarded by the session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct LoadSeq(pub u64);

impl LoadSeq {
    pub fn next(self) -> LoadSeq {
        LoadSeq(self.0 + 1)
    }
}

impl std::fmt::Display for LoadSeq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The injected media-rendering surface. Owns actual decode and render;
/// binds at most one URL at a time.
///
/// Every method is a request that returns immediately; outcomes arrive
/// later as [`SinkEvent`]s routed to the session by the host.
pub trait MediaSink {
    /// Begin loading `url`, superseding any current binding.
    fn load(&mut self, url: &str, seq: LoadSeq);
    /// Request playback to start.
    fn play(&mut self);
    /// Request playback to pause.
    fn pause(&mut self);
    /// Request a seek to an absolute position in seconds.
    fn seek(&mut self, position: f64);
    /// Set output volume in `[0.0, 1.0]`.
    fn set_volume(&mut self, volume: f64);
    /// Mute or unmute output without touching the volume level.
    fn set_muted(&mut self, muted: bool);
    /// Known media duration in seconds, once the sink has one.
    fn duration(&self) -> Option<f64>;
    /// Stop playback and release the bound source.
    fn release(&mut self);
}

/// Asynchronous completion signals from the media sink
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    /// First frame of the current load is decodable
    Ready,
    /// Playback started
    Playing,
    /// Playback paused
    Paused,
    /// Playback position advanced
    PositionUpdate(f64),
    /// Media duration became known or changed
    DurationChange(f64),
    /// Sink stalled waiting for data
    Waiting,
    /// A seek started settling
    Seeking,
    /// The pending seek settled
    Seeked,
    /// Playback reached the end of the stream
    Ended,
    /// The current load failed
    Error(String),
}

/// A repeating one-second timer driving the advance countdown.
/// The host arms it here and calls
/// [`PlayerSession::handle_advance_tick`](crate::session::PlayerSession::handle_advance_tick)
/// on each fire. `cancel` must take effect synchronously.
pub trait AdvanceTimer {
    fn start(&mut self);
    fn cancel(&mut self);
}
