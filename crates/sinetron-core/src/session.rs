//! Playback session state machine
//!
//! Owns exactly one media-sink binding at a time and coordinates:
//! - initial source selection and load
//! - resolution switches with position and play-state resume
//! - seeks, and retry after a failed load
//! - the cancellable next-episode countdown
//!
//! Every public operation returns immediately after updating state and
//! issuing a sink request; completions arrive later as [`SinkEvent`]s
//! routed through [`PlayerSession::handle_sink_event`]. Each load
//! carries a [`LoadSeq`], and events from a superseded load are
//! discarded.

use tracing::{debug, info, warn};

use crate::error::PlayerError;
use crate::prefs::{self, PreferenceStore};
use crate::sink::{AdvanceTimer, LoadSeq, MediaSink, SinkEvent};
use crate::types::{
    Episode, PendingAdvance, PlaybackStatus, SessionConfig, SessionId, SourceSet, AUTO_RESOLUTION,
};

/// Callbacks into the hosting UI layer. All effects of the session's
/// asynchronous work surface here.
pub trait SessionObserver {
    fn on_status_change(&mut self, _status: PlaybackStatus) {}
    fn on_position_change(&mut self, _seconds: f64, _duration: Option<f64>) {}
    fn on_error(&mut self, _error: &PlayerError) {}
    fn on_advance_tick(&mut self, _countdown: u32) {}
    fn on_advance_fire(&mut self, _next_index: usize) {}
    fn on_volume_change(&mut self, _volume: f64) {}
}

/// The playback session component. The host constructs one per player
/// surface and keeps it for its lifetime; `open`/`close` bind and
/// release individual episodes.
pub struct PlayerSession {
    /// Component identity, for log correlation
    id: SessionId,
    /// Session configuration
    config: SessionConfig,
    /// Injected media-rendering surface
    sink: Box<dyn MediaSink>,
    /// Injected UI callbacks
    observer: Box<dyn SessionObserver>,
    /// Injected countdown driver
    timer: Box<dyn AdvanceTimer>,
    /// Injected durable preference store
    prefs: Box<dyn PreferenceStore>,
    /// State of the currently bound episode, if any
    active: Option<ActiveSession>,
    /// Last load sequence handed to the sink
    next_seq: LoadSeq,
    /// Current mute state of the sink binding
    muted: bool,
}

/// State for one open episode; dropped wholesale on `close`
#[derive(Debug)]
struct ActiveSession {
    episode: Episode,
    source_set: SourceSet,
    episode_index: usize,
    episode_count: usize,
    selected_resolution: String,
    position_seconds: f64,
    duration_seconds: Option<f64>,
    status: PlaybackStatus,
    /// Seek back and resume playback once the pending load is ready
    resume_on_source_ready: bool,
    /// The first ready signal of the current load is still outstanding
    awaiting_ready: bool,
    /// Sequence of the load this session currently accepts events for
    load_seq: LoadSeq,
    /// Status to restore once the sink reports the seek settled
    status_before_seek: Option<PlaybackStatus>,
    pending_advance: Option<PendingAdvance>,
    last_error: Option<PlayerError>,
}

impl ActiveSession {
    fn unplayable(
        episode: Episode,
        source_set: SourceSet,
        episode_index: usize,
        episode_count: usize,
        error: PlayerError,
    ) -> Self {
        Self {
            episode,
            source_set,
            episode_index,
            episode_count,
            selected_resolution: AUTO_RESOLUTION.to_string(),
            position_seconds: 0.0,
            duration_seconds: None,
            status: PlaybackStatus::Error,
            resume_on_source_ready: false,
            awaiting_ready: false,
            load_seq: LoadSeq::default(),
            status_before_seek: None,
            pending_advance: None,
            last_error: Some(error),
        }
    }
}

impl PlayerSession {
    /// Create a session component with the default configuration
    pub fn new(
        sink: Box<dyn MediaSink>,
        observer: Box<dyn SessionObserver>,
        timer: Box<dyn AdvanceTimer>,
        prefs: Box<dyn PreferenceStore>,
    ) -> Self {
        Self::with_config(SessionConfig::default(), sink, observer, timer, prefs)
    }

    /// Create a session component with an explicit configuration
    pub fn with_config(
        config: SessionConfig,
        sink: Box<dyn MediaSink>,
        observer: Box<dyn SessionObserver>,
        timer: Box<dyn AdvanceTimer>,
        prefs: Box<dyn PreferenceStore>,
    ) -> Self {
        Self {
            id: SessionId::new(),
            config,
            sink,
            observer,
            timer,
            prefs,
            active: None,
            next_seq: LoadSeq::default(),
            muted: false,
        }
    }

    /// Bind an episode and begin loading its initial source.
    ///
    /// The host is expected to `close()` a live session first; a live
    /// countdown timer or sink binding must not survive into the next
    /// episode, so a violation closes the previous session here.
    ///
    /// `episode_count` is the length of the episode list the caller is
    /// navigating; it bounds the end-of-episode auto-advance.
    pub fn open(
        &mut self,
        episode: Episode,
        source_set: SourceSet,
        index: usize,
        episode_count: usize,
    ) {
        if self.active.is_some() {
            warn!(session_id = %self.id, "open() with a live session, closing the previous one");
            self.close();
        }

        info!(session_id = %self.id, episode = %episode.id, index, "opening playback session");

        let Some((resolution, url)) = source_set
            .initial_selection()
            .map(|(resolution, url)| (resolution, url.to_string()))
        else {
            let error = PlayerError::NoSourceAvailable;
            self.active = Some(ActiveSession::unplayable(
                episode,
                source_set,
                index,
                episode_count,
                error.clone(),
            ));
            self.observer.on_status_change(PlaybackStatus::Error);
            self.observer.on_error(&error);
            return;
        };

        if let Some(volume) = prefs::load_volume(self.prefs.as_ref()) {
            self.sink.set_volume(volume);
        }

        self.next_seq = self.next_seq.next();
        let seq = self.next_seq;
        self.active = Some(ActiveSession {
            episode,
            source_set,
            episode_index: index,
            episode_count,
            selected_resolution: resolution,
            position_seconds: 0.0,
            duration_seconds: None,
            status: PlaybackStatus::Loading,
            resume_on_source_ready: self.config.autoplay,
            awaiting_ready: true,
            load_seq: seq,
            status_before_seek: None,
            pending_advance: None,
            last_error: None,
        });
        self.observer.on_status_change(PlaybackStatus::Loading);
        debug!(session_id = %self.id, %seq, "issuing initial load");
        self.sink.load(&url, seq);
    }

    /// Switch to another resolution of the current source set, keeping
    /// position and play state across the swap. A no-op when the
    /// resolution is already selected or not in the set.
    pub fn switch_resolution(&mut self, resolution: &str) {
        let url = {
            let Some(active) = self.active.as_mut() else {
                return;
            };
            if resolution == active.selected_resolution {
                debug!(resolution, "resolution unchanged");
                return;
            }
            let Some(url) = active.source_set.url_for(resolution).map(str::to_string) else {
                warn!(resolution, "requested resolution not in the current source set");
                return;
            };
            active.resume_on_source_ready = active.status == PlaybackStatus::Playing;
            active.selected_resolution = resolution.to_string();
            url
        };
        let seq = self.bump_seq();
        info!(session_id = %self.id, resolution, %seq, "switching resolution");
        self.set_status(PlaybackStatus::Loading);
        self.sink.load(&url, seq);
    }

    /// Re-issue the load for the selected resolution. Valid only from
    /// the error state; playback resumes at the last observed position.
    pub fn retry(&mut self) {
        let url = {
            let Some(active) = self.active.as_mut() else {
                return;
            };
            if active.status != PlaybackStatus::Error {
                debug!(status = %active.status, "retry outside the error state ignored");
                return;
            }
            let Some(url) = active
                .source_set
                .url_for(&active.selected_resolution)
                .map(str::to_string)
            else {
                return;
            };
            active.last_error = None;
            active.resume_on_source_ready = true;
            url
        };
        let seq = self.bump_seq();
        info!(session_id = %self.id, %seq, "retrying load");
        self.set_status(PlaybackStatus::Loading);
        self.sink.load(&url, seq);
    }

    /// Seek to an absolute position, clamped into `[0, duration]`.
    /// Without a known duration there is no upper clamp. Status
    /// transitions come from the sink's seeking/seeked events.
    pub fn seek_to(&mut self, target: f64) {
        if self.active.is_none() {
            return;
        }
        let mut clamped = target.max(0.0);
        if let Some(duration) = self.sink.duration() {
            clamped = clamped.min(duration);
        }
        debug!(target, clamped, "seek requested");
        self.sink.seek(clamped);
    }

    /// Seek relative to the last observed position
    pub fn seek_relative(&mut self, delta: f64) {
        let Some(position) = self.active.as_ref().map(|a| a.position_seconds) else {
            return;
        };
        self.seek_to(position + delta);
    }

    /// Route a play/pause toggle to the sink. The resulting state
    /// arrives back through the sink's playing/paused events.
    pub fn toggle_play(&mut self) {
        let Some(status) = self.active.as_ref().map(|a| a.status) else {
            return;
        };
        match status {
            PlaybackStatus::Playing => self.sink.pause(),
            PlaybackStatus::Paused | PlaybackStatus::Loading | PlaybackStatus::Seeking => {
                self.sink.play()
            }
            PlaybackStatus::Idle | PlaybackStatus::Error | PlaybackStatus::Closed => {}
        }
    }

    /// Set output volume, persisting it as the durable preference.
    /// Volume zero mutes; any other level unmutes.
    pub fn set_volume(&mut self, volume: f64) {
        let volume = volume.clamp(0.0, 1.0);
        self.muted = volume == 0.0;
        self.sink.set_volume(volume);
        self.sink.set_muted(self.muted);
        prefs::save_volume(self.prefs.as_mut(), volume);
        self.observer.on_volume_change(volume);
    }

    /// Flip the mute state without touching the volume level
    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
        self.sink.set_muted(self.muted);
    }

    /// Dismiss a pending auto-advance without firing it
    pub fn cancel_advance(&mut self) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if let Some(pending) = active.pending_advance.take() {
            self.timer.cancel();
            info!(next_index = pending.next_index, "advance cancelled");
        }
    }

    /// Fire a pending auto-advance immediately
    pub fn confirm_advance_now(&mut self) {
        let next_index = {
            let Some(active) = self.active.as_mut() else {
                return;
            };
            let Some(pending) = active.pending_advance.take() else {
                return;
            };
            pending.next_index
        };
        self.timer.cancel();
        info!(next_index, "advance confirmed");
        self.observer.on_advance_fire(next_index);
    }

    /// Tear down the session: cancel the countdown, release the sink,
    /// drop all per-episode state. Safe to call when already closed.
    pub fn close(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        self.timer.cancel();
        self.sink.release();
        info!(session_id = %self.id, episode = %active.episode.id, "session closed");
        self.observer.on_status_change(PlaybackStatus::Closed);
    }

    /// Route a sink completion event into the state machine. Events
    /// whose sequence is not the session's current load are stale and
    /// are discarded here.
    pub fn handle_sink_event(&mut self, seq: LoadSeq, event: SinkEvent) {
        {
            let Some(active) = self.active.as_ref() else {
                debug!(%seq, ?event, "sink event without a live session");
                return;
            };
            if seq != active.load_seq {
                debug!(%seq, current = %active.load_seq, ?event, "discarding stale sink event");
                return;
            }
        }
        match event {
            SinkEvent::Ready => self.apply_source_ready(),
            SinkEvent::Playing => self.set_status(PlaybackStatus::Playing),
            SinkEvent::Paused => self.set_status(PlaybackStatus::Paused),
            SinkEvent::PositionUpdate(seconds) => self.apply_position(seconds),
            SinkEvent::DurationChange(duration) => self.apply_duration(duration),
            SinkEvent::Waiting => self.set_status(PlaybackStatus::Loading),
            SinkEvent::Seeking => self.apply_seeking(),
            SinkEvent::Seeked => self.apply_seeked(),
            SinkEvent::Ended => self.apply_ended(),
            SinkEvent::Error(reason) => self.apply_error(reason),
        }
    }

    /// One-second tick from the injected advance timer
    pub fn handle_advance_tick(&mut self) {
        enum Tick {
            Fire(usize),
            Count(u32),
        }
        let step = {
            let Some(active) = self.active.as_mut() else {
                return;
            };
            let (countdown, next_index) = {
                let Some(pending) = active.pending_advance.as_mut() else {
                    return;
                };
                if pending.cancelled {
                    return;
                }
                pending.countdown = pending.countdown.saturating_sub(1);
                (pending.countdown, pending.next_index)
            };
            if countdown == 0 {
                active.pending_advance = None;
                Tick::Fire(next_index)
            } else {
                Tick::Count(countdown)
            }
        };
        match step {
            Tick::Fire(next_index) => {
                self.timer.cancel();
                info!(next_index, "advance countdown fired");
                self.observer.on_advance_tick(0);
                self.observer.on_advance_fire(next_index);
            }
            Tick::Count(countdown) => self.observer.on_advance_tick(countdown),
        }
    }

    /// Component identity
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Whether an episode is currently bound
    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    /// Current status; `Idle` when no episode is bound
    pub fn status(&self) -> PlaybackStatus {
        self.active
            .as_ref()
            .map(|a| a.status)
            .unwrap_or(PlaybackStatus::Idle)
    }

    /// Last observed playback position in seconds
    pub fn position(&self) -> f64 {
        self.active
            .as_ref()
            .map(|a| a.position_seconds)
            .unwrap_or(0.0)
    }

    /// Media duration, once known
    pub fn duration(&self) -> Option<f64> {
        self.active.as_ref().and_then(|a| a.duration_seconds)
    }

    /// Currently selected resolution tag
    pub fn selected_resolution(&self) -> Option<&str> {
        self.active
            .as_ref()
            .map(|a| a.selected_resolution.as_str())
    }

    /// Currently bound episode
    pub fn episode(&self) -> Option<&Episode> {
        self.active.as_ref().map(|a| &a.episode)
    }

    /// Source set of the bound episode
    pub fn source_set(&self) -> Option<&SourceSet> {
        self.active.as_ref().map(|a| &a.source_set)
    }

    /// Pending auto-advance, if a countdown is running
    pub fn pending_advance(&self) -> Option<PendingAdvance> {
        self.active.as_ref().and_then(|a| a.pending_advance)
    }

    /// Error recorded for the current load attempt, if any
    pub fn last_error(&self) -> Option<&PlayerError> {
        self.active.as_ref().and_then(|a| a.last_error.as_ref())
    }

    /// Allocate the next load sequence and mark it as the session's
    /// current, awaiting-ready load
    fn bump_seq(&mut self) -> LoadSeq {
        self.next_seq = self.next_seq.next();
        if let Some(active) = self.active.as_mut() {
            active.load_seq = self.next_seq;
            active.awaiting_ready = true;
        }
        self.next_seq
    }

    fn set_status(&mut self, status: PlaybackStatus) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if active.status == status {
            return;
        }
        if !active.status.can_transition_to(status) {
            debug!(from = %active.status, to = %status, "off-matrix status transition");
        }
        let from = active.status;
        active.status = status;
        info!(session_id = %self.id, %from, %status, "status transition");
        self.observer.on_status_change(status);
    }

    /// Applies the pending seek-and-resume exactly once per load cycle;
    /// duplicate ready signals for the same load are no-ops.
    fn apply_source_ready(&mut self) {
        let (position, resume) = {
            let Some(active) = self.active.as_mut() else {
                return;
            };
            if !active.awaiting_ready {
                debug!("duplicate ready signal ignored");
                return;
            }
            active.awaiting_ready = false;
            let resume = active.resume_on_source_ready;
            active.resume_on_source_ready = false;
            (active.position_seconds, resume)
        };
        if let Some(duration) = self.sink.duration() {
            if let Some(active) = self.active.as_mut() {
                active.duration_seconds = Some(duration);
            }
        }
        if position > 0.0 {
            debug!(position, "restoring position after source swap");
            self.sink.seek(position);
        }
        self.set_status(PlaybackStatus::Paused);
        if resume {
            self.sink.play();
        }
    }

    fn apply_position(&mut self, seconds: f64) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        active.position_seconds = seconds;
        let duration = active.duration_seconds;
        self.observer.on_position_change(seconds, duration);
    }

    fn apply_duration(&mut self, duration: f64) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        active.duration_seconds = Some(duration);
        let position = active.position_seconds;
        self.observer.on_position_change(position, Some(duration));
    }

    fn apply_seeking(&mut self) {
        {
            let Some(active) = self.active.as_mut() else {
                return;
            };
            if matches!(
                active.status,
                PlaybackStatus::Playing | PlaybackStatus::Paused
            ) {
                active.status_before_seek = Some(active.status);
            }
        }
        self.set_status(PlaybackStatus::Seeking);
    }

    fn apply_seeked(&mut self) {
        let restore = {
            let Some(active) = self.active.as_mut() else {
                return;
            };
            active
                .status_before_seek
                .take()
                .unwrap_or(PlaybackStatus::Paused)
        };
        self.set_status(restore);
    }

    fn apply_ended(&mut self) {
        self.set_status(PlaybackStatus::Paused);
        let countdown = self.config.advance_countdown_secs;
        let next_index = {
            let Some(active) = self.active.as_mut() else {
                return;
            };
            if active.pending_advance.is_some() {
                return;
            }
            let next_index = active.episode_index + 1;
            if next_index >= active.episode_count {
                debug!("last episode ended, no auto-advance");
                return;
            }
            active.pending_advance = Some(PendingAdvance {
                next_index,
                countdown,
                cancelled: false,
            });
            next_index
        };
        info!(next_index, countdown, "starting advance countdown");
        self.timer.start();
        self.observer.on_advance_tick(countdown);
    }

    fn apply_error(&mut self, reason: String) {
        let error = PlayerError::LoadFailed(reason);
        warn!(session_id = %self.id, %error, "sink reported a load failure");
        if let Some(active) = self.active.as_mut() {
            active.last_error = Some(error.clone());
        }
        self.set_status(PlaybackStatus::Error);
        self.observer.on_error(&error);
    }
}
