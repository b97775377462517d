//! Playback Gate: bounded replays and anti-seek enforcement for the audio clip.
//!
//! Every transition is a pure function of `(PlaybackState, MediaEvent)`. The
//! gate never drives the media element on its own; it answers each event with
//! an optional [`MediaCommand`] that the host applies.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::traits::MediaElement;

/// A play request this close to the start counts as a fresh play.
pub const FRESH_PLAY_THRESHOLD_SECS: f64 = 0.05;

/// Seeks up to this far past the furthest heard point are media-clock jitter.
pub const SEEK_TOLERANCE_SECS: f64 = 0.1;

/// Play credits granted when nothing else is configured.
pub const DEFAULT_MAX_PLAYS: u32 = 2;

/// Notifications from the host media element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "media", rename_all = "snake_case")]
pub enum MediaEvent {
    /// Playback is about to start at `position` seconds.
    PlayRequested { position: f64 },
    /// The playback clock moved to `position` seconds.
    PositionAdvanced { position: f64 },
    /// The listener scrubbed to `position` seconds.
    SeekAttempted { position: f64 },
    Paused,
    /// The clip played through to the end.
    Ended,
}

/// Imperative corrections sent back to the media element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum MediaCommand {
    /// Stop playback and rewind to the start. Issued when a play is denied.
    StopAndRewind,
    /// Reposition playback to `position` seconds. Issued by the seek clamp.
    SeekTo { position: f64 },
}

impl MediaCommand {
    /// Apply this command to a live media element.
    pub fn apply_to(&self, element: &mut dyn MediaElement) {
        match *self {
            MediaCommand::StopAndRewind => {
                element.pause();
                element.set_position(0.0);
            }
            MediaCommand::SeekTo { position } => element.set_position(position),
        }
    }
}

/// Session-local playback bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    /// Completed plays still permitted. Only ever decreases.
    pub plays_remaining: u32,
    pub is_playing: bool,
    /// Furthest position heard during the current play; the seek ceiling.
    pub max_time_reached: f64,
    /// Set once the clip has played through at least once.
    pub has_completed_once: bool,
}

impl PlaybackState {
    pub fn new(max_plays: u32) -> Self {
        Self {
            plays_remaining: max_plays,
            is_playing: false,
            max_time_reached: 0.0,
            has_completed_once: false,
        }
    }

    /// Compute the next state and the correction, if any, for one event.
    pub fn transition(self, event: MediaEvent) -> (Self, Option<MediaCommand>) {
        let mut next = self;
        let command = match event {
            MediaEvent::PlayRequested { position } => {
                if self.plays_remaining == 0 {
                    next.is_playing = false;
                    Some(MediaCommand::StopAndRewind)
                } else {
                    if position < FRESH_PLAY_THRESHOLD_SECS {
                        next.max_time_reached = 0.0;
                    }
                    next.is_playing = true;
                    None
                }
            }
            MediaEvent::PositionAdvanced { position } => {
                if position > self.max_time_reached {
                    next.max_time_reached = position;
                }
                None
            }
            MediaEvent::SeekAttempted { position } => {
                if position > self.max_time_reached + SEEK_TOLERANCE_SECS {
                    Some(MediaCommand::SeekTo {
                        position: self.max_time_reached,
                    })
                } else {
                    None
                }
            }
            MediaEvent::Paused => {
                next.is_playing = false;
                None
            }
            MediaEvent::Ended => {
                next.max_time_reached = 0.0;
                next.is_playing = false;
                next.plays_remaining = self.plays_remaining.saturating_sub(1);
                next.has_completed_once = true;
                None
            }
        };
        (next, command)
    }

    /// The comprehension questions are shown only after a full listen and
    /// while the clip is not playing.
    pub fn questions_visible(&self) -> bool {
        self.has_completed_once && !self.is_playing
    }

    /// All credits are spent and nothing is playing.
    pub fn playback_limit_reached(&self) -> bool {
        self.plays_remaining == 0 && !self.is_playing
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PLAYS)
    }
}

/// Owns the [`PlaybackState`] for one session and logs its transitions.
#[derive(Debug, Clone, Default)]
pub struct PlaybackGate {
    state: PlaybackState,
}

impl PlaybackGate {
    pub fn new(max_plays: u32) -> Self {
        Self {
            state: PlaybackState::new(max_plays),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn questions_visible(&self) -> bool {
        self.state.questions_visible()
    }

    /// Feed one media event through the gate.
    pub fn handle(&mut self, event: MediaEvent) -> Option<MediaCommand> {
        let before = self.state;
        let (after, command) = before.transition(event);
        self.state = after;

        match (&event, &command) {
            (MediaEvent::PlayRequested { .. }, Some(MediaCommand::StopAndRewind)) => {
                warn!("play denied: no play credits remaining");
            }
            (MediaEvent::SeekAttempted { position }, Some(MediaCommand::SeekTo { position: to })) => {
                warn!(attempted = position, clamped_to = to, "seek clamped");
            }
            (MediaEvent::Ended, _) => {
                info!(
                    plays_remaining = after.plays_remaining,
                    "clip finished"
                );
                if !before.has_completed_once {
                    info!("comprehension questions unlocked");
                }
            }
            _ => {}
        }
        debug!(?event, ?before, ?after, "playback transition");

        command
    }

    /// Feed an event and apply any resulting correction to `element`.
    pub fn dispatch(&mut self, event: MediaEvent, element: &mut dyn MediaElement) {
        if let Some(command) = self.handle(event) {
            command.apply_to(element);
        }
    }

    pub fn on_play_requested(&mut self, position: f64) -> Option<MediaCommand> {
        self.handle(MediaEvent::PlayRequested { position })
    }

    pub fn on_position_advanced(&mut self, position: f64) {
        self.handle(MediaEvent::PositionAdvanced { position });
    }

    pub fn on_seek_attempted(&mut self, position: f64) -> Option<MediaCommand> {
        self.handle(MediaEvent::SeekAttempted { position })
    }

    pub fn on_paused(&mut self) {
        self.handle(MediaEvent::Paused);
    }

    pub fn on_playback_ended(&mut self) {
        self.handle(MediaEvent::Ended);
    }
}
