//! Stand-in for the display layer's audio element.

use skillcheck_core::traits::MediaElement;

/// Records the corrections a session issues so they show up in the transcript.
#[derive(Debug, Default)]
pub struct SimulatedMedia {
    pub position: f64,
    pub paused: bool,
}

impl MediaElement for SimulatedMedia {
    fn pause(&mut self) {
        self.paused = true;
    }

    fn set_position(&mut self, seconds: f64) {
        self.position = seconds;
    }
}
