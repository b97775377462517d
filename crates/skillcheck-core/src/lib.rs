//! skillcheck-core: Playback gating and assessment progression.
//!
//! This crate defines the question-set model, the Playback Gate that meters
//! the audio clip, the listening and behavioural progression state machines,
//! and the payloads they hand to a submission sink.

pub mod answers;
pub mod behaviour;
pub mod error;
pub mod listening;
pub mod model;
pub mod parser;
pub mod payload;
pub mod playback;
pub mod session;
pub mod traits;

pub use error::{SessionError, SinkError};
pub use session::{Destination, Effect, SessionOptions};
