use thiserror::Error;

/// Errors surfaced synchronously by the game engine
///
/// Collisions are not errors: a game ending is reported through
/// [`GameEvent::GameOver`](super::GameEvent::GameOver).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Construction parameters rejected (board too small, bad snake length, bad timing)
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// `start` was called while a stepper is active
    #[error("game is already running")]
    AlreadyRunning,

    /// A lifecycle command needed an active stepper and there was none
    #[error("game is not running")]
    NotRunning,

    /// A heading could not be parsed from text
    #[error("invalid heading: {0:?}")]
    InvalidHeading(String),

    /// The stepper has to be spawned from inside a tokio runtime
    #[error("no tokio runtime available to run the game clock")]
    NoRuntime,
}
