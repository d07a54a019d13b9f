use thiserror::Error;

/// Failures surfaced to the player. An illegal human drop is not one of
/// these: it is answered with a snapback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayError {
    /// The move service could not be reached or its body could not be read.
    #[error("Server error: {0}")]
    Transport(String),

    /// The move service answered with a non-success status.
    #[error("Server error: {text}")]
    Status { code: u16, text: String },

    /// The move service answered with an explicit error message.
    #[error("Error from server: {0}")]
    Service(String),

    /// The reply was not the JSON shape the client expects.
    #[error("Server error: malformed reply ({0})")]
    Malformed(String),

    /// The service's move was unparsable or illegal in the current position.
    #[error("Invalid move from AI: {0}")]
    InvalidAiMove(String),

    #[error("Invalid position: {0}")]
    InvalidFen(String),
}
