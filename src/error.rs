use thiserror::Error;

/// Rejections surfaced to the requesting client. None of these change state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("No session ID provided")]
    NoSession,

    #[error("Game not found")]
    GameNotFound,

    #[error("{0}")]
    GameFull(&'static str),

    #[error("{0}")]
    GameAlreadyStarted(&'static str),

    #[error("Game has already ended")]
    GameEnded,

    #[error("It is {0}'s turn")]
    NotYourTurn(crate::models::Side),

    #[error("Game is not active")]
    GameNotActive,

    #[error("You are not a player in this game")]
    NotInGame,

    #[error("Illegal move: {0}")]
    InvalidMove(String),

    #[error("There is already a pending draw offer")]
    DrawAlreadyOffered,

    #[error("There is no pending draw offer")]
    NoDrawOffer,

    #[error("Cannot respond to your own draw offer")]
    CantRespondOwn,

    #[error(transparent)]
    InvalidSettings(#[from] SettingsError),

    #[error("Invalid square: {0}")]
    InvalidSquare(String),

    #[error("Invalid message format: {0}")]
    InvalidMessage(String),
}

impl GameError {
    /// Stable machine-readable code sent alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            GameError::NoSession => "NO_SESSION",
            GameError::GameNotFound => "GAME_NOT_FOUND",
            GameError::GameFull(_) => "GAME_FULL",
            GameError::GameAlreadyStarted(_) => "GAME_ALREADY_STARTED",
            GameError::GameEnded => "GAME_ENDED",
            GameError::NotYourTurn(_) => "NOT_YOUR_TURN",
            GameError::GameNotActive => "GAME_NOT_ACTIVE",
            GameError::NotInGame => "NOT_IN_GAME",
            GameError::InvalidMove(_) => "INVALID_MOVE",
            GameError::DrawAlreadyOffered => "DRAW_ALREADY_OFFERED",
            GameError::NoDrawOffer => "NO_DRAW_OFFER",
            GameError::CantRespondOwn => "CANT_RESPOND_OWN",
            GameError::InvalidSettings(_) => "INVALID_SETTINGS",
            GameError::InvalidSquare(_) => "INVALID_SQUARE",
            GameError::InvalidMessage(_) => "INVALID_MESSAGE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("Turn time must be between {min} and {max} seconds, got {value}")]
    TurnTimeOutOfRange { value: u32, min: u32, max: u32 },

    #[error("Grace period must be between {min} and {max} seconds, got {value}")]
    GracePeriodOutOfRange { value: u32, min: u32, max: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    #[error("Invalid FEN: {0}")]
    InvalidFen(String),
}
