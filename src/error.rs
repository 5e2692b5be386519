use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("network error: {0}")]
    Network(#[from] std::io::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// The client's writer has gone away; the session is dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("connection closed")]
pub struct TransportError;

/// The acting session was removed from the roster (kicked, dropped or
/// cleared by shutdown) before its request was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("session is no longer in the roster")]
pub struct NotMember;

/// Why a candidate nickname was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NicknameError {
    #[error("nickname cannot be empty")]
    Empty,

    #[error("that nickname is reserved")]
    Reserved,

    #[error("nickname cannot start with '!'")]
    CommandSigil,

    #[error("nickname cannot be longer than {max} characters")]
    TooLong { max: usize },

    #[error("nickname cannot contain \" - \"")]
    Separator,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required argument port:<port>")]
    MissingPort,

    #[error("invalid port: {0}")]
    InvalidPort(String),

    #[error("malformed argument '{0}', expected key:value")]
    Malformed(String),

    #[error("unknown option: {0}")]
    UnknownOption(String),
}
