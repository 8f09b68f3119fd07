use std::string::FromUtf8Error;

use thiserror::Error;
use tokio::sync::mpsc::error::SendError as MpscSendError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error("buffer is too short to hold a complete message")]
    TruncatedMessage,
    #[error("magic cookie does not match 0x2112A442")]
    BadMagicCookie,
    #[error("attribute length overruns the message buffer")]
    BadAttributeLength,
    #[error("attribute already exists in message")]
    DuplicateAttribute,
    #[error("comprehension-required attribute is not understood")]
    UnknownComprehensionRequiredAttribute,
    #[error("MESSAGE-INTEGRITY check failed")]
    IntegrityMismatch,
    #[error("FINGERPRINT check failed")]
    FingerprintMismatch,
    #[error("FINGERPRINT attribute precedes MESSAGE-INTEGRITY attribute")]
    FingerprintBeforeIntegrity,
    #[error("transaction id has invalid length")]
    InvalidTransactionId,
    #[error("attribute is not valid in this message context: {0}")]
    ContextViolation(&'static str),
    #[error("value is out of the attribute's valid range")]
    ValueOutOfRange,
    #[error("attribute size overflow")]
    AttributeSizeOverflow,
    #[error("attribute size is invalid")]
    AttributeSizeInvalid,
    #[error("attribute not found")]
    AttributeNotFound,
    #[error("message type was never set before encoding")]
    TypeNotSet,
    #[error("no default reason for this ErrorCode")]
    NoDefaultReason,
    #[error("bad UNKNOWN-ATTRIBUTES size")]
    BadUnknownAttrsSize,
    #[error("invalid length of IP value")]
    BadIpLength,

    #[error("transaction is stopped")]
    TransactionStopped,
    #[error("transaction does not exist")]
    TransactionNotExists,
    #[error("transaction already exists with same id")]
    TransactionExists,
    #[error("agent is closed")]
    AgentClosed,
    #[error("no connection provided")]
    NoConnection,
    #[error("client is closed")]
    ClientClosed,
    #[error("transaction timed out")]
    Timeout,
    #[error("transaction was cancelled")]
    Cancelled,

    #[error("invalid STUN URI")]
    InvalidUrl,
    #[error("unknown URI scheme, expected stun: or stuns:")]
    SchemeType,
    #[error("invalid hostname")]
    Host,

    #[error("{0}")]
    Other(String),
    #[error("url parse: {0}")]
    Url(#[from] url::ParseError),
    #[error("utf8: {0}")]
    Utf8(#[from] FromUtf8Error),
    #[error("{0}")]
    Io(#[source] IoError),
    #[error("mpsc send: {0}")]
    MpscSend(String),
}

#[derive(Debug, Error)]
#[error("io error: {0}")]
pub struct IoError(#[from] pub std::io::Error);

// io::Error has no PartialEq, so compare by kind.
impl PartialEq for IoError {
    fn eq(&self, other: &Self) -> bool {
        self.0.kind() == other.0.kind()
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(IoError(e))
    }
}

// Tokio's SendError is generic over the payload, so we lose the payload but
// keep the message.
impl<T> From<MpscSendError<T>> for Error {
    fn from(e: MpscSendError<T>) -> Self {
        Error::MpscSend(e.to_string())
    }
}
