//! poker-peer: the two-peer mental poker protocol
//!
//! wire messages, the per-peer state machine, and a tcp transport on top of
//! the zk-deck cryptographic core. each peer runs one protocol task fed by
//! decoded inbound frames; every cryptographic failure is fatal and moves
//! the session to abort without rollback.

pub mod connection;
pub mod messages;
pub mod session;

pub use messages::WireMessage;
pub use session::{Role, Session, State};

use zk_deck::DeckError;

/// fatal protocol failures, surfaced to the orchestrator with a structured
/// reason. the session never recovers locally: no downgrades, no retries.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProtocolError {
    /// malformed message, wrong message for the current state, wrong length
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),
    /// a DLEQ or shuffle transcript failed verification
    #[error("proof rejected: {0}")]
    ProofInvalid(String),
    /// the post-commitment cross-check disagrees
    #[error("decks disagree at slot {slot}")]
    DeckMismatch { slot: usize },
    /// a reveal produced a point outside the card mapping
    #[error("revealed point maps to no known card")]
    UnknownCard,
    /// an awaited message did not arrive in time
    #[error("timed out waiting for {0}")]
    Timeout(String),
    /// the connection itself failed
    #[error("transport failed: {0}")]
    Transport(String),
}

impl From<DeckError> for ProtocolError {
    fn from(err: DeckError) -> Self {
        match err {
            DeckError::ProofInvalid(reason) => Self::ProofInvalid(reason),
            DeckError::DeckMismatch { slot } => Self::DeckMismatch { slot },
            DeckError::UnknownCard => Self::UnknownCard,
            other => Self::ProtocolViolation(other.to_string()),
        }
    }
}

pub type Result<T> = core::result::Result<T, ProtocolError>;
