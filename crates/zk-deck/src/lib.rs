//! zk-deck: joint deck commitment and shuffle proofs for two-party mental poker
//!
//! two mutually distrusting peers build a 53-slot deck of secp256r1 points
//! (slot 0 is a base slot, slots 1..52 carry one card each), shuffle it under
//! secret scalars with cut-and-choose NIZK proofs, and unmask dealt cards
//! cooperatively
//!
//! no trusted third party, every step offline-verifiable

pub mod cards;
pub mod commit;
pub mod curve;
pub mod deck;
pub mod dleq;
pub mod hand;
pub mod oracle;
pub mod reveal;
pub mod shuffle;

#[cfg(test)]
mod tests;

pub use commit::Contribution;
pub use curve::Point;
pub use deck::{CardMapping, Deck};
pub use dleq::DleqProof;
pub use shuffle::{Permutation, ShuffleProof};

/// deck slots: one base slot plus 52 card slots
pub const DECK_SIZE: usize = 53;

/// cut-and-choose rounds per shuffle proof (soundness error 2^-5)
pub const SHUFFLE_SECURITY_PARAM: usize = 5;

/// errors surfaced by the cryptographic core
///
/// every failure is fatal to the protocol session; nothing here is retried
#[derive(Debug, Clone, thiserror::Error)]
pub enum DeckError {
    #[error("point is not on the secp256r1 curve")]
    NotOnCurve,
    #[error("the point at infinity has no affine coordinates")]
    IdentityPoint,
    #[error("scalar is zero mod the group order")]
    ZeroScalar,
    #[error("deck slot {0} is empty")]
    EmptySlot(usize),
    #[error("length mismatch: expected {expected}, got {got}")]
    SizeMismatch { expected: usize, got: usize },
    #[error("permutation is not a bijection of the deck slots")]
    InvalidPermutation,
    #[error("proof rejected: {0}")]
    ProofInvalid(String),
    #[error("decks disagree at slot {slot}")]
    DeckMismatch { slot: usize },
    #[error("revealed point maps to no known card")]
    UnknownCard,
}

pub type Result<T> = core::result::Result<T, DeckError>;

/// protocol parameters
///
/// the security parameter is a knob: 5 rounds match the wire contract of the
/// reference deployment, hostile settings want more
#[derive(Clone, Debug)]
pub struct ProtocolConfig {
    /// cut-and-choose rounds per shuffle proof
    pub shuffle_rounds: usize,
}

impl ProtocolConfig {
    /// the standard configuration
    pub fn standard() -> Self {
        Self {
            shuffle_rounds: SHUFFLE_SECURITY_PARAM,
        }
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self::standard()
    }
}
