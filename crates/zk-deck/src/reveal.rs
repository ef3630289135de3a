//! deal and reveal
//!
//! after both shuffles every card slot of the dealing deck is masked by the
//! product of both peers' shuffle scalars. the non-owner strips its own
//! scalar and sends the partial unmask; the owner strips the remaining one
//! and looks the committed point up in the card mapping. the partner never
//! sees the unmasked point of a card it does not own until showdown, when
//! both scalars are released for all hand cards.

use num_bigint::BigUint;

use crate::curve::{self, Point};
use crate::deck::{CardMapping, Deck};
use crate::cards::Card;
use crate::{DeckError, Result};

/// cards per hand
pub const HAND_SIZE: usize = 7;

/// strip one shuffle scalar: x^-1 * P
pub fn strip_scalar(point: &Point, x: &BigUint) -> Result<Point> {
    let inv = curve::scalar_inverse(x).ok_or(DeckError::ZeroScalar)?;
    Ok(point.mul(&inv))
}

/// partially unmask the given slots for the peer that owns them
///
/// for each requested slot this computes x_own^-1 * P, leaving the card
/// still masked by the owner's scalar
pub fn unmask_for_peer(
    dealing: &Deck,
    idxs: &[usize],
    own_scalar: &BigUint,
) -> Result<Vec<(usize, Point)>> {
    let mut out = Vec::with_capacity(idxs.len());
    for &idx in idxs {
        let point = dealing
            .slot(idx)
            .ok_or(DeckError::EmptySlot(idx))?;
        out.push((idx, strip_scalar(point, own_scalar)?));
    }
    Ok(out)
}

/// finish the reveal of an owned slot: strip the own scalar from the peer's
/// partial unmask and look the committed point up
pub fn finish_reveal(
    partial: &Point,
    own_scalar: &BigUint,
    mapping: &CardMapping,
) -> Result<Card> {
    let committed = strip_scalar(partial, own_scalar)?;
    mapping.lookup(&committed).ok_or(DeckError::UnknownCard)
}

/// unmask a hand directly from the dealing deck once both scalars are known
///
/// used at showdown to audit the peer's claimed hand against its released
/// shuffle scalar
pub fn audit_hand(
    dealing: &Deck,
    idxs: &[usize],
    peer_scalar: &BigUint,
    own_scalar: &BigUint,
    mapping: &CardMapping,
) -> Result<Vec<Card>> {
    let mut cards = Vec::with_capacity(idxs.len());
    for &idx in idxs {
        let point = dealing
            .slot(idx)
            .ok_or(DeckError::EmptySlot(idx))?;
        let partial = strip_scalar(point, peer_scalar)?;
        cards.push(finish_reveal(&partial, own_scalar, mapping)?);
    }
    Ok(cards)
}
