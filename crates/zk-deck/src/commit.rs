//! collaborative deck commitment
//!
//! each peer contributes one masked random generator per slot. the DLEQ
//! proof binds the published witness gx and the deck contribution hx to the
//! same secret x, so a contributor cannot later swap its contribution
//! without the retained tuple failing re-verification. both peers add both
//! sets of contributions, and point addition commutes, so the decks
//! converge to the same 53 points.

use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};

use crate::curve::{self, Point};
use crate::deck::Deck;
use crate::dleq::{self, DleqProof};
use crate::{DeckError, Result, DECK_SIZE};

/// one slot's contribution: (g, gx, h, hx) plus the DLEQ binding them
///
/// hx is the value summed into the deck; gx is kept as an audit witness
#[derive(Clone, Debug)]
pub struct Contribution {
    pub g: Point,
    pub gx: Point,
    pub h: Point,
    pub hx: Point,
    pub proof: DleqProof,
}

/// generate a random masked element with its DLEQ proof
pub fn gen_contribution<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Contribution> {
    let base = Point::generator();
    let g = base.mul(&curve::rand_scalar(rng));
    let h = base.mul(&curve::rand_scalar(rng));
    let x = curve::rand_scalar(rng);
    let gx = g.mul(&x);
    let hx = h.mul(&x);
    let proof = dleq::prove(&g, &gx, &h, &hx, &x, rng)?;
    Ok(Contribution { g, gx, h, hx, proof })
}

/// run one peer's prepare round: a contribution per slot, each summed into
/// the local deck before it is broadcast
pub fn prepare_deck<R: RngCore + CryptoRng>(
    deck: &mut Deck,
    rng: &mut R,
) -> Result<Vec<Contribution>> {
    let mut contributions = Vec::with_capacity(DECK_SIZE);
    for idx in 0..DECK_SIZE {
        let contribution = gen_contribution(rng)?;
        deck.accumulate(idx, contribution.hx)?;
        contributions.push(contribution);
    }
    Ok(contributions)
}

/// absorb the peer's 53 contributions, strictly in slot order
///
/// an invalid DLEQ is fatal: the deck is left untouched past the failing
/// slot and the session must abort
pub fn absorb_contributions(deck: &mut Deck, contributions: &[Contribution]) -> Result<()> {
    if contributions.len() != DECK_SIZE {
        return Err(DeckError::SizeMismatch {
            expected: DECK_SIZE,
            got: contributions.len(),
        });
    }
    for (idx, c) in contributions.iter().enumerate() {
        if !dleq::verify(&c.g, &c.gx, &c.h, &c.hx, &c.proof) {
            return Err(DeckError::ProofInvalid(format!(
                "dleq rejected for slot {idx}"
            )));
        }
        deck.accumulate(idx, c.hx)?;
    }
    Ok(())
}

/// element-wise cross-check of the local committed deck against the peer's
pub fn cross_check(local: &Deck, remote: &[(BigUint, BigUint)]) -> Result<()> {
    let remote = Deck::from_coords(remote)?;
    let local_points = local.points()?;
    let remote_points = remote.points()?;
    for (slot, (mine, theirs)) in local_points.iter().zip(&remote_points).enumerate() {
        if mine != theirs {
            return Err(DeckError::DeckMismatch { slot });
        }
    }
    Ok(())
}
