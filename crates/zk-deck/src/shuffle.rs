//! oblivious shuffle with a cut-and-choose proof of correctness
//!
//! a shuffle multiplies every slot by one secret scalar x and permutes the
//! card slots with a secret permutation that pins the base slot: pi[0] = 0.
//!
//! the proof runs SHUFFLE_SECURITY_PARAM independent rounds. each round
//! reshuffles the output deck into an intermediate deck C and derives a
//! challenge bit from the oracle over the full transcript D || D' || C, so C
//! is committed before the bit is known. bit 0 opens C against D' alone,
//! bit 1 opens C against the original D through the composed permutation;
//! neither branch reveals pi by itself.

use num_bigint::BigUint;
use rand::{CryptoRng, Rng, RngCore};

use crate::curve::{self, Point};
use crate::deck::Deck;
use crate::oracle::RomQuery;
use crate::{DeckError, ProtocolConfig, Result, DECK_SIZE};

/// a permutation of the deck slots
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Permutation {
    mapping: Vec<usize>,
}

impl Permutation {
    /// validate a mapping as a bijection of 0..n
    pub fn new(mapping: Vec<usize>) -> Result<Self> {
        let n = mapping.len();
        let mut seen = vec![false; n];
        for &idx in &mapping {
            if idx >= n || seen[idx] {
                return Err(DeckError::InvalidPermutation);
            }
            seen[idx] = true;
        }
        Ok(Self { mapping })
    }

    /// a random deck permutation: unbiased fisher-yates over the card slots
    /// 1..=52, with the base slot pinned at index 0
    pub fn random_deck<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut cards: Vec<usize> = (1..DECK_SIZE).collect();
        for i in 0..cards.len() - 1 {
            let j = rng.gen_range(i..cards.len());
            cards.swap(i, j);
        }
        let mut mapping = Vec::with_capacity(DECK_SIZE);
        mapping.push(0);
        mapping.extend(cards);
        Self { mapping }
    }

    /// apply: output[i] = input[self[i]]
    pub fn apply<T: Clone>(&self, input: &[T]) -> Vec<T> {
        self.mapping.iter().map(|&i| input[i].clone()).collect()
    }

    /// compose: result[k] = self[other[k]]
    pub fn compose(&self, other: &Permutation) -> Permutation {
        Permutation {
            mapping: other.mapping.iter().map(|&k| self.mapping[k]).collect(),
        }
    }

    pub fn get(&self, i: usize) -> usize {
        self.mapping[i]
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    pub fn mapping(&self) -> &[usize] {
        &self.mapping
    }
}

/// one disclosed cut-and-choose round
///
/// deck is the intermediate deck C; on a 0 bit (z, perm) open C against the
/// shuffle output, on a 1 bit they open it against the shuffle input. z is
/// carried unreduced, like every wire scalar.
#[derive(Clone, Debug)]
pub struct ShuffleRound {
    pub deck: Deck,
    pub z: BigUint,
    pub perm: Permutation,
}

/// non-interactive shuffle transcript
#[derive(Clone, Debug)]
pub struct ShuffleProof {
    pub rounds: Vec<ShuffleRound>,
}

/// shuffle a complete deck: D'[i] = x * D[pi[i]]
///
/// returns the secret scalar, the secret permutation, and the new deck
pub fn shuffle_deck<R: RngCore + CryptoRng>(
    deck: &Deck,
    rng: &mut R,
) -> Result<(BigUint, Permutation, Deck)> {
    let points = deck.points()?;
    let perm = Permutation::random_deck(rng);
    let x = nonzero_scalar(rng);
    let shuffled = perm
        .apply(&points)
        .iter()
        .map(|p| p.mul(&x))
        .collect::<Vec<_>>();
    Ok((x, perm, Deck::from_points(shuffled)?))
}

/// prove that output = shuffle(input) under secret (x, pi)
pub fn prove_shuffle<R: RngCore + CryptoRng>(
    config: &ProtocolConfig,
    input: &Deck,
    output: &Deck,
    x: &BigUint,
    perm: &Permutation,
    rng: &mut R,
) -> Result<ShuffleProof> {
    let mut rounds = Vec::with_capacity(config.shuffle_rounds);
    for _ in 0..config.shuffle_rounds {
        let (y, blind_perm, blind_deck) = shuffle_deck(output, rng)?;
        let bit = round_challenge(input, output, &blind_deck)?;
        let round = if bit {
            // open against the original deck: z = x*y, rho = pi o pi'
            ShuffleRound {
                deck: blind_deck,
                z: x * &y,
                perm: perm.compose(&blind_perm),
            }
        } else {
            // open against the shuffled deck
            ShuffleRound {
                deck: blind_deck,
                z: y,
                perm: blind_perm,
            }
        };
        rounds.push(round);
    }
    Ok(ShuffleProof { rounds })
}

/// verify a shuffle transcript against the input and output decks
///
/// Ok(false) means the proof is rejected; Err means the decks themselves
/// are malformed (empty slots, wrong length)
pub fn verify_shuffle(
    config: &ProtocolConfig,
    input: &Deck,
    output: &Deck,
    proof: &ShuffleProof,
) -> Result<bool> {
    if proof.rounds.len() != config.shuffle_rounds {
        return Ok(false);
    }
    let input_points = input.points()?;
    let output_points = output.points()?;
    for round in &proof.rounds {
        if round.perm.len() != DECK_SIZE {
            return Ok(false);
        }
        let Ok(disclosed) = round.deck.points() else {
            return Ok(false);
        };
        let Ok(bit) = round_challenge(input, output, &round.deck) else {
            return Ok(false);
        };
        let base = if bit { &input_points } else { &output_points };
        let scaled: Vec<Point> = base.iter().map(|p| p.mul(&round.z)).collect();
        if round.perm.apply(&scaled) != disclosed {
            return Ok(false);
        }
    }
    Ok(true)
}

/// challenge bit for one round: lsb of H over the coordinates of every card
/// of the input deck, then the output deck, then the round's intermediate
/// deck, each in slot order
fn round_challenge(input: &Deck, output: &Deck, intermediate: &Deck) -> Result<bool> {
    let mut query = RomQuery::new();
    for deck in [input, output, intermediate] {
        for pair in deck.to_coords()? {
            query.feed_pair(&pair);
        }
    }
    Ok(query.challenge_bit())
}

/// a scalar in [1, n): zero would collapse the whole deck to the identity
fn nonzero_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> BigUint {
    loop {
        let x = curve::rand_scalar(rng);
        if !curve::scalar_is_zero(&x) {
            return x;
        }
    }
}
