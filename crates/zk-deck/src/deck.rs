//! deck state and the frozen card mapping
//!
//! a deck is 53 optional points: slot 0 is the base slot, slots 1..52 carry
//! one card each. the base slot takes part in every protocol step exactly
//! like a card slot, except that shuffles pin it in place.
//!
//! lifecycle: empty (all None) -> committed (every slot the sum of both
//! peers' contributions) -> shuffled (a fresh deck per shuffle). a committed
//! deck is never mutated again.

use std::collections::HashMap;

use num_bigint::BigUint;

use crate::cards::{canonical_deck, Card};
use crate::curve::Point;
use crate::{DeckError, Result, DECK_SIZE};

/// 53 optional points, index 0 is the base slot
#[derive(Clone, Debug, PartialEq)]
pub struct Deck {
    slots: Vec<Option<Point>>,
}

impl Deck {
    /// a deck with every slot empty
    pub fn new() -> Self {
        Self {
            slots: vec![None; DECK_SIZE],
        }
    }

    /// a deck from exactly 53 points
    pub fn from_points(points: Vec<Point>) -> Result<Self> {
        if points.len() != DECK_SIZE {
            return Err(DeckError::SizeMismatch {
                expected: DECK_SIZE,
                got: points.len(),
            });
        }
        Ok(Self {
            slots: points.into_iter().map(Some).collect(),
        })
    }

    /// add a contribution into slot idx, treating an empty slot as zero
    pub fn accumulate(&mut self, idx: usize, point: Point) -> Result<()> {
        let slot = self
            .slots
            .get_mut(idx)
            .ok_or(DeckError::SizeMismatch {
                expected: DECK_SIZE,
                got: idx,
            })?;
        *slot = Some(match slot.take() {
            Some(current) => current + point,
            None => point,
        });
        Ok(())
    }

    pub fn slot(&self, idx: usize) -> Option<&Point> {
        self.slots.get(idx).and_then(|s| s.as_ref())
    }

    /// true once every slot holds a point
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(|s| s.is_some())
    }

    /// all 53 points of a complete deck, in slot order
    pub fn points(&self) -> Result<Vec<Point>> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, s)| s.ok_or(DeckError::EmptySlot(i)))
            .collect()
    }

    /// affine coordinates of a complete deck, in slot order
    pub fn to_coords(&self) -> Result<Vec<(BigUint, BigUint)>> {
        self.points()?
            .iter()
            .map(|p| p.coords().ok_or(DeckError::IdentityPoint))
            .collect()
    }

    /// rebuild a deck from 53 coordinate pairs, validating each point
    pub fn from_coords(coords: &[(BigUint, BigUint)]) -> Result<Self> {
        if coords.len() != DECK_SIZE {
            return Err(DeckError::SizeMismatch {
                expected: DECK_SIZE,
                got: coords.len(),
            });
        }
        let points = coords
            .iter()
            .map(|(x, y)| Point::from_coords(x, y))
            .collect::<Result<Vec<_>>>()?;
        Self::from_points(points)
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

/// injective mapping from committed card-slot coordinates to plaintext cards
///
/// frozen when commitment completes; both peers derive the same mapping from
/// the same committed deck, so nothing is transmitted
#[derive(Clone, Debug)]
pub struct CardMapping {
    entries: HashMap<(BigUint, BigUint), Card>,
}

impl CardMapping {
    /// derive the mapping from a committed deck: slot i holds the card at
    /// canonical position i - 1
    pub fn derive(committed: &Deck) -> Result<Self> {
        let points = committed.points()?;
        let mut entries = HashMap::with_capacity(DECK_SIZE - 1);
        for (point, card) in points[1..].iter().zip(canonical_deck()) {
            let coords = point.coords().ok_or(DeckError::IdentityPoint)?;
            entries.insert(coords, card);
        }
        Ok(Self { entries })
    }

    /// look up an unmasked point
    pub fn lookup(&self, point: &Point) -> Option<Card> {
        self.entries.get(&point.coords()?).copied()
    }

    /// number of distinct point keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
