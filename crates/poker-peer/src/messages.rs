//! wire message types
//!
//! one json object per frame with a mandatory "type" tag. every scalar and
//! coordinate is a decimal-string integer, no hex, no 0x prefix; deck-sized
//! arrays are strictly slot order 0..52. these shapes are the wire contract
//! and must not drift.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use zk_deck::commit::Contribution;
use zk_deck::dleq::DleqProof;
use zk_deck::shuffle::{Permutation, ShuffleProof, ShuffleRound};
use zk_deck::{Deck, Point};

use crate::{ProtocolError, Result};

/// an affine point as decimal [x, y]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WirePoint(pub String, pub String);

/// one CARD_PREP entry: [[g], [gx], [h], [hx], r, t]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CardPrepEntry(
    pub WirePoint,
    pub WirePoint,
    pub WirePoint,
    pub WirePoint,
    pub String,
    pub String,
);

/// one disclosed shuffle round: [cards, z, perm]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShuffleRoundEntry(pub Vec<WirePoint>, pub String, pub Vec<usize>);

/// one revealed slot: [idx, [x, y]]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RevealEntry(pub usize, pub WirePoint);

/// protocol messages, one per frame
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WireMessage {
    #[serde(rename = "HELLO")]
    Hello { name: String },
    #[serde(rename = "CARD_PREP")]
    CardPrep { cards: Vec<CardPrepEntry> },
    #[serde(rename = "DECK_CHECK")]
    DeckCheck { deck: Vec<WirePoint> },
    #[serde(rename = "START_SHUFFLE")]
    StartShuffle,
    #[serde(rename = "SHUFFLE_RESULT")]
    ShuffleResult {
        deck: Vec<WirePoint>,
        proof: Vec<ShuffleRoundEntry>,
    },
    #[serde(rename = "DRAW_CARDS")]
    DrawCards { idxs: Vec<usize> },
    #[serde(rename = "REQUEST_REVEAL")]
    RequestReveal { idxs: Vec<usize> },
    #[serde(rename = "REVEAL")]
    Reveal { cards: Vec<RevealEntry> },
    #[serde(rename = "SHOWDOWN")]
    Showdown { scalar: String },
}

impl WireMessage {
    /// short name for logs and state errors
    pub fn kind(&self) -> &'static str {
        match self {
            WireMessage::Hello { .. } => "HELLO",
            WireMessage::CardPrep { .. } => "CARD_PREP",
            WireMessage::DeckCheck { .. } => "DECK_CHECK",
            WireMessage::StartShuffle => "START_SHUFFLE",
            WireMessage::ShuffleResult { .. } => "SHUFFLE_RESULT",
            WireMessage::DrawCards { .. } => "DRAW_CARDS",
            WireMessage::RequestReveal { .. } => "REQUEST_REVEAL",
            WireMessage::Reveal { .. } => "REVEAL",
            WireMessage::Showdown { .. } => "SHOWDOWN",
        }
    }
}

pub fn parse_scalar(s: &str) -> Result<BigUint> {
    s.parse::<BigUint>()
        .map_err(|_| ProtocolError::ProtocolViolation(format!("bad decimal integer {s:?}")))
}

pub fn scalar_string(v: &BigUint) -> String {
    v.to_str_radix(10)
}

impl WirePoint {
    pub fn from_point(point: &Point) -> Result<Self> {
        let (x, y) = point.coords().ok_or_else(|| {
            ProtocolError::ProtocolViolation("the point at infinity is not transmissible".into())
        })?;
        Ok(Self(x.to_str_radix(10), y.to_str_radix(10)))
    }

    pub fn to_point(&self) -> Result<Point> {
        let x = parse_scalar(&self.0)?;
        let y = parse_scalar(&self.1)?;
        Point::from_coords(&x, &y)
            .map_err(|_| ProtocolError::ProtocolViolation("point is not on the curve".into()))
    }

    pub fn to_coords(&self) -> Result<(BigUint, BigUint)> {
        Ok((parse_scalar(&self.0)?, parse_scalar(&self.1)?))
    }
}

pub fn deck_to_wire(deck: &Deck) -> Result<Vec<WirePoint>> {
    deck.points()
        .map_err(ProtocolError::from)?
        .iter()
        .map(WirePoint::from_point)
        .collect()
}

pub fn deck_from_wire(points: &[WirePoint]) -> Result<Deck> {
    let coords = points
        .iter()
        .map(|p| p.to_coords())
        .collect::<Result<Vec<_>>>()?;
    Deck::from_coords(&coords).map_err(ProtocolError::from)
}

impl CardPrepEntry {
    pub fn from_contribution(c: &Contribution) -> Result<Self> {
        Ok(Self(
            WirePoint::from_point(&c.g)?,
            WirePoint::from_point(&c.gx)?,
            WirePoint::from_point(&c.h)?,
            WirePoint::from_point(&c.hx)?,
            scalar_string(&c.proof.r),
            scalar_string(&c.proof.t),
        ))
    }

    pub fn to_contribution(&self) -> Result<Contribution> {
        Ok(Contribution {
            g: self.0.to_point()?,
            gx: self.1.to_point()?,
            h: self.2.to_point()?,
            hx: self.3.to_point()?,
            proof: DleqProof {
                r: parse_scalar(&self.4)?,
                t: parse_scalar(&self.5)?,
            },
        })
    }
}

impl ShuffleRoundEntry {
    pub fn from_round(round: &ShuffleRound) -> Result<Self> {
        Ok(Self(
            deck_to_wire(&round.deck)?,
            scalar_string(&round.z),
            round.perm.mapping().to_vec(),
        ))
    }

    pub fn to_round(&self) -> Result<ShuffleRound> {
        let perm = Permutation::new(self.2.clone())
            .map_err(|_| ProtocolError::ProtocolViolation("permutation is not a bijection".into()))?;
        Ok(ShuffleRound {
            deck: deck_from_wire(&self.0)?,
            z: parse_scalar(&self.1)?,
            perm,
        })
    }
}

pub fn proof_to_wire(proof: &ShuffleProof) -> Result<Vec<ShuffleRoundEntry>> {
    proof.rounds.iter().map(ShuffleRoundEntry::from_round).collect()
}

pub fn proof_from_wire(rounds: &[ShuffleRoundEntry]) -> Result<ShuffleProof> {
    Ok(ShuffleProof {
        rounds: rounds
            .iter()
            .map(ShuffleRoundEntry::to_round)
            .collect::<Result<Vec<_>>>()?,
    })
}
