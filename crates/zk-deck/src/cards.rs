//! the canonical card set
//!
//! a card is its position in the fixed deck order both peers read the
//! committed deck against: ranks climb from two to ace, and within each
//! rank the suits run clubs, hearts, diamonds, spades. card slot i of a
//! committed deck (1..=52) holds the card at position i - 1. rank and suit
//! are views derived from the position, not stored.

use core::fmt;

/// card suit, in the order the deck interleaves them within a rank
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Suit {
    Clubs,
    Hearts,
    Diamonds,
    Spades,
}

impl Suit {
    pub fn name(self) -> &'static str {
        match self {
            Suit::Clubs => "clubs",
            Suit::Hearts => "hearts",
            Suit::Diamonds => "diamonds",
            Suit::Spades => "spades",
        }
    }

    fn offset(self) -> u8 {
        match self {
            Suit::Clubs => 0,
            Suit::Hearts => 1,
            Suit::Diamonds => 2,
            Suit::Spades => 3,
        }
    }
}

/// one of the 52 canonical cards, identified by its deck position
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Card(u8);

impl Card {
    /// lowest rank in play
    pub const MIN_RANK: u8 = 2;
    /// ace, the highest rank
    pub const MAX_RANK: u8 = 14;

    /// the card at a deck position, None past the end of the deck
    pub fn at(position: u8) -> Option<Self> {
        (position < 52).then_some(Self(position))
    }

    /// the card with the given rank value and suit
    pub fn new(rank: u8, suit: Suit) -> Option<Self> {
        if !(Self::MIN_RANK..=Self::MAX_RANK).contains(&rank) {
            return None;
        }
        Some(Self((rank - Self::MIN_RANK) * 4 + suit.offset()))
    }

    /// position in the canonical order, 0..52
    pub fn position(self) -> u8 {
        self.0
    }

    /// rank value, 2 through 14 with ace high
    pub fn rank(self) -> u8 {
        Self::MIN_RANK + self.0 / 4
    }

    pub fn suit(self) -> Suit {
        match self.0 % 4 {
            0 => Suit::Clubs,
            1 => Suit::Hearts,
            2 => Suit::Diamonds,
            _ => Suit::Spades,
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {}", rank_name(self.rank()), self.suit().name())
    }
}

/// spelled-out rank name, used in card and hand descriptions
pub fn rank_name(value: u8) -> &'static str {
    match value {
        2 => "Two",
        3 => "Three",
        4 => "Four",
        5 => "Five",
        6 => "Six",
        7 => "Seven",
        8 => "Eight",
        9 => "Nine",
        10 => "Ten",
        11 => "Jack",
        12 => "Queen",
        13 => "King",
        14 => "Ace",
        _ => "?",
    }
}

/// the 52 cards in canonical deck order
pub fn canonical_deck() -> Vec<Card> {
    (0..52).map(Card).collect()
}
