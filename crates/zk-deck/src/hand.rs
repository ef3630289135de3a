//! hand evaluation
//!
//! ranks a seven-card hand directly: flush detection over suit counts,
//! straight detection over rank sets (including the wheel), then the paired
//! groups. produces a category, a tie-breaking vector compared
//! lexicographically, and a human-readable description for the showdown.

use core::cmp::Ordering;

use crate::cards::{rank_name, Card, Suit};

/// hand category, ordered by strength
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum HandCategory {
    HighCard = 1,
    OnePair = 2,
    TwoPair = 3,
    ThreeOfAKind = 4,
    Straight = 5,
    Flush = 6,
    FullHouse = 7,
    FourOfAKind = 8,
    StraightFlush = 9,
    RoyalFlush = 10,
}

/// an evaluated hand
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hand {
    pub category: HandCategory,
    /// tie-break ranks, highest significance first
    pub tiebreak: Vec<u8>,
    pub description: String,
    pub cards: Vec<Card>,
}

impl PartialOrd for Hand {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Hand {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.category, &self.tiebreak).cmp(&(other.category, &other.tiebreak))
    }
}

impl Hand {
    /// evaluate the best hand among the given cards (seven at showdown)
    pub fn evaluate(cards: &[Card]) -> Self {
        let (category, tiebreak, description) = best_hand(cards);
        Self {
            category,
            tiebreak,
            description,
            cards: cards.to_vec(),
        }
    }
}

/// ranks of the flush suit if any suit has five or more cards
fn flush_ranks(cards: &[Card]) -> Option<Vec<u8>> {
    let flush_suit = [Suit::Clubs, Suit::Hearts, Suit::Diamonds, Suit::Spades]
        .into_iter()
        .find(|&suit| cards.iter().filter(|c| c.suit() == suit).count() >= 5)?;
    let mut ranks: Vec<u8> = cards
        .iter()
        .filter(|c| c.suit() == flush_suit)
        .map(|c| c.rank())
        .collect();
    ranks.sort_unstable_by(|a, b| b.cmp(a));
    ranks.dedup();
    Some(ranks)
}

/// highest straight contained in the given ranks, wheel included
fn highest_straight(ranks: &[u8]) -> Option<u8> {
    let mut present = [false; 15];
    for &r in ranks {
        present[r as usize] = true;
    }
    for high in (6..=14u8).rev() {
        if (high - 4..=high).all(|r| present[r as usize]) {
            return Some(high);
        }
    }
    // wheel: A-2-3-4-5
    if present[14] && (2..=5usize).all(|r| present[r]) {
        return Some(5);
    }
    None
}

fn kicker_names(kickers: &[u8]) -> String {
    kickers
        .iter()
        .map(|&k| rank_name(k))
        .collect::<Vec<_>>()
        .join(" ")
}

fn best_hand(cards: &[Card]) -> (HandCategory, Vec<u8>, String) {
    let ranks: Vec<u8> = cards.iter().map(|c| c.rank()).collect();
    let mut sorted_ranks = ranks.clone();
    sorted_ranks.sort_unstable_by(|a, b| b.cmp(a));

    // groups of equal rank, largest count first, rank breaking ties
    let mut counts = [0u8; 15];
    for &r in &ranks {
        counts[r as usize] += 1;
    }
    let mut groups: Vec<(u8, u8)> = (2..=14u8)
        .filter(|&r| counts[r as usize] > 0)
        .map(|r| (counts[r as usize], r))
        .collect();
    groups.sort_unstable_by(|a, b| b.cmp(a));

    let flush = flush_ranks(cards);

    // straight flush and royal flush live inside the flush suit
    if let Some(ranks) = &flush {
        if let Some(high) = highest_straight(ranks) {
            if high == 14 {
                return (HandCategory::RoyalFlush, vec![], "Royal flush".into());
            }
            return (
                HandCategory::StraightFlush,
                vec![high],
                format!("{}-high straight flush", rank_name(high)),
            );
        }
    }

    if groups[0].0 == 4 {
        let quad = groups[0].1;
        let kicker = sorted_ranks.iter().copied().find(|&r| r != quad).unwrap_or(0);
        return (
            HandCategory::FourOfAKind,
            vec![quad, kicker],
            format!(
                "Four of a kind: {} with {} kicker",
                rank_name(quad),
                rank_name(kicker)
            ),
        );
    }

    if groups[0].0 == 3 && groups.len() > 1 && groups[1].0 >= 2 {
        let trips = groups[0].1;
        let pair = groups[1].1;
        return (
            HandCategory::FullHouse,
            vec![trips, pair],
            format!("Full house: {}s over {}s", rank_name(trips), rank_name(pair)),
        );
    }

    if let Some(ranks) = &flush {
        let top: Vec<u8> = ranks.iter().copied().take(5).collect();
        let desc = format!("Flush: {}", kicker_names(&top));
        return (HandCategory::Flush, top, desc);
    }

    if let Some(high) = highest_straight(&ranks) {
        return (
            HandCategory::Straight,
            vec![high],
            format!("Straight: {}-high", rank_name(high)),
        );
    }

    if groups[0].0 == 3 {
        let trips = groups[0].1;
        let kickers: Vec<u8> = sorted_ranks
            .iter()
            .copied()
            .filter(|&r| r != trips)
            .take(2)
            .collect();
        let desc = format!(
            "Three of a kind: {} with kickers {}",
            rank_name(trips),
            kicker_names(&kickers)
        );
        let mut tiebreak = vec![trips];
        tiebreak.extend(&kickers);
        return (HandCategory::ThreeOfAKind, tiebreak, desc);
    }

    if groups.len() > 1 && groups[0].0 == 2 && groups[1].0 == 2 {
        let high_pair = groups[0].1;
        let low_pair = groups[1].1;
        let kicker = sorted_ranks
            .iter()
            .copied()
            .find(|&r| r != high_pair && r != low_pair)
            .unwrap_or(0);
        return (
            HandCategory::TwoPair,
            vec![high_pair, low_pair, kicker],
            format!(
                "Two pair: {}s and {}s with {} kicker",
                rank_name(high_pair),
                rank_name(low_pair),
                rank_name(kicker)
            ),
        );
    }

    if groups[0].0 == 2 {
        let pair = groups[0].1;
        let kickers: Vec<u8> = sorted_ranks
            .iter()
            .copied()
            .filter(|&r| r != pair)
            .take(3)
            .collect();
        let desc = format!(
            "One pair: {} with kickers {}",
            rank_name(pair),
            kicker_names(&kickers)
        );
        let mut tiebreak = vec![pair];
        tiebreak.extend(&kickers);
        return (HandCategory::OnePair, tiebreak, desc);
    }

    let top: Vec<u8> = sorted_ranks.iter().copied().take(5).collect();
    let desc = format!("High card: {}", kicker_names(&top));
    (HandCategory::HighCard, top, desc)
}
