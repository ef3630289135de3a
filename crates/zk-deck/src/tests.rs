//! integration tests across the protocol stack
//!
//! exercises the two-peer flows end to end: commitment symmetry, the double
//! shuffle, dealing and reveal, plus the property-style invariants and the
//! seeded determinism harness used for replay testing

use num_bigint::BigUint;
use proptest::prelude::*;
use rand::rngs::OsRng;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::cards::canonical_deck;
use crate::commit;
use crate::curve::{self, Point};
use crate::deck::{CardMapping, Deck};
use crate::dleq;
use crate::reveal::{self, HAND_SIZE};
use crate::shuffle::{self, Permutation};
use crate::{DeckError, ProtocolConfig, DECK_SIZE};

/// run the prepare phase for two peers and return both decks
fn commit_both<R: rand::RngCore + rand::CryptoRng>(rng: &mut R) -> (Deck, Deck) {
    let mut alice = Deck::new();
    let mut bob = Deck::new();
    let from_alice = commit::prepare_deck(&mut alice, rng).unwrap();
    let from_bob = commit::prepare_deck(&mut bob, rng).unwrap();
    commit::absorb_contributions(&mut alice, &from_bob).unwrap();
    commit::absorb_contributions(&mut bob, &from_alice).unwrap();
    (alice, bob)
}

#[test]
fn test_commitment_symmetry() {
    let mut rng = OsRng;
    let (alice, bob) = commit_both(&mut rng);
    assert_eq!(alice, bob);
    assert_eq!(alice.to_coords().unwrap(), bob.to_coords().unwrap());
}

#[test]
fn test_full_protocol_both_hands_valid() {
    let mut rng = OsRng;
    let config = ProtocolConfig::standard();
    let (committed, _) = commit_both(&mut rng);
    let mapping = CardMapping::derive(&committed).unwrap();

    // alice shuffles, bob verifies
    let (xa, pa, once) = shuffle::shuffle_deck(&committed, &mut rng).unwrap();
    let proof_a = shuffle::prove_shuffle(&config, &committed, &once, &xa, &pa, &mut rng).unwrap();
    assert!(shuffle::verify_shuffle(&config, &committed, &once, &proof_a).unwrap());

    // bob shuffles, alice verifies
    let (xb, pb, dealing) = shuffle::shuffle_deck(&once, &mut rng).unwrap();
    let proof_b = shuffle::prove_shuffle(&config, &once, &dealing, &xb, &pb, &mut rng).unwrap();
    assert!(shuffle::verify_shuffle(&config, &once, &dealing, &proof_b).unwrap());

    // alice draws 1..=7, bob draws 8..=14
    let alice_idxs: Vec<usize> = (1..=HAND_SIZE).collect();
    let bob_idxs: Vec<usize> = (HAND_SIZE + 1..=2 * HAND_SIZE).collect();

    // bob unmasks for alice, alice finishes with her own scalar
    let mut dealt = Vec::new();
    for (_, partial) in reveal::unmask_for_peer(&dealing, &alice_idxs, &xb).unwrap() {
        dealt.push(reveal::finish_reveal(&partial, &xa, &mapping).unwrap());
    }
    for (_, partial) in reveal::unmask_for_peer(&dealing, &bob_idxs, &xa).unwrap() {
        dealt.push(reveal::finish_reveal(&partial, &xb, &mapping).unwrap());
    }

    assert_eq!(dealt.len(), 2 * HAND_SIZE);
    let unique: std::collections::HashSet<_> = dealt.iter().copied().collect();
    assert_eq!(unique.len(), 2 * HAND_SIZE, "hands must not overlap");
}

#[test]
fn test_seeded_runs_are_identical() {
    // replay harness: the same seeds must reproduce decks, shuffles and
    // proofs byte for byte
    let run = |seed_a: u64, seed_b: u64| {
        let mut rng_a = ChaCha20Rng::seed_from_u64(seed_a);
        let mut rng_b = ChaCha20Rng::seed_from_u64(seed_b);
        let config = ProtocolConfig::standard();

        let mut alice = Deck::new();
        let mut bob = Deck::new();
        let from_alice = commit::prepare_deck(&mut alice, &mut rng_a).unwrap();
        let from_bob = commit::prepare_deck(&mut bob, &mut rng_b).unwrap();
        commit::absorb_contributions(&mut alice, &from_bob).unwrap();
        commit::absorb_contributions(&mut bob, &from_alice).unwrap();

        let (xa, pa, once) = shuffle::shuffle_deck(&alice, &mut rng_a).unwrap();
        let proof = shuffle::prove_shuffle(&config, &alice, &once, &xa, &pa, &mut rng_a).unwrap();
        (
            alice.to_coords().unwrap(),
            once.to_coords().unwrap(),
            proof.rounds.iter().map(|r| r.z.clone()).collect::<Vec<_>>(),
        )
    };

    assert_eq!(run(7, 11), run(7, 11));
    assert_ne!(run(7, 11), run(7, 12));
}

#[test]
fn test_mapping_total_after_full_unmask() {
    let mut rng = OsRng;
    let (committed, _) = commit_both(&mut rng);
    let mapping = CardMapping::derive(&committed).unwrap();
    assert_eq!(mapping.len(), 52);

    let (xa, _, once) = shuffle::shuffle_deck(&committed, &mut rng).unwrap();
    let (xb, _, dealing) = shuffle::shuffle_deck(&once, &mut rng).unwrap();

    let idxs: Vec<usize> = (1..DECK_SIZE).collect();
    let cards = reveal::audit_hand(&dealing, &idxs, &xa, &xb, &mapping).unwrap();
    let unique: std::collections::HashSet<_> = cards.into_iter().collect();
    assert_eq!(unique, canonical_deck().into_iter().collect());
}

#[test]
fn test_fisher_yates_small_population_is_uniform() {
    // project each permutation onto the image of slot 1 and check the
    // frequencies are flat; a biased fisher-yates fails this decisively
    let mut rng = OsRng;
    let mut counts = [0usize; DECK_SIZE];
    let samples = 5200;
    for _ in 0..samples {
        let perm = Permutation::random_deck(&mut rng);
        counts[perm.get(1)] += 1;
    }
    assert_eq!(counts[0], 0, "base slot never maps into card slots");

    let expected = samples as f64 / 52.0;
    for (slot, &count) in counts.iter().enumerate().skip(1) {
        let deviation = (count as f64 - expected).abs() / expected;
        assert!(
            deviation < 0.5,
            "slot {slot} occurred {count} times, expected about {expected}"
        );
    }
}

#[test]
fn test_configurable_security_parameter() {
    let mut rng = OsRng;
    let config = ProtocolConfig { shuffle_rounds: 8 };
    let (committed, _) = commit_both(&mut rng);
    let (x, p, shuffled) = shuffle::shuffle_deck(&committed, &mut rng).unwrap();
    let proof = shuffle::prove_shuffle(&config, &committed, &shuffled, &x, &p, &mut rng).unwrap();
    assert_eq!(proof.rounds.len(), 8);
    assert!(shuffle::verify_shuffle(&config, &committed, &shuffled, &proof).unwrap());

    // a proof sized for another parameter is rejected outright
    let short = ProtocolConfig { shuffle_rounds: 5 };
    assert!(!shuffle::verify_shuffle(&short, &committed, &shuffled, &proof).unwrap());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn prop_dleq_completeness(alpha in 1u64..u64::MAX, beta in 1u64..u64::MAX, x in 1u64..u64::MAX) {
        let mut rng = OsRng;
        let g = Point::generator().mul(&BigUint::from(alpha));
        let h = Point::generator().mul(&BigUint::from(beta));
        let x = BigUint::from(x);
        let gx = g.mul(&x);
        let hx = h.mul(&x);
        let proof = dleq::prove(&g, &gx, &h, &hx, &x, &mut rng).unwrap();
        prop_assert!(dleq::verify(&g, &gx, &h, &hx, &proof));
    }

    #[test]
    fn prop_dleq_bit_tamper_fails(bit in 0u64..256) {
        let mut rng = OsRng;
        let g = Point::generator().mul(&curve::rand_scalar(&mut rng));
        let h = Point::generator().mul(&curve::rand_scalar(&mut rng));
        let x = curve::rand_scalar(&mut rng);
        let gx = g.mul(&x);
        let hx = h.mul(&x);
        let proof = dleq::prove(&g, &gx, &h, &hx, &x, &mut rng).unwrap();

        let mut flipped_t = proof.clone();
        flipped_t.t.set_bit(bit, !flipped_t.t.bit(bit));
        prop_assert!(!dleq::verify(&g, &gx, &h, &hx, &flipped_t));

        let mut flipped_r = proof.clone();
        flipped_r.r.set_bit(bit, !flipped_r.r.bit(bit));
        prop_assert!(!dleq::verify(&g, &gx, &h, &hx, &flipped_r));
    }

    #[test]
    fn prop_compose_is_associative(seed in any::<u64>()) {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let a = Permutation::random_deck(&mut rng);
        let b = Permutation::random_deck(&mut rng);
        let c = Permutation::random_deck(&mut rng);
        prop_assert_eq!(a.compose(&b).compose(&c), a.compose(&b.compose(&c)));
    }

    #[test]
    fn prop_permutation_apply_matches_compose(seed in any::<u64>()) {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let a = Permutation::random_deck(&mut rng);
        let b = Permutation::random_deck(&mut rng);
        let items: Vec<usize> = (0..DECK_SIZE).collect();
        prop_assert_eq!(b.apply(&a.apply(&items)), a.compose(&b).apply(&items));
    }
}

#[test]
fn test_absorb_rejects_wrong_generator_witness() {
    // a contribution whose gx was swapped after proving must fail the
    // retained-tuple re-check
    let mut rng = OsRng;
    let mut deck = Deck::new();
    let mut contributions = commit::prepare_deck(&mut deck, &mut rng).unwrap();
    contributions[0].gx = Point::generator().mul(&curve::rand_scalar(&mut rng));

    let mut receiver = Deck::new();
    let err = commit::absorb_contributions(&mut receiver, &contributions).unwrap_err();
    assert!(matches!(err, DeckError::ProofInvalid(_)));
}
