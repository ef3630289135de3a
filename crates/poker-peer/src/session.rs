//! per-peer protocol state machine
//!
//! sans-io: the session consumes decoded messages and returns the frames to
//! send, so the same machine runs under the tcp transport, the in-memory
//! test pump, and the demo. each state awaits exactly one message class;
//! anything else is rejected as a protocol violation. every failure is
//! fatal and parks the session in Abort without rollback.
//!
//! phase sequencing replaces the fixed sleeps of early mental poker
//! implementations with explicit acknowledgements: DECK_CHECK closes the
//! commitment phase and START_SHUFFLE grants the first shuffle turn.

use std::collections::BTreeMap;

use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};

use zk_deck::cards::Card;
use zk_deck::deck::CardMapping;
use zk_deck::reveal::{self, HAND_SIZE};
use zk_deck::shuffle;
use zk_deck::{commit, Deck, ProtocolConfig};

use crate::messages::{
    self, CardPrepEntry, RevealEntry, WireMessage, WirePoint,
};
use crate::{ProtocolError, Result};

/// which peer this session is
///
/// the initiator opens the connection, shuffles first, and draws the low
/// hand slots; the responder draws the next block
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Responder,
}

/// protocol states; Done and Abort are terminal
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Idle,
    Greeting,
    Preparing,
    AwaitPeerPrep,
    Verifying,
    ShuffleMine,
    AwaitPeerShuffle,
    Dealing,
    Revealing,
    Done,
    Abort,
}

/// one peer's protocol session
#[derive(Debug)]
pub struct Session {
    role: Role,
    name: String,
    peer_name: Option<String>,
    config: ProtocolConfig,
    state: State,
    /// the deck as it moves through commit and both shuffles
    deck: Deck,
    /// frozen committed deck, the source of the card mapping
    committed: Option<Deck>,
    mapping: Option<CardMapping>,
    /// peer's shuffle input and output, kept for the showdown audit
    peer_shuffle_in: Option<Deck>,
    peer_shuffle_out: Option<Deck>,
    shuffled_mine: bool,
    my_scalar: Option<BigUint>,
    peer_scalar: Option<BigUint>,
    my_idxs: Vec<usize>,
    peer_idxs: Option<Vec<usize>>,
    my_cards: BTreeMap<usize, Card>,
    peer_cards: Option<Vec<Card>>,
    sent_showdown: bool,
    abort: Option<ProtocolError>,
}

impl Session {
    pub fn new(role: Role, name: impl Into<String>, config: ProtocolConfig) -> Self {
        let my_idxs: Vec<usize> = match role {
            Role::Initiator => (1..=HAND_SIZE).collect(),
            Role::Responder => (HAND_SIZE + 1..=2 * HAND_SIZE).collect(),
        };
        Self {
            role,
            name: name.into(),
            peer_name: None,
            config,
            state: State::Idle,
            deck: Deck::new(),
            committed: None,
            mapping: None,
            peer_shuffle_in: None,
            peer_shuffle_out: None,
            shuffled_mine: false,
            my_scalar: None,
            peer_scalar: None,
            my_idxs,
            peer_idxs: None,
            my_cards: BTreeMap::new(),
            peer_cards: None,
            sent_showdown: false,
            abort: None,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn peer_name(&self) -> Option<&str> {
        self.peer_name.as_deref()
    }

    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    /// this peer's revealed hand in slot order, once complete
    pub fn hand(&self) -> Option<Vec<Card>> {
        if self.my_cards.len() == HAND_SIZE {
            Some(self.my_cards.values().copied().collect())
        } else {
            None
        }
    }

    /// the peer's audited hand, available after its showdown
    pub fn peer_hand(&self) -> Option<&[Card]> {
        self.peer_cards.as_deref()
    }

    pub fn abort_reason(&self) -> Option<&ProtocolError> {
        self.abort.as_ref()
    }

    /// mark the session failed from outside, e.g. on a transport timeout
    pub fn fail(&mut self, err: ProtocolError) {
        tracing::warn!(name = %self.name, %err, "session aborted");
        self.state = State::Abort;
        self.abort = Some(err);
    }

    /// begin the protocol: emits HELLO and starts awaiting the peer's
    pub fn start<R: RngCore + CryptoRng>(&mut self, _rng: &mut R) -> Result<Vec<WireMessage>> {
        if self.state != State::Idle {
            return Err(self.violation("session already started"));
        }
        self.state = State::Greeting;
        Ok(vec![WireMessage::Hello {
            name: self.name.clone(),
        }])
    }

    /// feed one inbound message, returning the frames to send back
    pub fn handle<R: RngCore + CryptoRng>(
        &mut self,
        msg: WireMessage,
        rng: &mut R,
    ) -> Result<Vec<WireMessage>> {
        let kind = msg.kind();
        match self.dispatch(msg, rng) {
            Ok(out) => Ok(out),
            Err(err) => {
                tracing::warn!(name = %self.name, kind, %err, "fatal protocol error");
                self.state = State::Abort;
                self.abort = Some(err.clone());
                Err(err)
            }
        }
    }

    fn dispatch<R: RngCore + CryptoRng>(
        &mut self,
        msg: WireMessage,
        rng: &mut R,
    ) -> Result<Vec<WireMessage>> {
        match msg {
            WireMessage::Hello { name } => self.on_hello(name, rng),
            WireMessage::CardPrep { cards } => self.on_card_prep(&cards),
            WireMessage::DeckCheck { deck } => self.on_deck_check(&deck),
            WireMessage::StartShuffle => self.on_start_shuffle(rng),
            WireMessage::ShuffleResult { deck, proof } => {
                self.on_shuffle_result(&deck, &proof, rng)
            }
            WireMessage::DrawCards { idxs } => self.on_draw_cards(idxs),
            WireMessage::RequestReveal { idxs } => self.on_request_reveal(&idxs),
            WireMessage::Reveal { cards } => self.on_reveal(&cards),
            WireMessage::Showdown { scalar } => self.on_showdown(&scalar),
        }
    }

    fn on_hello<R: RngCore + CryptoRng>(
        &mut self,
        name: String,
        rng: &mut R,
    ) -> Result<Vec<WireMessage>> {
        self.expect(State::Greeting, "HELLO")?;
        tracing::info!(name = %self.name, peer = %name, "greeting exchanged");
        self.peer_name = Some(name);

        // contribute to every slot, summing our own hx in before broadcast
        self.state = State::Preparing;
        let contributions = commit::prepare_deck(&mut self.deck, rng)?;
        let cards = contributions
            .iter()
            .map(CardPrepEntry::from_contribution)
            .collect::<Result<Vec<_>>>()?;
        self.state = State::AwaitPeerPrep;
        Ok(vec![WireMessage::CardPrep { cards }])
    }

    fn on_card_prep(&mut self, cards: &[CardPrepEntry]) -> Result<Vec<WireMessage>> {
        self.expect(State::AwaitPeerPrep, "CARD_PREP")?;
        let contributions = cards
            .iter()
            .map(CardPrepEntry::to_contribution)
            .collect::<Result<Vec<_>>>()?;
        commit::absorb_contributions(&mut self.deck, &contributions)?;

        // commitment complete: freeze the deck and derive the card mapping
        let committed = self.deck.clone();
        self.mapping = Some(CardMapping::derive(&committed)?);
        self.committed = Some(committed);
        tracing::info!(name = %self.name, "deck committed, 53 slots");

        self.state = State::Verifying;
        Ok(vec![WireMessage::DeckCheck {
            deck: messages::deck_to_wire(&self.deck)?,
        }])
    }

    fn on_deck_check(&mut self, deck: &[WirePoint]) -> Result<Vec<WireMessage>> {
        self.expect(State::Verifying, "DECK_CHECK")?;
        let coords = deck
            .iter()
            .map(WirePoint::to_coords)
            .collect::<Result<Vec<_>>>()?;
        commit::cross_check(&self.deck, &coords)?;
        tracing::info!(name = %self.name, "deck cross-check passed");

        match self.role {
            // the responder grants the initiator the first shuffle turn
            Role::Responder => {
                self.state = State::AwaitPeerShuffle;
                Ok(vec![WireMessage::StartShuffle])
            }
            Role::Initiator => {
                self.state = State::ShuffleMine;
                Ok(vec![])
            }
        }
    }

    fn on_start_shuffle<R: RngCore + CryptoRng>(&mut self, rng: &mut R) -> Result<Vec<WireMessage>> {
        self.expect(State::ShuffleMine, "START_SHUFFLE")?;
        let result = self.shuffle_own(rng)?;
        self.state = State::AwaitPeerShuffle;
        Ok(vec![result])
    }

    fn on_shuffle_result<R: RngCore + CryptoRng>(
        &mut self,
        deck: &[WirePoint],
        proof: &[messages::ShuffleRoundEntry],
        rng: &mut R,
    ) -> Result<Vec<WireMessage>> {
        self.expect(State::AwaitPeerShuffle, "SHUFFLE_RESULT")?;
        let shuffled = messages::deck_from_wire(deck)?;
        let proof = messages::proof_from_wire(proof)?;
        if !shuffle::verify_shuffle(&self.config, &self.deck, &shuffled, &proof)? {
            return Err(ProtocolError::ProofInvalid(
                "shuffle transcript rejected".into(),
            ));
        }
        tracing::info!(name = %self.name, "peer shuffle verified");

        self.peer_shuffle_in = Some(self.deck.clone());
        self.peer_shuffle_out = Some(shuffled.clone());
        self.deck = shuffled;

        if !self.shuffled_mine {
            // responder: our turn now that the peer's shuffle checks out
            let result = self.shuffle_own(rng)?;
            self.state = State::Dealing;
            Ok(vec![result])
        } else {
            // initiator: both shuffles done, this is the dealing deck
            self.state = State::Dealing;
            Ok(vec![WireMessage::DrawCards {
                idxs: self.my_idxs.clone(),
            }])
        }
    }

    fn on_draw_cards(&mut self, idxs: Vec<usize>) -> Result<Vec<WireMessage>> {
        self.expect(State::Dealing, "DRAW_CARDS")?;
        if idxs.len() != HAND_SIZE {
            return Err(self.violation("draw must name exactly one hand of slots"));
        }
        let mut seen = std::collections::HashSet::new();
        for &idx in &idxs {
            if idx == 0 || idx > 52 {
                return Err(self.violation("draw names a slot outside 1..=52"));
            }
            if !seen.insert(idx) {
                return Err(self.violation("draw repeats a slot"));
            }
            if self.my_idxs.contains(&idx) {
                return Err(self.violation("draw collides with our hand"));
            }
        }
        tracing::info!(name = %self.name, ?idxs, "peer drew");
        self.peer_idxs = Some(idxs);

        let mut out = Vec::new();
        if self.role == Role::Responder {
            // answer the initiator's draw with our own
            out.push(WireMessage::DrawCards {
                idxs: self.my_idxs.clone(),
            });
        }
        out.push(WireMessage::RequestReveal {
            idxs: self.my_idxs.clone(),
        });
        self.state = State::Revealing;
        Ok(out)
    }

    fn on_request_reveal(&mut self, idxs: &[usize]) -> Result<Vec<WireMessage>> {
        self.expect(State::Revealing, "REQUEST_REVEAL")?;
        let peer_idxs = self
            .peer_idxs
            .as_ref()
            .ok_or_else(|| ProtocolError::ProtocolViolation("reveal before draw".into()))?;
        // a peer may only ask us to unmask cards it owns
        for idx in idxs {
            if !peer_idxs.contains(idx) {
                return Err(self.violation("reveal requested for a slot the peer does not own"));
            }
        }
        let my_scalar = self.my_scalar()?;
        let partials = reveal::unmask_for_peer(&self.deck, idxs, my_scalar)?;
        let cards = partials
            .iter()
            .map(|(idx, point)| Ok(RevealEntry(*idx, WirePoint::from_point(point)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(vec![WireMessage::Reveal { cards }])
    }

    fn on_reveal(&mut self, cards: &[RevealEntry]) -> Result<Vec<WireMessage>> {
        self.expect(State::Revealing, "REVEAL")?;
        let mapping = self
            .mapping
            .as_ref()
            .ok_or_else(|| ProtocolError::ProtocolViolation("reveal before commitment".into()))?;
        let my_scalar = self
            .my_scalar
            .as_ref()
            .ok_or_else(|| ProtocolError::ProtocolViolation("reveal before shuffle".into()))?;

        let mut revealed = Vec::with_capacity(cards.len());
        for RevealEntry(idx, point) in cards {
            // unmasking a slot we do not own would leak the peer's cards
            if !self.my_idxs.contains(idx) {
                return Err(ProtocolError::ProtocolViolation(
                    "reveal unmasks a slot we do not own".into(),
                ));
            }
            let partial = point.to_point()?;
            let card = reveal::finish_reveal(&partial, my_scalar, mapping)?;
            revealed.push((*idx, card));
        }
        for (idx, card) in revealed {
            self.my_cards.insert(idx, card);
        }

        let mut out = Vec::new();
        if self.my_cards.len() == HAND_SIZE && !self.sent_showdown {
            tracing::info!(name = %self.name, "hand complete, releasing shuffle scalar");
            out.push(WireMessage::Showdown {
                scalar: messages::scalar_string(self.my_scalar()?),
            });
            self.sent_showdown = true;
        }
        self.maybe_finish();
        Ok(out)
    }

    fn on_showdown(&mut self, scalar: &str) -> Result<Vec<WireMessage>> {
        self.expect(State::Revealing, "SHOWDOWN")?;
        let peer_scalar = messages::parse_scalar(scalar)?;

        // the released scalar must reproduce the peer's shuffle; the base
        // slot is pinned by the permutation, so one multiplication checks it
        let (shuffle_in, shuffle_out) = match (&self.peer_shuffle_in, &self.peer_shuffle_out) {
            (Some(i), Some(o)) => (i, o),
            _ => return Err(self.violation("showdown before the peer shuffled")),
        };
        let base_in = shuffle_in
            .slot(0)
            .ok_or_else(|| ProtocolError::ProtocolViolation("missing base slot".into()))?;
        let base_out = shuffle_out
            .slot(0)
            .ok_or_else(|| ProtocolError::ProtocolViolation("missing base slot".into()))?;
        if &base_in.mul(&peer_scalar) != base_out {
            return Err(ProtocolError::ProofInvalid(
                "released scalar does not match the shuffle".into(),
            ));
        }

        let mapping = self
            .mapping
            .as_ref()
            .ok_or_else(|| ProtocolError::ProtocolViolation("showdown before commitment".into()))?;
        let peer_idxs = self
            .peer_idxs
            .clone()
            .ok_or_else(|| ProtocolError::ProtocolViolation("showdown before draw".into()))?;
        let my_scalar = self.my_scalar()?;
        let peer_cards =
            reveal::audit_hand(&self.deck, &peer_idxs, &peer_scalar, my_scalar, mapping)?;
        tracing::info!(name = %self.name, "peer hand audited");
        self.peer_cards = Some(peer_cards);
        self.peer_scalar = Some(peer_scalar);
        self.maybe_finish();
        Ok(vec![])
    }

    /// shuffle the current deck under a fresh secret scalar and permutation
    fn shuffle_own<R: RngCore + CryptoRng>(&mut self, rng: &mut R) -> Result<WireMessage> {
        let (x, perm, shuffled) = shuffle::shuffle_deck(&self.deck, rng)?;
        let proof = shuffle::prove_shuffle(&self.config, &self.deck, &shuffled, &x, &perm, rng)?;
        tracing::info!(name = %self.name, "shuffled and proved");

        let msg = WireMessage::ShuffleResult {
            deck: messages::deck_to_wire(&shuffled)?,
            proof: messages::proof_to_wire(&proof)?,
        };
        self.my_scalar = Some(x);
        self.shuffled_mine = true;
        self.deck = shuffled;
        Ok(msg)
    }

    fn maybe_finish(&mut self) {
        if self.sent_showdown
            && self.peer_scalar.is_some()
            && self.my_cards.len() == HAND_SIZE
        {
            tracing::info!(name = %self.name, "session complete");
            self.state = State::Done;
        }
    }

    fn my_scalar(&self) -> Result<&BigUint> {
        self.my_scalar
            .as_ref()
            .ok_or_else(|| ProtocolError::ProtocolViolation("shuffle scalar not set".into()))
    }

    fn expect(&self, state: State, kind: &str) -> Result<()> {
        if self.state == state {
            Ok(())
        } else {
            Err(ProtocolError::ProtocolViolation(format!(
                "{kind} not expected in state {:?}",
                self.state
            )))
        }
    }

    fn violation(&self, reason: &str) -> ProtocolError {
        ProtocolError::ProtocolViolation(reason.into())
    }
}
