//! heads-up mental poker demo
//!
//! runs both peers in one process over localhost tcp:
//! 1. greeting and joint deck commitment (53 slots, DLEQ per contribution)
//! 2. deck cross-check
//! 3. two sequential shuffles, each with a cut-and-choose proof
//! 4. draw, cooperative reveal, showdown audit
//! 5. hand comparison

use poker_peer::connection::{drive, PeerConnection, DEFAULT_READ_TIMEOUT};
use poker_peer::session::{Role, Session};
use tokio::net::TcpListener;
use zk_deck::hand::Hand;
use zk_deck::ProtocolConfig;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");

    let bob = tokio::spawn(async move {
        let conn = PeerConnection::accept(&listener, DEFAULT_READ_TIMEOUT)
            .await
            .expect("accept");
        let session = Session::new(Role::Responder, "bob", ProtocolConfig::standard());
        drive(session, conn).await
    });

    let conn = PeerConnection::connect(addr, DEFAULT_READ_TIMEOUT)
        .await
        .expect("connect");
    let session = Session::new(Role::Initiator, "alice", ProtocolConfig::standard());

    let alice = drive(session, conn).await.expect("alice failed");
    let bob = bob.await.expect("join").expect("bob failed");

    let alice_cards = alice.hand().expect("alice hand");
    let bob_cards = bob.hand().expect("bob hand");

    println!("\nAlice's hand:");
    for card in &alice_cards {
        println!("  {card}");
    }
    println!("\nBob's hand:");
    for card in &bob_cards {
        println!("  {card}");
    }

    let alice_hand = Hand::evaluate(&alice_cards);
    let bob_hand = Hand::evaluate(&bob_cards);

    println!();
    match alice_hand.cmp(&bob_hand) {
        std::cmp::Ordering::Greater => println!(
            "Alice beats Bob with {} over {}.",
            alice_hand.description, bob_hand.description
        ),
        std::cmp::Ordering::Less => println!(
            "Bob beats Alice with {} over {}.",
            bob_hand.description, alice_hand.description
        ),
        std::cmp::Ordering::Equal => println!(
            "Alice and Bob split the pot, both with {}.",
            alice_hand.description
        ),
    }
}
