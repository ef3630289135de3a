//! tcp transport
//!
//! one json message per newline-delimited frame. the read deadline is the
//! protocol's only timer: an awaited message that never arrives surfaces as
//! a Timeout and aborts the session, the state machine itself stays free of
//! clocks.

use std::time::Duration;

use rand::rngs::OsRng;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::time::timeout;

use crate::messages::WireMessage;
use crate::session::Session;
use crate::{ProtocolError, Result};

/// default patience for an awaited message
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// a framed connection to the other peer
pub struct PeerConnection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    read_timeout: Duration,
}

impl PeerConnection {
    pub fn new(stream: TcpStream, read_timeout: Duration) -> Self {
        let (read_half, write_half) = stream.into_split();
        Self {
            reader: BufReader::new(read_half),
            writer: write_half,
            read_timeout,
        }
    }

    /// dial the peer
    pub async fn connect(addr: impl ToSocketAddrs, read_timeout: Duration) -> Result<Self> {
        let stream = TcpStream::connect(addr).await.map_err(transport)?;
        Ok(Self::new(stream, read_timeout))
    }

    /// accept the peer on a listening socket
    pub async fn accept(listener: &TcpListener, read_timeout: Duration) -> Result<Self> {
        let (stream, remote) = listener.accept().await.map_err(transport)?;
        tracing::info!(%remote, "peer connected");
        Ok(Self::new(stream, read_timeout))
    }

    /// write one message as a single frame
    pub async fn send(&mut self, msg: &WireMessage) -> Result<()> {
        let mut line = serde_json::to_string(msg)
            .map_err(|e| ProtocolError::Transport(format!("encode: {e}")))?;
        line.push('\n');
        self.writer
            .write_all(line.as_bytes())
            .await
            .map_err(transport)?;
        tracing::debug!(kind = msg.kind(), bytes = line.len(), "frame sent");
        Ok(())
    }

    /// read the next frame, honoring the read deadline
    pub async fn recv(&mut self) -> Result<WireMessage> {
        let mut line = String::new();
        let read = timeout(self.read_timeout, self.reader.read_line(&mut line))
            .await
            .map_err(|_| ProtocolError::Timeout("peer message".into()))?
            .map_err(transport)?;
        if read == 0 {
            return Err(ProtocolError::Transport("connection closed".into()));
        }
        let msg: WireMessage = serde_json::from_str(line.trim_end())
            .map_err(|e| ProtocolError::ProtocolViolation(format!("malformed frame: {e}")))?;
        tracing::debug!(kind = msg.kind(), "frame received");
        Ok(msg)
    }
}

fn transport(err: std::io::Error) -> ProtocolError {
    ProtocolError::Transport(err.to_string())
}

/// run a session over a connection until it finishes or aborts
///
/// any failure, cryptographic, protocol or transport, is recorded on the
/// session and returned; nothing is retried
pub async fn drive(mut session: Session, mut conn: PeerConnection) -> Result<Session> {
    let mut rng = OsRng;

    let outbound = session.start(&mut rng)?;
    for msg in &outbound {
        conn.send(msg).await?;
    }

    while !session.is_done() {
        let msg = match conn.recv().await {
            Ok(msg) => msg,
            Err(err) => {
                session.fail(err.clone());
                return Err(err);
            }
        };
        let outbound = session.handle(msg, &mut rng)?;
        for msg in &outbound {
            conn.send(msg).await?;
        }
    }
    Ok(session)
}
