use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Notify, mpsc, watch};
use tracing::{debug, warn};

use crate::error::TransportError;
use crate::message::Notice;
use crate::nickname::Nickname;
use crate::roster::Member;
use crate::types::SessionId;

/// Lines a session may have queued but not yet written. A client that
/// falls this far behind is dropped.
pub const OUTBOX_CAPACITY: usize = 64;

#[derive(Debug)]
enum Outbound {
    Line(String),
    Close,
}

/// Sending half of a connection.
///
/// Lines are queued and written by a dedicated writer task, so queuing never
/// waits on the network. Cloned freely: the roster keeps one, the owning
/// session keeps another.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::Sender<Outbound>,
    abort: Arc<Notify>,
    closed: watch::Receiver<bool>,
}

impl Outbox {
    /// Queue a line. Fails once the writer task has stopped, or when the
    /// queue is full; a full queue also tears the connection down.
    pub fn send(&self, line: impl Into<String>) -> Result<(), TransportError> {
        match self.tx.try_send(Outbound::Line(line.into())) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                debug!("outbox full, aborting writer");
                self.abort.notify_one();
                Err(TransportError)
            }
            Err(TrySendError::Closed(_)) => Err(TransportError),
        }
    }

    /// Flush everything queued so far, then shut the connection. If the
    /// queue is already full the backlog is dropped instead.
    pub fn close(&self) {
        if let Err(TrySendError::Full(_)) = self.tx.try_send(Outbound::Close) {
            self.abort.notify_one();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Resolves once the writer has flushed and shut the connection down.
    pub async fn wait_closed(&self) {
        let mut closed = self.closed.clone();
        // An error means the writer is gone, which is just as closed.
        let _ = closed.wait_for(|c| *c).await;
    }
}

/// Start the writer task for one connection.
///
/// The writer stops on `Outbox::close`, on a write failure, on overflow, or
/// once every `Outbox` clone is dropped.
pub fn spawn_writer<W>(id: SessionId, writer: W) -> Outbox
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<Outbound>(OUTBOX_CAPACITY);
    let (closed_tx, closed_rx) = watch::channel(false);
    let abort = Arc::new(Notify::new());

    let aborted = abort.clone();
    tokio::spawn(async move {
        let mut writer = writer;
        loop {
            let outbound = tokio::select! {
                outbound = rx.recv() => outbound,
                () = aborted.notified() => break,
            };

            let mut line = match outbound {
                Some(Outbound::Line(line)) => line,
                Some(Outbound::Close) | None => break,
            };
            line.push('\n');

            // A peer that stopped reading can park this write forever.
            let written = tokio::select! {
                written = writer.write_all(line.as_bytes()) => written,
                () = aborted.notified() => {
                    warn!(%id, "client fell behind, dropping connection");
                    break;
                }
            };
            if let Err(e) = written {
                warn!(%id, error = %e, "write failed, dropping connection");
                break;
            }
        }

        // Anything still queued is discarded; later sends fail fast.
        rx.close();
        let _ = writer.shutdown().await;
        debug!(%id, "writer stopped");
        closed_tx.send_replace(true);
    });

    Outbox {
        tx,
        abort,
        closed: closed_rx,
    }
}

/// One client's identity and transport state.
///
/// Owned by the connection's worker task; nothing else writes `nickname` or
/// `is_admin`.
pub struct Session {
    pub id: SessionId,
    pub peer: String,
    pub nickname: Nickname,
    pub is_admin: bool,
    outbox: Outbox,
}

impl Session {
    pub fn new(id: SessionId, peer: String, outbox: Outbox) -> Self {
        Self {
            id,
            peer,
            nickname: Nickname::anonymous(),
            is_admin: false,
            outbox,
        }
    }

    /// Send a system notice to this client only.
    pub fn notify(&self, text: impl Into<String>) -> Result<(), TransportError> {
        self.outbox.send(Notice::system(text))
    }

    pub async fn wait_closed(&self) {
        self.outbox.wait_closed().await;
    }

    /// The roster entry for this session.
    pub fn member(&self) -> Member {
        Member {
            id: self.id,
            nickname: self.nickname.clone(),
            outbox: self.outbox.clone(),
        }
    }
}

/// RAII: once the worker lets go of its session the writer is told to
/// flush and close, however the worker exited.
impl Drop for Session {
    fn drop(&mut self) {
        debug!(id = %self.id, peer = %self.peer, nick = %self.nickname, "session dropped");
        self.outbox.close();
    }
}
