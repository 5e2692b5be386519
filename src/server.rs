use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::broadcast::fan_out;
use crate::config::ServerConfig;
use crate::connection;
use crate::error::NotMember;
use crate::message::Notice;
use crate::nickname::Nickname;
use crate::roster::{Member, Roster};
use crate::types::SessionId;

/// How long shutdown waits for clients to drain before giving up on them.
const SHUTDOWN_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of an `!adminLogin` attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminLogin {
    /// No admin password is configured; nobody can log in.
    Disabled,
    Accepted,
    Rejected,
}

/// Everything workers share. Membership and configuration sit behind one
/// lock so a broadcast always sees both in a consistent state.
struct SharedState {
    roster: Roster,
    config: ServerConfig,
}

pub struct Server {
    state: Mutex<SharedState>,
    next_session_id: AtomicU64,
    shutdown: watch::Sender<bool>,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            state: Mutex::new(SharedState {
                roster: Roster::new(),
                config,
            }),
            next_session_id: AtomicU64::new(1),
            shutdown,
        }
    }

    pub fn next_session_id(&self) -> SessionId {
        SessionId::new(self.next_session_id.fetch_add(1, Ordering::Relaxed))
    }

    pub async fn server_name(&self) -> String {
        self.state.lock().await.config.name.clone()
    }

    pub async fn member_count(&self) -> usize {
        self.state.lock().await.roster.len()
    }

    pub async fn members(&self) -> Vec<Member> {
        self.state.lock().await.roster.snapshot()
    }

    /// Add a session to the roster and announce it.
    pub async fn admit(&self, member: Member) {
        let mut state = self.state.lock().await;
        let nickname = member.nickname.clone();
        if state.roster.add(member) {
            fan_out(&mut state.roster, Notice::joined(&nickname));
        }
    }

    /// Remove a session and announce the departure. Returns false if the
    /// session was already gone (kicked, dropped by a failed delivery, or
    /// cleared by shutdown), in which case nothing is announced.
    pub async fn depart(&self, id: SessionId) -> bool {
        let mut state = self.state.lock().await;
        match state.roster.remove(id) {
            Some(member) => {
                fan_out(&mut state.roster, Notice::left(&member.nickname));
                true
            }
            None => false,
        }
    }

    pub async fn broadcast(&self, notice: Notice) -> usize {
        let mut state = self.state.lock().await;
        fan_out(&mut state.roster, notice)
    }

    /// Broadcast a chat line from `id`. A sender that has already left the
    /// roster is refused, so nothing it says lands after its departure.
    pub async fn chat(
        &self,
        id: SessionId,
        from: &Nickname,
        body: impl Into<String>,
    ) -> Result<usize, NotMember> {
        let mut state = self.state.lock().await;
        if !state.roster.contains(id) {
            debug!(%id, "dropping chat from a session no longer in the roster");
            return Err(NotMember);
        }
        Ok(fan_out(&mut state.roster, Notice::chat(from, body)))
    }

    /// Change a member's nickname and announce it, returning the old name.
    /// `None` if `id` is not in the roster.
    pub async fn rename(&self, id: SessionId, nickname: Nickname) -> Option<Nickname> {
        let mut state = self.state.lock().await;
        let old = state.roster.rename(id, nickname.clone())?;
        fan_out(&mut state.roster, Notice::renamed(&old, &nickname));
        Some(old)
    }

    pub async fn admin_login(&self, password: &str) -> AdminLogin {
        let state = self.state.lock().await;
        if !state.config.admin_enabled() {
            AdminLogin::Disabled
        } else if state.config.admin_password == password {
            AdminLogin::Accepted
        } else {
            AdminLogin::Rejected
        }
    }

    /// Rename the server on behalf of member `by`.
    pub async fn set_server_name(&self, by: SessionId, name: &str) -> Result<(), NotMember> {
        let mut state = self.state.lock().await;
        if !state.roster.contains(by) {
            return Err(NotMember);
        }
        state.config.name = name.to_string();
        fan_out(&mut state.roster, Notice::server_renamed(name));
        Ok(())
    }

    /// Kick the first member named `name` on behalf of member `by`.
    ///
    /// Everyone, the target included, sees the kick notice; the target also
    /// gets a private notice before its connection is closed. Returns the
    /// kicked nickname, or `None` if nobody by that name is present.
    pub async fn kick(&self, by: SessionId, name: &str) -> Result<Option<Nickname>, NotMember> {
        let mut state = self.state.lock().await;
        if !state.roster.contains(by) {
            return Err(NotMember);
        }
        let Some(target) = state.roster.find_by_nickname(name).cloned() else {
            return Ok(None);
        };

        fan_out(&mut state.roster, Notice::kicked(&target.nickname));
        let _ = target.outbox.send(Notice::system("You have been kicked"));
        state.roster.remove(target.id);
        target.outbox.close();

        info!(id = %target.id, nick = %target.nickname, %by, "kicked");
        Ok(Some(target.nickname))
    }

    /// Announce shutdown on behalf of member `by`, close every session and
    /// wait for their writers to flush, then release the accept loop.
    pub async fn shutdown(&self, by: SessionId) -> Result<(), NotMember> {
        let members = {
            let mut state = self.state.lock().await;
            if !state.roster.contains(by) {
                return Err(NotMember);
            }
            fan_out(&mut state.roster, Notice::shutting_down());
            let roster = std::mem::take(&mut state.roster);
            for member in roster.iter() {
                member.outbox.close();
            }
            roster.snapshot()
        };

        let flush = async {
            for member in &members {
                member.outbox.wait_closed().await;
            }
        };
        if tokio::time::timeout(SHUTDOWN_FLUSH_TIMEOUT, flush).await.is_err() {
            warn!("gave up waiting for slow clients to flush");
        }

        info!(sessions = members.len(), "shutdown flushed");
        self.shutdown.send_replace(true);
        Ok(())
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }
}

/// Accept connections until shutdown, one task per client.
///
/// Accept failures are logged and skipped; only shutdown ends the loop.
pub async fn run(server: Arc<Server>, listener: TcpListener) {
    let mut shutdown = server.subscribe_shutdown();

    loop {
        tokio::select! {
            _ = shutdown.wait_for(|stopping| *stopping) => {
                info!("shutdown requested, no longer accepting");
                return;
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        info!(%peer, "connection accepted");
                        tokio::spawn(handle_client(server.clone(), stream, peer));
                    }
                    Err(e) => warn!(error = %e, "accept failed"),
                }
            }
        }
    }
}

/// Handle a single TCP client as a tokio task.
async fn handle_client(server: Arc<Server>, stream: TcpStream, peer: SocketAddr) {
    let (reader, writer) = stream.into_split();
    let reader = BufReader::new(reader);

    if let Err(e) = connection::serve(server, peer.to_string(), reader, writer).await {
        warn!(%peer, error = %e, "client error");
    }
}
