use std::marker::PhantomData;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite};
use tracing::{debug, info};

use crate::command::{Command, Flow, SIGIL};
use crate::error::ChatError;
use crate::nickname::Nickname;
use crate::server::Server;
use crate::session::{Session, spawn_writer};

/// Typestate: a connection is either still picking a nickname or admitted.
///
/// Connection<AwaitingNick> → Connection<Admitted>
///
/// Only an admitted connection can run the chat loop, so nothing reaches
/// the roster or the command interpreter without a valid nickname.
pub struct AwaitingNick;

/// Marker type: nickname accepted, session is in the roster.
pub struct Admitted;

pub struct Connection<R, S> {
    reader: R,
    session: Session,
    _state: PhantomData<S>,
}

impl<R: AsyncBufRead + Unpin, S> Connection<R, S> {
    /// Read the next line with its terminator stripped. Bytes that are not
    /// valid UTF-8 come through as U+FFFD.
    ///
    /// `None` means the client is gone: end of stream, or our side closed
    /// the connection (kick, shutdown, failed write). A closed connection
    /// wins over input still sitting in the buffer.
    pub async fn read_line(&mut self) -> Result<Option<String>, ChatError> {
        let mut buf = Vec::new();

        tokio::select! {
            biased;
            () = self.session.wait_closed() => return Ok(None),
            read = self.reader.read_until(b'\n', &mut buf) => {
                if read? == 0 {
                    return Ok(None);
                }
            }
        }

        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }
}

impl<R: AsyncBufRead + Unpin> Connection<R, AwaitingNick> {
    pub fn new(reader: R, session: Session) -> Self {
        Self {
            reader,
            session,
            _state: PhantomData,
        }
    }

    /// Greet the client and ask for a nickname until a valid one arrives.
    ///
    /// Consumes the unadmitted connection. Returns `None` if the client
    /// leaves first; such a session never touches the roster.
    pub async fn negotiate(
        mut self,
        server: &Server,
    ) -> Result<Option<Connection<R, Admitted>>, ChatError> {
        let server_name = server.server_name().await;
        self.session.notify(format!("Welcome to {server_name}"))?;

        let nickname = loop {
            self.session.notify("Please enter a nickname")?;

            let Some(candidate) = self.read_line().await? else {
                return Ok(None);
            };

            match candidate.parse::<Nickname>() {
                Ok(nickname) => break nickname,
                Err(e) => self.session.notify(format!("Invalid nickname: {e}"))?,
            }
        };

        self.session.notify(format!("Welcome {nickname}"))?;
        self.session.nickname = nickname;
        server.admit(self.session.member()).await;

        info!(id = %self.session.id, nick = %self.session.nickname, "admitted");
        Ok(Some(Connection {
            reader: self.reader,
            session: self.session,
            _state: PhantomData,
        }))
    }
}

impl<R: AsyncBufRead + Unpin> Connection<R, Admitted> {
    /// Chat until the client leaves, then take it off the roster.
    pub async fn run(mut self, server: &Server) -> Result<(), ChatError> {
        let result = self.read_loop(server).await;

        if server.depart(self.session.id).await {
            info!(id = %self.session.id, nick = %self.session.nickname, "left");
        }
        result
    }

    async fn read_loop(&mut self, server: &Server) -> Result<(), ChatError> {
        while let Some(line) = self.read_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            debug!(connection = %self.session.peer, %line, "received");

            if line.starts_with(SIGIL) {
                let command = Command::parse(&line);
                if command.execute(&mut self.session, server).await? == Flow::Disconnect {
                    break;
                }
            } else if server
                .chat(self.session.id, &self.session.nickname, line)
                .await
                .is_err()
            {
                break;
            }
        }
        Ok(())
    }
}

/// Drive one client from greeting to goodbye.
///
/// Generic over the transport halves so tests can use in-memory pipes.
pub async fn serve<R, W>(
    server: Arc<Server>,
    peer: String,
    reader: R,
    writer: W,
) -> Result<(), ChatError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let id = server.next_session_id();
    let session = Session::new(id, peer, spawn_writer(id, writer));
    info!(%id, peer = %session.peer, "connected");

    let Some(connection) = Connection::new(reader, session).negotiate(&server).await? else {
        info!(%id, "disconnected before choosing a nickname");
        return Ok(());
    };

    connection.run(&server).await
}
