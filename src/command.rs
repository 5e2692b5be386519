use tracing::info;

use crate::error::{NotMember, TransportError};
use crate::nickname::Nickname;
use crate::server::{AdminLogin, Server};
use crate::session::Session;

/// Marks a line as a command rather than chat.
pub const SIGIL: char = '!';

const UNAUTHORIZED: &str = "You are not authorized to use this command";

const HELP: &[&str] = &[
    "Commands:",
    "    !help",
    "    !changeNick <nickname>",
    "    !adminLogin <password>",
    "    !quit",
];

const ADMIN_HELP: &[&str] = &[
    "Admin Commands:",
    "    !setServerName <name>",
    "    !kick <nickname>",
    "    !shutdown",
];

/// Commands are a closed set, dispatched with one exhaustive match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AdminLogin { password: String },
    ChangeNick { name: String },
    Help,
    Kick { target: String },
    SetServerName { name: String },
    Shutdown,
    Quit,
    Unknown,
}

/// What the read loop should do after a command ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Disconnect,
}

impl Command {
    /// Parse a `!`-prefixed line.
    ///
    /// The word after the sigil must be a command name exactly; whatever
    /// follows the first run of whitespace is the trimmed argument string.
    /// Anything else parses as `Unknown`, never an error.
    pub fn parse(line: &str) -> Self {
        let Some(input) = line.trim().strip_prefix(SIGIL) else {
            return Command::Unknown;
        };

        let (name, args) = input
            .split_once(char::is_whitespace)
            .map(|(c, a)| (c, a.trim()))
            .unwrap_or((input, ""));

        match name {
            "adminLogin" => Command::AdminLogin {
                password: args.to_string(),
            },
            "changeNick" => Command::ChangeNick {
                name: args.to_string(),
            },
            "help" => Command::Help,
            "kick" => Command::Kick {
                target: args.to_string(),
            },
            "setServerName" => Command::SetServerName {
                name: args.to_string(),
            },
            "shutdown" => Command::Shutdown,
            "quit" => Command::Quit,
            _ => Command::Unknown,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::AdminLogin { .. } => "adminLogin",
            Command::ChangeNick { .. } => "changeNick",
            Command::Help => "help",
            Command::Kick { .. } => "kick",
            Command::SetServerName { .. } => "setServerName",
            Command::Shutdown => "shutdown",
            Command::Quit => "quit",
            Command::Unknown => "unknown",
        }
    }

    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            Command::Kick { .. } | Command::SetServerName { .. } | Command::Shutdown
        )
    }

    /// Run the command on behalf of `session`.
    ///
    /// Replies meant only for the caller go through the session; anything
    /// everyone should see goes through the server. The only error is the
    /// caller's own connection being gone. A caller that has already been
    /// removed from the roster changes nothing and is told to disconnect.
    pub async fn execute(
        self,
        session: &mut Session,
        server: &Server,
    ) -> Result<Flow, TransportError> {
        let name = self.name();

        let result = if self.requires_admin() && !session.is_admin {
            session.notify(UNAUTHORIZED).map(|()| Flow::Continue)
        } else {
            self.dispatch(session, server).await
        };

        info!(connection = %session.peer, command = name, "ran command");
        result
    }

    async fn dispatch(self, session: &mut Session, server: &Server) -> Result<Flow, TransportError> {
        match self {
            Command::AdminLogin { password } => match server.admin_login(&password).await {
                AdminLogin::Disabled => {
                    session.notify("This server may not be accessed remotely")?;
                }
                AdminLogin::Accepted => {
                    session.is_admin = true;
                    session.notify("You have successfully logged in")?;
                }
                AdminLogin::Rejected => session.notify("Incorrect password")?,
            },
            Command::ChangeNick { name } => match name.parse::<Nickname>() {
                Ok(nickname) => {
                    if server.rename(session.id, nickname.clone()).await.is_none() {
                        return Ok(Flow::Disconnect);
                    }
                    session.nickname = nickname;
                }
                Err(e) => session.notify(format!("Invalid nickname: {e}"))?,
            },
            Command::Help => {
                for line in HELP {
                    session.notify(*line)?;
                }
                if session.is_admin {
                    for line in ADMIN_HELP {
                        session.notify(*line)?;
                    }
                }
            }
            Command::Kick { target } => match server.kick(session.id, &target).await {
                Ok(Some(_)) => {}
                Ok(None) => session.notify(format!("No user named [{target}]"))?,
                Err(NotMember) => return Ok(Flow::Disconnect),
            },
            Command::SetServerName { name } => {
                if name.is_empty() {
                    session.notify("Server name cannot be empty")?;
                } else if server.set_server_name(session.id, &name).await.is_err() {
                    return Ok(Flow::Disconnect);
                }
            }
            Command::Shutdown => {
                // Ends this session whether or not the caller was still a member.
                let _ = server.shutdown(session.id).await;
                return Ok(Flow::Disconnect);
            }
            Command::Quit => return Ok(Flow::Disconnect),
            Command::Unknown => {
                session.notify("Command not recognised use \"!help\" to view the commands")?;
            }
        }

        Ok(Flow::Continue)
    }
}
