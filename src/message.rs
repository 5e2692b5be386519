use std::fmt;

use crate::nickname::{Nickname, RESERVED, SEPARATOR};

/// A single line destined for every roster member.
///
/// Wire format: `[sender] - body`, where system notices use the reserved
/// `[Server]` sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    System(String),
    Chat { from: Nickname, body: String },
}

impl Notice {
    pub fn system(text: impl Into<String>) -> Self {
        Notice::System(text.into())
    }

    pub fn chat(from: &Nickname, body: impl Into<String>) -> Self {
        Notice::Chat {
            from: from.clone(),
            body: body.into(),
        }
    }

    pub fn joined(nick: &Nickname) -> Self {
        Notice::System(format!("{nick} has joined"))
    }

    pub fn left(nick: &Nickname) -> Self {
        Notice::System(format!("{nick} has left"))
    }

    pub fn kicked(nick: &Nickname) -> Self {
        Notice::System(format!("{nick} has been kicked"))
    }

    pub fn renamed(old: &Nickname, new: &Nickname) -> Self {
        Notice::System(format!("{old} changed their name to {new}"))
    }

    pub fn server_renamed(name: &str) -> Self {
        Notice::System(format!("Server name changed to \"{name}\""))
    }

    pub fn shutting_down() -> Self {
        Notice::System("Shutting down".to_string())
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::System(text) => write!(f, "[{RESERVED}]{SEPARATOR}{text}"),
            Notice::Chat { from, body } => write!(f, "{from}{SEPARATOR}{body}"),
        }
    }
}

/// Convert a Notice into the line that goes over the wire.
impl From<Notice> for String {
    fn from(notice: Notice) -> Self {
        notice.to_string()
    }
}
