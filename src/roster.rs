use crate::nickname::Nickname;
use crate::session::Outbox;
use crate::types::SessionId;

/// A roster entry: who a session is and how to reach it.
#[derive(Debug, Clone)]
pub struct Member {
    pub id: SessionId,
    pub nickname: Nickname,
    pub outbox: Outbox,
}

/// The live set of admitted sessions, in admission order.
///
/// Plain data with no locking of its own; the server keeps it behind the
/// same mutex that serializes broadcasts, so membership and fan-out are
/// always observed together.
#[derive(Debug, Default)]
pub struct Roster {
    members: Vec<Member>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a member. Re-adding an id already present replaces nothing.
    pub fn add(&mut self, member: Member) -> bool {
        if self.contains(member.id) {
            return false;
        }
        self.members.push(member);
        true
    }

    /// Remove by id. Removing a non-member is a no-op.
    pub fn remove(&mut self, id: SessionId) -> Option<Member> {
        let pos = self.members.iter().position(|m| m.id == id)?;
        Some(self.members.remove(pos))
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.members.iter().any(|m| m.id == id)
    }

    /// First member in roster order whose bare name is exactly `name`.
    pub fn find_by_nickname(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.nickname.as_str() == name)
    }

    /// Update a member's nickname, returning the old one.
    pub fn rename(&mut self, id: SessionId, nickname: Nickname) -> Option<Nickname> {
        let member = self.members.iter_mut().find(|m| m.id == id)?;
        Some(std::mem::replace(&mut member.nickname, nickname))
    }

    pub fn snapshot(&self) -> Vec<Member> {
        self.members.clone()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Member> {
        self.members.iter()
    }
}
