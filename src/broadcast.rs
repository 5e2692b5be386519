use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::message::Notice;
use crate::roster::Roster;

/// Deliver `notice` to every member of `roster`.
///
/// Callers hold the server's state lock for the whole call; that lock is the
/// one ordering point for everything broadcast. Queuing into an outbox never
/// waits on the network.
///
/// A member whose outbox refuses the line is removed on the spot and its
/// departure is announced to everyone left, after the current line.
/// Returns how many members received `notice` itself.
pub fn fan_out(roster: &mut Roster, notice: Notice) -> usize {
    let mut pending = VecDeque::from([notice]);
    let mut delivered_first = None;

    while let Some(notice) = pending.pop_front() {
        let line = notice.to_string();
        debug!(%line, recipients = roster.len(), "broadcast");

        let mut delivered = 0;
        for member in roster.snapshot() {
            if member.outbox.send(line.clone()).is_ok() {
                delivered += 1;
                continue;
            }

            warn!(id = %member.id, nick = %member.nickname, "delivery failed, removing from roster");
            if roster.remove(member.id).is_some() {
                pending.push_back(Notice::left(&member.nickname));
            }
        }

        delivered_first.get_or_insert(delivered);
    }

    delivered_first.unwrap_or(0)
}
