//! Ownership of cost-bearing records.
//!
//! An entry is "own" for an actor when the actor is its subject user. The
//! check is deliberately separate from tier resolution: the tier says what
//! an actor may do, ownership picks which tier rule applies.

use super::{Actor, UserId};

/// Records that are logged on behalf of a subject user.
pub trait CostLoggable {
    /// The subject user, if one has been resolved.
    fn subject_user(&self) -> Option<UserId>;

    /// Whether `actor` is the subject of this record.
    fn is_own(&self, actor: &Actor) -> bool {
        self.subject_user() == Some(actor.user_id())
    }
}
