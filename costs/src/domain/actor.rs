//! The authenticated user performing a cost entry request.

use serde::{Deserialize, Serialize};

use super::UserId;

/// Authenticated user performing a request.
///
/// The host identity system resolves the actor; the cost rules only read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    user_id: UserId,
    #[serde(default)]
    admin: bool,
}

impl Actor {
    /// A regular user.
    pub const fn user(user_id: UserId) -> Self {
        Self {
            user_id,
            admin: false,
        }
    }

    /// An administrator of the host application.
    pub const fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            admin: true,
        }
    }

    /// Identifier of the acting user.
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Whether the actor is a host administrator.
    pub const fn is_admin(&self) -> bool {
        self.admin
    }
}
