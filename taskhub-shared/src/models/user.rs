/// User model and role capabilities
///
/// Users are identified by email. The remote service stores the sign-up form
/// (minus the password) plus a coin balance, so the wire names follow that
/// form: `Name`, `photo`, `role`, `balance`.
///
/// # Roles
///
/// - **Worker**: submits work against active tasks, withdraws coins
/// - **Buyer**: funds tasks, reviews submissions, purchases coins
/// - **Admin**: platform administration
///
/// # Example
///
/// ```
/// use taskhub_shared::models::user::{NewUser, Role};
/// use taskhub_shared::money::Coins;
///
/// let user = NewUser::register("ada@example.com", "Ada", None, Role::Buyer);
/// assert_eq!(user.balance, Coins::whole(50));
/// assert!(user.role.can_create_tasks());
/// ```

use crate::money::Coins;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of platform roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Worker,
    Buyer,
    Admin,
}

impl Role {
    /// Wire/display name
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Worker => "Worker",
            Role::Buyer => "Buyer",
            Role::Admin => "Admin",
        }
    }

    /// Balance granted at registration
    pub fn starting_balance(&self) -> Coins {
        match self {
            Role::Worker => Coins::whole(10),
            Role::Buyer | Role::Admin => Coins::whole(50),
        }
    }

    /// Can fund new tasks
    pub fn can_create_tasks(&self) -> bool {
        matches!(self, Role::Buyer)
    }

    /// Can approve or reject submissions on own tasks
    pub fn can_review_submissions(&self) -> bool {
        matches!(self, Role::Buyer)
    }

    /// Can buy coin packages
    pub fn can_purchase_coins(&self) -> bool {
        matches!(self, Role::Buyer)
    }

    /// Can submit work against tasks
    pub fn can_submit_work(&self) -> bool {
        matches!(self, Role::Worker)
    }

    /// Can cash out coins
    pub fn can_withdraw(&self) -> bool {
        matches!(self, Role::Worker)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unknown role names
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "worker" => Ok(Role::Worker),
            "buyer" => Ok(Role::Buyer),
            "admin" => Ok(Role::Admin),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// User record as returned by the remote service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Remote document id
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Unique email
    pub email: String,

    /// Display name
    #[serde(rename = "Name", default)]
    pub name: String,

    /// Profile photo URL
    #[serde(rename = "photo", default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,

    pub role: Role,

    /// Current coin balance
    #[serde(default)]
    pub balance: Coins,
}

/// Input for registering a new user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,

    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "photo", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,

    pub role: Role,

    pub balance: Coins,
}

impl NewUser {
    /// Builds a registration record with the role's starting balance
    pub fn register(
        email: impl Into<String>,
        name: impl Into<String>,
        photo_url: Option<String>,
        role: Role,
    ) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            photo_url,
            role,
            balance: role.starting_balance(),
        }
    }
}
