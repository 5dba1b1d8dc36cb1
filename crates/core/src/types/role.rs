//! Operator role type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Role string attached to a backend user account.
///
/// The license API is free to introduce new role names at any time, so this
/// stays an opaque string rather than a closed enum. Only one value carries
/// meaning in the dashboard: `"admin"` unlocks the management screens.
///
/// ## Examples
///
/// ```
/// use keywarden_core::Role;
///
/// assert!(Role::new("admin").is_admin());
/// assert!(!Role::new("user").is_admin());
/// assert!(!Role::default().is_admin());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    /// The role name that unlocks the management screens.
    pub const ADMIN: &'static str = "admin";

    /// Wrap a backend role string.
    #[must_use]
    pub fn new(role: impl Into<String>) -> Self {
        Self(role.into())
    }

    /// Whether this role may use the management screens.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.0 == Self::ADMIN
    }

    /// Returns the role as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Role {
    /// Accounts without an explicit role are plain users.
    fn default() -> Self {
        Self("user".to_owned())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
