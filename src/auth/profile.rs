//! The authenticated user's profile.
//!
//! A [`Profile`] is fetched from `GET auth/me` (or adopted from the login
//! response) once a credential exists. The JSON field names follow the
//! backend's user model.
//!
//! # Example
//!
//! ```rust
//! use dokumen_api::{Profile, Role};
//!
//! let profile: Profile = serde_json::from_str(r#"{
//!     "id": "6b1f",
//!     "username": "alice",
//!     "name": "Alice",
//!     "role": "super_admin",
//!     "is_active": true
//! }"#).unwrap();
//!
//! assert_eq!(profile.role, Role::SuperAdmin);
//! assert_eq!(profile.display_name, "Alice");
//! assert!(profile.scope_assignments.is_empty());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Access level of a user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access, including user management.
    SuperAdmin,
    /// Manages master data.
    Admin,
    /// Enters documents within assigned scopes.
    Operator,
}

impl Role {
    /// Returns the wire name of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::Operator => "operator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A budget officer a user is assigned to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Officer {
    /// Officer identifier.
    pub id: String,
    /// Officer name.
    #[serde(rename = "nama")]
    pub name: String,
}

/// One scope a user may act within.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeAssignment {
    /// Assignment identifier.
    pub id: String,
    /// The assigned officer's identifier.
    #[serde(rename = "pptk_id")]
    pub officer_id: String,
    /// The assigned officer, when the backend expands it.
    #[serde(rename = "pptk", default, skip_serializing_if = "Option::is_none")]
    pub officer: Option<Officer>,
}

/// The authenticated user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// User identifier.
    pub id: String,

    /// Login name.
    pub username: String,

    /// Name shown in the interface.
    #[serde(rename = "name")]
    pub display_name: String,

    /// Access level.
    pub role: Role,

    /// Work unit the user belongs to.
    #[serde(rename = "unit_kerja_id", default, skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<String>,

    /// Primary officer assignment.
    #[serde(rename = "pptk_id", default, skip_serializing_if = "Option::is_none")]
    pub officer_id: Option<String>,

    /// All officer assignments.
    #[serde(rename = "pptk_list", default, skip_serializing_if = "Vec::is_empty")]
    pub scope_assignments: Vec<ScopeAssignment>,

    /// Path of the uploaded avatar image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_path: Option<String>,

    /// Whether the account is enabled.
    #[serde(default = "default_active")]
    pub is_active: bool,

    /// Account creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Last modification time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

const fn default_active() -> bool {
    true
}

impl Profile {
    /// Returns `true` if the profile's role is one of `roles`.
    #[must_use]
    pub fn has_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }
}
