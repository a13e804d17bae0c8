//! Caller identity at the application boundary.
//!
//! The surrounding application owns authentication; this subsystem only
//! consumes the resolved tenant and role of the requesting principal.

use serde::{Deserialize, Serialize};

/// Tenant roles recognized by the integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Admin,
    Member,
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "owner" => Ok(Role::Owner),
            "admin" => Ok(Role::Admin),
            "member" => Ok(Role::Member),
            _ => Err(()),
        }
    }
}

/// Resolved membership of the requesting principal.
#[derive(Debug, Clone)]
pub struct Membership {
    pub tenant_id: String,
    pub role: Role,
}

impl Membership {
    pub fn new(tenant_id: impl Into<String>, role: Role) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            role,
        }
    }

    /// Connection lifecycle and payment operations require the owner role.
    pub fn is_owner(&self) -> bool {
        self.role == Role::Owner
    }
}
