use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProfileError;
use crate::services::customer_data::delegation::Delegation;
use crate::services::customer_data::{PermissionCategory, Role};

/// Chosen before login; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerType {
    Private,
    Business,
}

impl CustomerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Business => "business",
        }
    }
}

impl fmt::Display for CustomerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CustomerType {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "private" => Ok(Self::Private),
            "business" => Ok(Self::Business),
            other => Err(ProfileError::InvalidCustomerType(other.to_string())),
        }
    }
}

/// Someone the logged-in user can act as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub subtitle: String,
    pub kind: IdentityKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum IdentityKind {
    /// The user's own scope. `role` is the user's role in their company (business only).
    #[serde(rename = "self")]
    Own { role: Option<&'static Role> },
    Delegation(Delegation),
    Business { role: &'static Role },
}

impl Identity {
    pub fn is_own(&self) -> bool {
        matches!(self.kind, IdentityKind::Own { .. })
    }

    pub fn is_delegation(&self) -> bool {
        matches!(self.kind, IdentityKind::Delegation(_))
    }

    pub fn is_business(&self) -> bool {
        matches!(self.kind, IdentityKind::Business { .. })
    }

    /// Insurance categories visible while acting as this identity.
    pub fn permitted_categories(&self) -> Vec<PermissionCategory> {
        match &self.kind {
            IdentityKind::Own { role: None } => PermissionCategory::ALL.to_vec(),
            IdentityKind::Own { role: Some(role) } | IdentityKind::Business { role } => {
                role.permissions.to_vec()
            }
            IdentityKind::Delegation(delegation) => delegation.permitted_categories(),
        }
    }
}
