use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::{DateTime, Utc};
use thiserror::Error;
use utoipa::ToSchema;

/// A single permission. Roles grant sets of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ViewSubmissions,
    ManageSubmissions,
    ViewStatistics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
}

#[derive(Debug, Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
        }
    }

    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            Role::Admin => &[
                Capability::ViewSubmissions,
                Capability::ManageSubmissions,
                Capability::ViewStatistics,
            ],
        }
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// True when this role holds every capability `other` holds.
    pub fn covers(&self, other: Role) -> bool {
        other.capabilities().iter().all(|c| self.can(*c))
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            _ => Err(UnknownRole(value)),
        }
    }
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub user: AdminSummary,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&Admin> for AdminSummary {
    fn from(admin: &Admin) -> Self {
        Self {
            id: admin.id.clone(),
            name: admin.name.clone(),
            email: admin.email.clone(),
            role: admin.role,
        }
    }
}

impl From<Admin> for AdminProfile {
    fn from(admin: Admin) -> Self {
        Self {
            id: admin.id,
            name: admin.name,
            email: admin.email,
            role: admin.role,
            last_login_at: admin.last_login_at,
            created_at: admin.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!(Role::try_from("ADMIN".to_string()).unwrap(), Role::Admin);
        assert_eq!(Role::try_from("admin".to_string()).unwrap(), Role::Admin);
        assert!(Role::try_from("viewer".to_string()).is_err());
    }

    #[test]
    fn admin_holds_every_capability() {
        assert!(Role::Admin.can(Capability::ViewSubmissions));
        assert!(Role::Admin.can(Capability::ManageSubmissions));
        assert!(Role::Admin.can(Capability::ViewStatistics));
        assert!(Role::Admin.covers(Role::Admin));
    }

    #[test]
    fn role_serializes_upper_case() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
    }
}
