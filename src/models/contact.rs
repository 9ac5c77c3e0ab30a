use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContactStatus {
    New,
    InReview,
    Contacted,
    Closed,
    Rejected,
}

#[derive(Debug, Error)]
#[error("unknown status: {0}")]
pub struct UnknownStatus(pub String);

impl ContactStatus {
    pub const ALL: [ContactStatus; 5] = [
        ContactStatus::New,
        ContactStatus::InReview,
        ContactStatus::Contacted,
        ContactStatus::Closed,
        ContactStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::New => "NEW",
            ContactStatus::InReview => "IN_REVIEW",
            ContactStatus::Contacted => "CONTACTED",
            ContactStatus::Closed => "CLOSED",
            ContactStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContactStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContactStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

impl TryFrom<String> for ContactStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub subject: String,
    pub budget: Option<String>,
    pub message: String,
    #[sqlx(try_from = "String")]
    pub status: ContactStatus,
    pub notes: Option<String>,
    pub assigned_to: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public contact-form body. Missing fields deserialize as empty and are
/// rejected by validation rather than by the JSON extractor.
#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct CreateContactRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub subject: String,
    pub budget: Option<String>,
    pub message: String,
}

/// Where a submission came from.
#[derive(Debug, Default, Clone)]
pub struct RequestMetadata {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateContactResponse {
    pub success: bool,
    pub message: String,
    pub id: String,
}

// Distinguishes an absent key (None) from an explicit null (Some(None)).
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Administrator edit of a submission. Only supplied fields are applied;
/// `null` for `notes` or `assignedTo` clears the value.
#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactPatch {
    pub status: Option<ContactStatus>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub assigned_to: Option<Option<String>>,
}

impl ContactPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.notes.is_none() && self.assigned_to.is_none()
    }

    pub fn apply(&self, record: &mut ContactRequest) {
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(notes) = &self.notes {
            record.notes = notes.clone();
        }
        if let Some(assigned_to) = &self.assigned_to {
            record.assigned_to = assigned_to.clone();
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ContactListQuery {
    /// Exact status, or `all`.
    pub status: Option<String>,
    /// Case-insensitive match against name, email and subject.
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ContactListResponse {
    pub data: Vec<ContactRequest>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateContactResponse {
    pub success: bool,
    pub message: String,
    pub data: ContactRequest,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteContactResponse {
    pub success: bool,
    pub message: String,
}
