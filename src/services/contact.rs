use chrono::Utc;
use sqlx::{MySql, MySqlPool, QueryBuilder};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::contact::{
    ContactListQuery, ContactListResponse, ContactPatch, ContactRequest, ContactStatus,
    CreateContactRequest, Pagination, RequestMetadata,
};
use crate::models::log::AuditAction;
use crate::utils::{blank_to_none, escape_like, is_valid_email, log_admin_action};

pub const MIN_MESSAGE_CHARS: usize = 30;
pub const MAX_MESSAGE_CHARS: usize = 5000;
pub const MAX_FIELD_CHARS: usize = 255;
pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;
/// Keeps `(page - 1) * limit` inside `i64` for any allowed limit.
pub const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_SIZE;

/// A submission that passed validation, with fields trimmed.
#[derive(Debug, Clone, PartialEq)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub subject: String,
    pub budget: Option<String>,
    pub message: String,
}

pub fn validate(input: CreateContactRequest) -> AppResult<NewContact> {
    let name = input.name.trim().to_string();
    let email = input.email.trim().to_string();
    let subject = input.subject.trim().to_string();
    let message = input.message.trim().to_string();

    if name.is_empty() || email.is_empty() || subject.is_empty() || message.is_empty() {
        return Err(AppError::Validation("All required fields must be filled".into()));
    }

    let message_chars = message.chars().count();
    if message_chars < MIN_MESSAGE_CHARS {
        return Err(AppError::Validation(format!(
            "Message must be at least {MIN_MESSAGE_CHARS} characters"
        )));
    }
    if message_chars > MAX_MESSAGE_CHARS {
        return Err(AppError::Validation(format!(
            "Message must be at most {MAX_MESSAGE_CHARS} characters"
        )));
    }

    if !is_valid_email(&email) {
        return Err(AppError::Validation("Invalid email address".into()));
    }

    let contact = NewContact {
        name,
        email,
        phone: blank_to_none(input.phone),
        company: blank_to_none(input.company),
        subject,
        budget: blank_to_none(input.budget),
        message,
    };

    let short_fields = [
        ("name", Some(&contact.name)),
        ("email", Some(&contact.email)),
        ("subject", Some(&contact.subject)),
        ("phone", contact.phone.as_ref()),
        ("company", contact.company.as_ref()),
        ("budget", contact.budget.as_ref()),
    ];
    for (field, value) in short_fields {
        if value.is_some_and(|v| v.chars().count() > MAX_FIELD_CHARS) {
            return Err(AppError::Validation(format!(
                "{field} must be at most {MAX_FIELD_CHARS} characters"
            )));
        }
    }

    Ok(contact)
}

pub async fn create(
    pool: &MySqlPool,
    input: CreateContactRequest,
    meta: RequestMetadata,
) -> AppResult<String> {
    let contact = validate(input)?;
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO contact_requests (id, name, email, phone, company, subject, budget, message, status, ip_address, user_agent, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    )
    .bind(&id)
    .bind(&contact.name)
    .bind(&contact.email)
    .bind(&contact.phone)
    .bind(&contact.company)
    .bind(&contact.subject)
    .bind(&contact.budget)
    .bind(&contact.message)
    .bind(ContactStatus::New.as_str())
    .bind(&meta.ip_address)
    .bind(&meta.user_agent)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    tracing::info!(contact_id = %id, subject = %contact.subject, "contact request received");
    Ok(id)
}

/// Normalized list options.
#[derive(Debug, Clone, PartialEq)]
pub struct ListFilter {
    pub status: Option<ContactStatus>,
    /// Lower-cased, LIKE-escaped, wrapped in `%`.
    pub search_pattern: Option<String>,
    pub page: i64,
    pub limit: i64,
}

impl ListFilter {
    pub fn from_query(query: ContactListQuery) -> AppResult<Self> {
        let status = match query.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(s) if s.eq_ignore_ascii_case("all") => None,
            Some(s) => Some(
                s.parse::<ContactStatus>()
                    .map_err(|e| AppError::Validation(e.to_string()))?,
            ),
        };

        let search_pattern = query
            .search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(&s)));

        Ok(Self {
            status,
            search_pattern,
            page: query.page.unwrap_or(1).clamp(1, MAX_PAGE),
            limit: query
                .limit
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    fn push_where(&self, qb: &mut QueryBuilder<'_, MySql>) {
        qb.push(" WHERE 1 = 1");
        if let Some(status) = self.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(pattern) = &self.search_pattern {
            qb.push(" AND (LOWER(name) LIKE ")
                .push_bind(pattern.clone())
                .push(" OR LOWER(email) LIKE ")
                .push_bind(pattern.clone())
                .push(" OR LOWER(subject) LIKE ")
                .push_bind(pattern.clone())
                .push(")");
        }
    }
}

pub fn page_count(total: i64, limit: i64) -> i64 {
    if limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}

pub async fn list(pool: &MySqlPool, filter: &ListFilter) -> AppResult<ContactListResponse> {
    let mut count_qb = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM contact_requests");
    filter.push_where(&mut count_qb);
    let total: i64 = count_qb.build_query_scalar::<i64>().fetch_one(pool).await?;

    let mut data_qb = QueryBuilder::<MySql>::new("SELECT * FROM contact_requests");
    filter.push_where(&mut data_qb);
    data_qb
        .push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(filter.limit)
        .push(" OFFSET ")
        .push_bind(filter.offset());
    let data = data_qb
        .build_query_as::<ContactRequest>()
        .fetch_all(pool)
        .await?;

    Ok(ContactListResponse {
        data,
        pagination: Pagination {
            page: filter.page,
            limit: filter.limit,
            total,
            pages: page_count(total, filter.limit),
        },
    })
}

fn not_found() -> AppError {
    AppError::NotFound("Request not found".into())
}

pub async fn get_by_id(pool: &MySqlPool, id: &str) -> AppResult<ContactRequest> {
    sqlx::query_as::<_, ContactRequest>("SELECT * FROM contact_requests WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(not_found)
}

/// Applies `patch` and writes the audit entry in one transaction.
pub async fn update(
    pool: &MySqlPool,
    id: &str,
    patch: &ContactPatch,
    actor: &str,
) -> AppResult<ContactRequest> {
    if patch.is_empty() {
        return Err(AppError::Validation("No fields to update".into()));
    }

    let mut tx = pool.begin().await?;

    let existing = sqlx::query_as::<_, ContactRequest>(
        "SELECT * FROM contact_requests WHERE id = ? FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(not_found)?;

    let mut updated = existing.clone();
    patch.apply(&mut updated);
    updated.updated_at = Utc::now();

    sqlx::query(
        "UPDATE contact_requests SET status = ?, notes = ?, assigned_to = ?, updated_at = ? WHERE id = ?",
    )
    .bind(updated.status.as_str())
    .bind(&updated.notes)
    .bind(&updated.assigned_to)
    .bind(updated.updated_at)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    let old_data = serde_json::to_string(&existing)?;
    let new_data = serde_json::to_string(&updated)?;
    log_admin_action(&mut tx, id, AuditAction::Update, actor, Some(&old_data), Some(&new_data)).await?;

    tx.commit().await?;

    tracing::info!(contact_id = %id, actor, status = %updated.status, "contact request updated");
    Ok(updated)
}

/// Deletes the record and writes the audit entry in one transaction.
pub async fn delete(pool: &MySqlPool, id: &str, actor: &str) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    let existing = sqlx::query_as::<_, ContactRequest>(
        "SELECT * FROM contact_requests WHERE id = ? FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(not_found)?;

    sqlx::query("DELETE FROM contact_requests WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let old_data = serde_json::to_string(&existing)?;
    log_admin_action(&mut tx, id, AuditAction::Delete, actor, Some(&old_data), None).await?;

    tx.commit().await?;

    tracing::info!(contact_id = %id, actor, "contact request deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> CreateContactRequest {
        CreateContactRequest {
            name: "  Ahmed ".into(),
            email: "ahmed@example.com".into(),
            phone: Some("".into()),
            company: Some(" Tech Co ".into()),
            subject: "AI project".into(),
            budget: None,
            message: "I want to build an image classifier for my store products.".into(),
        }
    }

    fn expect_validation(result: AppResult<NewContact>) -> String {
        match result {
            Err(AppError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_submission_is_normalized() {
        let contact = validate(valid_input()).unwrap();
        assert_eq!(contact.name, "Ahmed");
        assert_eq!(contact.phone, None);
        assert_eq!(contact.company.as_deref(), Some("Tech Co"));
    }

    #[test]
    fn short_message_is_rejected() {
        let mut input = valid_input();
        input.message = "Too short to be useful.".into();
        assert!(expect_validation(validate(input)).contains("30"));
    }

    #[test]
    fn message_length_counts_characters_not_bytes() {
        let mut input = valid_input();
        // 30 two-byte characters.
        input.message = "م".repeat(30);
        assert!(validate(input.clone()).is_ok());
        input.message = "م".repeat(29);
        assert!(validate(input).is_err());
    }

    #[test]
    fn missing_required_fields_are_rejected() {
        for blank in ["name", "email", "subject", "message"] {
            let mut input = valid_input();
            match blank {
                "name" => input.name = "   ".into(),
                "email" => input.email = String::new(),
                "subject" => input.subject = String::new(),
                _ => input.message = String::new(),
            }
            expect_validation(validate(input));
        }
    }

    #[test]
    fn bad_email_is_rejected() {
        let mut input = valid_input();
        input.email = "ahmed.example.com".into();
        assert_eq!(expect_validation(validate(input)), "Invalid email address");
    }

    #[test]
    fn oversized_field_is_rejected() {
        let mut input = valid_input();
        input.company = Some("x".repeat(MAX_FIELD_CHARS + 1));
        assert!(expect_validation(validate(input)).starts_with("company"));
    }

    #[test]
    fn filter_defaults() {
        let filter = ListFilter::from_query(ContactListQuery::default()).unwrap();
        assert_eq!(filter.status, None);
        assert_eq!(filter.search_pattern, None);
        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit, DEFAULT_PAGE_SIZE);
        assert_eq!(filter.offset(), 0);
    }

    #[test]
    fn filter_all_means_unfiltered() {
        let filter = ListFilter::from_query(ContactListQuery {
            status: Some("all".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(filter.status, None);
    }

    #[test]
    fn filter_parses_status_and_rejects_unknown() {
        let filter = ListFilter::from_query(ContactListQuery {
            status: Some("IN_REVIEW".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(filter.status, Some(ContactStatus::InReview));

        let err = ListFilter::from_query(ContactListQuery {
            status: Some("ARCHIVED".into()),
            ..Default::default()
        });
        assert!(matches!(err, Err(AppError::Validation(_))));
    }

    #[test]
    fn filter_clamps_paging_and_escapes_search() {
        let filter = ListFilter::from_query(ContactListQuery {
            search: Some("  Sara_% ".into()),
            page: Some(0),
            limit: Some(1000),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(filter.search_pattern.as_deref(), Some("%sara\\_\\%%"));
        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit, MAX_PAGE_SIZE);

        let filter = ListFilter::from_query(ContactListQuery {
            page: Some(3),
            limit: Some(10),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(filter.offset(), 20);
    }

    #[test]
    fn huge_page_number_does_not_overflow_offset() {
        for limit in [1, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE] {
            let filter = ListFilter::from_query(ContactListQuery {
                page: Some(i64::MAX),
                limit: Some(limit),
                ..Default::default()
            })
            .unwrap();
            assert_eq!(filter.page, MAX_PAGE);
            assert!(filter.offset() >= 0);
        }
    }

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(page_count(0, 20), 0);
        assert_eq!(page_count(20, 20), 1);
        assert_eq!(page_count(21, 20), 2);
        assert_eq!(page_count(5, 0), 0);
    }
}
