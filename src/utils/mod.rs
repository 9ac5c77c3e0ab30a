use std::net::{IpAddr, SocketAddr};
use std::sync::LazyLock;

use axum::http::{header, HeaderMap};
use chrono::Utc;
use regex::Regex;
use uuid::Uuid;

use crate::models::log::{AuditAction, CONTACT_REQUEST_ENTITY};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Trims an optional form field; blank becomes `None`.
pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Escapes `%`, `_` and `\` so user input matches literally inside LIKE.
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Client address for the audit trail. With `trust_proxy` the first
/// `X-Forwarded-For` hop is used when it is a valid IP; otherwise the socket
/// peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> Option<String> {
    let forwarded = trust_proxy
        .then(|| headers.get("x-forwarded-for"))
        .flatten()
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse::<IpAddr>().ok());

    forwarded
        .or_else(|| peer.map(|addr| addr.ip()))
        .map(|ip| ip.to_string())
}

pub fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.chars().take(512).collect())
}

/// Writes one audit entry for a contact request. Runs on the caller's
/// connection so it can share the mutation's transaction.
pub async fn log_admin_action(
    conn: &mut sqlx::MySqlConnection,
    entity_id: &str,
    action: AuditAction,
    performed_by: &str,
    old_data: Option<&str>,
    new_data: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO audit_logs (id, entity_type, entity_id, action, performed_by, old_data, new_data, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
    )
    .bind(Uuid::new_v4().to_string())
    .bind(CONTACT_REQUEST_ENTITY)
    .bind(entity_id)
    .bind(action.as_str())
    .bind(performed_by)
    .bind(old_data)
    .bind(new_data)
    .bind(Utc::now())
    .execute(conn)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn email_pattern() {
        assert!(is_valid_email("sara@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.co"));
        assert!(!is_valid_email("sara@example"));
        assert!(!is_valid_email("sara example@x.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn blank_fields_become_none() {
        assert_eq!(blank_to_none(Some("   ".into())), None);
        assert_eq!(blank_to_none(None), None);
        assert_eq!(blank_to_none(Some(" Acme ".into())).as_deref(), Some("Acme"));
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn forwarded_for_is_used_only_behind_a_proxy() {
        let mut headers = HeaderMap::new();
        let peer: SocketAddr = "10.0.0.9:5555".parse().unwrap();
        assert_eq!(client_ip(&headers, Some(peer), true).as_deref(), Some("10.0.0.9"));

        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        assert_eq!(client_ip(&headers, Some(peer), true).as_deref(), Some("203.0.113.7"));
        assert_eq!(client_ip(&headers, Some(peer), false).as_deref(), Some("10.0.0.9"));
        assert_eq!(client_ip(&HeaderMap::new(), None, true), None);
    }

    #[test]
    fn junk_forwarded_for_falls_back_to_peer() {
        let peer: SocketAddr = "[2001:db8::1]:443".parse().unwrap();
        let long = "x".repeat(200);
        for value in [long.as_str(), "unknown", "203.0.113.7:8080"] {
            let mut headers = HeaderMap::new();
            headers.insert("x-forwarded-for", HeaderValue::from_str(value).unwrap());
            let ip = client_ip(&headers, Some(peer), true).unwrap();
            assert_eq!(ip, "2001:db8::1", "{value}");
            // ip_address is VARCHAR(64)
            assert!(ip.len() <= 64);
        }
    }
}
