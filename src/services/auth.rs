use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;

use crate::error::{AppError, AppResult};
use crate::models::user::{Admin, AdminProfile, AdminSummary, Capability, LoginRequest, LoginResponse, Role};

pub const TOKEN_TTL_DAYS: i64 = 7;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Token payload; also the authenticated context handlers receive.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    pub sub: String, // admin id
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn require_capability(&self, capability: Capability) -> AppResult<()> {
        if self.role.can(capability) {
            Ok(())
        } else {
            Err(AppError::Forbidden("Insufficient permissions".into()))
        }
    }

    pub fn require_role(&self, role: Role) -> AppResult<()> {
        if self.role.covers(role) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!("{} role required", role.as_str())))
        }
    }
}

pub fn issue_token(admin: &Admin, secret: &str) -> AppResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: admin.id.clone(),
        email: admin.email.clone(),
        role: admin.role,
        iat: now.timestamp(),
        exp: (now + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_ref()))
        .map_err(|e| AppError::Internal(format!("token encode: {e}")))
}

pub fn verify_token(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_ref()), &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AppError::Unauthorized("Token expired".into()),
            _ => AppError::Unauthorized("Invalid token".into()),
        })
}

/// Malformed stored hashes count as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

pub async fn login(pool: &MySqlPool, secret: &str, payload: LoginRequest) -> AppResult<LoginResponse> {
    let email = payload.email.trim();
    if email.is_empty() || payload.password.is_empty() {
        return Err(AppError::Validation("Email and password are required".into()));
    }

    let admin = sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    let admin = match admin {
        Some(admin) if admin.is_active => admin,
        Some(_) => {
            tracing::warn!(email, "login rejected: account inactive");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }
        None => {
            tracing::warn!(email, "login rejected: unknown account");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }
    };

    if !verify_password(&payload.password, &admin.password_hash) {
        tracing::warn!(email, "login rejected: wrong password");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    sqlx::query("UPDATE admins SET last_login_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(&admin.id)
        .execute(pool)
        .await?;

    let token = issue_token(&admin, secret)?;
    tracing::info!(admin_id = %admin.id, "admin logged in");

    Ok(LoginResponse {
        success: true,
        token,
        user: AdminSummary::from(&admin),
    })
}

pub async fn me(pool: &MySqlPool, claims: &Claims) -> AppResult<AdminProfile> {
    sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE id = ?")
        .bind(&claims.sub)
        .fetch_optional(pool)
        .await?
        .map(AdminProfile::from)
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    fn admin() -> Admin {
        Admin {
            id: "3f2c7f0e-0000-4000-8000-000000000001".into(),
            name: "Site Admin".into(),
            email: "admin@example.com".into(),
            password_hash: bcrypt::hash("admin123", 4).unwrap(),
            role: Role::Admin,
            is_active: true,
            last_login_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn token_round_trip_carries_identity() {
        let admin = admin();
        let token = issue_token(&admin, SECRET).unwrap();
        let claims = verify_token(&token, SECRET).unwrap();

        assert_eq!(claims.sub, admin.id);
        assert_eq!(claims.email, admin.email);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_DAYS * 24 * 60 * 60);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = issue_token(&admin(), "another-secret").unwrap();
        assert!(matches!(verify_token(&token, SECRET), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(matches!(verify_token("not.a.jwt", SECRET), Err(AppError::Unauthorized(_))));
        assert!(matches!(verify_token("", SECRET), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let past = Utc::now() - Duration::hours(2);
        let claims = Claims {
            sub: "id".into(),
            email: "admin@example.com".into(),
            role: Role::Admin,
            iat: (past - Duration::days(7)).timestamp(),
            exp: past.timestamp(),
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_ref())).unwrap();

        match verify_token(&token, SECRET) {
            Err(AppError::Unauthorized(msg)) => assert_eq!(msg, "Token expired"),
            other => panic!("expected expiry rejection, got {other:?}"),
        }
    }

    #[test]
    fn password_check_uses_bcrypt() {
        let admin = admin();
        assert!(verify_password("admin123", &admin.password_hash));
        assert!(!verify_password("admin124", &admin.password_hash));
        assert!(!verify_password("admin123", "admin123"));
    }

    #[test]
    fn admin_claims_pass_role_and_capability_checks() {
        let claims = verify_token(&issue_token(&admin(), SECRET).unwrap(), SECRET).unwrap();
        assert!(claims.require_role(Role::Admin).is_ok());
        assert!(claims.require_capability(Capability::ManageSubmissions).is_ok());
        assert!(claims.require_capability(Capability::ViewStatistics).is_ok());
    }
}
