use chrono::Utc;
use sqlx::migrate::Migrator;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use uuid::Uuid;

use crate::config::{BootstrapAdmin, Config};
use crate::models::contact::ContactStatus;
use crate::models::user::Role;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub async fn establish_connection(config: &Config) -> Result<MySqlPool, sqlx::Error> {
    MySqlPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
}

/// Creates the configured administrator unless an account with that email
/// already exists. Returns whether one was created.
pub async fn ensure_admin(pool: &MySqlPool, admin: &BootstrapAdmin) -> anyhow::Result<bool> {
    let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admins WHERE email = ?")
        .bind(&admin.email)
        .fetch_one(pool)
        .await?;

    if exists > 0 {
        tracing::info!(email = %admin.email, "admin account already exists");
        return Ok(false);
    }

    let hashed = bcrypt::hash(&admin.password, bcrypt::DEFAULT_COST)?;
    sqlx::query(
        "INSERT INTO admins (id, name, email, password_hash, role, is_active, created_at) VALUES (?, ?, ?, ?, ?, TRUE, ?)"
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&admin.name)
    .bind(&admin.email)
    .bind(hashed)
    .bind(Role::Admin.as_str())
    .bind(Utc::now())
    .execute(pool)
    .await?;

    tracing::info!(email = %admin.email, "admin account created");
    Ok(true)
}

pub async fn admin_count(pool: &MySqlPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM admins")
        .fetch_one(pool)
        .await
}

struct DemoRequest {
    name: &'static str,
    email: &'static str,
    phone: &'static str,
    company: Option<&'static str>,
    subject: &'static str,
    budget: &'static str,
    message: &'static str,
    status: ContactStatus,
}

const DEMO_REQUESTS: &[DemoRequest] = &[
    DemoRequest {
        name: "Ahmed Mohamed",
        email: "ahmed@example.com",
        phone: "01012345678",
        company: Some("Tech Co"),
        subject: "AI project",
        budget: "1500$ - 5000$",
        message: "I want to build an image classification system for my business that can recognize our different products.",
        status: ContactStatus::New,
    },
    DemoRequest {
        name: "Sara Ali",
        email: "sara@example.com",
        phone: "01098765432",
        company: Some("Freelancer"),
        subject: "Web development",
        budget: "500$ - 1500$",
        message: "I need a professional personal website with a full dashboard. It should be fast, well designed and support Arabic.",
        status: ContactStatus::InReview,
    },
    DemoRequest {
        name: "Mahmoud Hassan",
        email: "mahmoud@example.com",
        phone: "01155555555",
        company: Some("Retail Co"),
        subject: "Data analysis",
        budget: "under 500$",
        message: "I want to analyze our sales data and extract useful insights to improve performance and make better decisions.",
        status: ContactStatus::Contacted,
    },
    DemoRequest {
        name: "Fatma Ahmed",
        email: "fatma@example.com",
        phone: "01234567890",
        company: None,
        subject: "Consultation",
        budget: "not sure",
        message: "I would like technical advice on the best tools for building an AI application that recognizes Arabic text.",
        status: ContactStatus::New,
    },
];

/// Inserts demo contact requests when the table is empty. Returns how many
/// were inserted.
pub async fn seed_demo_requests(pool: &MySqlPool) -> anyhow::Result<usize> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contact_requests")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        tracing::info!(existing, "contact requests already present, skipping demo data");
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    for demo in DEMO_REQUESTS {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO contact_requests (id, name, email, phone, company, subject, budget, message, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(Uuid::new_v4().to_string())
        .bind(demo.name)
        .bind(demo.email)
        .bind(demo.phone)
        .bind(demo.company)
        .bind(demo.subject)
        .bind(demo.budget)
        .bind(demo.message)
        .bind(demo.status.as_str())
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    Ok(DEMO_REQUESTS.len())
}
