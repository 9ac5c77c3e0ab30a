use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::MySqlPool;

use crate::error::{AppError, AppResult};
use crate::models::contact::ContactStatus;
use crate::models::stats::{BudgetCount, StatusSummary, SubjectCount, TimelinePoint};

pub const UNSPECIFIED_BUDGET: &str = "unspecified";
pub const DEFAULT_TIMELINE_DAYS: i64 = 30;
pub const MAX_TIMELINE_DAYS: i64 = 365;

pub fn summarize(rows: &[(String, i64)]) -> StatusSummary {
    let mut summary = StatusSummary::default();
    for (status, count) in rows {
        summary.total += count;
        match status.parse::<ContactStatus>() {
            Ok(ContactStatus::New) => summary.new += count,
            Ok(ContactStatus::InReview) => summary.in_review += count,
            Ok(ContactStatus::Contacted) => summary.contacted += count,
            Ok(ContactStatus::Closed) => summary.closed += count,
            Ok(ContactStatus::Rejected) => summary.rejected += count,
            Err(_) => tracing::warn!(status = %status, "unknown status in contact_requests"),
        }
    }
    summary.completed = summary.contacted + summary.closed;
    summary
}

pub async fn summary(pool: &MySqlPool) -> AppResult<StatusSummary> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        "SELECT status, COUNT(*) FROM contact_requests GROUP BY status",
    )
    .fetch_all(pool)
    .await?;

    Ok(summarize(&rows))
}

pub async fn by_subject(pool: &MySqlPool) -> AppResult<Vec<SubjectCount>> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        "SELECT subject, COUNT(*) AS count FROM contact_requests GROUP BY subject ORDER BY count DESC, subject ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(subject, count)| SubjectCount { subject, count })
        .collect())
}

/// Labels NULL budgets and merges them with any stored literal of the same
/// label; sorted by count descending, then label.
pub fn label_budgets(rows: Vec<(Option<String>, i64)>) -> Vec<BudgetCount> {
    let mut merged: BTreeMap<String, i64> = BTreeMap::new();
    for (budget, count) in rows {
        let label = budget.unwrap_or_else(|| UNSPECIFIED_BUDGET.to_string());
        *merged.entry(label).or_default() += count;
    }

    let mut out: Vec<BudgetCount> = merged
        .into_iter()
        .map(|(budget, count)| BudgetCount { budget, count })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.budget.cmp(&b.budget)));
    out
}

pub async fn by_budget(pool: &MySqlPool) -> AppResult<Vec<BudgetCount>> {
    let rows = sqlx::query_as::<_, (Option<String>, i64)>(
        "SELECT budget, COUNT(*) FROM contact_requests GROUP BY budget",
    )
    .fetch_all(pool)
    .await?;

    Ok(label_budgets(rows))
}

pub fn timeline_days(days: Option<i64>) -> AppResult<i64> {
    let days = days.unwrap_or(DEFAULT_TIMELINE_DAYS);
    if !(1..=MAX_TIMELINE_DAYS).contains(&days) {
        return Err(AppError::Validation(format!(
            "days must be between 1 and {MAX_TIMELINE_DAYS}"
        )));
    }
    Ok(days)
}

/// Counts per UTC calendar day for timestamps at or after `since`, oldest
/// day first.
pub fn bucket_by_day(timestamps: &[DateTime<Utc>], since: DateTime<Utc>) -> Vec<TimelinePoint> {
    let mut buckets: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for ts in timestamps.iter().filter(|ts| **ts >= since) {
        *buckets.entry(ts.date_naive()).or_default() += 1;
    }

    buckets
        .into_iter()
        .map(|(date, count)| TimelinePoint {
            date: date.format("%Y-%m-%d").to_string(),
            count,
        })
        .collect()
}

pub async fn timeline(pool: &MySqlPool, days: i64) -> AppResult<Vec<TimelinePoint>> {
    let since = Utc::now() - Duration::days(days);

    let timestamps = sqlx::query_scalar::<_, DateTime<Utc>>(
        "SELECT created_at FROM contact_requests WHERE created_at >= ? ORDER BY created_at ASC",
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(bucket_by_day(&timestamps, since))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn summary_derives_completed() {
        let rows = vec![
            ("NEW".to_string(), 4),
            ("IN_REVIEW".to_string(), 2),
            ("CONTACTED".to_string(), 3),
            ("CLOSED".to_string(), 1),
            ("REJECTED".to_string(), 5),
        ];
        let summary = summarize(&rows);

        assert_eq!(summary.total, 15);
        assert_eq!(summary.new, 4);
        assert_eq!(summary.in_review, 2);
        assert_eq!(summary.completed, 4);
        assert_eq!(summary.rejected, 5);
    }

    #[test]
    fn empty_store_summarizes_to_zero() {
        assert_eq!(summarize(&[]), StatusSummary::default());
    }

    #[test]
    fn null_budget_is_labelled_and_sorted() {
        let rows = vec![
            (Some("500$ - 1500$".to_string()), 2),
            (None, 3),
            (Some("under 500$".to_string()), 2),
            (Some(UNSPECIFIED_BUDGET.to_string()), 1),
        ];
        let out = label_budgets(rows);

        assert_eq!(
            out,
            vec![
                BudgetCount { budget: UNSPECIFIED_BUDGET.into(), count: 4 },
                BudgetCount { budget: "500$ - 1500$".into(), count: 2 },
                BudgetCount { budget: "under 500$".into(), count: 2 },
            ]
        );
    }

    #[test]
    fn timeline_days_defaults_and_bounds() {
        assert_eq!(timeline_days(None).unwrap(), 30);
        assert_eq!(timeline_days(Some(7)).unwrap(), 7);
        assert!(timeline_days(Some(0)).is_err());
        assert!(timeline_days(Some(-3)).is_err());
        assert!(timeline_days(Some(MAX_TIMELINE_DAYS + 1)).is_err());
    }

    #[test]
    fn timeline_excludes_records_outside_window() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let since = now - Duration::days(7);
        let timestamps = vec![
            now - Duration::days(10),
            now - Duration::days(2),
            now - Duration::days(2) + Duration::hours(1),
            now,
        ];

        let points = bucket_by_day(&timestamps, since);
        assert_eq!(
            points,
            vec![
                TimelinePoint { date: "2024-06-13".into(), count: 2 },
                TimelinePoint { date: "2024-06-15".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn timeline_buckets_by_utc_date() {
        let since = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let timestamps = vec![
            Utc.with_ymd_and_hms(2024, 1, 2, 23, 59, 59).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap(),
        ];
        let points = bucket_by_day(&timestamps, since);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, "2024-01-02");
        assert_eq!(points[1].date, "2024-01-03");
    }
}
