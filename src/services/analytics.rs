//! Owner analytics — lead volume and conversion over a recent window.
//!
//! DESIGN
//! ======
//! One query pulls `(status, created_at)` for the owner's leads in the
//! window; everything else is computed by the pure `summarize`, which takes
//! "now" as an argument so day bucketing is testable. Days are UTC calendar
//! days and the window always ends with today, so a 7-day range is today
//! plus the six days before it.
//!
//! A lead counts as converted when its current status is `converted`; the
//! trend attributes it to the day it was captured.

use serde::Serialize;
use sqlx::{PgPool, Row};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::services::lead::LeadStatus;

const DAY_MS: i64 = 86_400_000;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnalyticsRange {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl AnalyticsRange {
    #[must_use]
    pub fn days(self) -> u16 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
            Self::Quarter => 90,
            Self::Year => 365,
        }
    }

    /// Accepts the day count as text: `7`, `30`, `90` or `365`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "7" => Some(Self::Week),
            "30" => Some(Self::Month),
            "90" => Some(Self::Quarter),
            "365" => Some(Self::Year),
            _ => None,
        }
    }
}

/// What `summarize` needs from a lead row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeadPoint {
    pub status: LeadStatus,
    pub created_at_ms: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageTotals {
    pub pages: i64,
    pub views: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub total_leads: usize,
    pub converted_leads: usize,
    /// Converted per hundred leads, one decimal.
    pub conversion_rate: f64,
    pub total_pages: i64,
    /// All-time views across the owner's pages.
    pub total_views: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: LeadStatus,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendDay {
    /// `YYYY-MM-DD`, UTC.
    pub date: String,
    pub day_start_ms: i64,
    pub leads: usize,
    pub conversions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analytics {
    pub range_days: u16,
    pub overview: Overview,
    pub status_breakdown: Vec<StatusCount>,
    pub lead_trends: Vec<TrendDay>,
}

// =============================================================================
// COMPUTATION
// =============================================================================

/// Converted per hundred leads, rounded to one decimal; 0 without leads.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn conversion_rate(total: usize, converted: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (converted as f64 / total as f64 * 1000.0).round() / 10.0
}

fn day_start_ms(ms: i64) -> i64 {
    ms.div_euclid(DAY_MS) * DAY_MS
}

/// First millisecond of the window ending today.
#[must_use]
pub fn window_start_ms(now_ms: i64, days: u16) -> i64 {
    day_start_ms(now_ms) - (i64::from(days) - 1) * DAY_MS
}

fn date_label(day_start_ms: i64) -> String {
    OffsetDateTime::from_unix_timestamp(day_start_ms / 1000)
        .map(|dt| {
            let date = dt.date();
            format!("{:04}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day())
        })
        .unwrap_or_default()
}

/// Leads and conversions per day, oldest first, one entry per day of the
/// window including empty days.
#[must_use]
pub fn lead_trend(points: &[LeadPoint], days: u16, now_ms: i64) -> Vec<TrendDay> {
    let start = window_start_ms(now_ms, days);
    let mut trend: Vec<TrendDay> = (0..i64::from(days))
        .map(|offset| {
            let day_start_ms = start + offset * DAY_MS;
            TrendDay { date: date_label(day_start_ms), day_start_ms, leads: 0, conversions: 0 }
        })
        .collect();

    for point in points {
        let Ok(index) = usize::try_from((point.created_at_ms - start).div_euclid(DAY_MS)) else {
            continue;
        };
        if let Some(day) = trend.get_mut(index) {
            day.leads += 1;
            if point.status == LeadStatus::Converted {
                day.conversions += 1;
            }
        }
    }
    trend
}

/// Overview, per-status counts and the daily trend for leads captured in
/// the window. Points outside the window are ignored.
#[must_use]
pub fn summarize(points: &[LeadPoint], range: AnalyticsRange, now_ms: i64, pages: PageTotals) -> Analytics {
    let days = range.days();
    let start = window_start_ms(now_ms, days);
    let end = day_start_ms(now_ms) + DAY_MS;
    let in_window: Vec<LeadPoint> = points
        .iter()
        .filter(|p| (start..end).contains(&p.created_at_ms))
        .copied()
        .collect();

    let count = |status: LeadStatus| in_window.iter().filter(|p| p.status == status).count();
    let total_leads = in_window.len();
    let converted_leads = count(LeadStatus::Converted);

    let status_breakdown = [
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::Qualified,
        LeadStatus::Converted,
        LeadStatus::Lost,
    ]
    .into_iter()
    .map(|status| StatusCount { status, count: count(status) })
    .collect();

    Analytics {
        range_days: days,
        overview: Overview {
            total_leads,
            converted_leads,
            conversion_rate: conversion_rate(total_leads, converted_leads),
            total_pages: pages.pages,
            total_views: pages.views,
        },
        status_breakdown,
        lead_trends: lead_trend(&in_window, days, now_ms),
    }
}

fn now_ms() -> i64 {
    let now = OffsetDateTime::now_utc();
    now.unix_timestamp() * 1000 + i64::from(now.millisecond())
}

// =============================================================================
// QUERIES
// =============================================================================

/// Analytics for the owner's leads and pages over `range`, ending today.
///
/// # Errors
///
/// Returns database errors.
pub async fn owner_analytics(pool: &PgPool, owner_id: Uuid, range: AnalyticsRange) -> Result<Analytics, AnalyticsError> {
    let now = now_ms();
    let start = window_start_ms(now, range.days());

    let rows = sqlx::query(
        r"SELECT status, (EXTRACT(EPOCH FROM created_at) * 1000)::BIGINT AS created_at_ms
          FROM leads
          WHERE owner_id = $1
            AND created_at >= TIMESTAMPTZ 'epoch' + $2::BIGINT * INTERVAL '1 millisecond'",
    )
    .bind(owner_id)
    .bind(start)
    .fetch_all(pool)
    .await?;
    let points: Vec<LeadPoint> = rows
        .iter()
        .map(|row| {
            let status: String = row.get("status");
            LeadPoint {
                status: LeadStatus::parse(&status).unwrap_or(LeadStatus::New),
                created_at_ms: row.get("created_at_ms"),
            }
        })
        .collect();

    let totals = sqlx::query(
        r"SELECT COUNT(*)::BIGINT AS pages, COALESCE(SUM(views), 0)::BIGINT AS views
          FROM landing_pages
          WHERE owner_id = $1",
    )
    .bind(owner_id)
    .fetch_one(pool)
    .await?;
    let pages = PageTotals { pages: totals.get("pages"), views: totals.get("views") };

    Ok(summarize(&points, range, now, pages))
}

#[cfg(test)]
#[path = "analytics_test.rs"]
mod tests;
