//! Backend wire schema and its mapping into [`crate::model`].
//!
//! Each entity family has exactly one mapping function. The positional
//! problems response is turned into a keyed [`PeriodStats`] here and nowhere
//! else.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{ClientError, Result};
use crate::model::{
    Contest, ContestHistory, CronJob, DailySubmission, Period, PeriodStats, Problem, ProblemStats,
    RatingDistribution, RatingPoint, Student, Submission,
};

/// The `{success, message, data}` envelope every endpoint answers with.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub success: bool,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// Backend message, if it sent a non-empty one.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.trim().is_empty())
    }
}

// ============================================================================
// Response types
// ============================================================================

/// A student as the backend sends it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub id: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,

    /// Current rating.
    #[serde(default, deserialize_with = "null_as_default")]
    pub rating: i32,

    #[serde(default, deserialize_with = "null_as_default")]
    pub codeforces_handle: String,

    /// RFC 3339 timestamp of the last Codeforces sync.
    #[serde(default)]
    pub last_data_update: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub reminder_email_count: u32,

    #[serde(default)]
    pub last_submission_date: Option<String>,

    /// Absent or null means enabled.
    #[serde(default)]
    pub email_reminder_enabled: Option<bool>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub max_rating: i32,

    #[serde(default)]
    pub phone_number: Option<String>,

    #[serde(default)]
    pub rank: Option<String>,

    #[serde(default)]
    pub max_rank: Option<String>,

    #[serde(default)]
    pub title_photo: Option<String>,
}

/// Deserialize `null` the same way as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_first_page<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or_else(default_page))
}

/// `data` of the paginated student list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentListData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub students: Vec<StudentRecord>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub total: u64,

    #[serde(default = "default_page", deserialize_with = "null_as_first_page")]
    pub page: u32,

    #[serde(default = "default_page", deserialize_with = "null_as_first_page")]
    pub total_pages: u32,
}

fn default_page() -> u32 {
    1
}

/// A contest participation as the backend sends it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub rank: u32,

    #[serde(default, deserialize_with = "null_as_default")]
    pub old_rating: i32,

    #[serde(default, deserialize_with = "null_as_default")]
    pub new_rating: i32,

    #[serde(default, deserialize_with = "null_as_default")]
    pub rating_change: i32,

    #[serde(default, deserialize_with = "null_as_default")]
    pub problems_solved: u32,

    #[serde(default, deserialize_with = "null_as_default")]
    pub total_problems: u32,

    /// RFC 3339 start time.
    pub contest_time: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RatingDataRecord {
    pub date: String,
    pub rating: i32,
}

/// `data` of the contests endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub contests: Vec<ContestRecord>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub rating_data: Vec<RatingDataRecord>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub total_contests: u32,

    #[serde(default, deserialize_with = "null_as_default")]
    pub average_change: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DailySubmissionRecord {
    pub date: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub count: u32,

    #[serde(default, deserialize_with = "null_as_default")]
    pub accepted: u32,
}

/// `data` of one element of the problems endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemStatsData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_solved: u32,

    #[serde(default, deserialize_with = "null_as_default")]
    pub max_rating: u32,

    #[serde(default, deserialize_with = "null_as_default")]
    pub avg_rating: f64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub avg_per_day: f64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub rating_distribution: RatingDistribution,

    #[serde(default, deserialize_with = "null_as_default")]
    pub daily_submissions: Vec<DailySubmissionRecord>,
}

/// A scheduled job as the backend sends it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronJobRecord {
    #[serde(default)]
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub cron_expression: String,

    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub last_run: Option<String>,

    #[serde(default)]
    pub next_run: Option<String>,
}

// ============================================================================
// Request bodies
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudentBody {
    pub email: String,
    pub name: String,
    pub phone_number: Option<String>,
    pub codeforces_handle: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStudentBody {
    pub email: String,
    pub name: String,
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleBody<'a> {
    pub codeforces_handle: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemindersBody {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CronScheduleBody<'a> {
    pub cron_expression: &'a str,
}

// ============================================================================
// Mapping
// ============================================================================

/// Parse the date portion of an ISO-8601 date or datetime.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Parse an RFC 3339 timestamp, treating anything unparseable as absent.
pub fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

fn require_day(raw: &str, what: &str) -> Result<NaiveDate> {
    parse_day(raw).ok_or_else(|| ClientError::unexpected(format!("invalid {what} date '{raw}'")))
}

/// Map a wire student to the internal shape.
pub fn map_student(record: StudentRecord) -> Student {
    let submissions = record
        .last_submission_date
        .as_deref()
        .and_then(parse_day)
        .map(|date| vec![Submission { date }])
        .unwrap_or_default();

    Student {
        id: record.id,
        name: record.name,
        email: record.email,
        phone: record.phone_number.filter(|p| !p.is_empty()),
        codeforces_handle: record.codeforces_handle,
        current_rating: record.rating,
        max_rating: record.max_rating,
        rank: record.rank.unwrap_or_default(),
        max_rank: record.max_rank.unwrap_or_default(),
        last_synced_at: parse_timestamp(record.last_data_update.as_deref()),
        reminders_sent: record.reminder_email_count,
        title_photo: record.title_photo.filter(|p| !p.is_empty()),
        emails_disabled: !record.email_reminder_enabled.unwrap_or(true),
        contests: vec![],
        problems: vec![],
        submissions,
        problem_stats: None,
    }
}

/// Map a wire contest to the internal shape.
pub fn map_contest(record: ContestRecord) -> Result<Contest> {
    Ok(Contest {
        date: require_day(&record.contest_time, "contest")?,
        name: record.name,
        rating: record.new_rating,
        rank: record.rank,
        unsolved: record.total_problems.saturating_sub(record.problems_solved),
    })
}

/// Map the contests endpoint payload.
pub fn map_contest_history(data: ContestData) -> Result<ContestHistory> {
    let contests = data
        .contests
        .into_iter()
        .map(map_contest)
        .collect::<Result<Vec<_>>>()?;

    let rating_data = data
        .rating_data
        .into_iter()
        .map(|point| {
            Ok(RatingPoint {
                date: require_day(&point.date, "rating point")?,
                rating: point.rating,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ContestHistory {
        contests,
        rating_data,
        total_contests: data.total_contests,
        average_change: data.average_change,
    })
}

/// Map one window's statistics.
pub fn map_problem_stats(data: ProblemStatsData) -> Result<ProblemStats> {
    let daily_submissions = data
        .daily_submissions
        .into_iter()
        .map(|day| {
            Ok(DailySubmission {
                date: require_day(&day.date, "submission")?,
                count: day.count,
                accepted: day.accepted,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ProblemStats {
        total_solved: data.total_solved,
        max_rating: data.max_rating,
        avg_rating: data.avg_rating,
        avg_per_day: data.avg_per_day,
        rating_distribution: data.rating_distribution,
        daily_submissions,
    })
}

/// Map the problems endpoint's positional array into keyed stats.
///
/// The backend sends exactly four enveloped objects in the order 7 days,
/// 30 days, 90 days, all-time.
pub fn map_period_stats(body: Value) -> Result<PeriodStats> {
    let Value::Array(items) = body else {
        return Err(ClientError::unexpected("problem stats is not an array"));
    };

    if items.len() != Period::ALL.len() {
        return Err(ClientError::unexpected(format!(
            "expected {} problem stat periods, got {}",
            Period::ALL.len(),
            items.len()
        )));
    }

    let mut stats = BTreeMap::new();
    for (period, item) in Period::ALL.into_iter().zip(items) {
        let envelope: Envelope = serde_json::from_value(item)
            .map_err(|e| ClientError::unexpected(format!("{}: {e}", period.label())))?;

        if !envelope.success {
            return Err(ClientError::Backend {
                status: None,
                message: envelope
                    .message()
                    .unwrap_or("failed to load problem statistics")
                    .to_string(),
            });
        }

        let data: ProblemStatsData = serde_json::from_value(envelope.data)
            .map_err(|e| ClientError::unexpected(format!("{}: {e}", period.label())))?;
        stats.insert(period, map_problem_stats(data)?);
    }

    Ok(PeriodStats::new(stats))
}

/// One accepted problem per accepted submission.
pub fn map_problems(days: &[DailySubmission]) -> Vec<Problem> {
    days.iter()
        .flat_map(|day| {
            (0..day.accepted).map(move |_| Problem {
                date: day.date,
                rating: 0,
            })
        })
        .collect()
}

/// One submission entry per submission.
pub fn map_submissions(days: &[DailySubmission]) -> Vec<Submission> {
    days.iter()
        .flat_map(|day| (0..day.count).map(move |_| Submission { date: day.date }))
        .collect()
}

/// Map a wire cron job, attaching its display name and description.
pub fn map_cron_job(record: CronJobRecord) -> CronJob {
    let (display_name, description) = match record.name.as_str() {
        "DATA_SYNC" => (
            "Data Sync".to_string(),
            "Synchronizes student data from external sources".to_string(),
        ),
        "INACTIVITY_CHECK" => (
            "Inactivity Check".to_string(),
            "Checks for inactive students and sends reminders".to_string(),
        ),
        other => (other.to_string(), String::new()),
    };

    CronJob {
        last_run: parse_timestamp(record.last_run.as_deref()),
        next_run: parse_timestamp(record.next_run.as_deref()),
        id: record.id,
        name: record.name,
        display_name,
        description,
        cron_expression: record.cron_expression,
        enabled: record.enabled,
    }
}
