//! Data models for cftrack.
//!
//! These are the *internal* shapes the rest of the crate works with. The
//! backend's wire schema lives in [`crate::remote::wire`] and is mapped into
//! these types at the gateway boundary, so nothing outside `remote` depends on
//! the backend's field names or array ordering.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A tracked student.
///
/// The `id` is assigned by the backend and never changes. Every other field
/// may be replaced wholesale (page reload) or merged from a [`StudentPatch`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    /// Opaque backend identifier.
    pub id: String,

    pub name: String,

    pub email: String,

    /// Optional phone number. `None` when the backend has none on record.
    pub phone: Option<String>,

    /// Codeforces account name.
    pub codeforces_handle: String,

    pub current_rating: i32,

    pub max_rating: i32,

    /// Rank label for the current rating (e.g. "expert").
    pub rank: String,

    /// Rank label for the maximum rating.
    pub max_rank: String,

    /// When the backend last synchronized this student with Codeforces.
    pub last_synced_at: Option<DateTime<Utc>>,

    /// Number of inactivity reminder emails sent so far.
    pub reminders_sent: u32,

    /// Avatar URL. `None` is the explicit "unset" marker.
    pub title_photo: Option<String>,

    /// True when the student opted out of reminder emails.
    pub emails_disabled: bool,

    /// Contest history, populated by a secondary fetch.
    pub contests: Vec<Contest>,

    /// Accepted problems, populated by a secondary fetch.
    pub problems: Vec<Problem>,

    /// Submissions, seeded from the last submission date and replaced by a
    /// secondary fetch.
    pub submissions: Vec<Submission>,

    /// Time-windowed problem statistics, populated by a secondary fetch.
    pub problem_stats: Option<PeriodStats>,
}

impl Student {
    /// Merge a partial update into this student. Fields left as `None` in the
    /// patch are retained.
    pub fn apply(&mut self, patch: StudentPatch) {
        let StudentPatch {
            name,
            email,
            phone,
            codeforces_handle,
            current_rating,
            max_rating,
            rank,
            max_rank,
            last_synced_at,
            reminders_sent,
            title_photo,
            emails_disabled,
            contests,
            problems,
            submissions,
            problem_stats,
        } = patch;

        if let Some(v) = name {
            self.name = v;
        }
        if let Some(v) = email {
            self.email = v;
        }
        if let Some(v) = phone {
            self.phone = v;
        }
        if let Some(v) = codeforces_handle {
            self.codeforces_handle = v;
        }
        if let Some(v) = current_rating {
            self.current_rating = v;
        }
        if let Some(v) = max_rating {
            self.max_rating = v;
        }
        if let Some(v) = rank {
            self.rank = v;
        }
        if let Some(v) = max_rank {
            self.max_rank = v;
        }
        if let Some(v) = last_synced_at {
            self.last_synced_at = v;
        }
        if let Some(v) = reminders_sent {
            self.reminders_sent = v;
        }
        if let Some(v) = title_photo {
            self.title_photo = v;
        }
        if let Some(v) = emails_disabled {
            self.emails_disabled = v;
        }
        if let Some(v) = contests {
            self.contests = v;
        }
        if let Some(v) = problems {
            self.problems = v;
        }
        if let Some(v) = submissions {
            self.submissions = v;
        }
        if let Some(v) = problem_stats {
            self.problem_stats = Some(v);
        }
    }
}

/// Partial update for a [`Student`].
///
/// There is no `id` field: identity cannot be patched.
/// Nullable fields use `Option<Option<_>>` so a patch can clear them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<Option<String>>,
    pub codeforces_handle: Option<String>,
    pub current_rating: Option<i32>,
    pub max_rating: Option<i32>,
    pub rank: Option<String>,
    pub max_rank: Option<String>,
    pub last_synced_at: Option<Option<DateTime<Utc>>>,
    pub reminders_sent: Option<u32>,
    pub title_photo: Option<Option<String>>,
    pub emails_disabled: Option<bool>,
    pub contests: Option<Vec<Contest>>,
    pub problems: Option<Vec<Problem>>,
    pub submissions: Option<Vec<Submission>>,
    pub problem_stats: Option<PeriodStats>,
}

impl StudentPatch {
    /// Patch carrying every backend-owned field of `student`.
    ///
    /// The lazily fetched collections (contests, problems, submissions,
    /// stats) are left out so an edit does not wipe a loaded profile.
    pub fn backend_fields(student: Student) -> Self {
        Self {
            name: Some(student.name),
            email: Some(student.email),
            phone: Some(student.phone),
            codeforces_handle: Some(student.codeforces_handle),
            current_rating: Some(student.current_rating),
            max_rating: Some(student.max_rating),
            rank: Some(student.rank),
            max_rank: Some(student.max_rank),
            last_synced_at: Some(student.last_synced_at),
            reminders_sent: Some(student.reminders_sent),
            title_photo: Some(student.title_photo),
            emails_disabled: Some(student.emails_disabled),
            ..Self::default()
        }
    }
}

/// One rated contest in a student's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contest {
    pub name: String,
    pub date: NaiveDate,
    /// Rating after the contest.
    pub rating: i32,
    pub rank: u32,
    /// Problems left unsolved.
    pub unsolved: u32,
}

/// An accepted problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub date: NaiveDate,
    /// Problem rating, 0 when unknown.
    pub rating: u32,
}

/// A submission (accepted or not).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub date: NaiveDate,
}

/// Submission counts for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySubmission {
    pub date: NaiveDate,
    pub count: u32,
    pub accepted: u32,
}

/// Histogram of solved problems by problem rating.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RatingDistribution {
    pub rating800: u32,
    pub rating900: u32,
    pub rating1000: u32,
    pub rating1100: u32,
    pub rating1200: u32,
    pub rating1300: u32,
    pub rating1400: u32,
    pub rating1500: u32,
    pub rating1600: u32,
    pub rating1700: u32,
    pub rating1800: u32,
    pub rating1900: u32,
    pub rating2000: u32,
    pub rating2100: u32,
    pub rating2200: u32,
    pub rating2300: u32,
    pub rating2400_plus: u32,
    pub rating_unknown: u32,
}

impl RatingDistribution {
    /// All buckets in ascending rating order, labelled for display.
    pub fn buckets(&self) -> [(&'static str, u32); 18] {
        [
            ("800", self.rating800),
            ("900", self.rating900),
            ("1000", self.rating1000),
            ("1100", self.rating1100),
            ("1200", self.rating1200),
            ("1300", self.rating1300),
            ("1400", self.rating1400),
            ("1500", self.rating1500),
            ("1600", self.rating1600),
            ("1700", self.rating1700),
            ("1800", self.rating1800),
            ("1900", self.rating1900),
            ("2000", self.rating2000),
            ("2100", self.rating2100),
            ("2200", self.rating2200),
            ("2300", self.rating2300),
            ("2400+", self.rating2400_plus),
            ("Unknown", self.rating_unknown),
        ]
    }
}

/// Problem-solving statistics for one trailing time window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemStats {
    pub total_solved: u32,
    pub max_rating: u32,
    pub avg_rating: f64,
    pub avg_per_day: f64,
    pub rating_distribution: RatingDistribution,
    pub daily_submissions: Vec<DailySubmission>,
}

/// Trailing time window for [`ProblemStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Period {
    Days7,
    Days30,
    Days90,
    AllTime,
}

impl Period {
    /// Every period, shortest first.
    pub const ALL: [Period; 4] = [Period::Days7, Period::Days30, Period::Days90, Period::AllTime];

    /// Window length in days, `None` for all-time.
    pub fn days(&self) -> Option<u32> {
        match self {
            Period::Days7 => Some(7),
            Period::Days30 => Some(30),
            Period::Days90 => Some(90),
            Period::AllTime => None,
        }
    }

    /// Look up the period for a window length; `0` means all-time.
    pub fn from_days(days: u32) -> Option<Self> {
        match days {
            7 => Some(Period::Days7),
            30 => Some(Period::Days30),
            90 => Some(Period::Days90),
            0 => Some(Period::AllTime),
            _ => None,
        }
    }

    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Period::Days7 => "Last 7 days",
            Period::Days30 => "Last 30 days",
            Period::Days90 => "Last 90 days",
            Period::AllTime => "All time",
        }
    }
}

/// Problem statistics keyed by [`Period`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodStats(BTreeMap<Period, ProblemStats>);

impl PeriodStats {
    pub fn new(stats: BTreeMap<Period, ProblemStats>) -> Self {
        Self(stats)
    }

    pub fn get(&self, period: Period) -> Option<&ProblemStats> {
        self.0.get(&period)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Period, &ProblemStats)> {
        self.0.iter().map(|(p, s)| (*p, s))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A point on the rating chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingPoint {
    pub date: NaiveDate,
    pub rating: i32,
}

/// Contest history as returned by the contests endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestHistory {
    pub contests: Vec<Contest>,
    pub rating_data: Vec<RatingPoint>,
    pub total_contests: u32,
    pub average_change: f64,
}

/// Identifier of a background operation.
pub type ProcessId = u64;

/// Status of a background operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStatus {
    Active,
    Completed,
}

/// A user-triggered mutation shown in the progress indicator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Process {
    pub id: ProcessId,
    pub name: String,
    /// 50 while in flight, 100 once settled.
    pub progress: u8,
    pub status: ProcessStatus,
    /// Failure message when the call was rejected. A failed process is still
    /// `Completed`.
    pub error: Option<String>,
}

impl Process {
    /// Placeholder progress for an operation that has started.
    pub const STARTED_PROGRESS: u8 = 50;

    /// Progress for an operation that has settled.
    pub const SETTLED_PROGRESS: u8 = 100;

    pub fn started(id: ProcessId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            progress: Self::STARTED_PROGRESS,
            status: ProcessStatus::Active,
            error: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ProcessStatus::Active
    }

    pub fn apply(&mut self, patch: ProcessPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(progress) = patch.progress {
            self.progress = progress;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(error) = patch.error {
            self.error = error;
        }
    }
}

/// Partial update for a [`Process`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessPatch {
    pub name: Option<String>,
    pub progress: Option<u8>,
    pub status: Option<ProcessStatus>,
    pub error: Option<Option<String>>,
}

/// The list view's current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationCursor {
    pub page: u32,
    pub total_pages: u32,
    pub total: u64,
}

impl Default for PaginationCursor {
    fn default() -> Self {
        Self {
            page: 1,
            total_pages: 1,
            total: 0,
        }
    }
}

impl PaginationCursor {
    /// Whether `page` lies within `[1, total_pages]`.
    pub fn contains(&self, page: u32) -> bool {
        page >= 1 && page <= self.total_pages
    }
}

/// One page of students plus its cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentPage {
    pub students: Vec<Student>,
    pub cursor: PaginationCursor,
}

/// Input for creating a student, as typed into the add form.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewStudent {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub codeforces_handle: String,
}

/// Input for editing a student, as typed into the edit form.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StudentEdit {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub codeforces_handle: String,
}

/// Reminder email template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub subject: String,
    pub body: String,
}

/// A scheduled backend job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CronJob {
    pub id: String,
    /// Backend job name, e.g. `DATA_SYNC`.
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub cron_expression: String,
    pub enabled: bool,
    pub last_run: Option<DateTime<Utc>>,
    pub next_run: Option<DateTime<Utc>>,
}
