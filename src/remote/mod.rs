//! Remote data gateway for the tracking backend.
//!
//! [`BackendClient`] issues one HTTP call per operation and maps the
//! backend's `{success, message, data}` envelope into internal types via
//! [`wire`]. It never retries; callers decide what to do with a failure.
//!
//! # Endpoints
//!
//! - `GET    /api/student/students?page&limit&search`
//! - `POST   /api/student/students`
//! - `PUT    /api/student/students/{id}/update`
//! - `PUT    /api/student/students/{id}/codeforces`
//! - `DELETE /api/student/students/{id}`
//! - `PUT    /api/student/students/{id}/email-reminders`
//! - `GET    /api/student/students/{id}/contests?days`
//! - `GET    /api/student/students/{id}/problems?days`
//! - `GET|PUT /api/student/emailTemplate`
//! - `GET    /api/cron/configs`, `PUT /api/cron/{name}`,
//!   `POST /api/cron/{name}/enable|disable|trigger`

pub mod wire;

use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::model::{
    ContestHistory, CronJob, EmailTemplate, PaginationCursor, PeriodStats, Student, StudentPage,
};
use wire::{
    CreateStudentBody, CronJobRecord, CronScheduleBody, Envelope, HandleBody, RemindersBody,
    StudentListData, StudentRecord, UpdateStudentBody,
};

/// Client for the tracking backend's REST API.
#[derive(Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Create a client for the backend at `base_url`.
    pub fn new(base_url: &str) -> Self {
        Self::with_http_client(reqwest::Client::new(), base_url)
    }

    /// Create a client whose requests time out after `timeout`.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_http_client(client, base_url))
    }

    /// Create a client on top of an existing `reqwest::Client`.
    pub fn with_http_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn student_url(&self, id: &str, suffix: &str) -> String {
        self.url(&format!(
            "/api/student/students/{}{}",
            urlencoding::encode(id),
            suffix
        ))
    }

    // ------------------------------------------------------------------------
    // Students
    // ------------------------------------------------------------------------

    /// Fetch one page of students.
    ///
    /// # Arguments
    ///
    /// * `page` - 1-based page number
    /// * `limit` - Page size
    /// * `search` - Free-text filter, empty for none
    pub async fn list_students(&self, page: u32, limit: u32, search: &str) -> Result<StudentPage> {
        let url = format!(
            "{}?page={}&limit={}&search={}",
            self.url("/api/student/students"),
            page.max(1),
            limit,
            urlencoding::encode(search)
        );

        let data: StudentListData = send_data(self.client.get(&url)).await?;

        Ok(StudentPage {
            students: data.students.into_iter().map(wire::map_student).collect(),
            cursor: PaginationCursor {
                page: data.page,
                total_pages: data.total_pages,
                total: data.total,
            },
        })
    }

    /// Create a student and return it as the backend stored it.
    pub async fn create_student(&self, body: &CreateStudentBody) -> Result<Student> {
        let url = self.url("/api/student/students");
        let record: StudentRecord = send_data(self.client.post(&url).json(body)).await?;
        Ok(wire::map_student(record))
    }

    /// Update a student's contact fields.
    pub async fn update_student(&self, id: &str, body: &UpdateStudentBody) -> Result<Student> {
        let url = self.student_url(id, "/update");
        let record: StudentRecord = send_data(self.client.put(&url).json(body)).await?;
        Ok(wire::map_student(record))
    }

    /// Change a student's Codeforces handle. The backend resynchronizes the
    /// student before answering.
    pub async fn update_handle(&self, id: &str, handle: &str) -> Result<Student> {
        let url = self.student_url(id, "/codeforces");
        let body = HandleBody {
            codeforces_handle: handle,
        };
        let record: StudentRecord = send_data(self.client.put(&url).json(&body)).await?;
        Ok(wire::map_student(record))
    }

    pub async fn delete_student(&self, id: &str) -> Result<()> {
        let url = self.student_url(id, "");
        send_ack(self.client.delete(&url)).await
    }

    /// Enable or disable inactivity reminder emails for a student.
    pub async fn set_email_reminders(&self, id: &str, enabled: bool) -> Result<()> {
        let url = self.student_url(id, "/email-reminders");
        send_ack(self.client.put(&url).json(&RemindersBody { enabled })).await
    }

    /// Fetch contest history over the last `days` days (`0` for all).
    pub async fn student_contests(&self, id: &str, days: u32) -> Result<ContestHistory> {
        let url = format!("{}?days={}", self.student_url(id, "/contests"), days);
        let data = send_data(self.client.get(&url)).await?;
        wire::map_contest_history(data)
    }

    /// Fetch problem statistics for every period.
    ///
    /// The endpoint always answers with all four periods regardless of
    /// `days`.
    pub async fn student_problems(&self, id: &str, days: u32) -> Result<PeriodStats> {
        let url = format!("{}?days={}", self.student_url(id, "/problems"), days);
        let body = send_raw(self.client.get(&url)).await?;
        wire::map_period_stats(body)
    }

    // ------------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------------

    pub async fn email_template(&self) -> Result<EmailTemplate> {
        let url = self.url("/api/student/emailTemplate");
        send_data(self.client.get(&url)).await
    }

    pub async fn save_email_template(&self, template: &EmailTemplate) -> Result<()> {
        let url = self.url("/api/student/emailTemplate");
        send_ack(self.client.put(&url).json(template)).await
    }

    pub async fn cron_jobs(&self) -> Result<Vec<CronJob>> {
        let url = self.url("/api/cron/configs");
        let records: Vec<CronJobRecord> = send_data(self.client.get(&url)).await?;
        Ok(records.into_iter().map(wire::map_cron_job).collect())
    }

    pub async fn update_cron_schedule(&self, name: &str, cron_expression: &str) -> Result<()> {
        let url = self.url(&format!("/api/cron/{}", urlencoding::encode(name)));
        let body = CronScheduleBody { cron_expression };
        send_ack(self.client.put(&url).json(&body)).await
    }

    pub async fn set_cron_enabled(&self, name: &str, enabled: bool) -> Result<()> {
        let action = if enabled { "enable" } else { "disable" };
        let url = self.url(&format!("/api/cron/{}/{}", urlencoding::encode(name), action));
        send_ack(self.client.post(&url)).await
    }

    pub async fn trigger_cron_job(&self, name: &str) -> Result<()> {
        let url = self.url(&format!("/api/cron/{}/trigger", urlencoding::encode(name)));
        send_ack(self.client.post(&url)).await
    }
}

// ============================================================================
// Envelope handling
// ============================================================================

fn backend_error(status: StatusCode, message: Option<&str>) -> ClientError {
    ClientError::Backend {
        status: Some(status.as_u16()),
        message: message
            .map(str::to_string)
            .unwrap_or_else(|| format!("backend responded with {status}")),
    }
}

async fn send(request: RequestBuilder) -> Result<(StatusCode, Vec<u8>)> {
    let response: Response = request.send().await?;
    let status = response.status();
    let body = response.bytes().await?.to_vec();
    debug!(status = status.as_u16(), len = body.len(), "Backend responded");
    Ok((status, body))
}

/// Send a request and return the envelope's `data`, failing on a non-2xx
/// status or `success: false`.
async fn send_data<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    let (status, body) = send(request).await?;

    let envelope: Envelope = match serde_json::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => return Err(backend_error(status, None)),
        Err(e) => return Err(ClientError::unexpected(e.to_string())),
    };

    if !status.is_success() || !envelope.success {
        return Err(backend_error(status, envelope.message()));
    }

    serde_json::from_value(envelope.data).map_err(|e| ClientError::unexpected(e.to_string()))
}

/// Send a request whose answer carries no data we need.
///
/// An empty or non-envelope body on a 2xx status counts as success.
async fn send_ack(request: RequestBuilder) -> Result<()> {
    let (status, body) = send(request).await?;
    let envelope = serde_json::from_slice::<Envelope>(&body).ok();
    let message = envelope.as_ref().and_then(Envelope::message);

    if !status.is_success() {
        return Err(backend_error(status, message));
    }

    match envelope {
        Some(envelope) if !envelope.success && body_has_success_flag(&body) => {
            Err(backend_error(status, envelope.message()))
        }
        _ => Ok(()),
    }
}

/// Send a request and return the raw JSON body, for endpoints that do not
/// wrap their answer in an envelope.
async fn send_raw(request: RequestBuilder) -> Result<Value> {
    let (status, body) = send(request).await?;

    if !status.is_success() {
        let envelope = serde_json::from_slice::<Envelope>(&body).ok();
        return Err(backend_error(status, envelope.as_ref().and_then(Envelope::message)));
    }

    serde_json::from_slice(&body).map_err(|e| ClientError::unexpected(e.to_string()))
}

fn body_has_success_flag(body: &[u8]) -> bool {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("success").cloned())
        .is_some()
}
