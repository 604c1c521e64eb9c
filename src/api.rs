//! HTTP surface for the dashboard views.
//!
//! Each handler drives one client operation and returns JSON. Input
//! rejected before reaching the backend maps to `400 Bad Request`; anything
//! the backend refused or answered badly maps to `502 Bad Gateway`.
//!
//! # Endpoints
//!
//! - `GET /health`
//! - `GET /dashboard?page&search`
//! - `GET|POST /students`, `GET /students.csv`
//! - `GET|PUT|DELETE /students/:id` (`GET` takes `period` and `contestDays`)
//! - `PUT /students/:id/email-reminders`
//! - `GET /students/:id/reminder-preview`
//! - `GET /processes`, `GET /notifications`
//! - `GET /settings`, `PUT /settings/template`
//! - `PUT /settings/cron/:name`, `POST /settings/cron/:name/:action`

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::app::AppState;
use crate::error::ClientError;
use crate::export::students_csv;
use crate::model::{
    CronJob, EmailTemplate, NewStudent, PaginationCursor, Period, Process, Student, StudentEdit,
};
use crate::notify::Notice;
use crate::profile::{
    CONTEST_FILTER_DAYS, DEFAULT_CONTEST_WINDOW_DAYS, PROBLEM_FILTER_DAYS, ProfileView,
};

impl IntoResponse for ClientError {
    fn into_response(self) -> Response {
        let status = match &self {
            ClientError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::BAD_GATEWAY,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<T, ClientError>;

/// Build the router for all endpoints.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/dashboard", get(get_dashboard))
        .route("/students", get(list_students).post(create_student))
        .route("/students.csv", get(export_students))
        .route(
            "/students/:id",
            get(get_student).put(edit_student).delete(delete_student),
        )
        .route("/students/:id/email-reminders", put(set_email_reminders))
        .route("/students/:id/reminder-preview", get(preview_reminder))
        .route("/processes", get(get_processes))
        .route("/notifications", get(get_notifications))
        .route("/settings", get(get_settings))
        .route("/settings/template", put(save_template))
        .route("/settings/cron/:name", put(update_cron_schedule))
        .route("/settings/cron/:name/:action", post(cron_action))
        .with_state(state)
}

/// GET /health - Simple health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

// ============================================================================
// Dashboard
// ============================================================================

/// Query parameters for the dashboard endpoint.
#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    /// 1-based page. Out-of-range pages keep the current page.
    pub page: Option<u32>,
    /// Search term, applied immediately. Keystroke input goes through the
    /// debounced [`ListSync::search`] instead.
    ///
    /// [`ListSync::search`]: crate::sync::ListSync::search
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub students: Vec<Student>,
    pub pagination: PaginationCursor,
    pub loading: bool,
}

/// GET /dashboard - Load a page of students.
///
/// A new search term fetches its first page. Otherwise a page different
/// from the current one is fetched if it is in range; an out-of-range page
/// returns the current list without contacting the backend. With neither,
/// the current page is refreshed.
///
/// # Response
///
/// ```json
/// {
///     "students": [ ... ],
///     "pagination": { "page": 1, "totalPages": 3, "total": 27 },
///     "loading": false
/// }
/// ```
#[instrument(skip(state))]
pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> ApiResult<Json<DashboardResponse>> {
    let search = query.search.map(|s| s.to_lowercase());
    let current = state.list.cursor().page;

    match (search, query.page) {
        (Some(term), _) if term != state.list.search_term() => {
            state.list.search_now(&term).await?;
        }
        (_, Some(page)) if page != current => {
            if !state.list.change_page(page).await? {
                warn!(page, "Requested page out of range");
            }
        }
        _ => {
            state.list.load().await?;
        }
    }

    let response = DashboardResponse {
        students: state.store.students(),
        pagination: state.list.cursor(),
        loading: state.list.is_loading(),
    };
    info!(
        count = response.students.len(),
        page = response.pagination.page,
        "Dashboard queried"
    );
    Ok(Json(response))
}

// ============================================================================
// Students
// ============================================================================

/// GET /students - Students currently held by the store, without fetching.
pub async fn list_students(State(state): State<AppState>) -> Json<Vec<Student>> {
    Json(state.store.students())
}

/// POST /students - Create a student.
#[instrument(skip_all)]
pub async fn create_student(
    State(state): State<AppState>,
    Json(input): Json<NewStudent>,
) -> ApiResult<(StatusCode, Json<Student>)> {
    let student = state.students.add_student(input).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

/// Query parameters for the profile endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileQuery {
    /// Problem statistics window: 7, 30 (default) or 90 days.
    pub period: Option<u32>,
    /// Contest chart window: 30, 90 or 365 (default) days.
    pub contest_days: Option<i64>,
}

impl ProfileQuery {
    fn resolve(&self) -> ApiResult<(Period, i64)> {
        let period = match self.period {
            None => Period::Days30,
            Some(days) => PROBLEM_FILTER_DAYS
                .contains(&days)
                .then(|| Period::from_days(days))
                .flatten()
                .ok_or_else(|| {
                    ClientError::validation(format!(
                        "Unsupported period {days}: expected one of {PROBLEM_FILTER_DAYS:?}"
                    ))
                })?,
        };

        let contest_days = match self.contest_days {
            None => DEFAULT_CONTEST_WINDOW_DAYS,
            Some(days) if CONTEST_FILTER_DAYS.contains(&days) => days,
            Some(days) => {
                return Err(ClientError::validation(format!(
                    "Unsupported contest window {days}: expected one of {CONTEST_FILTER_DAYS:?}"
                )));
            }
        };

        Ok((period, contest_days))
    }
}

/// GET /students/:id?period&contestDays - Load the profile of a student in
/// the current list.
///
/// Contests and problems are fetched fresh; partial failures still return
/// whatever was loaded.
#[instrument(skip(state))]
pub async fn get_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ProfileQuery>,
) -> Result<Json<ProfileView>, Response> {
    let (period, contest_days) = query.resolve().map_err(IntoResponse::into_response)?;

    let Some(student) = state.students.load_profile(&id).await else {
        warn!(student_id = %id, "Student not in store");
        return Err(StatusCode::NOT_FOUND.into_response());
    };

    let view = ProfileView::build(student, period, contest_days, Utc::now().date_naive());
    Ok(Json(view))
}

/// PUT /students/:id - Edit a student.
#[instrument(skip(state, edit))]
pub async fn edit_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(edit): Json<StudentEdit>,
) -> ApiResult<Json<Student>> {
    Ok(Json(state.students.edit_student(&id, edit).await?))
}

/// DELETE /students/:id
#[instrument(skip(state))]
pub async fn delete_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.students.delete_student(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct RemindersRequest {
    pub enabled: bool,
}

/// PUT /students/:id/email-reminders
#[instrument(skip(state))]
pub async fn set_email_reminders(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<RemindersRequest>,
) -> ApiResult<StatusCode> {
    state
        .students
        .set_email_reminders(&id, request.enabled)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /students/:id/reminder-preview - The reminder email as this student
/// would receive it.
#[instrument(skip(state))]
pub async fn preview_reminder(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EmailTemplate>, Response> {
    let student = state
        .store
        .student(&id)
        .ok_or_else(|| StatusCode::NOT_FOUND.into_response())?;
    let template = state
        .settings
        .email_template()
        .await
        .map_err(IntoResponse::into_response)?;

    Ok(Json(template.render(&student)))
}

/// GET /students.csv - Export the loaded list.
#[instrument(skip(state))]
pub async fn export_students(State(state): State<AppState>) -> Response {
    match students_csv(&state.store.students()) {
        Ok(csv) => (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"students.csv\"",
                ),
            ],
            csv,
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to export students");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// ============================================================================
// Processes and notifications
// ============================================================================

/// GET /processes - All tracked processes, oldest first.
pub async fn get_processes(State(state): State<AppState>) -> Json<Vec<Process>> {
    Json(state.store.processes())
}

/// GET /notifications - Recent notices, oldest first.
pub async fn get_notifications(State(state): State<AppState>) -> Json<Vec<Notice>> {
    Json(state.notifier.recent())
}

// ============================================================================
// Settings
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    pub cron_jobs: Vec<CronJob>,
    pub template: EmailTemplate,
    pub is_html: bool,
}

/// GET /settings - Scheduled jobs and the reminder template.
#[instrument(skip(state))]
pub async fn get_settings(State(state): State<AppState>) -> ApiResult<Json<SettingsResponse>> {
    let (cron_jobs, template) =
        tokio::try_join!(state.settings.cron_jobs(), state.settings.email_template())?;

    Ok(Json(SettingsResponse {
        cron_jobs,
        is_html: template.is_html(),
        template,
    }))
}

/// PUT /settings/template
#[instrument(skip_all)]
pub async fn save_template(
    State(state): State<AppState>,
    Json(template): Json<EmailTemplate>,
) -> ApiResult<StatusCode> {
    state.settings.save_email_template(&template).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronScheduleRequest {
    pub cron_expression: String,
}

/// PUT /settings/cron/:name - Change a job's schedule.
#[instrument(skip(state))]
pub async fn update_cron_schedule(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<CronScheduleRequest>,
) -> ApiResult<StatusCode> {
    state
        .settings
        .update_cron_schedule(&name, &request.cron_expression)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /settings/cron/:name/:action - `enable`, `disable` or `trigger`.
#[instrument(skip(state))]
pub async fn cron_action(
    State(state): State<AppState>,
    Path((name, action)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    match action.as_str() {
        "enable" => state.settings.set_cron_enabled(&name, true).await?,
        "disable" => state.settings.set_cron_enabled(&name, false).await?,
        "trigger" => state.settings.trigger_cron_job(&name).await?,
        _ => {
            warn!(action = %action, "Unknown cron action");
            return Err(ClientError::validation(format!(
                "Unknown cron action '{action}'"
            )));
        }
    }
    Ok(StatusCode::NO_CONTENT)
}
