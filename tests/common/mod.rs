//! In-process mock of the tracking backend.
//!
//! Serves the backend's REST routes from an in-memory student list on
//! `127.0.0.1:0`, records every request it sees and can be told to fail any
//! operation.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;

use cftrack::AppState;
use cftrack::config::Config;
use cftrack::remote::BackendClient;

type Reply = (StatusCode, Json<Value>);

#[derive(Default)]
struct Inner {
    students: Vec<Value>,
    next_id: u32,
    requests: Vec<String>,
    failing: HashSet<&'static str>,
    problems: Option<Value>,
    template: Value,
    cron_jobs: Vec<Value>,
}

#[derive(Clone)]
pub struct MockBackend {
    inner: Arc<Mutex<Inner>>,
    pub url: String,
}

pub fn student_record(id: u32, name: &str, handle: &str) -> Value {
    json!({
        "id": id.to_string(),
        "name": name,
        "email": format!("{handle}@example.com"),
        "rating": 1400 + id as i32,
        "maxRating": 1500 + id as i32,
        "codeforcesHandle": handle,
        "phoneNumber": null,
        "emailReminderEnabled": true,
        "reminderEmailCount": 0,
        "lastDataUpdate": "2024-05-01T10:00:00Z",
        "rank": "specialist",
        "maxRank": "expert"
    })
}

fn period(days: u32) -> Value {
    json!({
        "success": true,
        "data": {
            "totalSolved": days,
            "maxRating": 1600,
            "avgRating": 1250.5,
            "avgPerDay": 1.5,
            "ratingDistribution": { "rating800": 2, "rating1200": days },
            "dailySubmissions": [
                { "date": "2024-05-01", "count": 3, "accepted": 2 },
                { "date": "2024-05-02", "count": 1, "accepted": 1 }
            ]
        }
    })
}

/// A well-formed problems response: 7, 30, 90 days and all-time.
pub fn problems_body() -> Value {
    json!([period(7), period(30), period(90), period(365)])
}

impl MockBackend {
    /// Start a backend holding `count` students named `Student 01`,
    /// `Student 02`, ...
    pub async fn start(count: u32) -> Self {
        let students = (1..=count)
            .map(|i| student_record(i, &format!("Student {i:02}"), &format!("coder{i:02}")))
            .collect();

        let inner = Arc::new(Mutex::new(Inner {
            students,
            next_id: count + 1,
            template: json!({
                "subject": "Time to practice, {{studentName}}",
                "body": "<p>Hi {{studentName}}, your rating is {{currentRating}}.</p>"
            }),
            cron_jobs: vec![
                json!({
                    "id": "1",
                    "name": "DATA_SYNC",
                    "cronExpression": "0 2 * * *",
                    "enabled": true,
                    "lastRun": "2024-05-01T02:00:00Z",
                    "nextRun": null
                }),
                json!({
                    "id": "2",
                    "name": "INACTIVITY_CHECK",
                    "cronExpression": "0 3 * * *",
                    "enabled": false
                }),
            ],
            ..Default::default()
        }));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let mock = Self { inner, url };

        let app = Router::new()
            .route("/api/student/students", get(list).post(create))
            .route("/api/student/students/:id", axum::routing::delete(remove))
            .route("/api/student/students/:id/update", put(update))
            .route("/api/student/students/:id/codeforces", put(update_handle))
            .route("/api/student/students/:id/email-reminders", put(reminders))
            .route("/api/student/students/:id/contests", get(contests))
            .route("/api/student/students/:id/problems", get(problems))
            .route(
                "/api/student/emailTemplate",
                get(get_template).put(put_template),
            )
            .route("/api/cron/configs", get(cron_configs))
            .route("/api/cron/:name", put(cron_schedule))
            .route("/api/cron/:name/:action", post(cron_action))
            .with_state(mock.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        mock
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    pub fn client(&self) -> BackendClient {
        BackendClient::new(&self.url)
    }

    pub fn config(&self) -> Config {
        Config {
            backend_url: self.url.clone(),
            port: 0,
            page_size: 10,
            search_debounce: Duration::from_millis(300),
            request_timeout: Duration::from_secs(5),
        }
    }

    pub fn app_state(&self) -> AppState {
        AppState::with_client(self.client(), &self.config())
    }

    /// Make `operation` answer with `success: false` until [`Self::recover`].
    pub fn fail(&self, operation: &'static str) {
        self.lock().failing.insert(operation);
    }

    pub fn recover(&self, operation: &'static str) {
        self.lock().failing.remove(operation);
    }

    /// Replace the problems endpoint's answer.
    pub fn set_problems(&self, body: Value) {
        self.lock().problems = Some(body);
    }

    pub fn requests(&self) -> Vec<String> {
        self.lock().requests.clone()
    }

    /// Number of recorded requests starting with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.lock()
            .requests
            .iter()
            .filter(|r| r.starts_with(prefix))
            .count()
    }

    pub fn student_names(&self) -> Vec<String> {
        self.lock()
            .students
            .iter()
            .map(|s| s["name"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    pub fn template(&self) -> Value {
        self.lock().template.clone()
    }

    pub fn cron_job(&self, name: &str) -> Value {
        self.lock()
            .cron_jobs
            .iter()
            .find(|j| j["name"] == name)
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Record the request; true if the operation should fail.
    fn hit(&self, operation: &'static str, request: String) -> bool {
        let mut inner = self.lock();
        inner.requests.push(request);
        inner.failing.contains(operation)
    }
}

fn ok(data: Value) -> Reply {
    (StatusCode::OK, Json(json!({ "success": true, "data": data })))
}

fn failure(message: &str) -> Reply {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "message": message })),
    )
}

fn not_found() -> Reply {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "message": "Student not found" })),
    )
}

fn matches(student: &Value, search: &str) -> bool {
    ["name", "codeforcesHandle", "email"].iter().any(|field| {
        student[*field]
            .as_str()
            .is_some_and(|v| v.to_lowercase().contains(search))
    })
}

#[derive(Deserialize)]
struct ListQuery {
    page: u32,
    limit: u32,
    #[serde(default)]
    search: String,
}

async fn list(State(mock): State<MockBackend>, Query(q): Query<ListQuery>) -> Reply {
    if mock.hit("list", format!("list page={} search={}", q.page, q.search)) {
        return failure("Failed to fetch students");
    }

    let inner = mock.lock();
    let matching: Vec<Value> = inner
        .students
        .iter()
        .filter(|s| q.search.is_empty() || matches(s, &q.search))
        .cloned()
        .collect();
    let limit = q.limit.max(1) as usize;
    let total = matching.len();
    let total_pages = total.div_ceil(limit).max(1);
    let students: Vec<Value> = matching
        .into_iter()
        .skip((q.page.max(1) as usize - 1) * limit)
        .take(limit)
        .collect();

    ok(json!({
        "students": students,
        "total": total,
        "page": q.page,
        "totalPages": total_pages
    }))
}

async fn create(State(mock): State<MockBackend>, Json(body): Json<Value>) -> Reply {
    if mock.hit("create", format!("create {}", body["codeforcesHandle"])) {
        return failure("Codeforces handle not found");
    }

    let mut inner = mock.lock();
    let id = inner.next_id;
    inner.next_id += 1;

    let mut record = student_record(
        id,
        body["name"].as_str().unwrap_or_default(),
        body["codeforcesHandle"].as_str().unwrap_or_default(),
    );
    record["email"] = body["email"].clone();
    record["phoneNumber"] = body["phoneNumber"].clone();
    inner.students.push(record.clone());

    (
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": record })),
    )
}

fn with_student(mock: &MockBackend, id: &str, edit: impl FnOnce(&mut Value)) -> Reply {
    let mut inner = mock.lock();
    match inner.students.iter_mut().find(|s| s["id"] == id) {
        Some(student) => {
            edit(student);
            ok(student.clone())
        }
        None => not_found(),
    }
}

async fn update(
    State(mock): State<MockBackend>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    if mock.hit("update", format!("update {id}")) {
        return failure("Failed to update student");
    }
    with_student(&mock, &id, |s| {
        s["name"] = body["name"].clone();
        s["email"] = body["email"].clone();
        s["phoneNumber"] = body["phoneNumber"].clone();
    })
}

async fn update_handle(
    State(mock): State<MockBackend>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    if mock.hit("handle", format!("handle {id} {}", body["codeforcesHandle"])) {
        return failure("Codeforces handle not found");
    }
    with_student(&mock, &id, |s| {
        s["codeforcesHandle"] = body["codeforcesHandle"].clone();
        s["rating"] = json!(1900);
        s["maxRating"] = json!(2000);
    })
}

async fn remove(State(mock): State<MockBackend>, Path(id): Path<String>) -> Reply {
    if mock.hit("delete", format!("delete {id}")) {
        return failure("Failed to delete student");
    }
    let mut inner = mock.lock();
    let before = inner.students.len();
    inner.students.retain(|s| s["id"] != id.as_str());
    if inner.students.len() == before {
        return not_found();
    }
    (
        StatusCode::OK,
        Json(json!({ "success": true, "message": "Student deleted" })),
    )
}

async fn reminders(
    State(mock): State<MockBackend>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    if mock.hit("reminders", format!("reminders {id} {}", body["enabled"])) {
        return failure("Failed to update preference");
    }
    with_student(&mock, &id, |s| {
        s["emailReminderEnabled"] = body["enabled"].clone();
    })
}

#[derive(Deserialize)]
struct DaysQuery {
    days: u32,
}

async fn contests(
    State(mock): State<MockBackend>,
    Path(id): Path<String>,
    Query(q): Query<DaysQuery>,
) -> Reply {
    if mock.hit("contests", format!("contests {id} days={}", q.days)) {
        return failure("Failed to fetch contests");
    }
    ok(json!({
        "contests": [
            {
                "name": "Codeforces Round 900",
                "rank": 1200,
                "oldRating": 1400,
                "newRating": 1450,
                "ratingChange": 50,
                "problemsSolved": 3,
                "totalProblems": 6,
                "contestTime": "2024-04-20T14:35:00Z"
            },
            {
                "name": "Educational Round 160",
                "rank": 800,
                "oldRating": 1450,
                "newRating": 1510,
                "ratingChange": 60,
                "problemsSolved": 4,
                "totalProblems": 7,
                "contestTime": "2024-05-10T14:35:00Z"
            }
        ],
        "ratingData": [
            { "date": "2024-04-20", "rating": 1450 },
            { "date": "2024-05-10", "rating": 1510 }
        ],
        "totalContests": 2,
        "averageChange": 55.0
    }))
}

async fn problems(
    State(mock): State<MockBackend>,
    Path(id): Path<String>,
    Query(q): Query<DaysQuery>,
) -> (StatusCode, Json<Value>) {
    if mock.hit("problems", format!("problems {id} days={}", q.days)) {
        return failure("Failed to fetch problems");
    }
    let body = mock.lock().problems.clone().unwrap_or_else(problems_body);
    (StatusCode::OK, Json(body))
}

async fn get_template(State(mock): State<MockBackend>) -> Reply {
    if mock.hit("template", "template get".to_string()) {
        return failure("Failed to fetch template");
    }
    let template = mock.lock().template.clone();
    ok(template)
}

async fn put_template(State(mock): State<MockBackend>, Json(body): Json<Value>) -> Reply {
    if mock.hit("template", "template put".to_string()) {
        return failure("Failed to save template");
    }
    mock.lock().template = body;
    (
        StatusCode::OK,
        Json(json!({ "success": true, "message": "Template saved" })),
    )
}

async fn cron_configs(State(mock): State<MockBackend>) -> Reply {
    if mock.hit("cron", "cron configs".to_string()) {
        return failure("Failed to fetch cron jobs");
    }
    let jobs = mock.lock().cron_jobs.clone();
    ok(Value::Array(jobs))
}

fn with_job(mock: &MockBackend, name: &str, edit: impl FnOnce(&mut Value)) -> Reply {
    let mut inner = mock.lock();
    match inner.cron_jobs.iter_mut().find(|j| j["name"] == name) {
        Some(job) => {
            edit(job);
            ok(job.clone())
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "message": "Job not found" })),
        ),
    }
}

async fn cron_schedule(
    State(mock): State<MockBackend>,
    Path(name): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    if mock.hit("cron", format!("cron schedule {name}")) {
        return failure("Failed to update schedule");
    }
    with_job(&mock, &name, |j| {
        j["cronExpression"] = body["cronExpression"].clone();
    })
}

async fn cron_action(
    State(mock): State<MockBackend>,
    Path((name, action)): Path<(String, String)>,
) -> Reply {
    if mock.hit("cron", format!("cron {action} {name}")) {
        return failure("Cron action failed");
    }
    with_job(&mock, &name, |j| match action.as_str() {
        "enable" => j["enabled"] = json!(true),
        "disable" => j["enabled"] = json!(false),
        _ => {}
    })
}
