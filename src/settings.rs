//! Scheduled jobs and the reminder email template.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, instrument, warn};

use crate::error::{ClientError, Result};
use crate::model::{CronJob, EmailTemplate, Student};
use crate::notify::Notifier;
use crate::remote::BackendClient;

/// An opening or closing tag such as `<p>`, `</div>` or `<br/>`.
static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?[a-z][^>]*>").expect("tag regex should be valid"));

/// A named entity such as `&nbsp;`.
static HTML_ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&[A-Za-z][A-Za-z0-9]*;").expect("entity regex should be valid")
});

/// Check that a cron expression has exactly five whitespace-separated fields.
pub fn is_valid_cron_expression(expression: &str) -> bool {
    expression.split_whitespace().count() == 5
}

impl EmailTemplate {
    /// Placeholders the backend substitutes when sending a reminder.
    pub const PLACEHOLDERS: [&'static str; 6] = [
        "{{studentName}}",
        "{{currentRating}}",
        "{{maxRating}}",
        "{{lastActivity}}",
        "{{codeforcesHandle}}",
        "{{email}}",
    ];

    /// Whether the body looks like HTML: contains a tag or a named entity.
    pub fn is_html(&self) -> bool {
        HTML_TAG.is_match(&self.body) || HTML_ENTITY.is_match(&self.body)
    }

    /// Fill in the placeholders for a preview of what `student` would
    /// receive.
    pub fn render(&self, student: &Student) -> EmailTemplate {
        let last_activity = student
            .submissions
            .iter()
            .map(|s| s.date)
            .max()
            .map(|d| d.format("%b %-d, %Y").to_string())
            .unwrap_or_else(|| "Never".to_string());

        let values = [
            student.name.clone(),
            student.current_rating.to_string(),
            student.max_rating.to_string(),
            last_activity,
            student.codeforces_handle.clone(),
            student.email.clone(),
        ];

        let fill = |text: &str| {
            Self::PLACEHOLDERS
                .iter()
                .zip(&values)
                .fold(text.to_string(), |acc, (key, value)| acc.replace(key, value))
        };

        EmailTemplate {
            subject: fill(&self.subject),
            body: fill(&self.body),
        }
    }
}

/// Settings view operations.
#[derive(Clone)]
pub struct Settings {
    client: BackendClient,
    notifier: Notifier,
}

impl Settings {
    pub fn new(client: BackendClient, notifier: Notifier) -> Self {
        Self { client, notifier }
    }

    #[instrument(skip(self))]
    pub async fn cron_jobs(&self) -> Result<Vec<CronJob>> {
        self.client.cron_jobs().await.inspect_err(|e| {
            warn!(error = %e, "Failed to fetch cron jobs");
            self.notifier.error("Failed to fetch cron jobs", None);
        })
    }

    /// Change a job's schedule. The expression is validated before any
    /// request is made.
    #[instrument(skip(self))]
    pub async fn update_cron_schedule(&self, name: &str, cron_expression: &str) -> Result<()> {
        if !is_valid_cron_expression(cron_expression) {
            let e = ClientError::validation(format!(
                "Invalid cron expression '{cron_expression}': expected 5 fields"
            ));
            self.notifier.error(e.to_string(), None);
            return Err(e);
        }

        let result = self
            .client
            .update_cron_schedule(name, cron_expression.trim())
            .await;
        self.report(result, "Schedule updated successfully!", "Failed to update schedule")
    }

    #[instrument(skip(self))]
    pub async fn set_cron_enabled(&self, name: &str, enabled: bool) -> Result<()> {
        let result = self.client.set_cron_enabled(name, enabled).await;
        let (ok, failed) = if enabled {
            ("Job enabled successfully!", "Failed to enable job")
        } else {
            ("Job disabled successfully!", "Failed to disable job")
        };
        self.report(result, ok, failed)
    }

    #[instrument(skip(self))]
    pub async fn trigger_cron_job(&self, name: &str) -> Result<()> {
        let result = self.client.trigger_cron_job(name).await;
        self.report(result, "Job triggered successfully!", "Failed to trigger job")
    }

    #[instrument(skip(self))]
    pub async fn email_template(&self) -> Result<EmailTemplate> {
        self.client.email_template().await.inspect_err(|e| {
            warn!(error = %e, "Failed to fetch email template");
            self.notifier.error("Error fetching email template", None);
        })
    }

    #[instrument(skip_all)]
    pub async fn save_email_template(&self, template: &EmailTemplate) -> Result<()> {
        let result = self.client.save_email_template(template).await;
        self.report(
            result,
            "Email template saved successfully!",
            "Failed to save email template",
        )
    }

    fn report(&self, result: Result<()>, ok: &str, failed: &str) -> Result<()> {
        match &result {
            Ok(()) => {
                info!("{ok}");
                self.notifier.success(ok);
            }
            Err(e) => {
                warn!(error = %e, "{failed}");
                self.notifier.error(failed, Some(&e.to_string()));
            }
        }
        result
    }
}
