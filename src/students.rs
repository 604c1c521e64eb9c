//! Student operations.
//!
//! Reads push their results into the [`Store`]. Mutations validate their
//! input first, then run as tracked processes, merge the backend's answer
//! into the store and publish a notice either way.
//!
//! Concurrent operations are not coordinated: each writes its result into
//! the store when it completes, so the last response to arrive wins.

use tracing::{info, instrument, warn};

use crate::error::{ClientError, Result};
use crate::model::{
    ContestHistory, NewStudent, Period, PeriodStats, PaginationCursor, Student, StudentEdit,
    StudentPatch,
};
use crate::notify::Notifier;
use crate::remote::BackendClient;
use crate::remote::wire::{self, CreateStudentBody, UpdateStudentBody};
use crate::store::Store;
use crate::tracker::OperationTracker;

/// Default window, in days, for the contests request of a profile load.
/// `0` asks for the full history.
pub const PROFILE_CONTEST_DAYS: u32 = 0;

/// Default window, in days, for the problems request of a profile load.
pub const PROFILE_PROBLEM_DAYS: u32 = 30;

const REQUIRED_FIELDS: &str = "All fields are required";

fn trimmed(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl NewStudent {
    /// Validate and normalize into the create request body.
    ///
    /// Name and handle are required. A blank email defaults to
    /// `{handle}@gmail.com`; a blank phone is sent as null.
    pub fn to_request(&self) -> Result<CreateStudentBody> {
        let (Some(name), Some(handle)) = (trimmed(&self.name), trimmed(&self.codeforces_handle))
        else {
            return Err(ClientError::validation(REQUIRED_FIELDS));
        };

        Ok(CreateStudentBody {
            email: trimmed(&self.email).unwrap_or_else(|| format!("{handle}@gmail.com")),
            name,
            phone_number: trimmed(&self.phone),
            codeforces_handle: handle,
        })
    }
}

impl StudentEdit {
    /// Validate and normalize. Name, email and handle are required.
    fn to_request(&self) -> Result<(UpdateStudentBody, String)> {
        let (Some(name), Some(email), Some(handle)) = (
            trimmed(&self.name),
            trimmed(&self.email),
            trimmed(&self.codeforces_handle),
        ) else {
            return Err(ClientError::validation(REQUIRED_FIELDS));
        };

        let body = UpdateStudentBody {
            email,
            name,
            phone_number: trimmed(&self.phone),
        };
        Ok((body, handle))
    }
}

/// Student reads and mutations against the backend.
#[derive(Clone)]
pub struct Students {
    client: BackendClient,
    store: Store,
    tracker: OperationTracker,
    notifier: Notifier,
}

impl Students {
    pub fn new(
        client: BackendClient,
        store: Store,
        tracker: OperationTracker,
        notifier: Notifier,
    ) -> Self {
        Self {
            client,
            store,
            tracker,
            notifier,
        }
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// Fetch one page, replace the store's student list with it and return
    /// the new cursor.
    #[instrument(skip(self))]
    pub async fn fetch_page(&self, page: u32, limit: u32, search: &str) -> Result<PaginationCursor> {
        let result = self.client.list_students(page, limit, search).await;
        let page = result.inspect_err(|e| warn!(error = %e, "Failed to fetch students"))?;

        info!(
            count = page.students.len(),
            page = page.cursor.page,
            total = page.cursor.total,
            "Students loaded"
        );
        self.store.set_students(page.students);
        Ok(page.cursor)
    }

    /// Fetch contest history and attach it to the student.
    #[instrument(skip(self))]
    pub async fn fetch_contests(&self, id: &str, days: u32) -> Result<ContestHistory> {
        let history = self
            .client
            .student_contests(id, days)
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to fetch student contests"))?;

        self.store.update_student(
            id,
            StudentPatch {
                contests: Some(history.contests.clone()),
                ..Default::default()
            },
        );
        Ok(history)
    }

    /// Fetch problem statistics and attach them to the student, together
    /// with problems and submissions derived from the 30-day window.
    ///
    /// A malformed response leaves the student untouched.
    #[instrument(skip(self))]
    pub async fn fetch_problems(&self, id: &str, days: u32) -> Result<PeriodStats> {
        let stats = self
            .client
            .student_problems(id, days)
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to fetch student problems"))?;

        let daily = stats
            .get(Period::Days30)
            .map(|s| s.daily_submissions.as_slice())
            .unwrap_or_default();

        self.store.update_student(
            id,
            StudentPatch {
                problems: Some(wire::map_problems(daily)),
                submissions: Some(wire::map_submissions(daily)),
                problem_stats: Some(stats.clone()),
                ..Default::default()
            },
        );
        Ok(stats)
    }

    /// Load contests and problems concurrently and return the enriched
    /// student, if it is in the store. Fetch failures are logged and do not
    /// prevent the other fetch from landing.
    pub async fn load_profile(&self, id: &str) -> Option<Student> {
        let (contests, problems) = tokio::join!(
            self.fetch_contests(id, PROFILE_CONTEST_DAYS),
            self.fetch_problems(id, PROFILE_PROBLEM_DAYS),
        );

        if contests.is_err() || problems.is_err() {
            warn!(student_id = %id, "Profile loaded partially");
        }

        self.store.student(id)
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    fn reject(&self, error: ClientError) -> ClientError {
        self.notifier.error(error.to_string(), None);
        error
    }

    /// Create a student and append it to the store.
    #[instrument(skip_all, fields(handle = %input.codeforces_handle))]
    pub async fn add_student(&self, input: NewStudent) -> Result<Student> {
        let body = input.to_request().map_err(|e| self.reject(e))?;
        let name = body.name.clone();

        self.notifier
            .info(format!("Adding {name}"), Some("This may take a few seconds"));

        let result = self
            .tracker
            .run(format!("Adding {name}"), self.client.create_student(&body))
            .await;

        match result {
            Ok(student) => {
                info!(student_id = %student.id, "Student added");
                self.store.add_student(student.clone());
                self.notifier.success(format!("Added {name}"));
                Ok(student)
            }
            Err(e) => {
                warn!(error = %e, "Failed to add student");
                self.notifier.error(
                    format!("Failed to add student {e}"),
                    Some("Please try again later"),
                );
                Err(e)
            }
        }
    }

    /// Update a student's contact fields and, when it changed, the
    /// Codeforces handle. The backend's final answer is merged into the
    /// store.
    #[instrument(skip(self, edit))]
    pub async fn edit_student(&self, id: &str, edit: StudentEdit) -> Result<Student> {
        let (body, handle) = edit.to_request().map_err(|e| self.reject(e))?;
        let current = self
            .store
            .student(id)
            .ok_or_else(|| self.reject(ClientError::validation(format!("Unknown student {id}"))))?;
        let name = body.name.clone();

        self.notifier
            .info(format!("Editing {name}"), Some("This may take a few seconds"));

        let operation = async {
            let mut student = self.client.update_student(id, &body).await?;
            if handle != current.codeforces_handle {
                self.notifier.info(
                    format!("Updating Codeforces Handle for {name}"),
                    Some("This may take a few seconds"),
                );
                student = self.client.update_handle(id, &handle).await?;
            }
            Ok(student)
        };

        match self.tracker.run(format!("Editing {name}"), operation).await {
            Ok(student) => {
                self.store
                    .update_student(id, StudentPatch::backend_fields(student.clone()));
                self.notifier.success(format!("Updated {name}"));
                Ok(self.store.student(id).unwrap_or(student))
            }
            Err(e) => {
                warn!(error = %e, "Failed to edit student");
                self.notifier.error("Failed to edit student", Some(&e.to_string()));
                Err(e)
            }
        }
    }

    /// Delete a student and remove it from the store.
    #[instrument(skip(self))]
    pub async fn delete_student(&self, id: &str) -> Result<()> {
        let result = self
            .tracker
            .run(
                format!("Deleting Student with Id: {id}"),
                self.client.delete_student(id),
            )
            .await;

        match result {
            Ok(()) => {
                self.store.delete_student(id);
                self.notifier.success("Student deleted successfully");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to delete student");
                self.notifier.error("Failed to delete student", Some(&e.to_string()));
                Err(e)
            }
        }
    }

    /// Enable or disable reminder emails for a student.
    #[instrument(skip(self))]
    pub async fn set_email_reminders(&self, id: &str, enabled: bool) -> Result<()> {
        let name = self
            .store
            .student(id)
            .map(|s| s.name)
            .unwrap_or_else(|| id.to_string());

        let result = self
            .tracker
            .run(
                format!("Modifying Email Reminders for {name}"),
                self.client.set_email_reminders(id, enabled),
            )
            .await;

        match result {
            Ok(()) => {
                self.store.update_student(
                    id,
                    StudentPatch {
                        emails_disabled: Some(!enabled),
                        ..Default::default()
                    },
                );
                let state = if enabled { "enabled" } else { "disabled" };
                self.notifier
                    .success(format!("Email reminders {state} successfully!"));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to update email reminder preference");
                self.notifier.error(
                    "Failed to update email reminder preference",
                    Some(&e.to_string()),
                );
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_student_requires_name_and_handle() {
        let input = NewStudent {
            name: "  ".to_string(),
            codeforces_handle: "tourist".to_string(),
            ..Default::default()
        };

        assert!(input.to_request().unwrap_err().is_validation());
    }

    #[test]
    fn test_new_student_defaults_email_and_phone() {
        let input = NewStudent {
            name: " Gennady ".to_string(),
            email: String::new(),
            phone: "   ".to_string(),
            codeforces_handle: " tourist ".to_string(),
        };

        let body = input.to_request().unwrap();

        assert_eq!(body.name, "Gennady");
        assert_eq!(body.email, "tourist@gmail.com");
        assert_eq!(body.phone_number, None);
        assert_eq!(body.codeforces_handle, "tourist");
    }

    #[test]
    fn test_edit_requires_email() {
        let edit = StudentEdit {
            name: "Alice".to_string(),
            email: String::new(),
            phone: String::new(),
            codeforces_handle: "alice".to_string(),
        };

        assert!(edit.to_request().unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn test_validation_failure_skips_process() {
        let store = Store::new();
        let notifier = Notifier::new();
        let students = Students::new(
            // Nothing listens here; validation must fail before any request.
            BackendClient::new("http://127.0.0.1:9"),
            store.clone(),
            OperationTracker::new(store.clone()),
            notifier.clone(),
        );

        let err = students.add_student(NewStudent::default()).await.unwrap_err();

        assert!(err.is_validation());
        assert!(store.processes().is_empty());
        assert_eq!(notifier.recent().len(), 1);
    }
}
