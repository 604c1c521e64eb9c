//! In-memory entity store.
//!
//! The store is the single source of truth for views: the currently loaded
//! page of students and the list of background operations. It starts empty
//! and is never reset implicitly.
//!
//! Every mutation is one synchronous update of a `tokio::sync::watch`
//! channel, so it is atomic with respect to other store calls and visible to
//! subscribers immediately. Nothing spans more than one call: a sequence such
//! as "start process, call backend, finish process, merge student" can be
//! observed half-done.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use crate::model::{Process, ProcessId, ProcessPatch, Student, StudentPatch};

/// Everything the store holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreState {
    pub students: Vec<Student>,
    pub processes: Vec<Process>,
}

/// Shared handle to the entity store. Clones share the same state.
#[derive(Clone)]
pub struct Store {
    state: Arc<watch::Sender<StoreState>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Create an empty store.
    pub fn new() -> Self {
        let (state, _) = watch::channel(StoreState::default());
        Self {
            state: Arc::new(state),
        }
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    /// Copy of the whole state.
    pub fn snapshot(&self) -> StoreState {
        self.state.borrow().clone()
    }

    // ------------------------------------------------------------------------
    // Students
    // ------------------------------------------------------------------------

    pub fn students(&self) -> Vec<Student> {
        self.state.borrow().students.clone()
    }

    pub fn student(&self, id: &str) -> Option<Student> {
        self.state
            .borrow()
            .students
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }

    /// Replace the student list.
    pub fn set_students(&self, students: Vec<Student>) {
        self.state.send_modify(|state| state.students = students);
    }

    /// Append one student.
    pub fn add_student(&self, student: Student) {
        self.state.send_modify(|state| state.students.push(student));
    }

    /// Merge `patch` into the student with `id`. Returns `false` (and notifies
    /// nobody) when no such student is loaded.
    pub fn update_student(&self, id: &str, patch: StudentPatch) -> bool {
        self.state.send_if_modified(|state| {
            match state.students.iter_mut().find(|s| s.id == id) {
                Some(student) => {
                    student.apply(patch);
                    true
                }
                None => false,
            }
        })
    }

    /// Remove the student with `id`, keeping the order of the rest.
    pub fn delete_student(&self, id: &str) -> bool {
        self.state.send_if_modified(|state| {
            let before = state.students.len();
            state.students.retain(|s| s.id != id);
            state.students.len() != before
        })
    }

    // ------------------------------------------------------------------------
    // Processes
    // ------------------------------------------------------------------------

    pub fn processes(&self) -> Vec<Process> {
        self.state.borrow().processes.clone()
    }

    pub fn active_processes(&self) -> Vec<Process> {
        self.state
            .borrow()
            .processes
            .iter()
            .filter(|p| p.is_active())
            .cloned()
            .collect()
    }

    /// Replace the process list.
    pub fn set_processes(&self, processes: Vec<Process>) {
        self.state.send_modify(|state| state.processes = processes);
    }

    /// Append one process.
    pub fn push_process(&self, process: Process) {
        self.state.send_modify(|state| state.processes.push(process));
    }

    /// Merge `patch` into the process with `id`.
    pub fn update_process(&self, id: ProcessId, patch: ProcessPatch) -> bool {
        self.state.send_if_modified(|state| {
            match state.processes.iter_mut().find(|p| p.id == id) {
                Some(process) => {
                    process.apply(patch);
                    true
                }
                None => false,
            }
        })
    }

    pub fn remove_process(&self, id: ProcessId) -> bool {
        self.state.send_if_modified(|state| {
            let before = state.processes.len();
            state.processes.retain(|p| p.id != id);
            state.processes.len() != before
        })
    }
}
