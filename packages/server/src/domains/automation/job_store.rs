//! In-memory job registry.
//!
//! Single-process state, no persistence across restarts. Every
//! read-modify-write happens under one lock acquisition with no
//! suspend point, so interleaved pipeline tasks never observe a
//! half-updated record.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::job::{Job, JobStatus};

/// Aggregate counters over the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCounters {
    pub total: usize,
    pub pending: usize,
    pub running: usize,
    pub scheduled_for_publish: usize,
    pub published: usize,
    pub failed: usize,
}

/// Thread-safe in-memory registry of in-flight and historical jobs.
#[derive(Clone, Default)]
pub struct JobStore {
    jobs: Arc<Mutex<HashMap<Uuid, Job>>>,
    active: Arc<Mutex<HashSet<Uuid>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, job: Job) -> Uuid {
        let id = job.id;
        self.jobs.lock().unwrap().insert(id, job);
        id
    }

    pub fn get(&self, id: Uuid) -> Option<Job> {
        self.jobs.lock().unwrap().get(&id).cloned()
    }

    /// Apply a mutation to a job and return the updated record.
    /// Returns `None` when the job was removed (e.g. cancelled), so
    /// callers can stop instead of resurrecting state.
    pub fn modify<F>(&self, id: Uuid, f: F) -> Option<Job>
    where
        F: FnOnce(&mut Job),
    {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs.get_mut(&id)?;
        f(job);
        job.updated_at = Utc::now();
        Some(job.clone())
    }

    pub fn remove(&self, id: Uuid) -> Option<Job> {
        self.active.lock().unwrap().remove(&id);
        self.jobs.lock().unwrap().remove(&id)
    }

    pub fn all(&self) -> Vec<Job> {
        self.jobs.lock().unwrap().values().cloned().collect()
    }

    pub fn by_status(&self, status: JobStatus) -> Vec<Job> {
        self.jobs
            .lock()
            .unwrap()
            .values()
            .filter(|j| j.status == status)
            .cloned()
            .collect()
    }

    pub fn counters(&self) -> JobCounters {
        let jobs = self.jobs.lock().unwrap();
        let count = |s: JobStatus| jobs.values().filter(|j| j.status == s).count();
        JobCounters {
            total: jobs.len(),
            pending: count(JobStatus::Pending),
            running: count(JobStatus::Running),
            scheduled_for_publish: count(JobStatus::ScheduledForPublish),
            published: count(JobStatus::Published),
            failed: count(JobStatus::Failed),
        }
    }

    // Active set: jobs currently inside the pipeline or waiting on a
    // publish timer.

    pub fn mark_active(&self, id: Uuid) {
        self.active.lock().unwrap().insert(id);
    }

    pub fn clear_active(&self, id: Uuid) {
        self.active.lock().unwrap().remove(&id);
    }

    pub fn active_ids(&self) -> Vec<Uuid> {
        self.active.lock().unwrap().iter().copied().collect()
    }
}
