//! Outstanding-job registry.
//!
//! A concurrent table keyed by the [`JobId`] the remote service assigned
//! when an operation was issued. Every operation is individually atomic;
//! callers never need synchronization of their own. Restart after a
//! reconnect is many atomic per-entry steps, not one transaction: each
//! entry is removed first and only a successful removal is re-issued, so a
//! job completing mid-restart is never replayed.

use std::sync::Arc;

use dashmap::DashMap;
use logging::LogSink;
use relaybot_core::{CommandContext, JobId};

const COMPONENT: &str = "Job Manager";

/// The issuing capability stored for every tracked job.
///
/// Invoking it performs the network call and returns the id the service
/// assigned. By contract the issue has already happened by the time it
/// returns: the id exists remotely before the table ever sees it.
pub type IssueFn = Arc<dyn Fn() -> JobId + Send + Sync>;

/// What the registry keeps per outstanding operation: the re-issue
/// capability plus optional diagnostic attribution.
#[derive(Clone)]
pub struct JobDescriptor {
    pub action: IssueFn,
    pub context: Option<CommandContext>,
}

/// Concurrent map of outstanding operations, owned by the session manager
/// and shared by reference with every caller.
pub struct JobRegistry {
    jobs: DashMap<JobId, JobDescriptor>,
    log: Arc<LogSink>,
}

impl JobRegistry {
    pub fn new(log: Arc<LogSink>) -> Self {
        Self {
            jobs: DashMap::new(),
            log,
        }
    }

    /// Issue an operation and start tracking it.
    ///
    /// `action` is invoked exactly once, synchronously. The id it returns
    /// is tracked unless an entry for that id already exists; the duplicate
    /// is a silent no-op because id uniqueness is the network layer's
    /// contract, not ours. Returns the id either way.
    pub fn add_job(&self, action: IssueFn) -> JobId {
        self.insert(action, None)
    }

    /// Like [`Self::add_job`], additionally recording where the job came
    /// from so a later diagnostic can name the originating command.
    pub fn add_job_with_context(&self, action: IssueFn, context: CommandContext) -> JobId {
        self.insert(action, Some(context))
    }

    fn insert(&self, action: IssueFn, context: Option<CommandContext>) -> JobId {
        let job_id = action();

        match &context {
            Some(ctx) => self
                .log
                .write_debug(COMPONENT, &format!("New job: {job_id} ({})", ctx.message)),
            None => self.log.write_debug(COMPONENT, &format!("New job: {job_id}")),
        }

        self.jobs.entry(job_id).or_insert(JobDescriptor { action, context });

        job_id
    }

    /// Stop tracking `job_id`, returning whether it was still pending.
    /// Absence is a normal outcome, not an error; concurrent removals of
    /// the same id yield exactly one `true`.
    pub fn try_remove_job(&self, job_id: JobId) -> bool {
        self.take_job(job_id).is_some()
    }

    /// Removal that hands back the descriptor, for callers that want the
    /// originating context of a completed job.
    pub fn take_job(&self, job_id: JobId) -> Option<JobDescriptor> {
        let (_, descriptor) = self.jobs.remove(&job_id)?;

        self.log.write_debug(
            COMPONENT,
            &format!("Removed job: {job_id} ({} jobs left)", self.jobs.len()),
        );

        Some(descriptor)
    }

    /// Point-in-time count of outstanding jobs. May be stale under
    /// concurrent mutation; observability only.
    pub fn jobs_count(&self) -> usize {
        self.jobs.len()
    }

    /// Re-issue every job still pending, obtaining fresh ids.
    ///
    /// Works over a snapshot of the keys. Each entry is removed before
    /// being re-issued; the removal is the single point of truth for
    /// "still mine to reissue", so an entry completed by a concurrent
    /// caller is skipped rather than replayed. A job's old id is never
    /// reused; the new id is whatever the re-invoked action returns.
    pub fn restart_jobs_if_any(&self) {
        if self.jobs.is_empty() {
            return;
        }

        self.log
            .write_info(COMPONENT, &format!("Restarting {} jobs", self.jobs.len()));

        let pending: Vec<JobId> = self.jobs.iter().map(|entry| *entry.key()).collect();
        for job_id in pending {
            let Some(descriptor) = self.take_job(job_id) else {
                // Completed while we were iterating.
                continue;
            };

            match descriptor.context {
                Some(context) => {
                    self.add_job_with_context(descriptor.action, context);
                }
                None => {
                    self.add_job(descriptor.action);
                }
            }
        }
    }
}
