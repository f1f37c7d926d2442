//! Run-after dependency graph over a snapshot of jobs.
//!
//! Jobs form a forest through `parent_id`. This module answers which jobs may
//! become a job's parent without closing a cycle, and which job at the top of
//! a chain owns the schedule. Every traversal is iterative with a visited set,
//! so cyclic or dangling data in the snapshot cannot make it loop.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::errors::RunAfterError;
use crate::models::{Job, JobId};

// ---------------------------------------------------------------------------
// JobIndex
// ---------------------------------------------------------------------------

/// Id lookup over a job snapshot. When ids repeat, the first job wins.
pub struct JobIndex<'a> {
    jobs: &'a [Job],
    by_id: HashMap<&'a JobId, &'a Job>,
}

impl<'a> JobIndex<'a> {
    pub fn new(jobs: &'a [Job]) -> Self {
        let mut by_id = HashMap::with_capacity(jobs.len());
        for job in jobs {
            if let Some(id) = job.id.as_ref() {
                by_id.entry(id).or_insert(job);
            }
        }
        Self { jobs, by_id }
    }

    pub fn get(&self, id: &JobId) -> Option<&'a Job> {
        self.by_id.get(id).copied()
    }

    pub fn jobs(&self) -> &'a [Job] {
        self.jobs
    }

    /// Number of distinct ids.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn find_by_name(&self, name: &str) -> Option<&'a Job> {
        self.jobs.iter().find(|j| j.name == name)
    }

    /// Look a job up by id, falling back to its name.
    pub fn resolve(&self, key: &str) -> Option<&'a Job> {
        self.get(&JobId::from(key))
            .or_else(|| self.find_by_name(key))
    }

    /// Direct children, in snapshot order.
    pub fn children_of(&self, job: &Job) -> Vec<&'a Job> {
        match job.id.as_ref() {
            Some(id) => self
                .jobs
                .iter()
                .filter(|j| j.parent_id.as_ref() == Some(id))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn descendants(&self, job: &Job) -> Vec<&'a Job> {
        descendants(job, self.jobs)
    }

    pub fn candidate_parents(&self, job: Option<&Job>) -> Vec<&'a Job> {
        candidate_parents(job, self.jobs)
    }

    pub fn find_root(&self, start: &'a Job) -> &'a Job {
        find_root(start, self)
    }

    pub fn effective_schedule(&self, job: &'a Job) -> Option<&'a str> {
        effective_schedule(job, self)
    }
}

// ---------------------------------------------------------------------------
// Candidate selection
// ---------------------------------------------------------------------------

fn child_index(all_jobs: &[Job]) -> HashMap<&JobId, Vec<&Job>> {
    let mut children: HashMap<&JobId, Vec<&Job>> = HashMap::new();
    for job in all_jobs {
        if let Some(parent) = job.parent_id.as_ref() {
            children.entry(parent).or_default().push(job);
        }
    }
    children
}

/// Every job whose parent chain reaches `job`, in breadth-first order.
///
/// Each id is expanded at most once, so a cycle in the snapshot ends the walk
/// instead of looping. An unsaved job (no id) has no descendants.
pub fn descendants<'a>(job: &Job, all_jobs: &'a [Job]) -> Vec<&'a Job> {
    let Some(start) = job.id.as_ref() else {
        return Vec::new();
    };

    let children = child_index(all_jobs);
    let mut visited: HashSet<&JobId> = HashSet::from([start]);
    let mut queue: VecDeque<&JobId> = VecDeque::from([start]);
    let mut found = Vec::new();

    while let Some(id) = queue.pop_front() {
        let Some(kids) = children.get(id) else {
            continue;
        };
        for &child in kids {
            match child.id.as_ref() {
                Some(child_id) => {
                    if visited.insert(child_id) {
                        found.push(child);
                        queue.push_back(child_id);
                    } else {
                        tracing::warn!(
                            "Job {} reached twice while collecting descendants of {}; snapshot contains a cycle",
                            child.label(),
                            job.label()
                        );
                    }
                }
                None => found.push(child),
            }
        }
    }

    found
}

/// Jobs that may be chosen as `job`'s run-after parent, in snapshot order.
///
/// Excludes `job` itself and all of its descendants; choosing any of those
/// would create a cycle. With no job (create mode) every job is a candidate.
pub fn candidate_parents<'a>(job: Option<&Job>, all_jobs: &'a [Job]) -> Vec<&'a Job> {
    let Some(job) = job else {
        return all_jobs.iter().collect();
    };

    let mut excluded: HashSet<&JobId> = descendants(job, all_jobs)
        .into_iter()
        .filter_map(|j| j.id.as_ref())
        .collect();
    if let Some(id) = job.id.as_ref() {
        excluded.insert(id);
    }

    let candidates: Vec<&Job> = all_jobs
        .iter()
        .filter(|j| j.id.as_ref().map_or(true, |id| !excluded.contains(id)))
        .collect();

    tracing::debug!(
        "{} of {} jobs are run-after candidates for {}",
        candidates.len(),
        all_jobs.len(),
        job.label()
    );

    candidates
}

/// Check that `parent` is a legal run-after parent for `job`.
pub fn validate_parent_choice(
    job: Option<&Job>,
    parent: &JobId,
    all_jobs: &[Job],
) -> Result<(), RunAfterError> {
    if !all_jobs.iter().any(|j| j.id.as_ref() == Some(parent)) {
        return Err(RunAfterError::NotFound(format!("Parent job {}", parent)));
    }

    let allowed = candidate_parents(job, all_jobs)
        .iter()
        .any(|j| j.id.as_ref() == Some(parent));
    if allowed {
        Ok(())
    } else {
        Err(RunAfterError::Validation(format!(
            "Job {} cannot run after itself or one of its descendants",
            parent
        )))
    }
}

// ---------------------------------------------------------------------------
// Ancestry
// ---------------------------------------------------------------------------

/// Follow `parent_id` links from `start` up to the job that owns the schedule.
///
/// Stops at a job with no parent, at a parent id missing from the index
/// (returning the last job found), or when an id repeats. Each step visits a
/// new indexed id, so the walk takes at most `index.len() + 1` steps.
pub fn find_root<'a>(start: &'a Job, index: &JobIndex<'a>) -> &'a Job {
    let mut current = start;
    let mut visited: HashSet<&JobId> = HashSet::with_capacity(index.len() + 1);
    if let Some(id) = start.id.as_ref() {
        visited.insert(id);
    }

    while let Some(parent_id) = current.parent_id.as_ref() {
        if !visited.insert(parent_id) {
            tracing::warn!(
                "Cycle in run-after chain of {} at job {}",
                start.label(),
                parent_id
            );
            break;
        }
        match index.get(parent_id) {
            Some(parent) => current = parent,
            None => {
                tracing::debug!(
                    "Parent {} of {} not found; stopping ancestry walk",
                    parent_id,
                    current.label()
                );
                break;
            }
        }
    }

    current
}

/// Parents of `job`, nearest first, with the same stopping rules as
/// [`find_root`]. The last entry (if any) is the root.
pub fn ancestors<'a>(job: &'a Job, index: &JobIndex<'a>) -> Vec<&'a Job> {
    let mut chain = Vec::new();
    let mut current = job;
    let mut visited: HashSet<&JobId> = HashSet::with_capacity(index.len() + 1);
    if let Some(id) = job.id.as_ref() {
        visited.insert(id);
    }

    while let Some(parent_id) = current.parent_id.as_ref() {
        if !visited.insert(parent_id) {
            break;
        }
        match index.get(parent_id) {
            Some(parent) => {
                chain.push(parent);
                current = parent;
            }
            None => break,
        }
    }

    chain
}

/// True when following `job`'s parents leads back to `job`.
pub fn is_in_cycle(job: &Job, index: &JobIndex<'_>) -> bool {
    let Some(start) = job.id.as_ref() else {
        return false;
    };

    let mut visited: HashSet<&JobId> = HashSet::with_capacity(index.len());
    let mut current = job;
    while let Some(parent_id) = current.parent_id.as_ref() {
        if parent_id == start {
            return true;
        }
        if !visited.insert(parent_id) {
            return false;
        }
        match index.get(parent_id) {
            Some(parent) => current = parent,
            None => return false,
        }
    }
    false
}

/// The cron expression that actually triggers `job`: its root's when it runs
/// after a parent, its own otherwise.
pub fn effective_schedule<'a>(job: &'a Job, index: &JobIndex<'a>) -> Option<&'a str> {
    if job.has_parent() {
        find_root(job, index).cron_expression()
    } else {
        job.cron_expression()
    }
}

/// Effective schedule while the parent selection is being edited: the walk
/// starts at `selected_parent` when it resolves, else at `job` itself.
pub fn effective_schedule_for_parent<'a>(
    job: &'a Job,
    selected_parent: Option<&JobId>,
    index: &JobIndex<'a>,
) -> Option<&'a str> {
    match selected_parent {
        None => job.cron_expression(),
        Some(parent_id) => {
            let start = index.get(parent_id).unwrap_or(job);
            find_root(start, index).cron_expression()
        }
    }
}
