// CLI job commands: candidates, root, check

use crate::errors::RunAfterError;
use crate::graph::{ancestors, is_in_cycle, JobIndex};
use crate::models::{validate_job, Job};

/// Resolve a job by id or name, or fail with NotFound.
pub(crate) fn find_job<'a>(index: &JobIndex<'a>, key: &str) -> anyhow::Result<&'a Job> {
    index
        .resolve(key)
        .ok_or_else(|| RunAfterError::NotFound(format!("Job '{}'", key)).into())
}

/// Shorten `s` to `width` characters, marking the cut with "...".
fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let kept: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn print_table(jobs: &[&Job]) {
    println!(
        "{:<10}{:<24}{:<10}{:<16}",
        "ID", "NAME", "PARENT", "SCHEDULE"
    );
    for job in jobs {
        let id = job.id.as_ref().map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
        let parent = job
            .parent_id
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<10}{:<24}{:<10}{:<16}",
            truncate(&id, 9),
            truncate(&job.name, 23),
            truncate(&parent, 9),
            job.cron_expression().unwrap_or("-")
        );
    }
}

/// runafter candidates
pub fn cmd_candidates(jobs: &[Job], job: Option<&str>, json: bool) -> anyhow::Result<()> {
    let index = JobIndex::new(jobs);
    let target = job.map(|key| find_job(&index, key)).transpose()?;
    let candidates = index.candidate_parents(target);

    if json {
        println!("{}", serde_json::to_string_pretty(&candidates)?);
        return Ok(());
    }

    if candidates.is_empty() {
        println!("No jobs can be selected as a parent.");
        return Ok(());
    }

    print_table(&candidates);
    Ok(())
}

/// runafter root
pub fn cmd_root(jobs: &[Job], job: &str, json: bool) -> anyhow::Result<()> {
    let index = JobIndex::new(jobs);
    let start = find_job(&index, job)?;
    let root = index.find_root(start);

    if json {
        println!("{}", serde_json::to_string_pretty(root)?);
        return Ok(());
    }

    if std::ptr::eq(start, root) {
        println!("Job {} has no run-after parent.", start.label());
        return Ok(());
    }

    println!("Job {} runs after {}.", start.label(), root.label());
    let chain: Vec<String> = std::iter::once(start)
        .chain(ancestors(start, &index))
        .map(|j| j.name.clone())
        .collect();
    println!("  Chain: {}", chain.join(" <- "));
    Ok(())
}

/// runafter check
pub fn cmd_check(jobs: &[Job]) -> anyhow::Result<()> {
    let index = JobIndex::new(jobs);
    let mut invalid = 0;

    for job in jobs {
        let result = validate_job(job).and_then(|_| match job.parent_id.as_ref() {
            Some(parent) if index.get(parent).is_none() => Err(RunAfterError::NotFound(
                format!("Parent job {}", parent),
            )),
            Some(_) if is_in_cycle(job, &index) => Err(
                RunAfterError::Validation("Job runs after one of its own descendants".to_string()),
            ),
            _ => Ok(()),
        });

        if let Err(e) = result {
            invalid += 1;
            println!("{:<40}{}", truncate(&job.label(), 39), e);
        }
    }

    if invalid > 0 {
        anyhow::bail!("{} of {} jobs are invalid", invalid, jobs.len());
    }

    println!("All {} jobs are valid.", jobs.len());
    Ok(())
}
