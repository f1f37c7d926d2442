// CLI schedule commands: describe, schedule

use chrono::Utc;

use super::jobs::find_job;
use crate::graph::JobIndex;
use crate::models::Job;
use crate::schedule::{next_run, run_sentence, ScheduleFormatter};

/// runafter describe
pub fn cmd_describe(
    formatter: &ScheduleFormatter,
    use_local_time: bool,
    expression: &str,
    sentence: bool,
    next: bool,
) -> anyhow::Result<()> {
    let Some(description) = formatter.describe(expression) else {
        anyhow::bail!("'{}' is not a valid cron expression", expression);
    };

    if sentence {
        println!("{}", run_sentence(&description, use_local_time));
    } else {
        println!("{}", description);
    }

    if next {
        match next_run(expression, Utc::now()) {
            Some(at) => println!("Next run: {}", at.to_rfc3339()),
            None => println!("Next run: -"),
        }
    }

    Ok(())
}

/// runafter schedule
pub fn cmd_schedule(
    formatter: &ScheduleFormatter,
    use_local_time: bool,
    jobs: &[Job],
    job: &str,
) -> anyhow::Result<()> {
    let index = JobIndex::new(jobs);
    let job = find_job(&index, job)?;
    let owner = if job.has_parent() {
        index.find_root(job)
    } else {
        job
    };

    println!("Job:        {}", job.label());
    if !std::ptr::eq(owner, job) {
        println!("Runs after: {}", owner.label());
    }

    let Some(expression) = index.effective_schedule(job) else {
        println!("No schedule configured.");
        return Ok(());
    };
    println!("Schedule:   {}", expression);

    match formatter.describe(expression) {
        Some(description) => println!("{}", run_sentence(&description, use_local_time)),
        None => println!("Schedule '{}' is not a valid cron expression.", expression),
    }

    Ok(())
}
