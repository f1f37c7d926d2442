pub mod jobs;
pub mod schedule;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::load_config;
use crate::models::{Config, Job};
use crate::schedule::ScheduleFormatter;
use crate::storage::{JobSource, JsonJobSnapshot};

/// Run After - inspect job dependencies and schedules
#[derive(Parser, Debug)]
#[command(
    name = "runafter",
    version,
    about = "Run After - inspect run-after job dependencies and schedules"
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<String>,

    /// Job snapshot file (JSON array of jobs)
    #[arg(short = 'j', long = "jobs", global = true)]
    pub jobs: Option<String>,

    /// Render times in the local timezone
    #[arg(long, global = true, conflicts_with = "utc")]
    pub local: bool,

    /// Render times in UTC
    #[arg(long, global = true, conflicts_with = "local")]
    pub utc: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List jobs that may be chosen as a run-after parent
    Candidates {
        /// Job name or id (omit for a job that has not been created yet)
        job: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the job at the top of a job's run-after chain
    Root {
        /// Job name or id
        job: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Describe a cron expression
    Describe {
        /// Cron expression (5 fields, or 6 with leading seconds)
        expression: String,

        /// Print the full "This job will run ..." sentence
        #[arg(long)]
        sentence: bool,

        /// Also print the next run time
        #[arg(long)]
        next: bool,
    },

    /// Show the schedule that actually triggers a job
    Schedule {
        /// Job name or id
        job: String,
    },

    /// Validate every job in the snapshot
    Check,
}

impl Cli {
    /// `--local` / `--utc` win over the configured preference.
    pub fn use_local_time(&self, config: &Config) -> bool {
        if self.local {
            true
        } else if self.utc {
            false
        } else {
            config.use_local_time
        }
    }

    fn jobs_file(&self, config: &Config) -> anyhow::Result<PathBuf> {
        self.jobs
            .as_ref()
            .map(PathBuf::from)
            .or_else(|| config.jobs_file.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("No job snapshot given. Pass --jobs <FILE> or set jobs_file in the config")
            })
    }

    fn load_jobs(&self, config: &Config) -> anyhow::Result<Vec<Job>> {
        let path = self.jobs_file(config)?;
        JsonJobSnapshot::new(&path)
            .list_jobs()
            .with_context(|| format!("Failed to load jobs from {}", path.display()))
    }
}

/// Dispatch the CLI command to the appropriate handler.
pub fn dispatch(cli: &Cli) -> anyhow::Result<()> {
    let Some(command) = &cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = load_config(cli.config.as_deref().map(Path::new))?;
    let use_local_time = cli.use_local_time(&config);
    let formatter = ScheduleFormatter::new(config.display_zone(Some(use_local_time))?);

    match command {
        Commands::Candidates { job, json } => {
            jobs::cmd_candidates(&cli.load_jobs(&config)?, job.as_deref(), *json)
        }
        Commands::Root { job, json } => jobs::cmd_root(&cli.load_jobs(&config)?, job, *json),
        Commands::Describe {
            expression,
            sentence,
            next,
        } => schedule::cmd_describe(&formatter, use_local_time, expression, *sentence, *next),
        Commands::Schedule { job } => {
            schedule::cmd_schedule(&formatter, use_local_time, &cli.load_jobs(&config)?, job)
        }
        Commands::Check => jobs::cmd_check(&cli.load_jobs(&config)?),
    }
}
