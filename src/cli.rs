use clap::{Args, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::job::seed::demo_jobs;
use crate::job::{
    Consistency, JobForm, JobId, JobRecord, JobStatus, JobStore, SortKey, StatusFilter, StoreError,
    ViewQuery,
};
use crate::remote::{connection::build_client, HttpJobsClient, RemoteError};
use crate::shutdown;
use crate::theme::{Theme, ThemeError, ThemeState};

#[derive(Debug, Parser)]
#[command(name = "job-tracker", version, about = "Track job applications stored in a remote jobs service")]
pub struct Cli {
    /// Jobs service root, overrides API_BASE_URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show applications, filtered, searched and sorted
    List(ListArgs),
    /// Add a new application
    Add(AddArgs),
    /// Replace the fields of an existing application
    Edit(EditArgs),
    /// Delete an application
    Remove {
        id: JobId,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Replace every application with the demo set
    Demo {
        #[arg(long)]
        yes: bool,
    },
    /// Show or change the color theme
    Theme {
        #[command(subcommand)]
        action: Option<ThemeAction>,
    },
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// All, Applied, Interview, Offer or Rejected
    #[arg(long, default_value = "All")]
    pub status: StatusFilter,
    /// Case-insensitive match on company and role
    #[arg(long, default_value = "")]
    pub search: String,
    /// newest, deadline or company
    #[arg(long, default_value = "newest")]
    pub sort: SortKey,
}

impl ListArgs {
    fn query(&self) -> ViewQuery {
        ViewQuery {
            filter: self.status,
            search: self.search.clone(),
            sort: self.sort,
        }
    }
}

#[derive(Debug, Args)]
pub struct AddArgs {
    #[arg(long)]
    pub company: String,
    #[arg(long)]
    pub role: String,
    /// YYYY-MM-DD
    #[arg(long, default_value = "")]
    pub deadline: String,
    #[arg(long, default_value = "Applied")]
    pub status: String,
    #[arg(long, default_value = "")]
    pub notes: String,
    /// Logo image URL
    #[arg(long, default_value = "")]
    pub logo: String,
}

impl AddArgs {
    fn form(&self) -> JobForm {
        JobForm {
            company: self.company.clone(),
            role: self.role.clone(),
            deadline: self.deadline.clone(),
            status: self.status.clone(),
            notes: self.notes.clone(),
            logo: self.logo.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct EditArgs {
    pub id: JobId,
    #[arg(long)]
    pub company: Option<String>,
    #[arg(long)]
    pub role: Option<String>,
    #[arg(long, conflicts_with = "clear_deadline")]
    pub deadline: Option<String>,
    #[arg(long)]
    pub clear_deadline: bool,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long)]
    pub logo: Option<String>,
}

impl EditArgs {
    /// Overlay the given flags on the current values
    fn apply(&self, mut form: JobForm) -> JobForm {
        let overrides = [
            (&mut form.company, &self.company),
            (&mut form.role, &self.role),
            (&mut form.deadline, &self.deadline),
            (&mut form.status, &self.status),
            (&mut form.notes, &self.notes),
            (&mut form.logo, &self.logo),
        ];
        for (field, value) in overrides {
            if let Some(value) = value {
                *field = value.clone();
            }
        }
        if self.clear_deadline {
            form.deadline.clear();
        }
        form
    }
}

#[derive(Debug, Subcommand)]
pub enum ThemeAction {
    Show,
    Toggle,
    Set { theme: Theme },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Theme(#[from] ThemeError),

    #[error("Failed to read confirmation: {0}")]
    Prompt(#[from] io::Error),
}

pub async fn run(cli: Cli, config: Config) -> Result<(), CliError> {
    let mut theme = ThemeState::init(&config.theme_file);

    match cli.command {
        Command::Theme { action } => run_theme(&mut theme, action.unwrap_or(ThemeAction::Show)),
        command => {
            let base_url = cli.base_url.as_deref().unwrap_or(&config.api_base_url);
            let http = build_client(config.request_timeout)?;
            let api = HttpJobsClient::new(base_url, http, config.retry.clone())?;
            let store = JobStore::new(Arc::new(api), config.store_options())
                .with_shutdown(shutdown::listen());
            info!("Using jobs service at {}", base_url);

            run_jobs(&store, command, theme.current()).await
        }
    }
}

fn run_theme(theme: &mut ThemeState, action: ThemeAction) -> Result<(), CliError> {
    match action {
        ThemeAction::Show => {}
        ThemeAction::Toggle => {
            theme.toggle()?;
        }
        ThemeAction::Set { theme: value } => theme.set(value)?,
    }
    println!("theme: {} ({})", theme.current(), theme.path().display());
    Ok(())
}

async fn run_jobs(store: &JobStore, command: Command, theme: Theme) -> Result<(), CliError> {
    match command {
        Command::List(args) => {
            store.refresh().await?;
            let view = store.project(&args.query()).await;
            print_jobs(&view, theme);
            println!("{} of {} applications", view.len(), store.records().await.len());
        }
        Command::Add(args) => {
            let created = store.add(&args.form()).await?;
            println!("Application added");
            print_jobs(&[created], theme);
        }
        Command::Edit(args) => {
            store.refresh().await?;
            let current = store.require(&args.id).await?;
            let updated = store.edit(&args.id, &args.apply(JobForm::from(&current))).await?;
            println!("Updated");
            print_jobs(&[updated], theme);
        }
        Command::Remove { id, yes } => {
            if !yes && !confirm("Delete this application?")? {
                println!("Nothing deleted");
                return Ok(());
            }
            store.remove(&id).await?;
            println!("Deleted");
        }
        Command::Demo { yes } => {
            if !yes && !confirm("Load demo data? This will replace current list.")? {
                println!("Demo load skipped");
                return Ok(());
            }
            match store.bulk_replace(&demo_jobs()).await {
                Ok(created) => {
                    println!("Demo data loaded");
                    print_jobs(&created, theme);
                }
                Err(err) => {
                    if let Consistency::Inconsistent { reason } = store.consistency().await {
                        warn!("Local list is inconsistent: {}", reason);
                    }
                    return Err(err.into());
                }
            }
        }
        Command::Theme { .. } => {}
    }
    Ok(())
}

fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn status_color(theme: Theme, status: JobStatus) -> &'static str {
    match (theme, status) {
        (Theme::Dark, JobStatus::Applied) => "\x1b[94m",
        (Theme::Dark, JobStatus::Interview) => "\x1b[93m",
        (Theme::Dark, JobStatus::Offer) => "\x1b[92m",
        (Theme::Dark, JobStatus::Rejected) => "\x1b[91m",
        (Theme::Light, JobStatus::Applied) => "\x1b[34m",
        (Theme::Light, JobStatus::Interview) => "\x1b[33m",
        (Theme::Light, JobStatus::Offer) => "\x1b[32m",
        (Theme::Light, JobStatus::Rejected) => "\x1b[31m",
    }
}

fn format_job(job: &JobRecord, theme: Theme) -> String {
    let badge = match &job.logo {
        Some(_) => "[*]".to_string(),
        None => format!("[{}]", job.initial()),
    };
    let deadline = job
        .deadline
        .map(|d| format!("due {}", d.format("%Y-%m-%d")))
        .unwrap_or_else(|| "no deadline".to_string());

    let mut line = format!(
        "{} #{:<6} {} / {}  {}{}\x1b[0m  {}",
        badge,
        job.id.to_string(),
        job.company,
        job.role,
        status_color(theme, job.status),
        job.status,
        deadline
    );
    if !job.notes.is_empty() {
        line.push_str(&format!("\n        {}", job.notes));
    }
    if let Some(logo) = &job.logo {
        line.push_str(&format!("\n        logo: {}", logo));
    }
    line
}

fn print_jobs(jobs: &[JobRecord], theme: Theme) {
    if jobs.is_empty() {
        println!("No applications");
    }
    for job in jobs {
        println!("{}", format_job(job, theme));
    }
}
