//! Command line front-end over the InkFlow store.
//!
//! # Responsibility
//! - List and switch projects.
//! - Write and restore whole-store backups.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inkflow_core::{default_log_level, init_logging, Store, StoreConfig};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[clap(name = "inkflow", version, about = "Manage a local InkFlow library")]
struct Cli {
    /// Directory holding the database and the current-project pointer.
    #[clap(long, default_value = ".inkflow")]
    data_dir: PathBuf,
    /// trace|debug|info|warn|error
    #[clap(long)]
    log_level: Option<String>,
    /// Enables file logging into this directory.
    #[clap(long)]
    log_dir: Option<PathBuf>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List projects, most recently updated first.
    Projects,
    /// Make a project the current one.
    Select { id: String },
    /// Write a backup of every project.
    Export {
        /// Output file; stdout when omitted.
        #[clap(long)]
        out: Option<PathBuf>,
    },
    /// Replace the library with the contents of a backup file.
    Import { file: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let log_dir = std::path::absolute(log_dir)
            .with_context(|| format!("cannot resolve log directory {}", log_dir.display()))?;
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, &log_dir)?;
    }

    fs::create_dir_all(&cli.data_dir)
        .with_context(|| format!("cannot create data directory {}", cli.data_dir.display()))?;
    let store = Store::open(&StoreConfig::in_dir(&cli.data_dir))?;

    match cli.command {
        Command::Projects => list_projects(&store)?,
        Command::Select { id } => select_project(&store, &id)?,
        Command::Export { out } => export(&store, out)?,
        Command::Import { file } => import(&store, &file)?,
    }

    store.close()?;
    Ok(())
}

fn list_projects(store: &Store) -> Result<()> {
    let current = store.get_current_project()?.map(|project| project.id);
    for project in store.list_projects()? {
        let marker = if current.as_deref() == Some(project.id.as_str()) {
            "*"
        } else {
            " "
        };
        let title = if project.one_sentence.is_empty() {
            "(untitled)"
        } else {
            project.one_sentence.as_str()
        };
        println!("{marker} {}  {title}", project.id);
    }
    Ok(())
}

fn select_project(store: &Store, id: &str) -> Result<()> {
    if store.get_project(id)?.is_none() {
        anyhow::bail!("no project with id `{id}`");
    }
    store.select_project(id);
    info!("event=project_select module=cli status=ok project_id={id}");
    println!("current project: {id}");
    Ok(())
}

fn export(store: &Store, out: Option<PathBuf>) -> Result<()> {
    let document = store.export()?;
    let json = serde_json::to_string_pretty(&document).context("cannot encode backup")?;
    match out {
        Some(path) => {
            fs::write(&path, json)
                .with_context(|| format!("cannot write backup to {}", path.display()))?;
            eprintln!(
                "exported {} project(s) to {}",
                document.stories.len(),
                path.display()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn import(store: &Store, file: &Path) -> Result<()> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("cannot read backup {}", file.display()))?;
    let summary = store.import_str(&text)?;
    println!(
        "imported {} project(s), {} idea(s), {} character(s), {} chapter(s), {} scene(s)",
        summary.projects, summary.ideas, summary.characters, summary.chapters, summary.scenes
    );
    if let Some(id) = summary.selected_project_id {
        println!("current project: {id}");
    }
    Ok(())
}
