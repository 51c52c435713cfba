//! Command-line probe for the review store.
//!
//! # Responsibility
//! - Verify `review_core` wiring against a real SQLite file.
//! - Offer small record/list/remove commands for manual checks.
//!
//! # Usage
//!
//! ```bash
//! review --db company.db add 2022 "Exceeded expectations" 3
//! review --db company.db list
//! review --db company.db remove 1
//! ```

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use review_core::{
    default_log_level, init_logging, open_db, EmployeeId, ReviewId, ReviewRepository,
    SqliteReviewStore,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "review")]
#[command(about = "Annual performance review store", long_about = None)]
struct Cli {
    /// SQLite database file holding the `employees` and `reviews` tables
    #[arg(long)]
    db: Option<PathBuf>,
    /// Absolute directory for rolling log files; logging is off when omitted
    #[arg(long)]
    log_dir: Option<String>,
    /// trace|debug|info|warn|error
    #[arg(long)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print core health and version
    Ping,
    /// Record a new review
    Add {
        year: i64,
        summary: String,
        employee_id: EmployeeId,
    },
    /// List every stored review
    List,
    /// Show one review
    Show { id: ReviewId },
    /// Delete one review
    Remove { id: ReviewId },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        if let Err(err) = init_logging(level, log_dir) {
            bail!("failed to initialize logging: {err}");
        }
    }

    let command = cli.command.unwrap_or(Commands::Ping);
    if let Commands::Ping = command {
        println!("review_core ping={}", review_core::ping());
        println!("review_core version={}", review_core::core_version());
        return Ok(());
    }

    let Some(path) = cli.db.as_ref() else {
        bail!("--db is required for this command");
    };
    let conn = open_db(path)
        .with_context(|| format!("failed to open database `{}`", path.display()))?;
    let mut store = SqliteReviewStore::try_new(&conn)?;
    store.create_table()?;

    match command {
        Commands::Ping => {}
        Commands::Add {
            year,
            summary,
            employee_id,
        } => {
            let review = store.create(year, &summary, employee_id)?;
            println!("{}", review.borrow());
        }
        Commands::List => {
            for review in store.get_all()? {
                println!("{}", review.borrow());
            }
        }
        Commands::Show { id } => match store.find_by_id(id)? {
            Some(review) => println!("{}", review.borrow()),
            None => bail!("review {id} not found"),
        },
        Commands::Remove { id } => {
            let Some(review) = store.find_by_id(id)? else {
                bail!("review {id} not found");
            };
            store.delete(&review)?;
            println!("deleted review {id}");
        }
    }

    Ok(())
}
