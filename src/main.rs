use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

mod error;
mod state;
mod sync;

use state::catalog::Catalog;
use state::data::{Subject, SubjectKind};
use sync::reconcile::SyncReport;

/// Admin tool for the kennel site catalog: sync photo folders into the
/// database, manage puppy records, and inspect visit statistics.
#[derive(Parser)]
#[command(name = "kennel-catalog", version, about)]
struct Cli {
    /// Database file (defaults to the platform data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Merge new photos from a folder tree into the catalog
    Sync {
        /// Photo root, one subfolder per subject (dam/sire/puppies)
        root: PathBuf,
        /// Only update subjects that already exist; never create new ones
        #[arg(long)]
        incremental: bool,
        /// Print the report as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Discard all subjects and reinstall the demo seed data
    Reset,
    /// List the parents and all puppies
    List,
    /// Add a new puppy with an initial set of photo paths
    AddPuppy {
        name: String,
        #[arg(required = true)]
        images: Vec<String>,
    },
    /// Mark a puppy sold or available again
    SetSold { id: i64, sold: bool },
    /// Delete a puppy record
    DeletePuppy { id: i64 },
    /// Remove one photo path from a subject
    RemoveImage { id: i64, path: String },
    /// Record a page visit
    Track {
        #[arg(long, default_value = "unknown")]
        ip: String,
        #[arg(long, default_value = "unknown")]
        user_agent: String,
        #[arg(long, default_value = "home")]
        page: String,
    },
    /// Show page-visit statistics
    Stats,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let db_path = cli.db.clone().unwrap_or_else(Catalog::default_db_path);

    match run(cli.command, &db_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, db_path: &Path) -> error::Result<()> {
    let mut catalog = Catalog::open(db_path)?;

    match command {
        Command::Sync {
            root,
            incremental,
            json,
        } => {
            // Keep stdout clean for --json so the report can be piped
            if !json {
                println!("🔍 Scanning folder: {}", root.display());
            }

            let report = if incremental {
                sync::reconcile::incremental_sync(&catalog, &root)?
            } else {
                sync::reconcile::full_sync(&catalog, &root)?
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        Command::Reset => {
            sync::seed::reset_to_seed(&mut catalog)?;
            println!("✅ Catalog reset to the demo seed data");
        }
        Command::List => {
            sync::seed::ensure_seeded(&mut catalog)?;

            for kind in [SubjectKind::Dam, SubjectKind::Sire] {
                if let Some(parent) = catalog.parent(kind)? {
                    print_subject(&parent);
                }
            }
            for puppy in catalog.all_puppies()? {
                print_subject(&puppy);
            }
        }
        Command::AddPuppy { name, images } => {
            let id = catalog.add_puppy(&name, &images)?;
            println!("✅ Added puppy {:?} with id {}", name, id);
        }
        Command::SetSold { id, sold } => {
            catalog.set_sold(id, sold)?;
            println!(
                "✅ Puppy {} marked {}",
                id,
                if sold { "sold" } else { "available" }
            );
        }
        Command::DeletePuppy { id } => {
            catalog.delete_puppy(id)?;
            println!("✅ Puppy {} deleted", id);
        }
        Command::RemoveImage { id, path } => {
            catalog.remove_image(id, &path)?;
            println!("✅ Removed {} from subject {}", path, id);
        }
        Command::Track {
            ip,
            user_agent,
            page,
        } => {
            catalog.track_visit(&ip, &user_agent, &page)?;
            println!("✅ Visit to {:?} recorded", page);
        }
        Command::Stats => {
            let stats = catalog.visit_stats()?;
            println!(
                "📊 {} visits from {} unique visitors",
                stats.total_visits, stats.unique_visitors
            );
            for (page, visits) in &stats.by_page {
                println!("   {}: {}", page, visits);
            }
        }
    }

    Ok(())
}

fn print_report(report: &SyncReport) {
    println!(
        "✅ Sync complete: {} subjects created, {} updated, {} images appended",
        report.subjects_created, report.subjects_updated, report.images_appended
    );

    for issue in &report.skipped {
        println!("⏭️  Skipped {}: {}", issue.folder, issue.reason);
    }
    for issue in &report.failed {
        eprintln!("⚠️  Failed {}: {}", issue.folder, issue.reason);
    }
}

fn print_subject(subject: &Subject) {
    let sold = if subject.kind == SubjectKind::Puppy && subject.is_sold {
        " [SOLD]"
    } else {
        ""
    };
    println!(
        "🐶 #{} {} ({}){}: {} photos",
        subject.id,
        subject.name,
        subject.kind.as_str(),
        sold,
        subject.images.len()
    );
}
