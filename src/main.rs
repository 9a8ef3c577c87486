//! restools CLI - blob storage maintenance command line interface

use std::fs::File;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};

use restools::ops::{
    export, import_file, match_files, sweep_orphaned_blobs, sweep_unused_assets, AssetStatus,
    ExportOptions, ExportStatus, MatchStatus, SweepBlobStatus, SweepBlobsOptions,
};
use restools::{IoResultExt, Reconciler};

#[derive(Parser)]
#[command(name = "restools")]
#[command(about = "maintenance toolkit for content-addressed blob storage collections")]
#[command(version)]
struct Cli {
    /// toolkit root containing config.toml
    #[arg(short, long, default_value = ".", env = "RESTOOLS_ROOT")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// export all blobs of a collection to a directory
    Export {
        /// directory the blob files are written to
        target_path: PathBuf,

        /// delete all files in the target path first (asks for confirmation)
        #[arg(long, action = ArgAction::Set, default_value_t = false, num_args = 0..=1, default_missing_value = "true")]
        empty_target_path: bool,

        /// collection to export
        #[arg(long, default_value = "persistent")]
        collection: String,
    },

    /// re-import orphaned files whose names match known content hashes
    Match {
        /// directory containing files named by content hash
        source_path: PathBuf,

        /// collection to match against
        #[arg(long, default_value = "persistent")]
        collection: String,
    },

    /// import a single file as a new blob
    ImportFile {
        /// file path, or "-" for stdin
        source: String,

        /// filename stored on the record (may be empty)
        filename: String,

        /// collection to import into
        #[arg(long, default_value = "persistent")]
        collection: String,
    },

    /// delete stored files no metadata record points at
    RemoveOrphanedBlobs {
        /// report eligible files without deleting them
        #[arg(long, action = ArgAction::Set, default_value_t = true, num_args = 0..=1, default_missing_value = "true")]
        dry_run: bool,

        /// ignore files younger than this many seconds
        #[arg(long, default_value_t = 3600)]
        minimum_age: u64,
    },

    /// delete assets no usage strategy references anymore
    RemoveUnusedAssets {
        /// report unused assets without deleting them
        #[arg(long, action = ArgAction::Set, default_value_t = true, num_args = 0..=1, default_missing_value = "true")]
        dry_run: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run(cli: Cli) -> restools::Result<()> {
    let rec = Reconciler::open(&cli.root)?;

    match cli.command {
        Commands::Export {
            target_path,
            empty_target_path,
            collection,
        } => {
            println!("Exporting resources to {} ...", target_path.display());

            let opts = ExportOptions {
                empty_target_first: empty_target_path,
            };
            let mut confirm = |count: usize, path: &Path| {
                ask_confirmation(&format!(
                    "Are you sure you want to delete {} files in {}?",
                    count,
                    path.display()
                ))
            };
            export(&rec, &collection, &target_path, &opts, &mut confirm, &mut |event| {
                match &event.status {
                    ExportStatus::Exported => {
                        println!("exported  {} {}", event.hash, event.filename)
                    }
                    ExportStatus::Missing => {
                        println!("missing   {} {}", event.hash, event.filename)
                    }
                    ExportStatus::Failed(message) => {
                        println!("failed    {} {} {}", event.hash, event.filename, message)
                    }
                }
            })?;
        }

        Commands::Match {
            source_path,
            collection,
        } => {
            println!("Matching resources with files in {} ...\n", source_path.display());

            match_files(&rec, &collection, &source_path, &mut |event| {
                match &event.status {
                    MatchStatus::Exists => println!("exists    {} {}", event.hash, event.filename),
                    MatchStatus::Imported => {
                        println!("imported  {} {}", event.hash, event.filename)
                    }
                    MatchStatus::Missing => {
                        println!("missing   {} {}", event.hash, event.filename)
                    }
                    MatchStatus::Failed(message) => {
                        println!("failed    {} {} {}", event.hash, event.filename, message)
                    }
                }
            })?;
        }

        Commands::ImportFile {
            source,
            filename,
            collection,
        } => {
            let record = if source == "-" {
                let mut stdin = io::stdin().lock();
                import_file(&rec, &collection, &mut stdin, &filename)?
            } else {
                let mut file = open_source(&source)?;
                import_file(&rec, &collection, &mut *file, &filename)?
            };

            println!("Imported file as resource \"{}\"", record.content_hash);
        }

        Commands::RemoveOrphanedBlobs {
            dry_run,
            minimum_age,
        } => {
            if dry_run {
                println!("dry run: reporting only, nothing will be deleted");
            }

            let opts = SweepBlobsOptions {
                dry_run,
                minimum_age: std::time::Duration::from_secs(minimum_age),
            };
            let base_path = rec.resources_path();
            sweep_orphaned_blobs(&rec, &base_path, &opts, &mut |event| match &event.status {
                SweepBlobStatus::Deleted => println!("deleted {}", event.path),
                SweepBlobStatus::Failed(message) => {
                    println!("failed  {} {}", event.path, message)
                }
            })?;
        }

        Commands::RemoveUnusedAssets { dry_run } => {
            if dry_run {
                println!("dry run: reporting only, nothing will be deleted");
            }

            let stats = sweep_unused_assets(&rec, dry_run, &mut |event| match &event.status {
                AssetStatus::Deleted => {
                    println!("deleted {} {}", event.identifier, event.label)
                }
                AssetStatus::Kept => println!("kept    {} {}", event.identifier, event.label),
                AssetStatus::Failed(message) => {
                    println!("failed  {} {} {}", event.identifier, event.label, message)
                }
            })?;

            println!();
            println!(
                "Summary: {} assets deleted and {} assets kept",
                stats.deleted, stats.kept
            );
        }
    }

    Ok(())
}

fn open_source(source: &str) -> restools::Result<Box<dyn Read>> {
    let path = PathBuf::from(source);
    let file = File::open(&path).with_path(&path)?;
    Ok(Box::new(file))
}

fn ask_confirmation(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }

    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
