use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use testsync::config::Config;
use testsync::detectors::ast::catalog::{extract_units_as, CallableUnit};
use testsync::detectors::ast::unitdelta::{diff_units_as, MatchPolicy};
use testsync::detectors::language::Dialect;
use testsync::error::{Result, SyncError};
use testsync::llm::backend::GenerationRequest;
use testsync::llm::fence::unwrap_reply;
use testsync::logger::init_logging;
use testsync::testgen::pipeline::{accepted_units, combine, plan_new_units};
use testsync::testgen::preview::{change_counts, suite_diff};

#[derive(Parser)]
#[command(
    name = "testsync",
    version,
    about = "Keep generated JavaScript/TypeScript test suites in sync with their sources."
)]
struct Cli {
    /// Config file (defaults to ./testsync.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// List the callable units of a source file
    Units {
        source: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Compare two snapshots of a source file
    Diff {
        new: PathBuf,
        old: PathBuf,
        /// Treat a unit whose kind changed as removed and re-added
        #[arg(long)]
        by_kind: bool,
        #[arg(long)]
        json: bool,
    },
    /// Show units that have no tests recorded yet
    Plan { source: PathBuf },
    /// Merge generated tests into an existing suite
    Merge {
        /// Generated code or reply text, `-` for stdin
        generated: String,
        /// Suite to merge into
        #[arg(long)]
        into: Option<PathBuf>,
        /// Source file whose conventional suite (`<output_dir>/<stem>.test.<ext>`) is the target
        #[arg(long = "for", value_name = "SOURCE")]
        for_source: Option<PathBuf>,
        /// Write the merged suite to the target path
        #[arg(long)]
        write: bool,
        /// Print a unified diff instead of the merged suite
        #[arg(long)]
        preview: bool,
    },
    /// Print the generation prompt for units without tests
    Prompt {
        source: PathBuf,
        /// Only this unit
        #[arg(long)]
        unit: Option<String>,
    },
    /// Mark units of a source file as tested
    Record {
        source: PathBuf,
        /// Comma-separated unit names (default: every new unit)
        #[arg(long, value_delimiter = ',')]
        units: Vec<String>,
    },
    /// Inspect or drop fingerprint records
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    List,
    Clear { source: PathBuf },
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let result = Config::load(cli.config.as_deref()).and_then(|cfg| run(cli.command, &cfg));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("testsync: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: CliCommand, cfg: &Config) -> Result<()> {
    match command {
        CliCommand::Units { source, json } => {
            let units = read_units(&source)?;
            if json {
                print_json(&units)?;
            } else {
                for u in &units {
                    println!("{}", u);
                }
            }
        }

        CliCommand::Diff {
            new,
            old,
            by_kind,
            json,
        } => {
            let policy = if by_kind {
                MatchPolicy::NameAndKind
            } else {
                cfg.match_policy
            };
            let delta = diff_units_as(
                &read_text(&new)?,
                &read_text(&old)?,
                policy,
                Dialect::from_path(&new),
            )?;
            if json {
                print_json(&delta)?;
            } else {
                print_section("added", &delta.added);
                print_section("removed", &delta.removed);
                print_section("modified", &delta.modified);
            }
        }

        CliCommand::Plan { source } => {
            let stored = cfg.store().read(&source)?;
            let fresh = plan_new_units(&read_units(&source)?, &stored);
            if fresh.is_empty() {
                println!("nothing new in {}", source.display());
            }
            for u in &fresh {
                println!("{}", u);
            }
        }

        CliCommand::Merge {
            generated,
            into,
            for_source,
            write,
            preview,
        } => {
            let target = cfg.suite_path(into.as_deref(), for_source.as_deref())?;
            merge_command(cfg, &generated, &target, write, preview)?
        }

        CliCommand::Prompt { source, unit } => {
            let content = read_text(&source)?;
            let stored = cfg.store().read(&source)?;
            let known: Vec<String> = stored.units.iter().map(|u| u.name.clone()).collect();
            let path_text = source.display().to_string();

            let fresh = plan_new_units(&read_units(&source)?, &stored);
            for u in fresh
                .iter()
                .filter(|u| unit.as_ref().map_or(true, |n| n == &u.name))
            {
                let prompt = cfg.prompt_for(&GenerationRequest {
                    source_path: Some(&path_text),
                    source: &content,
                    unit: u,
                    known: &known,
                });
                println!("=== {} ===\n[system]\n{}\n\n[user]\n{}", u, prompt.system, prompt.user);
            }
        }

        CliCommand::Record { source, units } => {
            let store = cfg.store();
            let content = read_text(&source)?;
            let stored = store.read(&source)?;
            let fresh = plan_new_units(&read_units(&source)?, &stored);

            let selected: Vec<CallableUnit> = if units.is_empty() {
                fresh
            } else {
                fresh
                    .into_iter()
                    .filter(|u| units.iter().any(|n| n == &u.name))
                    .collect()
            };

            let record = store.write(&source, &content, accepted_units(&stored, &selected))?;
            println!(
                "recorded {} new unit(s), {} known for {}",
                selected.len(),
                record.units.len(),
                source.display()
            );
        }

        CliCommand::Cache { action } => {
            let store = cfg.store();
            match action {
                CacheAction::List => {
                    let keys = store.entries()?;
                    eprintln!("{} record(s) in {}", keys.len(), store.dir().display());
                    for key in keys {
                        println!("{}", key);
                    }
                }
                CacheAction::Clear { source } => {
                    if store.remove(&source)? {
                        println!("cleared {}", source.display());
                    } else {
                        println!("no record for {}", source.display());
                    }
                }
            }
        }
    }

    Ok(())
}

/* ============================================================
   merge
   ============================================================ */

fn merge_command(
    cfg: &Config,
    generated: &str,
    target: &Path,
    write: bool,
    preview: bool,
) -> Result<()> {
    let reply = if generated == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|source| SyncError::Io {
                path: PathBuf::from("<stdin>"),
                source,
            })?;
        buf
    } else {
        read_text(Path::new(generated))?
    };
    let code = unwrap_reply(&reply, &cfg.fence_languages);

    let existing = if target.is_file() {
        Some(read_text(&target)?)
    } else {
        None
    };

    let merged = combine(&code, existing.as_deref(), &cfg.merge_options(target))?;

    if preview {
        print!(
            "{}",
            suite_diff(&target.display().to_string(), existing.as_deref(), &merged)
        );
    } else if !write {
        print!("{}", merged);
    }

    if write {
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| SyncError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(target, &merged).map_err(|source| SyncError::Io {
            path: target.to_path_buf(),
            source,
        })?;
        let (added, removed) = change_counts(existing.as_deref().unwrap_or(""), &merged);
        eprintln!(
            "wrote {} (+{} -{})",
            target.display(),
            added,
            removed
        );
    }

    Ok(())
}

/* ============================================================
   helpers
   ============================================================ */

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| SyncError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_units(source: &Path) -> Result<Vec<CallableUnit>> {
    extract_units_as(&read_text(source)?, Dialect::from_path(source))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| SyncError::Config(format!("cannot serialize output: {}", e)))?;
    println!("{}", text);
    Ok(())
}

fn print_section(title: &str, units: &[CallableUnit]) {
    println!("{} ({})", title, units.len());
    for u in units {
        println!("  {}", u);
    }
}
