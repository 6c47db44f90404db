//! Command-line interface for h5pimport.
//!
//! Provides commands for importing packages into the question bank,
//! inspecting packages, listing bank entries and showing configuration.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::core::{ImportError, ImportOutcome, Importer, SkipReason};
use crate::sinks::{JsonlQuestionBank, QuestionBank};

/// h5pimport - Import H5P packages into a quiz question bank
#[derive(Parser, Debug)]
#[command(name = "h5pimport")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import one or more H5P packages
    Import {
        /// Package files or glob patterns (e.g. "exports/*.h5p")
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Question bank file (defaults to the configured bank)
        #[arg(short, long, env = "H5PIMPORT_BANK")]
        bank: Option<PathBuf>,

        /// Copy embedded media files into this directory
        #[arg(short, long)]
        media_dir: Option<PathBuf>,

        /// Print the converted questions as JSON instead of a summary
        #[arg(long)]
        json: bool,

        /// Don't write to the question bank
        #[arg(long)]
        dry_run: bool,
    },

    /// Show a package's manifest and fragments without converting them
    Inspect {
        /// Package file
        input: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List recent question bank entries
    Bank {
        /// Maximum number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Import {
                inputs,
                bank,
                media_dir,
                json,
                dry_run,
            } => import_packages(&inputs, bank, media_dir, json, dry_run).await,
            Commands::Inspect { input, json } => inspect_package(input, json).await,
            Commands::Bank { limit } => list_bank(limit).await,
            Commands::Config => show_config().await,
        }
    }
}

/// Per-package import result, in input order
pub type PackageResult = (PathBuf, Result<ImportOutcome, ImportError>);

/// Import packages concurrently, one blocking task (and scratch dir) each
pub async fn import_all(importer: Arc<Importer>, paths: Vec<PathBuf>) -> Result<Vec<PackageResult>> {
    let handles: Vec<_> = paths
        .into_iter()
        .map(|path| {
            let importer = Arc::clone(&importer);
            tokio::task::spawn_blocking(move || {
                let result = importer.import(&path);
                (path, result)
            })
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await.context("Import task panicked")?);
    }
    Ok(results)
}

/// Expand glob patterns; plain paths pass through untouched
pub fn expand_inputs(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for input in inputs {
        if !input.contains(['*', '?', '[']) {
            paths.push(PathBuf::from(input));
            continue;
        }

        let mut matched: Vec<PathBuf> = glob::glob(input)
            .with_context(|| format!("Invalid glob pattern: {}", input))?
            .filter_map(|entry| entry.ok())
            .filter(|path| path.is_file())
            .collect();
        matched.sort();

        if matched.is_empty() {
            tracing::warn!("Pattern matched no files: {}", input);
        }
        paths.extend(matched);
    }
    Ok(paths)
}

/// Import packages into the question bank
async fn import_packages(
    inputs: &[String],
    bank_path: Option<PathBuf>,
    media_dir: Option<PathBuf>,
    json: bool,
    dry_run: bool,
) -> Result<()> {
    let cfg = crate::config::config()?;

    let mut options = cfg.import_options();
    if media_dir.is_some() {
        options.media_dir = media_dir;
    }

    let paths = expand_inputs(inputs)?;
    if paths.is_empty() {
        anyhow::bail!("No H5P packages matched the given inputs");
    }

    let importer = Arc::new(Importer::new(options));
    let results = import_all(importer, paths).await?;

    let mut bank = JsonlQuestionBank::new(bank_path.unwrap_or_else(|| cfg.bank.clone()));
    let mut failed = 0;
    let mut all_questions = Vec::new();

    for (path, result) in &results {
        let source = path.display().to_string();
        match result {
            Ok(outcome) => {
                if !dry_run {
                    for question in &outcome.questions {
                        bank.add(&outcome.package_id, &source, question)?;
                    }
                }

                if json {
                    all_questions.extend(outcome.questions.iter().cloned());
                } else {
                    print_outcome(&source, outcome);
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("✗ {}: {}", source, e);
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&all_questions)?);
    } else if !dry_run {
        eprintln!("\n[Question bank: {}]", bank.path().display());
    }

    if failed > 0 {
        anyhow::bail!("{} of {} package(s) failed to import", failed, results.len());
    }
    Ok(())
}

fn print_outcome(source: &str, outcome: &ImportOutcome) {
    let report = &outcome.report;
    println!(
        "✓ {}: {} \"{}\" → {} question(s) [{}]",
        source,
        outcome.manifest.main_library,
        outcome.manifest.title,
        outcome.questions.len(),
        outcome.package_id
    );
    if !report.skipped.is_empty() {
        println!(
            "    skipped {} of {} fragment(s): {} unrecognized, {} rejected, {} without library",
            report.skipped.len(),
            report.fragments,
            report.skipped_for(SkipReason::Unrecognized),
            report.skipped_for(SkipReason::ConversionRejected),
            report.skipped_for(SkipReason::MissingLibrary)
        );
    }
    if report.denied_entries > 0 {
        println!("    {} archive entries denied", report.denied_entries);
    }
    for question in &outcome.questions {
        println!(
            "    - {:<15} {}",
            question.question_type.to_string(),
            question.title
        );
    }
}

/// Show a package's manifest and fragment list
async fn inspect_package(input: PathBuf, json: bool) -> Result<()> {
    let options = crate::config::config()?.import_options();
    let importer = Importer::new(options);

    let inspection = tokio::task::spawn_blocking(move || importer.inspect(&input))
        .await
        .context("Inspect task panicked")??;

    if json {
        println!("{}", serde_json::to_string_pretty(&inspection)?);
        return Ok(());
    }

    let manifest = &inspection.manifest;
    println!("Title:        {}", manifest.title);
    println!("Main library: {}", manifest.main_library);
    if let Some(language) = &manifest.language {
        println!("Language:     {}", language);
    }
    if !manifest.preloaded_dependencies.is_empty() {
        println!("Dependencies:");
        for dep in &manifest.preloaded_dependencies {
            println!("  {}", dep);
        }
    }
    println!();

    if inspection.fragments.is_empty() {
        println!("No fragments found");
        return Ok(());
    }

    println!("{:<4} {:<28} {:<18} {}", "#", "LIBRARY", "CONVERTER", "TITLE");
    println!("{}", "-".repeat(80));
    for (i, fragment) in inspection.fragments.iter().enumerate() {
        println!(
            "{:<4} {:<28} {:<18} {}",
            i,
            fragment.library,
            fragment.converter.unwrap_or("(skipped)"),
            fragment.title
        );
    }

    Ok(())
}

/// List recent question bank entries
async fn list_bank(limit: usize) -> Result<()> {
    let bank = JsonlQuestionBank::new(crate::config::config()?.bank.clone());
    let entries = bank.entries()?;

    if entries.is_empty() {
        println!("No questions in {}", bank.path().display());
        return Ok(());
    }

    println!("{:<20} {:<18} {:<15} {}", "IMPORTED", "PACKAGE", "TYPE", "TITLE");
    println!("{}", "-".repeat(80));

    for entry in entries.iter().rev().take(limit) {
        println!(
            "{:<20} {:<18} {:<15} {}",
            entry.ts.format("%Y-%m-%d %H:%M"),
            entry.package_id,
            entry.question.question_type.to_string(),
            entry.question.title
        );
    }

    Ok(())
}

/// Print the resolved configuration
async fn show_config() -> Result<()> {
    let cfg = crate::config::config()?;

    println!("h5pimport configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:    {}", cfg.home.display());
    println!("  Scratch: {}", cfg.scratch.display());
    println!("  Bank:    {}", cfg.bank.display());
    println!(
        "  Media:   {}",
        cfg.media
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(not exported)".to_string())
    );
    println!();
    println!("Limits:");
    println!("  Max archive size:      {} bytes", cfg.limits.max_archive_bytes);
    println!("  Max entries:           {}", cfg.limits.max_entries);
    println!("  Max uncompressed size: {} bytes", cfg.limits.max_uncompressed_bytes);
    println!("  Denylist:              {}", cfg.limits.denylist_patterns.join(", "));
    println!();
    println!("Strict library names: {}", cfg.strict_library_names);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cli_parses_import() {
        let cli = Cli::try_parse_from(["h5pimport", "import", "a.h5p", "b/*.h5p", "--json"]).unwrap();
        match cli.command {
            Commands::Import { inputs, json, .. } => {
                assert_eq!(inputs, vec!["a.h5p".to_string(), "b/*.h5p".to_string()]);
                assert!(json);
            }
            _ => panic!("Expected import command"),
        }
    }

    #[test]
    fn test_import_requires_input() {
        assert!(Cli::try_parse_from(["h5pimport", "import"]).is_err());
    }

    #[test]
    fn test_expand_inputs() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("b.h5p"), "").unwrap();
        std::fs::write(temp.path().join("a.h5p"), "").unwrap();
        std::fs::write(temp.path().join("notes.txt"), "").unwrap();

        let pattern = format!("{}/*.h5p", temp.path().display());
        let paths = expand_inputs(&[pattern, "missing.h5p".to_string()]).unwrap();

        assert_eq!(paths.len(), 3);
        assert!(paths[0].ends_with("a.h5p"));
        assert!(paths[1].ends_with("b.h5p"));
        assert_eq!(paths[2], PathBuf::from("missing.h5p"));
    }
}
