//! `yearlink run | validate | inspect`.

use std::path::{Path, PathBuf};

use tracing::info;
use yearlink_config::{CollectionFiles, Settings};
use yearlink_io::{load_records, write_records, IoError};
use yearlink_xref::{CollectionReport, FieldTable, RunInput, RunOptions};

use crate::CliError;

pub struct RunArgs {
    pub config: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    /// `Some` when `--pretty` or `--compact` overrides the settings file.
    pub pretty: Option<bool>,
    pub dry_run: bool,
    pub json: bool,
    pub report: Option<PathBuf>,
}

fn load_settings(config: Option<PathBuf>) -> Result<Settings, CliError> {
    let path = config.unwrap_or_else(Settings::default_path);
    info!(path = %path.display(), "loading settings");
    Settings::load(&path).map_err(CliError::config)
}

fn load_collection(path: &Path) -> Result<Vec<serde_json::Value>, CliError> {
    load_records(path).map_err(|e| {
        let missing = matches!(&e, IoError::Read { source, .. } if source.kind() == std::io::ErrorKind::NotFound);
        let err = CliError::io(e);
        if missing {
            err.with_hint("check data_dir and the collection file names in the settings file")
        } else {
            err
        }
    })
}

fn summary_line(report: &CollectionReport) -> String {
    format!(
        "{}: {} records across {} year(s), {} matched pairs ({} new links), {} linked records",
        report.name,
        report.records,
        report.years.len(),
        report.matched_pairs,
        report.new_links,
        report.linked_records,
    )
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let mut settings = load_settings(args.config)?;
    if let Some(dir) = args.data_dir {
        settings.data_dir = dir;
    }
    if let Some(pretty) = args.pretty {
        settings.pretty_print = pretty;
    }

    let transactees = load_collection(&settings.input_path(&settings.transactees))?;
    let parties = load_collection(&settings.input_path(&settings.parties))?;

    let options = RunOptions {
        field_table: FieldTable::standard(),
        unknown_kind: settings.unknown_kind,
    };
    let output = yearlink_xref::run(RunInput { transactees, parties }, &options).map_err(CliError::record)?;

    // Nothing is written unless both collections linked cleanly
    if args.dry_run {
        eprintln!("dry run: no collection written");
    } else {
        write_collection(&settings, &settings.transactees, &output.transactees)?;
        write_collection(&settings, &settings.parties, &output.parties)?;
    }

    if args.json || args.report.is_some() {
        let json_str = serde_json::to_string_pretty(&output.result)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;

        if let Some(ref path) = args.report {
            std::fs::write(path, &json_str)
                .map_err(|e| CliError::general(format!("cannot write report: {e}")))?;
            eprintln!("wrote {}", path.display());
        }

        if args.json {
            println!("{json_str}");
        }
    }

    // Human summary to stderr
    eprintln!("{}", summary_line(&output.result.transactees));
    eprintln!("{}", summary_line(&output.result.parties));

    Ok(())
}

fn write_collection(
    settings: &Settings,
    files: &CollectionFiles,
    records: &[serde_json::Value],
) -> Result<(), CliError> {
    let path = settings.output_path(files);
    write_records(&path, records, settings.pretty_print).map_err(CliError::io)?;
    eprintln!("wrote {} records to {}", records.len(), path.display());
    Ok(())
}

pub fn cmd_validate(config: Option<PathBuf>) -> Result<(), CliError> {
    let settings = load_settings(config)?;

    eprintln!(
        "valid: data_dir {}, unknown kinds {}, {} output",
        settings.data_dir.display(),
        match settings.unknown_kind {
            yearlink_xref::UnknownKindPolicy::Fail => "abort",
            yearlink_xref::UnknownKindPolicy::Isolate => "stay unlinked",
        },
        if settings.pretty_print { "pretty" } else { "compact" },
    );
    for (name, files) in [("transactees", &settings.transactees), ("parties", &settings.parties)] {
        let input = settings.input_path(files);
        eprintln!(
            "  {name}: {} -> {}{}",
            input.display(),
            settings.output_path(files).display(),
            if input.exists() { "" } else { " (input not found)" },
        );
    }
    Ok(())
}

pub fn cmd_inspect(file: PathBuf, json: bool) -> Result<(), CliError> {
    let records = load_collection(&file)?;
    let name = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "records".into());

    let profile = yearlink_xref::inspect_collection(&name, records).map_err(CliError::record)?;

    if json {
        let json_str = serde_json::to_string_pretty(&profile)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
        return Ok(());
    }

    eprintln!(
        "{}: {} records across {} year(s), {} already linked",
        profile.name,
        profile.records,
        profile.years.len(),
        profile.linked_records,
    );
    for y in &profile.years {
        eprintln!("  {:>6}  {:>8}", y.year, y.records);
    }
    for (kind, count) in &profile.kinds {
        eprintln!("  {kind:<12} {count:>8}");
    }
    Ok(())
}
