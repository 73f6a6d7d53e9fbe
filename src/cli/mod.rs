//! # CLI Module
//!
//! Command-line interface for a pixfolio library.
//!
//! ## Usage
//! ```bash
//! # Bring the record cache and thumbnails up to date
//! pixfolio --root ~/Pictures/lib reconcile
//!
//! # Find byte-identical copies without moving anything
//! pixfolio --root ~/Pictures/lib dedup --dry-run
//!
//! # Canonical names from capture dates
//! pixfolio --root ~/Pictures/lib rename-by-date
//!
//! # JSON output
//! pixfolio --root ~/Pictures/lib --output json info img_210501_090000_n0
//! ```

use chrono::NaiveDateTime;
use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use pixfolio::core::integrity::{CleanupReport, DedupReport, RenameReport, TrashReport};
use pixfolio::core::library::{Library, ALL_FOLDER};
use pixfolio::core::PictureRecord;
use pixfolio::error::{LibraryError, Result};
use pixfolio::events::{
    BatchKind, Event, EventChannel, EventReceiver, IntegrityEvent, ReconcileEvent,
};
use serde::Serialize;
use std::path::PathBuf;
use std::thread;

/// pixfolio - a photo library that lives in the files
#[derive(Parser, Debug)]
#[command(name = "pixfolio")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Library root (holds All/, Trash/ and albums)
    #[arg(short, long, global = true, default_value = ".")]
    root: PathBuf,

    /// Thumbnail directory
    #[arg(long, global = true)]
    thumb_dir: Option<PathBuf>,

    /// Worker threads per batch
    #[arg(short, long, global = true)]
    workers: Option<usize>,

    /// Output format
    #[arg(short, long, global = true, default_value = "pretty")]
    output: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Merge a folder's files with the record cache and refresh thumbnails
    Reconcile {
        /// Folder name under the root
        #[arg(default_value = ALL_FOLDER)]
        folder: String,
    },

    /// Rename every picture to img_<yymmdd_HHMMSS>_n<N>
    RenameByDate,

    /// Move byte-identical copies to the trash
    Dedup {
        /// Only report what would be moved
        #[arg(long)]
        dry_run: bool,
    },

    /// Drop cached records whose files are gone
    CleanCache {
        /// Only report what would be dropped
        #[arg(long)]
        dry_run: bool,
    },

    /// Give every file in All/ a distinct base name
    Uniquify,

    /// List album folders
    Albums,

    /// Link files from All/ into an album
    Link {
        album: String,
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Remove album links (files stay in All/)
    Unlink {
        album: String,
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Move files from All/ to Trash/
    Trash {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Move files from Trash/ back to All/
    Untrash {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Rotate a picture by 90, -90 or 180 degrees
    Rotate {
        key: String,
        #[arg(allow_hyphen_values = true)]
        degrees: i32,
    },

    /// Set the capture date of a picture ("2021-05-01 09:00:00")
    SetDate {
        key: String,
        #[arg(value_parser = parse_date)]
        date: NaiveDateTime,
    },

    /// Copy a picture under its next canonical name
    Duplicate {
        key: String,
        /// Album to link the copy into
        #[arg(long)]
        album: Option<String>,
    },

    /// Show the cached record of a picture
    Info { key: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

fn parse_date(text: &str) -> std::result::Result<NaiveDateTime, String> {
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y:%m:%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .ok_or_else(|| format!("expected YYYY-MM-DD HH:MM:SS, got '{}'", text))
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let term = Term::stderr();
    let pretty = cli.output == OutputFormat::Pretty;

    let (sender, receiver) = EventChannel::new();
    let mut builder = Library::builder(&cli.root).events(sender);
    if let Some(dir) = &cli.thumb_dir {
        builder = builder.thumb_dir(dir);
    }
    if let Some(workers) = cli.workers {
        builder = builder.workers(workers);
    }
    let library = builder.open()?;

    let event_thread = {
        let verbose = cli.verbose;
        thread::spawn(move || report_events(receiver, pretty, verbose))
    };

    let outcome = execute(&library, cli.command, &term, cli.output);

    // dropping the library waits for the last save and closes the channel
    drop(library);
    event_thread.join().ok();
    outcome
}

fn execute(library: &Library, command: Commands, term: &Term, output: OutputFormat) -> Result<()> {
    match command {
        Commands::Reconcile { folder } => {
            let pass = library.reconcile(&folder)?;
            if output == OutputFormat::Json {
                return print_json(&pass.records);
            }
            term.write_line(&format!(
                "{} {} pictures in {} ({} decoded, {} thumbnails built)",
                style("✓").green().bold(),
                style(pass.records.len()).cyan(),
                folder,
                pass.decoded,
                pass.thumbnails_generated
            ))
            .ok();
            Ok(())
        }
        Commands::RenameByDate => emit(term, output, &library.rename_by_date()?, print_rename),
        Commands::Uniquify => emit(term, output, &library.uniquify_base_names()?, print_rename),
        Commands::Dedup { dry_run } => emit(term, output, &library.clean_duplicates(dry_run)?, print_dedup),
        Commands::CleanCache { dry_run } => emit(term, output, &library.clean_cache(dry_run)?, print_cleanup),
        Commands::Albums => {
            let albums = library.albums();
            if output == OutputFormat::Json {
                return print_json(&albums);
            }
            for album in albums {
                println!("{}", album);
            }
            Ok(())
        }
        Commands::Link { album, names } => {
            let created = library.link_to_album(&album, &names)?;
            term.write_line(&format!("Linked {} files into {}", created, style(&album).cyan()))
                .ok();
            Ok(())
        }
        Commands::Unlink { album, names } => {
            let removed = library.unlink_from_album(&album, &names)?;
            term.write_line(&format!("Removed {} links from {}", removed, style(&album).cyan()))
                .ok();
            Ok(())
        }
        Commands::Trash { names } => emit(term, output, &library.trash_files(&names)?, print_trash),
        Commands::Untrash { names } => emit(term, output, &library.untrash_files(&names)?, print_trash),
        Commands::Rotate { key, degrees } => emit(term, output, &library.rotate(&key, degrees)?, print_record),
        Commands::SetDate { key, date } => {
            emit(term, output, &library.set_capture_date(&key, date)?, print_record)
        }
        Commands::Duplicate { key, album } => emit(
            term,
            output,
            &library.duplicate(&key, album.as_deref())?,
            print_record,
        ),
        Commands::Info { key } => {
            let record = library.record(&key).ok_or_else(|| {
                LibraryError::Config(format!("no picture '{}' in the record cache", key))
            })?;
            emit(term, output, &record, print_record)
        }
    }
}

fn emit<T: Serialize>(
    term: &Term,
    output: OutputFormat,
    value: &T,
    pretty: fn(&Term, &T),
) -> Result<()> {
    match output {
        OutputFormat::Pretty => {
            pretty(term, value);
            Ok(())
        }
        OutputFormat::Json => print_json(value),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| LibraryError::Config(format!("cannot render JSON: {}", e)))?;
    println!("{}", text);
    Ok(())
}

/// Drive a progress bar from library events until the channel closes
fn report_events(receiver: EventReceiver, pretty: bool, verbose: bool) {
    let progress = pretty.then(|| {
        let pb = ProgressBar::new(0);
        if let Ok(bar) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(bar.progress_chars("█▓░"));
        }
        pb
    });

    for event in receiver.iter() {
        let Some(pb) = &progress else {
            continue;
        };
        match event {
            Event::Progress(p) => {
                pb.set_length(p.total as u64);
                pb.set_position(p.completed as u64);
                pb.set_message(match p.batch {
                    BatchKind::Reconcile => "reading pictures",
                    BatchKind::Duplicates => "comparing files",
                    BatchKind::CacheCleanup => "checking cache",
                });
                if p.completed == p.total {
                    pb.finish_and_clear();
                }
            }
            Event::Reconcile(ReconcileEvent::Started { total_files, .. }) => {
                pb.reset();
                pb.set_length(total_files as u64);
            }
            Event::Reconcile(ReconcileEvent::FileSkipped { path, message }) if verbose => {
                pb.println(format!("{} {}: {}", style("skipped").yellow(), path.display(), message));
            }
            Event::Reconcile(ReconcileEvent::ThumbnailFailed { path, message }) if verbose => {
                pb.println(format!("{} {}: {}", style("no thumbnail").yellow(), path.display(), message));
            }
            Event::Integrity(IntegrityEvent::Error { name, message }) => {
                pb.println(format!("{} {}: {}", style("error").red(), name, message));
            }
            Event::Integrity(IntegrityEvent::CacheMismatch { key, differences }) if verbose => {
                pb.println(format!("{} {}", style("changed").yellow(), key));
                for difference in differences {
                    pb.println(format!("    {}", style(difference).dim()));
                }
            }
            _ => {}
        }
    }
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
}

fn print_errors(term: &Term, errors: &[String]) {
    for error in errors {
        term.write_line(&format!("  {} {}", style("✗").red(), error)).ok();
    }
}

fn print_rename(term: &Term, report: &RenameReport) {
    for (from, to) in &report.renamed {
        term.write_line(&format!("  {} → {}", style(from).dim(), to)).ok();
    }
    term.write_line(&format!(
        "{} {} renamed, {} unchanged",
        style("✓").green().bold(),
        style(report.renamed.len()).cyan(),
        report.unchanged
    ))
    .ok();
    print_errors(term, &report.errors);
}

fn print_dedup(term: &Term, report: &DedupReport) {
    for pair in &report.pairs {
        term.write_line(&format!(
            "  {} {}  {} {}",
            style("★").green(),
            pair.kept,
            style("○").dim(),
            pair.removed
        ))
        .ok();
    }
    let verb = if report.dry_run { "would be trashed" } else { "trashed" };
    term.write_line(&format!(
        "{} {} duplicates {} ({} size buckets compared)",
        style("✓").green().bold(),
        style(report.pairs.len()).cyan(),
        verb,
        report.buckets
    ))
    .ok();
    print_errors(term, &report.errors);
}

fn print_cleanup(term: &Term, report: &CleanupReport) {
    for key in &report.pruned {
        term.write_line(&format!("  {} {}", style("-").red(), key)).ok();
    }
    let verb = if report.dry_run { "would be dropped" } else { "dropped" };
    term.write_line(&format!(
        "{} {} records checked, {} out of date, {} {}",
        style("✓").green().bold(),
        report.checked,
        report.mismatched,
        style(report.pruned.len()).cyan(),
        verb
    ))
    .ok();
}

fn print_trash(term: &Term, report: &TrashReport) {
    term.write_line(&format!(
        "{} {} files moved, {} album links removed",
        style("✓").green().bold(),
        style(report.moved.len()).cyan(),
        report.links_removed
    ))
    .ok();
    print_errors(term, &report.errors);
}

fn print_record(term: &Term, record: &PictureRecord) {
    let size = record.display_size();
    term.write_line(&format!("{}", style(record.file.display()).bold())).ok();
    let date = record
        .date_taken
        .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".into());
    term.write_line(&format!("  taken        {}", date)).ok();
    term.write_line(&format!("  size         {} x {}", size.width, size.height)).ok();
    term.write_line(&format!("  orientation  {:?}", record.orient)).ok();
    term.write_line(&format!("  number       {}", record.number)).ok();
    if record.gps_loc.is_set() {
        term.write_line(&format!(
            "  location     {:.5}, {:.5}",
            record.gps_loc.lat, record.gps_loc.long
        ))
        .ok();
    }
    if !record.desc.is_empty() {
        term.write_line(&format!("  description  {}", record.desc)).ok();
    }
    for (name, value) in &record.tags {
        term.write_line(&format!("  {:<12} {}", style(name).dim(), value)).ok();
    }
}
