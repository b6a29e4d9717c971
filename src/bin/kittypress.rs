//! kittypress - command-line archiver for the .kitty format
//!
//! Bundles files and directories into KP04 archives and extracts them,
//! compressing each entry with dictionary + Huffman coding.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use kittypress::{collect_inputs, create_archive, extract_archive, list_entries, ArchiveInput};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "kittypress")]
#[command(about = "Lossless multi-file archiver using dictionary + Huffman coding")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an archive: compress <input1> [<input2> ...] <output.kitty>
    Compress {
        /// Input files or directories, followed by the output archive
        #[arg(required = true, num_args = 2..)]
        paths: Vec<PathBuf>,
    },

    /// Extract an archive into a directory
    Decompress {
        /// Archive to extract
        archive: PathBuf,

        /// Directory the entries are restored under
        out_dir: PathBuf,
    },

    /// Show archive header and entry listing without extracting
    Info {
        /// Archive to inspect
        archive: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compress { mut paths } => {
            let output = paths.pop().expect("clap enforces at least two paths");
            compress_command(&paths, &output, cli.verbose, cli.quiet)
        }
        Commands::Decompress { archive, out_dir } => {
            decompress_command(&archive, &out_dir, cli.verbose, cli.quiet)
        }
        Commands::Info { archive } => info_command(&archive),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

// Two-step bar (start work, finish work) shown only for large jobs.
fn phase_progress(input_bytes: u64, quiet: bool, message: &'static str) -> Option<ProgressBar> {
    if quiet || input_bytes <= 1024 * 1024 {
        return None;
    }
    let pb = ProgressBar::new(2);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .expect("static template is valid")
            .progress_chars("#>-"),
    );
    pb.set_message(message);
    Some(pb)
}

fn compress_command(
    inputs: &[PathBuf],
    output: &PathBuf,
    verbose: bool,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();

    let entries: Vec<ArchiveInput> = collect_inputs(inputs)?;
    if entries.is_empty() {
        return Err("no regular files found among the inputs".into());
    }

    if verbose {
        for entry in &entries {
            println!("  queued {} as {}", entry.source.display(), entry.rel_path);
        }
    }
    if !quiet {
        println!(
            "Creating archive with {} file(s) -> {}",
            entries.len(),
            output.display()
        );
    }

    let mut total_input = 0u64;
    for entry in &entries {
        total_input += std::fs::metadata(&entry.source)?.len();
    }

    let progress = phase_progress(total_input, quiet, "Compressing...");
    if let Some(ref pb) = progress {
        pb.inc(1);
    }
    create_archive(&entries, output)?;
    if let Some(pb) = progress {
        pb.inc(1);
        pb.finish_with_message("Compression complete");
    }

    let archive_size = std::fs::metadata(output)?.len();
    if !quiet {
        let ratio = if total_input > 0 {
            archive_size as f64 / total_input as f64 * 100.0
        } else {
            100.0
        };
        println!("Archive created: {}", output.display());
        println!("  Input:   {} bytes", total_input);
        println!("  Archive: {} bytes", archive_size);
        println!("  Ratio:   {:.1}%", ratio);
        println!("  Time:    {:.2?}", start.elapsed());
    }

    Ok(())
}

fn decompress_command(
    archive: &PathBuf,
    out_dir: &PathBuf,
    verbose: bool,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();

    let info = list_entries(archive)?;
    if !quiet {
        println!(
            "Extracting {} file(s) -> {}",
            info.entries.len(),
            out_dir.display()
        );
    }
    if verbose {
        for entry in &info.entries {
            println!(
                "  {} ({} -> {} bytes)",
                entry.rel_path, entry.data_size, entry.orig_size
            );
        }
    }

    let archive_size = std::fs::metadata(archive)?.len();
    let progress = phase_progress(archive_size, quiet, "Extracting...");
    if let Some(ref pb) = progress {
        pb.inc(1);
    }
    extract_archive(archive, out_dir)?;
    if let Some(pb) = progress {
        pb.inc(1);
        pb.finish_with_message("Extraction complete");
    }

    if !quiet {
        println!("Extraction finished -> {}", out_dir.display());
        println!("  Time: {:.2?}", start.elapsed());
    }

    Ok(())
}

fn info_command(archive: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let info = list_entries(archive)?;
    let archive_size = std::fs::metadata(archive)?.len();

    println!("KittyPress archive: {}", archive.display());
    println!("  Size:    {} bytes", archive_size);
    println!("  Version: {}", info.version);
    println!("  Entries: {}", info.entries.len());

    let mut total_orig = 0u64;
    let mut total_data = 0u64;
    for entry in &info.entries {
        total_orig += entry.orig_size;
        total_data += entry.data_size;
        println!(
            "    {:>10}  {:>10}  {}",
            entry.orig_size, entry.data_size, entry.rel_path
        );
    }
    if total_orig > 0 {
        println!(
            "  Stored: {} of {} bytes ({:.1}%)",
            total_data,
            total_orig,
            total_data as f64 / total_orig as f64 * 100.0
        );
    }

    Ok(())
}
