//! Main entry point for the embedzip CLI application.
//!
//! Lists and extracts the archive appended to a host file, by default the
//! embedzip executable itself. Default arguments may be shipped in that
//! archive as `arguments.txt`.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Component, Path, PathBuf};
use tracing_subscriber::EnvFilter;

use embedzip::{
    Cli, CurrentExe, EmbeddedArchive, HostImage, HostPath, ReadAt, ZipFileEntry,
    load_embedded_arguments,
};

/// Application entry point.
///
/// Applies embedded default arguments, parses the result, and dispatches
/// to listing, locating or extraction.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = load_embedded_arguments()
        .await
        .context("Failed to load embedded arguments")?;
    let cli = Cli::parse_from(&args);

    if cli.show_args {
        for arg in &args {
            println!("{}", arg.to_string_lossy());
        }
        return Ok(());
    }

    match &cli.file {
        Some(path) => run(&HostPath(path.clone()), &cli).await,
        None => run(&CurrentExe, &cli).await,
    }
}

/// Open the archive appended to `host` and process it.
async fn run<H: HostImage>(host: &H, cli: &Cli) -> Result<()>
where
    H::Reader: 'static,
{
    let archive = EmbeddedArchive::open_with(host)
        .await
        .context("Failed to open embedded archive")?;

    if cli.locate {
        let span = archive.span();
        println!(
            "offset {}  size {}  entries {}",
            span.start,
            span.size,
            archive.entries().len()
        );
        return Ok(());
    }

    process_zip(&archive, cli).await?;
    archive.close();
    Ok(())
}

/// Process the archive based on CLI options.
///
/// - List mode (`-l` or `-v`): Display archive contents
/// - Extract mode: Extract entries matching the specified filters
async fn process_zip<R: ReadAt + 'static>(archive: &EmbeddedArchive<R>, cli: &Cli) -> Result<()> {
    if cli.list || cli.verbose {
        list_files(archive.entries(), cli.verbose);
        return Ok(());
    }

    // 1. Skip directories (created during extraction)
    // 2. If specific entries are requested, only include matching ones
    // 3. Drop entries matching the exclusion patterns
    let files_to_extract: Vec<_> = archive
        .entries()
        .iter()
        .filter(|e| {
            if e.is_directory {
                return false;
            }

            if !cli.entries.is_empty() {
                let matches = cli.entries.iter().any(|f| {
                    if has_glob_chars(f) {
                        glob_match(f, &e.file_name)
                    } else {
                        e.file_name == *f || base_name(&e.file_name) == *f
                    }
                });
                if !matches {
                    return false;
                }
            }

            !cli
                .exclude
                .iter()
                .any(|x| e.file_name.contains(x) || glob_match(x, &e.file_name))
        })
        .collect();

    let multiple_files = cli.pipe && files_to_extract.len() > 1;
    for entry in files_to_extract {
        extract_file(archive, entry, cli, multiple_files).await?;
    }

    Ok(())
}

/// List entries in the archive.
///
/// - Simple format (`-l`): Just names, one per line
/// - Verbose format (`-v`): Size, compression ratio and timestamps
fn list_files(entries: &[ZipFileEntry], verbose: bool) {
    if verbose {
        println!(
            "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  Name",
            "Length", "Size", "Cmpr", "Date", "Time"
        );
        println!("{}", "-".repeat(70));
    }

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for entry in entries {
        if !verbose {
            println!("{}", entry.file_name);
            continue;
        }

        let (year, month, day) = entry.mod_date();
        let (hour, minute, _second) = entry.mod_time();

        println!(
            "{:>10}  {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {}",
            entry.uncompressed_size,
            entry.compressed_size,
            ratio(entry.compressed_size, entry.uncompressed_size),
            year,
            month,
            day,
            hour,
            minute,
            entry.file_name
        );

        if !entry.is_directory {
            total_uncompressed += entry.uncompressed_size;
            total_compressed += entry.compressed_size;
            file_count += 1;
        }
    }

    if verbose {
        println!("{}", "-".repeat(70));
        println!(
            "{:>10}  {:>10}  {}  {:>21}  {} files",
            total_uncompressed,
            total_compressed,
            ratio(total_compressed, total_uncompressed),
            "",
            file_count
        );
    }
}

/// Space saved by compression, as a right-aligned percentage
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed > 0 && compressed <= uncompressed {
        format!("{:>4}%", 100 - (compressed * 100 / uncompressed))
    } else {
        "  0%".to_string()
    }
}

/// Extract a single entry.
///
/// - Pipe mode (`-p`): Write to stdout instead of file
/// - Custom output directory (`-d`)
/// - Junk paths (`-j`): Ignore directory structure in archive
/// - Overwrite control (`-n`, `-o`)
async fn extract_file<R: ReadAt + 'static>(
    archive: &EmbeddedArchive<R>,
    entry: &ZipFileEntry,
    cli: &Cli,
    show_filename: bool,
) -> Result<()> {
    let extractor = archive.extractor();

    if cli.pipe {
        if show_filename {
            use tokio::io::AsyncWriteExt;
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(format!("--- {} ---\n", entry.file_name).as_bytes())
                .await?;
        }
        return extractor.extract_to_stdout(entry).await;
    }

    let file_name = if cli.junk_paths {
        base_name(&entry.file_name).to_string()
    } else {
        entry.file_name.clone()
    };
    if !is_contained(&file_name) {
        tracing::warn!(name = %entry.file_name, "skipping entry that escapes the output directory");
        if !cli.is_quiet() {
            eprintln!("Skipping: {} (unsafe path)", entry.file_name);
        }
        return Ok(());
    }
    let output_path = match &cli.extract_dir {
        Some(dir) => dir.join(&file_name),
        None => PathBuf::from(&file_name),
    };

    if output_path.exists() {
        if cli.never_overwrite {
            if !cli.is_quiet() {
                eprintln!("Skipping: {} (file exists)", entry.file_name);
            }
            return Ok(());
        }

        if !cli.overwrite {
            if !cli.is_quiet() {
                eprintln!("Skipping: {} (use -o to overwrite)", entry.file_name);
            }
            return Ok(());
        }
    }

    if !cli.is_quiet() {
        println!("  extracting: {}", entry.file_name);
    }

    extractor.extract_to_file(entry, &output_path).await?;

    Ok(())
}

/// Last path component of an archive name
fn base_name(name: &str) -> &str {
    Path::new(name)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
}

/// Whether `name` joined onto a directory stays below that directory
fn is_contained(name: &str) -> bool {
    let mut normal = false;
    for component in Path::new(name).components() {
        match component {
            Component::Normal(_) => normal = true,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    normal
}

fn has_glob_chars(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Glob matching supporting `*` (zero or more characters) and `?`
/// (exactly one character).
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern_chars: Vec<char> = pattern.chars().collect();
    let text_chars: Vec<char> = text.chars().collect();

    fn do_match(pattern: &[char], text: &[char]) -> bool {
        match (pattern.first(), text.first()) {
            (None, None) => true,
            (Some('*'), _) => {
                do_match(&pattern[1..], text) || (!text.is_empty() && do_match(pattern, &text[1..]))
            }
            (Some('?'), Some(_)) => do_match(&pattern[1..], &text[1..]),
            (Some(p), Some(t)) if *p == *t => do_match(&pattern[1..], &text[1..]),
            _ => false,
        }
    }

    do_match(&pattern_chars, &text_chars)
}
