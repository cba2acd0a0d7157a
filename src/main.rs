//! Main entry point for the memzip CLI application.
//!
//! This binary loads a ZIP archive from the local filesystem or an HTTP URL
//! into memory and lists, tests or extracts it, or stores local files in a
//! new archive.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;

use memzip::io::{ArchiveSource, HttpSource, LocalSource};
use memzip::zip::{Archive, Entry, NewEntry, create, encoded_len};
use memzip::cli::{Cli, Mode};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    if cli.mode() == Mode::Create {
        return create_archive(&cli).await;
    }

    let data = if cli.is_http_url() {
        let source = HttpSource::new(cli.file.clone())?;
        let data = source.load().await?;

        if !cli.is_quiet() {
            eprintln!(
                "Downloaded {} from {}",
                format_size(source.transferred_bytes()),
                source.location()
            );
        }
        data
    } else {
        LocalSource::new(Path::new(&cli.file))?.load().await?
    };

    process_zip(&data, &cli).await
}

/// Open the loaded archive and run the list, test or extract mode on it.
async fn process_zip(data: &[u8], cli: &Cli) -> Result<()> {
    let archive =
        Archive::open(data).with_context(|| format!("{}: cannot open archive", cli.file))?;

    let entries = archive
        .entries()
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("{}: corrupt central directory", cli.file))?;

    let selected = || {
        entries
            .iter()
            .filter(|e| !e.is_directory() && is_selected(e, cli))
            .collect::<Vec<_>>()
    };

    match cli.mode() {
        Mode::List { verbose } => list_files(&entries, verbose),
        Mode::Test => test_files(&archive, &selected(), cli)?,
        Mode::Extract => {
            let selected = selected();
            let banners = cli.pipe && selected.len() > 1;
            for entry in selected {
                extract_file(&archive, entry, cli, banners).await?;
            }
        }
        Mode::Create => bail!("{}: create mode does not read an archive", cli.file),
    }
    Ok(())
}

/// Apply the positional-name and `-x` filters to one entry.
fn is_selected(entry: &Entry<'_>, cli: &Cli) -> bool {
    let name = display_name(entry);

    if !cli.files.is_empty() {
        let matches = cli.files.iter().any(|f| {
            if has_glob_chars(f) {
                glob_match(f, &name)
            } else {
                // Plain names match the full path or the last component
                let basename = Path::new(&*name)
                    .file_name()
                    .map(|s| s.to_string_lossy())
                    .unwrap_or_default();
                name == f.as_str() || basename == f.as_str()
            }
        });
        if !matches {
            return false;
        }
    }

    !cli
        .exclude
        .iter()
        .any(|x| name.contains(x.as_str()) || glob_match(x, &name))
}

/// Print one name per line, or with `verbose` a table of sizes, ratio,
/// modification time and CRC-32 followed by a totals line.
fn list_files(entries: &[Entry<'_>], verbose: bool) {
    if verbose {
        println!(
            "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  {:>8}  Name",
            "Length", "Size", "Cmpr", "Date", "Time", "CRC-32"
        );
        println!("{}", "-".repeat(80));
    }

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for entry in entries {
        if !verbose {
            println!("{}", display_name(entry));
            continue;
        }

        let (year, month, day) = entry.mod_date();
        let (hour, minute, _second) = entry.mod_time();

        println!(
            "{:>10}  {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {:08x}  {}",
            entry.uncompressed_size,
            entry.compressed_size,
            ratio(entry.compressed_size as u64, entry.uncompressed_size as u64),
            year,
            month,
            day,
            hour,
            minute,
            entry.crc32,
            display_name(entry)
        );

        if !entry.is_directory() {
            total_uncompressed += entry.uncompressed_size as u64;
            total_compressed += entry.compressed_size as u64;
            file_count += 1;
        }
    }

    if verbose {
        println!("{}", "-".repeat(80));
        println!(
            "{:>10}  {:>10}  {}  {:>31}  {} files",
            total_uncompressed,
            total_compressed,
            ratio(total_compressed, total_uncompressed),
            "",
            file_count
        );
    }
}

/// Extract every selected entry to memory and verify its CRC-32.
fn test_files(archive: &Archive<'_>, entries: &[&Entry<'_>], cli: &Cli) -> Result<()> {
    let mut failures = 0usize;
    let mut buf = Vec::new();

    for entry in entries {
        buf.resize(entry.uncompressed_size as usize, 0);
        match archive.extract_verified(entry, &mut buf) {
            Ok(_) => {
                if !cli.is_quiet() {
                    println!("    testing: {:<40}  OK", display_name(entry));
                }
            }
            Err(err) => {
                failures += 1;
                if !cli.is_very_quiet() {
                    println!("    testing: {:<40}  {}", display_name(entry), err);
                }
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} entries failed in {}", entries.len(), cli.file);
    }
    if !cli.is_very_quiet() {
        println!("No errors detected in compressed data of {}.", cli.file);
    }
    Ok(())
}

/// Extract one entry to stdout (`-p`) or to disk, honouring `-d`, `-j`,
/// `-n` and `-o`. The CRC-32 is checked before anything is written.
async fn extract_file(
    archive: &Archive<'_>,
    entry: &Entry<'_>,
    cli: &Cli,
    banner: bool,
) -> Result<()> {
    let name = display_name(entry);

    let mut data = vec![0u8; entry.uncompressed_size as usize];
    archive
        .extract_verified(entry, &mut data)
        .with_context(|| format!("{name}: extraction failed"))?;

    if cli.pipe {
        let mut stdout = tokio::io::stdout();
        if banner {
            stdout
                .write_all(format!("--- {name} ---\n").as_bytes())
                .await?;
        }
        stdout.write_all(&data).await?;
        stdout.flush().await?;
        return Ok(());
    }

    // Never write outside the target directory
    let Some(relative) = enclosed_path(&name) else {
        if !cli.is_very_quiet() {
            eprintln!("Skipping: {name} (unsafe path)");
        }
        return Ok(());
    };

    let relative = if cli.junk_paths {
        relative
            .file_name()
            .map(PathBuf::from)
            .unwrap_or(relative)
    } else {
        relative
    };

    let output_path = match cli.extract_dir {
        Some(ref dir) => PathBuf::from(dir).join(&relative),
        None => relative,
    };

    // Without -o, existing files are kept
    if output_path.exists() {
        if cli.never_overwrite {
            if !cli.is_quiet() {
                eprintln!("Skipping: {name} (file exists)");
            }
            return Ok(());
        }

        if !cli.overwrite {
            if !cli.is_quiet() {
                eprintln!("Skipping: {name} (use -o to overwrite)");
            }
            return Ok(());
        }
    }

    if !cli.is_quiet() {
        println!("  extracting: {name}");
    }

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(&output_path, &data).await?;

    Ok(())
}

/// Store the listed input files in a new archive.
///
/// Entry names are the paths as given, with `\` turned into `/` and any
/// leading `/` removed.
async fn create_archive(cli: &Cli) -> Result<()> {
    if cli.files.is_empty() {
        bail!("nothing to add: give the input files after {}", cli.file);
    }

    let output_path = Path::new(&cli.file);
    if output_path.exists() && !cli.overwrite {
        bail!("{}: already exists (use -o to overwrite)", cli.file);
    }

    let mut inputs = Vec::with_capacity(cli.files.len());
    for file in &cli.files {
        if cli.exclude.iter().any(|x| file.contains(x.as_str()) || glob_match(x, file)) {
            continue;
        }
        let path = Path::new(file);
        if path.is_dir() {
            if !cli.is_quiet() {
                eprintln!("Skipping: {file} (directory)");
            }
            continue;
        }
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("{file}: cannot read"))?;
        let name = file.replace('\\', "/").trim_start_matches('/').to_string();
        inputs.push((name, data));
    }

    let entries: Vec<NewEntry<'_>> = inputs
        .iter()
        .map(|(name, data)| NewEntry::new(name, data))
        .collect();

    let mut buf = vec![0u8; encoded_len(&entries)?];
    let written = create(&entries, &mut buf)?;
    buf.truncate(written);

    if !cli.is_quiet() {
        for entry in &entries {
            println!(
                "  adding: {} (stored 0%)",
                String::from_utf8_lossy(entry.name)
            );
        }
    }

    tokio::fs::write(output_path, &buf)
        .await
        .with_context(|| format!("{}: cannot write", cli.file))?;

    if !cli.is_very_quiet() {
        eprintln!(
            "Wrote {} ({} entries, {})",
            cli.file,
            entries.len(),
            format_size(written as u64)
        );
    }
    Ok(())
}

/// Entry name for display and matching; invalid UTF-8 is replaced.
fn display_name<'a>(entry: &Entry<'a>) -> std::borrow::Cow<'a, str> {
    String::from_utf8_lossy(entry.name)
}

/// Relative path for an entry name, or `None` if it is absolute, contains
/// a NUL byte, or climbs above its starting directory.
fn enclosed_path(name: &str) -> Option<PathBuf> {
    if name.contains('\0') {
        return None;
    }
    let path = PathBuf::from(name);
    let mut depth = 0usize;
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => return None,
            Component::ParentDir => depth = depth.checked_sub(1)?,
            Component::Normal(_) => depth += 1,
            Component::CurDir => (),
        }
    }
    Some(path)
}

/// Compression ratio as percentage saved.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed > 0 && compressed <= uncompressed {
        format!("{:>4}%", 100 - (compressed * 100 / uncompressed))
    } else {
        "  0%".to_string()
    }
}

fn has_glob_chars(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Glob matching where `*` matches any run of characters, `?` exactly one.
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    // Greedy match with a single backtrack point at the last `*`
    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;
    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                star = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match star {
                Some((sp, st)) => {
                    p = sp + 1;
                    t = st + 1;
                    star = Some((sp, st + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|&c| c == '*')
}

/// Human-readable byte count using binary units.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_patterns() {
        assert!(glob_match("*.txt", "readme.txt"));
        assert!(glob_match("file?.dat", "file1.dat"));
        assert!(glob_match("a*b*c", "aXXbYYc"));
        assert!(glob_match("*", ""));
        assert!(!glob_match("*.txt", "readme.md"));
        assert!(!glob_match("?", ""));
    }

    #[test]
    fn enclosed_paths() {
        assert_eq!(enclosed_path("dir/a.txt"), Some(PathBuf::from("dir/a.txt")));
        assert_eq!(enclosed_path("dir/../a.txt"), Some(PathBuf::from("dir/../a.txt")));
        assert_eq!(enclosed_path("../a.txt"), None);
        assert_eq!(enclosed_path("/etc/passwd"), None);
        assert_eq!(enclosed_path("a\0b"), None);
    }

    #[test]
    fn sizes_and_ratios() {
        assert_eq!(format_size(500), "500 bytes");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1048576), "1.00 MB");
        assert_eq!(ratio(25, 100), "  75%");
        assert_eq!(ratio(0, 0), "  0%");
    }
}
