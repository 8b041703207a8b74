//! multiseek - read a byte range out of a sequence of segment files
//!
//! Treats the given files as one continuous stream and copies bytes from it
//! to stdout, or prints the logical range each file occupies.

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use multiseek::{BoundaryTable, Origin, SegmentFactory, Settings};
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;

fn build_cli() -> Command {
    let command = Command::new("multiseek")
        .version(multiseek::VERSION)
        .about("Read a byte range from several files as if they were one")
        .long_about(
            "multiseek concatenates the given files (for example the pieces of a split \
             archive) into one logical stream, seeks to an offset and copies bytes to stdout. \
             Compressed pieces are decompressed transparently.",
        )
        .arg(
            Arg::new("files")
                .help("Segment files, in order")
                .required(true)
                .num_args(1..)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("offset")
                .long("offset")
                .short('o')
                .help("Logical offset to start from")
                .allow_negative_numbers(true)
                .value_parser(value_parser!(i64))
                .default_value("0"),
        )
        .arg(
            Arg::new("from-end")
                .long("from-end")
                .short('e')
                .help("Interpret --offset relative to the end (must be <= 0)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("length")
                .long("length")
                .short('n')
                .help("Number of bytes to copy (default: to the end)")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("boundaries")
                .long("boundaries")
                .short('b')
                .help("Print the logical range of each file instead of data")
                .action(ArgAction::SetTrue),
        );

    #[cfg(feature = "config")]
    let command = command.arg(
        Arg::new("config")
            .long("config")
            .help("Settings file (default: <config dir>/multiseek/config.toml)")
            .value_parser(value_parser!(PathBuf)),
    );

    command
}

#[cfg(feature = "config")]
fn load_settings(matches: &ArgMatches) -> Result<Settings> {
    let path = matches.get_one::<PathBuf>("config");
    Settings::load(path.map(PathBuf::as_path)).context("Failed to load settings")
}

#[cfg(not(feature = "config"))]
fn load_settings(_matches: &ArgMatches) -> Result<Settings> {
    Ok(Settings::default())
}

fn write_boundaries(out: &mut impl Write, table: &BoundaryTable, paths: &[PathBuf]) -> Result<()> {
    writeln!(out, "index\tstart\tend\tsize\tpath")?;
    for (index, (range, path)) in table.iter().zip(paths).enumerate() {
        let end = table
            .end_offset(index)
            .map_or_else(|| "-".to_string(), |end| end.to_string());
        writeln!(
            out,
            "{index}\t{}\t{end}\t{}\t{}",
            range.start,
            range.end - range.start,
            path.display()
        )?;
    }
    writeln!(out, "total\t\t\t{}", table.total_size())?;
    Ok(())
}

/// Copy up to `length` bytes (or everything) through a `buffer_size` buffer
fn copy_range(
    input: &mut impl Read,
    out: &mut impl Write,
    length: Option<u64>,
    buffer_size: usize,
) -> Result<u64> {
    let mut buf = vec![0u8; buffer_size];
    let mut remaining = length.unwrap_or(u64::MAX);
    let mut copied = 0u64;

    while remaining > 0 {
        let want = buf.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
        let n = match input.read(&mut buf[..want]) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(anyhow::Error::new(e).context("Failed to read stream data")),
        };
        out.write_all(&buf[..n]).context("Failed to write output")?;
        copied += n as u64;
        remaining -= n as u64;
    }

    Ok(copied)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging for development
    env_logger::init();

    let matches = build_cli().get_matches();

    let settings = load_settings(&matches)?;
    settings.validate()?;

    let paths: Vec<PathBuf> = matches
        .get_many::<PathBuf>("files")
        .context("at least one segment file is required")?
        .cloned()
        .collect();

    let factory = SegmentFactory::new(settings.clone());
    let mut stream = factory
        .open_all(&paths)
        .await
        .context("Failed to open segments")?;

    let stdout = io::stdout().lock();
    let mut out = BufWriter::new(stdout);

    if matches.get_flag("boundaries") {
        write_boundaries(&mut out, stream.boundaries(), &paths)?;
    } else {
        let offset = matches.get_one::<i64>("offset").copied().unwrap_or(0);
        let origin = if matches.get_flag("from-end") {
            Origin::End
        } else {
            Origin::Start
        };

        stream
            .seek_from(offset, origin)
            .with_context(|| format!("Failed to seek to offset {offset} ({origin:?})"))?;

        let copied = copy_range(
            &mut stream,
            &mut out,
            matches.get_one::<u64>("length").copied(),
            settings.copy_buffer_size,
        )?;
        log::debug!("copied {copied} bytes");
    }

    out.flush().context("Failed to flush output")?;
    stream.close().context("Failed to close segments")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiseek::MultiReadSeeker;
    use std::io::Cursor;

    #[test]
    fn test_version_constant() {
        assert!(!multiseek::VERSION.is_empty());
    }

    #[test]
    fn test_cli_parses_negative_offset_from_end() {
        let matches = build_cli()
            .try_get_matches_from(["multiseek", "--offset", "-2", "--from-end", "a.001", "a.002"])
            .unwrap();

        assert_eq!(matches.get_one::<i64>("offset"), Some(&-2));
        assert!(matches.get_flag("from-end"));
        let files: Vec<_> = matches.get_many::<PathBuf>("files").unwrap().collect();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_cli_requires_files() {
        assert!(build_cli().try_get_matches_from(["multiseek"]).is_err());
    }

    #[test]
    fn test_copy_range_uses_small_buffer_across_boundaries() {
        let mut stream = MultiReadSeeker::new(vec![
            Cursor::new(b"ABCDE".to_vec()),
            Cursor::new(b"FGH".to_vec()),
        ])
        .unwrap();
        stream.seek_from(3, Origin::Start).unwrap();

        let mut out = Vec::new();
        assert_eq!(copy_range(&mut stream, &mut out, Some(4), 3).unwrap(), 4);
        assert_eq!(out, b"DEFG");

        out.clear();
        assert_eq!(copy_range(&mut stream, &mut out, None, 1).unwrap(), 1);
        assert_eq!(out, b"H");
    }

    #[test]
    fn test_write_boundaries_marks_empty_sources() {
        let table = BoundaryTable::from_sizes([3, 0, 2]).unwrap();
        let paths = vec![
            PathBuf::from("a.001"),
            PathBuf::from("a.002"),
            PathBuf::from("a.003"),
        ];

        let mut out = Cursor::new(Vec::new());
        write_boundaries(&mut out, &table, &paths).unwrap();
        let text = String::from_utf8(out.into_inner()).unwrap();

        assert!(text.contains("0\t0\t2\t3\ta.001"));
        assert!(text.contains("1\t3\t-\t0\ta.002"));
        assert!(text.contains("2\t3\t4\t2\ta.003"));
        assert!(text.ends_with("total\t\t\t5\n"));
    }
}
