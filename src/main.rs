//! Main entry point for the zipstream CLI application.
//!
//! Streams a ZIP archive from a local file or HTTP URL through the decoder,
//! listing entries or piping their contents as the bytes arrive.

use anyhow::{Result, bail};
use clap::Parser;
use std::path::Path;
use tokio::io::AsyncWriteExt;

use zipstream::pipe::PayloadWriter;
use zipstream::zip::{EndOfCentralDirectoryRecord, LocalFileHeader};
use zipstream::{
    ArchiveEvent, ChunkSource, Cli, DecoderOptions, HttpStreamSource, LocalFileSource, ZipStream,
};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.is_http_url() {
        let source = HttpStreamSource::new(cli.file.clone()).await?;
        let transferred = process_zip(source, &cli).await?;

        // Display network transfer statistics for HTTP sources
        if !cli.is_quiet() {
            eprintln!("\nTotal bytes transferred: {}", format_size(transferred));
        }
    } else {
        let source = LocalFileSource::open(Path::new(&cli.file), cli.chunk_size).await?;
        process_zip(source, &cli).await?;
    }

    Ok(())
}

/// Stream the archive and hand every event to the listing or the pipe.
///
/// Returns the number of bytes read from the source.
async fn process_zip<S: ChunkSource>(source: S, cli: &Cli) -> Result<u64> {
    let options = DecoderOptions {
        extended: cli.verbose,
    };
    let mut stream = ZipStream::new(source, options);
    let mut listing = Listing::new(cli.verbose);
    let mut stdout = tokio::io::stdout();
    let mut writer: Option<PayloadWriter> = None;
    let mut failed = false;
    // A single plain name selects at most one entry; anything else may pipe several
    let show_markers = cli.is_piping() && !cli.selects_single_name() && !cli.is_very_quiet();

    while let Some(event) = stream.next_event().await? {
        match event {
            ArchiveEvent::FileEntry(header) => {
                writer = None;
                if !cli.selects(&header.file_name) {
                    continue;
                }
                if !cli.is_piping() {
                    listing.add(&header);
                    continue;
                }
                if header.is_directory() {
                    continue;
                }
                match PayloadWriter::for_method(header.compression_method) {
                    Some(w) => {
                        if show_markers {
                            stdout
                                .write_all(format!("--- {} ---\n", header.file_name).as_bytes())
                                .await?;
                        }
                        writer = Some(w);
                    }
                    None => eprintln!(
                        "Skipping: {} (unsupported compression method {})",
                        header.file_name, header.compression_method_id
                    ),
                }
            }
            ArchiveEvent::Payload(fragment) => {
                if let Some(w) = writer.as_mut() {
                    stdout.write_all(&w.write_fragment(fragment)?).await?;
                }
            }
            ArchiveEvent::PayloadEnd => {
                if let Some(w) = writer.take() {
                    stdout.write_all(&w.finish()?).await?;
                }
            }
            ArchiveEvent::CentralDirectoryEntry(_) => {}
            ArchiveEvent::EndOfArchive(end) => listing.end = Some(end),
            ArchiveEvent::Error(err) => {
                eprintln!("error: {err}");
                if !err.is_recoverable() {
                    failed = true;
                }
            }
            ArchiveEvent::Finished => {}
        }
    }
    stdout.flush().await?;

    if !cli.is_piping() {
        listing.print_summary();
    }
    if failed {
        bail!("Archive could not be fully decoded");
    }

    Ok(stream.source().transferred_bytes())
}

/// Entry listing, printed as headers stream past.
struct Listing {
    verbose: bool,
    total_uncompressed: u64,
    total_compressed: u64,
    file_count: usize,
    end: Option<EndOfCentralDirectoryRecord>,
}

impl Listing {
    fn new(verbose: bool) -> Self {
        if verbose {
            println!(
                "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  {:<8}  Name",
                "Length", "Size", "Cmpr", "Date", "Time", "Method"
            );
            println!("{}", "-".repeat(80));
        }
        Self {
            verbose,
            total_uncompressed: 0,
            total_compressed: 0,
            file_count: 0,
            end: None,
        }
    }

    fn add(&mut self, entry: &LocalFileHeader) {
        if !self.verbose {
            println!("{}", entry.file_name);
            return;
        }

        let (year, month, day) = entry.mod_date();
        let (hour, minute, _second) = entry.mod_time();
        let compressed = u64::from(entry.compressed_size);
        let uncompressed = u64::from(entry.uncompressed_size);

        println!(
            "{:>10}  {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {:<8}  {}",
            uncompressed,
            compressed,
            ratio(compressed, uncompressed),
            year,
            month,
            day,
            hour,
            minute,
            entry.compression_method,
            entry.file_name
        );

        // Accumulate totals (excluding directories)
        if !entry.is_directory() {
            self.total_uncompressed += uncompressed;
            self.total_compressed += compressed;
            self.file_count += 1;
        }
    }

    fn print_summary(&self) {
        if !self.verbose {
            return;
        }
        println!("{}", "-".repeat(80));
        println!(
            "{:>10}  {:>10}  {}  {:>31}  {} files",
            self.total_uncompressed,
            self.total_compressed,
            ratio(self.total_compressed, self.total_uncompressed),
            "",
            self.file_count
        );
        if let Some(end) = &self.end {
            println!("Central directory: {} entries, {} bytes", end.total_entries, end.cd_size);
            if !end.comment.is_empty() {
                println!("Comment: {}", end.comment);
            }
        }
    }
}

/// Compression ratio as percentage saved
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed > 0 && compressed <= uncompressed {
        format!("{:>4}%", 100 - (compressed * 100 / uncompressed))
    } else {
        "  0%".to_string()
    }
}

/// Format a byte size into a human-readable string.
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
