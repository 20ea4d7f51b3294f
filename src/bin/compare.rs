//! disklist comparison binary
//!
//! Builds the same list under both addressing schemes and reports the I/O
//! calls and pages touched by each traversal.

use std::path::{Path, PathBuf};

use clap::Parser;
use disklist::{AddressingScheme, DiskList, IoStats, ListConfig, OffsetScheme, PagedScheme};
use tracing_subscriber::{fmt, EnvFilter};

/// Offset vs paged list comparison
#[derive(Parser, Debug)]
#[command(name = "disklist-compare")]
#[command(about = "Compare I/O cost of offset and paged list files")]
#[command(version)]
struct Args {
    /// Directory for the two list files
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Number of values to append
    #[arg(short = 'n', long, default_value = "10000")]
    count: u32,

    /// Page size in bytes
    #[arg(short, long, default_value = "4096")]
    page_size: u16,

    /// Prepend every Nth value instead of appending it (0 = never)
    #[arg(long, default_value = "0")]
    prepend_every: u32,
}

/// Costs measured for one scheme
struct Report {
    len: usize,
    build: IoStats,
    naive: IoStats,
    buffered: IoStats,
    unique_pages: usize,
    page_switches: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,disklist=debug"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    tracing::info!("disklist-compare v{}", disklist::VERSION);
    tracing::info!("Directory: {}", args.dir.display());
    tracing::info!("Values: {}, page size: {}", args.count, args.page_size);

    let offset = run::<OffsetScheme>(&args, &args.dir.join("offset_list.llst"));
    let paged = run::<PagedScheme>(&args, &args.dir.join("paged_list.llst"));

    let (offset, paged) = match (offset, paged) {
        (Ok(o), Ok(p)) => (o, p),
        (Err(e), _) | (_, Err(e)) => {
            tracing::error!("Comparison failed: {}", e);
            std::process::exit(1);
        }
    };

    println!("==== List length ====");
    println!("[Offset] {}", offset.len);
    println!("[Paged ] {}", paged.len);

    println!("==== I/O while building ====");
    println!("[Offset] {}", offset.build);
    println!("[Paged ] {}", paged.build);

    println!("==== Traversal I/O (naive / buffered) ====");
    println!("[Offset] {} / {}", offset.naive, offset.buffered);
    println!("[Paged ] {} / {}", paged.naive, paged.buffered);

    println!("==== Pages touched during traversal ====");
    println!(
        "[Offset] unique={}, switches={}",
        offset.unique_pages, offset.page_switches
    );
    println!(
        "[Paged ] unique={}, switches={}",
        paged.unique_pages, paged.page_switches
    );
}

fn run<S: AddressingScheme>(args: &Args, path: &Path) -> disklist::Result<Report> {
    let config = ListConfig::builder()
        .path(path)
        .truncate(true)
        .page_size(args.page_size)
        .build();
    let mut list = DiskList::<S>::open(config)?;

    let start = list.io_stats();
    for i in 0..args.count {
        let value = 100 + i;
        if args.prepend_every != 0 && i % args.prepend_every == 0 {
            list.prepend_head(value)?;
        } else {
            list.append_tail(value)?;
        }
    }
    let build = list.io_stats().delta(&start);

    let before = list.io_stats();
    let values = list.traverse()?;
    let naive = list.io_stats().delta(&before);

    let before = list.io_stats();
    list.traverse_buffered()?;
    let buffered = list.io_stats().delta(&before);

    let visits = list.page_visits()?;
    list.close()?;

    Ok(Report {
        len: values.len(),
        build,
        naive,
        buffered,
        unique_pages: visits.unique_pages(),
        page_switches: visits.page_switches,
    })
}
