use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;

use shadows_search::filters::{parse_date, parse_size};
use shadows_search::logging::init_tracing;
use shadows_search::request::resolve_scope;
use shadows_search::results::format_elapsed;
use shadows_search::{
    DateFilter, FileSearcher, MatchRecord, SearchConfig, SearchError, SearchEvent, SearchFilters,
    SearchResults, SizeFilter, TypeFilter,
};

#[derive(Parser, Debug)]
#[command(name = "shadows-search")]
#[command(about = "Concurrent, filtered file name search")]
struct Args {
    /// Case-insensitive name fragment; prefix with `AllDrives:` to search every volume.
    #[arg(default_value = "")]
    query: String,
    #[arg(long = "root")]
    roots: Vec<PathBuf>,
    #[arg(long, default_value_t = false)]
    no_subfolders: bool,
    #[arg(long = "type", default_value = "all", value_parser = parse_type)]
    kind: TypeFilter,
    #[arg(long, value_parser = parse_size)]
    min_size: Option<u64>,
    #[arg(long, value_parser = parse_size)]
    max_size: Option<u64>,
    #[arg(long, value_parser = parse_date, conflicts_with = "before")]
    after: Option<NaiveDate>,
    #[arg(long, value_parser = parse_date)]
    before: Option<NaiveDate>,
    #[arg(long)]
    limit: Option<usize>,
    #[arg(long)]
    jobs: Option<usize>,
    #[arg(long, default_value_t = false)]
    json: bool,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, short, default_value_t = false)]
    verbose: bool,
}

fn parse_type(raw: &str) -> std::result::Result<TypeFilter, SearchError> {
    raw.parse()
}

fn load_config(args: &Args) -> Result<SearchConfig> {
    let mut config = match &args.config {
        Some(path) => SearchConfig::load(path)?,
        None => SearchConfig::load_default()?,
    };
    if let Some(jobs) = args.jobs {
        config.parallelism = Some(jobs);
    }
    Ok(config)
}

fn build_filters(args: &Args) -> Result<SearchFilters> {
    let mut filters = SearchFilters::default()
        .with_kind(args.kind)
        .recursive(!args.no_subfolders);
    if args.min_size.is_some() || args.max_size.is_some() {
        filters = filters.with_size(SizeFilter::new(args.min_size, args.max_size)?);
    }
    if let Some(date) = args.after {
        filters = filters.with_date(DateFilter::after(date));
    } else if let Some(date) = args.before {
        filters = filters.with_date(DateFilter::before(date));
    }
    Ok(filters)
}

fn print_record(out: &mut impl Write, record: &MatchRecord, json: bool) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string(record)?)?;
    } else {
        writeln!(out, "{}", record.path.display())?;
    }
    Ok(())
}

fn run_cli(args: &Args) -> Result<()> {
    let config = load_config(args)?;
    let current = if args.roots.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        args.roots.clone()
    };
    let (roots, term) = resolve_scope(&args.query, &current);
    let roots = roots
        .into_iter()
        .map(|root| {
            root.canonicalize()
                .with_context(|| format!("failed to canonicalize root {}", root.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    let filters = build_filters(args)?;

    let (mut searcher, rx) = FileSearcher::new(config);
    searcher
        .configure(roots, &term, filters)
        .context("nothing to search for")?;
    if !searcher.start() {
        bail!("nothing to search for");
    }
    let handle = searcher
        .stop_handle()
        .context("search session was not created")?;
    let interrupt = handle.clone();
    ctrlc::set_handler(move || interrupt.stop()).context("failed to install Ctrl-C handler")?;

    let limit = args.limit.unwrap_or(usize::MAX);
    if limit == 0 {
        handle.stop();
    }
    let mut results = SearchResults::new(handle.session());
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut printed = 0usize;

    for event in rx.iter() {
        if let SearchEvent::Status { message, .. } = &event {
            info!("{message}");
        }
        let is_match = matches!(event, SearchEvent::Found { .. });
        if !results.apply(event) {
            continue;
        }
        if is_match && printed < limit {
            if let Some(record) = results.records().last() {
                print_record(&mut out, record, args.json)?;
                printed += 1;
            }
            if printed >= limit {
                handle.stop();
            }
        }
        if let Some(summary) = results.summary() {
            out.flush()?;
            eprintln!(
                "Found {} items in {} ({} entries scanned{})",
                summary.matches,
                format_elapsed(summary.elapsed),
                summary.scanned,
                if summary.aborted { ", stopped" } else { "" }
            );
            break;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);
    run_cli(&args)
}
