use chrono::{DateTime, Duration, TimeZone, Utc};
use clap::Parser;
use rand::Rng;
use tindex::{LayerLevel, Posting, TemporalIndex};
use tracing::{info, Level};
use tracing_subscriber::fmt;

/// Loads a synthetic batch of postings into a temporal index and runs a
/// handful of range queries against it, reporting timing and result sizes.
#[derive(Parser, Debug)]
struct Args {
    /// Finest active granularity.
    #[arg(long, default_value = "second", value_parser = parse_level)]
    min_level: LayerLevel,

    /// Coarsest active granularity.
    #[arg(long, default_value = "year", value_parser = parse_level)]
    max_level: LayerLevel,

    /// Number of synthetic postings to generate.
    #[arg(long, default_value_t = 100_000)]
    num_postings: usize,

    /// Distinct tokens to draw from when generating postings.
    #[arg(long, default_value_t = 64)]
    vocabulary: usize,

    /// Number of range queries to run after loading.
    #[arg(long, default_value_t = 10)]
    num_queries: usize,
}

fn parse_level(s: &str) -> Result<LayerLevel, String> {
    match s.to_ascii_lowercase().as_str() {
        "none" => Ok(LayerLevel::None),
        "second" => Ok(LayerLevel::Second),
        "minute" => Ok(LayerLevel::Minute),
        "hour" => Ok(LayerLevel::Hour),
        "day" => Ok(LayerLevel::Day),
        "month" => Ok(LayerLevel::Month),
        "quarter" => Ok(LayerLevel::Quarter),
        "year" => Ok(LayerLevel::Year),
        other => Err(format!("unknown level {other:?}")),
    }
}

fn init_logging() {
    fmt()
        .with_ansi(false)
        .with_thread_ids(true)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_max_level(Level::INFO)
        .init();
}

fn epoch_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).single().unwrap()
}

fn generate_postings(num_postings: usize, vocabulary: usize) -> Vec<Posting> {
    let mut rng = rand::rng();
    let start = epoch_start();
    let span_seconds = Duration::days(365 * 3).num_seconds();

    (0..num_postings)
        .map(|_| {
            let offset = rng.random_range(0..span_seconds);
            let timestamp = start + Duration::seconds(offset);
            let num_tokens = rng.random_range(1..=3);
            let tokens: Vec<String> = (0..num_tokens)
                .map(|_| format!("token-{}", rng.random_range(0..vocabulary)))
                .collect();
            Posting::new(timestamp, tokens)
        })
        .collect()
}

fn run_query(index: &TemporalIndex, t_from: DateTime<Utc>, t_to: DateTime<Utc>) {
    let started = std::time::Instant::now();
    let tokens = index.get(t_from, t_to);
    info!(
        t_from = %t_from,
        t_to = %t_to,
        matches = tokens.len(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "query complete"
    );
}

fn main() {
    init_logging();
    let args = Args::parse();

    let mut index = match TemporalIndex::construct(args.min_level, args.max_level) {
        Ok(index) => index,
        Err(e) => {
            eprintln!("failed to construct index: {e}");
            std::process::exit(1);
        }
    };

    let postings = generate_postings(args.num_postings, args.vocabulary);
    if let Err(e) = index.load(&postings) {
        eprintln!("failed to load postings: {e}");
        std::process::exit(1);
    }

    let mut rng = rand::rng();
    let start = epoch_start();
    let span_seconds = Duration::days(365 * 3).num_seconds();

    for i in 0..args.num_queries {
        let lo = rng.random_range(0..span_seconds);
        let remaining = span_seconds - lo;
        let width = if remaining > 60 {
            rng.random_range(60..remaining)
        } else {
            remaining.max(1)
        };
        let t_from = start + Duration::seconds(lo);
        let t_to = start + Duration::seconds((lo + width).min(span_seconds));
        info!(query = i, "running query");
        run_query(&index, t_from, t_to);
    }
}
