use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use std::time::Instant;

use platform_ingest::{
    apply_mapping_path, normalize_path, read_headers, CanonicalField, ColumnMapping,
    NormalizeOptions, Platform,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let matches = Command::new("normalize")
        .arg(
            Arg::new("path")
                .long("path")
                .value_parser(clap::value_parser!(PathBuf))
                .required(true),
        )
        .arg(
            Arg::new("account-source")
                .long("account-source")
                .help("Account source id for platforms with more than one"),
        )
        .arg(
            Arg::new("object-source")
                .long("object-source")
                .help("Object source id for platforms with more than one"),
        )
        .arg(
            Arg::new("map")
                .long("map")
                .help("Manual mapping COLUMN:FIELD, e.g. 0:account_id (repeatable)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("chunk-size")
                .long("chunk-size")
                .help("Reader buffer capacity in bytes for large files")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("out")
                .long("out")
                .help("Write the canonical CSV here instead of discarding it")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the processing summary as JSON")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let path = matches.get_one::<PathBuf>("path").unwrap();
    let mut opts = NormalizeOptions::default();
    if let Some(chunk) = matches.get_one::<usize>("chunk-size") {
        opts.chunk_size = *chunk;
    }

    let start = Instant::now();

    let mappings = parse_mappings(
        matches
            .get_many::<String>("map")
            .into_iter()
            .flatten()
            .map(|s| s.as_str()),
    )?;

    let output = if mappings.is_empty() {
        let headers = read_headers(path).await?;
        let platform = Platform::identify(&headers);
        eprintln!("detected platform: {platform}");
        normalize_path(
            path,
            platform,
            matches.get_one::<String>("account-source").map(|s| s.as_str()),
            matches.get_one::<String>("object-source").map(|s| s.as_str()),
            &opts,
        )
        .await?
    } else {
        apply_mapping_path(path, &mappings, &opts).await?
    };

    let elapsed = start.elapsed().as_secs_f64();
    let rps = (output.summary.rows_seen as f64) / elapsed.max(f64::EPSILON);

    if let Some(out_path) = matches.get_one::<PathBuf>("out") {
        tokio::fs::write(out_path, output.csv.as_bytes()).await?;
    }

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&output.summary)?);
    } else {
        println!(
            "source={} rows={} kept={} skipped={} output_bytes={}{}\nelapsed={:.1}s rows/sec={:.0}",
            path.display(),
            output.summary.rows_seen,
            output.summary.rows_kept,
            output.summary.rows_skipped,
            output.summary.output_bytes,
            if output.summary.oversized_output {
                " (over output ceiling)"
            } else {
                ""
            },
            elapsed,
            rps
        );
    }
    Ok(())
}

fn parse_mappings<'a, I>(entries: I) -> anyhow::Result<Vec<ColumnMapping>>
where
    I: Iterator<Item = &'a str>,
{
    entries
        .map(|entry| {
            let (index, field) = entry
                .split_once(':')
                .ok_or_else(|| anyhow::anyhow!("mapping '{entry}' is not COLUMN:FIELD"))?;
            let column_index: usize = index.parse()?;
            let field = match field {
                "account_id" => CanonicalField::AccountId,
                "content_id" => CanonicalField::ContentId,
                "object_id" => CanonicalField::ObjectId,
                "timestamp_share" => CanonicalField::TimestampShare,
                other => anyhow::bail!("unknown canonical field: {other}"),
            };
            Ok(ColumnMapping { column_index, field })
        })
        .collect()
}
