use std::path::Path;

use platform_ingest::{normalize_path, read_headers, NormalizeOptions, Platform};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = Path::new("./data/sample.csv.gz");

    let headers = read_headers(path).await?;
    let platform = Platform::identify(&headers);
    println!("detected platform: {platform}");

    let out = normalize_path(
        path,
        platform,
        None,
        Some("video_description_tiktok"),
        &NormalizeOptions::default(),
    )
    .await?;

    println!(
        "rows={} kept={} skipped={}",
        out.summary.rows_seen, out.summary.rows_kept, out.summary.rows_skipped
    );
    println!("first line: {}", out.csv.lines().nth(1).unwrap_or(""));
    Ok(())
}
