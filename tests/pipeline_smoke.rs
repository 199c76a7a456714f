use std::{fs::File, io::Write, path::PathBuf, process::Command};

use platform_ingest::{normalize_path, read_headers, NormalizeOptions, Platform};

fn write_tiktok_csv(path: &PathBuf, rows: u32) -> anyhow::Result<()> {
    let mut f = File::create(path)?;
    writeln!(f, "video_id,author_name,region_code,create_time,video_description")?;
    for i in 0..rows {
        writeln!(f, "v{i},user{i:06},US,{},post {i}", 1_620_000_000 + i as u64)?;
    }
    Ok(())
}

#[tokio::test]
async fn normalizes_gzip_export_and_counts_rows() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let csv_path = dir.path().join("tiktok.csv");
    write_tiktok_csv(&csv_path, 50_000)?;

    // gzip it (use system gzip for speed)
    let gz_path: PathBuf = dir.path().join("tiktok.csv.gz");
    let status = Command::new("bash")
        .arg("-lc")
        .arg(format!(
            "gzip -c {} > {}",
            csv_path.display(),
            gz_path.display()
        ))
        .status()?;
    assert!(status.success());

    let headers = read_headers(&gz_path).await?;
    assert_eq!(Platform::identify(&headers), Platform::TikTok);

    let out = normalize_path(
        &gz_path,
        Platform::TikTok,
        None,
        Some("video_description_tiktok"),
        &NormalizeOptions::default(),
    )
    .await?;

    assert_eq!(out.summary.rows_seen, 50_000);
    assert_eq!(out.summary.rows_kept, 50_000);
    assert_eq!(out.records[0].account_id, "user000000 (US)");
    Ok(())
}

#[tokio::test]
async fn single_pass_and_chunked_paths_agree_on_disk() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let csv_path = dir.path().join("tiktok.csv");
    write_tiktok_csv(&csv_path, 5_000)?;

    let single = normalize_path(
        &csv_path,
        Platform::TikTok,
        None,
        Some("video_description_tiktok"),
        &NormalizeOptions::default(),
    )
    .await?;

    // Force the chunked strategy with a zero threshold and a small chunk.
    let chunked = normalize_path(
        &csv_path,
        Platform::TikTok,
        None,
        Some("video_description_tiktok"),
        &NormalizeOptions {
            large_file_threshold: 0,
            chunk_size: 512,
            ..Default::default()
        },
    )
    .await?;

    assert_eq!(single.records, chunked.records);
    assert_eq!(single.csv, chunked.csv);
    assert_eq!(single.summary.rows_kept, chunked.summary.rows_kept);
    Ok(())
}

#[tokio::test]
async fn preprocessed_csv_round_trips() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let csv_path = dir.path().join("canonical.csv");
    let mut f = File::create(&csv_path)?;
    writeln!(f, "account_id,content_id,object_id,timestamp_share")?;
    writeln!(f, "alice (US),v1,hello world,1620000000")?;
    writeln!(f, "bob (DE),v2,second post,1620000100")?;
    drop(f);

    let headers = read_headers(&csv_path).await?;
    assert_eq!(Platform::identify(&headers), Platform::Preprocessed);

    let out = normalize_path(
        &csv_path,
        Platform::Preprocessed,
        None,
        None,
        &NormalizeOptions::default(),
    )
    .await?;

    let original = std::fs::read_to_string(&csv_path)?;
    assert_eq!(out.csv, original);
    Ok(())
}
