use clap::{Arg, ArgAction, Command};
use std::io::{self, Write};

/// Emits a deterministic synthetic export for one platform, suitable
/// for smoke tests and throughput runs. Every Nth row (`--invalid-every`)
/// is emitted with a blank required field so skip counting can be
/// exercised too.
fn main() -> anyhow::Result<()> {
    let matches = Command::new("gen")
        .arg(
            Arg::new("platform")
                .long("platform")
                .value_parser([
                    "preprocessed",
                    "youtube",
                    "tiktok",
                    "facebook",
                    "instagram",
                    "telegram",
                    "bluesky",
                ])
                .default_value("tiktok"),
        )
        .arg(
            Arg::new("rows")
                .long("rows")
                .value_parser(clap::value_parser!(u64))
                .required(true),
        )
        .arg(
            Arg::new("invalid-every")
                .long("invalid-every")
                .help("Blank a required field every N rows")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("no_header")
                .long("no-header")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let platform = matches.get_one::<String>("platform").unwrap().as_str();
    let rows: u64 = *matches.get_one("rows").unwrap();
    let invalid_every = matches.get_one::<u64>("invalid-every").copied();
    let with_header = !matches.get_flag("no_header");

    let mut out = io::BufWriter::new(io::stdout().lock());

    let header: &str = match platform {
        "preprocessed" => "account_id,content_id,object_id,timestamp_share",
        "youtube" => "videoId,channelId,channelTitle,publishedAt,title,description",
        "tiktok" => "video_id,author_name,region_code,create_time,video_description",
        "facebook" => "id,surface.id,surface.name,post_owner.id,post_owner.name,text,creation_time",
        "instagram" => "id,post_owner.id,post_owner.name,text,creation_time",
        "telegram" => "message_id,channel_id,channel_name,post_author,sender_id,message_text,date",
        "bluesky" => "username,id,text,date",
        other => anyhow::bail!("unknown platform: {other}"),
    };
    if with_header {
        writeln!(&mut out, "{header}")?;
    }

    for i in 0..rows {
        let blank = invalid_every.is_some_and(|n| n > 0 && i % n == n - 1);
        let name = if blank {
            String::new()
        } else {
            format!("user{i:06}")
        };
        let ts = 1_620_000_000 + i;
        match platform {
            "preprocessed" => writeln!(&mut out, "{name},c{i},object {i},{ts}")?,
            "youtube" => writeln!(
                &mut out,
                "y{i},ch{},{name},{ts},title {i},desc {i}",
                i % 100
            )?,
            "tiktok" => writeln!(&mut out, "v{i},{name},US,{ts},post number {i}")?,
            "facebook" => writeln!(
                &mut out,
                "p{i},s{0},Page {0},u{1},{name},shared text {i},{ts}",
                i % 50,
                i % 500
            )?,
            "instagram" => writeln!(&mut out, "p{i},u{},{name},caption {i},{ts}", i % 500)?,
            "telegram" => writeln!(
                &mut out,
                "m{i},c{0},Channel {0},{name},s{1},message {i},{ts}",
                i % 20,
                i % 500
            )?,
            "bluesky" => writeln!(&mut out, "{name},b{i},skeet {i},{ts}")?,
            _ => unreachable!(),
        }
        if i % 10_000 == 0 {
            out.flush()?; // keep buffers moving on huge runs
        }
    }

    out.flush()?;
    Ok(())
}
