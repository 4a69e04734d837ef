//! `watch`: follow one resource key and print each committed value.

use futures_util::StreamExt;
use serde_json::Value;

use medcart_core::{CacheEntry, ResourceKey, Storefront, SubscribeOptions};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    store: &Storefront,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let key = ResourceKey::parse(&args.key);
    tracing::info!(%key, every = %humantime::format_duration(args.every), "watching");

    let options = SubscribeOptions::default().refresh_every(args.every);
    let mut states = store.subscribe(key, options).into_stream();

    let mut printed = 0usize;
    let mut last_seen = None;
    loop {
        let entry = tokio::select! {
            entry = states.next() => entry,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(entry) = entry else {
            break;
        };
        if entry.is_validating || (entry.last_fetched_at.is_none() && entry.error.is_none()) {
            continue;
        }
        let stamp = (entry.last_fetched_at, entry.error.as_ref().map(ToString::to_string));
        if last_seen.as_ref() == Some(&stamp) {
            continue;
        }
        last_seen = Some(stamp);

        print_entry(&entry, global)?;
        printed += 1;
        if args.count.is_some_and(|limit| printed >= limit) {
            break;
        }
    }
    Ok(())
}

fn print_entry(entry: &CacheEntry, global: &GlobalOpts) -> Result<(), CliError> {
    if let Some(ref err) = entry.error {
        output::status_line(&global.color, false, &err.user_message());
    }
    let Some(ref data) = entry.data else {
        return Ok(());
    };

    // One line per value keeps the stream greppable.
    let (format, prefix) = match global.output {
        OutputFormat::Table | OutputFormat::Plain => {
            let at = entry
                .last_fetched_at
                .map(|t| t.format("%H:%M:%S ").to_string())
                .unwrap_or_default();
            (&OutputFormat::JsonCompact, at)
        }
        ref structured => (structured, String::new()),
    };
    let body = output::render_single(format, data.as_ref(), Value::to_string, Value::to_string)?;
    let out = format!("{prefix}{body}");
    output::print_output(&out, global.quiet);
    Ok(())
}
