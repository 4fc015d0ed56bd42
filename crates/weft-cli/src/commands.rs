//! Command implementations for the Weft trace CLI.

use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::BufReader;

use weft_core::{journal, GraphTrace, WallTime};
use weft_profiler::{summarize, EventBuffer, TraceBuilder};

/// Which assembly mode a build command runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// One record per invocation, with producer/consumer correlation.
    Aggregated,
    /// One record per raw event.
    Verbatim,
}

/// Read a journal into an event buffer sized to hold all of it.
fn load_buffer(input: &str) -> Result<EventBuffer> {
    let file = File::open(input).with_context(|| format!("failed to open {input}"))?;
    let events = journal::read_events(BufReader::new(file))
        .with_context(|| format!("failed to read journal {input}"))?;
    let mut buffer = EventBuffer::new(events.len().max(1));
    for event in events {
        buffer.push(event);
    }
    Ok(buffer)
}

/// The half-open wall-clock range covering every event in the buffer.
fn full_range(buffer: &EventBuffer) -> (i64, i64) {
    let mut bounds: Option<(i64, i64)> = None;
    for event in buffer.iter() {
        let t = event.event_time.micros();
        bounds = Some(bounds.map_or((t, t), |(lo, hi)| (lo.min(t), hi.max(t))));
    }
    match bounds {
        Some((lo, hi)) => (lo, hi.saturating_add(1)),
        None => (0, 0),
    }
}

fn build_one(
    builder: &mut TraceBuilder,
    buffer: &EventBuffer,
    begin: i64,
    end: i64,
    mode: BuildMode,
) -> GraphTrace {
    let begin = WallTime::from_micros(begin);
    let end = WallTime::from_micros(end);
    match mode {
        BuildMode::Aggregated => builder.build_trace(buffer, begin, end),
        BuildMode::Verbatim => builder.build_log(buffer, begin, end),
    }
}

fn emit(json: &str, output: Option<&str>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, format!("{json}\n"))
                .with_context(|| format!("failed to write {path}"))?;
            println!("Wrote {path}");
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Build command: turn a journal into a trace or log, whole-range or
/// windowed.
pub fn build(
    input: &str,
    begin: Option<i64>,
    end: Option<i64>,
    window: Option<i64>,
    pretty: bool,
    output: Option<&str>,
    mode: BuildMode,
) -> Result<()> {
    let buffer = load_buffer(input)?;
    let (first, past_last) = full_range(&buffer);
    let begin = begin.unwrap_or(first);
    let end = end.unwrap_or(past_last);

    let mut builder = TraceBuilder::new();
    let json = match window {
        None => {
            let trace = build_one(&mut builder, &buffer, begin, end, mode);
            trace.to_json(pretty)?
        }
        Some(width) if width > 0 => {
            // One builder across every window, so they share a time base
            // and the later windows can resolve producers from earlier
            // ones.
            let mut traces = Vec::new();
            let mut start = begin;
            while start < end {
                let stop = start.saturating_add(width).min(end);
                traces.push(build_one(&mut builder, &buffer, start, stop, mode));
                start = stop;
            }
            if pretty {
                serde_json::to_string_pretty(&traces)?
            } else {
                serde_json::to_string(&traces)?
            }
        }
        Some(width) => bail!("--window must be positive, got {width}"),
    };
    emit(&json, output)
}

/// Summary command: per-node runtimes and per-stream hop latencies over
/// the journal's full range.
pub fn summary(input: &str) -> Result<()> {
    let buffer = load_buffer(input)?;
    let (begin, end) = full_range(&buffer);

    let mut builder = TraceBuilder::new();
    let trace = build_one(&mut builder, &buffer, begin, end, BuildMode::Aggregated);
    let summary = summarize(&trace);

    if summary.nodes.is_empty() {
        println!("No events in {input}.");
        return Ok(());
    }

    println!("Nodes:");
    for node in &summary.nodes {
        println!(
            "  node {}: {} invocations ({} completed), total {} us, max {} us, mean {:.1} us",
            node.node_id,
            node.invocations,
            node.completed,
            node.total_micros,
            node.max_micros,
            node.mean_micros(),
        );
    }

    println!();
    println!("Streams:");
    if summary.streams.is_empty() {
        println!("  (no stream hops recorded)");
    }
    for stream in &summary.streams {
        println!(
            "  {}: {} hops ({} correlated), total latency {} us, max {} us, mean {:.1} us",
            stream.stream,
            stream.hops,
            stream.correlated,
            stream.total_latency,
            stream.max_latency,
            stream.mean_latency(),
        );
    }

    Ok(())
}
