use agentline_adapters::{Tool, correlate_results, normalize_session, read_session_file};
use agentline_types::{NormalizedEntry, truncate};
use anyhow::Result;
use chrono::{Local, TimeZone};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "agentline-debug")]
#[command(about = "Normalize a recorded agent session and print the timeline", long_about = None)]
struct Cli {
    /// JSON-lines recording of LogMsg envelopes
    session_file: PathBuf,

    /// Tool id that produced the session (claude-code, codex, cursor-agent, opencode, gemini-cli)
    #[arg(long)]
    tool: String,

    /// Print the normalized entries as a JSON array instead of a timeline
    #[arg(long)]
    json: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let tool = Tool::from_id(&cli.tool);
    if !tool.is_known() {
        eprintln!("[DEBUG] Unknown tool '{}', using raw fallback", cli.tool);
    }

    let msgs = read_session_file(&cli.session_file)?;
    eprintln!(
        "[DEBUG] {} envelopes from {}",
        msgs.len(),
        cli.session_file.display()
    );

    let entries = normalize_session(&tool, &msgs);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    let correlation = correlate_results(&entries);
    for entry in &entries {
        if correlation.is_attached(&entry.id) {
            // Rendered under its call below, not standalone.
            continue;
        }
        print_entry(entry, 0);

        if let Some(tool_use_id) = entry.tool_use_id()
            && entry.entry_type.is_tool_call()
            && let Some(result_id) = correlation.result_for(tool_use_id)
            && let Some(result) = entries.iter().find(|e| e.id == result_id)
        {
            print_entry(result, 1);
        }
    }

    Ok(())
}

fn print_entry(entry: &NormalizedEntry, indent: usize) {
    let time = Local
        .timestamp_millis_opt(entry.timestamp)
        .single()
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string());

    println!(
        "{}[{}] {:<17} {}",
        "  ".repeat(indent),
        time,
        entry.entry_type.as_str(),
        truncate(&entry.content.replace('\n', " "), 160)
    );
}
