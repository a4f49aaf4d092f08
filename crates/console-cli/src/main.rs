use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console_metrics::{color_for_processor, ConsoleConfig, ConsoleEvent, MetricsBus, SessionWorker};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

mod logging;
mod render;

use logging::init_logging;
use render::{hsl_to_rgb, render_compact, render_panel, render_text};

#[derive(Parser, Debug)]
#[command(name = "voice-console")]
#[command(about = "Replay and inspect voice agent session metrics")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, env = "VOICE_CONSOLE_CONFIG")]
    config: Option<PathBuf>,

    /// Processor names to ignore, in addition to the config file
    #[arg(long = "ignore", value_name = "PROCESSOR")]
    ignore: Vec<String>,

    /// Enable debug logging
    #[arg(long, short, default_value = "false")]
    debug: bool,

    /// Log level (overrides debug flag)
    #[arg(long, env = "RUST_LOG")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Feed a whole event log and print the final view
    Replay {
        /// JSONL event log, `-` for stdin
        #[arg(default_value = "-")]
        input: String,
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the view after every event
    Stream {
        /// JSONL event log, `-` for stdin
        #[arg(default_value = "-")]
        input: String,
        /// Print each snapshot as a JSON line
        #[arg(long)]
        json: bool,
    },
    /// Print the info panel sections enabled by the configuration
    Panel,
    /// Print the chart color assigned to a processor
    Color {
        name: String,
        #[arg(long, default_value_t = 1.0)]
        alpha: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug, cli.log_level.as_deref());

    let mut config = match &cli.config {
        Some(path) => ConsoleConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ConsoleConfig::default(),
    };
    config
        .metrics
        .ignore_processor_names
        .extend(cli.ignore.iter().cloned());
    log::debug!("Configuration: {:?}", config);

    match cli.command {
        Commands::Replay { input, json } => replay(&config, &input, json).await,
        Commands::Stream { input, json } => stream(&config, &input, json).await,
        Commands::Panel => {
            print!("{}", render_panel(&config.info_panel));
            Ok(())
        }
        Commands::Color { name, alpha } => {
            use colored::Colorize;

            let color = color_for_processor(&name, alpha);
            let (r, g, b) = hsl_to_rgb(&color);
            println!("{} {}", "■".truecolor(r, g, b), color);
            Ok(())
        }
    }
}

async fn open_input(input: &str) -> Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    if input == "-" {
        return Ok(Box::new(BufReader::new(tokio::io::stdin())));
    }
    let file = tokio::fs::File::open(input)
        .await
        .with_context(|| format!("failed to open {}", input))?;
    Ok(Box::new(BufReader::new(file)))
}

fn parse_line(line_no: usize, line: &str) -> Option<ConsoleEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match ConsoleEvent::from_json(line) {
        Ok(event) => Some(event),
        Err(error) => {
            log::warn!("line {}: skipping unparseable event: {}", line_no, error);
            None
        }
    }
}

/// Feed the log through the bus to a spawned worker and print the final view.
async fn replay(config: &ConsoleConfig, input: &str, json: bool) -> Result<()> {
    let mut lines = open_input(input).await?.lines();
    let (bus, rx) = MetricsBus::new(config.bus_capacity);
    let handle = SessionWorker::spawn(config.metrics.clone(), rx);

    let mut line_no = 0usize;
    while let Some(line) = lines.next_line().await.context("failed to read input")? {
        line_no += 1;
        if let Some(event) = parse_line(line_no, &line) {
            bus.send(event).await?;
        }
    }
    drop(bus);

    let summary = handle.task.await.context("session worker failed")?;
    log::info!(
        "Processed {} line(s): {} applied, {} rejected, {} ignored",
        line_no,
        summary.events_applied,
        summary.events_rejected,
        summary.events_ignored
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&summary.snapshot)?);
    } else {
        print!("{}", render_text(&summary.snapshot));
    }
    Ok(())
}

/// Apply events one at a time and print the view after each.
async fn stream(config: &ConsoleConfig, input: &str, json: bool) -> Result<()> {
    let mut lines = open_input(input).await?.lines();
    let mut worker = SessionWorker::new(config.metrics.clone());

    let mut line_no = 0usize;
    while let Some(line) = lines.next_line().await.context("failed to read input")? {
        line_no += 1;
        let Some(event) = parse_line(line_no, &line) else {
            continue;
        };
        worker.handle_event(event);

        let snapshot = worker.snapshot();
        if json {
            println!("{}", serde_json::to_string(&snapshot)?);
        } else {
            println!("{}", render_compact(&snapshot));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_garbage_lines_are_skipped() {
        assert!(parse_line(1, "   ").is_none());
        assert!(parse_line(2, "not json").is_none());
        assert_eq!(
            parse_line(3, r#" {"type":"connected"} "#),
            Some(ConsoleEvent::Connected)
        );
    }

    #[test]
    fn cli_accepts_repeated_ignore_flags() {
        let cli = Cli::try_parse_from([
            "voice-console",
            "--ignore",
            "vad",
            "--ignore",
            "stt",
            "replay",
            "session.jsonl",
            "--json",
        ])
        .expect("parse");

        assert_eq!(cli.ignore, vec!["vad", "stt"]);
        match cli.command {
            Commands::Replay { input, json } => {
                assert_eq!(input, "session.jsonl");
                assert!(json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
