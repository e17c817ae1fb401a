use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use colored::*;

mod sse_client;

use sse_client::{post_and_collect, Connection, ReceivedEvent};

#[derive(Parser)]
#[command(name = "sse-test-client")]
#[command(about = "SSE Streaming Endpoint Validation Tool")]
struct Cli {
    /// Base URL of the server (e.g., http://localhost:8000)
    #[arg(long, default_value = "http://localhost:8000")]
    base_url: String,

    /// Test scenario to run
    #[arg(long, value_enum)]
    scenario: ScenarioChoice,

    /// Prompt sent to /process
    #[arg(long, default_value = "hello")]
    prompt: String,

    /// Number of token events requested from /process
    #[arg(long, default_value_t = 3)]
    max_tokens: u32,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,
}

#[derive(clap::ValueEnum, Clone, Copy)]
enum ScenarioChoice {
    /// Validate the countdown stream (GET /stream)
    Countdown,
    /// Validate a prompt stream (POST /process)
    Process,
    /// Run both scenarios
    All,
}

struct TestResult {
    name: &'static str,
    failures: Vec<String>,
}

impl TestResult {
    fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    }

    println!("{}", "=== TEST PHASE ===".bright_white().bold());

    let mut results = Vec::new();
    match cli.scenario {
        ScenarioChoice::Countdown => {
            results.push(test_countdown(&cli.base_url).await?);
        }
        ScenarioChoice::Process => {
            results.push(test_process(&cli.base_url, &cli.prompt, cli.max_tokens).await?);
        }
        ScenarioChoice::All => {
            results.push(test_countdown(&cli.base_url).await?);
            results.push(test_process(&cli.base_url, &cli.prompt, cli.max_tokens).await?);
        }
    }

    println!("\n{}", "=== RESULTS ===".bright_white().bold());
    for result in &results {
        if result.passed() {
            println!("{} {}", "✓".green(), result.name);
        } else {
            println!("{} {}", "✗".red(), result.name);
            for failure in &result.failures {
                println!("    {failure}");
            }
        }
    }

    let all_passed = results.iter().all(|r| r.passed());
    if all_passed {
        println!("\n{}", "All tests passed! ✓".bright_green().bold());
    } else {
        println!("\n{}", "Some tests failed! ✗".bright_red().bold());
    }

    std::process::exit(if all_passed { 0 } else { 1 });
}

/// GET /stream must deliver exactly ten in-order `message` events.
async fn test_countdown(base_url: &str) -> Result<TestResult> {
    println!("{} Connecting to GET /stream...", "→".blue());

    let mut connection = Connection::establish(&format!("{base_url}/stream"))?;
    // One extra slot so over-production would be observed; the idle
    // timeout must exceed the server's 1s message interval.
    let events = connection.collect(11, Duration::from_secs(5)).await;

    let mut failures = validate_sequence(&events, 10, "message");
    for (i, event) in events.iter().enumerate() {
        let expected = format!("This is message {}", i + 1);
        if event.data != serde_json::json!(expected) {
            failures.push(format!("event {i}: data {:?}, expected {expected:?}", event.data));
        }
        if event.prompt.is_some() {
            failures.push(format!("event {i}: unexpected prompt field"));
        }
    }

    Ok(TestResult {
        name: "countdown stream (GET /stream)",
        failures,
    })
}

/// POST /process must deliver exactly `max_tokens` in-order `token`
/// events, each echoing the prompt.
async fn test_process(base_url: &str, prompt: &str, max_tokens: u32) -> Result<TestResult> {
    println!(
        "{} Posting to /process (prompt={prompt:?}, max_tokens={max_tokens})...",
        "→".blue()
    );

    let events = post_and_collect(base_url, prompt, max_tokens).await?;

    let mut failures = validate_sequence(&events, max_tokens as usize, "token");
    for (i, event) in events.iter().enumerate() {
        let expected = format!("token_{i}");
        if event.data != serde_json::json!(expected) {
            failures.push(format!("event {i}: data {:?}, expected {expected:?}", event.data));
        }
        if event.prompt.as_deref() != Some(prompt) {
            failures.push(format!("event {i}: prompt {:?}, expected {prompt:?}", event.prompt));
        }
    }

    Ok(TestResult {
        name: "prompt stream (POST /process)",
        failures,
    })
}

fn validate_sequence(events: &[ReceivedEvent], expected: usize, kind: &str) -> Vec<String> {
    let mut failures = Vec::new();

    if events.len() != expected {
        failures.push(format!("received {} event(s), expected {expected}", events.len()));
    }
    for (i, event) in events.iter().enumerate() {
        if event.id != i as u64 {
            failures.push(format!("event {i}: id {}, expected {i}", event.id));
        }
        if event.event != kind {
            failures.push(format!("event {i}: kind {:?}, expected {kind:?}", event.event));
        }
    }

    failures
}
