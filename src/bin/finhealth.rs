//! CLI binary for edgequake-finhealth.
//!
//! A thin shim over the library crate: maps CLI flags to `CheckupConfig`,
//! drives a `Controller` from stdin, and prints the dashboard.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_finhealth::dashboard::{assistant_label, render_result, render_transcript, Lamp};
use edgequake_finhealth::{
    analyze_report, CheckupConfig, Controller, LlmAnalyst, Locale, Notice, Phase, Speaker,
    TransitionError,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Interactive checkup (prompts for a file if none is given)
  finhealth annual-report.pdf

  # English answers and dashboard
  finhealth --lang en annual-report.pdf

  # Verdict only, as JSON
  finhealth --json annual-report.pdf > checkup.json

  # Use a specific provider and model
  finhealth --provider openai --model gpt-4.1-mini annual-report.pdf

CHAT COMMANDS:
  /reset        Start over with another report
  /lang en|zh   Switch the display and answer language
  /quit         Exit

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (reads PDFs natively)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (gemini, openai, anthropic, ollama)
  EDGEQUAKE_MODEL         Override model ID
  RUST_LOG                Log filter (overrides -v / -q)
"#;

/// Give a financial report a health checkup and ask follow-up questions.
#[derive(Parser, Debug)]
#[command(
    name = "finhealth",
    version,
    about = "Financial report health checkup with follow-up chat",
    long_about = "Upload a PDF financial report, get a traffic-light verdict with key indicators \
explained in plain language, then ask follow-up questions grounded in the same report.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF report to analyse. Prompted for when omitted.
    report: Option<PathBuf>,

    /// Display and answer language: en or zh.
    #[arg(long, env = "FINHEALTH_LANG", default_value = "zh")]
    lang: Locale,

    /// LLM model ID (e.g. gemini-2.5-flash, gpt-4.1-mini).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: gemini, openai, anthropic, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Temperature for the analysis call (0.0–2.0).
    #[arg(long, env = "FINHEALTH_TEMPERATURE", default_value_t = 0.4)]
    temperature: f32,

    /// Temperature for chat turns (0.0–2.0).
    #[arg(long, env = "FINHEALTH_CHAT_TEMPERATURE", default_value_t = 0.7)]
    chat_temperature: f32,

    /// Max LLM output tokens per call.
    #[arg(long, env = "FINHEALTH_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Per-call LLM timeout in seconds. Waits indefinitely when unset.
    #[arg(long, env = "FINHEALTH_API_TIMEOUT")]
    api_timeout: Option<u64>,

    /// Path to a text file with custom analysis instructions.
    #[arg(long, env = "FINHEALTH_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Print the analysis result as JSON and exit.
    #[arg(long, env = "FINHEALTH_JSON")]
    json: bool,

    /// Print the dashboard and exit without opening a chat.
    #[arg(long, env = "FINHEALTH_NO_CHAT")]
    no_chat: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "FINHEALTH_VERBOSE")]
    verbose: bool,

    /// Suppress everything except results and errors.
    #[arg(short, long, env = "FINHEALTH_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Spinners provide the feedback in normal runs; library logs only
    // surface with -v or RUST_LOG.
    let filter = if cli.verbose { "debug" } else { "error" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli).await?;

    // ── One-shot modes ───────────────────────────────────────────────────
    if cli.json || cli.no_chat {
        let report = cli
            .report
            .clone()
            .context("A report path is required with --json or --no-chat")?;
        let bar = spinner(&cli, config.locale.strings().analyzing_title);
        let result = analyze_report(&report, &config).await;
        bar.finish_and_clear();
        let result = result.context("Checkup failed")?;

        if cli.json {
            let json =
                serde_json::to_string_pretty(&result).context("Failed to serialise result")?;
            println!("{json}");
        } else {
            print_result(&result, config.locale);
        }
        return Ok(());
    }

    // ── Interactive mode ─────────────────────────────────────────────────
    let locale = config.locale;
    let analyst = LlmAnalyst::from_config(config).context("No LLM provider available")?;
    let mut controller = Controller::new(Arc::new(analyst), locale);
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut next_report = cli.report.clone();

    if !cli.quiet {
        let s = locale.strings();
        eprintln!("{} {}  {}", cyan("◆"), bold(s.app_name), dim(s.app_subtitle));
        eprintln!("  {}", s.hero_title);
        eprintln!("  {}", dim(s.hero_desc));
        eprintln!(
            "  {}",
            dim(&format!("1. {}  2. {}  3. {}", s.step_upload, s.step_status, s.step_ask))
        );
    }

    loop {
        // ── Upload ───────────────────────────────────────────────────────
        let path = match next_report.take() {
            Some(p) => p,
            None => {
                let s = controller.state().locale().strings();
                eprintln!();
                eprintln!("{}  {}", bold(s.upload_title), dim(s.upload_subtitle));
                match prompt(&mut stdin).await? {
                    None => return Ok(()),
                    Some(line) if line == "/quit" => return Ok(()),
                    Some(line) if line.is_empty() => continue,
                    Some(line) => PathBuf::from(line),
                }
            }
        };

        controller
            .select_file(&path)
            .context("Cannot select a file right now")?;
        let strings = controller.state().locale().strings();
        let bar = spinner(&cli, strings.analyzing_title);
        bar.set_message(strings.analyzing_desc);
        let phase = controller.settle().await;
        bar.finish_and_clear();
        print_notices(controller.take_notices(), cli.verbose);

        if phase != (Phase::Ready { sending: false }) {
            continue;
        }
        if let Some(result) = controller.state().result() {
            print_result(result, controller.state().locale());
        }

        // ── Chat ─────────────────────────────────────────────────────────
        let s = controller.state().locale().strings();
        println!();
        println!("{}  {}", bold(s.chat_header), dim(s.ai_badge));
        print!(
            "{}",
            render_transcript(controller.state().transcript(), controller.state().locale())
        );
        eprintln!(
            "{}",
            dim(&format!("{}  (/reset, /lang en|zh, /quit)", s.placeholder))
        );

        match chat_loop(&cli, &mut controller, &mut stdin).await? {
            ChatExit::Quit => return Ok(()),
            ChatExit::Reset => {
                controller.reset();
                eprintln!("{} {}", cyan("↺"), controller.state().locale().strings().start_over);
            }
        }
    }
}

enum ChatExit {
    Quit,
    Reset,
}

async fn chat_loop(
    cli: &Cli,
    controller: &mut Controller,
    stdin: &mut Lines<BufReader<Stdin>>,
) -> Result<ChatExit> {
    loop {
        let Some(line) = prompt(stdin).await? else {
            return Ok(ChatExit::Quit);
        };

        match line.as_str() {
            "/quit" | "/exit" => return Ok(ChatExit::Quit),
            "/reset" => return Ok(ChatExit::Reset),
            cmd if cmd.starts_with("/lang") => {
                match cmd.trim_start_matches("/lang").parse::<Locale>() {
                    Ok(locale) => {
                        controller.set_locale(locale);
                        if let Some(result) = controller.state().result() {
                            print_result(result, locale);
                        }
                    }
                    Err(e) => eprintln!("{} {}", red("✗"), e),
                }
                continue;
            }
            _ => {}
        }

        match controller.send_message(line) {
            Ok(()) => {}
            Err(TransitionError::Busy) => {
                eprintln!("{}", yellow(controller.state().locale().strings().busy));
                continue;
            }
            Err(e) => {
                eprintln!("{} {}", red("✗"), e);
                continue;
            }
        }

        if controller.pending() == 0 {
            // Blank input: nothing was sent.
            continue;
        }

        let bar = spinner(cli, controller.state().locale().strings().thinking);
        controller.settle().await;
        bar.finish_and_clear();

        if let Some(turn) = controller.state().latest_turn() {
            if turn.speaker == Speaker::Assistant {
                println!("{}", cyan(&assistant_label(controller.state().locale())));
                for l in turn.text.lines() {
                    println!("  {l}");
                }
            }
        }
    }
}

/// Print a prompt marker and read one trimmed line. `None` on end of input.
async fn prompt(stdin: &mut Lines<BufReader<Stdin>>) -> Result<Option<String>> {
    print!("{} ", cyan("›"));
    io::stdout().flush().context("Failed to flush stdout")?;
    let line = stdin.next_line().await.context("Failed to read stdin")?;
    Ok(line.map(|l| l.trim().to_string()))
}

fn print_result(result: &edgequake_finhealth::AnalysisResult, locale: Locale) {
    let text = render_result(result, locale);
    let strip = Lamp::for_status(result.status).strip();
    let coloured = match Lamp::for_status(result.status) {
        Lamp::Green => green(strip),
        Lamp::Yellow => yellow(strip),
        Lamp::Red => red(strip),
        Lamp::Off => dim(strip),
    };
    println!();
    print!("{}", text.replacen(strip, &coloured, 1));
}

fn print_notices(notices: Vec<Notice>, verbose: bool) {
    for notice in notices {
        eprintln!("{} {}", red("✗"), notice.message);
        if verbose {
            eprintln!("  {}", dim(&notice.detail));
        }
    }
}

/// Spinner on stderr; hidden in quiet mode.
fn spinner(cli: &Cli, message: &str) -> ProgressBar {
    if cli.quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_prefix(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// Map CLI args to `CheckupConfig`.
async fn build_config(cli: &Cli) -> Result<CheckupConfig> {
    let mut builder = CheckupConfig::builder()
        .locale(cli.lang)
        .analysis_temperature(cli.temperature)
        .chat_temperature(cli.chat_temperature)
        .max_tokens(cli.max_tokens);

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(secs) = cli.api_timeout {
        builder = builder.api_timeout_secs(secs);
    }
    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }

    builder.build().context("Invalid configuration")
}
