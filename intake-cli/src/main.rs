//! Symptom intake console
//!
//! Runs the voice intake dialogue in a terminal: prompts are printed instead
//! of spoken and each typed line stands in for one recognised utterance.
//!
//! Usage:
//!   symptom-intake intake [--script answers.txt]
//!   symptom-intake ask "What are the symptoms of malaria?"
//!   symptom-intake chat
//!   symptom-intake match "hay fevr" --kind symptom

use async_trait::async_trait;
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use error_common::{AppError, Result};
use intake_engine::{
    create_collaborators, DialogueController, DialogueHandle, DialogueRunner, FuzzyMatcher,
    IntakeCatalog, IntakeConfig, IntakeError, IntakeOutcome, IntakeResult, Recommendations,
    Urgency, VoiceChat, VoiceIo,
};
use logger_redacted::{init_tracing, LoggerConfig};

/// Voice-driven symptom intake and disease prediction
#[derive(Parser, Debug)]
#[command(name = "symptom-intake")]
#[command(about = "Voice-driven symptom intake and disease prediction", version)]
struct Cli {
    /// Configuration file (YAML); environment variables are used when absent
    #[arg(short, long, env = "INTAKE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect age, gender, region and symptoms, then request a prediction
    Intake {
        /// Replay answers from a file, one utterance per line
        #[arg(long)]
        script: Option<PathBuf>,
    },
    /// Ask the medical chatbot a single question
    Ask {
        #[arg(required = true)]
        question: Vec<String>,
    },
    /// Spoken Q&A with the medical chatbot
    Chat,
    /// Show how a phrase is corrected and matched against a vocabulary
    Match {
        text: String,

        #[arg(long, value_enum, default_value_t = MatchKind::Symptom)]
        kind: MatchKind,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum MatchKind {
    Symptom,
    Region,
    Gender,
}

/// Exit status after a second Ctrl-C, as a shell reports SIGINT
const INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            alert(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let logger = LoggerConfig {
        log_level: "warn".to_string(),
        ..LoggerConfig::default()
    }
    .verbose(cli.verbose)
    .with_json(cli.json_logs);
    init_tracing(&logger).map_err(|e| AppError::ConfigError(e.to_string()))?;

    let config = match &cli.config {
        Some(path) => IntakeConfig::from_yaml_file(path)?,
        None => IntakeConfig::from_env()?,
    };
    debug!(?config, "configuration loaded");

    match cli.command {
        Command::Intake { script } => intake(&config, script).await,
        Command::Ask { question } => ask(&config, &question.join(" ")).await,
        Command::Chat => chat(&config).await,
        Command::Match { text, kind, json } => match_text(&config, &text, kind, json),
    }
}

async fn intake(config: &IntakeConfig, script: Option<PathBuf>) -> Result<()> {
    let catalog = IntakeCatalog::load(config.catalog_path.as_deref())?;
    let (prediction, _) = create_collaborators(&config.collaborators)?;
    let voice = Arc::new(ConsoleVoice::from_script(script)?);

    let controller = DialogueController::standard(catalog, config.dialogue.clone());
    let runner = DialogueRunner::new(controller, voice, prediction);
    cancel_on_ctrl_c(runner.handle());

    println!("{}", "🩺 Symptom intake (Ctrl-C to cancel)".bright_cyan());
    match runner.run().await? {
        IntakeOutcome::Predicted {
            session,
            record,
            prediction,
            recommendations,
        } => {
            info!(session_id = %session.id, "intake complete");
            println!();
            println!("{}", "📋 Intake record".bright_cyan());
            println!("   Age:      {}", record.age);
            println!("   Gender:   {}", record.gender);
            println!("   Region:   {}", record.region);
            let symptoms: Vec<&str> = record.symptoms.iter().map(String::as_str).collect();
            println!("   Symptoms: {}", symptoms.join(", "));
            println!();
            println!(
                "{} {}",
                "🔎 Predicted:".bright_cyan(),
                prediction.predicted_disease.bright_white().bold()
            );
            println!("   Urgency:  {}", paint_urgency(recommendations.urgency));
            if let Some(id) = &prediction.prediction_id {
                println!("   Reference: {}", id);
            }
            print_recommendations(&recommendations);
        }
        IntakeOutcome::Cancelled { .. } => {
            println!("{}", "Intake cancelled.".yellow());
        }
    }
    Ok(())
}

async fn ask(config: &IntakeConfig, question: &str) -> Result<()> {
    let (_, chatbot) = create_collaborators(&config.collaborators)?;
    let answer = chatbot.ask(question).await?;
    println!("{}", answer);
    Ok(())
}

async fn chat(config: &IntakeConfig) -> Result<()> {
    let (_, chatbot) = create_collaborators(&config.collaborators)?;
    let voice = Arc::new(ConsoleVoice::stdin()?);
    let chat = VoiceChat::new(voice, chatbot, config.dialogue.clone());
    cancel_on_ctrl_c(chat.handle());

    let summary = chat.run().await?;
    println!(
        "{}",
        format!("{} question(s) answered.", summary.questions_answered).bright_blue()
    );
    Ok(())
}

fn match_text(config: &IntakeConfig, text: &str, kind: MatchKind, json: bool) -> Result<()> {
    let catalog = IntakeCatalog::load(config.catalog_path.as_deref())?;
    let matcher = FuzzyMatcher::new(catalog.corrections.clone());
    let result = match kind {
        MatchKind::Symptom => matcher.match_with_threshold(
            text,
            &catalog.symptoms,
            config.dialogue.symptom_max_distance,
        ),
        MatchKind::Region => matcher.snap(text, &catalog.regions),
        MatchKind::Gender => matcher.snap(text, &catalog.genders),
    };

    if json {
        let rendered = serde_json::to_string_pretty(&result).map_err(IntakeError::from)?;
        println!("{}", rendered);
        return Ok(());
    }

    println!("   Corrected: {}", matcher.correct(text));
    let value = if result.matched {
        result.value.bright_green()
    } else {
        result.value.yellow()
    };
    println!("   Match:     {}", value);
    println!("   Distance:  {}", result.distance);
    Ok(())
}

/// First Ctrl-C cancels the run; a second one exits straight away
fn cancel_on_ctrl_c(handle: DialogueHandle) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        handle.cancel();
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!();
            std::process::exit(INTERRUPTED);
        }
    });
}

fn print_recommendations(recommendations: &Recommendations) {
    println!("   Next step: {}", recommendations.urgency.advice());

    if !recommendations.demographic.is_empty() {
        println!();
        println!("{}", "👤 For you".bright_cyan());
        for advice in &recommendations.demographic {
            println!("   {}: {}", advice.category.bold(), advice.advice);
        }
    }

    println!();
    println!("{}", "🗓️  Timeline".bright_cyan());
    for entry in recommendations.timeline {
        println!("   {:<16} {}", entry.timeframe, entry.action);
    }

    println!();
    println!("{}", "🚨 Seek emergency help if you notice".bright_red());
    for sign in recommendations
        .disease_warning_signs
        .iter()
        .chain(recommendations.general_warning_signs)
    {
        println!("   - {}", sign);
    }

    if !recommendations.follow_up_questions.is_empty() {
        println!();
        println!("{}", "❓ Worth telling your doctor".bright_cyan());
        for question in recommendations.follow_up_questions {
            println!("   {} ({})", question.question, question.options.join(" / "));
        }
    }
}

fn paint_urgency(urgency: Urgency) -> ColoredString {
    let label = urgency.to_string().to_uppercase();
    match urgency {
        Urgency::High => label.bright_red().bold(),
        Urgency::Moderate => label.bright_yellow(),
        Urgency::Low => label.bright_green(),
    }
}

fn alert(error: &AppError) {
    eprintln!(
        "{} {} {}",
        "⚠️ ".bright_red(),
        format!("[{}]", error.code()).red(),
        error.to_string().bright_red()
    );
}

enum Input {
    Console(mpsc::Receiver<String>),
    Script(VecDeque<String>),
}

/// Read `reader` line by line on its own thread.
///
/// A blocked read never holds up runtime shutdown; the thread is simply
/// abandoned when the process exits.
fn spawn_line_reader<R>(reader: R) -> IntakeResult<mpsc::Receiver<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(16);
    std::thread::Builder::new()
        .name("console-input".to_string())
        .spawn(move || {
            for line in reader.lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "console input closed");
                        break;
                    }
                }
            }
        })?;
    Ok(rx)
}

/// Prints what would be spoken and reads what would be heard
struct ConsoleVoice {
    input: Mutex<Input>,
}

impl ConsoleVoice {
    fn stdin() -> IntakeResult<Self> {
        let lines = spawn_line_reader(std::io::BufReader::new(std::io::stdin()))?;
        Ok(Self::from_lines(lines))
    }

    fn from_lines(lines: mpsc::Receiver<String>) -> Self {
        Self {
            input: Mutex::new(Input::Console(lines)),
        }
    }

    fn from_script(script: Option<PathBuf>) -> IntakeResult<Self> {
        let Some(path) = script else {
            return Self::stdin();
        };
        let raw = std::fs::read_to_string(path)?;
        let lines = raw.lines().map(str::to_string).collect();
        Ok(Self {
            input: Mutex::new(Input::Script(lines)),
        })
    }
}

#[async_trait]
impl VoiceIo for ConsoleVoice {
    async fn speak(&self, text: &str) -> IntakeResult<()> {
        println!("{} {}", "🔊".bright_cyan(), text);
        Ok(())
    }

    async fn listen(&self) -> IntakeResult<String> {
        print!("{} ", "🎤 >".bright_green());
        std::io::stdout().flush()?;

        let mut input = self.input.lock().await;
        match &mut *input {
            Input::Console(lines) => lines
                .recv()
                .await
                .ok_or_else(|| IntakeError::Recognition("end of input".to_string())),
            Input::Script(lines) => {
                let line = lines
                    .pop_front()
                    .ok_or_else(|| IntakeError::Recognition("script exhausted".to_string()))?;
                println!("{}", line);
                Ok(line)
            }
        }
    }

    async fn stop(&self) -> IntakeResult<()> {
        println!();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor, Read};
    use std::time::Duration;

    /// Blocks every read until its sender is dropped, like an idle terminal
    struct IdleTerminal(std::sync::mpsc::Receiver<()>);

    impl Read for IdleTerminal {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            let _ = self.0.recv();
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_console_lines_arrive_then_input_ends() {
        let lines = spawn_line_reader(Cursor::new("32\nfemale\n")).unwrap();
        let voice = ConsoleVoice::from_lines(lines);

        assert_eq!(voice.listen().await.unwrap(), "32");
        assert_eq!(voice.listen().await.unwrap(), "female");
        let err = voice.listen().await.unwrap_err();
        assert!(matches!(err, IntakeError::Recognition(_)));
    }

    #[test]
    fn test_runtime_shuts_down_while_console_read_is_pending() {
        let (_typing, idle) = std::sync::mpsc::channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_time()
            .build()
            .unwrap();

        runtime.block_on(async {
            let lines = spawn_line_reader(BufReader::new(IdleTerminal(idle))).unwrap();
            let voice = ConsoleVoice::from_lines(lines);
            let heard = tokio::time::timeout(Duration::from_millis(50), voice.listen()).await;
            assert!(heard.is_err(), "nothing was typed");
        });

        // the reader thread is still blocked; shutdown must not wait for it
        let started = std::time::Instant::now();
        runtime.shutdown_timeout(Duration::from_secs(5));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_script_replays_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"40\nmale\n").unwrap();
        file.flush().unwrap();

        let voice = ConsoleVoice::from_script(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(voice.listen().await.unwrap(), "40");
        assert_eq!(voice.listen().await.unwrap(), "male");
        assert!(voice.listen().await.is_err());
    }
}
