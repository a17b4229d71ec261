use std::io::{self, BufRead, Write};
use std::panic::{self, AssertUnwindSafe};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod config;
mod logging;
mod model;
mod protocol;
mod services;

use config::Settings;
use services::analysis::{AnalysisOutcome, AnalysisRequest, Analyzer};
use services::gemini::GeminiClient;
use services::prompt::AnalysisMode;

const DEMO_VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
const DEMO_GOAL: &str =
    "Option 2: Creator needs to identify problems in their video and get solutions.";

#[derive(Parser)]
#[command(name = "video-critic", version, about = "Video quality critique node")]
struct Cli {
    #[command(subcommand)]
    command: Option<Mode>,
}

#[derive(Subcommand)]
enum Mode {
    /// Answer line-delimited JSON requests on stdin (default)
    Serve,
    /// Run one example analysis and print the result
    Demo {
        #[arg(long, default_value = DEMO_VIDEO_URL)]
        video_uri: String,
        #[arg(long, default_value = DEMO_GOAL)]
        goal: String,
        #[arg(long)]
        reference_video_uri: Option<String>,
        /// Compare against the reference video
        #[arg(long, requires = "reference_video_uri")]
        compare: bool,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    logging::init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;
    let analyzer = Analyzer::new(GeminiClient::new(&settings)?, settings.video_mime_type.clone());

    match cli.command.unwrap_or(Mode::Serve) {
        Mode::Serve => {
            let ctx = protocol::Context {
                analyzer,
                comparison_goal: settings.comparison_goal.clone(),
            };
            serve(&ctx)?;
            Ok(ExitCode::SUCCESS)
        }
        Mode::Demo {
            video_uri,
            goal,
            reference_video_uri,
            compare,
        } => {
            if !settings.has_credential() {
                eprintln!("FATAL: Please set the GEMINI_API_KEY environment variable.");
                return Ok(ExitCode::FAILURE);
            }

            let mode = if compare {
                AnalysisMode::Comparison
            } else {
                AnalysisMode::Single
            };
            let request = AnalysisRequest {
                video_uri,
                goal,
                reference_video_uri,
                mode,
            };
            demo(&analyzer, &request, settings.review_threshold)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn serve(ctx: &protocol::Context<GeminiClient>) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    tracing::info!("video-critic-core ready");

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => continue,
        };

        if line.trim().is_empty() {
            continue;
        }

        let result = panic::catch_unwind(AssertUnwindSafe(|| protocol::handle(&line, ctx)));

        let response = match result {
            Ok(resp) => resp,
            Err(_) => serde_json::json!({
                "status": "error",
                "message": "internal core error"
            })
            .to_string(),
        };

        if writeln!(stdout, "{response}").is_err() {
            break;
        }

        stdout.flush()?;
    }

    Ok(())
}


fn demo(
    analyzer: &Analyzer<GeminiClient>,
    request: &AnalysisRequest,
    threshold: i64,
) -> anyhow::Result<()> {
    println!("-> Sending request to Gemini with goal: {}", request.goal);

    let outcome = analyzer.analyze(request);

    println!("\n--- Raw JSON Output ---");
    println!("{}", serde_json::to_string_pretty(&outcome.to_value())?);

    match &outcome {
        AnalysisOutcome::Success(result) if result.is_below(threshold) => {
            println!(
                "\n!!! ACTION REQUIRED: Score < {threshold}. Triggering Opus Human Review Node."
            );
        }
        AnalysisOutcome::Success(_) => {
            println!("\nAnalysis complete. Proceeding to final report generation.");
        }
        AnalysisOutcome::Failure(f) => {
            eprintln!("Gemini API Error: {}", f.error);
        }
    }

    Ok(())
}
