use anyhow::Context;
use clap::{Parser, Subcommand};
use manim_narration::config::timeout_from_secs;
use manim_narration::scene::{Segment, SegmentTiming, Timeline, SUBTITLE_FADE_OUT};
use manim_narration::{FallbackPolicy, NarrationCache, NarrationConfig, NarrationResult};
use serde_json::json;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "manim-narration")]
#[command(about = "Cached TTS narration and timing for narrated scenes", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Synthesize (or reuse) narration and print its audio path and duration
    Resolve {
        /// Narration text
        #[arg(short, long)]
        text: Option<String>,

        /// File with one narration line per line
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Cache directory for synthesized clips
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// TTS service endpoint
        #[arg(long)]
        endpoint: Option<String>,

        /// TTS service token
        #[arg(long)]
        token: Option<String>,

        /// Per-request timeout in seconds, 0 disables it
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Duration reported when audio is unavailable: zero | text-length
        #[arg(long)]
        fallback: Option<FallbackPolicy>,
    },

    /// Compute the pause that pads a segment to its narration length
    Plan {
        /// Narration duration in seconds, 0 when there is no narration timing
        #[arg(short, long)]
        duration: f64,

        /// Planned animation run-times, comma separated
        #[arg(short, long, value_delimiter = ',')]
        steps: Vec<f64>,

        /// Subtitle fade-out run-time
        #[arg(long, default_value_t = SUBTITLE_FADE_OUT)]
        fade_out: f64,

        /// Pause used when the duration carries no timing
        #[arg(long)]
        default_wait: Option<f64>,
    },

    /// Print the cache file a narration text maps to
    Path {
        #[arg(short, long)]
        text: String,

        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Command::Resolve {
            text,
            file,
            cache_dir,
            endpoint,
            token,
            timeout_secs,
            fallback,
        } => {
            let mut config = NarrationConfig::from_env().context("Invalid narration settings")?;
            if let Some(dir) = cache_dir {
                config = config.with_cache_dir(dir);
            }
            if let Some(endpoint) = endpoint {
                config = config.with_endpoint(endpoint);
            }
            if let Some(token) = token {
                config = config.with_token(token);
            }
            if let Some(secs) = timeout_secs {
                config = config.with_timeout(timeout_from_secs(secs));
            }
            if let Some(fallback) = fallback {
                config = config.with_fallback(fallback);
            }

            if config.token.is_empty() {
                eprintln!("Error: NARRATION_TTS_TOKEN not found. Please set it via --token or the NARRATION_TTS_TOKEN environment variable");
                std::process::exit(1);
            }

            let lines = if let Some(text) = text {
                vec![text]
            } else if let Some(file_path) = file {
                let content = tokio::fs::read_to_string(&file_path)
                    .await
                    .context(format!("Failed to read file: {}", file_path.display()))?;
                narration_lines(&content)
            } else {
                eprintln!("Error: Either --text or --file must be provided");
                std::process::exit(1);
            };

            if let Err(e) = run_resolve(config, lines).await {
                error!("Narration failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Command::Plan {
            duration,
            steps,
            fade_out,
            default_wait,
        } => {
            let default_wait = match default_wait {
                Some(secs) => secs,
                None => {
                    NarrationConfig::from_env()
                        .context("Invalid narration settings")?
                        .default_wait
                }
            };
            let segment = Segment::new(0, String::new(), steps)
                .with_narration(NarrationResult::timed(duration));
            let timing = plan_segment(&segment, fade_out, default_wait);
            println!(
                "{}",
                json!({
                    "duration": segment.narration.duration_seconds,
                    "planned": segment.planned(),
                    "fade_out": fade_out,
                    "pause": timing.pause,
                    "end": timing.end,
                })
            );
        }
        Command::Path { text, cache_dir } => {
            let dir = match cache_dir {
                Some(dir) => dir,
                None => NarrationConfig::from_env()
                    .context("Invalid narration settings")?
                    .cache_dir,
            };
            println!(
                "{}",
                manim_narration::cache::cache_path_in(&dir, &text).display()
            );
        }
    }

    Ok(())
}

async fn run_resolve(config: NarrationConfig, lines: Vec<String>) -> anyhow::Result<()> {
    let cache = NarrationCache::new(config).context("Failed to open narration cache")?;

    info!("Resolving {} narration line(s)...", lines.len());
    let mut voiced = 0usize;
    for (index, text) in lines.iter().enumerate() {
        let result = cache.resolve(text).await;
        if result.has_audio() {
            voiced += 1;
        }
        println!(
            "{}",
            json!({
                "index": index,
                "text": text,
                "audio_path": result.audio_path,
                "duration_seconds": result.duration_seconds,
                "origin": result.origin,
            })
        );
    }

    info!("{}/{} narration line(s) have audio", voiced, lines.len());
    Ok(())
}

fn plan_segment(segment: &Segment, fade_out: f64, default_wait: f64) -> SegmentTiming {
    Timeline::new(fade_out, default_wait).schedule(segment)
}

fn narration_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
