use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use iterra_api::auth::jwt::{generate_access_token, JwtConfig, DEFAULT_ACCESS_EXPIRY_MINS};
use iterra_core::metrics::FeedbackMode;
use iterra_pipeline::detector::{HttpPoseDetector, DEFAULT_DETECTOR_URL};
use iterra_pipeline::ffmpeg::FfmpegVideoSource;
use iterra_pipeline::sampler::{SamplerConfig, DEFAULT_FRAME_COUNT};
use iterra_pipeline::{AnalysisConfig, PoseAnalyzer};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod feedback_client;

use feedback_client::FeedbackClient;

#[derive(Debug, Parser)]
#[command(name = "iterra")]
#[command(about = "Analyze tennis videos and request coaching feedback", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract pose metrics from a video file and print them as JSON.
    ///
    /// With --feedback-url, the metrics are also sent to the feedback
    /// endpoint and the returned tips are printed.
    Analyze {
        /// The video to analyze.
        video: PathBuf,

        /// Number of evenly spaced frames to sample.
        #[arg(long, default_value_t = DEFAULT_FRAME_COUNT, value_parser = clap::value_parser!(u32).range(1..))]
        frames: u32,

        /// Base URL of the pose inference service.
        #[arg(long, env = "DETECTOR_URL", default_value = DEFAULT_DETECTOR_URL)]
        detector_url: String,

        /// Maximum time for one call to the inference service.
        #[arg(long, default_value_t = 10_000)]
        detector_timeout_ms: u64,

        /// Maximum time for a single seek.
        #[arg(long, default_value_t = 5000)]
        seek_timeout_ms: u64,

        /// Maximum time to wait for the video's duration.
        #[arg(long, default_value_t = 2000)]
        readiness_timeout_ms: u64,

        /// Coaching focus sent with the metrics.
        #[arg(long, default_value = "technical")]
        mode: FeedbackMode,

        /// Full URL of the feedback endpoint.
        #[arg(long, requires = "token")]
        feedback_url: Option<String>,

        /// Bearer token for the feedback endpoint (see `iterra token`).
        #[arg(long, env = "ITERRA_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Mint a development bearer token for a player.
    Token {
        /// The player's identity uid.
        uid: String,

        /// Token lifetime in minutes.
        #[arg(long, default_value_t = DEFAULT_ACCESS_EXPIRY_MINS)]
        ttl_mins: i64,

        /// Signing secret; must match the server's.
        #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
        secret: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays machine-readable.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "iterra=info,iterra_pipeline=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            video,
            frames,
            detector_url,
            detector_timeout_ms,
            seek_timeout_ms,
            readiness_timeout_ms,
            mode,
            feedback_url,
            token,
        } => {
            let mut source = FfmpegVideoSource::open(&video)
                .await
                .with_context(|| format!("failed to open {}", video.display()))?;

            let config = AnalysisConfig {
                sampler: SamplerConfig {
                    frame_count: frames,
                    readiness_timeout: Duration::from_millis(readiness_timeout_ms),
                    seek_timeout: Duration::from_millis(seek_timeout_ms),
                    ..SamplerConfig::default()
                },
                mode,
            };
            let detector = HttpPoseDetector::new(detector_url)
                .with_timeout(Duration::from_millis(detector_timeout_ms));
            let mut analyzer = PoseAnalyzer::new(detector, config);

            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Interrupted, cancelling analysis");
                    on_interrupt.cancel();
                }
            });

            let metrics = analyzer
                .run(&mut source, &cancel)
                .await
                .context("pose analysis failed")?;
            println!("{}", serde_json::to_string_pretty(&metrics)?);

            if let Some(url) = feedback_url {
                let token = token.context("--token is required with --feedback-url")?;
                let feedback = FeedbackClient::new(url)
                    .request_feedback(&metrics, &token)
                    .await?;

                println!();
                for tip in &feedback.tips {
                    println!("{tip}\n");
                }
                if feedback.tips.is_empty() {
                    println!("{}", feedback.full_response);
                }
            }
        }

        Commands::Token {
            uid,
            ttl_mins,
            secret,
        } => {
            anyhow::ensure!(!secret.is_empty(), "JWT secret must not be empty");
            anyhow::ensure!(ttl_mins > 0, "--ttl-mins must be positive");

            let config = JwtConfig {
                secret,
                access_token_expiry_mins: ttl_mins,
            };
            let token = generate_access_token(&uid, &config).context("failed to sign token")?;
            println!("{token}");
        }
    }

    Ok(())
}
