//! Vidgen CLI — command-line client for the generation API.
//!
//! Set VIDGEN_API_URL (or API_URL) to point at the server.

mod api_client;

use anyhow::Result;
use api_client::ApiClient;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_secs(4);

#[derive(Parser)]
#[command(name = "vidgen", about = "Image-to-video generation CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit an image and prompt, then poll until the video is ready
    Generate {
        /// Path to the source image
        image: PathBuf,
        /// Text prompt describing the motion
        prompt: String,
        /// Clip duration in seconds
        #[arg(long)]
        duration: Option<u32>,
        /// Aspect ratio, e.g. 1280:768
        #[arg(long)]
        ratio: Option<String>,
        /// Chain a 4K upscale pass after generation
        #[arg(long)]
        upscale: bool,
        /// Exit after submission instead of polling
        #[arg(long)]
        no_wait: bool,
    },
    /// Poll the status of an existing task
    Status {
        /// Task id returned by a previous submission
        task_id: String,
        /// Poll until the task reaches a terminal state
        #[arg(long)]
        wait: bool,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let client = ApiClient::from_env()?;

    match cli.command {
        Commands::Generate {
            image,
            prompt,
            duration,
            ratio,
            upscale,
            no_wait,
        } => {
            let reply = client
                .submit(&image, &prompt, duration, ratio.as_deref(), upscale)
                .await?;
            println!("Task {} submitted ({})", reply.task_id, reply.status);

            if no_wait {
                return Ok(());
            }
            poll_until_done(&client, reply.task_id).await
        }
        Commands::Status { task_id, wait } => {
            if wait {
                poll_until_done(&client, task_id).await
            } else {
                let reply = client.status(&task_id).await?;
                print_progress(&reply);
                Ok(())
            }
        }
    }
}

fn print_progress(reply: &api_client::TaskReply) {
    println!("Task {}: {} ({}%)", reply.task_id, reply.status, reply.progress);
}

/// Poll every few seconds until the task succeeds or the server reports an
/// error. The task id can change mid-flight when an upscale job is chained.
async fn poll_until_done(client: &ApiClient, mut task_id: String) -> Result<()> {
    let mut interval = tokio::time::interval(POLL_INTERVAL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                println!("Interrupted; task {} is still running server-side", task_id);
                return Ok(());
            }
        }

        let reply = client.status(&task_id).await?;
        print_progress(&reply);

        if reply.status == "SUCCEEDED" {
            if let Some(url) = reply.video_url {
                println!("{}", url);
            }
            return Ok(());
        }
        task_id = reply.task_id;
    }
}
