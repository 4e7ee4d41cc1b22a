mod ai;
mod download;
mod error;
mod grid;
mod link;
mod pipeline;
mod sampler;
mod video;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::grid::GridLayout;
use crate::pipeline::{CaptionRequest, VideoInput};

#[derive(Parser)]
#[command(name = "stockcap")]
#[command(about = "Generate a stock-photo caption and keywords for a video", long_about = None)]
struct Cli {
    /// Local video file to caption.
    input_file: Option<PathBuf>,

    /// YouTube video URL to download and caption instead.
    #[arg(short, long, conflicts_with = "input_file")]
    url: Option<String>,

    /// Number of frames to sample; must equal rows * cols.
    #[arg(short, long, default_value_t = 9)]
    frames: u32,

    #[arg(long, default_value_t = 3)]
    rows: u32,

    #[arg(long, default_value_t = 3)]
    cols: u32,

    /// Padding between grid cells in pixels.
    #[arg(short, long, default_value_t = 10)]
    padding: u32,

    /// Reject videos longer than this many seconds.
    #[arg(long, default_value_t = 300)]
    max_duration_secs: u64,

    /// Where downloaded videos are written.
    #[arg(long, default_value = "input_vid.mp4")]
    video_out: PathBuf,

    /// Where the composite grid image is written.
    #[arg(long, default_value = "input_grid.jpg")]
    grid_out: PathBuf,

    /// OpenAI API key; falls back to the OPENAI_API_KEY environment variable.
    #[arg(long)]
    api_key: Option<String>,

    /// Keep the downloaded video and grid image after the run.
    #[arg(long)]
    keep_artifacts: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stockcap=info")),
        )
        .init();

    let cli = Cli::parse();

    let input = match (cli.input_file, cli.url) {
        (Some(path), None) => VideoInput::Upload(path),
        (None, Some(url)) => VideoInput::Youtube(url),
        _ => anyhow::bail!("provide a video file or a YouTube URL"),
    };

    video::init();

    let request = CaptionRequest {
        input,
        layout: GridLayout::new(cli.rows, cli.cols, cli.padding),
        frame_count: cli.frames,
        max_duration_secs: cli.max_duration_secs,
        video_path: cli.video_out,
        grid_path: cli.grid_out,
        api_key: cli.api_key,
        keep_artifacts: cli.keep_artifacts,
    };

    let result = pipeline::run(request).await?;

    println!("Caption: {}", result.caption);
    println!("Keywords: {}", result.keywords.join(", "));

    Ok(())
}
