//! Replay a recorded drill through the tracking pipeline.
//!
//! ## Usage
//!
//! ```bash
//! dribble-replay recording.jsonl --config drill.json --reports
//! ```
//!
//! Each line of the recording is one frame's model output:
//!
//! ```json
//! {"timestamp": 1200, "width": 1920, "height": 1080, "shape": [1, 5, 2], "data": [...]}
//! ```
//!
//! `RUST_LOG` controls logging (default: info).

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use clap::Parser;
use dribbletrack_rs::integration::Frame;
use dribbletrack_rs::{Config, InferenceError, InferenceSource, TrackerPipeline};
use ndarray::{ArrayD, IxDyn};
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay a recorded dribble drill", long_about = None)]
struct Args {
    /// JSON-lines recording of model outputs
    recording: PathBuf,

    /// Pipeline configuration (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print every per-frame report as JSON
    #[arg(long)]
    reports: bool,
}

#[derive(Debug, Deserialize)]
struct RecordedFrame {
    timestamp: u64,
    width: u32,
    height: u32,
    shape: Vec<usize>,
    data: Vec<f32>,
}

/// Hands back the recorded tensor for the frame being replayed.
#[derive(Default)]
struct Recorded {
    next: Option<ArrayD<f32>>,
}

impl InferenceSource for Recorded {
    type Error = InferenceError;

    fn infer(&mut self, _input: &[u8], _width: u32, _height: u32) -> Result<ArrayD<f32>, Self::Error> {
        self.next
            .take()
            .ok_or_else(|| InferenceError::Inference("no recorded output for frame".into()))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };

    let reader = BufReader::new(File::open(&args.recording)?);
    let mut pipeline = TrackerPipeline::new(Recorded::default(), &config);
    let mut frames = 0u64;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let recorded: RecordedFrame = serde_json::from_str(&line)?;

        // A tensor whose data does not fit its shape replays as a missing
        // output, which the pipeline reports as an inference failure.
        pipeline.processor_mut().source_mut().next =
            match ArrayD::from_shape_vec(IxDyn(&recorded.shape), recorded.data) {
                Ok(tensor) => Some(tensor),
                Err(e) => {
                    warn!(line = index + 1, error = %e, "recorded tensor does not match its shape");
                    None
                }
            };

        if !pipeline.session().is_active() {
            pipeline.session_mut().start(recorded.timestamp);
        }

        let frame = Frame {
            id: index as u64,
            timestamp_ms: recorded.timestamp,
            width: recorded.width,
            height: recorded.height,
            pixels: Some(&[]),
        };
        let outcome = pipeline.process_frame(&frame);
        frames += 1;

        if args.reports {
            println!("{}", outcome.report.to_json()?);
        }
        if let Some(event) = outcome.event {
            println!(
                "dribble {} at {} ms (amplitude {:.3})",
                event.count, event.timestamp_ms, event.amplitude
            );
        }
    }

    let count = pipeline.session().count();
    info!(frames, count, "replay finished");
    println!("total dribbles: {count}");
    Ok(())
}
