use std::process;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;

use maskcam_core::classification::domain::subject_detector::{DetectorError, SubjectDetector};
use maskcam_core::classification::infrastructure::scripted_classifier::{
    ClassifierStep, ScriptedClassifier,
};
use maskcam_core::classification::infrastructure::scripted_detector::{
    DetectorStep, ScriptedDetector,
};
use maskcam_core::classification::infrastructure::throttled_detector::ThrottledDetector;
use maskcam_core::pipeline::infrastructure::threaded_live_pipeline::ThreadedLivePipeline;
use maskcam_core::pipeline::live_pipeline::{LivePipeline, PipelineConfig};
use maskcam_core::pipeline::output::{PipelineOutput, PipelineState};
use maskcam_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use maskcam_core::pipeline::result_sink::ChannelSink;
use maskcam_core::shared::frame::{Frame, Orientation};
use maskcam_core::shared::region::Region;

/// Synthetic frame dimensions used by the simulator.
const FRAME_WIDTH: u32 = 64;
const FRAME_HEIGHT: u32 = 64;

/// Live classification pipeline simulator with scripted detections.
#[derive(Parser)]
#[command(name = "maskcam")]
struct Cli {
    /// Comma-separated per-frame tokens: `none` (no subject), `error`
    /// (detector failure), or `label[:confidence]` (one detected region
    /// classified as `label`). Cycles when shorter than --frames.
    scenario: String,

    /// Number of frames to submit (default: one pass over the scenario).
    #[arg(long)]
    frames: Option<usize>,

    /// Simulated capture rate in frames per second.
    #[arg(long, default_value = "30.0")]
    fps: f64,

    /// Stability window capacity.
    #[arg(long, default_value = "3")]
    window: usize,

    /// Run detection every Nth frame (1 = every frame).
    #[arg(long, default_value = "1")]
    skip_frames: usize,

    /// Smoothed label to flag as an alert.
    #[arg(long)]
    alert_label: Option<String>,

    /// Detection confidence assigned to scripted regions.
    #[arg(long, default_value = "0.9")]
    confidence: f64,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let (detector_steps, classifier_steps) = parse_scenario(&cli.scenario, cli.confidence)?;
    let frames = cli.frames.unwrap_or(detector_steps.len());

    let detector = build_detector(detector_steps, cli.skip_frames)?;
    let classifier = Box::new(ScriptedClassifier::new(classifier_steps));
    let (sink, results) = ChannelSink::new();

    let config = PipelineConfig {
        window_capacity: cli.window,
        alert_label: cli.alert_label.clone(),
    };
    let pipeline = Arc::new(ThreadedLivePipeline::new(
        detector,
        classifier,
        Box::new(sink),
        Box::new(StdoutPipelineLogger::new()),
        config,
    )?);

    pipeline.start()?;

    let interval = Duration::from_secs_f64(1.0 / cli.fps);
    for index in 0..frames {
        pipeline.submit_frame(synthetic_frame(index, interval))?;
        while let Ok(output) = results.try_recv() {
            print_output(&output);
        }
        thread::sleep(interval);
    }

    pipeline.stop()?;
    while let Ok(output) = results.try_recv() {
        print_output(&output);
    }

    log::info!(
        "Submitted {frames} frames, dropped {} at the gate",
        pipeline.frames_dropped()
    );
    Ok(())
}

fn build_detector(
    steps: Vec<DetectorStep>,
    skip_frames: usize,
) -> Result<Box<dyn SubjectDetector>, Box<dyn std::error::Error>> {
    let base: Box<dyn SubjectDetector> = Box::new(ScriptedDetector::new(steps));
    if skip_frames > 1 {
        Ok(Box::new(ThrottledDetector::new(base, skip_frames)?))
    } else {
        Ok(base)
    }
}

/// Parses the scenario string into aligned detector and classifier scripts.
///
/// Classifier steps are only produced for tokens that yield a region: the
/// pipeline never consults the classifier for subjectless frames.
#[allow(clippy::type_complexity)]
fn parse_scenario(
    scenario: &str,
    detection_confidence: f64,
) -> Result<(Vec<DetectorStep>, Vec<ClassifierStep>), String> {
    let mut detector_steps = Vec::new();
    let mut classifier_steps = Vec::new();

    for token in scenario.split(',') {
        let token = token.trim();
        match token {
            "" => return Err("scenario contains an empty token".to_string()),
            "none" => detector_steps.push(DetectorStep::Regions(vec![])),
            "error" => detector_steps.push(DetectorStep::Fail(DetectorError::DeviceFailure(
                "scripted failure".to_string(),
            ))),
            _ => {
                let (label, confidence) = parse_labeled_token(token)?;
                detector_steps.push(DetectorStep::Regions(vec![centered_region(
                    detection_confidence,
                )]));
                classifier_steps.push(Ok((label, confidence)));
            }
        }
    }

    Ok((detector_steps, classifier_steps))
}

fn parse_labeled_token(token: &str) -> Result<(String, f64), String> {
    match token.split_once(':') {
        None => Ok((token.to_string(), 1.0)),
        Some((label, confidence)) => {
            if label.is_empty() {
                return Err(format!("token '{token}' has an empty label"));
            }
            let confidence: f64 = confidence
                .parse()
                .map_err(|_| format!("token '{token}' has a non-numeric confidence"))?;
            if !(0.0..=1.0).contains(&confidence) {
                return Err(format!(
                    "token '{token}' confidence must be between 0.0 and 1.0"
                ));
            }
            Ok((label.to_string(), confidence))
        }
    }
}

fn centered_region(confidence: f64) -> Region {
    Region {
        x: 0.25,
        y: 0.25,
        width: 0.5,
        height: 0.5,
        confidence,
        frame_index: 0,
    }
}

fn synthetic_frame(index: usize, interval: Duration) -> Frame {
    Frame::new(
        vec![0u8; (FRAME_WIDTH * FRAME_HEIGHT * 3) as usize],
        FRAME_WIDTH,
        FRAME_HEIGHT,
        3,
        interval * index as u32,
        Orientation::LeftMirrored,
        index,
    )
}

fn print_output(output: &PipelineOutput) {
    let state = match output.state {
        PipelineState::Idle => "idle",
        PipelineState::Tracking => "tracking",
    };
    let alert = if output.alert { "  [ALERT]" } else { "" };
    println!(
        "[{:7.3}s] {state:8} {} ({:.2}){alert}",
        output.timestamp.as_secs_f64(),
        output.label,
        output.confidence
    );
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !(cli.fps > 0.0 && cli.fps <= 240.0) {
        return Err(format!("FPS must be between 0 and 240, got {}", cli.fps).into());
    }
    if cli.window == 0 {
        return Err("Window capacity must be at least 1".into());
    }
    if cli.skip_frames == 0 {
        return Err("Skip-frames interval must be at least 1".into());
    }
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    if let Some(frames) = cli.frames {
        if frames == 0 {
            return Err("Frame count must be at least 1".into());
        }
    }
    Ok(())
}
