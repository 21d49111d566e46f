use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};

use crate::classification::domain::region_classifier::RegionClassifier;
use crate::classification::domain::subject_detector::SubjectDetector;
use crate::pipeline::label_frame_use_case::{FrameOutcome, LabelFrameUseCase};
use crate::pipeline::live_pipeline::{LivePipeline, PipelineConfig, PipelineError};
use crate::pipeline::output::PipelineOutput;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::result_sink::ResultSink;
use crate::shared::frame::Frame;

/// Executes the live pipeline with dedicated threads for inference and
/// result delivery.
///
/// Layout: `producer → [frame gate] → worker [detect/classify/smooth] →
/// delivery → sink`
///
/// The frame gate (an `in_flight` flag over a bounded(1) channel) keeps at
/// most one pass in flight; a busy gate drops the new frame so end-to-end
/// latency never grows under slow inference. All mutable inference state
/// lives with the worker thread; the sink only ever runs on the delivery
/// thread.
///
/// `stop()` halts intake, lets an in-flight pass finish with its result
/// discarded, and joins both threads; after it returns, the sink is
/// silent. Do not call `stop()` from the sink itself: it would join the
/// thread it runs on.
pub struct ThreadedLivePipeline {
    running: Arc<AtomicBool>,
    in_flight: Arc<AtomicBool>,
    frames_dropped: Arc<AtomicU64>,
    frame_tx: Mutex<Option<Sender<Frame>>>,
    workers: Mutex<Option<Workers>>,
    idle: Mutex<Option<IdleParts>>,
}

/// Session threads; each returns its owned component on join.
struct Workers {
    worker: JoinHandle<LabelFrameUseCase>,
    delivery: JoinHandle<Box<dyn ResultSink>>,
}

/// Components parked between sessions.
struct IdleParts {
    use_case: LabelFrameUseCase,
    sink: Box<dyn ResultSink>,
}

impl ThreadedLivePipeline {
    pub fn new(
        detector: Box<dyn SubjectDetector>,
        classifier: Box<dyn RegionClassifier>,
        sink: Box<dyn ResultSink>,
        logger: Box<dyn PipelineLogger>,
        config: PipelineConfig,
    ) -> Result<Self, &'static str> {
        let use_case = LabelFrameUseCase::new(detector, classifier, logger, &config)?;
        Ok(Self {
            running: Arc::new(AtomicBool::new(false)),
            in_flight: Arc::new(AtomicBool::new(false)),
            frames_dropped: Arc::new(AtomicU64::new(0)),
            frame_tx: Mutex::new(None),
            workers: Mutex::new(None),
            idle: Mutex::new(Some(IdleParts { use_case, sink })),
        })
    }

    /// Frames dropped at the gate during the current session.
    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped.load(Ordering::Relaxed)
    }
}

impl LivePipeline for ThreadedLivePipeline {
    fn start(&self) -> Result<(), PipelineError> {
        let mut workers = self.workers.lock().unwrap();
        if workers.is_some() {
            return Err(PipelineError::AlreadyRunning);
        }

        let IdleParts { mut use_case, sink } = self
            .idle
            .lock()
            .unwrap()
            .take()
            .ok_or(PipelineError::WorkerPanicked)?;

        // Each session starts fresh: Idle state, empty window.
        use_case.reset();
        self.frames_dropped.store(0, Ordering::Relaxed);
        self.in_flight.store(false, Ordering::Release);

        let (frame_tx, frame_rx) = crossbeam_channel::bounded::<Frame>(1);
        let (out_tx, out_rx) = crossbeam_channel::unbounded::<PipelineOutput>();

        let worker = spawn_worker(
            use_case,
            frame_rx,
            out_tx,
            self.running.clone(),
            self.in_flight.clone(),
        );
        let delivery = spawn_delivery(sink, out_rx);

        *self.frame_tx.lock().unwrap() = Some(frame_tx);
        *workers = Some(Workers { worker, delivery });
        self.running.store(true, Ordering::Release);
        Ok(())
    }

    fn submit_frame(&self, frame: Frame) -> Result<(), PipelineError> {
        if !self.running.load(Ordering::Acquire) {
            return Err(PipelineError::NotStarted);
        }

        // Claim the gate; losing it means a pass is in flight and this
        // frame is dropped rather than queued.
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.frames_dropped.fetch_add(1, Ordering::Relaxed);
            log::debug!("dropping frame {}: inference pass in flight", frame.index());
            return Ok(());
        }

        let guard = self.frame_tx.lock().unwrap();
        let sent = guard.as_ref().is_some_and(|tx| tx.try_send(frame).is_ok());
        if sent {
            Ok(())
        } else {
            // Intake raced with stop; release the claim.
            self.in_flight.store(false, Ordering::Release);
            Err(PipelineError::NotStarted)
        }
    }

    fn stop(&self) -> Result<(), PipelineError> {
        let mut workers_guard = self.workers.lock().unwrap();
        let Some(workers) = workers_guard.take() else {
            return Ok(());
        };

        // Halt intake; from here any still-running pass is discarded.
        self.running.store(false, Ordering::Release);
        // Closing the frame channel unblocks the worker's receive loop.
        *self.frame_tx.lock().unwrap() = None;

        let use_case = workers
            .worker
            .join()
            .map_err(|_| PipelineError::WorkerPanicked)?;
        // The worker's exit dropped the output sender: delivery flushes
        // what was already enqueued, then returns the sink.
        let sink = workers
            .delivery
            .join()
            .map_err(|_| PipelineError::WorkerPanicked)?;

        *self.idle.lock().unwrap() = Some(IdleParts { use_case, sink });
        Ok(())
    }
}

fn spawn_worker(
    mut use_case: LabelFrameUseCase,
    frame_rx: Receiver<Frame>,
    out_tx: Sender<PipelineOutput>,
    running: Arc<AtomicBool>,
    in_flight: Arc<AtomicBool>,
) -> JoinHandle<LabelFrameUseCase> {
    std::thread::spawn(move || {
        for frame in frame_rx {
            if !running.load(Ordering::Acquire) {
                in_flight.store(false, Ordering::Release);
                break;
            }

            let outcome = use_case.process(&frame);

            // Decide delivery before opening the gate so a stop observed
            // mid-pass discards this result.
            let deliver = running.load(Ordering::Acquire);
            in_flight.store(false, Ordering::Release);
            if !deliver {
                break;
            }
            if let FrameOutcome::Emitted(output) = outcome {
                let _ = out_tx.send(output);
            }
        }
        use_case.log_summary();
        use_case
    })
}

fn spawn_delivery(
    mut sink: Box<dyn ResultSink>,
    out_rx: Receiver<PipelineOutput>,
) -> JoinHandle<Box<dyn ResultSink>> {
    std::thread::spawn(move || {
        for output in out_rx {
            sink.on_result(&output);
        }
        sink
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;
    use std::time::Duration;

    use crate::classification::domain::region_classifier::ClassifierError;
    use crate::classification::domain::subject_detector::DetectorError;
    use crate::classification::infrastructure::scripted_classifier::ScriptedClassifier;
    use crate::classification::infrastructure::scripted_detector::{
        DetectorStep, ScriptedDetector,
    };
    use crate::pipeline::output::PipelineState;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::pipeline::result_sink::ChannelSink;
    use crate::shared::constants::NO_SUBJECT_LABEL;
    use crate::shared::frame::Orientation;
    use crate::shared::region::Region;

    const RECV_TIMEOUT: Duration = Duration::from_secs(5);

    // --- Stubs ---

    /// Detector that blocks inside `detect` until released, making
    /// in-flight timing deterministic.
    struct GatedDetector {
        entered_tx: Sender<()>,
        release_rx: Receiver<()>,
        calls: Arc<AtomicUsize>,
    }

    impl GatedDetector {
        #[allow(clippy::type_complexity)]
        fn new() -> (Self, Receiver<()>, Sender<()>, Arc<AtomicUsize>) {
            let (entered_tx, entered_rx) = crossbeam_channel::unbounded();
            let (release_tx, release_rx) = crossbeam_channel::unbounded();
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    entered_tx,
                    release_rx,
                    calls: calls.clone(),
                },
                entered_rx,
                release_tx,
                calls,
            )
        }
    }

    impl SubjectDetector for GatedDetector {
        fn detect(&mut self, frame: &Frame) -> Result<Vec<Region>, DetectorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let _ = self.entered_tx.send(());
            let _ = self.release_rx.recv();
            Ok(vec![region(0.9, frame.index())])
        }
    }

    // --- Helpers ---

    fn frame(index: usize) -> Frame {
        Frame::new(
            vec![0u8; 12],
            2,
            2,
            3,
            Duration::from_millis(index as u64 * 33),
            Orientation::LeftMirrored,
            index,
        )
    }

    fn region(confidence: f64, frame_index: usize) -> Region {
        Region {
            x: 0.2,
            y: 0.2,
            width: 0.5,
            height: 0.5,
            confidence,
            frame_index,
        }
    }

    fn mask_steps(labels: &[&str]) -> Vec<Result<(String, f64), ClassifierError>> {
        labels.iter().map(|l| Ok((l.to_string(), 0.9))).collect()
    }

    fn pipeline_with(
        detector: Box<dyn SubjectDetector>,
        classifier_labels: &[&str],
    ) -> (Arc<ThreadedLivePipeline>, Receiver<PipelineOutput>) {
        let (sink, rx) = ChannelSink::new();
        let pipeline = ThreadedLivePipeline::new(
            detector,
            Box::new(ScriptedClassifier::new(mask_steps(classifier_labels))),
            Box::new(sink),
            Box::new(NullPipelineLogger),
            PipelineConfig::default(),
        )
        .unwrap();
        (Arc::new(pipeline), rx)
    }

    fn one_region_detector() -> Box<dyn SubjectDetector> {
        Box::new(ScriptedDetector::new(vec![DetectorStep::Regions(vec![
            region(0.9, 0),
        ])]))
    }

    /// Submits a frame and waits for its delivery. The worker opens the
    /// gate before delivering, so once an output arrives the next submit
    /// is guaranteed to be accepted.
    fn submit_and_recv(
        pipeline: &ThreadedLivePipeline,
        rx: &Receiver<PipelineOutput>,
        index: usize,
    ) -> PipelineOutput {
        pipeline.submit_frame(frame(index)).unwrap();
        rx.recv_timeout(RECV_TIMEOUT).unwrap()
    }

    // --- Lifecycle ---

    #[test]
    fn test_start_twice_is_already_running() {
        let (pipeline, _rx) = pipeline_with(one_region_detector(), &["mask"]);
        pipeline.start().unwrap();
        assert_eq!(pipeline.start(), Err(PipelineError::AlreadyRunning));
        pipeline.stop().unwrap();
    }

    #[test]
    fn test_submit_before_start_is_not_started() {
        let (pipeline, _rx) = pipeline_with(one_region_detector(), &["mask"]);
        assert_eq!(
            pipeline.submit_frame(frame(0)),
            Err(PipelineError::NotStarted)
        );
    }

    #[test]
    fn test_stop_without_start_is_noop() {
        let (pipeline, _rx) = pipeline_with(one_region_detector(), &["mask"]);
        assert_eq!(pipeline.stop(), Ok(()));
    }

    #[test]
    fn test_stop_twice_is_noop() {
        let (pipeline, _rx) = pipeline_with(one_region_detector(), &["mask"]);
        pipeline.start().unwrap();
        pipeline.stop().unwrap();
        assert_eq!(pipeline.stop(), Ok(()));
    }

    #[test]
    fn test_submit_after_stop_is_not_started() {
        let (pipeline, _rx) = pipeline_with(one_region_detector(), &["mask"]);
        pipeline.start().unwrap();
        pipeline.stop().unwrap();
        assert_eq!(
            pipeline.submit_frame(frame(0)),
            Err(PipelineError::NotStarted)
        );
    }

    // --- Frame flow ---

    #[test]
    fn test_results_delivered_in_submission_order() {
        let (pipeline, rx) = pipeline_with(one_region_detector(), &["mask"]);
        pipeline.start().unwrap();

        for i in 0..4 {
            let output = submit_and_recv(&pipeline, &rx, i);
            assert_eq!(output.state, PipelineState::Tracking);
            assert_eq!(output.timestamp, Duration::from_millis(i as u64 * 33));
        }

        pipeline.stop().unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_idle_stream_emits_no_subject_per_frame() {
        let detector = Box::new(ScriptedDetector::new(vec![DetectorStep::Regions(vec![])]));
        let (pipeline, rx) = pipeline_with(detector, &["mask"]);
        pipeline.start().unwrap();

        for i in 0..3 {
            let output = submit_and_recv(&pipeline, &rx, i);
            assert_eq!(output.state, PipelineState::Idle);
            assert_eq!(output.label, NO_SUBJECT_LABEL);
        }

        pipeline.stop().unwrap();
        // Exactly one delivery per processed frame, nothing extra.
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_detector_error_frame_is_skipped_silently() {
        let detector = Box::new(ScriptedDetector::new(vec![
            DetectorStep::Fail(DetectorError::NoFrameData),
            DetectorStep::Regions(vec![region(0.9, 0)]),
        ]));
        let (pipeline, rx) = pipeline_with(detector, &["mask"]);
        pipeline.start().unwrap();

        // First frame errors inside the detector: no delivery for it. The
        // second frame's output is the first thing the sink sees.
        pipeline.submit_frame(frame(0)).unwrap();
        let output = loop {
            // The skipped frame produces nothing, so only frame 1 can
            // satisfy this receive.
            match rx.recv_timeout(Duration::from_millis(50)) {
                Ok(output) => break output,
                Err(_) => pipeline.submit_frame(frame(1)).unwrap_or(()),
            }
        };
        assert_eq!(output.timestamp, Duration::from_millis(33));

        pipeline.stop().unwrap();
    }

    // --- Backpressure ---

    #[test]
    fn test_busy_pipeline_drops_frame_without_second_detection() {
        let (detector, entered_rx, release_tx, calls) = GatedDetector::new();
        let (pipeline, rx) = pipeline_with(Box::new(detector), &["mask"]);
        pipeline.start().unwrap();

        pipeline.submit_frame(frame(0)).unwrap();
        entered_rx.recv_timeout(RECV_TIMEOUT).unwrap();

        // First pass is provably in flight; this frame must be dropped.
        pipeline.submit_frame(frame(1)).unwrap();
        assert_eq!(pipeline.frames_dropped(), 1);

        release_tx.send(()).unwrap();
        let output = rx.recv_timeout(RECV_TIMEOUT).unwrap();
        assert_eq!(output.timestamp, Duration::ZERO);

        pipeline.stop().unwrap();
        // One detection, one delivery: the dropped frame left no trace.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(rx.try_recv().is_err());
    }

    // --- Stop barrier ---

    #[test]
    fn test_stop_discards_in_flight_result() {
        let (detector, entered_rx, release_tx, calls) = GatedDetector::new();
        let (pipeline, rx) = pipeline_with(Box::new(detector), &["mask"]);
        pipeline.start().unwrap();

        pipeline.submit_frame(frame(0)).unwrap();
        entered_rx.recv_timeout(RECV_TIMEOUT).unwrap();

        // Stop while the pass is provably in flight. stop() blocks until
        // the pass completes, so it runs on a helper thread.
        let stopper = {
            let pipeline = pipeline.clone();
            thread::spawn(move || pipeline.stop())
        };

        // Spin until stop() has closed intake, then let the pass finish.
        while pipeline.submit_frame(frame(99)) != Err(PipelineError::NotStarted) {
            thread::yield_now();
        }
        release_tx.send(()).unwrap();
        stopper.join().unwrap().unwrap();

        // The in-flight pass completed but its result was discarded.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_results_enqueued_before_stop_are_flushed() {
        let (pipeline, rx) = pipeline_with(one_region_detector(), &["mask"]);
        pipeline.start().unwrap();

        let output = submit_and_recv(&pipeline, &rx, 0);
        assert_eq!(output.label, "mask");

        pipeline.stop().unwrap();
        assert!(rx.try_recv().is_err());
    }

    // --- Restart ---

    #[test]
    fn test_restart_begins_a_fresh_session() {
        let (pipeline, rx) = pipeline_with(one_region_detector(), &["A", "A", "B"]);
        pipeline.start().unwrap();

        assert_eq!(submit_and_recv(&pipeline, &rx, 0).label, "A");
        assert_eq!(submit_and_recv(&pipeline, &rx, 1).label, "A");
        pipeline.stop().unwrap();

        pipeline.start().unwrap();
        // Window was cleared between sessions: the lone "B" wins outright
        // instead of being outvoted by the previous session's "A"s.
        assert_eq!(submit_and_recv(&pipeline, &rx, 2).label, "B");
        pipeline.stop().unwrap();
    }

    #[test]
    fn test_dropped_counter_resets_per_session() {
        let (detector, entered_rx, release_tx, _calls) = GatedDetector::new();
        let (pipeline, rx) = pipeline_with(Box::new(detector), &["mask"]);
        pipeline.start().unwrap();

        pipeline.submit_frame(frame(0)).unwrap();
        entered_rx.recv_timeout(RECV_TIMEOUT).unwrap();
        pipeline.submit_frame(frame(1)).unwrap();
        assert_eq!(pipeline.frames_dropped(), 1);

        release_tx.send(()).unwrap();
        rx.recv_timeout(RECV_TIMEOUT).unwrap();
        pipeline.stop().unwrap();

        pipeline.start().unwrap();
        assert_eq!(pipeline.frames_dropped(), 0);
        pipeline.stop().unwrap();
    }
}
