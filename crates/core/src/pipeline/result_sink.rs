use crossbeam_channel::{Receiver, Sender};

use crate::pipeline::output::PipelineOutput;

/// Consumer of pipeline results.
///
/// Invoked on the pipeline's delivery context, never on the inference
/// worker, so implementations with thread-affinity contracts (UI updates)
/// see a consistent calling context.
pub trait ResultSink: Send {
    fn on_result(&mut self, output: &PipelineOutput);
}

impl<F> ResultSink for F
where
    F: FnMut(&PipelineOutput) + Send,
{
    fn on_result(&mut self, output: &PipelineOutput) {
        self(output)
    }
}

/// Sink that forwards each output to a channel, for consumers that drain
/// results on their own thread (GUIs, the CLI's print loop).
pub struct ChannelSink {
    tx: Sender<PipelineOutput>,
}

impl ChannelSink {
    pub fn new() -> (Self, Receiver<PipelineOutput>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }
}

impl ResultSink for ChannelSink {
    fn on_result(&mut self, output: &PipelineOutput) {
        // A consumer that went away is not the pipeline's problem.
        let _ = self.tx.send(output.clone());
    }
}
