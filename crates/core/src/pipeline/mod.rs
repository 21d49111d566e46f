pub mod infrastructure;
pub mod label_frame_use_case;
pub mod live_pipeline;
pub mod output;
pub mod pipeline_logger;
pub mod result_sink;
