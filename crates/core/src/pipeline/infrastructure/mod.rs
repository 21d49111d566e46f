pub mod threaded_live_pipeline;
