pub mod mean_luma_classifier;
pub mod scripted_classifier;
pub mod scripted_detector;
pub mod throttled_detector;
