pub mod classification;
pub mod pipeline;
pub mod shared;
