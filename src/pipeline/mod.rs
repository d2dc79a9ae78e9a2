//! The two batch pipelines: dataset download and directory resize

pub mod download;
pub mod resize;

pub use download::{DownloadPipeline, DownloadSummary};
pub use resize::{ResizePipeline, ResizeSummary};
