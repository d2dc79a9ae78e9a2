//! Command-line interface for the training-set preparation pipelines

mod config;
pub mod main;

pub use main::{main, Cli, Command, DownloadArgs, ResizeArgs};
