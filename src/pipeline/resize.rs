//! Directory resize pipeline
//!
//! Enumerates image files, resizes and normalizes each in an independent
//! blocking worker with a bounded number in flight, and records the stems of
//! files that failed. The failure list is written once after every task has
//! completed, including for an empty input directory.

use crate::color_profile::ColorProfile;
use crate::config::ResizeConfig;
use crate::error::{PrepError, Result};
use crate::services::{resize_exact, FailureList, ImageIoService};
use futures::stream::{self, StreamExt};
use image::DynamicImage;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Image file extensions considered for processing
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "tiff", "tif", "gif"];

/// Outcome counters of a resize run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeSummary {
    /// Input files enumerated
    pub files_found: usize,
    /// Files resized and written successfully
    pub resized: usize,
    /// Files whose processing failed
    pub failed: usize,
    /// Path of the written failure list
    pub failure_list: PathBuf,
}

/// The resize pipeline
#[derive(Debug)]
pub struct ResizePipeline {
    config: ResizeConfig,
}

impl ResizePipeline {
    /// Create a pipeline for the given configuration
    #[must_use]
    pub fn new(config: ResizeConfig) -> Self {
        Self { config }
    }

    /// The pipeline's configuration
    #[must_use]
    pub fn config(&self) -> &ResizeConfig {
        &self.config
    }

    /// Run the pipeline to completion
    ///
    /// # Errors
    /// - ICC profile file unreadable (checked before any processing)
    /// - Input directory missing or unreadable
    /// - Output directory or failure list cannot be written
    pub async fn run(&self) -> Result<ResizeSummary> {
        let start_time = Instant::now();

        // Resolved up front so a bad profile aborts before any work starts
        let profile = Arc::new(ColorProfile::load(&self.config.icc_profile_path)?);

        if !self.config.input_dir.is_dir() {
            return Err(PrepError::invalid_config(format!(
                "input directory does not exist: {}",
                self.config.input_dir.display()
            )));
        }
        std::fs::create_dir_all(&self.config.output_dir).map_err(|e| {
            PrepError::file_io_error("create output directory", &self.config.output_dir, &e)
        })?;

        let mut files = find_image_files(
            &self.config.input_dir,
            self.config.recursive,
            self.config.pattern.as_deref(),
        )?;
        files.sort();

        let failure_list_path = self.config.failure_list_path();
        let mut failures = FailureList::new();

        if files.is_empty() {
            warn!(
                "No image files found in {}",
                self.config.input_dir.display()
            );
            failures.write(&failure_list_path)?;
            return Ok(ResizeSummary {
                files_found: 0,
                resized: 0,
                failed: 0,
                failure_list: failure_list_path,
            });
        }

        let workers = self.config.effective_workers();
        info!(
            "Resizing {} file(s) to {}x{} with {} worker(s)",
            files.len(),
            self.config.target_width,
            self.config.target_height,
            workers
        );

        let progress = ProgressBar::new(files.len() as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap()
                .progress_chars("#>-"),
        );

        let files_found = files.len();
        let target_width = self.config.target_width;
        let target_height = self.config.target_height;
        let output_dir = self.config.output_dir.clone();

        let mut resized = 0usize;
        let mut tasks = stream::iter(files.into_iter().map(|input_path| {
            let profile = Arc::clone(&profile);
            let output_dir = output_dir.clone();
            async move {
                let stem = file_stem(&input_path);
                let output_path = output_dir.join(format!("{stem}.png"));
                let join_result = tokio::task::spawn_blocking(move || {
                    resize_one(&input_path, &output_path, target_width, target_height, &profile)
                })
                .await;
                let result = match join_result {
                    Ok(result) => result,
                    Err(join_err) => Err(PrepError::processing(format!(
                        "resize worker panicked: {join_err}"
                    ))),
                };
                (stem, result)
            }
        }))
        .buffer_unordered(workers);

        while let Some((stem, result)) = tasks.next().await {
            match result {
                Ok(()) => resized += 1,
                Err(e) => {
                    debug!("Failed to resize {stem}: {e}");
                    failures.record(stem);
                },
            }
            progress.inc(1);
        }
        drop(tasks);

        progress.finish_with_message(format!(
            "Completed! Resized: {resized}, Failed: {}",
            failures.len()
        ));

        failures.write(&failure_list_path)?;

        let elapsed = start_time.elapsed();
        info!("📊 Resize summary:");
        info!("  ├─ Files found: {files_found}");
        info!("  ├─ Files resized: {resized}");
        info!("  ├─ Files failed: {}", failures.len());
        info!("  ├─ Failure list: {}", failure_list_path.display());
        info!("  └─ Total time: {:.2}s", elapsed.as_secs_f64());

        Ok(ResizeSummary {
            files_found,
            resized,
            failed: failures.len(),
            failure_list: failure_list_path,
        })
    }
}

/// One worker's unit of work: load, normalize channels, resize, flatten, save
fn resize_one(
    input_path: &Path,
    output_path: &Path,
    width: u32,
    height: u32,
    profile: &ColorProfile,
) -> Result<()> {
    let image = ImageIoService::load_image(input_path)?;

    // Single-channel sources stay grayscale; everything else goes through
    // RGBA so transparency survives until the flatten step
    let normalized = if image.color().has_color() {
        DynamicImage::ImageRgba8(image.to_rgba8())
    } else {
        DynamicImage::ImageLuma8(image.to_luma8())
    };

    let resized = resize_exact(&normalized, width, height)?;

    let flattened = match resized {
        DynamicImage::ImageRgba8(rgba) => {
            DynamicImage::ImageRgb8(ImageIoService::flatten_onto_white(&rgba))
        },
        gray @ DynamicImage::ImageLuma8(_) => gray,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    };

    ImageIoService::save_png_with_profile(&flattened, output_path, profile)
}

/// Stem used to name outputs and failure list entries
fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Find image files in a directory, optionally recursing and glob-filtering
fn find_image_files(dir: &Path, recursive: bool, pattern: Option<&str>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if recursive {
        for entry in walkdir::WalkDir::new(dir) {
            let entry = entry.map_err(|e| {
                PrepError::processing(format!("failed to walk {}: {e}", dir.display()))
            })?;
            if entry.file_type().is_file() {
                let path = entry.path();
                if is_image_file(path) && matches_pattern(path, pattern) {
                    files.push(path.to_path_buf());
                }
            }
        }
    } else {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| PrepError::file_io_error("read input directory", dir, &e))?;
        for entry in entries {
            let entry =
                entry.map_err(|e| PrepError::file_io_error("read input directory", dir, &e))?;
            let path = entry.path();
            if path.is_file() && is_image_file(&path) && matches_pattern(&path, pattern) {
                files.push(path);
            }
        }
    }

    Ok(files)
}

/// Check if a file is an image based on its extension
fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Check if a file name matches the given glob pattern
fn matches_pattern(path: &Path, pattern: Option<&str>) -> bool {
    match pattern {
        Some(pat) => path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| {
                glob::Pattern::new(pat)
                    .map(|p| p.matches(name))
                    .unwrap_or(false)
            }),
        None => true,
    }
}
