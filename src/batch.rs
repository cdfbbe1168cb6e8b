//! Batch frame filtering
//!
//! Runs outline extraction and the density check over frames that were already
//! sampled from a video and written to disk. Frames are independent, so they
//! are processed on a rayon pool; a failing frame is recorded and the rest of
//! the batch continues.
//!
//! # Example
//!
//! ```rust,no_run
//! use frame_outline::{collect_frame_files, FilterConfig, FrameFilter};
//! use std::path::Path;
//!
//! let frames = collect_frame_files(Path::new("frames/")).unwrap();
//! let filter = FrameFilter::new(FilterConfig::default());
//! let report = filter.process_paths(&frames, Path::new("outlines/")).unwrap();
//! println!("kept {} of {}", report.kept, report.frames.len());
//! ```

use image::RgbImage;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::config::FilterConfig;
use crate::density::{ContentDensityEvaluator, DensityError, DensityResult};
use crate::frame::AsArrayView;
use crate::outline::{OutlineError, OutlineExtractor, OutlineStrategy};
use crate::progress::{NoProgress, ProgressCallback};

/// Frame file extensions picked up from a directory
pub const FRAME_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Suffix appended to the frame stem for outline files
const OUTLINE_SUFFIX: &str = "_outline";

/// Subdirectory for rejected outlines
const REJECTED_DIR: &str = "rejected";

// ============================================================
// Errors
// ============================================================

/// Batch filtering error types
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Input not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Outline name already used by another frame: {0}")]
    OutputCollision(PathBuf),

    #[error("Outline extraction failed: {0}")]
    Outline(#[from] OutlineError),

    #[error("Density evaluation failed: {0}")]
    Density(#[from] DensityError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Report serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FilterError>;

// ============================================================
// Types
// ============================================================

/// Outline and keep/discard decision for one frame
#[derive(Debug, Clone)]
pub struct FrameVerdict {
    pub outline: RgbImage,
    pub density: DensityResult,
}

impl FrameVerdict {
    pub fn keep(&self) -> bool {
        self.density.has_content
    }
}

/// Per-frame entry of a batch report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameRecord {
    /// Source frame
    pub path: PathBuf,

    /// Written outline, if any
    pub outline_path: Option<PathBuf>,

    /// Measured white fraction (None on error)
    pub fraction_white: Option<f64>,

    /// Whether the frame has enough content
    pub kept: bool,

    /// Error message if the frame could not be processed
    pub error: Option<String>,
}

impl FrameRecord {
    fn failed(path: &Path, error: &FilterError) -> Self {
        Self {
            path: path.to_path_buf(),
            outline_path: None,
            fraction_white: None,
            kept: false,
            error: Some(error.to_string()),
        }
    }

    /// One-line human readable status
    pub fn describe(&self) -> String {
        match (&self.error, self.fraction_white) {
            (Some(err), _) => format!("{}: error: {}", self.path.display(), err),
            (None, Some(fraction)) => format!(
                "{}: {} (white {:.3})",
                self.path.display(),
                if self.kept { "kept" } else { "rejected" },
                fraction
            ),
            (None, None) => format!("{}: skipped", self.path.display()),
        }
    }
}

/// Result of a batch run
#[derive(Debug, Clone, Serialize)]
pub struct FilterReport {
    pub strategy: OutlineStrategy,
    pub threshold: f64,
    pub frames: Vec<FrameRecord>,
    pub kept: usize,
    pub rejected: usize,
    pub errors: usize,
    pub elapsed_seconds: f64,
}

impl FilterReport {
    fn from_records(config: &FilterConfig, frames: Vec<FrameRecord>, elapsed_seconds: f64) -> Self {
        let errors = frames.iter().filter(|f| f.error.is_some()).count();
        let kept = frames.iter().filter(|f| f.kept).count();
        let rejected = frames.len() - kept - errors;

        Self {
            strategy: config.strategy,
            threshold: config.density.threshold,
            frames,
            kept,
            rejected,
            errors,
            elapsed_seconds,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as pretty JSON
    pub fn save_json(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

// ============================================================
// Frame Filter
// ============================================================

/// Outline extraction plus density decision, per frame or per batch
#[derive(Debug, Clone)]
pub struct FrameFilter {
    config: FilterConfig,
    evaluator: ContentDensityEvaluator,
}

impl FrameFilter {
    pub fn new(config: FilterConfig) -> Self {
        let evaluator = ContentDensityEvaluator::new(config.density);
        Self { config, evaluator }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Extract the outline of one in-memory frame and judge it
    pub fn filter_frame(&self, frame: &RgbImage) -> Result<FrameVerdict> {
        let outline = self.config.strategy.extract(frame)?;
        let view = outline.as_array_view().map_err(DensityError::from)?;
        let density = self.evaluator.evaluate(view)?;

        Ok(FrameVerdict { outline, density })
    }

    /// Where the outline of `frame_path` is written
    pub fn output_path(&self, frame_path: &Path, output_dir: &Path, kept: bool) -> PathBuf {
        place_outline(output_dir, &outline_file_name(frame_path, false), kept)
    }

    /// Load, filter and (when appropriate) write the outline of one frame file
    pub fn process_file(&self, frame_path: &Path, output_dir: &Path) -> Result<FrameRecord> {
        self.process_file_as(frame_path, output_dir, &outline_file_name(frame_path, false))
    }

    fn process_file_as(
        &self,
        frame_path: &Path,
        output_dir: &Path,
        file_name: &str,
    ) -> Result<FrameRecord> {
        if !frame_path.is_file() {
            return Err(FilterError::InputNotFound(frame_path.to_path_buf()));
        }

        let frame = image::open(frame_path)?.to_rgb8();
        let verdict = self.filter_frame(&frame)?;
        let kept = verdict.keep();

        let outline_path = if kept || self.config.write_rejected {
            let path = place_outline(output_dir, file_name, kept);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            verdict.outline.save(&path)?;
            Some(path)
        } else {
            None
        };

        debug!(
            frame = %frame_path.display(),
            fraction_white = verdict.density.fraction_white,
            kept,
            "frame filtered"
        );

        Ok(FrameRecord {
            path: frame_path.to_path_buf(),
            outline_path,
            fraction_white: Some(verdict.density.fraction_white),
            kept,
            error: None,
        })
    }

    /// Filter every frame in parallel
    pub fn process_paths(
        &self,
        frame_paths: &[PathBuf],
        output_dir: &Path,
    ) -> Result<FilterReport> {
        self.process_paths_with_progress(frame_paths, output_dir, &NoProgress)
    }

    /// Filter every frame in parallel, reporting progress as frames finish
    #[instrument(skip_all, fields(frames = frame_paths.len(), strategy = %self.config.strategy))]
    pub fn process_paths_with_progress(
        &self,
        frame_paths: &[PathBuf],
        output_dir: &Path,
        progress: &dyn ProgressCallback,
    ) -> Result<FilterReport> {
        let start = Instant::now();
        std::fs::create_dir_all(output_dir)?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.effective_threads())
            .build()?;

        let total = frame_paths.len();
        let done = AtomicUsize::new(0);
        let names = assign_outline_names(frame_paths);
        progress.on_start(total);

        let records: Vec<FrameRecord> = pool.install(|| {
            frame_paths
                .par_iter()
                .zip(names.par_iter())
                .map(|(path, name)| {
                    let result = match name {
                        Some(name) => self.process_file_as(path, output_dir, name),
                        None => Err(FilterError::OutputCollision(path.clone())),
                    };
                    let record = result.unwrap_or_else(|e| {
                        warn!(frame = %path.display(), error = %e, "frame failed");
                        FrameRecord::failed(path, &e)
                    });
                    let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                    progress.on_frame_done(finished, total, &record);
                    record
                })
                .collect()
        });

        let report =
            FilterReport::from_records(&self.config, records, start.elapsed().as_secs_f64());
        info!(
            kept = report.kept,
            rejected = report.rejected,
            errors = report.errors,
            elapsed = report.elapsed_seconds,
            "batch complete"
        );

        Ok(report)
    }
}

/// Outline file name for a frame
///
/// With `keep_extension` the source extension becomes part of the name, so
/// `clip.png` and `clip.jpg` map to `clip_png_outline.png` and
/// `clip_jpg_outline.png`.
pub fn outline_file_name(frame_path: &Path, keep_extension: bool) -> String {
    let stem = frame_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_string());

    match frame_path.extension().filter(|_| keep_extension) {
        Some(ext) => format!(
            "{stem}_{}{OUTLINE_SUFFIX}.png",
            ext.to_string_lossy().to_lowercase()
        ),
        None => format!("{stem}{OUTLINE_SUFFIX}.png"),
    }
}

fn place_outline(output_dir: &Path, file_name: &str, kept: bool) -> PathBuf {
    if kept {
        output_dir.join(file_name)
    } else {
        output_dir.join(REJECTED_DIR).join(file_name)
    }
}

/// Outline file name per frame; `None` when the frame would overwrite an
/// earlier frame's outline
///
/// Frames sharing a stem keep their extension in the name. Names are compared
/// case-insensitively so the result is the same on every filesystem.
fn assign_outline_names(frame_paths: &[PathBuf]) -> Vec<Option<String>> {
    let mut stem_counts: HashMap<String, usize> = HashMap::new();
    for path in frame_paths {
        *stem_counts.entry(outline_file_name(path, false).to_lowercase()).or_default() += 1;
    }

    let mut taken = HashSet::new();
    frame_paths
        .iter()
        .map(|path| {
            let plain = outline_file_name(path, false);
            let shared = stem_counts.get(&plain.to_lowercase()).copied().unwrap_or(0) > 1;
            let name = if shared {
                outline_file_name(path, true)
            } else {
                plain
            };
            taken.insert(name.to_lowercase()).then_some(name)
        })
        .collect()
}

/// Collect frame files from a single file or a directory (sorted)
pub fn collect_frame_files(input: &Path) -> Result<Vec<PathBuf>> {
    let mut frames = Vec::new();

    if input.is_file() {
        if is_frame_file(input) {
            frames.push(input.to_path_buf());
        }
    } else if input.is_dir() {
        for entry in std::fs::read_dir(input)? {
            let path = entry?.path();
            if path.is_file() && is_frame_file(&path) {
                frames.push(path);
            }
        }
        frames.sort();
    } else {
        return Err(FilterError::InputNotFound(input.to_path_buf()));
    }

    Ok(frames)
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| FRAME_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::DensityOptions;
    use image::Rgb;
    use tempfile::tempdir;

    fn textured_frame() -> RgbImage {
        RgbImage::from_fn(24, 24, |x, y| {
            if (6..18).contains(&x) && (6..18).contains(&y) && (x + y) % 2 == 0 {
                Rgb([0, 0, 0])
            } else if (6..18).contains(&x) && (6..18).contains(&y) {
                Rgb([255, 255, 255])
            } else {
                Rgb([128, 128, 128])
            }
        })
    }

    fn blank_frame() -> RgbImage {
        RgbImage::from_pixel(24, 24, Rgb([128, 128, 128]))
    }

    #[test]
    fn test_filter_frame_blank_is_rejected() {
        let filter = FrameFilter::new(FilterConfig::default());
        let verdict = filter.filter_frame(&blank_frame()).unwrap();

        assert_eq!(verdict.density.fraction_white, 1.0);
        assert!(!verdict.keep());
    }

    #[test]
    fn test_filter_frame_textured_is_kept() {
        let filter = FrameFilter::new(FilterConfig::default());
        let verdict = filter.filter_frame(&textured_frame()).unwrap();

        assert!(verdict.density.fraction_white < 0.96);
        assert!(verdict.keep());
        assert_eq!(verdict.outline.dimensions(), (24, 24));
    }

    #[test]
    fn test_filter_frame_zero_threshold_rejects_everything() {
        let strict = FrameFilter::new(FilterConfig {
            density: DensityOptions::builder().threshold(0.0).build(),
            ..Default::default()
        });
        assert!(!strict.filter_frame(&textured_frame()).unwrap().keep());
    }

    #[test]
    fn test_filter_frame_too_small() {
        let filter = FrameFilter::new(FilterConfig::default());
        let result = filter.filter_frame(&RgbImage::new(1, 1));
        assert!(matches!(result, Err(FilterError::Outline(_))));
    }

    #[test]
    fn test_output_path() {
        let filter = FrameFilter::new(FilterConfig::default());
        let out = Path::new("/out");

        assert_eq!(
            filter.output_path(Path::new("/in/clip_frame_3.png"), out, true),
            PathBuf::from("/out/clip_frame_3_outline.png")
        );
        assert_eq!(
            filter.output_path(Path::new("/in/clip_frame_4.jpg"), out, false),
            PathBuf::from("/out/rejected/clip_frame_4_outline.png")
        );
    }

    #[test]
    fn test_collect_frame_files_filters_and_sorts() {
        let dir = tempdir().unwrap();
        for name in ["b.png", "a.JPG", "notes.txt", "c.bmp"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let frames = collect_frame_files(dir.path()).unwrap();
        let names: Vec<_> = frames
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.JPG", "b.png", "c.bmp"]);
    }

    #[test]
    fn test_collect_frame_files_missing_input() {
        let result = collect_frame_files(Path::new("/nonexistent/frames"));
        assert!(matches!(result, Err(FilterError::InputNotFound(_))));
    }

    #[test]
    fn test_process_paths_writes_kept_outlines() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();

        let kept_path = input.path().join("busy.png");
        let blank_path = input.path().join("blank.png");
        let broken_path = input.path().join("broken.png");
        textured_frame().save(&kept_path).unwrap();
        blank_frame().save(&blank_path).unwrap();
        std::fs::write(&broken_path, b"not an image").unwrap();

        let filter = FrameFilter::new(FilterConfig {
            threads: Some(2),
            ..Default::default()
        });
        let frames = collect_frame_files(input.path()).unwrap();
        let report = filter.process_paths(&frames, output.path()).unwrap();

        assert_eq!(report.frames.len(), 3);
        assert_eq!(report.kept, 1);
        assert_eq!(report.rejected, 1);
        assert_eq!(report.errors, 1);

        // Input order is preserved: blank, broken, busy
        assert!(!report.frames[0].kept);
        assert!(report.frames[1].error.is_some());
        assert!(report.frames[2].kept);

        assert!(output.path().join("busy_outline.png").is_file());
        assert!(!output.path().join("blank_outline.png").exists());
        assert!(!output.path().join(REJECTED_DIR).exists());
    }

    #[test]
    fn test_process_paths_writes_rejected_when_enabled() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        let blank_path = input.path().join("blank.png");
        blank_frame().save(&blank_path).unwrap();

        let filter = FrameFilter::new(FilterConfig {
            write_rejected: true,
            ..Default::default()
        });
        let report = filter.process_paths(&[blank_path], output.path()).unwrap();

        assert_eq!(report.rejected, 1);
        assert!(output
            .path()
            .join(REJECTED_DIR)
            .join("blank_outline.png")
            .is_file());
    }

    #[test]
    fn test_outline_file_name() {
        assert_eq!(outline_file_name(Path::new("in/clip.png"), false), "clip_outline.png");
        assert_eq!(outline_file_name(Path::new("in/clip.JPG"), true), "clip_jpg_outline.png");
        assert_eq!(outline_file_name(Path::new("in/noext"), true), "noext_outline.png");
    }

    #[test]
    fn test_assign_outline_names_disambiguates_shared_stems() {
        let frames = [
            PathBuf::from("in/clip.jpg"),
            PathBuf::from("in/clip.png"),
            PathBuf::from("in/other.png"),
        ];
        assert_eq!(
            assign_outline_names(&frames),
            vec![
                Some("clip_jpg_outline.png".to_string()),
                Some("clip_png_outline.png".to_string()),
                Some("other_outline.png".to_string()),
            ]
        );
    }

    #[test]
    fn test_assign_outline_names_rejects_exact_duplicates() {
        let frames = [PathBuf::from("a/x.png"), PathBuf::from("b/X.PNG")];
        assert_eq!(
            assign_outline_names(&frames),
            vec![Some("x_png_outline.png".to_string()), None]
        );
    }

    #[test]
    fn test_process_paths_same_stem_keeps_both_outlines() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        blank_frame().save(input.path().join("clip.png")).unwrap();
        blank_frame().save(input.path().join("clip.jpg")).unwrap();

        let filter = FrameFilter::new(FilterConfig {
            write_rejected: true,
            ..Default::default()
        });
        let frames = collect_frame_files(input.path()).unwrap();
        let report = filter.process_paths(&frames, output.path()).unwrap();

        assert_eq!(report.errors, 0);
        let rejected = output.path().join(REJECTED_DIR);
        assert!(rejected.join("clip_jpg_outline.png").is_file());
        assert!(rejected.join("clip_png_outline.png").is_file());
        assert_ne!(report.frames[0].outline_path, report.frames[1].outline_path);
    }

    #[test]
    fn test_process_paths_duplicate_name_is_an_error() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        let output = tempdir().unwrap();
        let a = first.path().join("x.png");
        let b = second.path().join("x.png");
        blank_frame().save(&a).unwrap();
        blank_frame().save(&b).unwrap();

        let filter = FrameFilter::new(FilterConfig {
            write_rejected: true,
            ..Default::default()
        });
        let report = filter.process_paths(&[a, b], output.path()).unwrap();

        assert_eq!(report.rejected, 1);
        assert_eq!(report.errors, 1);
        assert!(report.frames[1]
            .error
            .as_deref()
            .is_some_and(|e| e.contains("already used")));
    }

    #[test]
    fn test_report_json() {
        let report = FilterReport::from_records(
            &FilterConfig::default(),
            vec![FrameRecord {
                path: PathBuf::from("a.png"),
                outline_path: None,
                fraction_white: Some(1.0),
                kept: false,
                error: None,
            }],
            0.5,
        );

        let json = report.to_json().unwrap();
        assert!(json.contains("\"strategy\": \"gradient\""));
        assert!(json.contains("\"rejected\": 1"));
    }

    #[test]
    fn test_frame_record_describe() {
        let record = FrameRecord {
            path: PathBuf::from("a.png"),
            outline_path: None,
            fraction_white: Some(0.5),
            kept: true,
            error: None,
        };
        assert_eq!(record.describe(), "a.png: kept (white 0.500)");
    }
}
