//! frame-outline - outline extraction and content filtering for video frames
//!
//! Given frames sampled from a video, extract a dark-on-white outline of each
//! one and keep only the frames whose outline carries enough strokes.
//!
//! # Modules
//!
//! - [`outline`] - Outline extraction strategies (gradient, Canny, contour)
//! - [`density`] - White-fraction measurement and the keep/discard decision
//! - [`batch`] - Parallel filtering of frame files on disk
//! - [`config`] - TOML configuration merged with command-line overrides
//!
//! # Example
//!
//! ```rust,no_run
//! use frame_outline::{extract, has_content, AsArrayView};
//!
//! let frame = image::open("clip_frame_0.png").unwrap().to_rgb8();
//! let outline = extract(&frame).unwrap();
//! if has_content(outline.as_array_view().unwrap(), 0.96, 255.0).unwrap() {
//!     outline.save("clip_frame_0_outline.png").unwrap();
//! }
//! ```

pub mod batch;
pub mod cli;
pub mod config;
pub mod density;
pub mod frame;
pub mod outline;
pub mod progress;

// Outline extraction
pub use outline::{
    extract, extract_array, CannyOutline, ContourOutline, DifferenceMap, GradientOutline,
    OutlineError, OutlineExtractor, OutlineStrategy,
};

// Density evaluation
pub use density::{
    fraction_white, has_content, ContentDensityEvaluator, DensityError, DensityOptions,
    DensityOptionsBuilder, DensityResult,
};

// Frame views
pub use frame::AsArrayView;

// Batch filtering
pub use batch::{
    collect_frame_files, outline_file_name, FilterError, FilterReport, FrameFilter, FrameRecord,
    FrameVerdict,
};

// Config
pub use config::{CliOverrides, Config, ConfigError, FilterConfig};

// CLI
pub use cli::{exit_codes, Cli, Commands, DensityArgs, FilterArgs};

// Progress tracking
pub use progress::{FrameProgress, NoProgress, OutputMode, ProgressCallback};
