//! Heuristic indoor room photo validation and analysis.
//!
//! ```no_run
//! use roomscan::{analysis, quality_gate};
//!
//! let path = "living_room.jpg";
//! if quality_gate::is_valid_room_image(path) {
//!     let assessment = analysis::analyze(path)?;
//!     print!("{}", assessment.report());
//! }
//! # Ok::<(), roomscan::error::AnalysisError>(())
//! ```

pub mod analysis;
pub mod color_utils;
pub mod config;
pub mod dimensions;
pub mod edges;
pub mod error;
pub mod features;
pub mod hough;
pub mod image_input;
pub mod image_loader;
pub mod layout_zones;
pub mod metadata;
pub mod output_manager;
pub mod params;
pub mod processing;
pub mod progress;
pub mod quality_gate;
pub mod room_state;

pub use analysis::{analyze, analyze_grid, RoomAssessment};
pub use error::AnalysisError;
pub use image_loader::PixelGrid;
pub use quality_gate::is_valid_room_image;
