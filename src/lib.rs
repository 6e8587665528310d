//! Odometry pose-history trail
//!
//! Accumulates a decimated, bounded trail of pose-with-covariance samples and
//! keeps it drawn as arrows or axes triads with uncertainty ellipsoids,
//! restyling the retained trail in place when the display configuration
//! changes.

pub mod accumulator;
pub mod backend;
pub mod config;
pub mod decimation;
pub mod error;
pub mod frames;
pub mod glyph;
pub mod history;
pub mod stream;
pub mod types;
pub mod uncertainty;

pub use accumulator::{
    AccumulatorState, OdometryAccumulator, SampleOutcome, SharedAccumulator, StatusLevel,
    StatusReport,
};
pub use backend::{RecordingBackend, RenderBackend, RerunBackend};
pub use config::{ConfigChange, DisplayConfig, ShapeKind};
pub use error::{TrailError, TrailResult};
pub use types::{OdometryMessage, PoseSample};
