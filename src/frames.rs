//! Fixed-frame resolution seam
//!
//! Transform lookup belongs to the host; the accumulator only asks for a
//! sample's pose in the fixed frame when it places a glyph.

use std::collections::HashMap;

use nalgebra::{Isometry3, Translation3};

use crate::types::{Orientation, PoseSample, Position};

pub trait FrameTransformer: Send {
    fn fixed_frame(&self) -> &str;

    /// Pose of `sample` in the fixed frame, `None` if it cannot be resolved
    fn transform(&self, sample: &PoseSample) -> Option<(Position, Orientation)>;
}

/// Samples are already expressed in the fixed frame
#[derive(Clone, Debug, Default)]
pub struct IdentityTransform {
    fixed_frame: String,
}

impl IdentityTransform {
    pub fn new(fixed_frame: impl Into<String>) -> Self {
        IdentityTransform {
            fixed_frame: fixed_frame.into(),
        }
    }
}

impl FrameTransformer for IdentityTransform {
    fn fixed_frame(&self) -> &str {
        &self.fixed_frame
    }

    fn transform(&self, sample: &PoseSample) -> Option<(Position, Orientation)> {
        Some((sample.position, sample.orientation))
    }
}

/// Fixed lookup table of frame → fixed-frame transforms
#[derive(Clone, Debug)]
pub struct StaticTransforms {
    fixed_frame: String,
    frames: HashMap<String, Isometry3<f64>>,
}

impl StaticTransforms {
    pub fn new(fixed_frame: impl Into<String>) -> Self {
        StaticTransforms {
            fixed_frame: fixed_frame.into(),
            frames: HashMap::new(),
        }
    }

    pub fn insert(&mut self, frame_id: impl Into<String>, fixed_from_frame: Isometry3<f64>) {
        self.frames.insert(frame_id.into(), fixed_from_frame);
    }
}

impl FrameTransformer for StaticTransforms {
    fn fixed_frame(&self) -> &str {
        &self.fixed_frame
    }

    fn transform(&self, sample: &PoseSample) -> Option<(Position, Orientation)> {
        if sample.frame_id.is_empty() || sample.frame_id == self.fixed_frame {
            return Some((sample.position, sample.orientation));
        }
        let fixed_from_frame = self.frames.get(&sample.frame_id)?;
        let pose = Isometry3::from_parts(Translation3::from(sample.position), sample.orientation);
        let fixed = fixed_from_frame * pose;
        Some((fixed.translation.vector, fixed.rotation))
    }
}
