use crate::config::DisplayConfig;
use crate::types::{Orientation, PoseSample};

/// Movement thresholds deciding whether a sample earns a glyph
///
/// Compares against the last *retained* sample; the caller is responsible
/// for never advancing the reference on a rejected sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecimationPolicy {
    pub position_tolerance: f64,
    pub angle_tolerance: f64,
}

impl DecimationPolicy {
    pub fn new(position_tolerance: f64, angle_tolerance: f64) -> Self {
        DecimationPolicy {
            position_tolerance: position_tolerance.max(0.0),
            angle_tolerance: angle_tolerance.max(0.0),
        }
    }

    pub fn from_config(config: &DisplayConfig) -> Self {
        Self::new(config.position_tolerance, config.angle_tolerance)
    }

    /// Accept iff there is no reference yet, or the candidate moved at least
    /// one tolerance in translation or rotation
    ///
    /// A zero tolerance always accepts on that axis.
    pub fn accept(&self, last_retained: Option<&PoseSample>, candidate: &PoseSample) -> bool {
        let Some(last) = last_retained else {
            return true;
        };

        let distance = (candidate.position - last.position).norm();
        let angle = shortest_arc(&last.orientation, &candidate.orientation);

        distance >= self.position_tolerance || angle >= self.angle_tolerance
    }
}

/// Rotation angle between two orientations in [0, pi]
pub fn shortest_arc(from: &Orientation, to: &Orientation) -> f64 {
    let relative = from.inverse() * to;
    let q = relative.quaternion();
    2.0 * q.vector().norm().atan2(q.scalar().abs())
}

impl Default for DecimationPolicy {
    fn default() -> Self {
        Self::from_config(&DisplayConfig::default())
    }
}
