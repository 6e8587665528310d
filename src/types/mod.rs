pub mod linalg;

pub use linalg::*;

use nalgebra::Quaternion;
use serde::{Deserialize, Serialize};

use crate::error::{TrailError, TrailResult};

/// One odometry message as delivered by the transport
///
/// `orientation` is (x, y, z, w); `covariance` is the 6×6 pose covariance
/// in row-major order over (x, y, z, rot_x, rot_y, rot_z).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OdometryMessage {
    pub timestamp: f64,
    #[serde(default)]
    pub frame_id: String,
    pub position: [f64; 3],
    pub orientation: [f64; 4],
    pub covariance: Vec<f64>,
}

/// Validated pose-with-covariance sample
#[derive(Clone, Debug, PartialEq)]
pub struct PoseSample {
    pub timestamp: f64,
    pub frame_id: String,
    pub position: Position,
    pub orientation: Orientation,
    pub covariance: PoseCovariance,
}

impl PoseSample {
    pub fn new(
        timestamp: f64,
        frame_id: impl Into<String>,
        position: Position,
        orientation: Orientation,
        covariance: PoseCovariance,
    ) -> TrailResult<Self> {
        let sample = PoseSample {
            timestamp,
            frame_id: frame_id.into(),
            position,
            orientation,
            covariance,
        };
        sample.validate()?;
        Ok(sample)
    }

    /// Reject non-finite position, orientation or covariance values
    pub fn validate(&self) -> TrailResult<()> {
        if !self.position.iter().all(|v| v.is_finite()) {
            return Err(TrailError::MalformedSample(
                "position contains NaN or infinite values".to_string(),
            ));
        }
        if !self.orientation.coords.iter().all(|v| v.is_finite()) {
            return Err(TrailError::MalformedSample(
                "orientation contains NaN or infinite values".to_string(),
            ));
        }
        if !self.covariance.iter().all(|v| v.is_finite()) {
            return Err(TrailError::MalformedSample(
                "covariance contains NaN or infinite values".to_string(),
            ));
        }
        Ok(())
    }
}

impl TryFrom<&OdometryMessage> for PoseSample {
    type Error = TrailError;

    fn try_from(msg: &OdometryMessage) -> TrailResult<Self> {
        if msg.covariance.len() != COVARIANCE_LEN {
            return Err(TrailError::MalformedSample(format!(
                "covariance has {} values, expected {}",
                msg.covariance.len(),
                COVARIANCE_LEN
            )));
        }
        let [qx, qy, qz, qw] = msg.orientation;
        let quat = Quaternion::new(qw, qx, qy, qz);
        if !quat.coords.iter().all(|v| v.is_finite()) {
            return Err(TrailError::MalformedSample(
                "orientation contains NaN or infinite values".to_string(),
            ));
        }
        if quat.norm() < f64::EPSILON {
            return Err(TrailError::MalformedSample(
                "orientation quaternion has zero norm".to_string(),
            ));
        }

        PoseSample::new(
            msg.timestamp,
            msg.frame_id.clone(),
            Position::from(msg.position),
            Orientation::from_quaternion(quat),
            PoseCovariance::from_row_slice(&msg.covariance),
        )
    }
}

impl TryFrom<OdometryMessage> for PoseSample {
    type Error = TrailError;

    fn try_from(msg: OdometryMessage) -> TrailResult<Self> {
        PoseSample::try_from(&msg)
    }
}

/// 8-bit RGB color as exposed on the configuration surface
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    pub fn with_alpha(self, alpha: f32) -> Rgba {
        Rgba {
            r: self.r as f32 / 255.0,
            g: self.g as f32 / 255.0,
            b: self.b as f32 / 255.0,
            a: alpha.clamp(0.0, 1.0),
        }
    }
}

/// Normalized color handed to the render backend
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub fn to_u8(self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> OdometryMessage {
        let mut covariance = vec![0.0; COVARIANCE_LEN];
        covariance[0] = 0.2;
        covariance[7] = 0.3;
        covariance[14] = 0.4;
        OdometryMessage {
            timestamp: 1.5,
            frame_id: "odom".to_string(),
            position: [1.0, 2.0, 3.0],
            orientation: [0.0, 0.0, 0.0, 2.0],
            covariance,
        }
    }

    #[test]
    fn test_message_conversion_normalizes_orientation() {
        let sample = PoseSample::try_from(&message()).unwrap();
        assert_eq!(sample.position, Position::new(1.0, 2.0, 3.0));
        assert!((sample.orientation.w - 1.0).abs() < 1e-12);
        assert_eq!(sample.covariance[(1, 1)], 0.3);
        assert_eq!(sample.covariance[(2, 2)], 0.4);
        assert_eq!(sample.frame_id, "odom");
    }

    #[test]
    fn test_short_covariance_rejected() {
        let mut msg = message();
        msg.covariance.truncate(9);
        assert!(matches!(
            PoseSample::try_from(&msg),
            Err(TrailError::MalformedSample(_))
        ));
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let mut msg = message();
        msg.position[1] = f64::NAN;
        assert!(PoseSample::try_from(&msg).is_err());

        let mut msg = message();
        msg.covariance[35] = f64::INFINITY;
        assert!(PoseSample::try_from(&msg).is_err());

        let mut msg = message();
        msg.orientation = [0.0, 0.0, 0.0, 0.0];
        assert!(PoseSample::try_from(&msg).is_err());
    }

    #[test]
    fn test_message_deserializes_without_frame_id() {
        let json = r#"{"timestamp":0.0,"position":[0,0,0],"orientation":[0,0,0,1],
            "covariance":[0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0]}"#;
        let msg: OdometryMessage = serde_json::from_str(json).unwrap();
        assert!(msg.frame_id.is_empty());
        assert!(PoseSample::try_from(msg).is_ok());
    }

    #[test]
    fn test_rgb_alpha_conversion() {
        let rgba = Rgb::new(255, 0, 51).with_alpha(1.5);
        assert_eq!(rgba.a, 1.0);
        assert_eq!(rgba.to_u8(), [255, 0, 51, 255]);
    }
}
