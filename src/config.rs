//! Live display configuration
//!
//! Every setter clamps its input to the valid range and returns the
//! [`ConfigChange`] the accumulator must react to, or `None` when the value
//! did not actually change.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::TrailError;
use crate::types::Rgb;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Arrow,
    Axes,
}

/// Frame the orientation uncertainty is drawn in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrientationFrame {
    /// Rotates with the sample orientation
    Rotating,
    /// Fixed-frame aligned
    Static,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CovariancePartKind {
    Position,
    Orientation,
}

/// What a configuration write requires of the retained history
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigChange {
    /// Glyph kind switched: full rebuild from stored samples
    ShapeChanged,
    /// Color, alpha, dimensions or covariance styling: restyle in place
    StyleChanged,
    /// Keep count changed: resize the history
    CapacityChanged,
    /// Covariance overlay (or one of its parts) switched on or off
    CovarianceToggled,
    /// Decimation thresholds changed: affects future samples only
    ToleranceChanged,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrowGeometry {
    pub shaft_length: f64,
    pub shaft_radius: f64,
    pub head_length: f64,
    pub head_radius: f64,
}

impl Default for ArrowGeometry {
    fn default() -> Self {
        ArrowGeometry {
            shaft_length: 1.0,
            shaft_radius: 0.05,
            head_length: 0.3,
            head_radius: 0.1,
        }
    }
}

impl ArrowGeometry {
    pub fn total_length(&self) -> f64 {
        self.shaft_length + self.head_length
    }

    fn sanitized(self) -> Self {
        ArrowGeometry {
            shaft_length: non_negative("shaft_length", self.shaft_length),
            shaft_radius: non_negative("shaft_radius", self.shaft_radius),
            head_length: non_negative("head_length", self.head_length),
            head_radius: non_negative("head_radius", self.head_radius),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxesGeometry {
    pub length: f64,
    pub radius: f64,
}

impl Default for AxesGeometry {
    fn default() -> Self {
        AxesGeometry {
            length: 1.0,
            radius: 0.1,
        }
    }
}

impl AxesGeometry {
    fn sanitized(self) -> Self {
        AxesGeometry {
            length: non_negative("axes_length", self.length),
            radius: non_negative("axes_radius", self.radius),
        }
    }
}

/// Styling of one covariance part (position or orientation)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CovariancePart {
    pub show: bool,
    pub color: Rgb,
    pub alpha: f32,
    pub scale: f64,
}

impl CovariancePart {
    fn sanitized(self, name: &str) -> Self {
        CovariancePart {
            alpha: unit_interval(&format!("{name}_alpha"), self.alpha),
            scale: non_negative(&format!("{name}_scale"), self.scale),
            ..self
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CovarianceStyle {
    pub enabled: bool,
    pub position: CovariancePart,
    pub orientation: CovariancePart,
    pub orientation_frame: OrientationFrame,
}

impl Default for CovarianceStyle {
    fn default() -> Self {
        CovarianceStyle {
            enabled: true,
            position: CovariancePart {
                show: true,
                color: Rgb::new(204, 51, 204),
                alpha: 0.3,
                scale: 1.0,
            },
            orientation: CovariancePart {
                show: true,
                color: Rgb::new(255, 255, 127),
                alpha: 0.5,
                scale: 1.0,
            },
            orientation_frame: OrientationFrame::Rotating,
        }
    }
}

impl CovarianceStyle {
    pub fn part(&self, kind: CovariancePartKind) -> &CovariancePart {
        match kind {
            CovariancePartKind::Position => &self.position,
            CovariancePartKind::Orientation => &self.orientation,
        }
    }

    fn part_mut(&mut self, kind: CovariancePartKind) -> &mut CovariancePart {
        match kind {
            CovariancePartKind::Position => &mut self.position,
            CovariancePartKind::Orientation => &mut self.orientation,
        }
    }

    /// Whether a part is drawn at all
    pub fn part_enabled(&self, kind: CovariancePartKind) -> bool {
        self.enabled && self.part(kind).show
    }

    fn visibility(&self) -> (bool, bool, bool) {
        (self.enabled, self.position.show, self.orientation.show)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub shape: ShapeKind,
    pub color: Rgb,
    pub alpha: f32,
    /// Meters from the last retained sample that drops a new glyph
    pub position_tolerance: f64,
    /// Radians from the last retained orientation that drops a new glyph
    pub angle_tolerance: f64,
    /// Retained sample bound, 0 keeps everything
    pub keep: usize,
    pub arrow: ArrowGeometry,
    pub axes: AxesGeometry,
    pub covariance: CovarianceStyle,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            shape: ShapeKind::Arrow,
            color: Rgb::new(255, 25, 0),
            alpha: 1.0,
            position_tolerance: 0.1,
            angle_tolerance: 0.1,
            keep: 100,
            arrow: ArrowGeometry::default(),
            axes: AxesGeometry::default(),
            covariance: CovarianceStyle::default(),
        }
    }
}

impl DisplayConfig {
    /// Clamp every field of a deserialized snapshot into range
    pub fn sanitized(self) -> Self {
        DisplayConfig {
            alpha: unit_interval("alpha", self.alpha),
            position_tolerance: non_negative("position_tolerance", self.position_tolerance),
            angle_tolerance: non_negative("angle_tolerance", self.angle_tolerance),
            arrow: self.arrow.sanitized(),
            axes: self.axes.sanitized(),
            covariance: CovarianceStyle {
                position: self.covariance.position.sanitized("position_covariance"),
                orientation: self.covariance.orientation.sanitized("orientation_covariance"),
                ..self.covariance
            },
            ..self
        }
    }

    /// Changes needed to move from `self` to `other`
    pub fn diff(&self, other: &DisplayConfig) -> Vec<ConfigChange> {
        let mut changes = Vec::new();
        if self.keep != other.keep {
            changes.push(ConfigChange::CapacityChanged);
        }
        if self.position_tolerance != other.position_tolerance
            || self.angle_tolerance != other.angle_tolerance
        {
            changes.push(ConfigChange::ToleranceChanged);
        }
        if self.shape != other.shape {
            changes.push(ConfigChange::ShapeChanged);
        }
        if self.covariance.visibility() != other.covariance.visibility() {
            changes.push(ConfigChange::CovarianceToggled);
        }
        let restyle = self.color != other.color
            || self.alpha != other.alpha
            || self.arrow != other.arrow
            || self.axes != other.axes
            || self.covariance.orientation_frame != other.covariance.orientation_frame
            || !same_part_style(&self.covariance.position, &other.covariance.position)
            || !same_part_style(&self.covariance.orientation, &other.covariance.orientation);
        if restyle {
            changes.push(ConfigChange::StyleChanged);
        }
        changes
    }

    pub fn set_shape(&mut self, shape: ShapeKind) -> Option<ConfigChange> {
        replace(&mut self.shape, shape, ConfigChange::ShapeChanged)
    }

    pub fn set_color(&mut self, color: Rgb) -> Option<ConfigChange> {
        replace(&mut self.color, color, ConfigChange::StyleChanged)
    }

    pub fn set_alpha(&mut self, alpha: f32) -> Option<ConfigChange> {
        let alpha = unit_interval("alpha", alpha);
        replace(&mut self.alpha, alpha, ConfigChange::StyleChanged)
    }

    pub fn set_position_tolerance(&mut self, meters: f64) -> Option<ConfigChange> {
        let meters = non_negative("position_tolerance", meters);
        replace(&mut self.position_tolerance, meters, ConfigChange::ToleranceChanged)
    }

    pub fn set_angle_tolerance(&mut self, radians: f64) -> Option<ConfigChange> {
        let radians = non_negative("angle_tolerance", radians);
        replace(&mut self.angle_tolerance, radians, ConfigChange::ToleranceChanged)
    }

    pub fn set_keep(&mut self, keep: usize) -> Option<ConfigChange> {
        replace(&mut self.keep, keep, ConfigChange::CapacityChanged)
    }

    pub fn set_arrow_geometry(&mut self, geometry: ArrowGeometry) -> Option<ConfigChange> {
        replace(&mut self.arrow, geometry.sanitized(), ConfigChange::StyleChanged)
    }

    pub fn set_axes_geometry(&mut self, geometry: AxesGeometry) -> Option<ConfigChange> {
        replace(&mut self.axes, geometry.sanitized(), ConfigChange::StyleChanged)
    }

    pub fn set_covariance_enabled(&mut self, enabled: bool) -> Option<ConfigChange> {
        replace(
            &mut self.covariance.enabled,
            enabled,
            ConfigChange::CovarianceToggled,
        )
    }

    pub fn set_covariance_part_shown(
        &mut self,
        part: CovariancePartKind,
        show: bool,
    ) -> Option<ConfigChange> {
        replace(
            &mut self.covariance.part_mut(part).show,
            show,
            ConfigChange::CovarianceToggled,
        )
    }

    pub fn set_covariance_color(
        &mut self,
        part: CovariancePartKind,
        color: Rgb,
    ) -> Option<ConfigChange> {
        replace(
            &mut self.covariance.part_mut(part).color,
            color,
            ConfigChange::StyleChanged,
        )
    }

    pub fn set_covariance_alpha(
        &mut self,
        part: CovariancePartKind,
        alpha: f32,
    ) -> Option<ConfigChange> {
        let alpha = unit_interval("covariance_alpha", alpha);
        replace(
            &mut self.covariance.part_mut(part).alpha,
            alpha,
            ConfigChange::StyleChanged,
        )
    }

    pub fn set_covariance_scale(
        &mut self,
        part: CovariancePartKind,
        scale: f64,
    ) -> Option<ConfigChange> {
        let scale = non_negative("covariance_scale", scale);
        replace(
            &mut self.covariance.part_mut(part).scale,
            scale,
            ConfigChange::StyleChanged,
        )
    }

    pub fn set_orientation_frame(&mut self, frame: OrientationFrame) -> Option<ConfigChange> {
        replace(
            &mut self.covariance.orientation_frame,
            frame,
            ConfigChange::StyleChanged,
        )
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T, change: ConfigChange) -> Option<ConfigChange> {
    if *slot == value {
        return None;
    }
    *slot = value;
    Some(change)
}

fn same_part_style(a: &CovariancePart, b: &CovariancePart) -> bool {
    a.color == b.color && a.alpha == b.alpha && a.scale == b.scale
}

fn non_negative(name: &str, value: f64) -> f64 {
    if value >= 0.0 {
        return value;
    }
    let err = TrailError::ConfigOutOfRange(format!("{name} = {value}, clamped to 0"));
    warn!("{err}");
    0.0
}

fn unit_interval(name: &str, value: f32) -> f32 {
    if (0.0..=1.0).contains(&value) {
        return value;
    }
    let clamped = if value > 1.0 { 1.0 } else { 0.0 };
    let err = TrailError::ConfigOutOfRange(format!("{name} = {value}, clamped to {clamped}"));
    warn!("{err}");
    clamped
}
