use crate::core::Canvas;

/// Lower scale bound; zoom-out clamps here.
pub const SCALE_MIN: f64 = 0.1;
/// Upper scale bound; zoom-in clamps here.
pub const SCALE_MAX: f64 = 3.0;
/// Increment used by the discrete zoom controls.
pub const SCALE_STEP: f64 = 0.1;
/// Increment in degrees used by the discrete rotate control.
pub const ROTATION_STEP_DEG: f64 = 15.0;

/// Placement of the photo layer on the canvas.
///
/// `(x, y)` is the canvas-space location of the photo's geometric center,
/// `scale` a uniform multiplier in `[SCALE_MIN, SCALE_MAX]`, and `rotation`
/// clockwise degrees in `[0, 360)` about `(x, y)`. Translation is unbounded:
/// the photo may be dragged fully off-canvas.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PhotoTransform {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    pub rotation: f64,
}

impl PhotoTransform {
    /// The default placement: canvas center, full nominal size, unrotated.
    pub fn centered(canvas: Canvas) -> Self {
        let c = canvas.center();
        Self {
            x: c.x,
            y: c.y,
            scale: 1.0,
            rotation: 0.0,
        }
    }

    /// Unconditional overwrite of the photo center. No clamping.
    pub fn set_translation(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    /// Relative scale change, clamped into `[SCALE_MIN, SCALE_MAX]`.
    pub fn adjust_scale(&mut self, delta: f64) {
        self.set_scale(self.scale + delta);
    }

    /// Absolute scale (slider path), clamped into `[SCALE_MIN, SCALE_MAX]`.
    pub fn set_scale(&mut self, value: f64) {
        self.scale = clamp_scale(value);
    }

    /// Relative rotation change, normalized into `[0, 360)`.
    pub fn adjust_rotation(&mut self, delta: f64) {
        self.set_rotation(self.rotation + delta);
    }

    /// Absolute rotation in degrees (slider path), normalized into `[0, 360)`.
    pub fn set_rotation(&mut self, value: f64) {
        self.rotation = normalize_rotation(value);
    }

    /// Return to the default placement for `canvas`.
    pub fn reset(&mut self, canvas: Canvas) {
        *self = Self::centered(canvas);
    }
}

fn clamp_scale(value: f64) -> f64 {
    if value.is_nan() {
        return SCALE_MIN;
    }
    value.clamp(SCALE_MIN, SCALE_MAX)
}

fn normalize_rotation(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let r = value.rem_euclid(360.0);
    // rem_euclid of a tiny negative can round up to exactly 360.0.
    if r >= 360.0 { 0.0 } else { r }
}
