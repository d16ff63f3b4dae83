//! Host viewport size

use crate::render::RenderError;

/// Logical viewport size plus the device pixel ratio
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Logical width
    pub width: u32,
    /// Logical height
    pub height: u32,
    /// Physical pixels per logical pixel
    pub pixel_ratio: f32,
}

impl Viewport {
    /// Viewport at a pixel ratio of 1
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, pixel_ratio: 1.0 }
    }

    /// Same size with a different pixel ratio
    pub fn with_pixel_ratio(self, pixel_ratio: f32) -> Self {
        Self { pixel_ratio, ..self }
    }

    /// Width over height
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Output surface size in physical pixels with the pixel ratio capped at `max_ratio`
    pub fn surface_size(&self, max_ratio: f32) -> (u32, u32) {
        let ratio = self.pixel_ratio.clamp(f32::MIN_POSITIVE, max_ratio.max(f32::MIN_POSITIVE));
        let scale = |v: u32| ((v as f32 * ratio).round() as u32).max(1);
        (scale(self.width), scale(self.height))
    }

    /// Reject empty viewports and unusable pixel ratios
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidViewport(format!("{}x{}", self.width, self.height)));
        }
        if !(self.pixel_ratio.is_finite() && self.pixel_ratio > 0.0) {
            return Err(RenderError::InvalidViewport(format!("pixel ratio {}", self.pixel_ratio)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_aspect_ratio() {
        assert_relative_eq!(Viewport::new(1920, 1080).aspect(), 16.0 / 9.0);
    }

    #[test]
    fn test_surface_size_caps_pixel_ratio() {
        let viewport = Viewport::new(800, 600).with_pixel_ratio(3.0);
        assert_eq!(viewport.surface_size(2.0), (1600, 1200));
        assert_eq!(viewport.with_pixel_ratio(1.5).surface_size(2.0), (1200, 900));
    }

    #[test]
    fn test_validate_rejects_empty_viewport() {
        assert!(Viewport::new(0, 600).validate().is_err());
        assert!(Viewport::new(800, 600).with_pixel_ratio(0.0).validate().is_err());
        assert!(Viewport::new(800, 600).validate().is_ok());
    }
}
