//! RGBA color used for tints, backgrounds and UI colors

use serde::{Deserialize, Serialize};

/// Linear RGBA color, every channel in 0..=1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    #[serde(default = "opaque")]
    pub a: f32,
}

fn opaque() -> f32 {
    1.0
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Complementary color, alpha untouched
    pub fn inverted(self) -> Self {
        Self::new(1.0 - self.r, 1.0 - self.g, 1.0 - self.b, self.a)
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_keeps_alpha() {
        let c = Rgba::new(0.2, 0.5, 1.0, 0.3).inverted();
        assert!((c.r - 0.8).abs() < 1e-6);
        assert!((c.g - 0.5).abs() < 1e-6);
        assert!(c.b.abs() < 1e-6);
        assert!((c.a - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_alpha_defaults_to_opaque() {
        let c: Rgba = serde_json::from_str(r#"{"r":0.5,"g":0.5,"b":0.5}"#).unwrap();
        assert_eq!(c.a, 1.0);
    }
}
