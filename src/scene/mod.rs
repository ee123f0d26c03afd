//! Scene configuration and the headless render entry points.

use crate::gpu::{
    surface::PREFERRED_FORMAT, CommittedFrame, FrameImage, GpuContext, GpuError, GpuOptions,
    OffscreenSurface, RenderError, SphereRenderer,
};
use crate::mesh::SphereParams;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything needed to render the single frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub width: u32,
    pub height: u32,
    /// RGBA color for pixels the sphere does not cover.
    pub clear_color: [f32; 4],
    pub sphere: SphereParams,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            width: 600,
            height: 600,
            clear_color: [1.0, 1.0, 0.8, 1.0],
            sphere: SphereParams::default(),
        }
    }
}

impl SceneConfig {
    /// Parse from JSON text. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, SceneError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, SceneError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Reject configurations that cannot produce a frame.
    pub fn validate(&self) -> Result<(), SceneError> {
        if self.width == 0 || self.height == 0 {
            return Err(SceneError::InvalidConfig(format!(
                "surface size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.clear_color.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(SceneError::InvalidConfig(format!(
                "clear color components must be in 0..=1, got {:?}",
                self.clear_color
            )));
        }
        self.sphere
            .validate()
            .map_err(|e| SceneError::InvalidConfig(e.to_string()))
    }
}

/// Errors that can occur while loading a scene or rendering it headless.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("Invalid scene config: {0}")]
    InvalidConfig(String),
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<GpuError> for SceneError {
    fn from(err: GpuError) -> Self {
        Self::Render(RenderError::Gpu(err))
    }
}

/// Parse hex color to RGBA floats (6-char RGB with opaque alpha, or 8-char RGBA).
pub fn parse_hex_color(hex: &str) -> Option<[f32; 4]> {
    let hex = hex.trim_start_matches('#');
    if !hex.is_ascii() || (hex.len() != 6 && hex.len() != 8) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok().map(|v| v as f32 / 255.0);
    let a = if hex.len() == 8 { channel(6)? } else { 1.0 };
    Some([channel(0)?, channel(2)?, channel(4)?, a])
}

/// Result of a headless render.
#[derive(Debug, Clone)]
pub struct OffscreenFrame {
    pub committed: CommittedFrame,
    pub image: FrameImage,
    pub adapter: String,
}

/// Run the whole sequence against an offscreen surface and read the pixels back.
pub async fn render_offscreen(
    config: &SceneConfig,
    options: GpuOptions,
) -> Result<OffscreenFrame, SceneError> {
    config.validate()?;

    let ctx = GpuContext::with_options(options).await?;
    let adapter = ctx.adapter_info().name;
    let mut surface = OffscreenSurface::new(&ctx, config.width, config.height, config.clear_color)?;
    let renderer = SphereRenderer::new(ctx, &config.sphere, PREFERRED_FORMAT)?;

    let committed = renderer.render(&mut surface)?;
    let image = surface.read_frame()?;

    Ok(OffscreenFrame {
        committed,
        image,
        adapter,
    })
}

/// Render headless and write the frame to a PNG file.
pub async fn render_to_png<P: AsRef<Path>>(
    config: &SceneConfig,
    options: GpuOptions,
    output_path: P,
) -> Result<OffscreenFrame, SceneError> {
    let frame = render_offscreen(config, options).await?;
    frame.image.save_png(output_path.as_ref())?;
    log::info!("Wrote frame to {}", output_path.as_ref().display());
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#ffffcc"), Some([1.0, 1.0, 0.8, 1.0]));
        assert_eq!(parse_hex_color("000000"), Some([0.0, 0.0, 0.0, 1.0]));
        assert_eq!(parse_hex_color("#00000000"), Some([0.0, 0.0, 0.0, 0.0]));
        assert_eq!(parse_hex_color("invalid"), None);
        assert_eq!(parse_hex_color("#ffé"), None);
        assert_eq!(parse_hex_color("#fffff"), None);
    }

    #[test]
    fn test_scene_config_default() {
        let config = SceneConfig::default();
        assert_eq!((config.width, config.height), (600, 600));
        assert_eq!(config.clear_color, [1.0, 1.0, 0.8, 1.0]);
        assert_eq!(config.sphere, SphereParams::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_scene_config_partial_json() {
        let config =
            SceneConfig::from_json_str(r#"{"width": 320, "sphere": {"segments": [24, 12]}}"#)
                .unwrap();
        assert_eq!(config.width, 320);
        assert_eq!(config.height, 600);
        assert_eq!(config.sphere.segments, [24, 12]);
        assert_eq!(config.sphere.extents, [0.2, 0.2, 0.2]);
    }

    #[test]
    fn test_scene_config_rejects_bad_values() {
        assert!(matches!(
            SceneConfig::from_json_str(r#"{"height": 0}"#),
            Err(SceneError::InvalidConfig(_))
        ));
        assert!(matches!(
            SceneConfig::from_json_str(r#"{"clear_color": [2.0, 0.0, 0.0, 1.0]}"#),
            Err(SceneError::InvalidConfig(_))
        ));
        assert!(matches!(
            SceneConfig::from_json_str(r#"{"sphere": {"extents": [-1.0, 1.0, 1.0]}}"#),
            Err(SceneError::InvalidConfig(_))
        ));
        assert!(matches!(
            SceneConfig::from_json_str("{not json"),
            Err(SceneError::Json(_))
        ));
    }

    #[test]
    fn test_scene_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");
        std::fs::write(&path, r#"{"clear_color": [0.0, 0.0, 0.0, 1.0]}"#).unwrap();

        let config = SceneConfig::from_json_file(&path).unwrap();
        assert_eq!(config.clear_color, [0.0, 0.0, 0.0, 1.0]);

        assert!(matches!(
            SceneConfig::from_json_file(dir.path().join("missing.json")),
            Err(SceneError::Io(_))
        ));
    }
}
