//! A preview surface for terminals: each pushed layer is summarised on one
//! line instead of being rendered.

use image_augmenter::{AugmentResult, LayerRole, PreviewLayer, PreviewSurface};

/// Value range and mean of a layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerStats {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
}

impl LayerStats {
    /// `None` for an empty volume.
    #[must_use]
    pub fn from_values(values: &[f32]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let (min, max, sum) = values.iter().fold(
            (f32::INFINITY, f32::NEG_INFINITY, 0.0_f64),
            |(min, max, sum), &v| (min.min(v), max.max(v), sum + f64::from(v)),
        );
        Some(Self {
            min,
            max,
            mean: (sum / values.len() as f64) as f32,
        })
    }
}

/// One summary line for `layer`.
///
/// # Errors
///
/// Fails when the layer's values cannot be read.
pub fn describe(layer: &PreviewLayer) -> AugmentResult<String> {
    let role = match layer.role {
        LayerRole::Image => "image",
        LayerRole::Mask => "mask",
    };
    let stats = LayerStats::from_values(layer.volume.values()?).map_or_else(
        || "empty".to_string(),
        |s| format!("min={:.4} max={:.4} mean={:.4}", s.min, s.max, s.mean),
    );
    let referenced = if layer.metadata.is_some() { "" } else { " (no spatial metadata)" };
    Ok(format!(
        "{:<48} {role:<5} shape={:?} {stats}{referenced}",
        layer.name,
        layer.volume.shape()
    ))
}

/// Prints pushed layers to stdout.
#[derive(Debug, Default)]
pub struct TerminalPreview {
    shown: usize,
}

impl TerminalPreview {
    /// Layers shown since the last clear.
    #[must_use]
    pub const fn shown(&self) -> usize {
        self.shown
    }
}

impl PreviewSurface for TerminalPreview {
    fn clear(&mut self) {
        self.shown = 0;
    }

    fn show(&mut self, layer: PreviewLayer) -> AugmentResult<()> {
        println!("{}", describe(&layer)?);
        self.shown += 1;
        Ok(())
    }

    fn reset_views(&mut self) {
        println!();
    }
}
