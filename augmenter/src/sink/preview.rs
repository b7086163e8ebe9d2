//! Visualization surface used by preview runs.

use crate::{
    error::AugmentResult,
    volume::{SpatialMetadata, Volume},
};

/// How a layer is composited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerRole {
    /// Shown as the background volume.
    Image,
    /// Shown as a label overlay on the preceding image.
    Mask,
}

/// One volume pushed to the surface.
#[derive(Debug, Clone)]
pub struct PreviewLayer {
    /// Node name, `{case}_{transform}_img` or `{case}_{transform}_mask`.
    pub name: String,
    pub role: LayerRole,
    pub volume: Volume,
    /// Spatial referencing copied from the original case, when allowed.
    pub metadata: Option<SpatialMetadata>,
}

/// Something that can display preview layers.
pub trait PreviewSurface {
    /// Remove every layer shown so far.
    fn clear(&mut self);

    /// Display `layer`.
    ///
    /// # Errors
    ///
    /// Implementations may fail when the layer cannot be displayed.
    fn show(&mut self, layer: PreviewLayer) -> AugmentResult<()>;

    /// Re-centre the views after a case has been pushed.
    fn reset_views(&mut self);
}

/// Collects layers in memory.
impl PreviewSurface for Vec<PreviewLayer> {
    fn clear(&mut self) {
        Vec::clear(self);
    }

    fn show(&mut self, layer: PreviewLayer) -> AugmentResult<()> {
        self.push(layer);
        Ok(())
    }

    fn reset_views(&mut self) {}
}
