use std::fmt;

/// Logical output frame number.
///
/// The primary key for in-flight and finished frame tracking. Frame numbers
/// are unique while a frame is in flight and are never reused until the frame
/// completes or the pipeline abandons its outstanding work.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameNumber(pub u64);

impl fmt::Display for FrameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compound key identifying one contributor to a frame.
///
/// `branch` is the root graph branch the layer was produced by; layer names
/// may repeat across branches, which is why output-path disambiguation
/// compares branch and layer counts separately.
///
/// The identity must be unique within a single frame's expected set.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct RenderPassIdentity {
    /// Root graph branch that produced the pass.
    pub branch: String,
    /// Render layer name.
    pub layer: String,
    /// Renderer name (e.g. "path-traced", "deferred").
    pub renderer: String,
    /// Sub-resource within the renderer's output (e.g. "rgba", "depth").
    pub sub_resource: String,
    /// Camera the pass was rendered from.
    pub camera: String,
}

impl RenderPassIdentity {
    /// Build an identity from its five components.
    pub fn new(
        branch: impl Into<String>,
        layer: impl Into<String>,
        renderer: impl Into<String>,
        sub_resource: impl Into<String>,
        camera: impl Into<String>,
    ) -> Self {
        Self {
            branch: branch.into(),
            layer: layer.into(),
            renderer: renderer.into(),
            sub_resource: sub_resource.into(),
            camera: camera.into(),
        }
    }
}

impl fmt::Display for RenderPassIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{}",
            self.branch, self.layer, self.renderer, self.sub_resource, self.camera
        )
    }
}
