use std::collections::BTreeMap;

use crate::buffer::ImageRGBA;
use crate::foundation::core::{FrameNumber, RenderPassIdentity};

/// Immutable tag attached to every rendered image buffer.
///
/// Identifies which frame and which render pass the buffer belongs to, plus
/// the information the output stage needs to order and file it.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SamplePayload {
    /// Logical output frame the buffer contributes to.
    pub frame_number: FrameNumber,
    /// Which render pass produced the buffer.
    pub identity: RenderPassIdentity,
    /// Spatial sample index within the frame (informational).
    pub spatial_sample: u32,
    /// Temporal sample index within the frame (informational).
    pub temporal_sample: u32,
    /// Compositing sort order; lower sorts first and is drawn under.
    pub sort_order: i32,
    /// Whether the pass is composited onto primary outputs instead of being
    /// written as a primary output itself.
    pub composite_on_output: bool,
    /// Free-form file metadata, merged across a frame's submissions.
    pub metadata: BTreeMap<String, String>,
}

impl SamplePayload {
    /// Payload for a primary (non-composited) pass with default sample
    /// indices and empty metadata.
    pub fn primary(frame_number: FrameNumber, identity: RenderPassIdentity) -> Self {
        Self {
            frame_number,
            identity,
            spatial_sample: 0,
            temporal_sample: 0,
            sort_order: 0,
            composite_on_output: false,
            metadata: BTreeMap::new(),
        }
    }

    /// Payload for an overlay pass composited at `sort_order`.
    pub fn overlay(
        frame_number: FrameNumber,
        identity: RenderPassIdentity,
        sort_order: i32,
    ) -> Self {
        Self {
            frame_number,
            identity,
            spatial_sample: 0,
            temporal_sample: 0,
            sort_order,
            composite_on_output: true,
            metadata: BTreeMap::new(),
        }
    }
}

/// One tagged image buffer, the unit producers hand to the merger.
///
/// Ownership is unique end to end: the sample moves from the producer into
/// its frame slot, then into the finished frame, then into a write request.
#[derive(Clone, Debug)]
pub struct PassSample {
    /// Tag identifying the buffer.
    pub payload: SamplePayload,
    /// The rendered pixels.
    pub image: ImageRGBA,
}

impl PassSample {
    /// Pair a payload with its pixels.
    pub fn new(payload: SamplePayload, image: ImageRGBA) -> Self {
        Self { payload, image }
    }
}
