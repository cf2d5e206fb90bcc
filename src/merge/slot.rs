use std::collections::{BTreeMap, HashSet};

use smallvec::SmallVec;

use crate::foundation::core::{FrameNumber, RenderPassIdentity};
use crate::sample::PassSample;

/// Per-frame mutable record tracking which render passes are expected and
/// which have arrived.
///
/// The expected set is fixed at allocation time; the received list only
/// grows. Received passes are kept in arrival order so that the completion
/// sort is stable with respect to submission order.
#[derive(Debug)]
pub struct FrameSlot {
    frame_number: FrameNumber,
    expected: HashSet<RenderPassIdentity>,
    received: SmallVec<[PassSample; 8]>,
    metadata: BTreeMap<String, String>,
}

impl FrameSlot {
    /// Create a slot for `frame_number` with its declared expected set.
    pub fn new(
        frame_number: FrameNumber,
        expected: impl IntoIterator<Item = RenderPassIdentity>,
    ) -> Self {
        Self {
            frame_number,
            expected: expected.into_iter().collect(),
            received: SmallVec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Frame this slot assembles.
    pub fn frame_number(&self) -> FrameNumber {
        self.frame_number
    }

    /// Whether `identity` is part of the declared contract for this frame.
    pub fn expects(&self, identity: &RenderPassIdentity) -> bool {
        self.expected.contains(identity)
    }

    /// Identities this slot was allocated to receive.
    pub fn expected(&self) -> impl Iterator<Item = &RenderPassIdentity> {
        self.expected.iter()
    }

    /// Identities received so far, in arrival order.
    pub fn received(&self) -> impl Iterator<Item = &RenderPassIdentity> {
        self.received.iter().map(|s| &s.payload.identity)
    }

    /// Number of distinct identities received so far.
    pub fn received_len(&self) -> usize {
        self.received.len()
    }

    /// Insert a sample, merging its file metadata into the slot.
    ///
    /// A resubmitted identity replaces the earlier buffer in place, so it
    /// counts once toward completion and keeps its original arrival position.
    /// The caller must have checked [`FrameSlot::expects`] first.
    pub fn insert(&mut self, sample: PassSample) {
        for (k, v) in &sample.payload.metadata {
            self.metadata.insert(k.clone(), v.clone());
        }
        let pos = self
            .received
            .iter()
            .position(|s| s.payload.identity == sample.payload.identity);
        match pos {
            Some(i) => self.received[i] = sample,
            None => self.received.push(sample),
        }
    }

    /// True exactly when every expected identity has arrived.
    pub fn is_complete(&self) -> bool {
        self.received.len() == self.expected.len()
    }

    /// Consume the slot into a [`FinishedFrame`].
    ///
    /// Passes are stable-sorted ascending by compositing sort order; entries
    /// with equal sort orders keep their relative arrival order, which makes
    /// compositing layering deterministic across identical sort values.
    pub fn finish(self) -> FinishedFrame {
        let mut passes: Vec<PassSample> = self.received.into_vec();
        passes.sort_by_key(|s| s.payload.sort_order);
        FinishedFrame {
            frame_number: self.frame_number,
            passes,
            metadata: self.metadata,
        }
    }
}

/// A fully assembled frame, handed off to the single consumer.
///
/// Producers no longer hold any reference once a frame is finished; the
/// consumer owns it outright.
#[derive(Debug)]
pub struct FinishedFrame {
    /// Frame this data belongs to.
    pub frame_number: FrameNumber,
    /// All received passes, sorted ascending by compositing sort order.
    pub passes: Vec<PassSample>,
    /// File metadata merged from every submission for this frame.
    pub metadata: BTreeMap<String, String>,
}

impl FinishedFrame {
    /// Passes written as primary outputs (not composited onto others).
    pub fn primary_passes(&self) -> impl Iterator<Item = &PassSample> {
        self.passes
            .iter()
            .filter(|s| !s.payload.composite_on_output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ImageRGBA;
    use crate::sample::SamplePayload;

    fn id(layer: &str, sub: &str) -> RenderPassIdentity {
        RenderPassIdentity::new("main", layer, "deferred", sub, "cam0")
    }

    fn sample(layer: &str, sub: &str, sort: i32) -> PassSample {
        let mut payload = SamplePayload::primary(FrameNumber(1), id(layer, sub));
        payload.sort_order = sort;
        PassSample::new(payload, ImageRGBA::solid(2, 2, [0, 0, 0, 255]).unwrap())
    }

    #[test]
    fn complete_only_when_every_expected_identity_arrived() {
        let mut slot = FrameSlot::new(FrameNumber(1), [id("A", "rgba"), id("A", "depth")]);
        assert!(!slot.is_complete());
        slot.insert(sample("A", "rgba", 0));
        assert!(!slot.is_complete());
        slot.insert(sample("A", "depth", 0));
        assert!(slot.is_complete());
    }

    #[test]
    fn duplicate_identity_counts_once_and_keeps_position() {
        let mut slot = FrameSlot::new(FrameNumber(1), [id("A", "rgba"), id("A", "depth")]);
        slot.insert(sample("A", "rgba", 0));
        slot.insert(sample("A", "rgba", 0));
        assert_eq!(slot.received_len(), 1);
        slot.insert(sample("A", "depth", 0));
        let finished = slot.finish();
        assert_eq!(finished.passes[0].payload.identity, id("A", "rgba"));
    }

    #[test]
    fn finish_sort_is_stable_for_equal_sort_orders() {
        let expected = [
            id("A", "s5a"),
            id("A", "s2"),
            id("A", "s5b"),
            id("A", "s1"),
        ];
        let mut slot = FrameSlot::new(FrameNumber(1), expected);
        slot.insert(sample("A", "s5a", 5));
        slot.insert(sample("A", "s2", 2));
        slot.insert(sample("A", "s5b", 5));
        slot.insert(sample("A", "s1", 1));
        let finished = slot.finish();
        let orders: Vec<i32> = finished.passes.iter().map(|s| s.payload.sort_order).collect();
        assert_eq!(orders, vec![1, 2, 5, 5]);
        // The two sort-order-5 entries keep submission order: s5a before s5b.
        assert_eq!(finished.passes[2].payload.identity, id("A", "s5a"));
        assert_eq!(finished.passes[3].payload.identity, id("A", "s5b"));
    }

    #[test]
    fn metadata_merges_across_submissions() {
        let mut slot = FrameSlot::new(FrameNumber(1), [id("A", "rgba"), id("A", "depth")]);
        let mut a = sample("A", "rgba", 0);
        a.payload.metadata.insert("shutter".into(), "0.5".into());
        let mut b = sample("A", "depth", 0);
        b.payload.metadata.insert("exposure".into(), "1.0".into());
        slot.insert(a);
        slot.insert(b);
        let finished = slot.finish();
        assert_eq!(finished.metadata.len(), 2);
        assert_eq!(finished.metadata.get("shutter").map(String::as_str), Some("0.5"));
        assert_eq!(finished.metadata.get("exposure").map(String::as_str), Some("1.0"));
    }
}
