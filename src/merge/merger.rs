use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::OutputConfig;
use crate::foundation::core::{FrameNumber, RenderPassIdentity};
use crate::merge::slot::{FinishedFrame, FrameSlot};
use crate::naming;
use crate::queue::WriteQueue;
use crate::sample::PassSample;
use crate::sink::{WriteRequest, WriteSink};

/// Snapshot of an in-flight frame's progress.
///
/// Slots live behind the in-flight lock, so lookups return an owned snapshot
/// rather than a reference into the map.
#[derive(Clone, Debug)]
pub struct FrameProgress {
    /// The frame being assembled.
    pub frame_number: FrameNumber,
    /// Identities declared at allocation time.
    pub expected: Vec<RenderPassIdentity>,
    /// Identities received so far, in arrival order.
    pub received: Vec<RenderPassIdentity>,
}

/// Single authoritative collector of asynchronously produced, per-frame,
/// per-render-pass image data.
///
/// Producers on arbitrary threads allocate frames, submit pass data, and the
/// merger detects completion; a single consumer drains finished frames. All
/// in-flight mutations and size-based completion checks happen under one
/// coarse lock, so exactly the submission that satisfies the expected set
/// observes the completion transition.
///
/// A frame that never receives all of its expected passes stays in flight
/// until [`OutputMerger::abandon_outstanding_work`] or process shutdown;
/// there is no timeout-based collection.
pub struct OutputMerger {
    inflight: Mutex<HashMap<FrameNumber, FrameSlot>>,
    finished: Mutex<VecDeque<FinishedFrame>>,
    // Declared before `sink` so drop joins the worker while the sink is
    // still alive and queued debug writes can complete.
    debug_queue: WriteQueue,
    config: Arc<OutputConfig>,
    sink: Arc<dyn WriteSink>,
}

impl OutputMerger {
    /// Create a merger wired to its external collaborators: the output
    /// settings snapshot and the write sink used by the debug path.
    pub fn new(config: Arc<OutputConfig>, sink: Arc<dyn WriteSink>) -> Self {
        Self {
            inflight: Mutex::new(HashMap::new()),
            finished: Mutex::new(VecDeque::new()),
            debug_queue: WriteQueue::new(),
            config,
            sink,
        }
    }

    /// Declare a new frame and the exact set of passes it must receive.
    ///
    /// Must be called from the single frame-issuing context before any data
    /// for the frame is submitted.
    ///
    /// # Panics
    ///
    /// Panics when a slot for `frame_number` already exists. Frame numbers
    /// must be unique while in flight; a duplicate is a caller bug, and
    /// continuing would corrupt frame bookkeeping.
    pub fn allocate_frame(
        &self,
        frame_number: FrameNumber,
        expected: impl IntoIterator<Item = RenderPassIdentity>,
    ) {
        let mut inflight = self.lock_inflight();
        assert!(
            !inflight.contains_key(&frame_number),
            "frame {frame_number} is already in flight; frame numbers must be unique"
        );
        inflight.insert(frame_number, FrameSlot::new(frame_number, expected));
    }

    /// Snapshot the progress of an in-flight frame.
    ///
    /// # Panics
    ///
    /// Panics when the frame is not in flight. Callers must only ask about
    /// frames they allocated and that have not yet completed.
    pub fn frame_progress(&self, frame_number: FrameNumber) -> FrameProgress {
        let inflight = self.lock_inflight();
        let slot = inflight
            .get(&frame_number)
            .unwrap_or_else(|| panic!("frame {frame_number} is not in flight"));
        FrameProgress {
            frame_number,
            expected: slot.expected().cloned().collect(),
            received: slot.received().cloned().collect(),
        }
    }

    /// Core ingestion operation, callable concurrently from any number of
    /// producer threads.
    ///
    /// Data for an unknown (never allocated, already finished, or abandoned)
    /// frame, or for an identity outside the frame's expected set, is a
    /// recoverable protocol violation: it is reported and that one buffer is
    /// dropped, leaving all other in-flight state untouched.
    ///
    /// The submission that completes a frame's expected set atomically
    /// removes the slot from the in-flight map and pushes the finished frame
    /// onto the handoff queue.
    pub fn submit_pass_data(&self, sample: PassSample) {
        let frame_number = sample.payload.frame_number;
        let identity = sample.payload.identity.clone();

        let mut inflight = self.lock_inflight();
        let Some(slot) = inflight.get_mut(&frame_number) else {
            tracing::warn!(
                frame = frame_number.0,
                identity = %identity,
                "dropping pass data for a frame that is not in flight"
            );
            return;
        };
        if !slot.expects(&identity) {
            tracing::warn!(
                frame = frame_number.0,
                identity = %identity,
                "dropping pass data for an identity outside the frame's expected set"
            );
            return;
        }

        slot.insert(sample);
        if !slot.is_complete() {
            return;
        }

        match inflight.remove(&frame_number) {
            Some(slot) => {
                let finished = slot.finish();
                tracing::debug!(
                    frame = frame_number.0,
                    passes = finished.passes.len(),
                    "frame assembly complete"
                );
                // Push while still holding the in-flight lock so producer
                // pushes stay serialized.
                self.lock_finished().push_back(finished);
            }
            None => {
                // Unreachable while the in-flight lock is held across the
                // insert and this remove; report and skip the frame.
                tracing::error!(
                    frame = frame_number.0,
                    "completed frame vanished from the in-flight map"
                );
            }
        }
    }

    /// Fire-and-forget path for debug/unaccumulated output.
    ///
    /// Resolves the sample's output path from its payload and forwards it to
    /// the write sink on the dedicated write worker. Never touches frame
    /// slots and has no ordering relationship with the merge protocol. The
    /// worker checks sink liveness through a weak reference before writing.
    pub fn submit_single_sample(&self, sample: PassSample) {
        let sink = Arc::downgrade(&self.sink);
        let config = Arc::clone(&self.config);
        self.debug_queue.submit(move || {
            let Some(sink) = sink.upgrade() else {
                tracing::debug!("write sink dropped before debug sample dispatch; skipping");
                return;
            };
            let payload = sample.payload;
            let path = naming::resolve(
                &config.file_name_format,
                payload.frame_number,
                &payload.identity,
                &config,
            );
            let request = WriteRequest {
                path,
                image: sample.image,
                frame_number: payload.frame_number,
                identity: payload.identity,
                metadata: payload.metadata,
            };
            if let Err(e) = sink.write(request) {
                tracing::warn!(error = %e, "debug sample write failed");
            }
        });
    }

    /// Non-blocking pop of the oldest finished frame.
    ///
    /// Consumer-side; single-threaded by convention.
    pub fn drain_finished_frame(&self) -> Option<FinishedFrame> {
        self.lock_finished().pop_front()
    }

    /// Discard all in-flight slots and queued finished frames.
    ///
    /// Called on pipeline cancellation or error shutdown. The in-flight lock
    /// is held across both clears, so a racing submission observes either the
    /// pre-clear or the post-clear state, never a partial one; submissions
    /// for abandoned frames then fail the unknown-frame check and are
    /// reported and dropped.
    pub fn abandon_outstanding_work(&self) {
        let mut inflight = self.lock_inflight();
        let mut finished = self.lock_finished();
        if !inflight.is_empty() || !finished.is_empty() {
            tracing::warn!(
                inflight = inflight.len(),
                finished = finished.len(),
                "abandoning outstanding merge work"
            );
        }
        inflight.clear();
        finished.clear();
    }

    /// Number of frames still being assembled.
    pub fn outstanding_frames(&self) -> usize {
        self.lock_inflight().len()
    }

    /// Number of finished frames awaiting the consumer.
    pub fn finished_len(&self) -> usize {
        self.lock_finished().len()
    }

    fn lock_inflight(&self) -> MutexGuard<'_, HashMap<FrameNumber, FrameSlot>> {
        self.inflight.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_finished(&self) -> MutexGuard<'_, VecDeque<FinishedFrame>> {
        self.finished.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for OutputMerger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputMerger")
            .field("outstanding_frames", &self.outstanding_frames())
            .field("finished_len", &self.finished_len())
            .finish_non_exhaustive()
    }
}
