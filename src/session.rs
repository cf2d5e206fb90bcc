use std::sync::Arc;

use rayon::prelude::*;

use crate::composite;
use crate::config::OutputConfig;
use crate::foundation::error::FrameloomResult;
use crate::merge::merger::OutputMerger;
use crate::merge::slot::FinishedFrame;
use crate::naming;
use crate::sink::{WriteRequest, WriteSink};

/// Consumer-side driver for the output merger.
///
/// Producers clone the shared [`OutputMerger`] handle and submit pass data
/// from their own threads; the control loop calls
/// [`OutputSession::poll_and_write`] periodically from a single thread. The
/// poll never blocks waiting for producers.
///
/// For each finished frame the session writes one output per non-composited
/// pass: the filename template is disambiguated against the frame's
/// contributors, overlays are composited on top in paint order, and the
/// result goes to the write sink. The per-pass encode/write fan-out runs on
/// rayon.
pub struct OutputSession {
    merger: Arc<OutputMerger>,
    config: Arc<OutputConfig>,
    sink: Arc<dyn WriteSink>,
}

impl OutputSession {
    /// Create a session around a config snapshot and a write sink.
    pub fn new(config: OutputConfig, sink: Arc<dyn WriteSink>) -> Self {
        let config = Arc::new(config);
        let merger = Arc::new(OutputMerger::new(Arc::clone(&config), Arc::clone(&sink)));
        Self {
            merger,
            config,
            sink,
        }
    }

    /// Shared merger handle for producers.
    pub fn merger(&self) -> Arc<OutputMerger> {
        Arc::clone(&self.merger)
    }

    /// Drain every finished frame and dispatch its writes.
    ///
    /// Returns the number of frames written.
    pub fn poll_and_write(&self) -> FrameloomResult<u64> {
        let mut written = 0u64;
        while let Some(frame) = self.merger.drain_finished_frame() {
            self.write_finished_frame(frame)?;
            written += 1;
        }
        Ok(written)
    }

    /// Number of frames still being assembled.
    pub fn outstanding_frames(&self) -> usize {
        self.merger.outstanding_frames()
    }

    /// Discard all outstanding merge work (pipeline cancellation).
    pub fn abandon(&self) {
        self.merger.abandon_outstanding_work();
    }

    #[tracing::instrument(level = "debug", skip_all, fields(frame = frame.frame_number.0))]
    fn write_finished_frame(&self, frame: FinishedFrame) -> FrameloomResult<()> {
        let overlays = composite::composited_passes(&frame);
        let primaries: Vec<_> = frame.primary_passes().collect();

        primaries
            .par_iter()
            .map(|primary| {
                let format = naming::disambiguate_format(
                    &self.config.file_name_format,
                    &frame,
                    &primary.payload.identity,
                );
                let path = naming::resolve(
                    &format,
                    frame.frame_number,
                    &primary.payload.identity,
                    &self.config,
                );

                let mut image = primary.image.clone();
                for overlay in &overlays {
                    if let Err(e) = composite::over_in_place(&mut image, &overlay.image) {
                        tracing::warn!(
                            frame = frame.frame_number.0,
                            overlay = %overlay.payload.identity,
                            error = %e,
                            "skipping overlay that cannot be composited"
                        );
                    }
                }

                self.sink.write(WriteRequest {
                    path,
                    image,
                    frame_number: frame.frame_number,
                    identity: primary.payload.identity.clone(),
                    metadata: frame.metadata.clone(),
                })
            })
            .collect::<FrameloomResult<Vec<()>>>()?;
        Ok(())
    }
}
