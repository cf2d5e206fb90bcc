//! Frameloom assembles cinematic render output from scattered asynchronous
//! pass completions into ordered, complete, writable frames.
//!
//! Producers (render passes on worker threads) allocate a frame with its
//! declared expected set, then submit tagged [`PassSample`]s; the
//! [`OutputMerger`] detects completion under one coarse lock and hands
//! [`FinishedFrame`]s to a single polling consumer. [`OutputSession`] is the
//! consumer-side driver: it disambiguates output filenames, composites
//! overlay passes in paint order, and dispatches writes to a [`WriteSink`].
#![forbid(unsafe_code)]

pub mod buffer;
pub mod composite;
pub mod config;
pub mod foundation;
pub mod merge;
pub mod naming;
pub mod queue;
pub mod sample;
pub mod session;
pub mod sink;

pub use buffer::ImageRGBA;
pub use config::OutputConfig;
pub use foundation::core::{FrameNumber, RenderPassIdentity};
pub use foundation::error::{FrameloomError, FrameloomResult};
pub use merge::merger::{FrameProgress, OutputMerger};
pub use merge::slot::{FinishedFrame, FrameSlot};
pub use queue::WriteQueue;
pub use sample::{PassSample, SamplePayload};
pub use session::OutputSession;
pub use sink::{DiskSink, InMemorySink, WriteRequest, WriteSink};
