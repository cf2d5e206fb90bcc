use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::buffer::ImageRGBA;
use crate::foundation::core::{FrameNumber, RenderPassIdentity};
use crate::foundation::error::{FrameloomError, FrameloomResult};

/// One image write, fully resolved.
#[derive(Clone, Debug)]
pub struct WriteRequest {
    /// Destination path, resolved from the filename template.
    pub path: PathBuf,
    /// Pixels to write.
    pub image: ImageRGBA,
    /// Frame the image belongs to.
    pub frame_number: FrameNumber,
    /// Pass the image came from.
    pub identity: RenderPassIdentity,
    /// File metadata accumulated for the frame.
    pub metadata: BTreeMap<String, String>,
}

/// Sink contract for resolved image writes.
///
/// Implementations must be callable from the consumer drain loop, the rayon
/// per-pass fan-out, and the asynchronous debug write worker, hence
/// `Send + Sync` with interior mutability where state is kept.
pub trait WriteSink: Send + Sync {
    /// Persist one image.
    fn write(&self, request: WriteRequest) -> FrameloomResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    writes: Mutex<Vec<WriteRequest>>,
}

impl InMemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the writes received so far, in arrival order.
    pub fn writes(&self) -> Vec<WriteRequest> {
        self.writes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl WriteSink for InMemorySink {
    fn write(&self, request: WriteRequest) -> FrameloomResult<()> {
        self.writes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);
        Ok(())
    }
}

/// Sink that encodes PNG files on disk.
///
/// Parent directories are created on demand. When `overwrite_existing` is
/// false, a write to an existing path is refused with an output error.
#[derive(Debug)]
pub struct DiskSink {
    overwrite_existing: bool,
}

impl DiskSink {
    /// Create a disk sink.
    pub fn new(overwrite_existing: bool) -> Self {
        Self { overwrite_existing }
    }
}

impl WriteSink for DiskSink {
    #[tracing::instrument(level = "debug", skip_all, fields(path = %request.path.display()))]
    fn write(&self, request: WriteRequest) -> FrameloomResult<()> {
        if !self.overwrite_existing && request.path.exists() {
            return Err(FrameloomError::output(format!(
                "refusing to overwrite existing output file {}",
                request.path.display()
            )));
        }
        if let Some(parent) = request.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                FrameloomError::output(format!(
                    "failed to create output directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let mut image = request.image;
        image.to_straight_alpha();
        let encoded = image::RgbaImage::from_raw(image.width, image.height, image.data)
            .ok_or_else(|| {
                FrameloomError::output("image buffer length does not match its dimensions")
            })?;
        encoded.save(&request.path).map_err(|e| {
            FrameloomError::output(format!(
                "failed to encode {}: {e}",
                request.path.display()
            ))
        })?;
        tracing::debug!(
            frame = request.frame_number.0,
            identity = %request.identity,
            "wrote output file"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(path: PathBuf) -> WriteRequest {
        WriteRequest {
            path,
            image: ImageRGBA::solid(4, 4, [255, 0, 0, 255]).unwrap(),
            frame_number: FrameNumber(1),
            identity: RenderPassIdentity::new("main", "A", "deferred", "rgba", "cam0"),
            metadata: BTreeMap::new(),
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "frameloom_sink_{}_{name}",
            std::process::id()
        ))
    }

    #[test]
    fn in_memory_sink_records_in_arrival_order() {
        let sink = InMemorySink::new();
        sink.write(request(PathBuf::from("a.png"))).unwrap();
        sink.write(request(PathBuf::from("b.png"))).unwrap();
        let writes = sink.writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].path, PathBuf::from("a.png"));
    }

    #[test]
    fn disk_sink_writes_a_decodable_png() {
        let dir = temp_path("roundtrip");
        let path = dir.join("frame.png");
        let sink = DiskSink::new(true);
        sink.write(request(path.clone())).unwrap();
        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (4, 4));
        assert_eq!(decoded.get_pixel(0, 0).0, [255, 0, 0, 255]);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn disk_sink_refuses_overwrite_when_configured() {
        let dir = temp_path("no_overwrite");
        let path = dir.join("frame.png");
        let sink = DiskSink::new(true);
        sink.write(request(path.clone())).unwrap();

        let strict = DiskSink::new(false);
        let err = strict.write(request(path.clone())).unwrap_err();
        assert!(err.to_string().contains("refusing to overwrite"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
