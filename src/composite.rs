//! Pure compositing helpers over a finished frame.
//!
//! Overlay selection plus premultiplied-alpha `over` math for painting
//! overlays onto primary outputs. No shared state.

use crate::buffer::ImageRGBA;
use crate::foundation::error::{FrameloomError, FrameloomResult};
use crate::merge::slot::FinishedFrame;
use crate::sample::PassSample;

/// Select the passes flagged for compositing, in paint order.
///
/// Returns clones (the originals stay owned by the primary output path),
/// stable-sorted ascending by compositing sort order: a later entry is
/// composited on top of earlier ones.
pub fn composited_passes(frame: &FinishedFrame) -> Vec<PassSample> {
    let mut overlays: Vec<PassSample> = frame
        .passes
        .iter()
        .filter(|s| s.payload.composite_on_output)
        .cloned()
        .collect();
    overlays.sort_by_key(|s| s.payload.sort_order);
    overlays
}

/// Composite `src` over one destination pixel, both premultiplied RGBA8.
pub fn over(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    if src[3] == 0 {
        return dst;
    }
    if src[3] == 255 {
        return src;
    }
    let inv = 255u16 - u16::from(src[3]);
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = src[i].saturating_add(mul_div255(u16::from(dst[i]), inv));
    }
    out
}

/// Composite an overlay buffer over `dst` in place.
///
/// Both buffers must be premultiplied and share the same dimensions.
pub fn over_in_place(dst: &mut ImageRGBA, src: &ImageRGBA) -> FrameloomResult<()> {
    if dst.width != src.width || dst.height != src.height {
        return Err(FrameloomError::validation(format!(
            "cannot composite {}x{} overlay onto {}x{} base",
            src.width, src.height, dst.width, dst.height
        )));
    }
    if !dst.premultiplied || !src.premultiplied {
        return Err(FrameloomError::validation(
            "over_in_place expects premultiplied buffers",
        ));
    }
    for (d, s) in dst
        .data
        .chunks_exact_mut(4)
        .zip(src.data.chunks_exact(4))
    {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&out);
    }
    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}
