//! Filename-template tokens, disambiguation, and resolution.
//!
//! A template like `"shot.{frame}"` resolves to one file per written pass.
//! When a finished frame contains colliding contributors (several branches,
//! renderers, sub-resources or cameras), [`disambiguate_format`] injects the
//! tokens needed to keep their output paths distinct.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::config::OutputConfig;
use crate::foundation::core::{FrameNumber, RenderPassIdentity};
use crate::merge::slot::FinishedFrame;

/// Frame-number token, zero-padded per [`OutputConfig::frame_number_digits`].
pub const TOKEN_FRAME: &str = "{frame}";
/// Root graph branch token.
pub const TOKEN_BRANCH: &str = "{branch}";
/// Render layer token.
pub const TOKEN_LAYER: &str = "{layer}";
/// Renderer token.
pub const TOKEN_RENDERER: &str = "{renderer}";
/// Sub-resource token.
pub const TOKEN_SUBRESOURCE: &str = "{subresource}";
/// Camera token.
pub const TOKEN_CAMERA: &str = "{camera}";

/// Inject the tokens a template needs to disambiguate `identity` among the
/// contributors of `frame`.
///
/// Rules, derived from aggregate counts over the frame's received set:
/// - more than one branch: inject `{branch}` when duplicate layer names
///   exist across branches (layer count < branch count), else `{layer}`;
/// - more than one renderer in the active branch: inject `{renderer}`;
/// - more than one sub-resource in the active branch: inject `{subresource}`;
/// - more than one camera in the active branch: inject `{camera}`.
///
/// Each injection is idempotent: a template that already contains the token
/// is left untouched, so applying this twice equals applying it once.
pub fn disambiguate_format(
    format: &str,
    frame: &FinishedFrame,
    identity: &RenderPassIdentity,
) -> String {
    let mut branches = HashSet::new();
    let mut layers = HashSet::new();
    let mut renderers = HashSet::new();
    let mut sub_resources = HashSet::new();
    let mut cameras = HashSet::new();
    for pass in &frame.passes {
        let id = &pass.payload.identity;
        branches.insert(id.branch.as_str());
        layers.insert(id.layer.as_str());
        if id.branch == identity.branch {
            renderers.insert(id.renderer.as_str());
            sub_resources.insert(id.sub_resource.as_str());
            cameras.insert(id.camera.as_str());
        }
    }

    let mut out = format.to_string();
    if branches.len() > 1 {
        if layers.len() < branches.len() {
            inject_token(&mut out, TOKEN_BRANCH);
        } else {
            inject_token(&mut out, TOKEN_LAYER);
        }
    }
    if renderers.len() > 1 {
        inject_token(&mut out, TOKEN_RENDERER);
    }
    if sub_resources.len() > 1 {
        inject_token(&mut out, TOKEN_SUBRESOURCE);
    }
    if cameras.len() > 1 {
        inject_token(&mut out, TOKEN_CAMERA);
    }
    out
}

/// Substitute every token and return the full output path.
///
/// The resolved name is rooted in [`OutputConfig::directory`] and gets the
/// configured extension appended.
pub fn resolve(
    format: &str,
    frame_number: FrameNumber,
    identity: &RenderPassIdentity,
    config: &OutputConfig,
) -> PathBuf {
    let frame = format!(
        "{:0width$}",
        frame_number.0,
        width = config.frame_number_digits
    );
    let name = format
        .replace(TOKEN_FRAME, &frame)
        .replace(TOKEN_BRANCH, &identity.branch)
        .replace(TOKEN_LAYER, &identity.layer)
        .replace(TOKEN_RENDERER, &identity.renderer)
        .replace(TOKEN_SUBRESOURCE, &identity.sub_resource)
        .replace(TOKEN_CAMERA, &identity.camera);
    config.directory.join(format!("{name}.{}", config.extension))
}

/// Insert `_{token}` into the template stem, just before the `{frame}` token
/// when present (staying on the stem side of a `.` or `_` separator), else at
/// the end. No-op when the token is already present.
fn inject_token(format: &mut String, token: &str) {
    if format.contains(token) {
        return;
    }
    let insertion = format!("_{token}");
    match format.find(TOKEN_FRAME) {
        Some(mut pos) => {
            if pos > 0 {
                let prev = format.as_bytes()[pos - 1];
                if prev == b'.' || prev == b'_' {
                    pos -= 1;
                }
            }
            format.insert_str(pos, &insertion);
        }
        None => format.push_str(&insertion),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ImageRGBA;
    use crate::merge::slot::FrameSlot;
    use crate::sample::{PassSample, SamplePayload};

    fn finished_with(identities: Vec<RenderPassIdentity>) -> FinishedFrame {
        let mut slot = FrameSlot::new(FrameNumber(12), identities.clone());
        for id in identities {
            slot.insert(PassSample::new(
                SamplePayload::primary(FrameNumber(12), id),
                ImageRGBA::solid(2, 2, [0, 0, 0, 255]).unwrap(),
            ));
        }
        slot.finish()
    }

    fn id(branch: &str, layer: &str, renderer: &str, sub: &str, cam: &str) -> RenderPassIdentity {
        RenderPassIdentity::new(branch, layer, renderer, sub, cam)
    }

    #[test]
    fn single_contributor_injects_nothing() {
        let frame = finished_with(vec![id("main", "A", "deferred", "rgba", "cam0")]);
        let fmt = disambiguate_format("shot.{frame}", &frame, &frame.passes[0].payload.identity);
        assert_eq!(fmt, "shot.{frame}");
    }

    #[test]
    fn distinct_layers_across_branches_prefer_layer_token() {
        let frame = finished_with(vec![
            id("b0", "A", "deferred", "rgba", "cam0"),
            id("b1", "B", "deferred", "rgba", "cam0"),
        ]);
        let fmt = disambiguate_format("shot.{frame}", &frame, &frame.passes[0].payload.identity);
        assert_eq!(fmt, "shot_{layer}.{frame}");
    }

    #[test]
    fn duplicate_layers_across_branches_force_branch_token() {
        let frame = finished_with(vec![
            id("b0", "A", "deferred", "rgba", "cam0"),
            id("b1", "A", "deferred", "rgba", "cam0"),
        ]);
        let fmt = disambiguate_format("shot.{frame}", &frame, &frame.passes[0].payload.identity);
        assert_eq!(fmt, "shot_{branch}.{frame}");
    }

    #[test]
    fn active_branch_collisions_inject_renderer_subresource_camera() {
        let frame = finished_with(vec![
            id("main", "A", "deferred", "rgba", "cam0"),
            id("main", "A", "path", "rgba", "cam0"),
            id("main", "A", "deferred", "depth", "cam0"),
            id("main", "A", "deferred", "rgba", "cam1"),
        ]);
        let fmt = disambiguate_format("shot.{frame}", &frame, &frame.passes[0].payload.identity);
        assert_eq!(fmt, "shot_{renderer}_{subresource}_{camera}.{frame}");
    }

    #[test]
    fn injection_is_idempotent() {
        let frame = finished_with(vec![
            id("main", "A", "deferred", "rgba", "cam0"),
            id("main", "A", "deferred", "depth", "cam0"),
        ]);
        let identity = &frame.passes[0].payload.identity;
        let once = disambiguate_format("shot.{frame}", &frame, identity);
        let twice = disambiguate_format(&once, &frame, identity);
        assert_eq!(once, twice);
        assert_eq!(once, "shot_{subresource}.{frame}");
    }

    #[test]
    fn counts_are_scoped_to_the_active_branch() {
        // The second branch has two renderers; the active branch has one.
        let frame = finished_with(vec![
            id("b0", "A", "deferred", "rgba", "cam0"),
            id("b1", "B", "deferred", "rgba", "cam0"),
            id("b1", "B", "path", "rgba", "cam0"),
        ]);
        let active = id("b0", "A", "deferred", "rgba", "cam0");
        let fmt = disambiguate_format("shot.{frame}", &frame, &active);
        assert_eq!(fmt, "shot_{layer}.{frame}");
    }

    #[test]
    fn templates_without_a_frame_token_append_at_the_end() {
        let frame = finished_with(vec![
            id("main", "A", "deferred", "rgba", "cam0"),
            id("main", "A", "deferred", "depth", "cam0"),
        ]);
        let fmt = disambiguate_format("beauty", &frame, &frame.passes[0].payload.identity);
        assert_eq!(fmt, "beauty_{subresource}");
    }

    #[test]
    fn resolve_substitutes_and_pads() {
        let config = OutputConfig {
            directory: PathBuf::from("/out"),
            file_name_format: String::new(),
            frame_number_digits: 4,
            extension: "png".into(),
            overwrite_existing: true,
        };
        let identity = id("main", "A", "deferred", "depth", "cam0");
        let path = resolve("shot_{subresource}.{frame}", FrameNumber(7), &identity, &config);
        assert_eq!(path, PathBuf::from("/out/shot_depth.0007.png"));
    }
}
