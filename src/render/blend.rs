use crate::{
    catalog::model::BlendMode,
    foundation::error::{LoomError, LoomResult},
};

/// Straight-alpha RGBA8 pixel.
pub type Rgba8 = [u8; 4];

/// Composite `src` over `dst` with `mode`, scaling source alpha by `opacity`.
///
/// Uses the separable blend formula: the blended color replaces the source color where the
/// backdrop is opaque, then the result is composited source-over.
pub fn blend(dst: Rgba8, src: Rgba8, mode: BlendMode, opacity: f32) -> Rgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let sa = unit(src[3]) * opacity;
    let da = unit(dst[3]);
    let oa = sa + da * (1.0 - sa);
    if oa <= 0.0 {
        return [0, 0, 0, 0];
    }

    let mut out = [0u8; 4];
    for i in 0..3 {
        let cs = unit(src[i]);
        let cd = unit(dst[i]);
        let mixed = (1.0 - da) * cs + da * mix(mode, cd, cs);
        let premul = sa * mixed + da * cd * (1.0 - sa);
        out[i] = to_u8(premul / oa);
    }
    out[3] = to_u8(oa);
    out
}

fn mix(mode: BlendMode, backdrop: f32, source: f32) -> f32 {
    match mode {
        BlendMode::SourceOver => source,
        BlendMode::Multiply => backdrop * source,
        BlendMode::Screen => backdrop + source - backdrop * source,
        BlendMode::Darken => backdrop.min(source),
        BlendMode::Lighten => backdrop.max(source),
    }
}

fn unit(v: u8) -> f32 {
    f32::from(v) / 255.0
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Blend an equal-sized RGBA8 buffer onto `dst` in place.
pub fn blend_in_place(dst: &mut [u8], src: &[u8], mode: BlendMode, opacity: f32) -> LoomResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(LoomError::validation(
            "blend_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = blend([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], mode, opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}
