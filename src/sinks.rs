//! Stateless mappings from the hope factor to renderer and DOM parameters.
//!
//! Every sink is the interpolation of its own two endpoints evaluated at the
//! current factor. None of them keep state or read each other.

use serde::Deserialize;

use crate::ease::lerp;

/// Linear color in [0,1] per channel.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Unpack a `0xRRGGBB` literal.
    pub fn from_hex(hex: u32) -> Self {
        let ch = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
        Self::new(ch(16), ch(8), ch(0))
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

/// A scalar sink: `from` at factor 0, `to` at factor 1.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
pub struct Lerp {
    pub from: f32,
    pub to: f32,
}

impl Lerp {
    pub const fn new(from: f32, to: f32) -> Self {
        Self { from, to }
    }

    #[inline]
    pub fn at(&self, factor: f32) -> f32 {
        lerp(self.from, self.to, factor.clamp(0.0, 1.0))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
pub struct ColorLerp {
    pub from: Rgb,
    pub to: Rgb,
}

impl ColorLerp {
    pub const fn new(from: Rgb, to: Rgb) -> Self {
        Self { from, to }
    }

    pub fn at(&self, factor: f32) -> Rgb {
        let t = factor.clamp(0.0, 1.0);
        Rgb::new(
            lerp(self.from.r, self.to.r, t),
            lerp(self.from.g, self.to.g, t),
            lerp(self.from.b, self.to.b, t),
        )
    }
}

/// Endpoints for every sink. Defaults are the storm and hope looks of the
/// shipped scene.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SinkTable {
    pub rain_opacity: Lerp,
    pub bloom_strength: Lerp,
    pub bloom_threshold: Lerp,
    pub env_intensity: Lerp,
    pub background_blur: Lerp,
    pub exposure: Lerp,
    pub fog_alpha: Lerp,
    pub fog_color: ColorLerp,
    pub water_color: ColorLerp,
    pub wave_amplitude: Lerp,
    pub pier_color: ColorLerp,
    pub god_ray_alpha: Lerp,
    pub particle_alpha: Lerp,
    /// Tint shared by god-rays and light particles.
    pub glow_color: Rgb,
}

impl Default for SinkTable {
    fn default() -> Self {
        Self {
            rain_opacity: Lerp::new(1.0, 0.0),
            bloom_strength: Lerp::new(0.2, 1.5),
            bloom_threshold: Lerp::new(0.3, 0.1),
            env_intensity: Lerp::new(0.1, 1.0),
            background_blur: Lerp::new(0.3, 0.0),
            exposure: Lerp::new(0.8, 1.5),
            fog_alpha: Lerp::new(0.15, 0.05),
            fog_color: ColorLerp::new(Rgb::new(0.5, 0.55, 0.6), Rgb::new(0.8, 0.75, 0.7)),
            water_color: ColorLerp::new(Rgb::from_hex(0x051020), Rgb::from_hex(0x0088ff)),
            // storm waves peak at 0.8 + 0.6, calm ones at 0.15 + 0.1
            wave_amplitude: Lerp::new(1.4, 0.25),
            pier_color: ColorLerp::new(Rgb::from_hex(0x332211), Rgb::from_hex(0x6b5a48)),
            god_ray_alpha: Lerp::new(0.0, 0.6),
            particle_alpha: Lerp::new(0.0, 0.8),
            glow_color: Rgb::from_hex(0xf5d98a),
        }
    }
}

/// Everything the renderer needs for one frame, derived from the scalars.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VisualParams {
    pub rain_opacity: f32,
    pub rain_falling: bool,
    pub bloom_strength: f32,
    pub bloom_threshold: f32,
    pub env_intensity: f32,
    pub background_blur: f32,
    pub exposure: f32,
    pub fog_alpha: f32,
    pub fog_color: Rgb,
    pub water_color: Rgb,
    pub wave_amplitude: f32,
    pub pier_color: Rgb,
    pub god_ray_alpha: f32,
    pub particle_alpha: f32,
    pub glow_color: Rgb,
}

impl SinkTable {
    /// Evaluate the hope-driven sinks at `hope` and the fog sinks at `fog`.
    ///
    /// Fog is the one sink scroll can also drive, so the caller resolves its
    /// input separately.
    pub fn evaluate(&self, hope: f32, fog: f32) -> VisualParams {
        VisualParams {
            rain_opacity: self.rain_opacity.at(hope),
            rain_falling: rain_falling(hope),
            bloom_strength: self.bloom_strength.at(hope),
            bloom_threshold: self.bloom_threshold.at(hope),
            env_intensity: self.env_intensity.at(hope),
            background_blur: self.background_blur.at(hope),
            exposure: self.exposure.at(hope),
            fog_alpha: self.fog_alpha.at(fog),
            fog_color: self.fog_color.at(fog),
            water_color: self.water_color.at(hope),
            wave_amplitude: self.wave_amplitude.at(hope),
            pier_color: self.pier_color.at(hope),
            god_ray_alpha: self.god_ray_alpha.at(hope),
            particle_alpha: self.particle_alpha.at(hope),
            glow_color: self.glow_color,
        }
    }
}

/// Rain geometry stops advancing once the scene is essentially clear.
#[inline]
pub fn rain_falling(hope: f32) -> bool {
    hope < 0.99
}
