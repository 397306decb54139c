use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::sinks::SinkTable;
use crate::timeline::PhaseSchedule;

/// Tunables for the scene. Every field has a default, so the page can ship
/// an empty or partial JSON blob.
#[derive(Debug, Clone, Deserialize)]
pub struct HopeConfig {
    #[serde(default)]
    pub phases: PhaseSchedule,

    #[serde(default = "default_hope_epsilon")]
    pub hope_epsilon: f32,

    #[serde(default = "default_filter_epsilon")]
    pub filter_epsilon: f32,

    #[serde(default)]
    pub reveal_delay_secs: f32,

    #[serde(default = "default_sections")]
    pub sections: SectionThresholds,

    #[serde(default = "default_nav_offset")]
    pub nav_offset_px: f64,

    /// Duration of the backdrop filter tween that runs alongside the reveal.
    #[serde(default = "default_backdrop_tween")]
    pub backdrop_tween_secs: f32,

    #[serde(default)]
    pub sinks: SinkTable,

    #[serde(default = "default_backdrop_url")]
    pub backdrop_url: String,

    #[serde(default = "default_video_url")]
    pub video_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SectionThresholds {
    pub start_ratio: f64,
    pub end_ratio: f64,
}

impl Default for HopeConfig {
    fn default() -> Self {
        Self {
            phases: PhaseSchedule::default(),
            hope_epsilon: default_hope_epsilon(),
            filter_epsilon: default_filter_epsilon(),
            reveal_delay_secs: 0.0,
            sections: default_sections(),
            nav_offset_px: default_nav_offset(),
            backdrop_tween_secs: default_backdrop_tween(),
            sinks: SinkTable::default(),
            backdrop_url: default_backdrop_url(),
            video_url: default_video_url(),
        }
    }
}

fn default_hope_epsilon() -> f32 {
    0.01
}

fn default_filter_epsilon() -> f32 {
    0.02
}

fn default_sections() -> SectionThresholds {
    SectionThresholds {
        start_ratio: 0.8,
        end_ratio: 0.2,
    }
}

fn default_nav_offset() -> f64 {
    80.0
}

fn default_backdrop_tween() -> f32 {
    12.0
}

fn default_backdrop_url() -> String {
    "assets/backdrop.jpg".to_string()
}

fn default_video_url() -> String {
    "https://www.youtube.com/embed/x7BEDUGk6NI?autoplay=1&rel=0&modestbranding=1".to_string()
}

impl HopeConfig {
    /// Parse and validate a JSON document. Blank input means defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: HopeConfig =
            serde_json::from_str(text).context("invalid hope config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let mut prev = 0.0_f32;
        for (i, phase) in self.phases.phases().iter().enumerate() {
            if !(0.0..=1.0).contains(&phase.target) {
                bail!("phase {i}: target {} outside [0,1]", phase.target);
            }
            if phase.target < prev {
                bail!("phase {i}: target {} goes backwards from {prev}", phase.target);
            }
            if !(phase.duration_secs > 0.0) {
                bail!("phase {i}: duration must be positive");
            }
            prev = phase.target;
        }
        if self.phases.phases().is_empty() {
            bail!("the reveal needs at least one phase");
        }
        if self.phases.final_target() != 1.0 {
            bail!("last phase must end at 1.0, got {}", self.phases.final_target());
        }
        if self.hope_epsilon < 0.0 || self.filter_epsilon < 0.0 {
            bail!("throttle epsilons must not be negative");
        }
        if self.reveal_delay_secs < 0.0 || self.backdrop_tween_secs < 0.0 {
            bail!("delays must not be negative");
        }
        let s = &self.sections;
        if !(0.0..=1.0).contains(&s.start_ratio) || !(0.0..=1.0).contains(&s.end_ratio) {
            bail!("section thresholds must be viewport fractions");
        }
        Ok(())
    }
}
