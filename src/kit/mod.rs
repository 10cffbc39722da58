//! Pads and kits.
//!
//! A `PadConfig` describes one procedurally synthesized sound. Everything the
//! voice generators need to know about *which* generator to run is resolved
//! once, when the pad is built, into a `Voicing`; triggering never inspects
//! the label again.

use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

mod presets;

pub use presets::factory_kit;

pub type PadId = u32;

/// Pads with ids at or above this are composite genre loops.
pub const FIRST_LOOP_PAD: PadId = 16;

pub const MIN_FREQUENCY: f32 = 20.0;
pub const MAX_FREQUENCY: f32 = 20_000.0;
pub const MIN_DECAY: f32 = 0.001;
pub const MAX_DECAY: f32 = 10.0;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundType {
    Kick,
    Snare,
    HiHat,
    Bass,
    Synth,
    Fx,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FxKind {
    Gunshot,
    TapeStop,
    Scratch,
    Noise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopStyle {
    BoomBap,
    House,
    Trap,
    LoFi,
}

impl LoopStyle {
    /// Length of the generated backing pattern.
    pub fn bars(self) -> u32 {
        match self {
            LoopStyle::BoomBap => 2,
            LoopStyle::House => 2,
            LoopStyle::Trap => 4,
            LoopStyle::LoFi => 4,
        }
    }
}

/// Which generator a pad runs, resolved from its sound type, id and label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Voicing {
    Kick,
    Snare,
    Clap,
    HiHat,
    Bass,
    Synth,
    Fx(FxKind),
    Loop(LoopStyle),
}

impl Voicing {
    pub fn resolve(id: PadId, sound_type: SoundType, label: &str) -> Self {
        let label = label.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| label.contains(w));

        if id >= FIRST_LOOP_PAD {
            let style = if has(&["house"]) {
                LoopStyle::House
            } else if has(&["trap"]) {
                LoopStyle::Trap
            } else if has(&["lofi", "lo-fi", "chill"]) {
                LoopStyle::LoFi
            } else {
                LoopStyle::BoomBap
            };
            return Voicing::Loop(style);
        }

        match sound_type {
            SoundType::Kick => Voicing::Kick,
            SoundType::Snare if has(&["clap"]) => Voicing::Clap,
            SoundType::Snare => Voicing::Snare,
            SoundType::HiHat => Voicing::HiHat,
            SoundType::Bass => Voicing::Bass,
            SoundType::Synth => Voicing::Synth,
            SoundType::Fx => {
                let kind = if has(&["gun", "shot"]) {
                    FxKind::Gunshot
                } else if has(&["tape", "stop"]) {
                    FxKind::TapeStop
                } else if has(&["scratch"]) {
                    FxKind::Scratch
                } else {
                    FxKind::Noise
                };
                Voicing::Fx(kind)
            }
        }
    }

    pub fn is_loop(self) -> bool {
        matches!(self, Voicing::Loop(_))
    }
}

/// Serializable form of a pad, without the resolved voicing.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[derive(Debug, Clone, PartialEq)]
pub struct PadSpec {
    pub id: PadId,
    pub key_trigger: char,
    pub label: String,
    pub color: String,
    pub sound_type: SoundType,
    pub base_frequency: f32,
    pub pitch_decay: f32,
    pub volume_decay: f32,
    pub waveform: Waveform,
    pub mix_in_noise: bool,
    pub apply_distortion: bool,
}

impl PadSpec {
    pub fn new(id: PadId, key_trigger: char, label: &str, sound_type: SoundType) -> Self {
        Self {
            id,
            key_trigger,
            label: label.to_string(),
            color: "gray".to_string(),
            sound_type,
            base_frequency: 100.0,
            pitch_decay: 0.1,
            volume_decay: 0.3,
            waveform: Waveform::Sine,
            mix_in_noise: false,
            apply_distortion: false,
        }
    }

    pub fn color(mut self, color: &str) -> Self {
        self.color = color.to_string();
        self
    }

    pub fn frequency(mut self, hz: f32) -> Self {
        self.base_frequency = hz;
        self
    }

    pub fn decays(mut self, pitch: f32, volume: f32) -> Self {
        self.pitch_decay = pitch;
        self.volume_decay = volume;
        self
    }

    pub fn waveform(mut self, waveform: Waveform) -> Self {
        self.waveform = waveform;
        self
    }

    pub fn noise(mut self) -> Self {
        self.mix_in_noise = true;
        self
    }

    pub fn distorted(mut self) -> Self {
        self.apply_distortion = true;
        self
    }

    /// Validate and resolve into a playable pad.
    pub fn build(self) -> Result<PadConfig, ConfigurationError> {
        PadConfig::try_from(self)
    }
}

/// A validated pad. Fields are read-only; reconfigure by building a new one.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "PadSpec", into = "PadSpec"))]
#[derive(Debug, Clone, PartialEq)]
pub struct PadConfig {
    spec: PadSpec,
    voicing: Voicing,
}

impl TryFrom<PadSpec> for PadConfig {
    type Error = ConfigurationError;

    fn try_from(spec: PadSpec) -> Result<Self, Self::Error> {
        let invalid = |reason: String| ConfigurationError::InvalidPad {
            id: spec.id,
            reason,
        };

        if spec.label.trim().is_empty() {
            return Err(invalid("label is empty".into()));
        }
        if !(MIN_FREQUENCY..=MAX_FREQUENCY).contains(&spec.base_frequency) {
            return Err(invalid(format!(
                "base frequency {} Hz is outside {MIN_FREQUENCY}..={MAX_FREQUENCY}",
                spec.base_frequency
            )));
        }
        for (name, value) in [("pitch", spec.pitch_decay), ("volume", spec.volume_decay)] {
            if !(MIN_DECAY..=MAX_DECAY).contains(&value) {
                return Err(invalid(format!(
                    "{name} decay {value} s is outside {MIN_DECAY}..={MAX_DECAY}"
                )));
            }
        }

        let mut spec = spec;
        spec.key_trigger = spec.key_trigger.to_ascii_lowercase();
        let voicing = Voicing::resolve(spec.id, spec.sound_type, &spec.label);
        Ok(Self { spec, voicing })
    }
}

impl From<PadConfig> for PadSpec {
    fn from(pad: PadConfig) -> Self {
        pad.spec
    }
}

impl PadConfig {
    pub fn id(&self) -> PadId {
        self.spec.id
    }

    pub fn key_trigger(&self) -> char {
        self.spec.key_trigger
    }

    pub fn label(&self) -> &str {
        &self.spec.label
    }

    pub fn color(&self) -> &str {
        &self.spec.color
    }

    pub fn sound_type(&self) -> SoundType {
        self.spec.sound_type
    }

    pub fn base_frequency(&self) -> f32 {
        self.spec.base_frequency
    }

    pub fn pitch_decay(&self) -> f32 {
        self.spec.pitch_decay
    }

    pub fn volume_decay(&self) -> f32 {
        self.spec.volume_decay
    }

    pub fn waveform(&self) -> Waveform {
        self.spec.waveform
    }

    pub fn mix_in_noise(&self) -> bool {
        self.spec.mix_in_noise
    }

    pub fn apply_distortion(&self) -> bool {
        self.spec.apply_distortion
    }

    pub fn voicing(&self) -> Voicing {
        self.voicing
    }

    pub fn is_loop(&self) -> bool {
        self.voicing.is_loop()
    }

    /// Frequency after a pitch bend in semitones.
    pub fn effective_frequency(&self, bend_semitones: f32) -> f32 {
        self.spec.base_frequency * 2.0_f32.powf(bend_semitones / 12.0)
    }

    /// The longer of the two decays.
    pub fn duration(&self) -> f32 {
        self.spec.pitch_decay.max(self.spec.volume_decay)
    }

    pub fn spec(&self) -> &PadSpec {
        &self.spec
    }
}

/// A named, ordered set of pads with unique ids and keys.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Kit {
    name: String,
    pads: Vec<PadConfig>,
}

impl Kit {
    pub fn new(name: &str, pads: Vec<PadConfig>) -> Result<Self, ConfigurationError> {
        let kit = Self {
            name: name.to_string(),
            pads,
        };
        kit.validate()?;
        Ok(kit)
    }

    /// Check the invariants a deserialized kit may not yet satisfy.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.pads.is_empty() {
            return Err(ConfigurationError::EmptyKit);
        }
        let mut ids = HashSet::with_capacity(self.pads.len());
        let mut keys = HashSet::with_capacity(self.pads.len());
        for pad in &self.pads {
            if !ids.insert(pad.id()) {
                return Err(ConfigurationError::DuplicatePadId(pad.id()));
            }
            if !keys.insert(pad.key_trigger()) {
                return Err(ConfigurationError::DuplicateKey(pad.key_trigger()));
            }
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pads(&self) -> &[PadConfig] {
        &self.pads
    }

    pub fn pad(&self, id: PadId) -> Option<&PadConfig> {
        self.pads.iter().find(|pad| pad.id() == id)
    }

    pub fn pad_for_key(&self, key: char) -> Option<&PadConfig> {
        let key = key.to_ascii_lowercase();
        self.pads.iter().find(|pad| pad.key_trigger() == key)
    }

    pub fn contains(&self, id: PadId) -> bool {
        self.pad(id).is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = PadId> + '_ {
        self.pads.iter().map(PadConfig::id)
    }
}
