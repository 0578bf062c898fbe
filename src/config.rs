use std::path::Path;

use serde::Deserialize;

use crate::alignment::tokenization::{SegmentOptions, DEFAULT_OOV_SYMBOL};
use crate::error::AlignmentError;
use crate::output::{EmitOptions, OutputFormat};
use crate::types::PhoneId;

/// Run-wide tuning. Loaded from JSON with every field optional, then
/// overridden field by field from the command line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlignerConfig {
    pub frame_shift_secs: f32,
    /// Largest row-count difference allowed between fused feature streams.
    pub length_tolerance: usize,
    pub text_case_sensitive: bool,
    pub spell_oov: bool,
    pub oov_symbol: String,
    pub min_duration_secs: f64,
    /// `None` selects channel 0.
    pub channel: Option<usize>,
    pub vtln_warp: f32,
    pub expected_sample_rate_hz: u32,
    pub boost_silence: f32,
    pub silence_phones: Vec<PhoneId>,
    pub output_format: OutputFormat,
    pub per_frame: bool,
}

impl AlignerConfig {
    pub const DEFAULT_FRAME_SHIFT_SECS: f32 = 0.01;
    pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 16_000;
    pub const DEFAULT_SILENCE_PHONE: PhoneId = 1;

    pub fn load(path: &Path) -> Result<Self, AlignmentError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| AlignmentError::io("read aligner config", e))?;
        let config: Self = serde_json::from_str(&data)
            .map_err(|e| AlignmentError::json("parse aligner config", e))?;
        tracing::debug!(path = %path.display(), "config: loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AlignmentError> {
        if !(self.frame_shift_secs.is_finite() && self.frame_shift_secs > 0.0) {
            return Err(AlignmentError::config(format!(
                "frame shift must be positive, got {}",
                self.frame_shift_secs
            )));
        }
        if !(self.min_duration_secs.is_finite() && self.min_duration_secs >= 0.0) {
            return Err(AlignmentError::config(format!(
                "min duration must be non-negative, got {}",
                self.min_duration_secs
            )));
        }
        if !(self.vtln_warp.is_finite() && self.vtln_warp > 0.0) {
            return Err(AlignmentError::config(format!(
                "vtln warp must be positive, got {}",
                self.vtln_warp
            )));
        }
        if !(self.boost_silence.is_finite() && self.boost_silence > 0.0) {
            return Err(AlignmentError::config(format!(
                "silence boost must be positive, got {}",
                self.boost_silence
            )));
        }
        if self.expected_sample_rate_hz == 0 {
            return Err(AlignmentError::config("sample rate must be non-zero"));
        }
        if self.oov_symbol.trim().is_empty() {
            return Err(AlignmentError::config("oov symbol must not be empty"));
        }
        Ok(())
    }

    pub fn segment_options(&self) -> SegmentOptions {
        SegmentOptions {
            case_sensitive: self.text_case_sensitive,
            spell_oov: self.spell_oov,
            oov_symbol: self.oov_symbol.clone(),
        }
    }

    pub fn emit_options(&self) -> EmitOptions {
        EmitOptions {
            frame_shift_secs: self.frame_shift_secs,
            per_frame: self.per_frame,
        }
    }
}

impl Default for AlignerConfig {
    fn default() -> Self {
        Self {
            frame_shift_secs: Self::DEFAULT_FRAME_SHIFT_SECS,
            length_tolerance: 0,
            text_case_sensitive: false,
            spell_oov: true,
            oov_symbol: DEFAULT_OOV_SYMBOL.to_string(),
            min_duration_secs: 0.0,
            channel: None,
            vtln_warp: 1.0,
            expected_sample_rate_hz: Self::DEFAULT_SAMPLE_RATE_HZ,
            boost_silence: 1.0,
            silence_phones: vec![Self::DEFAULT_SILENCE_PHONE],
            output_format: OutputFormat::Custom,
            per_frame: false,
        }
    }
}
