use std::fmt;
use std::io::Write;
use std::str::FromStr;

use serde::Deserialize;

use crate::alignment::runs::split_to_phones;
use crate::error::AlignmentError;
use crate::pipeline::traits::TransitionModel;
use crate::symbols::SymbolTables;
use crate::types::UnitId;

mod archive;
mod ctm;
mod custom;
mod mlf;

pub use mlf::MLF_HEADER;

/// The single record format written for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Custom,
    Mlf,
    Ctm,
    LengthPairs,
    PhoneSequence,
}

/// Legacy per-format switches. At most one may be set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatFlags {
    pub custom: bool,
    pub mlf: bool,
    pub ctm: bool,
    pub write_lengths: bool,
}

impl OutputFormat {
    pub const ALL: [Self; 5] = [
        Self::Custom,
        Self::Mlf,
        Self::Ctm,
        Self::LengthPairs,
        Self::PhoneSequence,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Custom => "custom",
            Self::Mlf => "mlf",
            Self::Ctm => "ctm",
            Self::LengthPairs => "length-pairs",
            Self::PhoneSequence => "phone-sequence",
        }
    }

    /// Returns `None` when no flag is set.
    pub fn from_flags(flags: FormatFlags) -> Result<Option<Self>, AlignmentError> {
        let selected = [
            (flags.custom, Self::Custom),
            (flags.mlf, Self::Mlf),
            (flags.ctm, Self::Ctm),
            (flags.write_lengths, Self::LengthPairs),
        ]
        .into_iter()
        .filter_map(|(on, format)| on.then_some(format))
        .collect::<Vec<_>>();

        match selected.as_slice() {
            [] => Ok(None),
            [one] => Ok(Some(*one)),
            many => Err(AlignmentError::config(format!(
                "only one output format may be selected, got {}",
                many.iter()
                    .map(|f| f.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = AlignmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.as_str() == s)
            .ok_or_else(|| AlignmentError::config(format!("unrecognized output format '{s}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmitOptions {
    pub frame_shift_secs: f32,
    /// Phone sequence format only: one entry per frame instead of per run.
    pub per_frame: bool,
}

/// Serializes decoded unit paths into the configured format.
///
/// Each utterance is rendered in full before a single `write_all`, so one
/// record never interleaves with another on a shared sink.
pub struct AlignmentEmitter<W: Write> {
    sink: W,
    format: OutputFormat,
    options: EmitOptions,
    records: usize,
}

impl<W: Write> AlignmentEmitter<W> {
    pub fn new(sink: W, format: OutputFormat, options: EmitOptions) -> Result<Self, AlignmentError> {
        if !(options.frame_shift_secs.is_finite() && options.frame_shift_secs > 0.0) {
            return Err(AlignmentError::config(format!(
                "frame shift must be positive, got {}",
                options.frame_shift_secs
            )));
        }
        if options.per_frame && format != OutputFormat::PhoneSequence {
            tracing::warn!(
                format = format.as_str(),
                "per-frame output only applies to the phone-sequence format"
            );
        }
        Ok(Self {
            sink,
            format,
            options,
            records: 0,
        })
    }

    pub fn records_written(&self) -> usize {
        self.records
    }

    pub fn emit(
        &mut self,
        utterance: &str,
        units: &[UnitId],
        symbols: &SymbolTables,
        transitions: &dyn TransitionModel,
    ) -> Result<(), AlignmentError> {
        if units.is_empty() {
            return Err(AlignmentError::invalid_input(format!(
                "empty alignment for '{utterance}' reached the emitter"
            )));
        }
        let runs = split_to_phones(units, |unit| transitions.phone_of(unit))?;
        let frame_shift = self.options.frame_shift_secs;

        let mut record = String::new();
        match self.format {
            OutputFormat::Custom => {
                custom::render(&mut record, utterance, &runs, &symbols.phones, frame_shift)?
            }
            OutputFormat::Mlf => {
                if self.records == 0 {
                    record.push_str(MLF_HEADER);
                    record.push('\n');
                }
                mlf::render(
                    &mut record,
                    utterance,
                    &runs,
                    units,
                    transitions,
                    &symbols.phones,
                    frame_shift,
                )?
            }
            OutputFormat::Ctm => ctm::render(&mut record, utterance, &runs, frame_shift),
            OutputFormat::LengthPairs => archive::render_length_pairs(&mut record, utterance, &runs),
            OutputFormat::PhoneSequence => archive::render_phone_sequence(
                &mut record,
                utterance,
                &runs,
                self.options.per_frame,
            ),
        }

        self.sink
            .write_all(record.as_bytes())
            .map_err(|e| AlignmentError::io("write alignment record", e))?;
        self.records += 1;
        tracing::debug!(
            utterance,
            runs = runs.len(),
            frames = units.len(),
            "emitter: wrote record"
        );
        Ok(())
    }

    pub fn finish(mut self) -> Result<W, AlignmentError> {
        self.sink
            .flush()
            .map_err(|e| AlignmentError::io("flush alignment output", e))?;
        Ok(self.sink)
    }
}
