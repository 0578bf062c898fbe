use std::collections::HashMap;
use std::path::Path;

use crate::alignment::fusion::fuse_streams;
use crate::config::AlignerConfig;
use crate::error::{AlignmentError, SkipReason};
use crate::io::table;
use crate::pipeline::traits::{
    AcousticDecoder, FeatureExtractor, GraphCompiler, PitchExtractor, Tokenizer,
};
use crate::symbols::WordTable;
use crate::types::{DecodedPath, TokenSequence, WaveData, WordId};

/// Where the per-utterance VTLN warp factor comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum WarpSource {
    Fixed(f32),
    /// Keyed by utterance id, or by speaker id when `utt2spk` is present.
    Map {
        warps: HashMap<String, f32>,
        utt2spk: Option<HashMap<String, String>>,
    },
}

impl WarpSource {
    pub fn load(
        fixed_warp: f32,
        vtln_map: Option<&Path>,
        utt2spk: Option<&Path>,
    ) -> Result<Self, AlignmentError> {
        let Some(map_path) = vtln_map else {
            if utt2spk.is_some() {
                return Err(AlignmentError::config(
                    "utt2spk was given without a vtln map",
                ));
            }
            return Ok(Self::Fixed(fixed_warp));
        };

        let contents = table::read_to_string(map_path, "read vtln map")?;
        let mut warps = HashMap::new();
        for pair in table::pairs(&contents, map_path) {
            let (line, key, raw) = pair?;
            let warp = raw.parse::<f32>().map_err(|_| {
                AlignmentError::malformed(map_path, line, format!("'{raw}' is not a warp factor"))
            })?;
            warps.insert(key.to_string(), warp);
        }

        let utt2spk = match utt2spk {
            Some(path) => {
                let contents = table::read_to_string(path, "read utt2spk")?;
                let mut speakers = HashMap::new();
                for pair in table::pairs(&contents, path) {
                    let (_, utt, spk) = pair?;
                    speakers.insert(utt.to_string(), spk.to_string());
                }
                Some(speakers)
            }
            None => None,
        };
        tracing::info!(
            entries = warps.len(),
            by_speaker = utt2spk.is_some(),
            "warp: loaded vtln map"
        );
        Ok(Self::Map { warps, utt2spk })
    }

    pub fn warp_for(&self, utterance: &str) -> Option<f32> {
        match self {
            Self::Fixed(warp) => Some(*warp),
            Self::Map { warps, utt2spk } => {
                let key = match utt2spk {
                    Some(speakers) => speakers.get(utterance)?.as_str(),
                    None => utterance,
                };
                warps.get(key).copied()
            }
        }
    }
}

/// The channel and warp chosen for one utterance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreparedUtterance<'w> {
    pub waveform: &'w [f32],
    pub sample_rate_hz: u32,
    pub warp: f32,
}

/// Per-utterance alignment: features, graph, decode.
pub struct ForcedAligner {
    config: AlignerConfig,
    tokenizer: Box<dyn Tokenizer>,
    feature_extractor: Box<dyn FeatureExtractor>,
    pitch_extractor: Option<Box<dyn PitchExtractor>>,
    graph_compiler: Box<dyn GraphCompiler>,
    decoder: Box<dyn AcousticDecoder>,
    warp_source: WarpSource,
}

pub(crate) struct ForcedAlignerParts {
    pub config: AlignerConfig,
    pub tokenizer: Box<dyn Tokenizer>,
    pub feature_extractor: Box<dyn FeatureExtractor>,
    pub pitch_extractor: Option<Box<dyn PitchExtractor>>,
    pub graph_compiler: Box<dyn GraphCompiler>,
    pub decoder: Box<dyn AcousticDecoder>,
    pub warp_source: WarpSource,
}

impl ForcedAligner {
    pub(crate) fn from_parts(parts: ForcedAlignerParts) -> Self {
        Self {
            config: parts.config,
            tokenizer: parts.tokenizer,
            feature_extractor: parts.feature_extractor,
            pitch_extractor: parts.pitch_extractor,
            graph_compiler: parts.graph_compiler,
            decoder: parts.decoder,
            warp_source: parts.warp_source,
        }
    }

    pub fn tokenize(
        &self,
        raw_tokens: &[String],
        words: &WordTable,
    ) -> Result<TokenSequence, AlignmentError> {
        self.tokenizer.tokenize(raw_tokens, words)
    }

    /// A rate mismatch means the whole run is misconfigured.
    pub fn check_sample_rate(&self, utterance: &str, wave: &WaveData) -> Result<(), AlignmentError> {
        if wave.sample_rate_hz != self.config.expected_sample_rate_hz {
            return Err(AlignmentError::invalid_input(format!(
                "sample rate of '{utterance}' is {} Hz, expected {} Hz",
                wave.sample_rate_hz, self.config.expected_sample_rate_hz
            )));
        }
        Ok(())
    }

    /// Duration, channel and warp checks; the cheap skips that come before
    /// the fatal sample-rate check.
    pub fn prepare<'w>(
        &self,
        utterance: &str,
        wave: &'w WaveData,
    ) -> Result<PreparedUtterance<'w>, SkipReason> {
        let duration_secs = wave.duration_secs();
        if duration_secs < self.config.min_duration_secs {
            return Err(SkipReason::TooShort { duration_secs });
        }

        let channel = match self.config.channel {
            Some(channel) => channel,
            None => {
                if wave.num_channels() > 1 {
                    tracing::warn!(
                        utterance,
                        channels = wave.num_channels(),
                        "multi-channel audio without a channel choice; using channel 0"
                    );
                }
                0
            }
        };
        let waveform = wave
            .channels
            .get(channel)
            .ok_or(SkipReason::ChannelMissing {
                available: wave.num_channels(),
                requested: channel,
            })?;

        let warp = self
            .warp_source
            .warp_for(utterance)
            .ok_or(SkipReason::MissingWarp)?;

        Ok(PreparedUtterance {
            waveform,
            sample_rate_hz: wave.sample_rate_hz,
            warp,
        })
    }

    /// Features, graph and decode for an utterance that passed [`Self::prepare`].
    pub fn align_prepared(
        &self,
        utterance: &str,
        input: &PreparedUtterance<'_>,
        word_ids: &[WordId],
    ) -> Result<DecodedPath, SkipReason> {
        let spectral = self
            .feature_extractor
            .extract(utterance, input.waveform, input.sample_rate_hz, input.warp)
            .map_err(|e| SkipReason::FeatureExtraction(e.to_string()))?;
        let mut streams = vec![spectral];
        if let Some(pitch_extractor) = &self.pitch_extractor {
            let pitch = pitch_extractor
                .extract(utterance, input.waveform, input.sample_rate_hz)
                .map_err(|e| SkipReason::PitchExtraction(e.to_string()))?;
            streams.push(pitch);
        }
        let features = fuse_streams(&streams, self.config.length_tolerance)?;

        let graph = match self.graph_compiler.compile(word_ids) {
            Ok(graph) if !graph.is_empty() => graph,
            Ok(_) => return Err(SkipReason::EmptyGraph),
            Err(err) => {
                tracing::debug!(utterance, error = %err, "graph compilation failed");
                return Err(SkipReason::EmptyGraph);
            }
        };

        let frames = features.dims2().map(|(rows, _)| rows).unwrap_or(0);
        if frames == 0 {
            return Err(SkipReason::ZeroLengthFeatures);
        }

        let path = self
            .decoder
            .decode(utterance, &features, graph)
            .map_err(|e| SkipReason::DecodeFailed(e.to_string()))?;
        if path.units.is_empty() {
            return Err(SkipReason::EmptyPath);
        }
        tracing::debug!(
            utterance,
            frames,
            warp = input.warp,
            log_likelihood = ?path.log_likelihood,
            "aligned utterance"
        );
        Ok(path)
    }

    /// [`Self::prepare`] followed by [`Self::align_prepared`], without the
    /// sample-rate check.
    pub fn align(
        &self,
        utterance: &str,
        wave: &WaveData,
        word_ids: &[WordId],
    ) -> Result<DecodedPath, SkipReason> {
        let input = self.prepare(utterance, wave)?;
        self.align_prepared(utterance, &input, word_ids)
    }
}
