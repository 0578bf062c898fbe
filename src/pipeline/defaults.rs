use std::collections::HashMap;
use std::path::Path;

use candle_core::Tensor;

use crate::alignment::tokenization::{segment_words, SegmentOptions};
use crate::error::AlignmentError;
use crate::io::table;
use crate::io::text_archive::{read_int_vector_archive, read_matrix_archive};
use crate::pipeline::traits::{
    AcousticDecoder, FeatureExtractor, GraphCompiler, PitchExtractor, Tokenizer, TransitionModel,
};
use crate::symbols::{Lexicon, WordTable};
use crate::types::{DecodedPath, DecodingGraph, PhoneId, TokenSequence, UnitId, WordId};

pub struct ForwardMaxMatchTokenizer {
    options: SegmentOptions,
}

impl ForwardMaxMatchTokenizer {
    pub fn new(options: SegmentOptions) -> Self {
        Self { options }
    }
}

impl Default for ForwardMaxMatchTokenizer {
    fn default() -> Self {
        Self::new(SegmentOptions::default())
    }
}

impl Tokenizer for ForwardMaxMatchTokenizer {
    fn tokenize(
        &self,
        raw_tokens: &[String],
        words: &WordTable,
    ) -> Result<TokenSequence, AlignmentError> {
        segment_words(raw_tokens, words, &self.options)
    }
}

/// Precomputed feature matrices keyed by utterance id.
///
/// Serves either stream: spectral features (the warp factor is assumed to be
/// baked in already) or pitch features.
pub struct ArchiveFeatureExtractor {
    matrices: HashMap<String, Tensor>,
}

impl ArchiveFeatureExtractor {
    pub fn load(path: &Path) -> Result<Self, AlignmentError> {
        let matrices = read_matrix_archive(path)?;
        tracing::info!(
            path = %path.display(),
            utterances = matrices.len(),
            "features: loaded archive"
        );
        Ok(Self { matrices })
    }

    pub fn from_matrices(matrices: HashMap<String, Tensor>) -> Self {
        Self { matrices }
    }

    fn lookup(&self, utterance: &str) -> Result<Tensor, AlignmentError> {
        self.matrices.get(utterance).cloned().ok_or_else(|| {
            AlignmentError::runtime(
                "feature archive lookup",
                format!("no matrix for '{utterance}'"),
            )
        })
    }
}

impl FeatureExtractor for ArchiveFeatureExtractor {
    fn extract(
        &self,
        utterance: &str,
        _waveform: &[f32],
        _sample_rate_hz: u32,
        warp: f32,
    ) -> Result<Tensor, AlignmentError> {
        if warp != 1.0 {
            tracing::debug!(utterance, warp, "features: archive ignores warp factor");
        }
        self.lookup(utterance)
    }
}

impl PitchExtractor for ArchiveFeatureExtractor {
    fn extract(
        &self,
        utterance: &str,
        _waveform: &[f32],
        _sample_rate_hz: u32,
    ) -> Result<Tensor, AlignmentError> {
        self.lookup(utterance)
    }
}

/// Builds a linear graph from first pronunciations. Takes ownership of the
/// lexicon.
pub struct LexiconGraphCompiler {
    lexicon: Lexicon,
}

impl LexiconGraphCompiler {
    pub fn new(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }
}

impl GraphCompiler for LexiconGraphCompiler {
    fn compile(&self, word_ids: &[WordId]) -> Result<DecodingGraph, AlignmentError> {
        let pronunciations = word_ids
            .iter()
            .map(|&word| {
                self.lexicon
                    .pronunciation(word)
                    .map(<[PhoneId]>::to_vec)
                    .ok_or_else(|| {
                        AlignmentError::unknown_symbol("lexicon", word.to_string())
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DecodingGraph {
            word_ids: word_ids.to_vec(),
            pronunciations,
        })
    }
}

/// Replays unit paths from a Kaldi text archive (`utt u1 u2 ...`).
pub struct ArchiveDecoder {
    paths: HashMap<String, Vec<UnitId>>,
}

impl ArchiveDecoder {
    pub fn load(path: &Path) -> Result<Self, AlignmentError> {
        let paths = read_int_vector_archive(path)?;
        tracing::info!(
            path = %path.display(),
            utterances = paths.len(),
            "decoder: loaded alignment archive"
        );
        Ok(Self { paths })
    }

    pub fn from_paths(paths: HashMap<String, Vec<UnitId>>) -> Self {
        Self { paths }
    }
}

impl AcousticDecoder for ArchiveDecoder {
    fn decode(
        &self,
        utterance: &str,
        features: &Tensor,
        graph: DecodingGraph,
    ) -> Result<DecodedPath, AlignmentError> {
        let units = self.paths.get(utterance).ok_or_else(|| {
            AlignmentError::runtime("archive decode", format!("no path for '{utterance}'"))
        })?;
        let (frames, _) = features
            .dims2()
            .map_err(|e| AlignmentError::tensor("read feature shape", e))?;
        if units.len() != frames {
            return Err(AlignmentError::runtime(
                "archive decode",
                format!(
                    "path for '{utterance}' has {} frames, features have {frames}",
                    units.len()
                ),
            ));
        }
        tracing::debug!(
            utterance,
            frames,
            graph_states = graph.num_states(),
            "decoder: replayed path"
        );
        Ok(DecodedPath {
            units: units.clone(),
            log_likelihood: None,
        })
    }
}

/// `unit phone pdf_class` per line.
#[derive(Debug, Clone, Default)]
pub struct TableTransitionModel {
    units: HashMap<UnitId, (PhoneId, u32)>,
}

impl TableTransitionModel {
    pub fn load(path: &Path) -> Result<Self, AlignmentError> {
        let contents = table::read_to_string(path, "read transition table")?;
        Self::parse(&contents, path)
    }

    pub fn parse(contents: &str, origin: &Path) -> Result<Self, AlignmentError> {
        let mut units = HashMap::new();
        for row in table::rows(contents) {
            let [unit, phone, pdf_class] = row.fields.as_slice() else {
                return Err(AlignmentError::malformed(
                    origin,
                    row.line,
                    format!("expected 3 fields, got {}", row.fields.len()),
                ));
            };
            let unit = table::parse_id(origin, row.line, unit)?;
            let entry = (
                table::parse_id(origin, row.line, phone)?,
                table::parse_id(origin, row.line, pdf_class)?,
            );
            if units.insert(unit, entry).is_some() {
                return Err(AlignmentError::malformed(
                    origin,
                    row.line,
                    format!("duplicate unit {unit}"),
                ));
            }
        }
        Ok(Self { units })
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl FromIterator<(UnitId, PhoneId, u32)> for TableTransitionModel {
    fn from_iter<I: IntoIterator<Item = (UnitId, PhoneId, u32)>>(iter: I) -> Self {
        Self {
            units: iter
                .into_iter()
                .map(|(unit, phone, pdf_class)| (unit, (phone, pdf_class)))
                .collect(),
        }
    }
}

impl TransitionModel for TableTransitionModel {
    fn unit_to_phone(&self, unit: UnitId) -> Option<PhoneId> {
        self.units.get(&unit).map(|&(phone, _)| phone)
    }

    fn unit_to_pdf_class(&self, unit: UnitId) -> Option<u32> {
        self.units.get(&unit).map(|&(_, pdf_class)| pdf_class)
    }
}
