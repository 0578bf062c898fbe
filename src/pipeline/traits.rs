use candle_core::Tensor;

use crate::error::AlignmentError;
use crate::symbols::WordTable;
use crate::types::{DecodedPath, DecodingGraph, PhoneId, TokenSequence, UnitId, WordId};

pub trait Tokenizer: Send + Sync {
    fn tokenize(
        &self,
        raw_tokens: &[String],
        words: &WordTable,
    ) -> Result<TokenSequence, AlignmentError>;
}

/// Spectral features for one utterance, `frames x dims`.
pub trait FeatureExtractor: Send + Sync {
    fn extract(
        &self,
        utterance: &str,
        waveform: &[f32],
        sample_rate_hz: u32,
        warp: f32,
    ) -> Result<Tensor, AlignmentError>;
}

/// Post-processed pitch features for one utterance, `frames x dims`.
pub trait PitchExtractor: Send + Sync {
    fn extract(
        &self,
        utterance: &str,
        waveform: &[f32],
        sample_rate_hz: u32,
    ) -> Result<Tensor, AlignmentError>;
}

pub trait GraphCompiler: Send + Sync {
    fn compile(&self, word_ids: &[WordId]) -> Result<DecodingGraph, AlignmentError>;
}

pub trait AcousticDecoder: Send + Sync {
    /// Consumes the graph; nothing else holds it afterwards.
    fn decode(
        &self,
        utterance: &str,
        features: &Tensor,
        graph: DecodingGraph,
    ) -> Result<DecodedPath, AlignmentError>;

    /// Scales the weights of the pdfs owned by `silence_phones`. Returns how
    /// many pdfs were touched.
    fn boost_silence(
        &mut self,
        _silence_phones: &[PhoneId],
        _factor: f32,
    ) -> Result<usize, AlignmentError> {
        Ok(0)
    }
}

/// Unit metadata owned by the acoustic model.
pub trait TransitionModel: Send + Sync {
    fn unit_to_phone(&self, unit: UnitId) -> Option<PhoneId>;
    fn unit_to_pdf_class(&self, unit: UnitId) -> Option<u32>;

    fn phone_of(&self, unit: UnitId) -> Result<PhoneId, AlignmentError> {
        self.unit_to_phone(unit)
            .ok_or_else(|| AlignmentError::unknown_symbol("transition model", unit.to_string()))
    }

    fn pdf_class_of(&self, unit: UnitId) -> Result<u32, AlignmentError> {
        self.unit_to_pdf_class(unit)
            .ok_or_else(|| AlignmentError::unknown_symbol("transition model", unit.to_string()))
    }
}
