use crate::config::AlignerConfig;
use crate::error::AlignmentError;
use crate::pipeline::defaults::ForwardMaxMatchTokenizer;
use crate::pipeline::runtime::{ForcedAligner, ForcedAlignerParts, WarpSource};
use crate::pipeline::traits::{
    AcousticDecoder, FeatureExtractor, GraphCompiler, PitchExtractor, Tokenizer,
};

pub struct ForcedAlignerBuilder {
    config: AlignerConfig,
    tokenizer: Option<Box<dyn Tokenizer>>,
    feature_extractor: Option<Box<dyn FeatureExtractor>>,
    pitch_extractor: Option<Box<dyn PitchExtractor>>,
    graph_compiler: Option<Box<dyn GraphCompiler>>,
    decoder: Option<Box<dyn AcousticDecoder>>,
    warp_source: Option<WarpSource>,
}

impl ForcedAlignerBuilder {
    pub fn new(config: AlignerConfig) -> Self {
        Self {
            config,
            tokenizer: None,
            feature_extractor: None,
            pitch_extractor: None,
            graph_compiler: None,
            decoder: None,
            warp_source: None,
        }
    }

    pub fn with_tokenizer(mut self, tokenizer: Box<dyn Tokenizer>) -> Self {
        self.tokenizer = Some(tokenizer);
        self
    }

    pub fn with_feature_extractor(mut self, feature_extractor: Box<dyn FeatureExtractor>) -> Self {
        self.feature_extractor = Some(feature_extractor);
        self
    }

    pub fn with_pitch_extractor(mut self, pitch_extractor: Box<dyn PitchExtractor>) -> Self {
        self.pitch_extractor = Some(pitch_extractor);
        self
    }

    pub fn with_graph_compiler(mut self, graph_compiler: Box<dyn GraphCompiler>) -> Self {
        self.graph_compiler = Some(graph_compiler);
        self
    }

    pub fn with_decoder(mut self, decoder: Box<dyn AcousticDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    pub fn with_warp_source(mut self, warp_source: WarpSource) -> Self {
        self.warp_source = Some(warp_source);
        self
    }

    /// Validates the config, boosts silence pdfs when asked to, and wires the
    /// collaborators together. The tokenizer and warp source have defaults.
    pub fn build(self) -> Result<ForcedAligner, AlignmentError> {
        self.config.validate()?;

        let feature_extractor = self
            .feature_extractor
            .ok_or_else(|| AlignmentError::config("no feature extractor configured"))?;
        let graph_compiler = self
            .graph_compiler
            .ok_or_else(|| AlignmentError::config("no graph compiler configured"))?;
        let mut decoder = self
            .decoder
            .ok_or_else(|| AlignmentError::config("no acoustic decoder configured"))?;

        if self.config.boost_silence != 1.0 {
            let boosted =
                decoder.boost_silence(&self.config.silence_phones, self.config.boost_silence)?;
            tracing::info!(
                pdfs = boosted,
                factor = self.config.boost_silence,
                "Boosted weights for {boosted} pdfs, by factor of {}",
                self.config.boost_silence
            );
        }

        let segment_options = self.config.segment_options();
        let warp_source = self
            .warp_source
            .unwrap_or(WarpSource::Fixed(self.config.vtln_warp));

        Ok(ForcedAligner::from_parts(ForcedAlignerParts {
            config: self.config,
            tokenizer: self
                .tokenizer
                .unwrap_or_else(|| Box::new(ForwardMaxMatchTokenizer::new(segment_options))),
            feature_extractor,
            pitch_extractor: self.pitch_extractor,
            graph_compiler,
            decoder,
            warp_source,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use candle_core::{DType, Device, Tensor};

    use super::*;
    use crate::types::{DecodedPath, DecodingGraph, PhoneId, WaveData, WordId};

    struct MockFeatures;

    impl FeatureExtractor for MockFeatures {
        fn extract(
            &self,
            _utterance: &str,
            _waveform: &[f32],
            _sample_rate_hz: u32,
            warp: f32,
        ) -> Result<Tensor, AlignmentError> {
            let frames = if warp == 1.0 { 10 } else { 20 };
            Tensor::zeros((frames, 2), DType::F32, &Device::Cpu)
                .map_err(|e| AlignmentError::tensor("zeros", e))
        }
    }

    struct MockCompiler;

    impl GraphCompiler for MockCompiler {
        fn compile(&self, word_ids: &[WordId]) -> Result<DecodingGraph, AlignmentError> {
            Ok(DecodingGraph {
                word_ids: word_ids.to_vec(),
                pronunciations: vec![vec![7]; word_ids.len()],
            })
        }
    }

    struct MockDecoder {
        boosted: Arc<AtomicUsize>,
    }

    impl AcousticDecoder for MockDecoder {
        fn decode(
            &self,
            _utterance: &str,
            features: &Tensor,
            _graph: DecodingGraph,
        ) -> Result<DecodedPath, AlignmentError> {
            let (frames, _) = features
                .dims2()
                .map_err(|e| AlignmentError::tensor("dims", e))?;
            Ok(DecodedPath {
                units: vec![70; frames],
                log_likelihood: None,
            })
        }

        fn boost_silence(
            &mut self,
            silence_phones: &[PhoneId],
            _factor: f32,
        ) -> Result<usize, AlignmentError> {
            self.boosted.store(silence_phones.len() * 3, Ordering::SeqCst);
            Ok(silence_phones.len() * 3)
        }
    }

    fn mock_builder(config: AlignerConfig, boosted: Arc<AtomicUsize>) -> ForcedAlignerBuilder {
        ForcedAlignerBuilder::new(config)
            .with_feature_extractor(Box::new(MockFeatures))
            .with_graph_compiler(Box::new(MockCompiler))
            .with_decoder(Box::new(MockDecoder { boosted }))
    }

    fn one_second() -> WaveData {
        WaveData {
            sample_rate_hz: 16_000,
            channels: vec![vec![0.0; 16_000]],
        }
    }

    #[test]
    fn build_success_with_mock_collaborators() {
        let aligner = mock_builder(AlignerConfig::default(), Arc::default())
            .build()
            .expect("build should succeed");
        let tokens = aligner
            .tokenize(&["hello".to_string()], &[("HELLO", 2)].into_iter().collect())
            .unwrap();
        let path = aligner.align("U1", &one_second(), &tokens.ids).unwrap();
        assert_eq!(path.units.len(), 10);
    }

    #[test]
    fn build_fails_without_required_collaborators() {
        let result = ForcedAlignerBuilder::new(AlignerConfig::default())
            .with_feature_extractor(Box::new(MockFeatures))
            .build();
        assert!(matches!(result, Err(AlignmentError::Config { .. })));
    }

    #[test]
    fn build_fails_on_invalid_config() {
        let config = AlignerConfig {
            frame_shift_secs: -0.01,
            ..AlignerConfig::default()
        };
        assert!(mock_builder(config, Arc::default()).build().is_err());
    }

    #[test]
    fn silence_boost_only_runs_when_factor_differs_from_one() {
        let boosted = Arc::new(AtomicUsize::new(0));
        mock_builder(AlignerConfig::default(), boosted.clone())
            .build()
            .unwrap();
        assert_eq!(boosted.load(Ordering::SeqCst), 0);

        let config = AlignerConfig {
            boost_silence: 1.5,
            silence_phones: vec![1, 2],
            ..AlignerConfig::default()
        };
        mock_builder(config, boosted.clone()).build().unwrap();
        assert_eq!(boosted.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn warp_source_defaults_to_configured_warp() {
        let config = AlignerConfig {
            vtln_warp: 0.9,
            ..AlignerConfig::default()
        };
        let aligner = mock_builder(config, Arc::default()).build().unwrap();
        let path = aligner.align("U1", &one_second(), &[2]).unwrap();
        assert_eq!(path.units.len(), 20);
    }
}
