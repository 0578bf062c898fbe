pub type WordId = u32;
pub type PhoneId = u32;
/// Decoder state id (a transition id in most toolkits).
pub type UnitId = u32;

/// Word units produced by the tokenizer. `words[i]` resolves to `ids[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSequence {
    pub words: Vec<String>,
    pub ids: Vec<WordId>,
}

impl TokenSequence {
    pub fn push(&mut self, word: impl Into<String>, id: WordId) {
        self.words.push(word.into());
        self.ids.push(id);
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, WordId)> + '_ {
        self.words
            .iter()
            .map(String::as_str)
            .zip(self.ids.iter().copied())
    }
}

#[derive(Debug, Clone)]
pub struct WaveData {
    pub sample_rate_hz: u32,
    /// One buffer per channel, samples scaled to [-1, 1].
    pub channels: Vec<Vec<f32>>,
}

impl WaveData {
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn num_samples(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate_hz == 0 {
            return 0.0;
        }
        self.num_samples() as f64 / self.sample_rate_hz as f64
    }
}

/// Frame-level unit path returned by the decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPath {
    pub units: Vec<UnitId>,
    pub log_likelihood: Option<f64>,
}

/// Maximal run of frames sharing one phone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhoneRun {
    pub phone: PhoneId,
    pub start_frame: usize,
    pub num_frames: usize,
}

impl PhoneRun {
    pub fn end_frame(&self) -> usize {
        self.start_frame + self.num_frames
    }
}

/// Maximal run of frames inside a phone run sharing one pdf class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubStateRun {
    pub pdf_class: u32,
    pub num_frames: usize,
}

/// Graph accepting exactly one word sequence, each word expanded to its
/// pronunciation. Handed to the decoder by value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodingGraph {
    pub word_ids: Vec<WordId>,
    pub pronunciations: Vec<Vec<PhoneId>>,
}

impl DecodingGraph {
    pub fn num_states(&self) -> usize {
        self.pronunciations.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.num_states() == 0
    }
}
