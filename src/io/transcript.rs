use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::AlignmentError;

/// Transcript source consumed in lockstep with the audio source. Line `n`
/// must carry the key of audio entry `n`.
pub struct TranscriptReader<R> {
    reader: R,
    line: String,
    line_no: usize,
}

impl TranscriptReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, AlignmentError> {
        let file = File::open(path).map_err(|e| AlignmentError::io("open transcripts", e))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> TranscriptReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            line_no: 0,
        }
    }

    /// Reads the next line and checks that it belongs to `utterance`.
    /// Returns the transcript tokens with the key stripped.
    pub fn next_for(&mut self, utterance: &str) -> Result<Vec<String>, AlignmentError> {
        self.line.clear();
        let read = self
            .reader
            .read_line(&mut self.line)
            .map_err(|e| AlignmentError::io("read transcript line", e))?;
        self.line_no += 1;
        if read == 0 {
            return Err(AlignmentError::transcript_mismatch(
                utterance,
                "transcript source is exhausted",
            ));
        }

        let mut fields = self.line.split_whitespace();
        let Some(key) = fields.next() else {
            return Err(AlignmentError::transcript_mismatch(
                utterance,
                format!("transcript line {} is blank", self.line_no),
            ));
        };
        let tokens: Vec<String> = fields.map(str::to_string).collect();
        if tokens.is_empty() {
            return Err(AlignmentError::EmptyTranscript {
                utterance: utterance.to_string(),
            });
        }
        if key != utterance {
            return Err(AlignmentError::transcript_mismatch(
                utterance,
                format!("transcript line {} has key '{key}'", self.line_no),
            ));
        }
        Ok(tokens)
    }
}
