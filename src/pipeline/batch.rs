use std::collections::BTreeMap;
use std::io::{BufRead, Write};

use crate::error::AlignmentError;
use crate::io::TranscriptReader;
use crate::output::AlignmentEmitter;
use crate::pipeline::runtime::ForcedAligner;
use crate::pipeline::traits::TransitionModel;
use crate::symbols::SymbolTables;
use crate::types::WaveData;

const PROGRESS_INTERVAL: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub succeeded: usize,
    /// Skipped utterances by `SkipReason::kind`.
    pub skipped: BTreeMap<&'static str, usize>,
}

impl BatchSummary {
    pub fn num_skipped(&self) -> usize {
        self.skipped.values().sum()
    }
}

/// Aligns every audio entry in order, reading one transcript line per entry.
///
/// Per-utterance failures are counted and skipped. Transcript, symbol, sample
/// rate and output errors abort the batch. The sample rate is only checked
/// once the duration, channel and warp checks have passed.
pub fn run_batch<A, R, W>(
    audio: A,
    transcripts: &mut TranscriptReader<R>,
    aligner: &ForcedAligner,
    symbols: &SymbolTables,
    transitions: &dyn TransitionModel,
    emitter: &mut AlignmentEmitter<W>,
) -> Result<BatchSummary, AlignmentError>
where
    A: IntoIterator<Item = Result<(String, WaveData), AlignmentError>>,
    R: BufRead,
    W: Write,
{
    let mut summary = BatchSummary::default();
    for entry in audio {
        let (utterance, wave) = entry?;
        summary.processed += 1;
        let span = tracing::debug_span!("utterance", id = utterance.as_str());
        let _guard = span.enter();
        tracing::debug!("processing");

        let raw_tokens = transcripts.next_for(&utterance)?;
        let tokens = aligner.tokenize(&raw_tokens, &symbols.words)?;
        tracing::debug!(words = ?tokens.words, "tokenized transcript");

        let aligned = match aligner.prepare(&utterance, &wave) {
            Ok(input) => {
                aligner.check_sample_rate(&utterance, &wave)?;
                aligner.align_prepared(&utterance, &input, &tokens.ids)
            }
            Err(reason) => Err(reason),
        };
        match aligned {
            Ok(path) => {
                emitter.emit(&utterance, &path.units, symbols, transitions)?;
                summary.succeeded += 1;
            }
            Err(reason) => {
                tracing::warn!(utterance = utterance.as_str(), reason = reason.kind(), "{reason}");
                *summary.skipped.entry(reason.kind()).or_default() += 1;
            }
        }

        if summary.processed % PROGRESS_INTERVAL == 0 {
            tracing::info!("Processed {} utterances", summary.processed);
        }
    }

    tracing::info!(
        succeeded = summary.succeeded,
        processed = summary.processed,
        skipped = ?summary.skipped,
        "Done {} out of {} utterances.",
        summary.succeeded,
        summary.processed
    );
    Ok(summary)
}
