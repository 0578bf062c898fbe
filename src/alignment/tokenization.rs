use std::sync::OnceLock;

use regex::Regex;

use crate::error::AlignmentError;
use crate::symbols::WordTable;
use crate::types::TokenSequence;

/// Longest candidate tried by forward maximum matching, in characters.
pub const MAX_MATCH_CHARS: usize = 20;
pub const DEFAULT_OOV_SYMBOL: &str = "<UNK>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentOptions {
    /// When false, tokens are ASCII-uppercased before any lookup.
    pub case_sensitive: bool,
    /// Spell unmatched Latin runs letter by letter instead of mapping them
    /// to the OOV symbol.
    pub spell_oov: bool,
    pub oov_symbol: String,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            spell_oov: true,
            oov_symbol: DEFAULT_OOV_SYMBOL.to_string(),
        }
    }
}

/// ASCII word characters only, so CJK runs never take the Latin branch.
fn latin_word() -> &'static Regex {
    static LATIN_WORD: OnceLock<Regex> = OnceLock::new();
    LATIN_WORD.get_or_init(|| Regex::new(r"^(?-u:\w)+$").expect("latin word pattern is valid"))
}

/// Maps whitespace-delimited transcript tokens (key already stripped) to
/// dictionary words.
///
/// Whole-token dictionary hits are kept as is. Anything else is segmented by
/// forward maximum matching over characters:
/// - a Latin run longer than one character is atomic: a hit, its spelling, or
///   one OOV unit;
/// - otherwise the longest dictionary hit wins;
/// - an unmatched single character becomes one OOV unit.
///
/// Every spelled letter and the OOV symbol must be in the dictionary.
pub fn segment_words<S: AsRef<str>>(
    raw_tokens: &[S],
    words: &WordTable,
    options: &SegmentOptions,
) -> Result<TokenSequence, AlignmentError> {
    let mut out = TokenSequence::default();
    for raw in raw_tokens {
        let token = if options.case_sensitive {
            raw.as_ref().to_string()
        } else {
            raw.as_ref().to_ascii_uppercase()
        };
        if let Some(id) = words.get(&token) {
            out.push(token, id);
            continue;
        }
        segment_fmm(&token, words, options, &mut out)?;
    }
    Ok(out)
}

fn segment_fmm(
    token: &str,
    words: &WordTable,
    options: &SegmentOptions,
    out: &mut TokenSequence,
) -> Result<(), AlignmentError> {
    let chars: Vec<char> = token.chars().collect();
    let mut index = 0;
    while index < chars.len() {
        let mut len = (chars.len() - index).min(MAX_MATCH_CHARS);
        loop {
            let candidate: String = chars[index..index + len].iter().collect();

            if len > 1 && latin_word().is_match(&candidate) {
                if let Some(id) = words.get(&candidate) {
                    out.push(candidate, id);
                } else if options.spell_oov {
                    tracing::debug!(word = candidate.as_str(), "tokenizer: spelling oov latin run");
                    for letter in candidate.chars() {
                        let letter = letter.to_string();
                        let id = words.id_of(&letter)?;
                        out.push(letter, id);
                    }
                } else {
                    tracing::debug!(word = candidate.as_str(), "tokenizer: oov latin run");
                    push_oov(out, words, options)?;
                }
                break;
            }

            if let Some(id) = words.get(&candidate) {
                out.push(candidate, id);
                break;
            }

            if len == 1 {
                tracing::debug!(character = candidate.as_str(), "tokenizer: oov character");
                push_oov(out, words, options)?;
                break;
            }
            len -= 1;
        }
        index += len;
    }
    Ok(())
}

fn push_oov(
    out: &mut TokenSequence,
    words: &WordTable,
    options: &SegmentOptions,
) -> Result<(), AlignmentError> {
    let id = words.id_of(&options.oov_symbol)?;
    out.push(options.oov_symbol.clone(), id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNK: u32 = 1;

    fn dictionary() -> WordTable {
        let mut entries = vec![
            ("<UNK>".to_string(), UNK),
            ("HELLO".to_string(), 2),
            ("WORLD".to_string(), 3),
            ("甲乙".to_string(), 4),
            ("甲".to_string(), 5),
            ("你好".to_string(), 6),
        ];
        for (offset, letter) in ('A'..='Z').enumerate() {
            entries.push((letter.to_string(), 100 + offset as u32));
        }
        entries.into_iter().collect()
    }

    fn segment(tokens: &[&str], options: &SegmentOptions) -> TokenSequence {
        segment_words(tokens, &dictionary(), options).unwrap()
    }

    #[test]
    fn whole_token_hit_is_one_unit() {
        let seq = segment(&["HELLO", "WORLD"], &SegmentOptions::default());
        assert_eq!(seq.words, ["HELLO", "WORLD"]);
        assert_eq!(seq.ids, [2, 3]);
    }

    #[test]
    fn case_insensitive_mode_uppercases_before_lookup() {
        let seq = segment(&["hello"], &SegmentOptions::default());
        assert_eq!(seq.ids, [2]);
    }

    #[test]
    fn case_sensitive_mode_needs_lowercase_letters_for_spelling() {
        let options = SegmentOptions {
            case_sensitive: true,
            ..SegmentOptions::default()
        };
        let err = segment_words(&["hello"], &dictionary(), &options).unwrap_err();
        assert!(matches!(err, AlignmentError::UnknownSymbol { .. }));
    }

    #[test]
    fn dictionary_word_survives_surrounding_oov_text() {
        let seq = segment(&["丙HELLO丁"], &SegmentOptions::default());
        assert_eq!(seq.words, ["<UNK>", "HELLO", "<UNK>"]);
        assert_eq!(seq.ids, [UNK, 2, UNK]);
    }

    #[test]
    fn oov_latin_run_is_spelled_when_enabled() {
        let seq = segment(&["XYZ"], &SegmentOptions::default());
        assert_eq!(seq.words, ["X", "Y", "Z"]);
        assert_eq!(seq.ids, [123, 124, 125]);
    }

    #[test]
    fn oov_latin_run_is_one_unknown_when_spelling_disabled() {
        let options = SegmentOptions {
            spell_oov: false,
            ..SegmentOptions::default()
        };
        let seq = segment(&["XYZ"], &options);
        assert_eq!(seq.words, ["<UNK>"]);
        assert_eq!(seq.ids, [UNK]);
    }

    #[test]
    fn non_latin_span_prefers_longest_match_then_continues() {
        let seq = segment(&["甲乙丙"], &SegmentOptions::default());
        assert_eq!(seq.words, ["甲乙", "<UNK>"]);
        assert_eq!(seq.ids, [4, UNK]);
    }

    #[test]
    fn non_latin_span_shrinks_to_shorter_hit() {
        let seq = segment(&["甲丙你好"], &SegmentOptions::default());
        assert_eq!(seq.words, ["甲", "<UNK>", "你好"]);
    }

    #[test]
    fn latin_run_is_matched_atomically_inside_mixed_script_token() {
        let seq = segment(&["你好HELLO"], &SegmentOptions::default());
        assert_eq!(seq.words, ["你好", "HELLO"]);
    }

    #[test]
    fn single_unknown_ascii_character_is_oov_not_spelled() {
        let seq = segment(&["丙1"], &SegmentOptions::default());
        assert_eq!(seq.words, ["<UNK>", "<UNK>"]);
    }

    #[test]
    fn long_latin_run_is_cut_at_window_size() {
        let run = "ABCDEFGHIJKLMNOPQRSTUVWXY";
        let seq = segment(&[run], &SegmentOptions::default());
        assert_eq!(seq.len(), run.len());
        assert_eq!(seq.words.concat(), run);
    }

    #[test]
    fn missing_oov_symbol_is_fatal() {
        let words: WordTable = [("HELLO", 2)].into_iter().collect();
        let err = segment_words(&["丙"], &words, &SegmentOptions::default()).unwrap_err();
        assert!(matches!(err, AlignmentError::UnknownSymbol { .. }));
    }

    #[test]
    fn every_input_character_is_covered_in_order() {
        let seq = segment(&["HELLO", "甲乙", "QQ"], &SegmentOptions::default());
        assert_eq!(seq.words, ["HELLO", "甲乙", "Q", "Q"]);
    }
}
