//! Read-only lookup tables shared by the tokenizer, the graph compiler and the
//! output writers. Loaded once per run.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::Path;

use crate::error::AlignmentError;
use crate::io::table;
use crate::types::{PhoneId, WordId};

/// `word -> id`, read from `<word> <id>` lines.
#[derive(Debug, Clone, Default)]
pub struct WordTable {
    ids: HashMap<String, WordId>,
}

impl WordTable {
    pub fn load(path: &Path) -> Result<Self, AlignmentError> {
        let contents = table::read_to_string(path, "read word symbol table")?;
        Self::parse(&contents, path)
    }

    pub fn parse(contents: &str, origin: &Path) -> Result<Self, AlignmentError> {
        let mut ids = HashMap::new();
        for row in table::pairs(contents, origin) {
            let (line, word, raw_id) = row?;
            let id = table::parse_id(origin, line, raw_id)?;
            match ids.entry(word.to_string()) {
                Entry::Occupied(_) => {
                    return Err(AlignmentError::malformed(
                        origin,
                        line,
                        format!("duplicate word '{word}'"),
                    ))
                }
                Entry::Vacant(slot) => {
                    slot.insert(id);
                }
            }
        }
        Ok(Self { ids })
    }

    pub fn get(&self, word: &str) -> Option<WordId> {
        self.ids.get(word).copied()
    }

    /// Like [`WordTable::get`] but a miss is fatal.
    pub fn id_of(&self, word: &str) -> Result<WordId, AlignmentError> {
        self.get(word)
            .ok_or_else(|| AlignmentError::unknown_symbol("word symbol table", word))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, WordId)> for WordTable {
    fn from_iter<I: IntoIterator<Item = (S, WordId)>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(|(w, id)| (w.into(), id)).collect(),
        }
    }
}

/// `phone id -> label`. Lines are `<label> <id>`; `<id> <label>` is accepted
/// when only the first field is numeric.
#[derive(Debug, Clone, Default)]
pub struct PhoneTable {
    labels: HashMap<PhoneId, String>,
    ids: HashMap<String, PhoneId>,
}

impl PhoneTable {
    pub fn load(path: &Path) -> Result<Self, AlignmentError> {
        let contents = table::read_to_string(path, "read phone symbol table")?;
        Self::parse(&contents, path)
    }

    pub fn parse(contents: &str, origin: &Path) -> Result<Self, AlignmentError> {
        let mut phones = Self::default();
        for row in table::pairs(contents, origin) {
            let (line, first, second) = row?;
            let (label, id) = match (first.parse::<u32>(), second.parse::<u32>()) {
                (Ok(id), Err(_)) => (second, id),
                _ => (first, table::parse_id(origin, line, second)?),
            };
            if phones.labels.contains_key(&id) {
                return Err(AlignmentError::malformed(
                    origin,
                    line,
                    format!("duplicate phone id {id}"),
                ));
            }
            if phones.ids.contains_key(label) {
                return Err(AlignmentError::malformed(
                    origin,
                    line,
                    format!("duplicate phone '{label}'"),
                ));
            }
            phones.labels.insert(id, label.to_string());
            phones.ids.insert(label.to_string(), id);
        }
        Ok(phones)
    }

    pub fn get(&self, id: PhoneId) -> Option<&str> {
        self.labels.get(&id).map(String::as_str)
    }

    pub fn label(&self, id: PhoneId) -> Result<&str, AlignmentError> {
        self.get(id)
            .ok_or_else(|| AlignmentError::unknown_symbol("phone symbol table", id.to_string()))
    }

    pub fn id_of(&self, label: &str) -> Result<PhoneId, AlignmentError> {
        self.ids
            .get(label)
            .copied()
            .ok_or_else(|| AlignmentError::unknown_symbol("phone symbol table", label))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(PhoneId, S)> for PhoneTable {
    fn from_iter<I: IntoIterator<Item = (PhoneId, S)>>(iter: I) -> Self {
        let mut phones = Self::default();
        for (id, label) in iter {
            let label = label.into();
            phones.ids.insert(label.clone(), id);
            phones.labels.insert(id, label);
        }
        phones
    }
}

/// Run-scoped lookup context passed by reference into the tokenizer and the
/// emitter.
#[derive(Debug, Clone, Default)]
pub struct SymbolTables {
    pub words: WordTable,
    pub phones: PhoneTable,
}

impl SymbolTables {
    pub fn load(word_table: &Path, phone_table: &Path) -> Result<Self, AlignmentError> {
        let words = WordTable::load(word_table)?;
        let phones = PhoneTable::load(phone_table)?;
        tracing::info!(
            words = words.len(),
            phones = phones.len(),
            "loaded symbol tables"
        );
        Ok(Self { words, phones })
    }
}

/// Pronunciation lexicon, `<WORD> <phone> <phone> ...` per line, resolved to
/// ids. Only the first pronunciation of a word is kept.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    pronunciations: HashMap<WordId, Vec<PhoneId>>,
}

impl Lexicon {
    pub fn load(path: &Path, symbols: &SymbolTables) -> Result<Self, AlignmentError> {
        let contents = table::read_to_string(path, "read lexicon")?;
        Self::parse(&contents, path, symbols)
    }

    pub fn parse(contents: &str, origin: &Path, symbols: &SymbolTables) -> Result<Self, AlignmentError> {
        let mut pronunciations = HashMap::new();
        let mut alternates = 0usize;
        for row in table::rows(contents) {
            let Some((word, phones)) = row.fields.split_first() else {
                continue;
            };
            if phones.is_empty() {
                return Err(AlignmentError::malformed(
                    origin,
                    row.line,
                    format!("word '{word}' has no pronunciation"),
                ));
            }
            let word_id = symbols.words.id_of(word)?;
            let phone_ids = phones
                .iter()
                .map(|p| symbols.phones.id_of(p))
                .collect::<Result<Vec<_>, _>>()?;
            match pronunciations.entry(word_id) {
                Entry::Occupied(_) => alternates += 1,
                Entry::Vacant(slot) => {
                    slot.insert(phone_ids);
                }
            }
        }
        if alternates > 0 {
            tracing::debug!(alternates, "lexicon: ignored alternative pronunciations");
        }
        Ok(Self { pronunciations })
    }

    pub fn pronunciation(&self, word: WordId) -> Option<&[PhoneId]> {
        self.pronunciations.get(&word).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.pronunciations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pronunciations.is_empty()
    }
}

impl FromIterator<(WordId, Vec<PhoneId>)> for Lexicon {
    fn from_iter<I: IntoIterator<Item = (WordId, Vec<PhoneId>)>>(iter: I) -> Self {
        Self {
            pronunciations: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> &'static Path {
        Path::new("test.txt")
    }

    #[test]
    fn word_table_parses_word_then_id() {
        let words = WordTable::parse("<UNK> 1\nHELLO 2\n你好 3\n", origin()).unwrap();
        assert_eq!(words.len(), 3);
        assert_eq!(words.get("你好"), Some(3));
        assert!(words.id_of("WORLD").is_err());
    }

    #[test]
    fn word_table_rejects_three_fields() {
        let err = WordTable::parse("HELLO 2 extra\n", origin()).unwrap_err();
        assert!(matches!(err, AlignmentError::MalformedTable { line: 1, .. }));
    }

    #[test]
    fn word_table_rejects_duplicates() {
        let err = WordTable::parse("A 1\nA 2\n", origin()).unwrap_err();
        assert!(matches!(err, AlignmentError::MalformedTable { line: 2, .. }));
    }

    #[test]
    fn phone_table_accepts_both_column_orders() {
        let label_first = PhoneTable::parse("sil 1\na1 7\n", origin()).unwrap();
        assert_eq!(label_first.label(7).unwrap(), "a1");
        let id_first = PhoneTable::parse("1 sil\n7 a1\n", origin()).unwrap();
        assert_eq!(id_first.label(7).unwrap(), "a1");
        assert_eq!(id_first.id_of("sil").unwrap(), 1);
    }

    #[test]
    fn phone_table_rejects_non_numeric_ids() {
        assert!(PhoneTable::parse("sil one\n", origin()).is_err());
    }

    #[test]
    fn lexicon_resolves_words_and_phones() {
        let symbols = SymbolTables {
            words: [("HELLO", 2)].into_iter().collect(),
            phones: [(3, "h"), (4, "e"), (5, "l"), (6, "o")].into_iter().collect(),
        };
        let lexicon =
            Lexicon::parse("HELLO h e l o\nHELLO h e l l o\n", origin(), &symbols).unwrap();
        assert_eq!(lexicon.pronunciation(2), Some(&[3, 4, 5, 6][..]));
    }

    #[test]
    fn lexicon_rejects_unknown_phone() {
        let symbols = SymbolTables {
            words: [("HELLO", 2)].into_iter().collect(),
            phones: [(3, "h")].into_iter().collect(),
        };
        let err = Lexicon::parse("HELLO h x\n", origin(), &symbols).unwrap_err();
        assert!(matches!(err, AlignmentError::UnknownSymbol { .. }));
    }
}
