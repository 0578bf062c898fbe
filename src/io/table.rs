use std::path::Path;

use crate::error::AlignmentError;

/// One non-blank line of a whitespace-separated table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TableRow<'a> {
    /// 1-based line number in the source file.
    pub line: usize,
    pub fields: Vec<&'a str>,
}

pub(crate) fn read_to_string(path: &Path, context: &'static str) -> Result<String, AlignmentError> {
    std::fs::read_to_string(path).map_err(|e| AlignmentError::io(context, e))
}

pub(crate) fn rows(contents: &str) -> impl Iterator<Item = TableRow<'_>> {
    contents.lines().enumerate().filter_map(|(idx, raw)| {
        let fields: Vec<&str> = raw.split_whitespace().collect();
        if fields.is_empty() {
            None
        } else {
            Some(TableRow {
                line: idx + 1,
                fields,
            })
        }
    })
}

/// Rows that must have exactly two fields, e.g. `key value`.
pub(crate) fn pairs<'a>(
    contents: &'a str,
    origin: &'a Path,
) -> impl Iterator<Item = Result<(usize, &'a str, &'a str), AlignmentError>> + 'a {
    rows(contents).map(move |row| match row.fields.as_slice() {
        [first, second] => Ok((row.line, *first, *second)),
        other => Err(AlignmentError::malformed(
            origin,
            row.line,
            format!("expected 2 fields, got {}", other.len()),
        )),
    })
}

pub(crate) fn parse_id(origin: &Path, line: usize, raw: &str) -> Result<u32, AlignmentError> {
    raw.parse::<u32>().map_err(|_| {
        AlignmentError::malformed(origin, line, format!("'{raw}' is not a non-negative integer id"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_skipped_and_numbered_from_one() {
        let rows = rows("a 1\n\n  \nb 2\n").collect::<Vec<_>>();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].line, 1);
        assert_eq!(rows[1].line, 4);
        assert_eq!(rows[1].fields, vec!["b", "2"]);
    }

    #[test]
    fn pairs_reject_wrong_field_count() {
        let origin = Path::new("t.txt");
        let parsed = pairs("a 1\nb 2 3\n", origin).collect::<Vec<_>>();
        assert!(parsed[0].is_ok());
        let err = parsed[1].as_ref().unwrap_err().to_string();
        assert!(err.contains("line 2"), "{err}");
    }

    #[test]
    fn parse_id_rejects_negative_values() {
        assert!(parse_id(Path::new("t"), 1, "-1").is_err());
        assert_eq!(parse_id(Path::new("t"), 1, "17").unwrap(), 17);
    }
}
