//! Keyed text archives exported by the acoustic toolkit:
//! matrices as `utt [ row \n row ]` and integer vectors as `utt v1 v2 ...`.

use std::collections::HashMap;
use std::path::Path;

use candle_core::{Device, Tensor};

use crate::error::AlignmentError;
use crate::io::table;

pub fn read_matrix_archive(path: &Path) -> Result<HashMap<String, Tensor>, AlignmentError> {
    let contents = table::read_to_string(path, "read feature archive")?;
    parse_matrix_archive(&contents, path)
}

pub fn parse_matrix_archive(
    contents: &str,
    origin: &Path,
) -> Result<HashMap<String, Tensor>, AlignmentError> {
    let mut out = HashMap::new();
    let mut open: Option<(String, usize, Vec<Vec<f32>>)> = None;

    for (idx, line) in contents.lines().enumerate() {
        let line_no = idx + 1;
        let mut tokens = line.split_whitespace().peekable();
        if tokens.peek().is_none() {
            continue;
        }

        if open.is_none() {
            let key = tokens.next().unwrap_or_default();
            if tokens.next() != Some("[") {
                return Err(AlignmentError::malformed(
                    origin,
                    line_no,
                    format!("expected '[' after key '{key}'"),
                ));
            }
            open = Some((key.to_string(), line_no, Vec::new()));
        }

        let mut row = Vec::new();
        let mut closed = false;
        for tok in tokens {
            if closed {
                return Err(AlignmentError::malformed(
                    origin,
                    line_no,
                    format!("unexpected '{tok}' after ']'"),
                ));
            }
            if tok == "]" {
                closed = true;
                continue;
            }
            let value = tok.parse::<f32>().map_err(|_| {
                AlignmentError::malformed(origin, line_no, format!("'{tok}' is not a number"))
            })?;
            row.push(value);
        }

        if let Some((_, _, rows)) = open.as_mut() {
            if !row.is_empty() {
                rows.push(row);
            }
        }
        if closed {
            if let Some((key, start_line, rows)) = open.take() {
                let matrix = rows_to_tensor(rows, origin, start_line)?;
                if out.insert(key.clone(), matrix).is_some() {
                    return Err(AlignmentError::malformed(
                        origin,
                        start_line,
                        format!("duplicate key '{key}'"),
                    ));
                }
            }
        }
    }

    if let Some((key, start_line, _)) = open {
        return Err(AlignmentError::malformed(
            origin,
            start_line,
            format!("matrix for '{key}' is not closed with ']'"),
        ));
    }
    Ok(out)
}

fn rows_to_tensor(rows: Vec<Vec<f32>>, origin: &Path, line: usize) -> Result<Tensor, AlignmentError> {
    let num_rows = rows.len();
    let num_cols = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|r| r.len() != num_cols) {
        return Err(AlignmentError::malformed(
            origin,
            line,
            "matrix rows have different lengths",
        ));
    }
    let flat: Vec<f32> = rows.into_iter().flatten().collect();
    Tensor::from_vec(flat, (num_rows, num_cols), &Device::Cpu)
        .map_err(|e| AlignmentError::tensor("build feature matrix", e))
}

pub fn read_int_vector_archive(path: &Path) -> Result<HashMap<String, Vec<u32>>, AlignmentError> {
    let contents = table::read_to_string(path, "read alignment archive")?;
    parse_int_vector_archive(&contents, path)
}

pub fn parse_int_vector_archive(
    contents: &str,
    origin: &Path,
) -> Result<HashMap<String, Vec<u32>>, AlignmentError> {
    let mut out = HashMap::new();
    for row in table::rows(contents) {
        let Some((key, values)) = row.fields.split_first() else {
            continue;
        };
        let values = values
            .iter()
            .map(|v| table::parse_id(origin, row.line, v))
            .collect::<Result<Vec<_>, _>>()?;
        if out.insert(key.to_string(), values).is_some() {
            return Err(AlignmentError::malformed(
                origin,
                row.line,
                format!("duplicate key '{key}'"),
            ));
        }
    }
    Ok(out)
}
