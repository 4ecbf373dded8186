use crate::error::ParseError;
use std::collections::HashSet;
use std::io::Read;

/// Raw CSV contents: header names plus rectangular string rows.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Read CSV data from any reader. The first record is the header.
///
/// Short records are padded with empty (missing) fields; records longer than
/// the header are rejected. Whitespace around every field is trimmed, unlike
/// pandas' `read_csv`, so ` x` and `x` are the same category.
pub fn read_csv<R: Read>(reader: R) -> Result<CsvData, ParseError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let raw_headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    if raw_headers.is_empty() {
        return Err(ParseError::MissingHeader);
    }
    let headers = dedupe_headers(raw_headers);
    let expected = headers.len();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        if record.len() > expected {
            return Err(ParseError::TooManyFields {
                line: record.position().map(|p| p.line()).unwrap_or(0),
                expected,
                found: record.len(),
            });
        }
        let mut row: Vec<String> = record.iter().map(|f| f.to_string()).collect();
        row.resize(expected, String::new());
        rows.push(row);
    }

    Ok(CsvData { headers, rows })
}

/// Give blank headers a positional name and suffix repeated ones (`a`, `a.1`, `a.2`).
fn dedupe_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(raw.len());

    for (idx, name) in raw.into_iter().enumerate() {
        let base = if name.is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            name
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while seen.contains(&candidate) {
            candidate = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        seen.insert(candidate.clone());
        out.push(candidate);
    }

    out
}
