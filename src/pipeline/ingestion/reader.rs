use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::domain::{Cell, RawRow};
use crate::error::{IngestError, Result};

/// Forward-only rows held in memory
pub struct VecReader {
    rows: std::vec::IntoIter<RawRow>,
}

impl VecReader {
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self {
            rows: rows.into_iter(),
        }
    }
}

impl Iterator for VecReader {
    type Item = Result<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next().map(Ok)
    }
}

/// Rows exported as newline-delimited JSON, one array of cells per line.
///
/// Blank lines are skipped and do not count as rows, so `RowDecode::row_index`
/// matches the position the controller sees. A line that is not a JSON array
/// yields a row-level `RowDecode` error; read failures are passed through as
/// I/O errors.
pub struct NdjsonReader<R: BufRead> {
    lines: std::io::Lines<R>,
    line_no: usize,
    row_index: usize,
}

impl NdjsonReader<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> NdjsonReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            row_index: 0,
        }
    }
}

impl<R: BufRead> Iterator for NdjsonReader<R> {
    type Item = Result<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            let row_index = self.row_index;
            self.row_index += 1;
            return Some(decode_line(&line, row_index, self.line_no));
        }
    }
}

fn decode_line(line: &str, row_index: usize, line_no: usize) -> Result<RawRow> {
    let value: serde_json::Value =
        serde_json::from_str(line).map_err(|e| IngestError::RowDecode {
            row_index,
            message: format!("line {line_no}: {e}"),
        })?;
    match value {
        serde_json::Value::Array(items) => Ok(RawRow::new(items.iter().map(Cell::from).collect())),
        other => Err(IngestError::RowDecode {
            row_index,
            message: format!("line {line_no}: expected an array of cells, found {other}"),
        }),
    }
}
