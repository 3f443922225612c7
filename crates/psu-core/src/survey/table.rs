//! In-memory column store for one country's survey responses.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx};

use crate::error::{PsuError, Result};

/// One survey cell. Numeric codes dominate; identifiers may be text.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Parse a raw text field: blank → missing, numeric → number, else text.
    pub fn parse(raw: &str) -> Self {
        let t = raw.trim();
        if t.is_empty() {
            return Cell::Missing;
        }
        match t.parse::<f64>() {
            Ok(v) => Cell::from_f64(v),
            Err(_) => Cell::Text(t.to_string()),
        }
    }

    /// Numeric cell, with non-finite values treated as missing.
    pub fn from_f64(v: f64) -> Self {
        if v.is_finite() {
            Cell::Number(v)
        } else {
            Cell::Missing
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// CSV rendering. Integral numbers print without a fractional part so that
    /// response codes read as codes.
    pub fn render(&self) -> String {
        match self {
            Cell::Missing => String::new(),
            Cell::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{}", *v as i64),
            Cell::Number(v) => format!("{v}"),
            Cell::Text(s) => s.clone(),
        }
    }
}

fn cell_from_xlsx(d: &Data) -> Cell {
    match d {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::from_f64(*f),
        Data::String(s) => Cell::parse(s),
        Data::Bool(b) => Cell::Number(if *b { 1.0 } else { 0.0 }),
        Data::Empty | Data::Error(_) => Cell::Missing,
        other => Cell::Text(other.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Column-major table; every column holds exactly `n_rows` cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SurveyTable {
    columns: Vec<Column>,
    n_rows: usize,
}

impl SurveyTable {
    pub fn new(n_rows: usize) -> Self {
        Self {
            columns: Vec::new(),
            n_rows,
        }
    }

    /// Build from a header and row-major records. Short rows are padded with
    /// missing cells; surplus cells are ignored.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let n_rows = rows.len();
        let mut columns: Vec<Column> = headers
            .into_iter()
            .map(|h| Column::new(h, Vec::with_capacity(n_rows)))
            .collect();
        for row in rows {
            let mut it = row.into_iter();
            for col in columns.iter_mut() {
                col.cells.push(it.next().unwrap_or(Cell::Missing));
            }
        }
        Self { columns, n_rows }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// Append a column whose length matches the table's row count.
    pub fn push(&mut self, column: Column) -> Result<()> {
        if column.cells.len() != self.n_rows {
            return Err(PsuError::ColumnLength {
                name: column.name,
                got: column.cells.len(),
                expected: self.n_rows,
            });
        }
        self.columns.push(column);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<Column> {
        let idx = self.columns.iter().position(|c| c.name == name)?;
        Some(self.columns.remove(idx))
    }

    // ── Readers ──────────────────────────────────────────────────────────────

    pub fn read_csv<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            rows.push(record.iter().map(Cell::parse).collect());
        }
        Ok(Self::from_rows(headers, rows))
    }

    /// First worksheet; first row is the header.
    pub fn read_xlsx(path: &Path) -> Result<Self> {
        let mut workbook: Xlsx<_> = open_workbook(path)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| PsuError::EmptyTable(path.to_path_buf()))??;
        let mut rows = range.rows();
        let headers: Vec<String> = rows
            .next()
            .ok_or_else(|| PsuError::EmptyTable(path.to_path_buf()))?
            .iter()
            .map(|d| d.to_string().trim().to_string())
            .collect();
        let body = rows.map(|r| r.iter().map(cell_from_xlsx).collect()).collect();
        Ok(Self::from_rows(headers, body))
    }

    /// Dispatch on extension: `.xlsx` via calamine, anything else as CSV.
    pub fn read_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PsuError::MissingDataset(path.to_path_buf()));
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("xlsx") => Self::read_xlsx(path),
            _ => Self::read_csv(fs::File::open(path)?),
        }
    }

    // ── Writers ──────────────────────────────────────────────────────────────

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(self.headers())?;
        for r in 0..self.n_rows {
            wtr.write_record(self.columns.iter().map(|c| c.cells[r].render()))?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write_csv_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        self.write_csv(fs::File::create(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_classifies_fields() {
        assert_eq!(Cell::parse(""), Cell::Missing);
        assert_eq!(Cell::parse("  "), Cell::Missing);
        assert_eq!(Cell::parse("97"), Cell::Number(97.0));
        assert_eq!(Cell::parse("0.8731"), Cell::Number(0.8731));
        assert_eq!(Cell::parse("NaN"), Cell::Missing);
        assert_eq!(Cell::parse("KEN0001"), Cell::Text("KEN0001".into()));
    }

    #[test]
    fn render_prints_codes_as_integers() {
        assert_eq!(Cell::Number(3.0).render(), "3");
        assert_eq!(Cell::Number(-1.0).render(), "-1");
        assert_eq!(Cell::Number(1.25).render(), "1.25");
        assert_eq!(Cell::Missing.render(), "");
    }

    #[test]
    fn csv_read_pads_short_rows() {
        let text = "Respondent number,Q1. Age\nKEN0001,34\nKEN0002\n";
        let t = SurveyTable::read_csv(text.as_bytes()).unwrap();
        assert_eq!(t.n_rows(), 2);
        assert_eq!(t.column("Q1. Age").unwrap().cells, vec![Cell::Number(34.0), Cell::Missing]);
    }

    #[test]
    fn csv_write_is_deterministic() {
        let t = SurveyTable::from_rows(
            vec!["Q1".into(), "Respondent".into()],
            vec![
                vec![Cell::Number(34.0), Cell::Text("A, B".into())],
                vec![Cell::Missing, Cell::Text("C".into())],
            ],
        );
        let mut a = Vec::new();
        let mut b = Vec::new();
        t.write_csv(&mut a).unwrap();
        t.write_csv(&mut b).unwrap();
        assert_eq!(a, b);
        assert_eq!(String::from_utf8(a).unwrap(), "Q1,Respondent\n34,\"A, B\"\n,C\n");
    }

    #[test]
    fn remove_and_push_keep_row_count() {
        let mut t = SurveyTable::from_rows(vec!["a".into(), "b".into()], vec![vec![Cell::Number(1.0)]]);
        let b = t.remove("b").unwrap();
        assert_eq!(b.cells, vec![Cell::Missing]);
        t.push(b.renamed("c")).unwrap();
        assert_eq!(t.headers().collect::<Vec<_>>(), vec!["a", "c"]);
    }

    #[test]
    fn push_rejects_mismatched_length() {
        let mut t = SurveyTable::new(2);
        let err = t.push(Column::new("short", vec![Cell::Number(1.0)])).unwrap_err();
        assert!(matches!(err, PsuError::ColumnLength { got: 1, expected: 2, .. }));
        assert_eq!(t.columns().len(), 0);
        t.push(Column::new("full", vec![Cell::Missing, Cell::Number(2.0)])).unwrap();
        assert_eq!(t.n_rows(), 2);
    }
}
