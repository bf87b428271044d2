//! Screening annotations persisted as CSV.
//!
//! One row per file, keyed by path, with the columns
//! `path,keep,note,bin_width_ms,timing_resolution,loader_hint`. The whole
//! table is read on open and rewritten on every save; concurrent writers
//! are not coordinated.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// CSV header line.
pub const HEADER: [&str; 6] = [
    "path",
    "keep",
    "note",
    "bin_width_ms",
    "timing_resolution",
    "loader_hint",
];

/// Default results file name.
pub const DEFAULT_RESULTS_FILE: &str = "screening_results.csv";

/// One screening decision.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub path: String,
    pub keep: bool,
    pub note: String,
    pub bin_width_ms: f64,
    pub timing_resolution: f64,
    pub loader_hint: String,
}

impl Annotation {
    /// Creates an annotation with an empty note and no loader hint.
    #[must_use]
    pub fn new(
        path: impl Into<String>,
        keep: bool,
        bin_width_ms: f64,
        timing_resolution: f64,
    ) -> Self {
        Self {
            path: path.into(),
            keep,
            note: String::new(),
            bin_width_ms,
            timing_resolution,
            loader_hint: String::new(),
        }
    }

    /// Sets the free-text note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    /// Sets the loader hint.
    #[must_use]
    pub fn with_loader_hint(mut self, hint: impl Into<String>) -> Self {
        self.loader_hint = hint.into();
        self
    }

    fn from_fields(fields: &[String], line: usize) -> Result<Self> {
        if fields.len() != HEADER.len() {
            return Err(Error::InvalidFormat(format!(
                "annotation row {line}: expected {} fields, found {}",
                HEADER.len(),
                fields.len()
            )));
        }
        let float = |idx: usize| -> Result<f64> {
            let text = fields[idx].trim();
            if text.is_empty() {
                return Ok(f64::NAN);
            }
            text.parse().map_err(|_| {
                Error::InvalidFormat(format!(
                    "annotation row {line}: bad {} value '{text}'",
                    HEADER[idx]
                ))
            })
        };
        Ok(Self {
            path: fields[0].clone(),
            keep: parse_bool(&fields[1]),
            note: fields[2].clone(),
            bin_width_ms: float(3)?,
            timing_resolution: float(4)?,
            loader_hint: fields[5].clone(),
        })
    }

    fn to_fields(&self) -> [String; 6] {
        [
            self.path.clone(),
            if self.keep { "True" } else { "False" }.to_string(),
            self.note.clone(),
            self.bin_width_ms.to_string(),
            self.timing_resolution.to_string(),
            self.loader_hint.clone(),
        ]
    }
}

/// Annotation table bound to a CSV file.
#[derive(Debug, Clone)]
pub struct AnnotationStore {
    path: PathBuf,
    rows: Vec<Annotation>,
}

impl AnnotationStore {
    /// Opens the store, reading existing rows if the file exists.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let rows = if path.exists() {
            let text = fs::read_to_string(&path)?;
            parse_rows(&text)?
        } else {
            Vec::new()
        };
        log::debug!("opened {} with {} annotations", path.display(), rows.len());
        Ok(Self { path, rows })
    }

    /// Empty store bound to `path`; nothing is read.
    #[must_use]
    pub fn empty<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            rows: Vec::new(),
        }
    }

    /// Backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All rows in file order.
    #[must_use]
    pub fn rows(&self) -> &[Annotation] {
        &self.rows
    }

    /// Number of annotated files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if nothing is annotated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Annotation for a file path, if any.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Annotation> {
        self.rows.iter().find(|row| row.path == path)
    }

    /// Replaces the row with the same path or appends a new one.
    pub fn upsert(&mut self, annotation: Annotation) {
        match self.rows.iter_mut().find(|row| row.path == annotation.path) {
            Some(row) => *row = annotation,
            None => self.rows.push(annotation),
        }
    }

    /// Rewrites the whole file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", HEADER.join(","))?;
        for row in &self.rows {
            let fields: Vec<String> = row.to_fields().iter().map(|f| quote(f)).collect();
            writeln!(writer, "{}", fields.join(","))?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn parse_bool(text: &str) -> bool {
    matches!(
        text.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Splits CSV text into records, honouring quoted fields.
fn split_records(text: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    records
}

fn parse_rows(text: &str) -> Result<Vec<Annotation>> {
    let mut records = split_records(text).into_iter();
    match records.next() {
        None => return Ok(Vec::new()),
        Some(header) if header.iter().map(String::as_str).eq(HEADER) => {}
        Some(header) => {
            return Err(Error::InvalidFormat(format!(
                "unexpected annotation header: {}",
                header.join(",")
            )))
        }
    }
    records
        .enumerate()
        .filter(|(_, fields)| !(fields.len() == 1 && fields[0].is_empty()))
        .map(|(i, fields)| Annotation::from_fields(&fields, i + 2))
        .collect()
}
