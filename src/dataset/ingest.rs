//! Dataset ingestion from delimited text files.
//!
//! Each source has a header row naming its columns. Only the text and label
//! columns are read; everything else is ignored. Sources are concatenated in
//! the order they are given.
//!
//! ```text
//! tweet_id,sentiment,author,content
//! 1956967341,empty,xoshayzers,@tiffanylue i know  i was listenin to bad habit earlier
//! 1956967666,sadness,wannamama,Layin n bed with a headache  ughhhh...waitin on your call...
//! ```

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::dataset::{LabeledSample, RawSample};
use crate::emotion::canonicalize;
use crate::error::{EmogifError, Result};

/// One delimited source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSource {
    pub path: PathBuf,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

fn default_delimiter() -> char {
    ','
}

impl DatasetSource {
    pub fn new<P: Into<PathBuf>>(path: P, delimiter: char) -> Self {
        DatasetSource {
            path: path.into(),
            delimiter,
        }
    }
}

/// Names of the columns holding the text and the label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSpec {
    pub text: String,
    pub label: String,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        ColumnSpec {
            text: "content".to_string(),
            label: "emotion".to_string(),
        }
    }
}

/// Row counts for one source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub path: PathBuf,
    /// Data records read, including the skipped first record.
    pub read: usize,
    pub skipped_first: usize,
    pub dropped_missing: usize,
    pub dropped_invalid_label: usize,
    pub kept: usize,
}

/// Reads labeled rows from a list of sources.
#[derive(Debug, Clone)]
pub struct DatasetIngestor {
    sources: Vec<DatasetSource>,
    columns: ColumnSpec,
}

impl DatasetIngestor {
    pub fn new(sources: Vec<DatasetSource>, columns: ColumnSpec) -> Self {
        DatasetIngestor { sources, columns }
    }

    /// Read every source, canonicalize labels and concatenate the rows.
    ///
    /// Fails when a source cannot be read, lacks one of the named columns, or
    /// when no row survives filtering.
    pub fn ingest(&self) -> Result<Vec<LabeledSample>> {
        let mut samples = Vec::new();

        for source in &self.sources {
            let (rows, report) = self.ingest_source(source)?;
            info!(
                "Read {} rows from {} ({} dropped for missing fields, {} for unknown labels, {} kept)",
                report.read,
                report.path.display(),
                report.dropped_missing,
                report.dropped_invalid_label,
                report.kept
            );
            samples.extend(rows);
        }

        if samples.is_empty() {
            return Err(EmogifError::dataset(
                "no labeled rows were found in the configured sources",
            ));
        }

        Ok(samples)
    }

    /// Read a single source.
    pub fn ingest_source(
        &self,
        source: &DatasetSource,
    ) -> Result<(Vec<LabeledSample>, IngestReport)> {
        let raw = self.read_raw(source)?;
        let mut report = IngestReport {
            path: source.path.clone(),
            read: raw.len(),
            ..Default::default()
        };

        let mut samples = Vec::with_capacity(raw.len());
        // The first data record of every source is discarded.
        for row in raw.into_iter().skip(1) {
            match row {
                None => report.dropped_missing += 1,
                Some(RawSample { text, emotion_raw }) => match canonicalize(&emotion_raw) {
                    Some(emotion) => samples.push(LabeledSample { text, emotion }),
                    None => report.dropped_invalid_label += 1,
                },
            }
        }
        report.skipped_first = report.read.min(1);
        report.kept = samples.len();

        if report.kept == 0 {
            warn!("{} contributed no labeled rows", source.path.display());
        }

        Ok((samples, report))
    }

    /// Read the two named columns of every record. `None` marks a record with
    /// a missing or empty field.
    fn read_raw(&self, source: &DatasetSource) -> Result<Vec<Option<RawSample>>> {
        if !source.delimiter.is_ascii() {
            return Err(EmogifError::config(format!(
                "delimiter {:?} of {} is not a single-byte character",
                source.delimiter,
                source.path.display()
            )));
        }

        let file = open_source(&source.path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(source.delimiter as u8)
            .flexible(true)
            .from_reader(file);

        let headers = reader.headers()?.clone();
        let text_idx = column_index(&headers, &self.columns.text, &source.path)?;
        let label_idx = column_index(&headers, &self.columns.label, &source.path)?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let text = record.get(text_idx).filter(|v| !v.trim().is_empty());
            let label = record.get(label_idx).filter(|v| !v.trim().is_empty());
            rows.push(match (text, label) {
                (Some(text), Some(label)) => Some(RawSample {
                    text: text.to_string(),
                    emotion_raw: label.to_string(),
                }),
                _ => None,
            });
        }

        Ok(rows)
    }
}

fn open_source(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| {
        EmogifError::dataset(format!("cannot open dataset {}: {e}", path.display()))
    })
}

fn column_index(headers: &StringRecord, name: &str, path: &Path) -> Result<usize> {
    headers
        .iter()
        .position(|header| header.trim() == name)
        .ok_or_else(|| {
            EmogifError::dataset(format!(
                "column `{name}` not found in {}",
                path.display()
            ))
        })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::emotion::Emotion;

    fn write_source(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_first_record_is_skipped_and_labels_folded() {
        let file = write_source(
            "content;emotion\n\
             first row;joy\n\
             so glad;joy\n\
             this is awful;hate\n\
             bored now;boredom\n\
             ;sad\n\
             hello;\n\
             feeling low;Worry\n",
        );
        let ingestor = DatasetIngestor::new(
            vec![DatasetSource::new(file.path(), ';')],
            ColumnSpec::default(),
        );
        let (rows, report) = ingestor.ingest_source(&ingestor.sources[0]).unwrap();

        assert_eq!(
            rows,
            vec![
                LabeledSample::new("so glad", Emotion::Happy),
                LabeledSample::new("this is awful", Emotion::Disgust),
                LabeledSample::new("feeling low", Emotion::Sad),
            ]
        );
        assert_eq!(report.read, 7);
        assert_eq!(report.skipped_first, 1);
        assert_eq!(report.dropped_missing, 2);
        assert_eq!(report.dropped_invalid_label, 1);
        assert_eq!(report.kept, 3);
    }

    #[test]
    fn test_extra_columns_and_order() {
        let a = write_source("id,emotion,author,content\n0,sad,x,skip me\n1,fear,y,spooky\n");
        let b = write_source("content;emotion\nskip;happy\nyay;fun\n");
        let ingestor = DatasetIngestor::new(
            vec![
                DatasetSource::new(a.path(), ','),
                DatasetSource::new(b.path(), ';'),
            ],
            ColumnSpec::default(),
        );

        let rows = ingestor.ingest().unwrap();
        assert_eq!(
            rows,
            vec![
                LabeledSample::new("spooky", Emotion::Fear),
                LabeledSample::new("yay", Emotion::Happy),
            ]
        );
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let file = write_source("text,label\na,happy\nb,sad\n");
        let ingestor = DatasetIngestor::new(
            vec![DatasetSource::new(file.path(), ',')],
            ColumnSpec::default(),
        );
        let err = ingestor.ingest().unwrap_err();
        assert!(matches!(err, EmogifError::Dataset(_)));
        assert!(err.to_string().contains("content"));
    }

    #[test]
    fn test_no_rows_is_fatal() {
        let file = write_source("content,emotion\nonly,happy\n");
        let ingestor = DatasetIngestor::new(
            vec![DatasetSource::new(file.path(), ',')],
            ColumnSpec::default(),
        );
        assert!(matches!(
            ingestor.ingest().unwrap_err(),
            EmogifError::Dataset(_)
        ));
    }

    #[test]
    fn test_missing_file() {
        let ingestor = DatasetIngestor::new(
            vec![DatasetSource::new("/nonexistent/emotions.csv", ';')],
            ColumnSpec::default(),
        );
        assert!(ingestor.ingest().is_err());
    }
}
