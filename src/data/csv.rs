//! Samples stored as csv rows, e.g. an MNIST csv dump.
//!
//! Each row is a label followed by the sample values:
//!
//! ```text
//! 5,0,0,0,...,255,18,0
//! 0,0,0,0,...,12,0,0
//! ```

use crate::config::NormalizationParams;
use crate::data::loader::{DataLoader, Sample};
use crate::error::{Error, Result};
use ::csv::{Position, Reader, ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

pub struct CsvDataLoader<R = File> {
    reader: Reader<R>,
    record: StringRecord,
    input_size: usize,
    normalization: NormalizationParams,
    fetch_size: usize,
}

fn reader_builder() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    // row lengths are validated per sample, with the line number in the error
    builder.has_headers(false).flexible(true);
    builder
}

impl CsvDataLoader<File> {
    pub fn from_path(
        path: &Path,
        input_size: usize,
        normalization: NormalizationParams,
        fetch_size: usize,
    ) -> Result<Self> {
        let reader = reader_builder().from_path(path)?;
        tracing::debug!("Reading csv samples from {path:?}");
        Ok(Self::with_reader(reader, input_size, normalization, fetch_size))
    }
}

impl<R: Read> CsvDataLoader<R> {
    pub fn from_reader(
        rdr: R,
        input_size: usize,
        normalization: NormalizationParams,
        fetch_size: usize,
    ) -> Self {
        let reader = reader_builder().from_reader(rdr);
        Self::with_reader(reader, input_size, normalization, fetch_size)
    }

    fn with_reader(
        reader: Reader<R>,
        input_size: usize,
        normalization: NormalizationParams,
        fetch_size: usize,
    ) -> Self {
        Self {
            reader,
            record: StringRecord::new(),
            input_size,
            normalization,
            fetch_size,
        }
    }
}

fn parse_record(
    record: &StringRecord,
    input_size: usize,
    normalization: &NormalizationParams,
) -> Result<Sample> {
    let line = record.position().map(Position::line).unwrap_or_default();
    let mut fields = record.iter();
    let label = fields.next().map(str::trim).unwrap_or_default();

    let num_values = record.len().saturating_sub(1);
    if num_values != input_size {
        return Err(Error::MalformedSample {
            line,
            message: format!("expected {input_size} values, got {num_values}"),
        });
    }

    let data = fields
        .map(|field| {
            let field = field.trim();
            field
                .parse::<f64>()
                .map(|value| normalization.normalize(value))
                .map_err(|e| Error::MalformedSample {
                    line,
                    message: format!("'{field}' is not a number: {e}"),
                })
        })
        .collect::<Result<Vec<f32>>>()?;

    Ok(Sample::new(label, data))
}

impl<R: Read + Seek> DataLoader for CsvDataLoader<R> {
    fn load_samples(&mut self, samples: &mut Vec<Sample>, max: usize) -> Result<usize> {
        let max = max.min(self.fetch_size);
        let mut num_samples = 0;
        while num_samples < max {
            if !self.reader.read_record(&mut self.record)? {
                break;
            }
            let is_blank = self.record.len() == 1 && self.record[0].trim().is_empty();
            if is_blank {
                continue;
            }
            samples.push(parse_record(
                &self.record,
                self.input_size,
                &self.normalization,
            )?);
            num_samples += 1;
        }
        Ok(num_samples)
    }

    fn seek_to_beginning(&mut self) -> Result<()> {
        self.reader.seek(Position::new())?;
        Ok(())
    }

    fn fetch_size(&self) -> usize {
        self.fetch_size
    }
}
