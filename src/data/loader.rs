use crate::config::{DataDetails, DataLoaderConfig};
use crate::data::{csv::CsvDataLoader, image::ImageDataLoader};
use crate::error::Result;
use std::path::Path;

/// A single labelled sample, as read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub label: String,
    /// Normalized values.
    ///
    /// # Shape
    /// [channels * height * width], channel-major
    pub data: Vec<f32>,
}

impl Sample {
    pub fn new(label: impl Into<String>, data: Vec<f32>) -> Self {
        Self {
            label: label.into(),
            data,
        }
    }
}

/// Streams samples from some storage, [`fetch_size`](DataLoader::fetch_size) at a time.
pub trait DataLoader {
    /// Appends up to `max` samples (and never more than `fetch_size`), returning
    /// how many were appended. Returns `0` once the source is exhausted.
    fn load_samples(&mut self, samples: &mut Vec<Sample>, max: usize) -> Result<usize>;

    /// Rewinds the source so the next load starts over.
    fn seek_to_beginning(&mut self) -> Result<()>;

    fn fetch_size(&self) -> usize;
}

/// Builds the loader described by `config`, after checking the normalization range.
pub fn create_data_loader(
    config: &DataLoaderConfig,
    samples_path: &Path,
    details: &DataDetails,
) -> Result<Box<dyn DataLoader>> {
    details.normalization.validate()?;
    let loader: Box<dyn DataLoader> = match config {
        DataLoaderConfig::Csv { fetch_size } => Box::new(CsvDataLoader::from_path(
            samples_path,
            details.sample_len(),
            details.normalization.clone(),
            *fetch_size,
        )?),
        DataLoaderConfig::Images { fetch_size } => Box::new(ImageDataLoader::new(
            samples_path,
            details,
            *fetch_size,
        )?),
    };
    Ok(loader)
}
