pub mod csv;
pub mod dataset;
pub mod image;
pub mod loader;

pub use dataset::{ClassifierBatch, ClassifierBatcher, ClassifierItem, LabelledDataSet};
pub use loader::{DataLoader, Sample, create_data_loader};
