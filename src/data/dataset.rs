use crate::data::loader::{DataLoader, Sample};
use crate::error::{Error, Result};
use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

/// A sample whose label was resolved to a class index.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierItem {
    /// Normalized values.
    ///
    /// # Shape
    /// [channels * height * width], channel-major
    pub image: Vec<f32>,
    /// Index into the class labels.
    pub label: usize,
}

/// Samples held in memory, along with the class labels they refer to.
///
/// Cloning is cheap, the items are shared.
#[derive(Debug, Clone)]
pub struct LabelledDataSet {
    items: Arc<Vec<ClassifierItem>>,
    classes: Arc<Vec<String>>,
}

impl LabelledDataSet {
    /// Drains `loader` (reading at most `limit` samples) into memory.
    pub fn load(
        loader: &mut dyn DataLoader,
        classes: &[String],
        limit: Option<usize>,
    ) -> Result<Self> {
        let limit = limit.unwrap_or(usize::MAX);
        let mut samples = Vec::new();
        while samples.len() < limit {
            let remaining = limit - samples.len();
            if loader.load_samples(&mut samples, remaining)? == 0 {
                break;
            }
        }

        if samples.is_empty() {
            return Err(Error::EmptyDataset("the data loader produced no samples".into()));
        }
        Self::from_samples(samples, classes)
    }

    pub fn from_samples(samples: Vec<Sample>, classes: &[String]) -> Result<Self> {
        let class_index: HashMap<&str, usize> = classes
            .iter()
            .enumerate()
            .map(|(i, label)| (label.as_str(), i))
            .collect();

        let items = samples
            .into_iter()
            .map(|sample| {
                let label = *class_index
                    .get(sample.label.as_str())
                    .ok_or_else(|| Error::UnknownLabel {
                        label: sample.label.clone(),
                    })?;
                Ok(ClassifierItem {
                    image: sample.data,
                    label,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            items: Arc::new(items),
            classes: Arc::new(classes.to_vec()),
        })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn items(&self) -> &[ClassifierItem] {
        &self.items
    }

    /// Number of samples per class, in class order.
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.classes.len()];
        for item in self.items.iter() {
            counts[item.label] += 1;
        }
        counts
    }
}

impl Dataset<ClassifierItem> for LabelledDataSet {
    fn get(&self, index: usize) -> Option<ClassifierItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// A one-hot encoding of `label`.
pub fn class_output_vector(label: usize, num_classes: usize) -> Vec<f32> {
    let mut v = vec![0.0; num_classes];
    v[label] = 1.0;
    v
}

#[derive(Clone, Debug)]
pub struct ClassifierBatcher {
    /// `[width, height, channels]`
    shape: [usize; 3],
    num_classes: usize,
}

impl ClassifierBatcher {
    pub fn new(shape: [usize; 3], num_classes: usize) -> Self {
        Self { shape, num_classes }
    }
}

#[derive(Clone, Debug)]
pub struct ClassifierBatch<B: Backend> {
    /// # Shape
    /// [batch_size, channels, height, width]
    pub images: Tensor<B, 4>,
    /// Class indices.
    ///
    /// # Shape
    /// [batch_size]
    pub targets: Tensor<B, 1, Int>,
    /// Categorical (one-hot) encoding of the targets.
    ///
    /// # Shape
    /// [batch_size, num_classes]
    pub one_hot: Tensor<B, 2>,
}

impl<B: Backend> Batcher<B, ClassifierItem, ClassifierBatch<B>> for ClassifierBatcher {
    fn batch(&self, items: Vec<ClassifierItem>, device: &B::Device) -> ClassifierBatch<B> {
        let [width, height, channels] = self.shape;
        let batch_size = items.len();

        let mut images = Vec::with_capacity(batch_size * channels * height * width);
        let mut targets = Vec::with_capacity(batch_size);
        let mut one_hot = Vec::with_capacity(batch_size * self.num_classes);
        for item in items {
            debug_assert_eq!(item.image.len(), channels * height * width);
            images.extend(item.image);
            targets.push(item.label as i64);
            one_hot.extend(class_output_vector(item.label, self.num_classes));
        }

        let images = TensorData::new(images, [batch_size, channels, height, width])
            .convert::<B::FloatElem>();
        let targets = TensorData::new(targets, [batch_size]).convert::<B::IntElem>();
        let one_hot =
            TensorData::new(one_hot, [batch_size, self.num_classes]).convert::<B::FloatElem>();

        ClassifierBatch {
            images: Tensor::from_data(images, device),
            targets: Tensor::from_data(targets, device),
            one_hot: Tensor::from_data(one_hot, device),
        }
    }
}
