//! Samples stored as image files, one directory per class label.
//!
//! ```text
//! root/
//!   cat/ 0001.png 0002.png ...
//!   dog/ 0001.png 0002.png ...
//! ```

use crate::config::{DataDetails, NormalizationParams};
use crate::data::loader::{DataLoader, Sample};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

struct ClassCursor {
    label: String,
    files: Vec<PathBuf>,
    next: usize,
}

impl ClassCursor {
    fn is_exhausted(&self) -> bool {
        self.next >= self.files.len()
    }
}

/// Reads the class directories in turns, so consecutive samples cycle through the classes.
pub struct ImageDataLoader {
    cursors: Vec<ClassCursor>,
    /// Index of the cursor whose turn is next.
    turn: usize,
    shape: [usize; 3],
    normalization: NormalizationParams,
    fetch_size: usize,
}

impl ImageDataLoader {
    pub fn new(root: &Path, details: &DataDetails, fetch_size: usize) -> Result<Self> {
        if !root.is_dir() {
            return Err(Error::io(
                root,
                std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            ));
        }

        let cursors = details
            .classes
            .iter()
            .map(|label| {
                let dir = root.join(label);
                let mut files = Vec::new();
                for entry in std::fs::read_dir(&dir).map_err(|e| Error::io(&dir, e))? {
                    let path = entry.map_err(|e| Error::io(&dir, e))?.path();
                    if path.is_file() {
                        files.push(path);
                    }
                }
                files.sort();
                tracing::debug!("Found {} images for class '{label}'", files.len());
                Ok(ClassCursor {
                    label: label.clone(),
                    files,
                    next: 0,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            cursors,
            turn: 0,
            shape: details.shape,
            normalization: details.normalization.clone(),
            fetch_size,
        })
    }

    fn all_exhausted(&self) -> bool {
        self.cursors.iter().all(ClassCursor::is_exhausted)
    }
}

impl DataLoader for ImageDataLoader {
    fn load_samples(&mut self, samples: &mut Vec<Sample>, max: usize) -> Result<usize> {
        let max = max.min(self.fetch_size);
        let mut num_samples = 0;
        while num_samples < max && !self.all_exhausted() {
            let turn = self.turn;
            self.turn = (turn + 1) % self.cursors.len();
            let cursor = &mut self.cursors[turn];
            if cursor.is_exhausted() {
                continue;
            }

            let path = &cursor.files[cursor.next];
            cursor.next += 1;
            let data = load_image(path, self.shape, &self.normalization)?;
            samples.push(Sample::new(cursor.label.clone(), data));
            num_samples += 1;
        }
        Ok(num_samples)
    }

    fn seek_to_beginning(&mut self) -> Result<()> {
        for cursor in &mut self.cursors {
            cursor.next = 0;
        }
        self.turn = 0;
        Ok(())
    }

    fn fetch_size(&self) -> usize {
        self.fetch_size
    }
}

/// Decodes the image at `path` into normalized, channel-major values.
///
/// `shape` is `[width, height, channels]`, and only 1 (luma) or 3 (rgb) channels are supported.
pub fn load_image(
    path: &Path,
    shape: [usize; 3],
    normalization: &NormalizationParams,
) -> Result<Vec<f32>> {
    let [width, height, channels] = shape;
    let image = ::image::open(path).map_err(|source| Error::Image {
        path: path.into(),
        source,
    })?;

    let actual = [image.width() as usize, image.height() as usize, channels];
    if actual != shape {
        return Err(Error::ShapeMismatch {
            path: path.into(),
            expected: shape,
            actual,
        });
    }

    // interleaved as [height, width, channels]
    let raw = match channels {
        1 => image.into_luma8().into_raw(),
        3 => image.into_rgb8().into_raw(),
        _ => {
            return Err(Error::ShapeMismatch {
                path: path.into(),
                expected: shape,
                actual: [width, height, image.color().channel_count() as usize],
            });
        }
    };

    let plane = width * height;
    let mut data = vec![0f32; plane * channels];
    for (i, pixel) in raw.chunks_exact(channels).enumerate() {
        for (c, value) in pixel.iter().enumerate() {
            data[c * plane + i] = normalization.normalize(*value);
        }
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::LabelledDataSet;
    use ::image::{Rgb, RgbImage};
    use temp_dir::TempDir;

    fn details(classes: &[&str], shape: [usize; 3]) -> DataDetails {
        DataDetails::new(
            NormalizationParams::new(),
            classes.iter().map(|c| c.to_string()).collect(),
            shape,
        )
    }

    fn write_image(dir: &Path, name: &str, width: u32, height: u32, value: u8) {
        std::fs::create_dir_all(dir).unwrap();
        RgbImage::from_pixel(width, height, Rgb([value, 0, 255]))
            .save(dir.join(name))
            .unwrap();
    }

    #[test]
    fn classes_are_interleaved() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        for name in ["a.png", "b.png", "c.png"] {
            write_image(&root.join("cat"), name, 2, 2, 0);
        }
        write_image(&root.join("dog"), "a.png", 2, 2, 255);

        let mut loader = ImageDataLoader::new(root, &details(&["cat", "dog"], [2, 2, 3]), 10).unwrap();
        let mut samples = Vec::new();
        assert_eq!(loader.load_samples(&mut samples, usize::MAX).unwrap(), 4);

        let labels: Vec<_> = samples.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["cat", "dog", "cat", "cat"]);
        assert_eq!(loader.load_samples(&mut samples, usize::MAX).unwrap(), 0);
    }

    #[test]
    fn interleaving_continues_across_fetches() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        for name in ["a.png", "b.png"] {
            write_image(&root.join("x"), name, 1, 1, 0);
            write_image(&root.join("y"), name, 1, 1, 0);
        }

        let mut loader = ImageDataLoader::new(root, &details(&["x", "y"], [1, 1, 3]), 3).unwrap();
        let mut samples = Vec::new();
        assert_eq!(loader.load_samples(&mut samples, usize::MAX).unwrap(), 3);
        assert_eq!(loader.load_samples(&mut samples, usize::MAX).unwrap(), 1);
        let labels: Vec<_> = samples.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["x", "y", "x", "y"]);

        loader.seek_to_beginning().unwrap();
        samples.clear();
        assert_eq!(loader.load_samples(&mut samples, usize::MAX).unwrap(), 3);
        assert_eq!(samples[0].label, "x");
    }

    #[test]
    fn files_past_the_limit_are_never_decoded() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write_image(&root.join("cat"), "a.png", 1, 1, 0);
        write_image(&root.join("dog"), "a.png", 1, 1, 255);
        // third in round-robin order
        std::fs::write(root.join("cat").join("b.png"), b"not an image").unwrap();

        let classes = ["cat".to_string(), "dog".to_string()];
        let mut loader = ImageDataLoader::new(root, &details(&["cat", "dog"], [1, 1, 3]), 10).unwrap();
        let dataset = LabelledDataSet::load(&mut loader, &classes, Some(2)).unwrap();
        assert_eq!(dataset.class_counts(), vec![1, 1]);

        loader.seek_to_beginning().unwrap();
        let err = LabelledDataSet::load(&mut loader, &classes, None).unwrap_err();
        assert!(matches!(err, Error::Image { .. }), "{err}");
    }

    #[test]
    fn pixels_are_channel_major_and_normalized() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("one.png");
        let mut image = RgbImage::new(2, 1);
        image.put_pixel(0, 0, Rgb([255, 0, 51]));
        image.put_pixel(1, 0, Rgb([0, 255, 0]));
        image.save(&path).unwrap();

        let data = load_image(&path, [2, 1, 3], &NormalizationParams::new()).unwrap();
        assert_eq!(data.len(), 6);
        // red plane, green plane, blue plane
        assert_eq!(&data[0..4], &[1.0, 0.0, 0.0, 1.0]);
        assert!((data[4] - 0.2).abs() < 1e-6);
        assert_eq!(data[5], 0.0);
    }

    #[test]
    fn grayscale_images_keep_one_plane() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gray.png");
        ::image::GrayImage::from_pixel(3, 2, ::image::Luma([255])).save(&path).unwrap();

        let data = load_image(&path, [3, 2, 1], &NormalizationParams::new()).unwrap();
        assert_eq!(data, vec![1.0; 6]);
    }

    #[test]
    fn wrong_dimensions_are_rejected() {
        let tmp = TempDir::new().unwrap();
        write_image(&tmp.path().join("cat"), "big.png", 4, 4, 0);

        let mut loader =
            ImageDataLoader::new(tmp.path(), &details(&["cat"], [2, 2, 3]), 10).unwrap();
        let err = loader.load_samples(&mut Vec::new(), usize::MAX).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { actual: [4, 4, 3], .. }), "{err}");
    }

    #[test]
    fn missing_class_directory_is_an_error() {
        let tmp = TempDir::new().unwrap();
        write_image(&tmp.path().join("cat"), "a.png", 1, 1, 0);

        let result = ImageDataLoader::new(tmp.path(), &details(&["cat", "dog"], [1, 1, 3]), 10);
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
