//! IDX-format example loading (MNIST-style image/label file pairs) and the
//! arg-max evaluation matcher.
//!
//! The gradient engine only sees the [`Example`] trait; this module is the
//! collaborator that produces concrete examples from the big-endian IDX
//! binary encoding. Decoding is split from file I/O so the format logic is
//! testable over in-memory buffers.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use log::debug;

use crate::error::DecodeError;
use crate::network::Example;

/// Magic number of an IDX image file (unsigned byte, 3 dimensions).
pub const IDX_IMAGE_MAGIC: u32 = 2051;
/// Magic number of an IDX label file (unsigned byte, 1 dimension).
pub const IDX_LABEL_MAGIC: u32 = 2049;

/// Number of classes in the one-hot output encoding.
const CLASSES: usize = 10;

/// An example-set source. Implementations own all file-format concerns.
pub trait Loader {
    fn load(&self) -> anyhow::Result<Vec<IdxExample>>;
}

/// A decoded labeled image: pixel intensities as the input vector and a
/// 10-way one-hot label as the desired output.
#[derive(Clone, Debug)]
pub struct IdxExample {
    input: Vec<f64>,
    output: Vec<f64>,
}

impl Example for IdxExample {
    fn input(&self) -> &[f64] {
        &self.input
    }

    fn output(&self) -> &[f64] {
        &self.output
    }
}

/// Loads a correlated IDX image/label file pair.
#[derive(Clone, Debug)]
pub struct IdxLoader {
    image_file: PathBuf,
    label_file: PathBuf,
    image_magic: u32,
    label_magic: u32,
}

impl IdxLoader {
    pub fn new(images: impl Into<PathBuf>, labels: impl Into<PathBuf>) -> Self {
        Self {
            image_file: images.into(),
            label_file: labels.into(),
            image_magic: IDX_IMAGE_MAGIC,
            label_magic: IDX_LABEL_MAGIC,
        }
    }

    /// Override the expected magic numbers (useful for test fixtures).
    pub fn with_magic(mut self, image_magic: u32, label_magic: u32) -> Self {
        self.image_magic = image_magic;
        self.label_magic = label_magic;
        self
    }
}

impl Loader for IdxLoader {
    fn load(&self) -> anyhow::Result<Vec<IdxExample>> {
        let image_data = fs::read(&self.image_file)
            .with_context(|| format!("reading image file {}", self.image_file.display()))?;
        let label_data = fs::read(&self.label_file)
            .with_context(|| format!("reading label file {}", self.label_file.display()))?;

        let examples = decode_pair(&image_data, &label_data, self.image_magic, self.label_magic)
            .with_context(|| {
                format!(
                    "decoding {} / {}",
                    self.image_file.display(),
                    self.label_file.display()
                )
            })?;

        debug!(
            "loaded {} examples from {}",
            examples.len(),
            self.image_file.display()
        );
        Ok(examples)
    }
}

fn be_u32(buf: &[u8], offset: usize) -> Result<u32, DecodeError> {
    let bytes: [u8; 4] = buf
        .get(offset..offset + 4)
        .ok_or(DecodeError::Truncated)?
        .try_into()
        .map_err(|_| DecodeError::Truncated)?;
    Ok(u32::from_be_bytes(bytes))
}

/// Decode a correlated image/label buffer pair into examples.
///
/// Image header: magic, record count, image rows, image cols (big-endian
/// u32 each), then `count * rows * cols` pixel bytes. Label header: magic
/// and record count, then `count` label bytes. Fails when either magic is
/// wrong, the record counts disagree, a label is out of one-hot range, or
/// either buffer is shorter than its header declares.
pub fn decode_pair(
    image_data: &[u8],
    label_data: &[u8],
    image_magic: u32,
    label_magic: u32,
) -> Result<Vec<IdxExample>, DecodeError> {
    let found = be_u32(image_data, 0)?;
    if found != image_magic {
        return Err(DecodeError::BadMagic {
            expected: image_magic,
            found,
        });
    }

    let found = be_u32(label_data, 0)?;
    if found != label_magic {
        return Err(DecodeError::BadMagic {
            expected: label_magic,
            found,
        });
    }

    let num_images = be_u32(image_data, 4)?;
    let num_labels = be_u32(label_data, 4)?;
    if num_images != num_labels {
        return Err(DecodeError::CountMismatch {
            images: num_images,
            labels: num_labels,
        });
    }

    let image_rows = be_u32(image_data, 8)? as usize;
    let image_cols = be_u32(image_data, 12)? as usize;
    let count = num_images as usize;

    // a hostile header can claim dimensions whose product overflows; treat
    // that like any other buffer-too-short condition
    let image_size = image_rows
        .checked_mul(image_cols)
        .ok_or(DecodeError::Truncated)?;
    let pixel_end = count
        .checked_mul(image_size)
        .and_then(|len| len.checked_add(16))
        .ok_or(DecodeError::Truncated)?;

    let pixels = image_data
        .get(16..pixel_end)
        .ok_or(DecodeError::Truncated)?;
    let labels = label_data
        .get(8..8 + count)
        .ok_or(DecodeError::Truncated)?;

    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let image = &pixels[i * image_size..(i + 1) * image_size];
        let label = labels[i];
        if usize::from(label) >= CLASSES {
            return Err(DecodeError::BadLabel(label));
        }

        let mut output = vec![0.0; CLASSES];
        output[usize::from(label)] = 1.0;

        out.push(IdxExample {
            input: image.iter().map(|&b| f64::from(b)).collect(),
            output,
        });
    }

    Ok(out)
}

/// The evaluation matcher: true when both vectors peak at the same index.
pub fn argmax_match(a: &[f64], b: &[f64]) -> bool {
    match (argmax(a), argmax(b)) {
        (Some(i), Some(j)) => i == j,
        _ => false,
    }
}

fn argmax(v: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &x) in v.iter().enumerate() {
        match best {
            Some((_, max)) if x <= max => {}
            _ => best = Some((i, x)),
        }
    }
    best.map(|(i, _)| i)
}
