//! Owned sequence storage with windowed access
//!
//! A [`SequenceBuffer`] stores homogeneous elements (scalars, fixed-width
//! rows or fixed-shape matrices) in one flat `Vec<f64>`. Element `i`
//! occupies `values[i * width..(i + 1) * width]`, so windows and slices
//! are plain sub-slices and `len()` is O(1).

use crate::error::{ChunkError, Result};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::ops::Range;

/// Dimensions of one element: `[]` for scalars, `[cols]` for rows,
/// `[rows, cols]` for matrices
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    dims: SmallVec<[usize; 2]>,
}

impl Shape {
    /// Shape of a scalar element
    pub fn scalar() -> Self {
        Self {
            dims: SmallVec::new(),
        }
    }

    /// Shape of a row with `cols` components
    pub fn row(cols: usize) -> Self {
        let mut dims = SmallVec::new();
        dims.push(cols);
        Self { dims }
    }

    /// Shape of a `rows` x `cols` matrix
    pub fn matrix(rows: usize, cols: usize) -> Self {
        let mut dims = SmallVec::new();
        dims.push(rows);
        dims.push(cols);
        Self { dims }
    }

    /// Raw dimensions
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Number of dimensions of one element (0, 1 or 2)
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Number of `f64` components in one element
    pub fn width(&self) -> usize {
        self.dims.iter().product()
    }

    /// Whether elements are plain scalars
    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.dims.as_slice() {
            [] => write!(f, "scalar"),
            [cols] => write!(f, "row[{cols}]"),
            [rows, cols] => write!(f, "matrix[{rows}x{cols}]"),
            dims => write!(f, "tensor{dims:?}"),
        }
    }
}

/// One input element
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// 1D sequences
    Scalar(f64),
    /// 2D sequences: one fixed-width row per element
    Row(Vec<f64>),
    /// 3D sequences: one fixed-shape matrix per element
    Matrix(Vec<Vec<f64>>),
}

impl Element {
    /// Shape of this element; fails for empty or ragged rows and matrices
    pub fn shape(&self) -> Result<Shape> {
        match self {
            Element::Scalar(_) => Ok(Shape::scalar()),
            Element::Row(row) => {
                if row.is_empty() {
                    return Err(ChunkError::invalid_argument("row elements cannot be empty"));
                }
                Ok(Shape::row(row.len()))
            }
            Element::Matrix(rows) => {
                let cols = rows.first().map(Vec::len).unwrap_or(0);
                if cols == 0 {
                    return Err(ChunkError::invalid_argument(
                        "matrix elements cannot be empty",
                    ));
                }
                if rows.iter().any(|row| row.len() != cols) {
                    return Err(ChunkError::invalid_argument(
                        "matrix elements must be rectangular",
                    ));
                }
                Ok(Shape::matrix(rows.len(), cols))
            }
        }
    }

    fn write_into(self, out: &mut Vec<f64>) {
        match self {
            Element::Scalar(value) => out.push(value),
            Element::Row(row) => out.extend(row),
            Element::Matrix(rows) => rows.into_iter().for_each(|row| out.extend(row)),
        }
    }
}

impl From<f64> for Element {
    fn from(value: f64) -> Self {
        Element::Scalar(value)
    }
}

impl From<Vec<f64>> for Element {
    fn from(row: Vec<f64>) -> Self {
        Element::Row(row)
    }
}

impl From<Vec<Vec<f64>>> for Element {
    fn from(matrix: Vec<Vec<f64>>) -> Self {
        Element::Matrix(matrix)
    }
}

/// Conversion into a batch of elements, so single and bulk appends share
/// one entry point.
///
/// A flat list of numbers is a batch of scalars; a list of rows is a 2D
/// batch; a list of matrices is a 3D batch.
pub trait IntoElements {
    /// Convert into elements in order
    fn into_elements(self) -> Vec<Element>;
}

impl IntoElements for f64 {
    fn into_elements(self) -> Vec<Element> {
        vec![Element::Scalar(self)]
    }
}

impl IntoElements for Element {
    fn into_elements(self) -> Vec<Element> {
        vec![self]
    }
}

impl IntoElements for Vec<Element> {
    fn into_elements(self) -> Vec<Element> {
        self
    }
}

impl IntoElements for &[f64] {
    fn into_elements(self) -> Vec<Element> {
        self.iter().copied().map(Element::Scalar).collect()
    }
}

impl<const N: usize> IntoElements for [f64; N] {
    fn into_elements(self) -> Vec<Element> {
        self.into_iter().map(Element::Scalar).collect()
    }
}

impl IntoElements for Vec<f64> {
    fn into_elements(self) -> Vec<Element> {
        self.into_iter().map(Element::Scalar).collect()
    }
}

impl IntoElements for Vec<Vec<f64>> {
    fn into_elements(self) -> Vec<Element> {
        self.into_iter().map(Element::Row).collect()
    }
}

impl IntoElements for Vec<Vec<Vec<f64>>> {
    fn into_elements(self) -> Vec<Element> {
        self.into_iter().map(Element::Matrix).collect()
    }
}

/// Owned, append-only sequence of homogeneous elements
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SequenceBuffer {
    values: Vec<f64>,
    shape: Option<Shape>,
    len: usize,
}

impl SequenceBuffer {
    /// Create an empty buffer; the first append fixes the element shape
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a buffer of scalars
    pub fn from_scalars(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::new();
        }
        Self {
            values: values.to_vec(),
            shape: Some(Shape::scalar()),
            len: values.len(),
        }
    }

    /// Build a buffer from any batch of elements
    pub fn from_elements(items: impl IntoElements) -> Result<Self> {
        let mut buffer = Self::new();
        buffer.append(items)?;
        Ok(buffer)
    }

    /// Rebuild a buffer from flat values and a shape
    pub fn from_flat(values: Vec<f64>, shape: Shape) -> Result<Self> {
        let width = shape.width();
        if width == 0 {
            return Err(ChunkError::invalid_argument(format!(
                "shape {shape} has no components"
            )));
        }
        if values.len() % width != 0 {
            return Err(ChunkError::invalid_argument(format!(
                "{} values do not divide into {shape} elements",
                values.len()
            )));
        }
        let len = values.len() / width;
        Ok(Self {
            values,
            shape: (len > 0).then_some(shape),
            len,
        })
    }

    /// Append one element
    pub fn push(&mut self, element: impl Into<Element>) -> Result<()> {
        self.append(element.into())
    }

    /// Append a batch of elements.
    ///
    /// The whole batch is validated before anything is stored, so a
    /// [`ChunkError::ShapeMismatch`] leaves the buffer unchanged.
    pub fn append(&mut self, items: impl IntoElements) -> Result<()> {
        let elements = items.into_elements();
        if elements.is_empty() {
            return Err(ChunkError::EmptyInput);
        }

        let mut expected = self.shape.clone();
        for element in &elements {
            let found = element.shape()?;
            match &expected {
                Some(shape) if *shape != found => {
                    return Err(ChunkError::ShapeMismatch {
                        expected: shape.clone(),
                        found,
                    });
                }
                Some(_) => {}
                None => expected = Some(found),
            }
        }

        let count = elements.len();
        let width = expected.as_ref().map(Shape::width).unwrap_or(1);
        self.values.reserve(count * width);
        for element in elements {
            element.write_into(&mut self.values);
        }
        self.shape = expected;
        self.len += count;
        Ok(())
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer holds no elements
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Element shape, once known
    pub fn shape(&self) -> Option<&Shape> {
        self.shape.as_ref()
    }

    /// Components per element (1 for scalars and for an empty buffer)
    pub fn width(&self) -> usize {
        self.shape.as_ref().map(Shape::width).unwrap_or(1)
    }

    /// Bytes occupied by one element
    pub fn element_bytes(&self) -> usize {
        self.width() * std::mem::size_of::<f64>()
    }

    /// Flat component storage
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Components of element `index`
    pub fn element(&self, index: usize) -> Option<&[f64]> {
        if index >= self.len {
            return None;
        }
        let width = self.width();
        Some(&self.values[index * width..(index + 1) * width])
    }

    /// Iterate over elements as component slices
    pub fn iter(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.values.chunks_exact(self.width())
    }

    /// Bounded view of `size` elements starting at `start`
    pub fn window(&self, start: usize, size: usize) -> Result<Window<'_>> {
        let end = start.checked_add(size).ok_or(ChunkError::OutOfRange {
            start,
            end: usize::MAX,
            len: self.len,
        })?;
        self.range_view(start..end)
    }

    /// Owned copy of the elements in `range`, with the same shape
    pub fn slice(&self, range: Range<usize>) -> Result<SequenceBuffer> {
        let view = self.range_view(range)?;
        Ok(SequenceBuffer {
            values: view.values.to_vec(),
            shape: if view.is_empty() {
                None
            } else {
                self.shape.clone()
            },
            len: view.len(),
        })
    }

    /// View over the whole buffer
    pub fn as_window(&self) -> Window<'_> {
        Window {
            start: 0,
            width: self.width(),
            values: &self.values,
        }
    }

    /// One scalar feature per element: the value itself for scalars, the
    /// mean of the components otherwise
    pub fn projection(&self) -> Vec<f64> {
        self.as_window().projection()
    }

    /// Index of the first element holding NaN or an infinity
    pub fn first_non_finite(&self) -> Option<usize> {
        self.as_window().first_non_finite()
    }

    /// Whether every component is finite
    pub fn is_finite(&self) -> bool {
        self.first_non_finite().is_none()
    }

    /// CRC32 over the shape and the little-endian component bytes
    pub fn fingerprint(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        for dim in self.shape.iter().flat_map(|shape| shape.dims()) {
            hasher.update(&(*dim as u64).to_le_bytes());
        }
        for value in &self.values {
            hasher.update(&value.to_le_bytes());
        }
        hasher.finalize()
    }

    fn range_view(&self, range: Range<usize>) -> Result<Window<'_>> {
        if range.start > range.end || range.end > self.len {
            return Err(ChunkError::OutOfRange {
                start: range.start,
                end: range.end,
                len: self.len,
            });
        }
        let width = self.width();
        Ok(Window {
            start: range.start,
            width,
            values: &self.values[range.start * width..range.end * width],
        })
    }
}

/// Borrowed, bounded view over consecutive buffer elements
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window<'a> {
    start: usize,
    width: usize,
    values: &'a [f64],
}

impl<'a> Window<'a> {
    /// Buffer index of the first element in the window
    pub fn start(&self) -> usize {
        self.start
    }

    /// Exclusive buffer index after the last element
    pub fn end(&self) -> usize {
        self.start + self.len()
    }

    /// Number of elements in the window
    pub fn len(&self) -> usize {
        self.values.len() / self.width
    }

    /// Whether the window is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Components per element
    pub fn width(&self) -> usize {
        self.width
    }

    /// Flat components of the window
    pub fn values(&self) -> &'a [f64] {
        self.values
    }

    /// Components of the window-relative element `index`
    pub fn element(&self, index: usize) -> Option<&'a [f64]> {
        let start = index.checked_mul(self.width)?;
        self.values.get(start..start + self.width)
    }

    /// Iterate over elements as component slices
    pub fn iter(&self) -> impl Iterator<Item = &'a [f64]> + 'a {
        self.values.chunks_exact(self.width)
    }

    /// Sub-window over window-relative `range`
    pub fn subwindow(&self, range: Range<usize>) -> Option<Window<'a>> {
        if range.start > range.end || range.end > self.len() {
            return None;
        }
        Some(Window {
            start: self.start + range.start,
            width: self.width,
            values: &self.values[range.start * self.width..range.end * self.width],
        })
    }

    /// One scalar feature per element (see [`SequenceBuffer::projection`])
    pub fn projection(&self) -> Vec<f64> {
        if self.width == 1 {
            return self.values.to_vec();
        }
        self.iter()
            .map(|element| element.iter().sum::<f64>() / self.width as f64)
            .collect()
    }

    /// Buffer index of the first element holding NaN or an infinity
    pub fn first_non_finite(&self) -> Option<usize> {
        self.iter()
            .position(|element| element.iter().any(|v| !v.is_finite()))
            .map(|i| self.start + i)
    }
}

/// Euclidean distance between two elements of equal width
pub fn element_distance(a: &[f64], b: &[f64]) -> f64 {
    if a.len() == 1 && b.len() == 1 {
        return (a[0] - b[0]).abs();
    }
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}
