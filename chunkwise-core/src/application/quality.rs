//! Chunk set quality metrics
//!
//! The headline score is the between-chunk share of the total dispersion,
//! `B / (B + W)`, with
//!
//! ```text
//! B = sum_k n_k * |centroid_k - grand_centroid|^2
//! W = sum_k sum_{x in k} |x - centroid_k|^2
//! ```
//!
//! It lies in `[0, 1]`: 1 when every chunk is internally constant and the
//! chunks differ, 0 when chunking explains none of the variation. A chunk set
//! without any dispersion at all scores 0.

use crate::application::chunker::Chunk;
use crate::domain::buffer::element_distance;
use crate::error::{ChunkError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Chunk size distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeMetrics {
    /// Mean chunk length
    pub mean: f64,
    /// Population variance of chunk lengths
    pub variance: f64,
    /// Shortest chunk
    pub min: usize,
    /// Longest chunk
    pub max: usize,
    /// Shannon entropy (bits) of the chunk length distribution
    pub entropy: f64,
}

/// Stateless scorer for chunk sets
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityAnalyzer;

impl QualityAnalyzer {
    /// Create an analyzer
    pub fn new() -> Self {
        Self
    }

    /// Between-chunk share of total dispersion, in `[0, 1]`
    pub fn compute_quality_score(&self, chunks: &[Chunk]) -> Result<f64> {
        let width = common_width(chunks)?;

        let count: usize = chunks.iter().map(Chunk::len).sum();
        if count == 0 {
            return Err(ChunkError::invalid_argument("chunks hold no elements"));
        }
        let mut grand = vec![0.0; width];
        for chunk in chunks {
            for element in chunk.elements() {
                add_assign(&mut grand, element);
            }
        }
        grand.iter_mut().for_each(|v| *v /= count as f64);

        let mut between = 0.0;
        let mut within = 0.0;
        for chunk in chunks.iter().filter(|c| !c.is_empty()) {
            let centroid = centroid(chunk, width);
            between += chunk.len() as f64 * squared_distance(&centroid, &grand);
            within += chunk
                .elements()
                .map(|element| squared_distance(element, &centroid))
                .sum::<f64>();
        }

        let total = between + within;
        if total <= 0.0 {
            return Ok(0.0);
        }
        Ok((between / total).clamp(0.0, 1.0))
    }

    /// `1 / (1 + mean distance to the centroid)`; 1 for chunks shorter than 2
    pub fn cohesion(&self, chunk: &Chunk) -> f64 {
        if chunk.len() < 2 {
            return 1.0;
        }
        let centroid = centroid(chunk, chunk.shape().width().max(1));
        let total: f64 = chunk
            .elements()
            .map(|element| element_distance(element, &centroid))
            .sum();
        1.0 / (1.0 + total / chunk.len() as f64)
    }

    /// `1 - 1 / (1 + min centroid distance)`; 1 for fewer than 2 chunks
    pub fn separation(&self, chunks: &[Chunk]) -> f64 {
        if chunks.len() < 2 {
            return 1.0;
        }
        let centroids: Vec<Vec<f64>> = chunks
            .iter()
            .map(|chunk| centroid(chunk, chunk.shape().width().max(1)))
            .collect();
        let mut min_distance = f64::INFINITY;
        for (i, a) in centroids.iter().enumerate() {
            for b in &centroids[i + 1..] {
                min_distance = min_distance.min(element_distance(a, b));
            }
        }
        1.0 - 1.0 / (1.0 + min_distance)
    }

    /// Mean silhouette over all elements, in `[-1, 1]`; 0 for fewer than 2 chunks
    pub fn silhouette_score(&self, chunks: &[Chunk]) -> f64 {
        if chunks.len() < 2 {
            return 0.0;
        }
        let mut total = 0.0;
        let mut points = 0usize;

        for (i, chunk) in chunks.iter().enumerate() {
            let members: Vec<&[f64]> = chunk.elements().collect();
            for (p, point) in members.iter().enumerate() {
                let a = if members.len() > 1 {
                    members
                        .iter()
                        .enumerate()
                        .filter(|(q, _)| *q != p)
                        .map(|(_, other)| element_distance(point, other))
                        .sum::<f64>()
                        / (members.len() - 1) as f64
                } else {
                    0.0
                };

                let b = chunks
                    .iter()
                    .enumerate()
                    .filter(|(j, other)| *j != i && !other.is_empty())
                    .map(|(_, other)| {
                        other
                            .elements()
                            .map(|o| element_distance(point, o))
                            .sum::<f64>()
                            / other.len() as f64
                    })
                    .fold(f64::INFINITY, f64::min);
                let b = if b.is_finite() { b } else { a };

                let scale = a.max(b);
                total += if scale == 0.0 { 0.0 } else { (b - a) / scale };
                points += 1;
            }
        }

        if points == 0 {
            0.0
        } else {
            total / points as f64
        }
    }

    /// Length statistics of a chunk set
    pub fn size_metrics(&self, chunks: &[Chunk]) -> Result<SizeMetrics> {
        if chunks.is_empty() {
            return Err(ChunkError::invalid_argument(
                "cannot compute size metrics of an empty chunk set",
            ));
        }
        let sizes: Vec<usize> = chunks.iter().map(Chunk::len).collect();
        let n = sizes.len() as f64;
        let mean = sizes.iter().sum::<usize>() as f64 / n;
        let variance = sizes
            .iter()
            .map(|&s| (s as f64 - mean) * (s as f64 - mean))
            .sum::<f64>()
            / n;

        let mut counts: HashMap<usize, usize> = HashMap::new();
        for &size in &sizes {
            *counts.entry(size).or_default() += 1;
        }
        let entropy = counts
            .values()
            .map(|&count| {
                let p = count as f64 / n;
                -p * p.log2()
            })
            .sum::<f64>();

        Ok(SizeMetrics {
            mean,
            variance,
            min: sizes.iter().copied().min().unwrap_or(0),
            max: sizes.iter().copied().max().unwrap_or(0),
            entropy,
        })
    }
}

fn common_width(chunks: &[Chunk]) -> Result<usize> {
    let first = chunks.first().ok_or_else(|| {
        ChunkError::invalid_argument("cannot score an empty chunk set")
    })?;
    let width = first.shape().width().max(1);
    if let Some(other) = chunks.iter().find(|c| c.shape().width().max(1) != width) {
        return Err(ChunkError::ShapeMismatch {
            expected: first.shape().clone(),
            found: other.shape().clone(),
        });
    }
    Ok(width)
}

fn centroid(chunk: &Chunk, width: usize) -> Vec<f64> {
    let mut sum = vec![0.0; width];
    for element in chunk.elements() {
        add_assign(&mut sum, element);
    }
    let n = chunk.len().max(1) as f64;
    sum.iter_mut().for_each(|v| *v /= n);
    sum
}

fn add_assign(acc: &mut [f64], element: &[f64]) {
    acc.iter_mut().zip(element).for_each(|(a, v)| *a += v);
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
