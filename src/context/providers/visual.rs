use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use image::{imageops::FilterType, DynamicImage};

use super::{ContextProvider, ProviderInput};
use crate::context::models::{ContextKind, SubContext, VisualContext};

const MAX_COLORS: usize = 5;
/// Images are shrunk to at most this many pixels per side before counting.
const SAMPLE_EDGE: u32 = 64;
/// Low bits dropped from each channel when bucketing.
const QUANTIZE_SHIFT: u8 = 3;

pub struct VisualContextProvider;

#[async_trait]
impl ContextProvider for VisualContextProvider {
    fn kind(&self) -> ContextKind {
        ContextKind::Visual
    }

    async fn capture(&self, input: &ProviderInput) -> Result<SubContext> {
        let Some(image) = input.image.clone() else {
            return Ok(SubContext::Visual(VisualContext::default()));
        };

        let colors = tokio::task::spawn_blocking(move || dominant_colors(&image, MAX_COLORS))
            .await
            .context("colour histogram worker failed")?;

        Ok(SubContext::Visual(VisualContext {
            dominant_colors: serde_json::to_string(&colors).ok(),
            ..VisualContext::default()
        }))
    }
}

#[derive(Default)]
struct Bucket {
    count: u64,
    sum: [u64; 3],
}

/// Most frequent colours as `#rrggbb`, most frequent first. Each entry is the mean
/// of the pixels that fell into its quantized bucket.
pub fn dominant_colors(image: &DynamicImage, limit: usize) -> Vec<String> {
    let sample = if image.width() > SAMPLE_EDGE || image.height() > SAMPLE_EDGE {
        image.resize(SAMPLE_EDGE, SAMPLE_EDGE, FilterType::Nearest)
    } else {
        image.clone()
    };

    let mut buckets: HashMap<[u8; 3], Bucket> = HashMap::new();
    for pixel in sample.to_rgb8().pixels() {
        let key = pixel.0.map(|channel| channel >> QUANTIZE_SHIFT);
        let bucket = buckets.entry(key).or_default();
        bucket.count += 1;
        for (total, channel) in bucket.sum.iter_mut().zip(pixel.0) {
            *total += u64::from(channel);
        }
    }

    let mut ranked: Vec<([u8; 3], Bucket)> = buckets.into_iter().collect();
    ranked.sort_by(|(key_a, a), (key_b, b)| b.count.cmp(&a.count).then(key_a.cmp(key_b)));

    ranked
        .into_iter()
        .take(limit)
        .map(|(_, bucket)| {
            let [r, g, b] = bucket.sum.map(|total| (total / bucket.count) as u8);
            format!("#{r:02x}{g:02x}{b:02x}")
        })
        .collect()
}
