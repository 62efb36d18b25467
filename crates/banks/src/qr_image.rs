//! QR decoding over raw image bytes.

use crate::QrDecoder;
use anyhow::{Context, Result};
use async_trait::async_trait;

#[derive(Default)]
pub struct RqrrDecoder;

#[async_trait]
impl QrDecoder for RqrrDecoder {
    async fn decode(&self, image: &[u8]) -> Result<Option<String>> {
        let luma = image::load_from_memory(image)
            .context("failed to decode image bytes")?
            .to_luma8();
        let mut prepared = rqrr::PreparedImage::prepare(luma);
        for grid in prepared.detect_grids() {
            match grid.decode() {
                Ok((_meta, content)) => {
                    tracing::info!(%content, "QR code decoded");
                    return Ok(Some(content));
                }
                Err(err) => tracing::debug!(error = %err, "QR grid would not decode"),
            }
        }
        Ok(None)
    }
}
