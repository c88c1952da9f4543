//! Decoding of the client-rendered metrics chart
//!
//! The frontend sends its chart as a base64 PNG, usually as a `data:` URI.
//! The image is decoded in memory into 8-bit samples ready to embed.

use anyhow::{bail, Context, Result};
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Cursor, Write};

/// Prefix the frontend puts in front of its PNG payload
pub const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Rgb,
    Gray,
}

/// Decoded image, samples zlib-compressed for a `FlateDecode` stream
#[derive(Debug, Clone)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub color: ColorSpace,
    pub samples: Vec<u8>,
    /// Compressed 8-bit alpha channel, absent for opaque images
    pub alpha: Option<Vec<u8>>,
}

/// Strip a `data:<mime>;base64,` header if present
fn strip_data_uri(payload: &str) -> &str {
    if let Some(rest) = payload.strip_prefix(PNG_DATA_URI_PREFIX) {
        return rest;
    }
    match payload.strip_prefix("data:").and_then(|r| r.split_once(";base64,")) {
        Some((_, data)) => data,
        None => payload,
    }
}

/// Decode a chart payload; `None` when no chart was sent
///
/// A `data:` header with nothing after it is an error.
pub fn decode_chart(payload: &str) -> Result<Option<RasterImage>> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Ok(None);
    }

    let data: String = strip_data_uri(payload)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if data.is_empty() {
        bail!("chart image has no data");
    }

    let bytes = LENIENT_BASE64
        .decode(data.as_bytes())
        .context("chart image is not valid base64")?;
    decode_png(&bytes).map(Some)
}

fn decode_png(bytes: &[u8]) -> Result<RasterImage> {
    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::normalize_to_color8());
    let mut reader = decoder
        .read_info()
        .context("chart image is not a valid PNG")?;

    let mut buf = vec![0; reader.output_buffer_size()];
    let frame = reader
        .next_frame(&mut buf)
        .context("failed to decode chart image")?;
    buf.truncate(frame.buffer_size());

    let (color, channels, has_alpha) = match frame.color_type {
        png::ColorType::Rgb => (ColorSpace::Rgb, 3, false),
        png::ColorType::Rgba => (ColorSpace::Rgb, 4, true),
        png::ColorType::Grayscale => (ColorSpace::Gray, 1, false),
        png::ColorType::GrayscaleAlpha => (ColorSpace::Gray, 2, true),
        png::ColorType::Indexed => bail!("unexpected indexed PNG after expansion"),
    };

    let (samples, alpha) = if has_alpha {
        let color_channels = channels - 1;
        let mut samples = Vec::with_capacity(buf.len() / channels * color_channels);
        let mut alpha = Vec::with_capacity(buf.len() / channels);
        for px in buf.chunks_exact(channels) {
            samples.extend_from_slice(&px[..color_channels]);
            alpha.push(px[color_channels]);
        }
        let opaque = alpha.iter().all(|&a| a == u8::MAX);
        (samples, if opaque { None } else { Some(alpha) })
    } else {
        (buf, None)
    };

    Ok(RasterImage {
        width: frame.width,
        height: frame.height,
        color,
        samples: deflate(&samples)?,
        alpha: alpha.map(|a| deflate(&a)).transpose()?,
    })
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}
