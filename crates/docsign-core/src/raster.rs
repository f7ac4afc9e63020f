//! Decoding raster payloads into embeddable PDF images

use image::ImageFormat;
use shared_pdf::content::{ImageEncoding, ImageXObject};
use shared_types::{RasterFormat, RasterPayload};

use crate::error::{InjectionError, Result};

/// Decode a PNG or JPEG payload into an image XObject description.
///
/// PNG samples are split into RGB and an alpha soft mask (dropped when fully
/// opaque). JPEG data is kept as-is and only decoded for its geometry.
pub fn to_xobject(payload: &RasterPayload) -> Result<ImageXObject> {
    let format = match payload.format {
        RasterFormat::Png => ImageFormat::Png,
        RasterFormat::Jpeg => ImageFormat::Jpeg,
        RasterFormat::Other(ref mime) => {
            return Err(InjectionError::UnsupportedMediaType(mime.clone()))
        }
    };

    let decoded = image::load_from_memory_with_format(&payload.bytes, format)
        .map_err(|e| InjectionError::ImageDecode(e.to_string()))?;
    let (width, height) = (decoded.width(), decoded.height());
    if width == 0 || height == 0 {
        return Err(InjectionError::ImageDecode("image has no pixels".to_string()));
    }

    if format == ImageFormat::Jpeg {
        // The decoder reports converted colour; the embedded stream keeps the file's own
        let header = jpeg_header(&payload.bytes)
            .ok_or_else(|| InjectionError::ImageDecode("JPEG has no frame header".to_string()))?;
        let (color_space, inverted) = dct_color(header)?;
        return Ok(ImageXObject {
            width,
            height,
            color_space,
            encoding: ImageEncoding::Dct,
            data: payload.bytes.clone(),
            alpha: None,
            inverted,
        });
    }

    let rgba = decoded.to_rgba8();
    let pixels = (width as usize) * (height as usize);
    let mut rgb = Vec::with_capacity(pixels * 3);
    let mut alpha = Vec::with_capacity(pixels);
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        rgb.extend_from_slice(&[r, g, b]);
        alpha.push(a);
    }
    let translucent = alpha.iter().any(|&a| a != u8::MAX);

    Ok(ImageXObject {
        width,
        height,
        color_space: "DeviceRGB",
        encoding: ImageEncoding::Raw,
        data: rgb,
        alpha: translucent.then_some(alpha),
        inverted: false,
    })
}

/// What the frame header and APP14 segment say about a JPEG's samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegHeader {
    pub components: u8,
    /// An Adobe APP14 segment precedes the frame
    pub adobe: bool,
}

/// Walk the marker segments up to the first start-of-frame
pub fn jpeg_header(bytes: &[u8]) -> Option<JpegHeader> {
    if !bytes.starts_with(&[0xFF, 0xD8]) {
        return None;
    }

    let mut pos = 2;
    let mut adobe = false;
    while pos + 4 <= bytes.len() {
        if bytes[pos] != 0xFF {
            return None;
        }
        let marker = bytes[pos + 1];
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        if matches!(marker, 0x01 | 0xD0..=0xD7) {
            pos += 2;
            continue;
        }

        let len = u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]) as usize;
        let body = bytes.get(pos + 4..pos + 2 + len)?;
        match marker {
            0xEE if body.starts_with(b"Adobe") => adobe = true,
            0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF => {
                return body.get(5).map(|&components| JpegHeader { components, adobe });
            }
            0xDA => return None,
            _ => {}
        }
        pos += 2 + len;
    }
    None
}

/// PDF colour space for a DCT stream, and whether its samples need a `/Decode` inversion
pub fn dct_color(header: JpegHeader) -> Result<(&'static str, bool)> {
    match header.components {
        1 => Ok(("DeviceGray", false)),
        3 => Ok(("DeviceRGB", false)),
        // Adobe writes CMYK JPEGs inverted
        4 => Ok(("DeviceCMYK", header.adobe)),
        n => Err(InjectionError::ImageDecode(format!(
            "unsupported JPEG component count {}",
            n
        ))),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use image::{ImageBuffer, ImageFormat, Luma, Rgb, Rgba};
    use std::io::Cursor;

    pub fn png(width: u32, height: u32, opaque: bool) -> Vec<u8> {
        let alpha = if opaque { 255 } else { 128 };
        let img = ImageBuffer::from_pixel(width, height, Rgba([20u8, 40, 200, alpha]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgb([200u8, 10, 10]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Jpeg).unwrap();
        out.into_inner()
    }

    pub fn gray_jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Luma([90u8]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Jpeg).unwrap();
        out.into_inner()
    }
}
