//! Image XObjects referenced from a page's resources.

use super::{dict_entry, inherited_entry, resolve, resolve_dict};
use lopdf::{Document, Object, ObjectId, Stream};
use sha2::{Digest, Sha256};
use std::io::Cursor;

/// How an image stream's samples are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// `DCTDecode`: a complete JPEG file.
    Jpeg,
    /// `JPXDecode`: a JPEG 2000 codestream.
    Jpeg2000,
    /// Uncompressed or Flate-compressed samples.
    Samples,
    /// Fax, JBIG2 and filter chains that are not decoded here.
    Other,
}

/// An image XObject of one page.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// Resource name, e.g. `Im0`.
    pub name: String,
    /// SHA-256 of the encoded stream, hex.
    pub digest: String,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub bits_per_component: u32,
    /// Number of color components, `None` for unsupported color spaces.
    pub components: Option<u32>,
    stream: Stream,
}

impl PageImage {
    pub fn extension(&self) -> &'static str {
        match self.format {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Jpeg2000 => "jp2",
            ImageFormat::Samples | ImageFormat::Other => "png",
        }
    }

    /// Encoded image an OCR engine can read: JPEG data as stored, raw samples
    /// converted to PNG. `None` when the image cannot be converted.
    pub fn to_ocr_input(&self) -> Option<Vec<u8>> {
        match self.format {
            ImageFormat::Jpeg => Some(self.stream.content.clone()),
            ImageFormat::Samples => self.samples_to_png(),
            ImageFormat::Jpeg2000 | ImageFormat::Other => None,
        }
    }

    fn samples_to_png(&self) -> Option<Vec<u8>> {
        let samples = if self.stream.dict.has(b"Filter") {
            self.stream.decompressed_content().ok()?
        } else {
            self.stream.content.clone()
        };
        let (width, height) = (self.width, self.height);
        let pixels = (width as usize).checked_mul(height as usize)?;

        let dynamic = match (self.components?, self.bits_per_component) {
            (1, 8) => {
                let data = samples.get(..pixels)?.to_vec();
                image::DynamicImage::ImageLuma8(image::GrayImage::from_raw(width, height, data)?)
            }
            (1, 1) => {
                let data = expand_bilevel(&samples, width as usize, height as usize)?;
                image::DynamicImage::ImageLuma8(image::GrayImage::from_raw(width, height, data)?)
            }
            (3, 8) => {
                let data = samples.get(..pixels.checked_mul(3)?)?.to_vec();
                image::DynamicImage::ImageRgb8(image::RgbImage::from_raw(width, height, data)?)
            }
            _ => return None,
        };

        let mut png = Vec::new();
        dynamic.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png).ok()?;
        Some(png)
    }
}

fn expand_bilevel(samples: &[u8], width: usize, height: usize) -> Option<Vec<u8>> {
    let stride = width.div_ceil(8);
    if samples.len() < stride.checked_mul(height)? {
        return None;
    }
    let mut out = Vec::with_capacity(width * height);
    for row in samples.chunks(stride).take(height) {
        for x in 0..width {
            let bit = (row[x / 8] >> (7 - (x % 8))) & 1;
            out.push(if bit == 1 { 255 } else { 0 });
        }
    }
    Some(out)
}

/// Image XObjects in the page's (possibly inherited) `/Resources`.
pub fn page_images(doc: &Document, page_id: ObjectId) -> Vec<PageImage> {
    let Some(xobjects) = inherited_entry(doc, page_id, b"Resources")
        .and_then(|resources| resolve_dict(doc, resources))
        .and_then(|resources| dict_entry(doc, resources, b"XObject"))
        .and_then(|xobjects| resolve_dict(doc, xobjects))
    else {
        return Vec::new();
    };

    let mut images = Vec::new();
    for (name, object) in xobjects.iter() {
        let Some(Object::Stream(stream)) = resolve(doc, object) else {
            continue;
        };
        if !matches!(stream.dict.get(b"Subtype"), Ok(Object::Name(subtype)) if subtype == b"Image") {
            continue;
        }
        images.push(PageImage {
            name: String::from_utf8_lossy(name).into_owned(),
            digest: hex::encode(Sha256::digest(&stream.content)),
            format: stream_format(stream),
            width: integer(doc, stream, b"Width"),
            height: integer(doc, stream, b"Height"),
            bits_per_component: if is_image_mask(stream) { 1 } else { integer(doc, stream, b"BitsPerComponent") },
            components: if is_image_mask(stream) { Some(1) } else { components(doc, stream) },
            stream: stream.clone(),
        });
    }
    images
}

fn integer(doc: &Document, stream: &Stream, key: &[u8]) -> u32 {
    match dict_entry(doc, &stream.dict, key) {
        Some(Object::Integer(value)) => u32::try_from(*value).unwrap_or(0),
        _ => 0,
    }
}

fn is_image_mask(stream: &Stream) -> bool {
    matches!(stream.dict.get(b"ImageMask"), Ok(Object::Boolean(true)))
}

fn filter_names(stream: &Stream) -> Vec<Vec<u8>> {
    match stream.dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(filters)) => filters
            .iter()
            .filter_map(|filter| match filter {
                Object::Name(name) => Some(name.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn stream_format(stream: &Stream) -> ImageFormat {
    let filters = filter_names(stream);
    match filters.iter().map(Vec::as_slice).collect::<Vec<_>>().as_slice() {
        [] | [b"FlateDecode"] => ImageFormat::Samples,
        [b"DCTDecode"] => ImageFormat::Jpeg,
        [b"JPXDecode"] => ImageFormat::Jpeg2000,
        _ => ImageFormat::Other,
    }
}

fn components(doc: &Document, stream: &Stream) -> Option<u32> {
    match dict_entry(doc, &stream.dict, b"ColorSpace")? {
        Object::Name(name) => match name.as_slice() {
            b"DeviceGray" | b"CalGray" => Some(1),
            b"DeviceRGB" | b"CalRGB" => Some(3),
            b"DeviceCMYK" => Some(4),
            _ => None,
        },
        Object::Array(family) => match family.first() {
            Some(Object::Name(kind)) if kind == b"ICCBased" => {
                let profile = family.get(1).and_then(|p| resolve_dict(doc, p))?;
                match dict_entry(doc, profile, b"N")? {
                    Object::Integer(n) => u32::try_from(*n).ok(),
                    _ => None,
                }
            }
            _ => None,
        },
        _ => None,
    }
}
