//! Low-level drawing onto a page: resources, content streams and operator snippets
//!
//! Marks are flattened into the page content rather than added as
//! annotations, so they survive any viewer and cannot be toggled off.

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Dictionary, Object, ObjectId, Stream};
use shared_types::PageRect;
use std::io::Write;

use crate::error::PdfError;
use crate::parser::PdfDocument;

const OPEN_BRACKET: &[u8] = b"q\n";
const CLOSE_BRACKET: &[u8] = b"\nQ\n";

/// Control-point factor for approximating a quarter circle with one cubic Bézier
const KAPPA: f64 = 0.552_284_749_8;

/// Map a character to its WinAnsiEncoding code, if it has one
fn win_ansi_code(c: char) -> Option<u8> {
    let code = match c {
        '\u{20}'..='\u{7e}' | '\u{a0}'..='\u{ff}' => c as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8a,
        '‹' => 0x8b,
        'Œ' => 0x8c,
        'Ž' => 0x8e,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201c}' => 0x93,
        '\u{201d}' => 0x94,
        '•' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9a,
        '›' => 0x9b,
        'œ' => 0x9c,
        'ž' => 0x9e,
        'Ÿ' => 0x9f,
        _ => return None,
    };
    Some(code)
}

/// Encode text for a WinAnsi font and escape it for a PDF string literal.
///
/// Bytes outside printable ASCII are written as `\ddd` octal escapes.
/// Line breaks and tabs become spaces; anything else WinAnsi cannot
/// represent is an error rather than a silent substitution.
pub fn escape_pdf_string(s: &str) -> Result<String, PdfError> {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        let c = if matches!(c, '\n' | '\r' | '\t') { ' ' } else { c };
        let code = win_ansi_code(c).ok_or(PdfError::UnencodableCharacter(c))?;
        match code {
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            b'\\' => out.push_str("\\\\"),
            0x20..=0x7e => out.push(code as char),
            _ => out.push_str(&format!("\\{:03o}", code)),
        }
    }
    Ok(out)
}

/// Stream encoding of an image's samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    /// Uncompressed samples, Flate-compressed on embedding
    Raw,
    /// A complete JPEG file, embedded as-is
    Dct,
}

/// An image ready to become an `/XObject /Image`
#[derive(Debug, Clone)]
pub struct ImageXObject {
    pub width: u32,
    pub height: u32,
    /// `DeviceRGB`, `DeviceGray` or `DeviceCMYK`
    pub color_space: &'static str,
    pub encoding: ImageEncoding,
    pub data: Vec<u8>,
    /// 8-bit soft mask, one byte per pixel
    pub alpha: Option<Vec<u8>>,
    /// Samples are stored inverted (Adobe CMYK JPEGs)
    pub inverted: bool,
}

impl ImageXObject {
    fn components(&self) -> usize {
        match self.color_space {
            "DeviceGray" => 1,
            "DeviceCMYK" => 4,
            _ => 3,
        }
    }
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, PdfError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| PdfError::Encode(e.to_string()))?;
    encoder.finish().map_err(|e| PdfError::Encode(e.to_string()))
}

/// `q w 0 0 h x y cm /Name Do Q`
pub fn image_operations(name: &str, rect: &PageRect) -> String {
    format!(
        "q\n{w:.4} 0 0 {h:.4} {x:.4} {y:.4} cm\n/{name} Do\nQ\n",
        w = rect.width,
        h = rect.height,
        x = rect.x,
        y = rect.y,
        name = name,
    )
}

/// Single-line black text starting at `(x, y)`
pub fn text_operations(
    font: &str,
    font_size: f64,
    x: f64,
    y: f64,
    text: &str,
) -> Result<String, PdfError> {
    Ok(format!(
        "q\n0 0 0 rg\nBT\n/{font} {fs:.2} Tf\n{x:.4} {y:.4} Td\n({text}) Tj\nET\nQ\n",
        font = font,
        fs = font_size,
        x = x,
        y = y,
        text = escape_pdf_string(text)?,
    ))
}

/// Path of a full circle built from four Bézier arcs, without a painting operator
pub fn circle_path(cx: f64, cy: f64, r: f64) -> String {
    let k = r * KAPPA;
    format!(
        "{x0:.4} {cy:.4} m\n\
{x0:.4} {a1:.4} {b1:.4} {y1:.4} {cx:.4} {y1:.4} c\n\
{b0:.4} {y1:.4} {x2:.4} {a1:.4} {x2:.4} {cy:.4} c\n\
{x2:.4} {a0:.4} {b0:.4} {y3:.4} {cx:.4} {y3:.4} c\n\
{b1:.4} {y3:.4} {x0:.4} {a0:.4} {x0:.4} {cy:.4} c\n\
h\n",
        x0 = cx + r,
        x2 = cx - r,
        y1 = cy + r,
        y3 = cy - r,
        a0 = cy - k,
        a1 = cy + k,
        b0 = cx - k,
        b1 = cx + k,
        cx = cx,
        cy = cy,
    )
}

/// Black outline circle of the given stroke width
pub fn stroked_circle_operations(cx: f64, cy: f64, r: f64, line_width: f64) -> String {
    format!(
        "q\n0 0 0 RG\n{lw:.2} w\n{path}S\nQ\n",
        lw = line_width,
        path = circle_path(cx, cy, r),
    )
}

/// Solid black disc
pub fn filled_circle_operations(cx: f64, cy: f64, r: f64) -> String {
    format!("q\n0 0 0 rg\n{path}f\nQ\n", path = circle_path(cx, cy, r))
}

impl PdfDocument {
    /// Embed an image (and its soft mask) as indirect objects
    pub fn add_image(&mut self, image: &ImageXObject) -> Result<ObjectId, PdfError> {
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width as i64,
            "Height" => image.height as i64,
            "ColorSpace" => image.color_space,
            "BitsPerComponent" => 8i64,
        };

        let data = match image.encoding {
            ImageEncoding::Raw => {
                dict.set("Filter", "FlateDecode");
                deflate(&image.data)?
            }
            ImageEncoding::Dct => {
                dict.set("Filter", "DCTDecode");
                image.data.clone()
            }
        };

        if image.inverted {
            let decode: Vec<Object> = (0..image.components())
                .flat_map(|_| [Object::Integer(1), Object::Integer(0)])
                .collect();
            dict.set("Decode", decode);
        }

        if let Some(ref alpha) = image.alpha {
            let smask = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => image.width as i64,
                    "Height" => image.height as i64,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8i64,
                    "Filter" => "FlateDecode",
                },
                deflate(alpha)?,
            );
            let smask_id = self.doc.add_object(smask);
            dict.set("SMask", smask_id);
        }

        Ok(self.doc.add_object(Stream::new(dict, data)))
    }

    /// Add a Standard-14 font object (WinAnsi encoded)
    pub fn add_standard_font(&mut self, base_font: &str) -> ObjectId {
        self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => Object::Name(base_font.as_bytes().to_vec()),
            "Encoding" => "WinAnsiEncoding",
        })
    }

    /// Register `target` under a fresh name in the page's `/XObject` resources
    pub fn register_xobject(&mut self, index: u32, target: ObjectId) -> Result<String, PdfError> {
        self.add_resource(index, b"XObject", "Im", target)
    }

    /// Register `target` under a fresh name in the page's `/Font` resources
    pub fn register_font(&mut self, index: u32, target: ObjectId) -> Result<String, PdfError> {
        self.add_resource(index, b"Font", "F", target)
    }

    /// Append a content stream after the page's existing content.
    ///
    /// The page's prior content is bracketed by `q`/`Q` once, so graphics
    /// state it leaves behind cannot displace the new marks. Later appends
    /// go after that bracket without nesting it again, which means appended
    /// content must restore any graphics state it changes.
    pub fn append_content(&mut self, index: u32, content: Vec<u8>) -> Result<(), PdfError> {
        let page_id = self.page_id(index)?;

        let existing: Vec<Object> = match self.dict(page_id)?.get(b"Contents") {
            Ok(Object::Reference(id)) => match self.doc.get_object(*id) {
                Ok(Object::Array(arr)) => arr.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(arr)) => arr.clone(),
            Ok(_) => return Err(PdfError::Malformed("page Contents is neither stream nor array".into())),
            Err(_) => Vec::new(),
        };

        let mut contents = Vec::with_capacity(existing.len() + 3);
        if existing.is_empty() || self.is_bracketed(&existing) {
            contents.extend(existing);
        } else {
            let open = self
                .doc
                .add_object(Stream::new(Dictionary::new(), OPEN_BRACKET.to_vec()));
            let close = self
                .doc
                .add_object(Stream::new(Dictionary::new(), CLOSE_BRACKET.to_vec()));
            contents.push(Object::Reference(open));
            contents.extend(existing);
            contents.push(Object::Reference(close));
        }
        let stream_id = self.doc.add_object(Stream::new(Dictionary::new(), content));
        contents.push(Object::Reference(stream_id));

        self.page_dict_mut(page_id)?
            .set("Contents", Object::Array(contents));
        Ok(())
    }

    /// Whether `contents` already starts with our opening bracket and closes it later
    fn is_bracketed(&self, contents: &[Object]) -> bool {
        let mut streams = contents.iter().map(|obj| self.stream_bytes(obj));
        streams.next() == Some(Some(OPEN_BRACKET))
            && streams.any(|bytes| bytes == Some(CLOSE_BRACKET))
    }

    fn stream_bytes(&self, obj: &Object) -> Option<&[u8]> {
        let id = obj.as_reference().ok()?;
        let stream = self.doc.get_object(id).and_then(Object::as_stream).ok()?;
        Some(stream.content.as_slice())
    }

    /// Copy the page's effective resources into a page-local dictionary and
    /// add `target` to `category` under an unused `prefix<n>` name.
    fn add_resource(
        &mut self,
        index: u32,
        category: &[u8],
        prefix: &str,
        target: ObjectId,
    ) -> Result<String, PdfError> {
        let page_id = self.page_id(index)?;
        let mut resources = self.effective_resources(page_id)?;

        let mut entries = match resources.get(category) {
            Ok(obj) => self.resolve_dict(obj)?,
            Err(_) => Dictionary::new(),
        };

        let mut n = entries.len() + 1;
        while entries.has(format!("{}{}", prefix, n).as_bytes()) {
            n += 1;
        }
        let name = format!("{}{}", prefix, n);

        entries.set(name.clone(), Object::Reference(target));
        resources.set(category.to_vec(), Object::Dictionary(entries));
        self.page_dict_mut(page_id)?
            .set("Resources", Object::Dictionary(resources));

        Ok(name)
    }

    /// Resources of the page or the nearest ancestor that declares them
    fn effective_resources(&self, page_id: ObjectId) -> Result<Dictionary, PdfError> {
        let mut current = Some(page_id);
        while let Some(id) = current {
            let dict = self.dict(id)?;
            if let Ok(resources) = dict.get(b"Resources") {
                return self.resolve_dict(resources);
            }
            current = dict.get(b"Parent").and_then(Object::as_reference).ok();
        }
        Ok(Dictionary::new())
    }

    fn resolve_dict(&self, obj: &Object) -> Result<Dictionary, PdfError> {
        match obj {
            Object::Dictionary(dict) => Ok(dict.clone()),
            Object::Reference(id) => self.dict(*id).cloned(),
            _ => Err(PdfError::Malformed("expected a dictionary".into())),
        }
    }

    fn page_dict_mut(&mut self, page_id: ObjectId) -> Result<&mut Dictionary, PdfError> {
        self.doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|_| PdfError::Malformed("page is not a dictionary".into()))
    }
}
