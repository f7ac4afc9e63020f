//! PDF loading, page lookup and page geometry using lopdf

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use shared_types::PageSize;

use crate::error::PdfError;

/// A page's MediaBox as origin plus extent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl MediaBox {
    pub fn size(&self) -> PageSize {
        PageSize::new(self.width, self.height)
    }
}

/// Wrapper around lopdf::Document addressing pages by zero-based index
pub struct PdfDocument {
    pub(crate) doc: Document,
}

impl PdfDocument {
    /// Load a PDF from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PdfError> {
        let doc = Document::load_mem(bytes).map_err(|e| PdfError::Parse(e.to_string()))?;
        Ok(Self { doc })
    }

    /// Build an empty document with one blank page per entry
    pub fn blank(pages: &[PageSize]) -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let kids: Vec<Object> = pages
            .iter()
            .map(|size| {
                let page_id = doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "MediaBox" => vec![
                        0.into(),
                        0.into(),
                        Object::Real(size.width as f32),
                        Object::Real(size.height as f32),
                    ],
                });
                Object::Reference(page_id)
            })
            .collect();

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => kids.len() as i64,
                "Kids" => kids,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        Self { doc }
    }

    /// Get the number of pages
    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Get page object ID for a zero-based page index
    pub fn page_id(&self, index: u32) -> Result<ObjectId, PdfError> {
        let pages = self.doc.get_pages();
        index
            .checked_add(1)
            .and_then(|page_num| pages.get(&page_num).copied())
            .ok_or(PdfError::PageIndexOutOfBounds {
                index,
                page_count: pages.len(),
            })
    }

    /// The page's MediaBox, inherited from ancestors when the page has none
    pub fn media_box(&self, index: u32) -> Result<Option<MediaBox>, PdfError> {
        let mut current = Some(self.page_id(index)?);

        while let Some(id) = current {
            let dict = self.dict(id)?;
            if let Ok(raw) = dict.get(b"MediaBox") {
                return self.parse_rect(raw).map(Some);
            }
            current = dict.get(b"Parent").and_then(Object::as_reference).ok();
        }

        Ok(None)
    }

    /// Physical page size, or `fallback` when the page declares no MediaBox
    pub fn page_size(&self, index: u32, fallback: PageSize) -> Result<PageSize, PdfError> {
        Ok(self
            .media_box(index)?
            .map(|mb| mb.size())
            .unwrap_or(fallback))
    }

    /// Decoded content operations of a page, in drawing order
    pub fn page_operations(&self, index: u32) -> Result<Vec<Operation>, PdfError> {
        let page_id = self.page_id(index)?;
        let bytes = self
            .doc
            .get_page_content(page_id)
            .map_err(|e| PdfError::Malformed(e.to_string()))?;
        let content = Content::decode(&bytes).map_err(|e| PdfError::Malformed(e.to_string()))?;
        Ok(content.operations)
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    /// Get mutable access to the internal document
    pub fn doc_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// Save the document to bytes
    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>, PdfError> {
        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| PdfError::Save(e.to_string()))?;
        Ok(buffer)
    }

    pub(crate) fn dict(&self, id: ObjectId) -> Result<&Dictionary, PdfError> {
        self.doc
            .get_object(id)
            .and_then(Object::as_dict)
            .map_err(|_| PdfError::Malformed(format!("object {} {} is not a dictionary", id.0, id.1)))
    }

    /// Parse a PDF rectangle array `[llx lly urx ury]`
    fn parse_rect(&self, obj: &Object) -> Result<MediaBox, PdfError> {
        let arr = match obj {
            Object::Array(a) => a,
            Object::Reference(id) => self
                .doc
                .get_object(*id)
                .and_then(Object::as_array)
                .map_err(|_| PdfError::Malformed("MediaBox reference is not an array".into()))?,
            _ => return Err(PdfError::Malformed("MediaBox is not an array".into())),
        };

        if arr.len() != 4 {
            return Err(PdfError::Malformed(format!(
                "MediaBox has {} elements, expected 4",
                arr.len()
            )));
        }

        let mut values = [0.0f64; 4];
        for (i, obj) in arr.iter().enumerate() {
            values[i] = self.extract_number(obj)?;
        }

        // Corners may be given in any order
        let (llx, urx) = (values[0].min(values[2]), values[0].max(values[2]));
        let (lly, ury) = (values[1].min(values[3]), values[1].max(values[3]));

        Ok(MediaBox {
            x: llx,
            y: lly,
            width: urx - llx,
            height: ury - lly,
        })
    }

    fn extract_number(&self, obj: &Object) -> Result<f64, PdfError> {
        match obj {
            Object::Integer(i) => Ok(*i as f64),
            Object::Real(r) => Ok(*r as f64),
            Object::Reference(id) => {
                let resolved = self
                    .doc
                    .get_object(*id)
                    .map_err(|e| PdfError::Malformed(e.to_string()))?;
                self.extract_number(resolved)
            }
            _ => Err(PdfError::Malformed("Expected number in rectangle".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn test_blank_document_round_trips() {
        let mut pdf = PdfDocument::blank(&[PageSize::A4, PageSize::LETTER]);
        let bytes = pdf.save_to_bytes().unwrap();
        assert!(bytes.starts_with(b"%PDF-"));

        let loaded = PdfDocument::from_bytes(&bytes).unwrap();
        assert_eq!(loaded.page_count(), 2);
    }

    #[test]
    fn test_page_sizes_are_per_page() {
        let pdf = PdfDocument::blank(&[PageSize::A4, PageSize::LETTER]);
        let first = pdf.page_size(0, PageSize::LETTER).unwrap();
        let second = pdf.page_size(1, PageSize::A4).unwrap();
        assert!(close(first.width, 595.28) && close(first.height, 841.89));
        assert_eq!(second, PageSize::LETTER);
    }

    #[test]
    fn test_page_index_out_of_bounds() {
        let pdf = PdfDocument::blank(&[PageSize::A4]);
        assert_eq!(
            pdf.page_id(1),
            Err(PdfError::PageIndexOutOfBounds {
                index: 1,
                page_count: 1
            })
        );
        assert!(pdf.page_id(u32::MAX).is_err());
    }

    #[test]
    fn test_media_box_inherited_from_parent() {
        let mut pdf = PdfDocument::blank(&[PageSize::LETTER]);
        let page_id = pdf.page_id(0).unwrap();
        let parent_id = pdf
            .dict(page_id)
            .unwrap()
            .get(b"Parent")
            .unwrap()
            .as_reference()
            .unwrap();

        let doc = pdf.doc_mut();
        doc.get_object_mut(page_id)
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .remove(b"MediaBox");
        doc.get_object_mut(parent_id)
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .set(
                "MediaBox",
                vec![0.into(), 0.into(), 300.into(), 400.into()],
            );

        assert_eq!(
            pdf.page_size(0, PageSize::A4).unwrap(),
            PageSize::new(300.0, 400.0)
        );
    }

    #[test]
    fn test_missing_media_box_uses_fallback() {
        let mut pdf = PdfDocument::blank(&[PageSize::LETTER]);
        let page_id = pdf.page_id(0).unwrap();
        pdf.doc_mut()
            .get_object_mut(page_id)
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .remove(b"MediaBox");

        assert_eq!(pdf.media_box(0).unwrap(), None);
        assert_eq!(pdf.page_size(0, PageSize::A4).unwrap(), PageSize::A4);
    }

    #[test]
    fn test_offset_media_box() {
        let mut pdf = PdfDocument::blank(&[PageSize::LETTER]);
        let page_id = pdf.page_id(0).unwrap();
        pdf.doc_mut()
            .get_object_mut(page_id)
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .set(
                "MediaBox",
                vec![10.into(), 20.into(), 622.into(), 812.into()],
            );

        let mb = pdf.media_box(0).unwrap().unwrap();
        assert_eq!((mb.x, mb.y), (10.0, 20.0));
        assert_eq!(mb.size(), PageSize::LETTER);
    }

    #[test]
    fn test_from_bytes_html_fails() {
        let html_bytes = b"<!DOCTYPE html><html><head></head><body>Not a PDF</body></html>";
        assert!(matches!(
            PdfDocument::from_bytes(html_bytes),
            Err(PdfError::Parse(_))
        ));
    }

    #[test]
    fn test_from_bytes_empty_fails() {
        assert!(PdfDocument::from_bytes(&[]).is_err());
    }

    #[test]
    fn test_blank_without_pages() {
        let mut pdf = PdfDocument::blank(&[]);
        let bytes = pdf.save_to_bytes().unwrap();
        assert_eq!(PdfDocument::from_bytes(&bytes).unwrap().page_count(), 0);
    }

    #[test]
    fn test_extract_number() {
        let pdf = PdfDocument::blank(&[]);
        assert_eq!(pdf.extract_number(&Object::Integer(42)).unwrap(), 42.0);
        assert!((pdf.extract_number(&Object::Real(1.234)).unwrap() - 1.234).abs() < 0.001);
        assert!(pdf.extract_number(&Object::Null).is_err());
    }
}
