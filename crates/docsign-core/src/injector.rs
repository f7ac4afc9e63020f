//! Field Injector: draws one field onto one page of a document revision

use shared_pdf::content::{
    filled_circle_operations, image_operations, stroked_circle_operations, text_operations,
};
use shared_pdf::{to_page_space, PdfDocument};
use shared_types::{Field, FieldContent, PageRect, RasterPayload, ViewportSize};
use tracing::debug;

use crate::config::InjectionConfig;
use crate::error::{InjectionError, Result};
use crate::raster;

/// Circle geometry for a choice marker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChoiceMarker {
    pub cx: f64,
    pub cy: f64,
    pub radius: f64,
    /// Radius of the filled dot, present only when selected
    pub dot_radius: Option<f64>,
}

/// Largest box with the image's aspect ratio that fits `target`, centred on the slack axis
pub fn fit_image(image_width: f64, image_height: f64, target: &PageRect) -> PageRect {
    let image_aspect = image_width / image_height;
    let box_aspect = target.aspect_ratio();

    if image_aspect > box_aspect {
        // Relatively wider than the box: clamp width
        let height = target.width / image_aspect;
        PageRect::new(
            target.x,
            target.y + (target.height - height) / 2.0,
            target.width,
            height,
        )
    } else {
        let width = target.height * image_aspect;
        PageRect::new(
            target.x + (target.width - width) / 2.0,
            target.y,
            width,
            target.height,
        )
    }
}

pub struct FieldInjector {
    config: InjectionConfig,
}

impl FieldInjector {
    pub fn new(config: InjectionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &InjectionConfig {
        &self.config
    }

    /// Produce a new revision with `field` drawn onto its page.
    ///
    /// `revision` is never modified. An incomplete field is an error here;
    /// the pipeline filters those out before calling.
    pub fn inject(&self, revision: &[u8], field: &Field, viewport: ViewportSize) -> Result<Vec<u8>> {
        let mut pdf = PdfDocument::from_bytes(revision)?;
        self.draw(&mut pdf, field, viewport)?;
        Ok(pdf.save_to_bytes()?)
    }

    /// Resolve the field's box in page space, honouring a MediaBox origin
    pub fn page_rect(
        &self,
        pdf: &PdfDocument,
        field: &Field,
        viewport: ViewportSize,
    ) -> Result<PageRect> {
        if !viewport.is_valid() {
            return Err(InjectionError::InvalidViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }

        let index = field.page_index();
        let (page_size, origin) = match pdf.media_box(index)? {
            Some(mb) => (mb.size(), (mb.x, mb.y)),
            None => (self.config.fallback_page_size, (0.0, 0.0)),
        };

        let mut rect = to_page_space(field.rect(), viewport, page_size)?;
        rect.x += origin.0;
        rect.y += origin.1;

        debug!(
            kind = %field.kind(),
            page = index,
            x = rect.x,
            y = rect.y,
            width = rect.width,
            height = rect.height,
            "Resolved field box in page space"
        );
        Ok(rect)
    }

    pub(crate) fn draw(&self, pdf: &mut PdfDocument, field: &Field, viewport: ViewportSize) -> Result<()> {
        let content = field
            .content()
            .ok_or(InjectionError::IncompleteField { kind: field.kind() })?;
        let rect = self.page_rect(pdf, field, viewport)?;
        let page = field.page_index();

        let operations = match content {
            FieldContent::Raster(payload) => self.raster_operations(pdf, page, payload, &rect)?,
            FieldContent::Text(text) => {
                let font_size = field.font_size().unwrap_or(self.config.font_size);
                if !(font_size.is_finite() && font_size > 0.0) {
                    return Err(InjectionError::InvalidFontSize(font_size));
                }
                self.text_operations(pdf, page, text, font_size, &rect)?
            }
            FieldContent::Choice(selected) => self.choice_operations(&rect, selected),
        };

        pdf.append_content(page, operations.into_bytes())?;
        Ok(())
    }

    fn raster_operations(
        &self,
        pdf: &mut PdfDocument,
        page: u32,
        payload: &RasterPayload,
        rect: &PageRect,
    ) -> Result<String> {
        let xobject = raster::to_xobject(payload)?;
        let drawn = fit_image(xobject.width as f64, xobject.height as f64, rect);

        let image_id = pdf.add_image(&xobject)?;
        let name = pdf.register_xobject(page, image_id)?;
        debug!(
            name = %name,
            width = drawn.width,
            height = drawn.height,
            "Embedded image"
        );
        Ok(image_operations(&name, &drawn))
    }

    fn text_operations(
        &self,
        pdf: &mut PdfDocument,
        page: u32,
        text: &str,
        font_size: f64,
        rect: &PageRect,
    ) -> Result<String> {
        let (x, y) = self.text_origin(rect, font_size);
        let font_id = pdf.add_standard_font(&self.config.font);
        let name = pdf.register_font(page, font_id)?;
        Ok(text_operations(&name, font_size, x, y, text)?)
    }

    /// Left-aligned with a fixed inset, centred on the box's vertical midline
    pub fn text_origin(&self, rect: &PageRect, font_size: f64) -> (f64, f64) {
        (
            rect.x + self.config.text_inset,
            rect.y + rect.height / 2.0 - font_size / 2.0,
        )
    }

    pub fn choice_marker(&self, rect: &PageRect, selected: bool) -> ChoiceMarker {
        let (cx, cy) = rect.center();
        let half = rect.width.min(rect.height) / 2.0;
        let inset = half - self.config.choice_inset;
        // Boxes smaller than the inset would invert the circle
        let radius = if inset > 0.0 { inset } else { half };

        ChoiceMarker {
            cx,
            cy,
            radius,
            dot_radius: selected.then(|| radius * self.config.choice_fill_ratio),
        }
    }

    fn choice_operations(&self, rect: &PageRect, selected: bool) -> String {
        let marker = self.choice_marker(rect, selected);
        let mut ops = stroked_circle_operations(
            marker.cx,
            marker.cy,
            marker.radius,
            self.config.choice_stroke_width,
        );
        if let Some(dot) = marker.dot_radius {
            ops.push_str(&filled_circle_operations(marker.cx, marker.cy, dot));
        }
        ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::fixtures;
    use shared_types::{CaptureRect, PageSize, RasterFormat};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.01
    }

    fn injector() -> FieldInjector {
        FieldInjector::new(InjectionConfig::default()).unwrap()
    }

    fn letter_pdf() -> Vec<u8> {
        PdfDocument::blank(&[PageSize::LETTER]).save_to_bytes().unwrap()
    }

    fn operators(bytes: &[u8]) -> Vec<String> {
        PdfDocument::from_bytes(bytes)
            .unwrap()
            .page_operations(0)
            .unwrap()
            .into_iter()
            .map(|op| op.operator)
            .collect()
    }

    #[test]
    fn test_fit_wide_image() {
        let target = PageRect::new(74.41, 107.15, 148.82, 45.92);
        let drawn = fit_image(400.0, 100.0, &target);
        assert!(close(drawn.width, 148.82));
        assert!(close(drawn.height, 37.205));
        assert!(close(drawn.y - target.y, 4.36));
        assert!(close(drawn.x, target.x));
    }

    #[test]
    fn test_fit_tall_image() {
        let target = PageRect::new(0.0, 0.0, 200.0, 50.0);
        let drawn = fit_image(100.0, 100.0, &target);
        assert!(close(drawn.width, 50.0));
        assert!(close(drawn.height, 50.0));
        assert!(close(drawn.x, 75.0));
        assert!(close(drawn.y, 0.0));
    }

    #[test]
    fn test_text_origin() {
        let rect = PageRect::new(100.0, 200.0, 150.0, 30.0);
        assert_eq!(injector().text_origin(&rect, 12.0), (105.0, 209.0));
    }

    #[test]
    fn test_choice_marker() {
        let rect = PageRect::new(0.0, 0.0, 20.0, 30.0);
        let unselected = injector().choice_marker(&rect, false);
        assert_eq!(
            unselected,
            ChoiceMarker {
                cx: 10.0,
                cy: 15.0,
                radius: 8.0,
                dot_radius: None
            }
        );
        let selected = injector().choice_marker(&rect, true);
        assert!(close(selected.dot_radius.unwrap(), 4.8));
    }

    #[test]
    fn test_choice_marker_tiny_box() {
        let rect = PageRect::new(0.0, 0.0, 3.0, 3.0);
        let marker = injector().choice_marker(&rect, false);
        assert!(marker.radius > 0.0);
    }

    #[test]
    fn test_inject_text() {
        let original = letter_pdf();
        let field = Field::Text {
            rect: CaptureRect::new(50.0, 50.0, 200.0, 30.0, 0),
            text: Some("Jane Doe".into()),
            font_size: None,
        };
        let out = injector()
            .inject(&original, &field, ViewportSize::new(612.0, 792.0))
            .unwrap();

        assert_ne!(out, original);
        let ops = operators(&out);
        assert!(ops.contains(&"Tj".to_string()));
        assert!(ops.contains(&"Tf".to_string()));
    }

    #[test]
    fn test_inject_choice_selected_and_unselected() {
        let original = letter_pdf();
        let viewport = ViewportSize::new(612.0, 792.0);
        let rect = CaptureRect::new(10.0, 10.0, 20.0, 20.0, 0);

        let off = injector()
            .inject(&original, &Field::Choice { rect, selected: false }, viewport)
            .unwrap();
        let on = injector()
            .inject(&original, &Field::Choice { rect, selected: true }, viewport)
            .unwrap();

        let off_ops = operators(&off);
        let on_ops = operators(&on);
        assert!(off_ops.contains(&"S".to_string()));
        assert!(!off_ops.contains(&"f".to_string()));
        assert!(on_ops.contains(&"S".to_string()));
        assert!(on_ops.contains(&"f".to_string()));
    }

    #[test]
    fn test_inject_png_signature() {
        let original = letter_pdf();
        let field = Field::Signature {
            rect: CaptureRect::new(100.0, 600.0, 200.0, 60.0, 0),
            image: Some(RasterPayload::new(RasterFormat::Png, fixtures::png(40, 10, false))),
        };
        let out = injector()
            .inject(&original, &field, ViewportSize::new(612.0, 792.0))
            .unwrap();

        let ops = operators(&out);
        assert!(ops.contains(&"Do".to_string()));
        assert!(ops.contains(&"cm".to_string()));
    }

    #[test]
    fn test_incomplete_field_is_rejected() {
        let field = Field::Signature {
            rect: CaptureRect::new(0.0, 0.0, 10.0, 10.0, 0),
            image: None,
        };
        assert!(matches!(
            injector().inject(&letter_pdf(), &field, ViewportSize::new(100.0, 100.0)),
            Err(InjectionError::IncompleteField { .. })
        ));
    }

    #[test]
    fn test_page_out_of_range() {
        let field = Field::Choice {
            rect: CaptureRect::new(0.0, 0.0, 10.0, 10.0, 2),
            selected: true,
        };
        assert!(matches!(
            injector().inject(&letter_pdf(), &field, ViewportSize::new(100.0, 100.0)),
            Err(InjectionError::PageIndexOutOfBounds {
                index: 2,
                page_count: 1
            })
        ));
    }

    #[test]
    fn test_invalid_viewport() {
        let field = Field::Choice {
            rect: CaptureRect::new(0.0, 0.0, 10.0, 10.0, 0),
            selected: false,
        };
        assert!(matches!(
            injector().inject(&letter_pdf(), &field, ViewportSize::new(0.0, 100.0)),
            Err(InjectionError::InvalidViewport { .. })
        ));
    }

    #[test]
    fn test_page_rect_honours_media_box_origin() {
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

        let field = Field::Choice {
            rect: CaptureRect::new(0.0, 0.0, 612.0, 792.0, 0),
            selected: false,
        };
        let rect = injector()
            .page_rect(&pdf, &field, ViewportSize::new(612.0, 792.0))
            .unwrap();
        assert!(close(rect.x, 10.0));
        assert!(close(rect.y, 20.0));
    }

    #[test]
    fn test_degenerate_boxes_are_rejected() {
        let viewport = ViewportSize::new(800.0, 1100.0);
        for rect in [
            CaptureRect::new(f64::NAN, 10.0, 20.0, 20.0, 0),
            CaptureRect::new(100.0, 900.0, 200.0, 0.0, 0),
        ] {
            let field = Field::Choice {
                rect,
                selected: true,
            };
            assert!(matches!(
                injector().inject(&letter_pdf(), &field, viewport),
                Err(InjectionError::InvalidRect { .. })
            ));
        }
    }

    #[test]
    fn test_font_size_override_is_validated() {
        for font_size in [0.0, -4.0, f64::NAN] {
            let field = Field::Text {
                rect: CaptureRect::new(50.0, 50.0, 200.0, 30.0, 0),
                text: Some("Jane".into()),
                font_size: Some(font_size),
            };
            let result = injector().inject(&letter_pdf(), &field, ViewportSize::new(612.0, 792.0));
            assert!(matches!(result, Err(InjectionError::InvalidFontSize(_))));
        }
    }

    #[test]
    fn test_unencodable_text_is_rejected() {
        let field = Field::Text {
            rect: CaptureRect::new(50.0, 50.0, 200.0, 30.0, 0),
            text: Some("山田".into()),
            font_size: None,
        };
        assert!(matches!(
            injector().inject(&letter_pdf(), &field, ViewportSize::new(612.0, 792.0)),
            Err(InjectionError::UnsupportedCharacter('山'))
        ));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = InjectionConfig {
            font_size: 0.0,
            ..InjectionConfig::default()
        };
        assert!(FieldInjector::new(config).is_err());
    }
}
