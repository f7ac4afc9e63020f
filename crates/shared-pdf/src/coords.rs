//! Coordinate transformation between capture space and page space
//!
//! Capture space is the rendering surface a field was placed on: pixels,
//! origin top-left, relative to a viewport. Page space is the document's own
//! coordinate system: points, origin bottom-left, fixed per page.

use shared_types::{CaptureRect, NormalizedRect, PageRect, PageSize, ViewportSize};

use crate::error::PdfError;

fn check_viewport(viewport: ViewportSize) -> Result<(), PdfError> {
    if viewport.is_valid() {
        Ok(())
    } else {
        Err(PdfError::InvalidViewport {
            width: viewport.width,
            height: viewport.height,
        })
    }
}

fn check_rect(rect: &CaptureRect) -> Result<(), PdfError> {
    if rect.is_valid() {
        Ok(())
    } else {
        Err(PdfError::InvalidRect {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        })
    }
}

fn check_page(page: PageSize) -> Result<(), PdfError> {
    if page.is_valid() {
        Ok(())
    } else {
        Err(PdfError::InvalidPageSize {
            width: page.width,
            height: page.height,
        })
    }
}

/// Convert a capture-space box into page space.
///
/// The box is anchored by its top edge in capture space, so the flipped `y`
/// is the distance from the page bottom to the box's lower edge.
pub fn to_page_space(
    rect: &CaptureRect,
    viewport: ViewportSize,
    page: PageSize,
) -> Result<PageRect, PdfError> {
    check_viewport(viewport)?;
    check_page(page)?;
    check_rect(rect)?;

    let scale_x = page.width / viewport.width;
    let scale_y = page.height / viewport.height;

    let width = rect.width * scale_x;
    let height = rect.height * scale_y;
    let y_from_top = rect.y * scale_y;

    Ok(PageRect {
        x: rect.x * scale_x,
        y: page.height - y_from_top - height,
        width,
        height,
    })
}

/// Convert a page-space box back onto a capture surface of the given size
pub fn to_capture_space(
    rect: &PageRect,
    page_index: u32,
    viewport: ViewportSize,
    page: PageSize,
) -> Result<CaptureRect, PdfError> {
    check_viewport(viewport)?;
    check_page(page)?;

    let scale_x = viewport.width / page.width;
    let scale_y = viewport.height / page.height;

    let y_from_top = page.height - rect.y - rect.height;

    Ok(CaptureRect {
        x: rect.x * scale_x,
        y: y_from_top * scale_y,
        width: rect.width * scale_x,
        height: rect.height * scale_y,
        page_index,
    })
}

/// Express a capture-space box as fractions of its viewport
pub fn normalize(rect: &CaptureRect, viewport: ViewportSize) -> Result<NormalizedRect, PdfError> {
    check_viewport(viewport)?;

    Ok(NormalizedRect {
        x_percent: rect.x / viewport.width,
        y_percent: rect.y / viewport.height,
        width_percent: rect.width / viewport.width,
        height_percent: rect.height / viewport.height,
        page_index: rect.page_index,
    })
}

/// Re-place a normalized box on a (possibly resized) viewport
pub fn denormalize(rect: &NormalizedRect, viewport: ViewportSize) -> Result<CaptureRect, PdfError> {
    check_viewport(viewport)?;

    Ok(CaptureRect {
        x: rect.x_percent * viewport.width,
        y: rect.y_percent * viewport.height,
        width: rect.width_percent * viewport.width,
        height: rect.height_percent * viewport.height,
        page_index: rect.page_index,
    })
}
