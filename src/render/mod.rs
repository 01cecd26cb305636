// Certificate rendering: decode the stored template, draw the recipient name
// at the configured position, and encode the result as PNG and PDF.

mod fonts;
mod pdf;

pub use fonts::NO_SCALABLE_FONT_WARNING;

use std::fmt;
use std::io::Cursor;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};
use rusttype::{point, Font, Scale};

use crate::session::Session;
use fonts::ResolvedFont;

type Canvas = ImageBuffer<Rgba<u8>, Vec<u8>>;

#[derive(Debug)]
pub enum RenderError {
    InvalidTemplate(String),
    InvalidFont(String),
    EncodeFailure(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::InvalidTemplate(msg) => write!(f, "template is not a usable image: {}", msg),
            RenderError::InvalidFont(msg) => write!(f, "font is not usable: {}", msg),
            RenderError::EncodeFailure(msg) => write!(f, "output encoding failed: {}", msg),
        }
    }
}

impl std::error::Error for RenderError {}

/// Both output buffers of one generation, kept in the session so the
/// download endpoints can serve them. Either both exist or the render failed.
#[derive(Debug, Clone)]
pub struct RenderedCertificate {
    pub png: Vec<u8>,
    pub pdf: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub warnings: Vec<String>,
}

pub fn render(session: &Session, name: &str) -> Result<RenderedCertificate, RenderError> {
    render_with_candidates(
        session,
        name,
        fonts::ARIAL_CANDIDATES,
        fonts::DEJAVU_CANDIDATES,
    )
}

pub(crate) fn render_with_candidates(
    session: &Session,
    name: &str,
    arial_candidates: &[&str],
    dejavu_candidates: &[&str],
) -> Result<RenderedCertificate, RenderError> {
    let template = session
        .template
        .as_deref()
        .ok_or_else(|| RenderError::InvalidTemplate("no template configured".to_string()))?;

    let decoded = image::load_from_memory(template)
        .map_err(|e| RenderError::InvalidTemplate(e.to_string()))?;
    let mut canvas = decoded.to_rgba8();

    let resolution = fonts::resolve_with_candidates(
        session.font.as_deref(),
        session.font_size,
        arial_candidates,
        dejavu_candidates,
    )?;

    // A malformed stored color should never happen through the UI; fall back
    // to opaque black rather than failing the whole render.
    let color = hex_color(&session.font_color).unwrap_or(Rgba([0, 0, 0, 255]));

    // (name_x, name_y) is the text's top-left anchor; overflow past the image
    // bounds is clipped during blending, never wrapped or rejected.
    match &resolution.font {
        ResolvedFont::Scalable { font, scale } => draw_text(
            &mut canvas,
            font,
            *scale,
            session.name_x as i32,
            session.name_y as i32,
            color,
            name,
        ),
        ResolvedFont::Bitmap => draw_bitmap_text(
            &mut canvas,
            session.name_x as i32,
            session.name_y as i32,
            color,
            name,
        ),
    }

    let (width, height) = canvas.dimensions();

    let mut png = Vec::new();
    DynamicImage::ImageRgba8(canvas.clone())
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| RenderError::EncodeFailure(format!("PNG encoding failed: {}", e)))?;

    // The PDF embeds an opaque image; flatten any alpha first.
    let rgb = DynamicImage::ImageRgba8(canvas).to_rgb8();
    let pdf = pdf::encode_single_page_pdf(&rgb)?;

    Ok(RenderedCertificate {
        png,
        pdf,
        width,
        height,
        warnings: resolution.warnings,
    })
}

/// Parses `#RRGGBB` into an opaque pixel.
fn hex_color(s: &str) -> Option<Rgba<u8>> {
    let s = s.trim().trim_start_matches('#');
    if s.len() != 6 {
        return None;
    }
    let b = hex::decode(s).ok()?;
    Some(Rgba([b[0], b[1], b[2], 255]))
}

fn blend_pixel(canvas: &mut Canvas, x: i32, y: i32, color: Rgba<u8>, coverage: f32) {
    if x < 0 || y < 0 || coverage <= 0.0 {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    if x >= canvas.width() || y >= canvas.height() {
        return;
    }
    let dst = canvas.get_pixel_mut(x, y);
    let inv = 1.0 - coverage;
    dst.0[0] = (color.0[0] as f32 * coverage + dst.0[0] as f32 * inv) as u8;
    dst.0[1] = (color.0[1] as f32 * coverage + dst.0[1] as f32 * inv) as u8;
    dst.0[2] = (color.0[2] as f32 * coverage + dst.0[2] as f32 * inv) as u8;
    dst.0[3] = 255;
}

/// Draws `text` with `(x, y)` as the top of the line; the baseline sits one
/// ascent below, matching top-left anchoring.
fn draw_text(
    canvas: &mut Canvas,
    font: &Font<'static>,
    scale: Scale,
    x: i32,
    y: i32,
    color: Rgba<u8>,
    text: &str,
) {
    let v_metrics = font.v_metrics(scale);
    let baseline = y as f32 + v_metrics.ascent;

    for glyph in font.layout(text, scale, point(x as f32, baseline)) {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, coverage| {
                blend_pixel(
                    canvas,
                    gx as i32 + bb.min.x,
                    gy as i32 + bb.min.y,
                    color,
                    coverage,
                );
            });
        }
    }
}

/// Last-resort text drawing with the built-in 8x8 bitmap glyphs at native
/// size. Characters outside basic ASCII are drawn as a blank cell.
fn draw_bitmap_text(canvas: &mut Canvas, x: i32, y: i32, color: Rgba<u8>, text: &str) {
    const GLYPH_SIZE: i32 = 8;
    let mut caret = x;
    for ch in text.chars() {
        let glyph = font8x8::legacy::BASIC_LEGACY
            .get(ch as usize)
            .copied()
            .unwrap_or([0u8; 8]);
        for (row_idx, row) in glyph.iter().enumerate() {
            for col in 0..GLYPH_SIZE {
                if (row >> col) & 1 == 1 {
                    blend_pixel(canvas, caret + col, y + row_idx as i32, color, 1.0);
                }
            }
        }
        caret += GLYPH_SIZE;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn template_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([250, 250, 240]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn session_with_template() -> Session {
        let mut s = Session::default();
        s.set_template(template_png(400, 240));
        s.set_position(40, 60);
        s
    }

    #[test]
    fn renders_png_and_pdf_with_bitmap_fallback() {
        let session = session_with_template();
        // Empty candidate lists force the bitmap path regardless of the host
        // machine's installed fonts.
        let out = render_with_candidates(&session, "Jane Doe", &[], &[]).unwrap();
        assert!(!out.png.is_empty());
        assert!(out.pdf.starts_with(b"%PDF"));
        assert_eq!((out.width, out.height), (400, 240));
        assert_eq!(out.warnings, vec![NO_SCALABLE_FONT_WARNING.to_string()]);
    }

    #[test]
    fn bitmap_text_changes_pixels_at_the_anchor() {
        let session = session_with_template();
        let out = render_with_candidates(&session, "MMMM", &[], &[]).unwrap();
        let rendered = image::load_from_memory(&out.png).unwrap().to_rgba8();
        let blank = image::load_from_memory(&session.template.clone().unwrap())
            .unwrap()
            .to_rgba8();
        assert_ne!(rendered.as_raw(), blank.as_raw());
    }

    #[test]
    fn undecodable_template_is_invalid_template() {
        let mut session = Session::default();
        session.set_template(b"definitely not an image".to_vec());
        let err = render_with_candidates(&session, "Jane", &[], &[]).unwrap_err();
        assert!(matches!(err, RenderError::InvalidTemplate(_)));
    }

    #[test]
    fn missing_template_is_invalid_template() {
        let session = Session::default();
        let err = render_with_candidates(&session, "Jane", &[], &[]).unwrap_err();
        assert!(matches!(err, RenderError::InvalidTemplate(_)));
    }

    #[test]
    fn garbage_uploaded_font_is_invalid_font() {
        let mut session = session_with_template();
        session.set_font(b"not a ttf".to_vec());
        let err = render_with_candidates(&session, "Jane", &[], &[]).unwrap_err();
        assert!(matches!(err, RenderError::InvalidFont(_)));
    }

    #[test]
    fn overflow_position_is_accepted() {
        let mut session = session_with_template();
        session.set_position(2000, 2000);
        let out = render_with_candidates(&session, "Off Canvas", &[], &[]).unwrap();
        assert!(!out.png.is_empty());
        assert!(!out.pdf.is_empty());
    }

    #[test]
    fn hex_color_parses_and_rejects() {
        assert_eq!(hex_color("#000000"), Some(Rgba([0, 0, 0, 255])));
        assert_eq!(hex_color("#FF8001"), Some(Rgba([255, 128, 1, 255])));
        assert_eq!(hex_color("ff8001"), Some(Rgba([255, 128, 1, 255])));
        assert_eq!(hex_color("#fff"), None);
        assert_eq!(hex_color("#zzzzzz"), None);
    }
}
