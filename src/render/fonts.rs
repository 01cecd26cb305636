// Font resolution for the renderer.
//
// Ordered chain: admin-uploaded font bytes, then a system Arial face, then a
// system DejaVu Sans face, then the built-in 8x8 bitmap font. The order is
// load-bearing: deployments without any font files must still render.

use rusttype::{Font, Scale};

use super::RenderError;

pub const NO_SCALABLE_FONT_WARNING: &str = "No scalable font available. Text may appear small.";

/// Well-known locations for an Arial face (Linux mscorefonts, macOS, Windows).
pub const ARIAL_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/msttcorefonts/Arial.ttf",
    "/usr/share/fonts/truetype/msttcorefonts/arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Common Linux/Mac fallback.
pub const DEJAVU_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/DejaVuSans.ttf",
];

#[derive(Debug)]
pub enum ResolvedFont {
    Scalable { font: Font<'static>, scale: Scale },
    /// Built-in 8x8 bitmap glyphs, drawn at native size regardless of the
    /// configured font size.
    Bitmap,
}

#[derive(Debug)]
pub struct FontResolution {
    pub font: ResolvedFont,
    pub warnings: Vec<String>,
}

pub fn resolve(font_bytes: Option<&[u8]>, size: u32) -> Result<FontResolution, RenderError> {
    resolve_with_candidates(font_bytes, size, ARIAL_CANDIDATES, DEJAVU_CANDIDATES)
}

/// Candidate lists are injectable so tests can force the bitmap fallback.
pub fn resolve_with_candidates(
    font_bytes: Option<&[u8]>,
    size: u32,
    arial_candidates: &[&str],
    dejavu_candidates: &[&str],
) -> Result<FontResolution, RenderError> {
    let scale = Scale::uniform(size as f32);

    // An uploaded font that does not parse is an error, not a fallback: the
    // admin asked for this font specifically.
    if let Some(bytes) = font_bytes {
        let font = Font::try_from_vec(bytes.to_vec())
            .ok_or_else(|| RenderError::InvalidFont("uploaded font failed to parse".to_string()))?;
        return Ok(FontResolution {
            font: ResolvedFont::Scalable { font, scale },
            warnings: Vec::new(),
        });
    }

    for candidates in [arial_candidates, dejavu_candidates] {
        if let Some(font) = probe(candidates) {
            return Ok(FontResolution {
                font: ResolvedFont::Scalable { font, scale },
                warnings: Vec::new(),
            });
        }
    }

    tracing::warn!("no scalable font found, using built-in bitmap font");
    Ok(FontResolution {
        font: ResolvedFont::Bitmap,
        warnings: vec![NO_SCALABLE_FONT_WARNING.to_string()],
    })
}

fn probe(candidates: &[&str]) -> Option<Font<'static>> {
    candidates
        .iter()
        .filter_map(|path| std::fs::read(path).ok())
        .find_map(Font::try_from_vec)
}
