//! Font loading for HUD text.

use std::path::Path;

use ab_glyph::{FontArc, FontVec};

use djihud_common::error::{HudError, HudResult};

/// Families tried, in order, when no explicit font file is configured.
const PREFERRED_FAMILIES: &[&str] = &[
    "DejaVu Sans",
    "Noto Sans",
    "Liberation Sans",
    "Roboto",
    "Helvetica",
    "Arial",
];

/// A shareable font face used for every text widget.
#[derive(Clone)]
pub struct HudFont {
    font: FontArc,
}

impl std::fmt::Debug for HudFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HudFont").finish_non_exhaustive()
    }
}

impl HudFont {
    pub fn from_bytes(data: Vec<u8>) -> HudResult<Self> {
        let font = FontVec::try_from_vec(data)
            .map_err(|e| HudError::render(format!("invalid font data: {e}")))?;
        Ok(Self {
            font: FontArc::new(font),
        })
    }

    pub fn from_file(path: &Path) -> HudResult<Self> {
        let data = std::fs::read(path).map_err(|e| {
            HudError::render(format!("failed to read font {}: {e}", path.display()))
        })?;
        Self::from_bytes(data)
    }

    /// Locate a bold sans-serif face among the installed system fonts.
    pub fn system_default() -> Option<Self> {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();

        let families: Vec<fontdb::Family<'_>> = PREFERRED_FAMILIES
            .iter()
            .map(|name| fontdb::Family::Name(*name))
            .chain(std::iter::once(fontdb::Family::SansSerif))
            .collect();

        let id = families
            .iter()
            .find_map(|family| {
                db.query(&fontdb::Query {
                    families: std::slice::from_ref(family),
                    weight: fontdb::Weight::BOLD,
                    ..fontdb::Query::default()
                })
            })
            .or_else(|| db.faces().next().map(|face| face.id))?;

        db.with_face_data(id, |data, index| {
            FontVec::try_from_vec_and_index(data.to_vec(), index).ok()
        })
        .flatten()
        .map(|font| Self {
            font: FontArc::new(font),
        })
    }

    /// Use `preferred` when given, otherwise the system face.
    ///
    /// Returns `None` (after logging) when no usable face exists; text
    /// widgets then draw only their backing plates.
    pub fn load(preferred: Option<&Path>) -> Option<Self> {
        if let Some(path) = preferred {
            match Self::from_file(path) {
                Ok(font) => return Some(font),
                Err(err) => {
                    tracing::warn!(error = %err, "Configured font unusable, trying system fonts")
                }
            }
        }
        let font = Self::system_default();
        if font.is_none() {
            tracing::warn!("No usable system font found; HUD text will not be drawn");
        }
        font
    }

    pub fn font(&self) -> &FontArc {
        &self.font
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_bytes_are_rejected() {
        assert!(HudFont::from_bytes(vec![0u8; 64]).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = HudFont::from_file(Path::new("/nonexistent/font.ttf")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/font.ttf"));
    }
}
