use crate::config::LayoutConfig;
use crate::engine::{LayoutItem, LayoutRequest, compute_placements};
use crate::error::{PageGridError, Result};
use crate::model::Layout;
use image::{DynamicImage, ImageReader};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::instrument;

/// Caption text and styling for one image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Caption {
    pub text: String,
    /// Font size in points; also the height reserved for the caption line.
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    /// RGB text color.
    #[serde(default)]
    pub color: [u8; 3],
    #[serde(default = "default_font_family")]
    pub font_family: String,
}

impl Caption {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_size: default_font_size(),
            color: [0, 0, 0],
            font_family: default_font_family(),
        }
    }
}

fn default_font_size() -> f64 {
    10.0
}
fn default_font_family() -> String {
    "Helvetica".into()
}

/// In-memory image to place (key + decoded image + optional caption).
pub struct InputImage {
    pub key: String,
    pub image: DynamicImage,
    pub caption: Option<Caption>,
}

impl InputImage {
    pub fn new(key: impl Into<String>, image: DynamicImage) -> Self {
        Self {
            key: key.into(),
            image,
            caption: None,
        }
    }

    /// Decodes the file at `path`, guessing the format from its contents.
    /// The key is the path with forward slashes.
    pub fn open(path: &Path) -> Result<Self> {
        let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
        let key = path.to_string_lossy().replace('\\', "/");
        Ok(Self::new(key, image))
    }

    pub fn with_caption(mut self, caption: Caption) -> Self {
        self.caption = Some(caption);
        self
    }

    /// Width / height of the decoded image.
    pub fn aspect_ratio(&self) -> Result<f64> {
        let (w, h) = (self.image.width(), self.image.height());
        if w == 0 || h == 0 {
            return Err(PageGridError::InvalidInput(format!(
                "{}: image has zero size ({}x{})",
                self.key, w, h
            )));
        }
        Ok(w as f64 / h as f64)
    }

    /// Engine input for this image; uncaptioned images reserve no caption line.
    pub fn layout_item(&self) -> Result<LayoutItem> {
        let caption_size = self.caption.as_ref().map_or(0.0, |c| c.font_size);
        Ok(LayoutItem::new(self.aspect_ratio()?, caption_size))
    }
}

/// Parses `#rrggbb` (the `#` is optional) into RGB bytes.
pub fn parse_hex_color(s: &str) -> Result<[u8; 3]> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(PageGridError::InvalidInput(format!(
            "expected a #rrggbb color, got {:?}",
            s
        )));
    }
    let mut rgb = [0u8; 3];
    for (i, c) in rgb.iter_mut().enumerate() {
        *c = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|_| {
            PageGridError::InvalidInput(format!("expected a #rrggbb color, got {:?}", s))
        })?;
    }
    Ok(rgb)
}

/// Derives one engine item per image and computes the layout with `cfg`.
#[instrument(skip_all, fields(images = inputs.len()))]
pub fn layout_images(inputs: &[InputImage], cfg: &LayoutConfig) -> Result<Layout> {
    let items = inputs
        .iter()
        .map(InputImage::layout_item)
        .collect::<Result<Vec<_>>>()?;
    compute_placements(&LayoutRequest::new(cfg.clone(), items))
}
