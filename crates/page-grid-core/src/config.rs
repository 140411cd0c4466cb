//! Page geometry and layout configuration.
//! Key notes:
//!   - all lengths are in points (1/72 inch)
//!   - `columns == 0` selects the column count automatically
//!   - `parallel` only changes how auto candidates are evaluated, never the result

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Standard page sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    A3,
    A4,
    A5,
    Letter,
    Legal,
}

impl PageSize {
    /// Portrait dimensions (width, height) in points.
    pub fn dimensions(self) -> (f64, f64) {
        match self {
            Self::A3 => (841.89, 1190.55),
            Self::A4 => (595.28, 841.89),
            Self::A5 => (419.53, 595.28),
            Self::Letter => (612.0, 792.0),
            Self::Legal => (612.0, 1008.0),
        }
    }

    pub fn geometry(self, landscape: bool) -> PageGeometry {
        let (w, h) = self.dimensions();
        if landscape {
            PageGeometry::new(h, w)
        } else {
            PageGeometry::new(w, h)
        }
    }
}

impl FromStr for PageSize {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "a3" => Ok(Self::A3),
            "a4" => Ok(Self::A4),
            "a5" => Ok(Self::A5),
            "letter" => Ok(Self::Letter),
            "legal" => Ok(Self::Legal),
            _ => Err(()),
        }
    }
}

/// Page width and height in points.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
}

impl PageGeometry {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        PageSize::A4.geometry(false)
    }
}

/// Four independent page margins in points.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Margins {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl Margins {
    pub fn new(top: f64, bottom: f64, left: f64, right: f64) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }

    pub fn uniform(v: f64) -> Self {
        Self::new(v, v, v, v)
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform(default_margin())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutConfig {
    /// Target page size.
    #[serde(default)]
    pub page: PageGeometry,
    /// Space kept clear on each side of the page.
    #[serde(default)]
    pub margins: Margins,
    /// Gap reserved between grid cells, in both axes.
    #[serde(default = "default_item_spacing")]
    pub item_spacing: f64,
    /// Fixed column count; 0 selects the count automatically.
    #[serde(default)]
    pub columns: u32,
    /// Padding reserved above and below every caption line.
    #[serde(default = "default_caption_gap")]
    pub caption_gap: f64,

    /// Evaluate auto-column candidates in parallel when feature "parallel" is on.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page: PageGeometry::default(),
            margins: Margins::default(),
            item_spacing: default_item_spacing(),
            columns: 0,
            caption_gap: default_caption_gap(),
            parallel: default_parallel(),
        }
    }
}

impl LayoutConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if:
    /// - Page dimensions are not finite and positive
    /// - A margin, the item spacing or the caption gap is negative or not finite
    ///
    /// Margins that leave no usable area are accepted here; the engine reports
    /// them as `PageTooSmall`.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::PageGridError;

        if !(self.page.width.is_finite() && self.page.width > 0.0)
            || !(self.page.height.is_finite() && self.page.height > 0.0)
        {
            return Err(PageGridError::InvalidConfig(format!(
                "page dimensions must be positive, got {}x{}",
                self.page.width, self.page.height
            )));
        }

        let lengths = [
            ("margin_top", self.margins.top),
            ("margin_bottom", self.margins.bottom),
            ("margin_left", self.margins.left),
            ("margin_right", self.margins.right),
            ("item_spacing", self.item_spacing),
            ("caption_gap", self.caption_gap),
        ];
        for (name, v) in lengths {
            if !v.is_finite() || v < 0.0 {
                return Err(PageGridError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, v
                )));
            }
        }

        Ok(())
    }

    /// Usable (width, height) after subtracting opposing margins. May be non-positive.
    pub fn usable_size(&self) -> (f64, f64) {
        (
            self.page.width - self.margins.left - self.margins.right,
            self.page.height - self.margins.top - self.margins.bottom,
        )
    }
}

fn default_margin() -> f64 {
    20.0
}
fn default_item_spacing() -> f64 {
    10.0
}
fn default_caption_gap() -> f64 {
    5.0
}
fn default_parallel() -> bool {
    false
}

/// Builder for `LayoutConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct LayoutConfigBuilder {
    cfg: LayoutConfig,
}

impl LayoutConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: LayoutConfig::default(),
        }
    }
    pub fn with_page(mut self, w: f64, h: f64) -> Self {
        self.cfg.page = PageGeometry::new(w, h);
        self
    }
    pub fn page_size(mut self, size: PageSize, landscape: bool) -> Self {
        self.cfg.page = size.geometry(landscape);
        self
    }
    pub fn margins(mut self, v: Margins) -> Self {
        self.cfg.margins = v;
        self
    }
    pub fn uniform_margin(mut self, v: f64) -> Self {
        self.cfg.margins = Margins::uniform(v);
        self
    }
    pub fn item_spacing(mut self, v: f64) -> Self {
        self.cfg.item_spacing = v;
        self
    }
    pub fn columns(mut self, v: u32) -> Self {
        self.cfg.columns = v;
        self
    }
    pub fn caption_gap(mut self, v: f64) -> Self {
        self.cfg.caption_gap = v;
        self
    }
    pub fn parallel(mut self, v: bool) -> Self {
        self.cfg.parallel = v;
        self
    }
    pub fn build(self) -> LayoutConfig {
        self.cfg
    }
}

impl LayoutConfig {
    /// Create a fluent builder for `LayoutConfig`.
    pub fn builder() -> LayoutConfigBuilder {
        LayoutConfigBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PageGridError;

    #[test]
    fn page_size_parses_case_insensitively() {
        assert_eq!("A4".parse::<PageSize>(), Ok(PageSize::A4));
        assert_eq!("letter".parse::<PageSize>(), Ok(PageSize::Letter));
        assert!("b5".parse::<PageSize>().is_err());
    }

    #[test]
    fn landscape_swaps_axes() {
        let g = PageSize::A4.geometry(true);
        assert_eq!(g.width, 841.89);
        assert_eq!(g.height, 595.28);
    }

    #[test]
    fn negative_spacing_is_rejected() {
        let cfg = LayoutConfig::builder().item_spacing(-1.0).build();
        match cfg.validate() {
            Err(PageGridError::InvalidConfig(msg)) => assert!(msg.contains("item_spacing")),
            other => panic!("expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn exhausting_margins_pass_validation() {
        let cfg = LayoutConfig::builder()
            .margins(Margins::new(0.0, 0.0, 300.0, 300.0))
            .build();
        assert!(cfg.validate().is_ok());
        assert!(cfg.usable_size().0 <= 0.0);
    }

    #[test]
    fn zero_page_is_rejected() {
        let cfg = LayoutConfig::builder().with_page(0.0, 100.0).build();
        assert!(matches!(cfg.validate(), Err(PageGridError::InvalidConfig(_))));
    }
}
