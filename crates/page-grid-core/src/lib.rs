//! Core library for laying out captioned images on a document page.
//!
//! - Engine: auto (searched) or fixed column grid, aspect-preserving fit, caption bands
//! - Frames: every rect is reported top-down (screen preview) and bottom-up (page embedding)
//! - Intake/compositing (feature `image`): derive items from decoded images, rasterize a preview
//! - Embedding (feature `pdf`): draw images and captions onto a page of an existing PDF
//! - Data model is serde-serializable; JSON exporters are provided in `export`.
//!
//! Quick example:
//! ```ignore
//! use page_grid_core::prelude::*;
//! # fn main() -> anyhow::Result<()> {
//! let cfg = LayoutConfig::builder()
//!     .page_size(PageSize::A4, false)
//!     .uniform_margin(20.0)
//!     .item_spacing(10.0)
//!     .build();
//! let items = vec![LayoutItem::new(1.5, 10.0), LayoutItem::new(0.75, 10.0)];
//! let layout = compute_placements(&LayoutRequest::new(cfg, items))?;
//! println!("grid: {}x{}", layout.grid.cols, layout.grid.rows);
//! # Ok(()) }
//! ```

#[cfg(feature = "image")]
pub mod compositing;
pub mod config;
#[cfg(feature = "pdf")]
pub mod embed;
pub mod engine;
pub mod error;
pub mod export;
pub mod fonts;
#[cfg(feature = "image")]
pub mod intake;
pub mod model;

#[cfg(feature = "image")]
pub use compositing::*;
pub use config::*;
#[cfg(feature = "pdf")]
pub use embed::*;
pub use engine::*;
pub use error::*;
pub use export::*;
pub use fonts::*;
#[cfg(feature = "image")]
pub use intake::*;
pub use model::*;

/// Convenience prelude for common types and functions.
/// Importing `page_grid_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{LayoutConfig, LayoutConfigBuilder, Margins, PageGeometry, PageSize};
    pub use crate::engine::{LayoutItem, LayoutRequest, compute_placements};
    pub use crate::error::PageGridError;
    pub use crate::fonts::StandardFont;
    pub use crate::model::{Grid, Layout, LayoutStats, Meta, PlacedRect, Placement, Rect};
    pub use crate::{to_json_page, to_json_preview};
    #[cfg(feature = "image")]
    pub use crate::{Caption, InputImage, PreviewOptions, layout_images, render_preview};
    #[cfg(feature = "pdf")]
    pub use crate::{
        EmbedSummary, TargetPage, embed_into_document, embed_layout, embed_pdf_bytes,
    };
}
