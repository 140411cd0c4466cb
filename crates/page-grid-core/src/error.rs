use thiserror::Error;

#[derive(Debug, Error)]
pub enum PageGridError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "image")]
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[cfg(feature = "pdf")]
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Page too small: usable area is {usable_width}x{usable_height} after margins")]
    PageTooSmall {
        usable_width: f64,
        usable_height: f64,
    },
    #[error("No valid grid: {cols} columns x {rows} rows")]
    NoValidGrid { cols: u32, rows: u32 },
    #[error("Cell too small: block is {block_width}x{block_height} after item spacing")]
    CellTooSmall {
        block_width: f64,
        block_height: f64,
    },
}

impl PageGridError {
    /// True for the geometric failures the user resolves by adjusting margins,
    /// spacing or columns (as opposed to malformed input).
    pub fn is_layout_failure(&self) -> bool {
        matches!(
            self,
            Self::PageTooSmall { .. } | Self::NoValidGrid { .. } | Self::CellTooSmall { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PageGridError>;
