use serde::{Deserialize, Serialize};
use std::fmt;

pub mod api;

pub use api::{
    AccessRecord, Analytics, LoginRequest, LoginResponse, PdfDetails, PdfEntry, PdfStat,
    TrackAccessRequest,
};

/// Multiplier applied by one zoom step in either direction.
pub const ZOOM_FACTOR: f64 = 1.2;
pub const INITIAL_SCALE: f64 = 1.0;
pub const FIRST_PAGE: u32 = 1;

/// Where a document is loaded from: a URL on the document API or a local path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef(String);

impl SourceRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SourceRef {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for SourceRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Navigation state of an open document. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReaderState {
    pub current_page: u32,
    pub total_pages: u32,
    pub scale: f64,
}

impl ReaderState {
    /// Fresh state for a document with `total_pages` pages; `None` for an empty document.
    pub fn new(total_pages: u32) -> Option<Self> {
        if total_pages == 0 {
            return None;
        }

        Some(Self { current_page: FIRST_PAGE, total_pages, scale: INITIAL_SCALE })
    }

    pub fn page_info(&self) -> PageInfo {
        PageInfo { current_page: self.current_page, total_pages: self.total_pages }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderAction {
    NextPage,
    PreviousPage,
    ZoomIn,
    ZoomOut,
}

impl ReaderAction {
    pub fn changes_page(self) -> bool {
        matches!(self, Self::NextPage | Self::PreviousPage)
    }
}

/// Applies `action` and reports whether the state changed.
///
/// Page moves stop at the document bounds. Zoom is purely multiplicative with no
/// bounds; a step that would leave the scale non-positive or non-finite is dropped.
pub fn apply_reader_action(state: &mut ReaderState, action: ReaderAction) -> bool {
    match action {
        ReaderAction::NextPage => {
            if state.current_page >= state.total_pages {
                return false;
            }
            state.current_page += 1;
            true
        }
        ReaderAction::PreviousPage => {
            if state.current_page <= FIRST_PAGE {
                return false;
            }
            state.current_page -= 1;
            true
        }
        ReaderAction::ZoomIn => set_scale(state, state.scale * ZOOM_FACTOR),
        ReaderAction::ZoomOut => set_scale(state, state.scale / ZOOM_FACTOR),
    }
}

fn set_scale(state: &mut ReaderState, scale: f64) -> bool {
    if !scale.is_finite() || scale <= 0.0 {
        return false;
    }

    state.scale = scale;
    true
}

/// Page counter and navigation button state shown next to the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub current_page: u32,
    pub total_pages: u32,
}

impl PageInfo {
    pub fn can_go_previous(&self) -> bool {
        self.current_page > FIRST_PAGE
    }

    pub fn can_go_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}

impl fmt::Display for PageInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Page {} of {}", self.current_page, self.total_pages)
    }
}

pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_owned();
    }

    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let fixed = format!("{value:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');

    format!("{trimmed} {}", UNITS[unit])
}
