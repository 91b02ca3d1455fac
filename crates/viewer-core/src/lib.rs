//! Document viewer state: page navigation, zoom, render sequencing and dwell time.

pub mod capability;
pub mod clock;
pub mod controller;
pub mod dwell;
pub mod error;
pub mod viewer;

pub use capability::{
    CapabilityError, DocumentFetcher, EngineCapability, LoadedDocument, LocalFiles, PageRef,
    RenderCapability,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{
    ClosedDocument, DocumentSession, RenderOutcome, RenderTicket, SessionId, Surface,
    ViewerController,
};
pub use dwell::{DwellRecord, DwellReport, DwellTracker, PageDwell};
pub use error::ViewerError;
pub use viewer::Viewer;
