//! The rendering backend seen by the viewer, and an implementation over [`PdfEngine`].

use doc_model::SourceRef;
use pdf_engine::{DocumentHandle, OpenSource, PdfEngine, PdfEngineError, RenderRequest, RgbaImage};
use std::cell::{Cell, RefCell};
use std::fmt::Display;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument<D> {
    pub document: D,
    pub page_count: u32,
}

/// Asynchronous document loading and page rendering.
///
/// Pages are 1-based. `render` produces a frame; the viewer decides whether that
/// frame reaches the drawing surface.
#[allow(async_fn_in_trait)]
pub trait RenderCapability {
    type Document;
    type Page;
    type Frame;
    type Error: Display;

    async fn load(
        &self,
        source: &SourceRef,
    ) -> Result<LoadedDocument<Self::Document>, Self::Error>;

    async fn get_page(
        &self,
        document: &Self::Document,
        page_number: u32,
    ) -> Result<Self::Page, Self::Error>;

    async fn render(&self, page: &Self::Page, scale: f64) -> Result<Self::Frame, Self::Error>;

    /// Called once the viewer no longer shows `document`.
    fn unload(&self, _document: &Self::Document) {}
}

/// Turns a [`SourceRef`] into something the engine can open.
#[allow(async_fn_in_trait)]
pub trait DocumentFetcher {
    type Error: Display;

    async fn fetch(&self, source: &SourceRef) -> Result<OpenSource, Self::Error>;
}

/// Treats every source as a path on the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFiles;

impl DocumentFetcher for LocalFiles {
    type Error = std::convert::Infallible;

    async fn fetch(&self, source: &SourceRef) -> Result<OpenSource, Self::Error> {
        Ok(OpenSource::Path(PathBuf::from(source.as_str())))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error(transparent)]
    Engine(#[from] PdfEngineError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRef {
    pub document: DocumentHandle,
    pub index: u32,
}

/// Render capability backed by a synchronous [`PdfEngine`].
#[derive(Debug)]
pub struct EngineCapability<E, F> {
    engine: RefCell<E>,
    fetcher: F,
    loaded: Cell<usize>,
}

impl<E: PdfEngine, F: DocumentFetcher> EngineCapability<E, F> {
    pub fn new(engine: E, fetcher: F) -> Self {
        Self { engine: RefCell::new(engine), fetcher, loaded: Cell::new(0) }
    }

    /// Documents opened through this capability and not yet unloaded.
    pub fn loaded_documents(&self) -> usize {
        self.loaded.get()
    }
}

impl<E: PdfEngine, F: DocumentFetcher> RenderCapability for EngineCapability<E, F> {
    type Document = DocumentHandle;
    type Page = PageRef;
    type Frame = RgbaImage;
    type Error = CapabilityError;

    async fn load(
        &self,
        source: &SourceRef,
    ) -> Result<LoadedDocument<DocumentHandle>, CapabilityError> {
        let open_source = self
            .fetcher
            .fetch(source)
            .await
            .map_err(|err| CapabilityError::Fetch(err.to_string()))?;

        let mut engine = self.engine.borrow_mut();
        let document = engine.open(open_source)?;
        let page_count = match engine.page_count(document) {
            Ok(count) => count,
            Err(err) => {
                let _ = engine.close(document);
                return Err(err.into());
            }
        };

        self.loaded.set(self.loaded.get() + 1);
        Ok(LoadedDocument { document, page_count })
    }

    async fn get_page(
        &self,
        document: &DocumentHandle,
        page_number: u32,
    ) -> Result<PageRef, CapabilityError> {
        let index = page_number.checked_sub(1).ok_or(PdfEngineError::PageOutOfRange {
            page: page_number,
            page_count: 0,
        })?;

        self.engine.borrow().page_size(*document, index)?;
        Ok(PageRef { document: *document, index })
    }

    async fn render(&self, page: &PageRef, scale: f64) -> Result<RgbaImage, CapabilityError> {
        let request = RenderRequest { page_index: page.index, scale };
        Ok(self.engine.borrow().render_page(page.document, request)?)
    }

    fn unload(&self, document: &DocumentHandle) {
        match self.engine.borrow_mut().close(*document) {
            Ok(()) => self.loaded.set(self.loaded.get().saturating_sub(1)),
            Err(err) => log::warn!("failed to close document {}: {err}", document.raw()),
        }
    }
}
