use crate::capability::RenderCapability;
use crate::clock::{Clock, SystemClock};
use crate::controller::{RenderOutcome, RenderTicket, ViewerController};
use crate::dwell::DwellRecord;
use crate::error::ViewerError;
use doc_model::{PageInfo, ReaderAction, SourceRef};
use std::cell::{Ref, RefCell};
use std::future::Future;
use std::rc::Rc;

/// Drives a [`ViewerController`] against a [`RenderCapability`].
///
/// Navigation methods update the controller as soon as they are called and
/// return a future that performs the render. Several of those futures may be
/// in flight at once on a single thread; the controller sorts out which frame
/// ends up on the surface.
pub struct Viewer<R: RenderCapability, C = SystemClock> {
    capability: R,
    controller: RefCell<ViewerController<R::Document, R::Frame, C>>,
}

impl<R: RenderCapability> Viewer<R, SystemClock> {
    pub fn new(capability: R) -> Self {
        Self::with_clock(capability, SystemClock)
    }
}

impl<R: RenderCapability, C: Clock> Viewer<R, C> {
    pub fn with_clock(capability: R, clock: C) -> Self {
        Self { capability, controller: RefCell::new(ViewerController::new(clock)) }
    }

    pub fn capability(&self) -> &R {
        &self.capability
    }

    pub fn controller(&self) -> Ref<'_, ViewerController<R::Document, R::Frame, C>> {
        self.controller.borrow()
    }

    pub fn page_info(&self) -> Option<PageInfo> {
        self.controller.borrow().page_info()
    }

    /// Loads `source` and, on success, replaces the open document and renders page 1.
    ///
    /// On failure the open document, if any, stays as it was.
    pub async fn open_document(&self, source: SourceRef) -> Result<RenderOutcome, ViewerError> {
        let loaded = match self.capability.load(&source).await {
            Ok(loaded) => loaded,
            Err(err) => {
                log::error!("failed to load {source}: {err}");
                return Err(ViewerError::LoadFailure {
                    source_ref: source.to_string(),
                    reason: err.to_string(),
                });
            }
        };

        if loaded.page_count == 0 {
            self.capability.unload(&loaded.document);
            let err = ViewerError::LoadFailure {
                source_ref: source.to_string(),
                reason: "document has no pages".to_owned(),
            };
            log::error!("{err}");
            return Err(err);
        }

        let previous =
            self.controller.borrow().session().map(|session| Rc::clone(session.document()));
        let installed =
            self.controller.borrow_mut().install_session(source, loaded.document, loaded.page_count);

        let ticket = match installed {
            Ok(ticket) => ticket,
            Err(err) => {
                log::error!("{err}");
                return Err(err);
            }
        };

        if let Some(previous) = previous {
            self.capability.unload(&previous);
        }

        Ok(self.drive(ticket).await)
    }

    /// Drops the open document and returns its dwell record.
    pub fn close_document(&self) -> Option<DwellRecord> {
        let closed = self.controller.borrow_mut().close_document()?;
        self.capability.unload(&closed.document);
        Some(closed.dwell)
    }

    pub fn next_page(&self) -> impl Future<Output = Option<RenderOutcome>> + '_ {
        self.dispatch(ReaderAction::NextPage)
    }

    pub fn previous_page(&self) -> impl Future<Output = Option<RenderOutcome>> + '_ {
        self.dispatch(ReaderAction::PreviousPage)
    }

    pub fn zoom_in(&self) -> impl Future<Output = Option<RenderOutcome>> + '_ {
        self.dispatch(ReaderAction::ZoomIn)
    }

    pub fn zoom_out(&self) -> impl Future<Output = Option<RenderOutcome>> + '_ {
        self.dispatch(ReaderAction::ZoomOut)
    }

    pub fn render_current_page(&self) -> impl Future<Output = Option<RenderOutcome>> + '_ {
        let ticket = self.controller.borrow_mut().render_current_page();
        self.drive_issued(ticket)
    }

    /// Applies `action` now; the returned future renders the result.
    pub fn dispatch(
        &self,
        action: ReaderAction,
    ) -> impl Future<Output = Option<RenderOutcome>> + '_ {
        let ticket = self.controller.borrow_mut().apply(action);
        self.drive_issued(ticket)
    }

    async fn drive_issued(&self, ticket: Option<RenderTicket>) -> Option<RenderOutcome> {
        Some(self.drive(ticket?).await)
    }

    async fn drive(&self, ticket: RenderTicket) -> RenderOutcome {
        let Some(document) = self.controller.borrow().document_for(&ticket) else {
            return RenderOutcome::Superseded(ticket);
        };

        let result = self.render_page(&document, ticket).await;
        self.controller.borrow_mut().complete_render(ticket, result)
    }

    async fn render_page(
        &self,
        document: &R::Document,
        ticket: RenderTicket,
    ) -> Result<R::Frame, ViewerError> {
        let failure = |err: R::Error| ViewerError::RenderFailure {
            page: ticket.page,
            reason: err.to_string(),
        };

        let page = self.capability.get_page(document, ticket.page).await.map_err(failure)?;
        self.capability.render(&page, ticket.scale).await.map_err(failure)
    }
}
