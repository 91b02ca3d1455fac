//! Navigation state machine for the open document.
//!
//! Every operation that needs pixels hands back a [`RenderTicket`]. Whoever
//! performs the render reports the result through
//! [`ViewerController::complete_render`], in any order. The surface keeps the
//! frame of the most recently issued ticket that has completed; results for
//! older tickets, or for a document that is no longer open, are dropped.

use crate::clock::{Clock, SystemClock};
use crate::dwell::{DwellRecord, DwellTracker};
use crate::error::ViewerError;
use doc_model::{apply_reader_action, PageInfo, ReaderAction, ReaderState, SourceRef};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(u64);

#[derive(Debug)]
pub struct DocumentSession<D> {
    id: SessionId,
    source: SourceRef,
    document: Rc<D>,
    reader: ReaderState,
}

impl<D> DocumentSession<D> {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn source(&self) -> &SourceRef {
        &self.source
    }

    pub fn document(&self) -> &Rc<D> {
        &self.document
    }

    pub fn reader(&self) -> &ReaderState {
        &self.reader
    }

    pub fn current_page(&self) -> u32 {
        self.reader.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.reader.total_pages
    }

    pub fn scale(&self) -> f64 {
        self.reader.scale
    }
}

/// One render request. `sequence` grows with every ticket issued.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTicket {
    pub sequence: u64,
    pub session: SessionId,
    pub page: u32,
    pub total_pages: u32,
    pub scale: f64,
}

impl RenderTicket {
    pub fn page_info(&self) -> PageInfo {
        PageInfo { current_page: self.page, total_pages: self.total_pages }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    /// The frame is now on the surface.
    Committed(RenderTicket),
    /// A newer render already settled, or the document was replaced.
    Superseded(RenderTicket),
    /// The render failed; surface and navigation state are unchanged.
    Failed(ViewerError),
}

/// Pixels currently shown, with the ticket that produced them.
#[derive(Debug)]
pub struct Surface<F> {
    frame: Option<F>,
    shown: Option<RenderTicket>,
}

impl<F> Default for Surface<F> {
    fn default() -> Self {
        Self { frame: None, shown: None }
    }
}

impl<F> Surface<F> {
    pub fn frame(&self) -> Option<&F> {
        self.frame.as_ref()
    }

    pub fn shown(&self) -> Option<&RenderTicket> {
        self.shown.as_ref()
    }

    pub fn is_blank(&self) -> bool {
        self.frame.is_none()
    }

    fn commit(&mut self, ticket: RenderTicket, frame: F) {
        self.frame = Some(frame);
        self.shown = Some(ticket);
    }

    fn clear(&mut self) {
        self.frame = None;
        self.shown = None;
    }
}

/// What is left of a session once the viewer goes back to the list.
#[derive(Debug)]
pub struct ClosedDocument<D> {
    pub source: SourceRef,
    pub document: Rc<D>,
    pub dwell: DwellRecord,
}

#[derive(Debug)]
pub struct ViewerController<D, F, C = SystemClock> {
    clock: C,
    session: Option<DocumentSession<D>>,
    surface: Surface<F>,
    dwell: DwellTracker,
    next_session: u64,
    next_sequence: u64,
    latest_issued: Option<u64>,
    latest_settled: Option<u64>,
}

impl<D, F> Default for ViewerController<D, F, SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl<D, F, C: Clock> ViewerController<D, F, C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            session: None,
            surface: Surface::default(),
            dwell: DwellTracker::new(),
            next_session: 0,
            next_sequence: 0,
            latest_issued: None,
            latest_settled: None,
        }
    }

    pub fn session(&self) -> Option<&DocumentSession<D>> {
        self.session.as_ref()
    }

    pub fn surface(&self) -> &Surface<F> {
        &self.surface
    }

    pub fn dwell(&self) -> &DwellRecord {
        self.dwell.record()
    }

    pub fn page_info(&self) -> Option<PageInfo> {
        self.session.as_ref().map(|session| session.reader.page_info())
    }

    /// True while the latest issued render has not completed.
    pub fn is_render_pending(&self) -> bool {
        match (self.latest_issued, self.latest_settled) {
            (Some(issued), Some(settled)) => issued > settled,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Replaces the open document with a freshly loaded one at page 1, scale 1.0.
    ///
    /// An empty document is a load failure and leaves the current session alone.
    pub fn install_session(
        &mut self,
        source: SourceRef,
        document: D,
        page_count: u32,
    ) -> Result<RenderTicket, ViewerError> {
        let Some(reader) = ReaderState::new(page_count) else {
            return Err(ViewerError::LoadFailure {
                source_ref: source.to_string(),
                reason: "document has no pages".to_owned(),
            });
        };

        self.next_session += 1;
        let id = SessionId(self.next_session);
        log::debug!("session {id:?}: opened {source} with {page_count} pages");

        self.session = Some(DocumentSession { id, source, document: Rc::new(document), reader });
        self.surface.clear();
        self.latest_issued = None;
        self.latest_settled = None;
        self.dwell.reset();
        self.dwell.record_arrival(self.clock.now());

        self.render_current_page().ok_or(ViewerError::NoDocument)
    }

    /// Ends the visit on the current page and drops the session.
    pub fn close_document(&mut self) -> Option<ClosedDocument<D>> {
        let session = self.session.take()?;
        self.dwell.record_departure(session.reader.current_page, self.clock.now());

        self.surface.clear();
        self.latest_issued = None;
        self.latest_settled = None;

        Some(ClosedDocument {
            source: session.source,
            document: session.document,
            dwell: self.dwell.take_record(),
        })
    }

    pub fn next_page(&mut self) -> Option<RenderTicket> {
        self.apply(ReaderAction::NextPage)
    }

    pub fn previous_page(&mut self) -> Option<RenderTicket> {
        self.apply(ReaderAction::PreviousPage)
    }

    pub fn zoom_in(&mut self) -> Option<RenderTicket> {
        self.apply(ReaderAction::ZoomIn)
    }

    pub fn zoom_out(&mut self) -> Option<RenderTicket> {
        self.apply(ReaderAction::ZoomOut)
    }

    /// Applies `action` and issues a render when it changed anything.
    ///
    /// Returns `None` with no document open or when the action was a no-op, such
    /// as moving past the first or last page.
    pub fn apply(&mut self, action: ReaderAction) -> Option<RenderTicket> {
        let session = self.session.as_mut()?;

        let mut next = session.reader;
        if !apply_reader_action(&mut next, action) {
            return None;
        }

        if action.changes_page() {
            let now = self.clock.now();
            self.dwell.record_departure(session.reader.current_page, now);
            session.reader = next;
            self.dwell.record_arrival(now);
        } else {
            session.reader = next;
        }

        self.render_current_page()
    }

    /// Issues a render of the current page at the current scale.
    pub fn render_current_page(&mut self) -> Option<RenderTicket> {
        let session = self.session.as_ref()?;

        self.next_sequence += 1;
        let ticket = RenderTicket {
            sequence: self.next_sequence,
            session: session.id,
            page: session.reader.current_page,
            total_pages: session.reader.total_pages,
            scale: session.reader.scale,
        };
        self.latest_issued = Some(ticket.sequence);

        log::debug!("render #{} issued: page {} at {:.3}", ticket.sequence, ticket.page, ticket.scale);
        Some(ticket)
    }

    /// Document to render `ticket` against, or `None` once that document is gone.
    pub fn document_for(&self, ticket: &RenderTicket) -> Option<Rc<D>> {
        self.session
            .as_ref()
            .filter(|session| session.id == ticket.session)
            .map(|session| Rc::clone(&session.document))
    }

    pub fn complete_render(
        &mut self,
        ticket: RenderTicket,
        result: Result<F, ViewerError>,
    ) -> RenderOutcome {
        if self.is_stale(&ticket) {
            log::debug!("render #{} for page {} superseded", ticket.sequence, ticket.page);
            return RenderOutcome::Superseded(ticket);
        }

        self.latest_settled = Some(ticket.sequence);

        match result {
            Ok(frame) => {
                self.surface.commit(ticket, frame);
                log::debug!("render #{} committed: page {}", ticket.sequence, ticket.page);
                RenderOutcome::Committed(ticket)
            }
            Err(error) => {
                log::warn!("render #{} failed: {error}", ticket.sequence);
                RenderOutcome::Failed(error)
            }
        }
    }

    fn is_stale(&self, ticket: &RenderTicket) -> bool {
        let current_session = self.session.as_ref().map(|session| session.id);
        if current_session != Some(ticket.session) {
            return true;
        }

        self.latest_settled.is_some_and(|settled| settled > ticket.sequence)
    }
}
