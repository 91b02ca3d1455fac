//! Line-driven viewer session on top of [`Viewer`].

use anyhow::{Context, Result};
use doc_model::{PageInfo, ReaderAction, SourceRef};
use pdf_engine::RgbaImage;
use std::fs;
use std::io::{BufRead, Write};
use std::path::Path;
use viewer_core::{Clock, DwellReport, RenderCapability, RenderOutcome, RenderTicket, Viewer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerCommand {
    Navigate(ReaderAction),
    Render,
    Back,
}

impl ViewerCommand {
    pub fn parse(input: &str) -> Option<Self> {
        let command = match input.trim() {
            "n" | "next" => Self::Navigate(ReaderAction::NextPage),
            "p" | "prev" => Self::Navigate(ReaderAction::PreviousPage),
            "+" | "zoom-in" => Self::Navigate(ReaderAction::ZoomIn),
            "-" | "zoom-out" => Self::Navigate(ReaderAction::ZoomOut),
            "r" | "render" => Self::Render,
            "q" | "back" => Self::Back,
            _ => return None,
        };
        Some(command)
    }
}

/// Opens `source`, then executes one command per input line until `back` or EOF.
///
/// Render failures are reported and the session continues; only a failed open
/// ends it early.
pub async fn run_viewer<R, C, I, O>(
    viewer: &Viewer<R, C>,
    source: SourceRef,
    input: I,
    out: &mut O,
    frames_dir: Option<&Path>,
) -> Result<()>
where
    R: RenderCapability<Frame = RgbaImage>,
    C: Clock,
    I: BufRead,
    O: Write,
{
    if let Some(dir) = frames_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    }

    let outcome = viewer
        .open_document(source.clone())
        .await
        .with_context(|| format!("failed to open {source}"))?;
    writeln!(out, "Opened {source}")?;
    report_outcome(viewer, outcome, out, frames_dir)?;

    for line in input.lines() {
        let line = line.context("failed to read command")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some(command) = ViewerCommand::parse(line) else {
            writeln!(out, "unknown command: {line} (n, p, +, -, r, q)")?;
            continue;
        };

        let outcome = match command {
            ViewerCommand::Back => break,
            ViewerCommand::Render => viewer.render_current_page().await,
            ViewerCommand::Navigate(action) => viewer.dispatch(action).await,
        };

        match outcome {
            Some(outcome) => report_outcome(viewer, outcome, out, frames_dir)?,
            None => writeln!(out, "{}", unchanged_message(command))?,
        }
    }

    if let Some(dwell) = viewer.close_document() {
        write_dwell_summary(out, &dwell.report())?;
    }

    Ok(())
}

fn report_outcome<R, C, O>(
    viewer: &Viewer<R, C>,
    outcome: RenderOutcome,
    out: &mut O,
    frames_dir: Option<&Path>,
) -> Result<()>
where
    R: RenderCapability<Frame = RgbaImage>,
    C: Clock,
    O: Write,
{
    match outcome {
        RenderOutcome::Committed(ticket) => {
            writeln!(out, "{}", status_line(ticket.page_info(), ticket.scale))?;
            if let Some(dir) = frames_dir {
                write_frame(viewer, &ticket, dir)?;
            }
        }
        RenderOutcome::Superseded(ticket) => {
            log::debug!("render #{} superseded", ticket.sequence);
        }
        RenderOutcome::Failed(err) => eprintln!("{err}"),
    }

    Ok(())
}

fn write_frame<R, C>(viewer: &Viewer<R, C>, ticket: &RenderTicket, dir: &Path) -> Result<()>
where
    R: RenderCapability<Frame = RgbaImage>,
    C: Clock,
{
    let controller = viewer.controller();
    let Some(frame) = controller.surface().frame() else {
        return Ok(());
    };

    let path = dir.join(format!("page-{}.png", ticket.page));
    frame.save(&path).with_context(|| format!("failed to write frame to {}", path.display()))?;
    log::debug!("wrote {}", path.display());
    Ok(())
}

pub fn status_line(info: PageInfo, scale: f64) -> String {
    let toggle = |enabled: bool| if enabled { "on" } else { "off" };
    format!(
        "{info}  zoom {:.0}%  prev: {}  next: {}",
        scale * 100.0,
        toggle(info.can_go_previous()),
        toggle(info.can_go_next())
    )
}

fn unchanged_message(command: ViewerCommand) -> &'static str {
    match command {
        ViewerCommand::Navigate(ReaderAction::NextPage) => "already on the last page",
        ViewerCommand::Navigate(ReaderAction::PreviousPage) => "already on the first page",
        ViewerCommand::Navigate(ReaderAction::ZoomIn | ReaderAction::ZoomOut) => "zoom unchanged",
        ViewerCommand::Render | ViewerCommand::Back => "no document open",
    }
}

pub fn write_dwell_summary<O: Write>(out: &mut O, report: &DwellReport) -> Result<()> {
    writeln!(out, "Time on page:")?;
    for page in &report.pages {
        let visits = if page.visits == 1 { "visit" } else { "visits" };
        writeln!(
            out,
            "  page {}: {} {visits}, {:.1}s",
            page.page, page.visits, page.total_seconds
        )?;
    }
    writeln!(out, "Total: {:.1}s", report.total_seconds())?;
    Ok(())
}
