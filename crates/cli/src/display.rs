use chrono::{DateTime, Local, NaiveDateTime};
use doc_model::{format_file_size, Analytics, PdfDetails, PdfEntry};
use std::io::{self, Write};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Renders a server timestamp for people; unparseable input is passed through.
///
/// Zoned timestamps are shown in local time, naive ones as given.
pub fn format_timestamp(raw: &str) -> String {
    if let Ok(zoned) =
        DateTime::parse_from_rfc3339(raw).or_else(|_| DateTime::parse_from_rfc2822(raw))
    {
        return zoned.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string();
    }

    match raw.replacen(' ', "T", 1).parse::<NaiveDateTime>() {
        Ok(naive) => naive.format(TIMESTAMP_FORMAT).to_string(),
        Err(_) => raw.to_owned(),
    }
}

pub fn write_document_list<O: Write>(out: &mut O, pdfs: &[PdfEntry]) -> io::Result<()> {
    if pdfs.is_empty() {
        return writeln!(out, "No documents available");
    }

    for pdf in pdfs {
        writeln!(out, "{}  {}  ({})", pdf.name, format_file_size(pdf.size), pdf.filename)?;
    }
    Ok(())
}

pub fn write_analytics<O: Write>(out: &mut O, analytics: &Analytics) -> io::Result<()> {
    writeln!(out, "Total views: {}", analytics.total_views)?;
    writeln!(out, "Unique documents: {}", analytics.unique_pdfs)?;
    writeln!(out, "Views today: {}", analytics.today_views)?;

    if analytics.pdf_stats.is_empty() {
        return Ok(());
    }

    let width = analytics
        .pdf_stats
        .iter()
        .map(|stat| stat.filename.len())
        .chain(std::iter::once("FILENAME".len()))
        .max()
        .unwrap_or_default();

    writeln!(out)?;
    writeln!(out, "{:<width$}  {:>6}  LAST ACCESS", "FILENAME", "OPENS")?;
    for stat in &analytics.pdf_stats {
        let last =
            stat.last_accessed.as_deref().map_or_else(|| "never".to_owned(), format_timestamp);
        writeln!(out, "{:<width$}  {:>6}  {last}", stat.filename, stat.total_opens)?;
    }
    Ok(())
}

pub fn write_details<O: Write>(
    out: &mut O,
    filename: &str,
    details: &PdfDetails,
) -> io::Result<()> {
    writeln!(out, "Access history for {filename}:")?;
    if details.accesses.is_empty() {
        return writeln!(out, "  no accesses recorded");
    }

    for access in &details.accesses {
        writeln!(out, "  {}", format_timestamp(&access.timestamp))?;
    }
    Ok(())
}
