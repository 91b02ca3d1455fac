//! Builds small blank documents for tests.

use crate::{PageSize, PdfEngineError};
use lopdf::{dictionary, Document, Object};

/// Serializes a document with `page_count` empty pages of the given size.
pub fn blank_pdf(page_count: u32, size: PageSize) -> Result<Vec<u8>, PdfEngineError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let media_box = vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Real(size.width_pt as f32),
        Object::Real(size.height_pt as f32),
    ];

    let kids: Vec<Object> = (0..page_count)
        .map(|_| {
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => media_box.clone(),
            });
            Object::Reference(page_id)
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(i64::from(page_count)),
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}
