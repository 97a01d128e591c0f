//! services/api/src/adapters/pdf.rs
//!
//! Combines question PDFs into one paper with `lopdf`.
//! Implements the `DocumentCombiner` port from the core crate.

use lopdf::{Dictionary, Document, Object, ObjectId};
use question_paper_core::domain::{CombinedDocument, SkippedDocument, SourceDocument};
use question_paper_core::ports::{DocumentCombiner, PortError, PortResult};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Deepest page tree we are willing to walk when resolving inherited attributes.
const MAX_TREE_DEPTH: usize = 64;

#[derive(Clone, Copy, Default)]
pub struct LopdfCombiner;

impl DocumentCombiner for LopdfCombiner {
    fn combine(&self, sources: Vec<SourceDocument>) -> PortResult<CombinedDocument> {
        let mut output = Document::with_version("1.5");
        let pages_id = output.new_object_id();
        let mut kids: Vec<ObjectId> = Vec::new();
        let mut skipped = Vec::new();

        for source in sources {
            match import_pages(&mut output, pages_id, &source.bytes) {
                Ok(page_ids) => kids.extend(page_ids),
                Err(reason) => skipped.push(SkippedDocument {
                    key: source.key,
                    reason,
                }),
            }
        }

        let page_count = kids.len();
        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set(
            "Kids",
            Object::Array(kids.into_iter().map(Object::Reference).collect()),
        );
        pages.set("Count", Object::Integer(page_count as i64));
        output.objects.insert(pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = output.add_object(Object::Dictionary(catalog));
        output.trailer.set("Root", Object::Reference(catalog_id));

        let mut bytes = Vec::new();
        output
            .save_to(&mut bytes)
            .map_err(|e| PortError::Unexpected(format!("Failed to write combined PDF: {e}")))?;

        Ok(CombinedDocument {
            bytes,
            page_count,
            skipped,
        })
    }
}

/// Copies every page of `bytes` into `output`, re-parented under `pages_id`.
/// Returns the new page ids in page order, or why the document was unusable.
fn import_pages(
    output: &mut Document,
    pages_id: ObjectId,
    bytes: &[u8],
) -> Result<Vec<ObjectId>, String> {
    let mut source = Document::load_mem(bytes).map_err(|e| format!("unreadable PDF: {e}"))?;
    source.renumber_objects_with(output.max_id + 1);

    let page_ids: Vec<ObjectId> = source.get_pages().into_values().collect();
    let mut pages = Vec::with_capacity(page_ids.len());
    for page_id in &page_ids {
        let mut page = source
            .get_dictionary(*page_id)
            .map_err(|e| format!("broken page {page_id:?}: {e}"))?
            .clone();

        // The source page tree is dropped, so inherited attributes move onto the page.
        for attribute in INHERITABLE {
            if !page.has(attribute) {
                if let Some(value) = inherited(&source, &page, attribute) {
                    page.set(attribute.to_vec(), value);
                }
            }
        }
        page.set("Parent", Object::Reference(pages_id));
        pages.push((*page_id, page));
    }

    let objects = std::mem::take(&mut source.objects);
    let max_id = objects.keys().map(|(number, _)| *number).max().unwrap_or(0);
    for (id, object) in objects {
        if !has_type(&object, b"Catalog") && !has_type(&object, b"Pages") {
            output.objects.insert(id, object);
        }
    }
    for (id, page) in pages {
        output.objects.insert(id, Object::Dictionary(page));
    }
    output.max_id = output.max_id.max(max_id);

    Ok(page_ids)
}

fn inherited(document: &Document, page: &Dictionary, attribute: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();

    for _ in 0..MAX_TREE_DEPTH {
        let node = document.get_dictionary(parent?).ok()?;
        if let Ok(value) = node.get(attribute) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    None
}

fn has_type(object: &Object, type_name: &[u8]) -> bool {
    object
        .as_dict()
        .ok()
        .and_then(|dict| dict.get(b"Type").ok())
        .and_then(|value| value.as_name().ok())
        == Some(type_name)
}
