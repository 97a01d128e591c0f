// std
use std::sync::Arc;
// crates.io
use lopdf::{Dictionary, Document, Object, Stream};
// self
use paper_api::adapters::LopdfCombiner;
use question_paper_core::{
    assembler::PDF_CONTENT_TYPE,
    memory::{MemoryLinkIssuer, MemoryObjectStore, MemoryPaperRegistry},
    GenerationRequest, PaperAssembler, StorageLayout, TopicSelection,
};

const QUESTIONS: &str = "questions";
const GENERATED: &str = "generated";

/// A one-page PDF whose content stream names `label`.
fn question_pdf(label: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content = format!("BT /F1 12 Tf 72 720 Td ({label}) Tj ET");
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));
    let mut page = Dictionary::new();
    page.set("Type", Object::Name(b"Page".to_vec()));
    page.set("Parent", Object::Reference(pages_id));
    page.set("Contents", Object::Reference(content_id));
    page.set("MediaBox", Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]));
    let page_id = doc.add_object(Object::Dictionary(page));
    let mut pages = Dictionary::new();
    pages.set("Type", Object::Name(b"Pages".to_vec()));
    pages.set("Count", Object::Integer(1));
    pages.set("Kids", Object::Array(vec![Object::Reference(page_id)]));
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(Object::Dictionary(catalog));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("Question PDF should serialize.");
    bytes
}

fn assembler(store: Arc<MemoryObjectStore>) -> PaperAssembler {
    PaperAssembler::new(
        store,
        Arc::new(LopdfCombiner),
        Arc::new(MemoryPaperRegistry::new()),
        Arc::new(MemoryLinkIssuer::new()),
        StorageLayout {
            question_bucket: QUESTIONS.to_string(),
            generated_bucket: GENERATED.to_string(),
            question_suffix: ".pdf".to_string(),
            link_ttl: StorageLayout::DEFAULT_LINK_TTL,
        },
    )
}

fn seeded_store() -> Arc<MemoryObjectStore> {
    let store = Arc::new(MemoryObjectStore::new());
    for key in [
        "mathematics/algebra/q1.pdf",
        "mathematics/algebra/q2.pdf",
        "mathematics/algebra/q3.pdf",
        "mathematics/geometry/q1.pdf",
        "mathematics/geometry/q2.pdf",
    ] {
        store.insert(QUESTIONS, key, question_pdf(key));
    }
    store
}

fn selection(topic_id: &str, question_count: u32) -> TopicSelection {
    TopicSelection {
        topic_id: topic_id.to_string(),
        question_count,
    }
}

fn request(topics: Vec<TopicSelection>) -> GenerationRequest {
    GenerationRequest {
        title: "Math Midterm".to_string(),
        subject: "mathematics".to_string(),
        topics,
        duration_minutes: 60,
    }
}

fn page_text(document: &Document, page_number: u32) -> String {
    let page_id = document.get_pages()[&page_number];
    String::from_utf8_lossy(
        &document
            .get_page_content(page_id)
            .expect("Combined page should carry its content stream."),
    )
    .into_owned()
}

#[tokio::test]
async fn combined_paper_holds_selected_pages_in_request_order() {
    let store = seeded_store();
    let assembler = assembler(store.clone());

    let generated = assembler
        .generate(request(vec![selection("algebra", 2), selection("geometry", 1)]), "user-a")
        .await
        .expect("Generation should succeed.");

    let stored = store
        .object(GENERATED, &generated.paper.storage_key)
        .expect("Combined paper should be stored.");
    assert_eq!(stored.content_type, PDF_CONTENT_TYPE);

    let combined = Document::load_mem(&stored.bytes).expect("Combined paper should be a PDF.");
    assert_eq!(combined.get_pages().len(), 3);
    assert!(page_text(&combined, 1).contains("mathematics/algebra/q1.pdf"));
    assert!(page_text(&combined, 2).contains("mathematics/algebra/q2.pdf"));
    assert!(page_text(&combined, 3).contains("mathematics/geometry/q1.pdf"));
    assert!(generated.skipped.is_empty());
}

#[tokio::test]
async fn corrupt_question_is_left_out_of_the_paper() {
    let store = seeded_store();
    store.insert(QUESTIONS, "mathematics/algebra/q2.pdf", b"not a pdf".to_vec());
    let assembler = assembler(store.clone());

    let generated = assembler
        .generate(request(vec![selection("algebra", 3)]), "user-a")
        .await
        .expect("Generation should succeed despite one corrupt question.");

    let stored = store
        .object(GENERATED, &generated.paper.storage_key)
        .expect("Combined paper should be stored.");
    let combined = Document::load_mem(&stored.bytes).expect("Combined paper should be a PDF.");
    assert_eq!(combined.get_pages().len(), 2);
    assert_eq!(generated.skipped.len(), 1);
    assert_eq!(generated.skipped[0].key, "mathematics/algebra/q2.pdf");
}
