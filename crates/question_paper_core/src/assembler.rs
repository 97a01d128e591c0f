//! crates/question_paper_core/src/assembler.rs
//!
//! Builds a paper: picks question documents per topic, combines them into one
//! document, stores it, records it in the registry and issues a download link.

use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{
    DownloadLink, GeneratedPaper, GenerationRequest, NewObject, Paper, SkippedDocument,
    SourceDocument, StorageLayout,
};
use crate::ports::{DocumentCombiner, DownloadLinkIssuer, ObjectStore, PaperRegistry, PortResult};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

pub struct PaperAssembler {
    store: Arc<dyn ObjectStore>,
    combiner: Arc<dyn DocumentCombiner>,
    registry: Arc<dyn PaperRegistry>,
    links: Arc<dyn DownloadLinkIssuer>,
    layout: StorageLayout,
}

impl PaperAssembler {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        combiner: Arc<dyn DocumentCombiner>,
        registry: Arc<dyn PaperRegistry>,
        links: Arc<dyn DownloadLinkIssuer>,
        layout: StorageLayout,
    ) -> Self {
        Self {
            store,
            combiner,
            registry,
            links,
            layout,
        }
    }

    /// Generates a paper owned by `owner_id`.
    ///
    /// Question documents that fail to fetch or parse are left out and reported
    /// in `GeneratedPaper::skipped`; every other failure aborts the generation.
    pub async fn generate(
        &self,
        request: GenerationRequest,
        owner_id: &str,
    ) -> PortResult<GeneratedPaper> {
        let paper_id = Uuid::new_v4();
        let storage_key = format!("{paper_id}.pdf");

        let question_keys = self.select_questions(&request).await?;
        let (sources, mut skipped) = self.fetch_questions(question_keys).await;
        let combined = self.combiner.combine(sources)?;
        for doc in &combined.skipped {
            warn!(key = %doc.key, reason = %doc.reason, "Skipping unreadable question document");
        }
        skipped.extend(combined.skipped);

        let metadata = BTreeMap::from([
            ("userId".to_string(), owner_id.to_string()),
            ("subject".to_string(), request.subject.clone()),
            ("title".to_string(), request.title.clone()),
            (
                "durationMinutes".to_string(),
                request.duration_minutes.to_string(),
            ),
        ]);
        self.store
            .put_object(
                &self.layout.generated_bucket,
                &storage_key,
                NewObject {
                    bytes: combined.bytes,
                    content_type: PDF_CONTENT_TYPE.to_string(),
                    metadata,
                },
            )
            .await?;

        let paper = Paper {
            id: paper_id,
            user_id: owner_id.to_string(),
            title: request.title,
            subject: request.subject,
            duration_minutes: request.duration_minutes,
            topics: request.topics,
            storage_key,
            created_at: Utc::now(),
        };

        // The stored document and the record are two independent writes.
        if let Err(e) = self.registry.save(&paper).await {
            error!(
                paper_id = %paper.id,
                storage_key = %paper.storage_key,
                "Registry write failed; stored document is orphaned: {:?}",
                e
            );
            return Err(e);
        }

        let url = self
            .links
            .issue_link(
                &self.layout.generated_bucket,
                &paper.storage_key,
                self.layout.link_ttl,
            )
            .await?;

        info!(
            paper_id = %paper.id,
            user_id = %paper.user_id,
            pages = combined.page_count,
            skipped = skipped.len(),
            "Paper generated"
        );

        Ok(GeneratedPaper {
            paper,
            link: DownloadLink {
                url,
                expires_in: self.layout.link_ttl,
            },
            skipped,
        })
    }

    /// Takes the first `question_count` documents of each topic in listing order.
    async fn select_questions(&self, request: &GenerationRequest) -> PortResult<Vec<String>> {
        let mut keys = Vec::new();

        for selection in &request.topics {
            let prefix = format!("{}/{}/", request.subject, selection.topic_id);
            let available = self.list_question_keys(&prefix).await?;
            keys.extend(
                available
                    .into_iter()
                    .take(selection.question_count as usize),
            );
        }

        Ok(keys)
    }

    async fn list_question_keys(&self, prefix: &str) -> PortResult<Vec<String>> {
        let listing = self
            .store
            .list(&self.layout.question_bucket, prefix, None)
            .await?;

        if listing.truncated {
            warn!(prefix, "Question listing was truncated; only the first page is used");
        }

        Ok(listing
            .keys
            .into_iter()
            .filter(|key| !key.ends_with('/'))
            .filter(|key| key.ends_with(&self.layout.question_suffix))
            .filter(|key| key.len() > prefix.len())
            .collect())
    }

    async fn fetch_questions(
        &self,
        keys: Vec<String>,
    ) -> (Vec<SourceDocument>, Vec<SkippedDocument>) {
        let mut sources = Vec::with_capacity(keys.len());
        let mut skipped = Vec::new();

        for key in keys {
            match self
                .store
                .get_object(&self.layout.question_bucket, &key)
                .await
            {
                Ok(bytes) => sources.push(SourceDocument { key, bytes }),
                Err(e) => {
                    warn!(key = %key, "Skipping question document that failed to fetch: {}", e);
                    skipped.push(SkippedDocument {
                        key,
                        reason: e.to_string(),
                    });
                }
            }
        }

        (sources, skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TopicSelection;
    use crate::memory::{LineCombiner, MemoryLinkIssuer, MemoryObjectStore, MemoryPaperRegistry};
    use std::time::Duration;

    const QUESTIONS: &str = "questions";
    const GENERATED: &str = "generated";

    struct Harness {
        store: Arc<MemoryObjectStore>,
        registry: Arc<MemoryPaperRegistry>,
        links: Arc<MemoryLinkIssuer>,
        assembler: PaperAssembler,
    }

    fn harness(keys: &[&str]) -> Harness {
        let store = Arc::new(MemoryObjectStore::new());
        for key in keys {
            store.insert(QUESTIONS, key, key.as_bytes().to_vec());
        }
        let registry = Arc::new(MemoryPaperRegistry::new());
        let links = Arc::new(MemoryLinkIssuer::new());
        let assembler = PaperAssembler::new(
            store.clone(),
            Arc::new(LineCombiner),
            registry.clone(),
            links.clone(),
            StorageLayout {
                question_bucket: QUESTIONS.to_string(),
                generated_bucket: GENERATED.to_string(),
                question_suffix: ".pdf".to_string(),
                link_ttl: StorageLayout::DEFAULT_LINK_TTL,
            },
        );
        Harness {
            store,
            registry,
            links,
            assembler,
        }
    }

    fn selection(topic_id: &str, question_count: u32) -> TopicSelection {
        TopicSelection {
            topic_id: topic_id.to_string(),
            question_count,
        }
    }

    fn midterm() -> GenerationRequest {
        GenerationRequest {
            title: "Math Midterm".to_string(),
            subject: "mathematics".to_string(),
            topics: vec![selection("algebra", 2), selection("geometry", 1)],
            duration_minutes: 60,
        }
    }

    fn stored_lines(h: &Harness, key: &str) -> Vec<String> {
        let object = h.store.object(GENERATED, key).unwrap();
        String::from_utf8(object.bytes)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn takes_first_questions_per_topic_in_order() {
        let h = harness(&[
            "mathematics/algebra/q1.pdf",
            "mathematics/algebra/q2.pdf",
            "mathematics/algebra/q3.pdf",
            "mathematics/geometry/q1.pdf",
            "mathematics/geometry/q2.pdf",
        ]);

        let generated = h.assembler.generate(midterm(), "user-a").await.unwrap();

        assert_eq!(
            stored_lines(&h, &generated.paper.storage_key),
            vec![
                "mathematics/algebra/q1.pdf",
                "mathematics/algebra/q2.pdf",
                "mathematics/geometry/q1.pdf",
            ]
        );
        assert!(generated.skipped.is_empty());
    }

    #[tokio::test]
    async fn records_paper_with_request_selections() {
        let h = harness(&["mathematics/algebra/q1.pdf", "mathematics/geometry/q1.pdf"]);

        let generated = h.assembler.generate(midterm(), "user-a").await.unwrap();
        let stored = h.registry.get(generated.paper.id).await.unwrap();

        assert_eq!(stored, generated.paper);
        assert_eq!(stored.topics, midterm().topics);
        assert_eq!(stored.user_id, "user-a");
        assert_eq!(stored.storage_key, format!("{}.pdf", stored.id));
        assert_eq!(stored.duration_minutes, 60);
    }

    #[tokio::test]
    async fn stores_document_with_descriptive_metadata() {
        let h = harness(&["mathematics/algebra/q1.pdf"]);

        let generated = h.assembler.generate(midterm(), "user-a").await.unwrap();
        let object = h.store.object(GENERATED, &generated.paper.storage_key).unwrap();

        assert_eq!(object.content_type, PDF_CONTENT_TYPE);
        assert_eq!(object.metadata["userId"], "user-a");
        assert_eq!(object.metadata["subject"], "mathematics");
        assert_eq!(object.metadata["title"], "Math Midterm");
        assert_eq!(object.metadata["durationMinutes"], "60");
    }

    #[tokio::test]
    async fn requesting_more_than_available_takes_everything() {
        let h = harness(&["mathematics/algebra/q1.pdf", "mathematics/algebra/q2.pdf"]);
        let request = GenerationRequest {
            topics: vec![selection("algebra", 10)],
            ..midterm()
        };

        let generated = h.assembler.generate(request, "user-a").await.unwrap();

        assert_eq!(stored_lines(&h, &generated.paper.storage_key).len(), 2);
    }

    #[tokio::test]
    async fn ignores_folders_and_other_file_types() {
        let h = harness(&[
            "mathematics/algebra/",
            "mathematics/algebra/notes.txt",
            "mathematics/algebra/q1.pdf",
        ]);
        let request = GenerationRequest {
            topics: vec![selection("algebra", 5)],
            ..midterm()
        };

        let generated = h.assembler.generate(request, "user-a").await.unwrap();

        assert_eq!(
            stored_lines(&h, &generated.paper.storage_key),
            vec!["mathematics/algebra/q1.pdf"]
        );
    }

    #[tokio::test]
    async fn skips_documents_that_fail_to_fetch_or_parse() {
        let h = harness(&[
            "mathematics/algebra/q1.pdf",
            "mathematics/algebra/q2.pdf",
            "mathematics/geometry/q1.pdf",
        ]);
        h.store.make_unreadable("mathematics/algebra/q1.pdf");
        h.store.insert(QUESTIONS, "mathematics/geometry/q1.pdf", Vec::new());

        let generated = h.assembler.generate(midterm(), "user-a").await.unwrap();
        let skipped: Vec<_> = generated.skipped.iter().map(|s| s.key.as_str()).collect();

        assert_eq!(
            skipped,
            vec!["mathematics/algebra/q1.pdf", "mathematics/geometry/q1.pdf"]
        );
        assert_eq!(
            stored_lines(&h, &generated.paper.storage_key),
            vec!["mathematics/algebra/q2.pdf"]
        );
    }

    #[tokio::test]
    async fn issues_link_with_default_lifetime() {
        let h = harness(&["mathematics/algebra/q1.pdf"]);

        let generated = h.assembler.generate(midterm(), "user-a").await.unwrap();

        assert_eq!(generated.link.expires_in, Duration::from_secs(3600));
        assert!(generated.link.url.contains(&generated.paper.storage_key));
        assert_eq!(h.links.issued(), 1);
    }

    #[tokio::test]
    async fn registry_failure_fails_generation_and_leaves_document() {
        let h = harness(&["mathematics/algebra/q1.pdf"]);
        h.registry.fail_saves();

        let result = h.assembler.generate(midterm(), "user-a").await;

        assert!(result.is_err());
        assert_eq!(h.store.keys(GENERATED).len(), 1);
        assert_eq!(h.links.issued(), 0);
    }

    #[tokio::test]
    async fn concurrent_generations_produce_distinct_papers() {
        let h = harness(&["mathematics/algebra/q1.pdf"]);

        let (first, second) = tokio::join!(
            h.assembler.generate(midterm(), "user-a"),
            h.assembler.generate(midterm(), "user-a")
        );

        assert_ne!(first.unwrap().paper.id, second.unwrap().paper.id);
        assert_eq!(h.registry.len(), 2);
    }
}
