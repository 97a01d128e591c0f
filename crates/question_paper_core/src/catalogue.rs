//! crates/question_paper_core/src/catalogue.rs
//!
//! Lists subjects and topics by treating object-store key prefixes as a
//! directory tree: `<subject>/<topic>/<question>.pdf`.

use std::sync::Arc;
use tracing::warn;

use crate::domain::{ObjectListing, Subject, Topic};
use crate::ports::{ObjectStore, PortResult};

const DELIMITER: &str = "/";

pub struct Catalogue {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl Catalogue {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    /// Lists the subjects at the root of the question bucket, in listing order.
    pub async fn list_subjects(&self) -> PortResult<Vec<Subject>> {
        let folders = self.list_folders("").await?;

        Ok(folders
            .into_iter()
            .map(|id| Subject {
                name: display_name(&id),
                id,
            })
            .collect())
    }

    /// Lists the topics under one subject, in listing order.
    pub async fn list_topics(&self, subject: &str) -> PortResult<Vec<Topic>> {
        let prefix = format!("{subject}{DELIMITER}");
        let folders = self.list_folders(&prefix).await?;

        Ok(folders
            .into_iter()
            .map(|id| Topic {
                name: display_name(&id),
                id,
                subject_id: subject.to_string(),
            })
            .collect())
    }

    // Only one page is requested; larger catalogues are cut off at the store's page limit.
    async fn list_folders(&self, prefix: &str) -> PortResult<Vec<String>> {
        let listing = self
            .store
            .list(&self.bucket, prefix, Some(DELIMITER))
            .await?;

        if listing.truncated {
            warn!(
                bucket = %self.bucket,
                prefix,
                "Catalogue listing was truncated; only the first page is shown"
            );
        }

        Ok(folder_names(&listing, prefix))
    }
}

/// Turns common prefixes such as `math/algebra/` into folder names (`algebra`)
/// relative to `prefix`. Entries that end up empty are dropped.
pub fn folder_names(listing: &ObjectListing, prefix: &str) -> Vec<String> {
    listing
        .common_prefixes
        .iter()
        .filter_map(|common| {
            let trimmed = common.trim_end_matches(DELIMITER);
            let name = trimmed.strip_prefix(prefix).unwrap_or(trimmed);
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

/// Human-readable form of a folder id: underscores become spaces and each word
/// is title-cased. A letter is capitalised when it follows a non-letter.
pub fn display_name(id: &str) -> String {
    let mut name = String::with_capacity(id.len());
    let mut previous_is_letter = false;

    for c in id.replace('_', " ").chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                name.extend(c.to_lowercase());
            } else {
                name.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            name.push(c);
            previous_is_letter = false;
        }
    }

    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryObjectStore;

    const BUCKET: &str = "questions";

    fn seeded_store(keys: &[&str]) -> Arc<MemoryObjectStore> {
        let store = Arc::new(MemoryObjectStore::new());
        for key in keys {
            store.insert(BUCKET, key, b"%PDF".to_vec());
        }
        store
    }

    #[test]
    fn display_name_title_cases_words() {
        assert_eq!(display_name("organic_chemistry"), "Organic Chemistry");
        assert_eq!(display_name("grade_10_math"), "Grade 10 Math");
        assert_eq!(display_name("3d_SHAPES"), "3D Shapes");
        assert_eq!(display_name("math"), "Math");
    }

    #[test]
    fn folder_names_strip_prefix_and_drop_empty_entries() {
        let listing = ObjectListing {
            common_prefixes: vec![
                "/".to_string(),
                "math/".to_string(),
                "physics/".to_string(),
            ],
            ..Default::default()
        };
        assert_eq!(folder_names(&listing, ""), vec!["math", "physics"]);

        let listing = ObjectListing {
            common_prefixes: vec!["math/algebra/".to_string(), "math/geometry/".to_string()],
            ..Default::default()
        };
        assert_eq!(folder_names(&listing, "math/"), vec!["algebra", "geometry"]);
    }

    #[tokio::test]
    async fn list_subjects_returns_top_level_folders() {
        let store = seeded_store(&[
            "math/algebra/q1.pdf",
            "math/geometry/q1.pdf",
            "physics/mechanics/q1.pdf",
        ]);
        let catalogue = Catalogue::new(store, BUCKET);

        let subjects = catalogue.list_subjects().await.unwrap();
        let ids: Vec<_> = subjects.iter().map(|s| s.id.as_str()).collect();

        assert_eq!(ids, vec!["math", "physics"]);
        assert_eq!(subjects[1].name, "Physics");
    }

    #[tokio::test]
    async fn list_topics_is_scoped_to_the_subject() {
        let store = seeded_store(&[
            "math/algebra/q1.pdf",
            "math/linear_algebra/q1.pdf",
            "physics/mechanics/q1.pdf",
        ]);
        let catalogue = Catalogue::new(store, BUCKET);

        let topics = catalogue.list_topics("math").await.unwrap();

        assert_eq!(
            topics,
            vec![
                Topic {
                    id: "algebra".to_string(),
                    name: "Algebra".to_string(),
                    subject_id: "math".to_string(),
                },
                Topic {
                    id: "linear_algebra".to_string(),
                    name: "Linear Algebra".to_string(),
                    subject_id: "math".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn listing_is_limited_to_one_page() {
        let store = Arc::new(MemoryObjectStore::with_page_size(2));
        for key in ["a/x/q.pdf", "b/x/q.pdf", "c/x/q.pdf"] {
            store.insert(BUCKET, key, Vec::new());
        }
        let catalogue = Catalogue::new(store, BUCKET);

        let subjects = catalogue.list_subjects().await.unwrap();

        assert_eq!(subjects.len(), 2);
    }

    #[tokio::test]
    async fn unknown_subject_has_no_topics() {
        let store = seeded_store(&["math/algebra/q1.pdf"]);
        let catalogue = Catalogue::new(store, BUCKET);

        assert!(catalogue.list_topics("biology").await.unwrap().is_empty());
    }
}
