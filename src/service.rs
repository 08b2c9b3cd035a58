//! Document service
//!
//! Composes the filename codec, the converter, and an [`ArtifactStore`] into
//! the public operations. Direct fetches fail hard on any problem; searches
//! fail soft per item and return whatever could be read.

use chrono::NaiveDate;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::converter::{CanonicalDocument, DocumentConverter};
use crate::error::{Result, StoreError};
use crate::filename::{FilenameCodec, SearchQuery};
use crate::store::ArtifactStore;

/// A search hit: the original upload name and its stored document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentEntry {
    pub file_name: String,
    pub content: CanonicalDocument,
}

pub struct DocumentService<S> {
    store: S,
    codec: FilenameCodec,
    converter: DocumentConverter,
}

impl<S: ArtifactStore> DocumentService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            codec: FilenameCodec::new(),
            converter: DocumentConverter::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Convert and store a new document. Returns the stored name.
    pub async fn upload(&self, original_filename: &str, bytes: &[u8]) -> Result<String> {
        self.save(original_filename, bytes, false).await
    }

    /// Like [`upload`](Self::upload) but overwrites an existing document.
    pub async fn replace(&self, original_filename: &str, bytes: &[u8]) -> Result<String> {
        self.save(original_filename, bytes, true).await
    }

    pub async fn delete(&self, filename: &str) -> Result<()> {
        let stored_name = self.require_existing(filename).await?;
        self.store.delete(&stored_name).await?;

        info!(stored_name = %stored_name, "document deleted");
        Ok(())
    }

    pub async fn get_content(&self, filename: &str) -> Result<CanonicalDocument> {
        let stored_name = self.require_existing(filename).await?;
        let bytes = self.store.read(&stored_name).await?;
        self.converter.deserialize_json(&bytes)
    }

    pub async fn search_by_date(&self, date: NaiveDate) -> Result<Vec<DocumentEntry>> {
        self.search(&SearchQuery::Date(date)).await
    }

    pub async fn search_by_customer(&self, customer: &str) -> Result<Vec<DocumentEntry>> {
        self.search(&SearchQuery::Customer(customer.to_owned()))
            .await
    }

    pub async fn search_by_type(&self, doc_type: &str) -> Result<Vec<DocumentEntry>> {
        self.search(&SearchQuery::DocType(doc_type.to_owned()))
            .await
    }

    /// Scan stored documents matching `query`, in store enumeration order.
    ///
    /// Only a failure to start the enumeration is an error. Entries that
    /// cannot be listed, read, or decoded are logged and left out.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<DocumentEntry>> {
        let glob = query.glob(&self.codec);
        let mut candidates = self.store.enumerate(&glob).await?;
        let mut results = Vec::new();

        while let Some(candidate) = candidates.next().await {
            let stored_name = match candidate {
                Ok(name) => name,
                Err(e) => {
                    warn!(error = %e, "skipping unlistable storage entry");
                    continue;
                }
            };

            let Some(original_name) = self.codec.derive_original_name(&stored_name) else {
                debug!(stored_name = %stored_name, "not a stored document");
                continue;
            };
            if !query.matches(&self.codec, &original_name) {
                debug!(stored_name = %stored_name, "glob candidate rejected");
                continue;
            }

            match self.load_entry(&stored_name, original_name).await {
                Ok(entry) => results.push(entry),
                Err(e) => warn!(stored_name = %stored_name, error = %e, "skipping unreadable document"),
            }
        }

        info!(
            field = %query.field(),
            value = %query.value(),
            hits = results.len(),
            "search complete"
        );
        Ok(results)
    }

    async fn save(
        &self,
        original_filename: &str,
        bytes: &[u8],
        allow_overwrite: bool,
    ) -> Result<String> {
        if original_filename.is_empty() {
            return Err(StoreError::validation("Filename cannot be empty"));
        }
        let stored_name = self.codec.derive_stored_name(original_filename)?;

        if bytes.is_empty() {
            return Err(StoreError::validation(format!(
                "Uploaded file {} is empty",
                original_filename
            )));
        }

        if !allow_overwrite && self.store.exists(&stored_name).await? {
            return Err(StoreError::AlreadyExists {
                filename: stored_name,
            });
        }

        let json = self.converter.convert(bytes)?;
        self.store.write(&stored_name, &json).await?;

        info!(
            stored_name = %stored_name,
            replaced = allow_overwrite,
            "document stored"
        );
        Ok(stored_name)
    }

    /// Validate `filename` and return its stored name if the artifact exists
    async fn require_existing(&self, filename: &str) -> Result<String> {
        let stored_name = self.codec.derive_stored_name(filename)?;

        if !self.store.exists(&stored_name).await? {
            return Err(StoreError::NotFound {
                filename: filename.to_owned(),
            });
        }
        Ok(stored_name)
    }

    async fn load_entry(&self, stored_name: &str, original_name: String) -> Result<DocumentEntry> {
        let bytes = self.store.read(stored_name).await?;
        let content = self.converter.deserialize_json(&bytes)?;

        Ok(DocumentEntry {
            file_name: original_name,
            content,
        })
    }
}
