use std::sync::Arc;

use super::model::{Lead, LEADS_COLLECTION};
use crate::document::DocumentId;
use crate::store::{DocumentStore, StoreError};

#[derive(Clone)]
pub struct LeadRepository {
    store: Arc<dyn DocumentStore>,
}

impl LeadRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn insert(&self, lead: Lead) -> Result<DocumentId, StoreError> {
        let source = lead.source;
        let doc = self.store.insert(LEADS_COLLECTION, lead.into_content()?).await?;
        tracing::info!(id = %doc.id, ?source, "lead captured");
        Ok(doc.id)
    }
}
