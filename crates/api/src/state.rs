use std::sync::Arc;

use vbc_blog_core::admin::{AdminCredential, TokenIssuer};
use vbc_blog_core::lead::LeadRepository;
use vbc_blog_core::post::PostRepository;
use vbc_blog_core::store::DocumentStore;

use crate::config::AppConfig;

/// Shared application state, passed to all handlers via Axum's `State` extractor.
/// Wrapped in `Arc` so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    store: Arc<dyn DocumentStore>,
    posts: PostRepository,
    leads: LeadRepository,
    config: AppConfig,
    admin: Option<AdminCredential>,
    tokens: TokenIssuer,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        config: AppConfig,
        admin: Option<AdminCredential>,
    ) -> Self {
        let tokens = TokenIssuer::new(&config.jwt_secret, config.jwt_ttl_secs);
        Self {
            inner: Arc::new(InnerState {
                posts: PostRepository::new(store.clone()),
                leads: LeadRepository::new(store.clone()),
                store,
                config,
                admin,
                tokens,
            }),
        }
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.inner.store.as_ref()
    }

    pub fn posts(&self) -> &PostRepository {
        &self.inner.posts
    }

    pub fn leads(&self) -> &LeadRepository {
        &self.inner.leads
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// `None` when no admin login is configured.
    pub fn admin(&self) -> Option<&AdminCredential> {
        self.inner.admin.as_ref()
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.inner.tokens
    }
}
