//! Delivery client.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::executor::RequestExecutor;
use crate::http::{HttpExecutor, ReqwestClient};
use crate::sync::{SyncEngine, SyncSpace};
use spacekit_model::{Asset, Entry, Locale, LocalizationContext, Resource};
use spacekit_protocol::{Query, QueryError, QueryOperation, Request, ResponsePage, SyncFilter};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// One page of a list request.
#[derive(Debug, Clone)]
pub struct ArrayResponse<T> {
    /// Decoded items.
    pub items: Vec<T>,
    /// Total matches.
    pub total: u64,
    /// Offset of this page.
    pub skip: u64,
    /// Page size.
    pub limit: u64,
    /// Items that could not be decoded or were of another type.
    pub skipped: usize,
}

impl<T> ArrayResponse<T> {
    /// Returns true when no item was returned.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Client for one space environment.
///
/// The space's locales are fetched on first use and shared by every
/// resource the client builds. So is the client's sync engine.
pub struct Client<E: RequestExecutor> {
    config: ClientConfig,
    executor: Arc<E>,
    context: OnceCell<Arc<LocalizationContext>>,
    engine: OnceCell<Arc<SyncEngine<E>>>,
}

impl Client<HttpExecutor<ReqwestClient>> {
    /// Creates a client that talks HTTP.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let executor = HttpExecutor::from_config(&config)?;
        Ok(Self::with_executor(config, executor))
    }
}

impl<E: RequestExecutor> Client<E> {
    /// Creates a client over any executor.
    pub fn with_executor(config: ClientConfig, executor: E) -> Self {
        Self {
            config,
            executor: Arc::new(executor),
            context: OnceCell::new(),
            engine: OnceCell::new(),
        }
    }

    /// Uses a known localization context instead of fetching locales.
    pub fn with_localization_context(self, context: Arc<LocalizationContext>) -> Self {
        Self {
            context: OnceCell::new_with(Some(context)),
            ..self
        }
    }

    /// The configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The executor.
    pub fn executor(&self) -> &Arc<E> {
        &self.executor
    }

    /// The space's localization context, fetched once.
    pub async fn localization_context(&self) -> ClientResult<Arc<LocalizationContext>> {
        self.context
            .get_or_try_init(|| self.fetch_localization_context())
            .await
            .cloned()
    }

    async fn fetch_localization_context(&self) -> ClientResult<Arc<LocalizationContext>> {
        let page = self.executor.execute(&Request::locales()).await?;
        let locales = page
            .items
            .into_iter()
            .map(serde_json::from_value::<Locale>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ClientError::decode(format!("invalid locale: {e}")))?;

        debug!(count = locales.len(), "fetched locales");
        Ok(Arc::new(LocalizationContext::new(locales)?))
    }

    /// Fetches entries matching a query.
    pub async fn fetch_entries(&self, query: &Query) -> ClientResult<ArrayResponse<Entry>> {
        if query.selected_mimetype_group().is_some() {
            return Err(QueryError::MimetypeSpecifiedOnEntry.into());
        }
        let page = self.executor.execute(&Request::entries(query)).await?;
        self.decode_page(page, |resource| match resource {
            Resource::Entry(entry) => Some(entry),
            _ => None,
        })
        .await
    }

    /// Fetches assets matching a query.
    pub async fn fetch_assets(&self, query: &Query) -> ClientResult<ArrayResponse<Asset>> {
        let page = self.executor.execute(&Request::assets(query)).await?;
        self.decode_page(page, |resource| match resource {
            Resource::Asset(asset) => Some(asset),
            _ => None,
        })
        .await
    }

    /// Fetches one entry by id.
    pub async fn fetch_entry(&self, id: &str) -> ClientResult<Entry> {
        let query = Query::where_field("sys.id", QueryOperation::Equals(id.to_string()));
        self.fetch_entries(&query)
            .await?
            .items
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::NoEntryFound { id: id.to_string() })
    }

    async fn decode_page<T>(
        &self,
        page: ResponsePage,
        select: impl Fn(Resource) -> Option<T>,
    ) -> ClientResult<ArrayResponse<T>> {
        let context = self.localization_context().await?;
        let mut items = Vec::with_capacity(page.items.len());
        let mut skipped = 0;

        for item in &page.items {
            match Resource::from_json(item, &context).map(&select) {
                Ok(Some(resource)) => items.push(resource),
                Ok(None) => skipped += 1,
                Err(e) => {
                    warn!(error = %e, "skipping undecodable item");
                    skipped += 1;
                }
            }
        }

        Ok(ArrayResponse {
            total: page.total.unwrap_or(items.len() as u64),
            skip: page.skip.unwrap_or(0),
            limit: page.limit.unwrap_or(items.len() as u64),
            items,
            skipped,
        })
    }

    /// The client's sync engine, built on first use over this client's
    /// executor and locales.
    pub async fn sync_engine(&self) -> ClientResult<Arc<SyncEngine<E>>> {
        self.engine
            .get_or_try_init(|| async {
                let context = self.localization_context().await?;
                let engine = SyncEngine::from_shared(Arc::clone(&self.executor), context)
                    .with_retry(self.config.retry.clone())
                    .with_preview(self.config.is_preview());
                Ok::<_, ClientError>(Arc::new(engine))
            })
            .await
            .cloned()
    }

    /// Runs an initial sync on the client's engine.
    ///
    /// The pass can be cancelled through `sync_engine().await?.cancel_handle()`
    /// and its snapshot is then available from the engine's `latest()`.
    pub async fn initial_sync(&self, filter: SyncFilter) -> ClientResult<Arc<SyncSpace>> {
        self.sync_engine().await?.initial_sync(filter).await
    }
}
