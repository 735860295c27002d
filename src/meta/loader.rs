//! Fetching metadata documents through the network collaborator.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::normalize::{check_depth, MetadataError};
use crate::config::EngineConfig;
use crate::expr::{interpolate, Context};
use crate::net::{Network, NetworkError};

/// Upper bound on `meta-get` expansion rounds. Fetched fragments may carry
/// further references; anything still unresolved after this many rounds is
/// left as-is.
const MAX_META_GET_ROUNDS: usize = 8;

/// Key marking an object whose content is fetched from a URL.
pub const META_GET: &str = "meta-get";

/// Document-level load failure.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error("request rejected: {0}")]
    Rejected(String),
}

/// Loads raw metadata documents by URL, with an optional per-URL cache.
pub struct MetadataLoader {
    network: Rc<dyn Network>,
    config: EngineConfig,
    cache: RefCell<HashMap<String, Value>>,
}

impl MetadataLoader {
    pub fn new(network: Rc<dyn Network>, config: &EngineConfig) -> Self {
        Self {
            network,
            config: config.clone(),
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Fetch the document at `url`, unwrap its envelope, and expand every
    /// `meta-get` reference against `data`.
    ///
    /// Successful loads are cached by URL when caching is enabled.
    pub async fn load(&self, url: &str, data: &Value) -> Result<Value, LoadError> {
        if self.config.cache_metadata {
            if let Some(cached) = self.cache.borrow().get(url) {
                debug!(url, "metadata cache hit");
                return Ok(cached.clone());
            }
        }

        debug!(url, "fetching metadata");
        let envelope = self.network.get(url, &Map::new()).await?;
        if !envelope.success {
            return Err(LoadError::Rejected(envelope.error_message().to_owned()));
        }
        let mut document = envelope.payload;
        if !document.is_object() {
            return Err(MetadataError::NotAnObject("a non-object payload").into());
        }
        check_depth(&document, self.config.max_depth)?;
        self.resolve_meta_get(&mut document, data).await;

        if self.config.cache_metadata {
            self.cache.borrow_mut().insert(url.to_owned(), document.clone());
        }
        Ok(document)
    }

    /// Drop every cached document.
    pub fn clear_cache(&self) {
        self.cache.borrow_mut().clear();
    }

    pub fn cached(&self, url: &str) -> bool {
        self.cache.borrow().contains_key(url)
    }

    /// Replace every object carrying `meta-get` with the fetched fragment
    /// merged over it.
    ///
    /// Failed references are logged and left in place.
    pub async fn resolve_meta_get(&self, document: &mut Value, data: &Value) {
        let context = Context::new().with_layer(data);
        let mut failed: HashSet<String> = HashSet::new();

        for round in 0..MAX_META_GET_ROUNDS {
            let mut pending = Vec::new();
            collect_meta_get(document, String::new(), &mut pending);
            pending.retain(|pointer| !failed.contains(pointer));
            if pending.is_empty() {
                return;
            }
            debug!(round, count = pending.len(), "expanding meta-get references");

            for pointer in pending {
                let Some(url) = document
                    .pointer(&pointer)
                    .and_then(|node| node.get(META_GET))
                    .and_then(Value::as_str)
                    .map(|url| interpolate(url, &context))
                else {
                    failed.insert(pointer);
                    continue;
                };

                let fragment = match self.network.get(&url, &Map::new()).await {
                    Ok(envelope) if envelope.success => envelope.payload,
                    Ok(envelope) => {
                        warn!(url = %url, error = envelope.error_message(), "meta-get rejected");
                        failed.insert(pointer);
                        continue;
                    }
                    Err(error) => {
                        warn!(url = %url, %error, "meta-get failed");
                        failed.insert(pointer);
                        continue;
                    }
                };
                let Value::Object(fragment) = fragment else {
                    warn!(url = %url, "meta-get payload is not an object");
                    failed.insert(pointer);
                    continue;
                };
                if let Some(Value::Object(node)) = document.pointer_mut(&pointer) {
                    node.remove(META_GET);
                    node.extend(fragment);
                }
            }
        }
        warn!("meta-get expansion stopped after {MAX_META_GET_ROUNDS} rounds");
    }
}

/// JSON pointers of every object carrying a string `meta-get`, pre-order.
fn collect_meta_get(value: &Value, pointer: String, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if map.get(META_GET).is_some_and(Value::is_string) {
                out.push(pointer.clone());
            }
            for (key, child) in map {
                collect_meta_get(child, format!("{pointer}/{}", escape(key)), out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                collect_meta_get(child, format!("{pointer}/{index}"), out);
            }
        }
        _ => {}
    }
}

fn escape(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

// ===========================================================================
// Tests
// ===========================================================================
