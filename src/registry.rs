//! A store of schema documents that references may point into.
//!
//! The compiler only reads from a registry; documents in it are compiled on
//! demand, the first time some `$ref` points into them.

use crate::errors::SchemaError;
use serde_json::Value;
use std::collections::HashMap;
use url::Url;

/// External schema documents, keyed by absolute URI.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    documents: HashMap<String, (Url, Value)>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document under its own top-level `$id`.
    ///
    /// Returns the URI the document was registered under.
    pub fn register(&mut self, document: Value) -> Result<Url, SchemaError> {
        let id = document
            .get("$id")
            .and_then(Value::as_str)
            .ok_or_else(|| SchemaError::MalformedSchema {
                pointer: String::new(),
                reason: "registered documents need a string \"$id\"".to_owned(),
            })?
            .to_owned();

        self.insert(&id, document)
    }

    /// Register a document under an explicit absolute URI.
    ///
    /// Any fragment in `uri` is ignored. A document already registered at the
    /// same URI is replaced.
    pub fn insert(&mut self, uri: &str, document: Value) -> Result<Url, SchemaError> {
        let mut url = Url::parse(uri).map_err(|err| SchemaError::InvalidUri {
            uri: uri.to_owned(),
            reason: err.to_string(),
        })?;
        url.set_fragment(None);

        self.documents
            .insert(url.as_str().to_owned(), (url.clone(), document));
        Ok(url)
    }

    /// Get the document registered at `uri`, if any.
    pub fn get(&self, uri: &str) -> Option<&Value> {
        self.documents.get(uri).map(|(_, document)| document)
    }

    /// Iterate over the registered documents.
    pub fn iter(&self) -> impl Iterator<Item = (&Url, &Value)> {
        self.documents.values().map(|(url, document)| (url, document))
    }

    /// The number of registered documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Is the registry empty?
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
