//! The reference table and `$ref` resolution.
//!
//! Every schema-position node is recorded under a canonical location string
//! of the form `<document-uri>#<json-pointer>`, once for each resource scope
//! that encloses it. Plain-name `$id` anchors are recorded as
//! `<document-uri>#<name>`. Resolving a reference is then a single table
//! probe.

use crate::errors::SchemaError;
use crate::pointer;
use crate::schema::NodeId;
use std::collections::HashMap;
use url::percent_encoding::percent_decode;
use url::Url;

/// Maps canonical locations to the nodes found there.
#[derive(Debug, Default, Clone)]
pub struct ReferenceTable {
    entries: HashMap<String, NodeId>,
}

impl ReferenceTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record `id` at `key`.
    ///
    /// Recording the same node twice is harmless; recording a different node
    /// at an occupied key means two resources claimed the same identity.
    pub(crate) fn insert(&mut self, key: String, id: NodeId) -> Result<(), SchemaError> {
        match self.entries.get(&key) {
            Some(&existing) if existing != id => Err(SchemaError::DuplicateId { uri: key }),
            Some(_) => Ok(()),
            None => {
                self.entries.insert(key, id);
                Ok(())
            }
        }
    }

    /// Look up a canonical location.
    pub fn get(&self, key: &str) -> Option<NodeId> {
        self.entries.get(key).cloned()
    }

    /// The number of recorded locations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Is the table empty?
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all recorded locations.
    pub fn iter(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.entries.iter().map(|(key, &id)| (key.as_str(), id))
    }

    /// Resolve `reference` against `base` to a node.
    pub fn resolve(&self, base: &Url, reference: &str) -> Result<NodeId, SchemaError> {
        let target = Target::parse(base, reference)?;
        self.get(&target.key())
            .ok_or_else(|| SchemaError::UnresolvableRef {
                pointer: String::new(),
                reference: reference.to_owned(),
            })
    }
}

/// A parsed reference: the document it names and the location inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Target {
    pub document: Url,
    pub fragment: Fragment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Fragment {
    /// A JSON Pointer, already split into unescaped tokens.
    Pointer(Vec<String>),

    /// A plain-name anchor declared with `"$id": "#name"`.
    Anchor(String),
}

impl Target {
    pub(crate) fn parse(base: &Url, reference: &str) -> Result<Target, SchemaError> {
        let mut document = base.join(reference).map_err(|err| SchemaError::InvalidUri {
            uri: reference.to_owned(),
            reason: err.to_string(),
        })?;

        let raw_fragment = document.fragment().unwrap_or("").to_owned();
        document.set_fragment(None);

        let decoded = percent_decode(raw_fragment.as_bytes())
            .decode_utf8()
            .map_err(|err| SchemaError::InvalidUri {
                uri: reference.to_owned(),
                reason: err.to_string(),
            })?;

        let fragment = if decoded.is_empty() || decoded.starts_with('/') {
            let tokens = pointer::parse(&decoded).map_err(|reason| SchemaError::InvalidUri {
                uri: reference.to_owned(),
                reason,
            })?;
            Fragment::Pointer(tokens)
        } else {
            Fragment::Anchor(decoded.into_owned())
        };

        Ok(Target { document, fragment })
    }

    pub(crate) fn key(&self) -> String {
        match self.fragment {
            Fragment::Pointer(ref tokens) => location_key(&self.document, tokens),
            Fragment::Anchor(ref name) => anchor_key(&self.document, name),
        }
    }
}

/// The canonical key of the node at `tokens` within `document`.
pub(crate) fn location_key<S: AsRef<str>>(document: &Url, tokens: &[S]) -> String {
    format!("{}#{}", document.as_str(), pointer::format(tokens))
}

/// The canonical key of a plain-name anchor within `document`.
pub(crate) fn anchor_key(document: &Url, name: &str) -> String {
    format!("{}#{}", document.as_str(), name)
}
