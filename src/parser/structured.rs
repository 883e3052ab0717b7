//! Structured decode: the fragment becomes a generic [`Value`] map and fields
//! are read by fixed path.
//!
//! The conversion follows the usual XML-to-map convention: attributes become
//! `@name` keys, element text next to attributes or children is stored under
//! `#text`, and a child name that repeats collapses into a [`Value::List`].

use super::cascade::{DecodeStrategy, RecoverableError};
use super::fields::{self, FieldLookup};
use super::tree::{Element, EntityMode};
use crate::core::InvoiceDocument;

const TEXT_KEY: &str = "#text";
const DOCUMENT_WRAPPER: &str = "rDE";
const DOCUMENT: &str = "DE";

static NULL: Value = Value::Null;

/// Generic decoded XML node.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Empty element, or a missing path.
    Null,
    /// Element with text only.
    Text(String),
    /// Element with attributes or children, in document order.
    Map(Vec<(String, Value)>),
    /// A child name that occurred more than once.
    List(Vec<Value>),
}

impl Value {
    /// Convert an element's content (not its name) into a value.
    pub fn from_element(element: &Element) -> Value {
        let text = element.text();
        if element.attributes.is_empty() && element.children.is_empty() {
            return if text.is_empty() {
                Value::Null
            } else {
                Value::Text(text.to_string())
            };
        }

        let mut entries: Vec<(String, Value)> = element
            .attributes
            .iter()
            .map(|(k, v)| (format!("@{k}"), Value::Text(v.clone())))
            .collect();

        for child in &element.children {
            let value = Value::from_element(child);
            match entries.iter_mut().find(|(k, _)| *k == child.name) {
                Some((_, Value::List(items))) => items.push(value),
                Some((_, existing)) => {
                    let first = std::mem::replace(existing, Value::Null);
                    *existing = Value::List(vec![first, value]);
                }
                None => entries.push((child.name.clone(), value)),
            }
        }

        if !text.is_empty() {
            entries.push((TEXT_KEY.to_string(), Value::Text(text.to_string())));
        }
        Value::Map(entries)
    }

    /// A whole document: `{root name: root value}`.
    pub fn from_document(root: &Element) -> Value {
        Value::Map(vec![(root.name.clone(), Value::from_element(root))])
    }

    /// Child value by key. On a list, looks into the first element.
    pub fn get(&self, key: &str) -> &Value {
        match self {
            Value::Map(entries) => entries
                .iter()
                .find(|(k, _)| k == key)
                .map_or(&NULL, |(_, v)| v),
            Value::List(items) => items.first().map_or(&NULL, |v| v.get(key)),
            _ => &NULL,
        }
    }

    /// Follow `path` key by key.
    pub fn at(&self, path: &[&str]) -> &Value {
        path.iter().fold(self, |v, key| v.get(key))
    }

    /// Text content; empty for null.
    pub fn text(&self) -> &str {
        match self {
            Value::Text(s) => s,
            Value::Map(_) => self.get(TEXT_KEY).text(),
            Value::List(items) => items.first().map_or("", Value::text),
            Value::Null => "",
        }
    }

    /// Treat the value as a sequence: a list yields its elements, null yields
    /// nothing, anything else is a one-element sequence.
    pub fn items(&self) -> Vec<&Value> {
        match self {
            Value::List(items) => items.iter().collect(),
            Value::Null => Vec::new(),
            other => vec![other],
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Depth-first search for the first non-null value stored under `key`.
    ///
    /// A map's own entries are checked before descending into its children.
    pub fn find_first(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries
                .iter()
                .find(|(k, v)| k == key && !v.is_null())
                .map(|(_, v)| v)
                .or_else(|| entries.iter().find_map(|(_, v)| v.find_first(key))),
            Value::List(items) => items.iter().find_map(|v| v.find_first(key)),
            _ => None,
        }
    }
}

impl FieldLookup for Value {
    fn text_at(&self, path: &[&str]) -> &str {
        self.at(path).text()
    }

    fn attribute(&self, name: &str) -> &str {
        self.get(&format!("@{name}")).text()
    }
}

/// First tier of the cascade. Entities are decoded under XML rules, so any
/// stray `&` left by the cleaning pipeline makes this tier give way.
pub struct StructuredDecode;

impl DecodeStrategy for StructuredDecode {
    fn name(&self) -> &'static str {
        "structured"
    }

    fn attempt(&self, text: &str) -> Result<InvoiceDocument, RecoverableError> {
        let root = Element::parse(text, EntityMode::Strict)?;
        let tree = Value::from_document(&root);

        let (rde, de) = match root.name.as_str() {
            DOCUMENT_WRAPPER => {
                let rde = tree.get(DOCUMENT_WRAPPER);
                (rde, rde.get(DOCUMENT))
            }
            DOCUMENT => (&NULL, tree.get(DOCUMENT)),
            _ => {
                let rde = tree.find_first(DOCUMENT_WRAPPER).unwrap_or(&NULL);
                let de = match rde.get(DOCUMENT) {
                    Value::Null => tree.find_first(DOCUMENT).unwrap_or(&NULL),
                    de => de,
                };
                (rde, de)
            }
        };
        if de.is_null() {
            return Err(RecoverableError::MissingDocument(root.name));
        }

        let qr_verification_url = Some(rde.text_at(fields::QR_URL))
            .filter(|t| !t.is_empty())
            .or_else(|| tree.find_first("dCarQR").map(Value::text))
            .and_then(fields::clean_qr_url);

        Ok(fields::assemble_document(
            rde,
            de,
            de.at(fields::ITEMS).items(),
            qr_verification_url,
        ))
    }
}
