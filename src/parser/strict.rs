//! Strict-tree decode: an element tree with manual, forgiving lookups.
//!
//! End tags must match, but entities are resolved leniently and each field is
//! taken from its usual path or, failing that, from the first element of that
//! name anywhere below. Misplaced blocks still resolve.

use super::cascade::{DecodeStrategy, RecoverableError};
use super::fields::{self, FieldLookup};
use super::tree::{Element, EntityMode};
use crate::core::InvoiceDocument;

impl FieldLookup for Element {
    fn text_at(&self, path: &[&str]) -> &str {
        let exact = path
            .iter()
            .try_fold(self, |node, name| node.child(name));
        exact
            .or_else(|| path.last().and_then(|name| self.descendant(name)))
            .map_or("", Element::text)
    }

    fn attribute(&self, name: &str) -> &str {
        self.attr(name).unwrap_or("")
    }
}

/// Second tier of the cascade.
pub struct StrictTreeDecode;

impl DecodeStrategy for StrictTreeDecode {
    fn name(&self) -> &'static str {
        "strict-tree"
    }

    fn attempt(&self, text: &str) -> Result<InvoiceDocument, RecoverableError> {
        let root = Element::parse(text, EntityMode::Lenient)?;
        let de = if root.name == "DE" {
            &root
        } else {
            root.descendant("DE")
                .ok_or_else(|| RecoverableError::MissingDocument(root.name.clone()))?
        };

        let rde = if root.name == "rDE" {
            &root
        } else {
            root.descendant("rDE").unwrap_or(&root)
        };
        let qr_verification_url = fields::clean_qr_url(rde.text_at(fields::QR_URL));

        Ok(fields::assemble_document(
            rde,
            de,
            root.descendants("gCamItem"),
            qr_verification_url,
        ))
    }
}
