//! Cut the `rDE` document out of the cleaned `xContenDE` text.
//!
//! SIFEN places the digital signature inside `rDE` and, after it, the
//! `gCamFuFD` block holding the QR URL. Some responses are truncated or carry
//! trailing noise, so the cut is textual rather than structural.

const DOCUMENT_START: &str = "<rDE";
const DOCUMENT_END: &str = "</rDE>";
const SIGNATURE_START: &str = "<Signature";
const SUPPLEMENTARY_START: &str = "<gCamFuFD";

/// Which cut was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryPolicy {
    /// `<rDE` through its natural `</rDE>`.
    NaturalClose,
    /// `<rDE` through end of text, with a synthetic `</rDE>`.
    Reconstructed,
    /// `<rDE` up to the signature, closed if needed.
    TruncatedAtSignature,
    /// No `<rDE` found; text passed through untouched.
    Untouched,
}

/// Result of [`extract_document_fragment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub text: String,
    pub policy: BoundaryPolicy,
}

/// Extract the `rDE` element, keeping a `gCamFuFD` block that trails the signature.
///
/// - signature present and `gCamFuFD` after it: cut at the natural close, or
///   reconstruct to end of text;
/// - signature present without a trailing `gCamFuFD`: cut at the signature;
/// - no signature: cut at the natural close, or reconstruct.
pub fn extract_document_fragment(content: &str) -> Fragment {
    let Some(start) = content.find(DOCUMENT_START) else {
        tracing::debug!("no <rDE> start tag in embedded content");
        return Fragment {
            text: content.to_string(),
            policy: BoundaryPolicy::Untouched,
        };
    };
    let document = &content[start..];
    let signature = document.find(SIGNATURE_START);

    let fragment = match signature {
        Some(sig) if document[sig..].contains(SUPPLEMENTARY_START) => through_close(document),
        Some(sig) => {
            let mut text = document[..sig].to_string();
            close_if_open(&mut text);
            Fragment {
                text,
                policy: BoundaryPolicy::TruncatedAtSignature,
            }
        }
        None => through_close(document),
    };

    tracing::debug!(
        policy = ?fragment.policy,
        signature = signature.is_some(),
        len = fragment.text.len(),
        "extracted document fragment"
    );
    fragment
}

fn through_close(document: &str) -> Fragment {
    match document.find(DOCUMENT_END) {
        Some(end) => Fragment {
            text: document[..end + DOCUMENT_END.len()].to_string(),
            policy: BoundaryPolicy::NaturalClose,
        },
        None => {
            let mut text = document.to_string();
            close_if_open(&mut text);
            Fragment {
                text,
                policy: BoundaryPolicy::Reconstructed,
            }
        }
    }
}

fn close_if_open(text: &mut String) {
    if !text.trim_end().ends_with(DOCUMENT_END) {
        text.push_str(DOCUMENT_END);
    }
}
