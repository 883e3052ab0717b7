//! Entity decoding and the cleaning pipeline for embedded DTE content.
//!
//! The document body inside `xContenDE` arrives escaped more than once:
//! ampersands in the QR URL are routinely double-escaped, carriage returns
//! come as `&#13;` references, and stray non-ASCII references appear that do
//! not survive an XML parser. [`clean_document_content`] normalises all of it
//! before boundary extraction.

use std::borrow::Cow;
use std::sync::LazyLock;

use quick_xml::escape::{resolve_html5_entity, unescape};
use regex::{Captures, Regex};

use crate::core::SifenError;

/// Upper bound on unescape passes over the embedded content.
pub const MAX_UNESCAPE_PASSES: usize = 3;

/// Longest entity name considered; anything longer is literal text.
const MAX_ENTITY_LEN: usize = 32;

static CARRIAGE_RETURN_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(?:amp;)?#13;\s*").expect("static regex"));

static DECIMAL_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(?:amp;)?#(\d+);").expect("static regex"));

static CONTROL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").expect("static regex"));

/// Decode one level of entity references, HTML style.
///
/// Named HTML5 entities, decimal and hexadecimal character references are
/// resolved; a reference that does not resolve (or a bare `&`) is kept as is.
/// Only one level is decoded: `&amp;amp;` becomes `&amp;`.
pub fn unescape_html(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        match entity_body(after) {
            Some(body) => {
                match resolve(body) {
                    Some(text) => out.push_str(&text),
                    None => {
                        out.push('&');
                        out.push_str(body);
                        out.push(';');
                    }
                }
                rest = &after[body.len() + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Decode entity references under XML rules.
///
/// Only the five predefined entities and character references are accepted;
/// anything else, including a bare `&`, is malformed.
pub fn unescape_xml(input: &str) -> Result<Cow<'_, str>, SifenError> {
    unescape(input).map_err(|e| SifenError::MalformedXml(e.to_string()))
}

/// The `name` in `&name;`, if `after` (text following `&`) starts with one.
fn entity_body(after: &str) -> Option<&str> {
    let end = after
        .char_indices()
        .take(MAX_ENTITY_LEN + 1)
        .find(|(_, c)| *c == ';' || *c == '&' || *c == '<' || c.is_whitespace())?;
    match end {
        (0, _) => None,
        (i, ';') => Some(&after[..i]),
        _ => None,
    }
}

fn resolve(body: &str) -> Option<Cow<'static, str>> {
    if let Some(number) = body.strip_prefix('#') {
        return numeric_reference(number);
    }
    resolve_html5_entity(body).map(Cow::Borrowed)
}

fn numeric_reference(number: &str) -> Option<Cow<'static, str>> {
    let hex = number.strip_prefix('x').or_else(|| number.strip_prefix('X'));
    let code = match hex {
        Some(hex) if !hex.is_empty() => u32::from_str_radix(hex, 16).ok(),
        Some(_) => return None,
        None if !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit()) => {
            // Out-of-range decimal references still decode, to U+FFFD.
            Some(number.parse::<u32>().unwrap_or(u32::MAX))
        }
        None => return None,
    };
    let ch = code
        .filter(|&c| c != 0)
        .and_then(char::from_u32)
        .unwrap_or(char::REPLACEMENT_CHARACTER);
    Some(Cow::Owned(ch.to_string()))
}

/// Repeatedly apply [`unescape_html`] until the text stops changing or
/// [`MAX_UNESCAPE_PASSES`] is reached. Returns the text and the number of
/// passes that changed it.
pub fn unescape_repeatedly(input: &str) -> (String, usize) {
    repeat_until_stable(input, |text| unescape_html(text).into_owned())
}

fn repeat_until_stable<F>(input: &str, pass: F) -> (String, usize)
where
    F: Fn(&str) -> String,
{
    let mut text = input.to_string();
    let mut changed = 0;
    for _ in 0..MAX_UNESCAPE_PASSES {
        let next = pass(&text);
        if next == text {
            break;
        }
        text = next;
        changed += 1;
    }
    (text, changed)
}

/// One cleaning pass: a level of entities decoded, then control characters
/// dropped, so a reference split by a control character joins up for the
/// next pass.
fn decode_and_strip(text: &str) -> String {
    CONTROL_CHARS
        .replace_all(&unescape_html(text), "")
        .into_owned()
}

/// Full cleaning pipeline for the text of `xContenDE`.
///
/// 1. entity decoding as in [`unescape_repeatedly`], with control characters
///    dropped after every pass;
/// 2. `&#13;` (possibly still `&amp;`-escaped) plus trailing whitespace → `\n`;
/// 3. `&amp;amp;` → `&amp;`;
/// 4. remaining decimal references: below 127 decoded, the rest deleted;
/// 5. ASCII control characters other than tab, LF and CR removed;
/// 6. `&nbsp;`, `&copy;`, `&reg;` replaced by their characters;
/// 7. doubled `&lt;&lt;` / `&gt;&gt;` collapsed.
///
/// Steps 2 to 7 only find work when decoding stopped at the pass cap, so once
/// decoding converges the output is a fixed point: cleaning it again is a
/// no-op.
pub fn clean_document_content(raw: &str) -> String {
    let (text, passes) = repeat_until_stable(raw, decode_and_strip);
    tracing::debug!(passes, len = text.len(), "unescaped embedded document");

    let text = CARRIAGE_RETURN_REF.replace_all(&text, "\n");
    let text = text.replace("&amp;amp;", "&amp;");
    let text = DECIMAL_REF.replace_all(&text, |caps: &Captures<'_>| {
        match caps[1].parse::<u32>() {
            Ok(code) if code < 127 => char::from_u32(code).map(String::from).unwrap_or_default(),
            _ => String::new(),
        }
    });
    let text = CONTROL_CHARS.replace_all(&text, "");

    text.replace("&nbsp;", " ")
        .replace("&copy;", "\u{a9}")
        .replace("&reg;", "\u{ae}")
        .replace("&lt;&lt;", "&lt;")
        .replace("&gt;&gt;", "&gt;")
}
