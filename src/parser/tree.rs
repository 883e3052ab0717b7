use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;

use super::unescape::{unescape_html, unescape_xml};
use crate::core::SifenError;

/// How entity references in text and attribute values are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityMode {
    /// XML rules: predefined entities and character references only.
    /// An unknown entity or a bare `&` makes the document malformed.
    Strict,
    /// HTML5 named entities and character references; anything that does not
    /// resolve is kept verbatim.
    Lenient,
}

/// Deepest element nesting accepted by [`Element::parse`].
pub const MAX_DEPTH: usize = 256;

/// A parsed XML element.
///
/// Names are stored without their prefix; the resolved namespace URI is kept
/// separately so lookups can ignore it unless they ask for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub namespace: Option<String>,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    /// Parse a complete document into its root element.
    ///
    /// End tags must match, exactly one root element is allowed, no element
    /// may be left open at the end of input, and nesting stops at [`MAX_DEPTH`].
    pub fn parse(xml: &str, mode: EntityMode) -> Result<Element, SifenError> {
        let mut reader = NsReader::from_str(xml);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let (resolved, event) = match reader.read_resolved_event() {
                Ok(pair) => pair,
                Err(e) => return Err(SifenError::MalformedXml(e.to_string())),
            };
            let namespace = match resolved {
                ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.0).into_owned()),
                _ => None,
            };

            match event {
                Event::Start(ref e) => {
                    if stack.len() >= MAX_DEPTH {
                        return Err(SifenError::MalformedXml(format!(
                            "elements nested deeper than {MAX_DEPTH}"
                        )));
                    }
                    stack.push(open_element(e, namespace, mode)?);
                }
                Event::Empty(ref e) => {
                    let element = open_element(e, namespace, mode)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| {
                        SifenError::MalformedXml("end tag without matching start".into())
                    })?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(ref e) => {
                    let raw = String::from_utf8_lossy(e);
                    let text = match mode {
                        EntityMode::Strict => unescape_xml(&raw)?.into_owned(),
                        EntityMode::Lenient => unescape_html(&raw).into_owned(),
                    };
                    push_text(&mut stack, &text)?;
                }
                Event::CData(ref e) => {
                    push_text(&mut stack, &String::from_utf8_lossy(e))?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(SifenError::MalformedXml(format!(
                "unexpected end of input inside <{}>",
                open.name
            )));
        }
        root.ok_or_else(|| SifenError::MalformedXml("document has no root element".into()))
    }

    /// Trimmed text content (empty when the element has none).
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    /// Text content exactly as it appeared, surrounding whitespace included.
    pub fn raw_text(&self) -> &str {
        &self.text
    }

    /// Attribute value by local name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First direct child with the given local name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Text of the first direct child with the given local name.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(Element::text)
    }

    /// First descendant (document order, excluding `self`) with the given local name.
    pub fn descendant(&self, name: &str) -> Option<&Element> {
        self.children.iter().find_map(|c| {
            if c.name == name {
                Some(c)
            } else {
                c.descendant(name)
            }
        })
    }

    /// All descendants with the given local name, in document order.
    pub fn descendants<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        self.collect_descendants(name, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, name: &str, found: &mut Vec<&'a Element>) {
        for c in &self.children {
            if c.name == name {
                found.push(c);
            }
            c.collect_descendants(name, found);
        }
    }

    /// First element (including `self`) with the given namespace URI and local name.
    pub fn find_ns(&self, namespace: &str, name: &str) -> Option<&Element> {
        if self.name == name && self.namespace.as_deref() == Some(namespace) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_ns(namespace, name))
    }
}

fn open_element(
    start: &BytesStart<'_>,
    namespace: Option<String>,
    mode: EntityMode,
) -> Result<Element, SifenError> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut attributes = Vec::new();

    for attr in start.attributes() {
        let attr = match (attr, mode) {
            (Ok(a), _) => a,
            (Err(e), EntityMode::Strict) => {
                return Err(SifenError::MalformedXml(format!("<{name}>: {e}")));
            }
            (Err(_), EntityMode::Lenient) => continue,
        };
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let raw = String::from_utf8_lossy(&attr.value);
        let value = match mode {
            EntityMode::Strict => unescape_xml(&raw)
                .map_err(|e| SifenError::MalformedXml(format!("<{name} {key}>: {e}")))?
                .into_owned(),
            EntityMode::Lenient => unescape_html(&raw).into_owned(),
        };
        attributes.push((key, value));
    }

    Ok(Element {
        name,
        namespace,
        attributes,
        text: String::new(),
        children: Vec::new(),
    })
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), SifenError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        Ok(())
    } else if root.is_none() {
        *root = Some(element);
        Ok(())
    } else {
        Err(SifenError::MalformedXml(format!(
            "second root element <{}>",
            element.name
        )))
    }
}

fn push_text(stack: &mut [Element], text: &str) -> Result<(), SifenError> {
    match stack.last_mut() {
        Some(current) => {
            current.text.push_str(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(SifenError::MalformedXml(
            "text outside the root element".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIFEN_NS: &str = "http://ekuatia.set.gov.py/sifen/xsd";

    #[test]
    fn parses_namespaced_tree() {
        let xml = r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope">
            <env:Body>
              <ns2:rResEnviConsRUC xmlns:ns2="http://ekuatia.set.gov.py/sifen/xsd">
                <ns2:dCodRes>0502</ns2:dCodRes>
              </ns2:rResEnviConsRUC>
            </env:Body>
          </env:Envelope>"#;
        let root = Element::parse(xml, EntityMode::Lenient).unwrap();
        assert_eq!(root.name, "Envelope");
        let body = root.find_ns(SIFEN_NS, "rResEnviConsRUC").unwrap();
        assert_eq!(body.child_text("dCodRes"), Some("0502"));
        assert_eq!(body.namespace.as_deref(), Some(SIFEN_NS));
    }

    #[test]
    fn rejects_excessive_nesting() {
        let xml = format!("{}{}", "<a>".repeat(MAX_DEPTH + 1), "</a>".repeat(MAX_DEPTH + 1));
        assert!(matches!(
            Element::parse(&xml, EntityMode::Lenient),
            Err(SifenError::MalformedXml(_))
        ));
        let xml = format!("{}{}", "<a>".repeat(MAX_DEPTH), "</a>".repeat(MAX_DEPTH));
        assert!(Element::parse(&xml, EntityMode::Lenient).is_ok());
    }

    #[test]
    fn attributes_by_local_name() {
        let root = Element::parse(
            r#"<rDE xmlns="urn:x" xmlns:xsi="urn:y"><DE Id="0144"/></rDE>"#,
            EntityMode::Strict,
        )
        .unwrap();
        let de = root.child("DE").unwrap();
        assert_eq!(de.attr("Id"), Some("0144"));
        assert!(root.attributes.is_empty());
    }

    #[test]
    fn descendant_search_is_document_order() {
        let root = Element::parse(
            "<a><b><c>first</c></b><c>second</c></a>",
            EntityMode::Strict,
        )
        .unwrap();
        assert_eq!(root.descendant("c").unwrap().text(), "first");
        let all: Vec<&str> = root.descendants("c").iter().map(|e| e.text()).collect();
        assert_eq!(all, vec!["first", "second"]);
    }

    #[test]
    fn strict_rejects_bare_ampersand_lenient_keeps_it() {
        let xml = "<q>https://x/?a=1&b=2</q>";
        assert!(matches!(
            Element::parse(xml, EntityMode::Strict),
            Err(SifenError::MalformedXml(_))
        ));
        let root = Element::parse(xml, EntityMode::Lenient).unwrap();
        assert_eq!(root.text(), "https://x/?a=1&b=2");
    }

    #[test]
    fn lenient_resolves_html_entities() {
        let root = Element::parse("<n>Caf&eacute;&nbsp;S.A.</n>", EntityMode::Lenient).unwrap();
        assert_eq!(root.text(), "Café\u{a0}S.A.");
        assert!(Element::parse("<n>Caf&eacute;</n>", EntityMode::Strict).is_err());
    }

    #[test]
    fn text_is_trimmed() {
        let root = Element::parse("<n>\n   Acme Corp   \n</n>", EntityMode::Strict).unwrap();
        assert_eq!(root.text(), "Acme Corp");
        assert_eq!(root.raw_text(), "\n   Acme Corp   \n");
    }

    #[test]
    fn whitespace_between_children_is_not_content() {
        let root = Element::parse("<a>\n  <b>  x </b>\n  <c/>\n</a>", EntityMode::Lenient).unwrap();
        assert_eq!(root.text(), "");
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.child("b").map(Element::raw_text), Some("  x "));
    }

    #[test]
    fn structural_errors() {
        assert!(Element::parse("", EntityMode::Lenient).is_err());
        assert!(Element::parse("<a><b></a>", EntityMode::Lenient).is_err());
        assert!(Element::parse("<a><b>", EntityMode::Lenient).is_err());
        assert!(Element::parse("<a/><b/>", EntityMode::Lenient).is_err());
        assert!(Element::parse("<a/>tail", EntityMode::Lenient).is_err());
        assert!(Element::parse("not xml at all", EntityMode::Lenient).is_err());
    }
}
