//! Minimal owned XML tree built from quick-xml events.
//!
//! Feeds are small, so the normalizer works on a fully materialized tree:
//! each element keeps its qualified name, its attributes separately from
//! its text, and its children in document order. Text and CDATA sections
//! are kept untrimmed and in order relative to child elements.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

use crate::util::collapse_whitespace;

/// Maximum element nesting accepted before the document is rejected.
/// Guards the tree builder against pathological inputs.
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("XML syntax error at byte {position}: {message}")]
    Syntax { position: u64, message: String },

    #[error("XML nesting depth exceeds maximum of {0} levels")]
    TooDeep(usize),

    #[error("document has no root element")]
    NoRoot,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Qualified name as written, e.g. `content:encoded`
    pub name: String,
    pub attributes: Vec<(String, String)>,
    /// Own character data (text and CDATA), untrimmed
    pub text: String,
    pub children: Vec<Element>,
    /// Own text runs keyed by how many children preceded them
    runs: Vec<(usize, String)>,
}

impl Element {
    /// Name without its namespace prefix.
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Trimmed text of the first child called `name`, if non-empty.
    pub fn child_text(&self, name: &str) -> Option<String> {
        self.child(name).map(Element::text_content).filter(|t| !t.is_empty())
    }

    /// First non-empty text among the named children, in priority order.
    pub fn first_child_text(&self, names: &[&str]) -> Option<String> {
        names.iter().find_map(|name| self.child_text(name))
    }

    /// All character data under this element in document order, with
    /// child element boundaries treated as whitespace and runs of
    /// whitespace collapsed.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.write_text(&mut out);
        collapse_whitespace(&out)
    }

    fn write_text(&self, out: &mut String) {
        let mut runs = self.runs.iter().peekable();
        for (index, child) in self.children.iter().enumerate() {
            while let Some((_, run)) = runs.next_if(|(pos, _)| *pos <= index) {
                out.push_str(run);
            }
            out.push(' ');
            child.write_text(out);
            out.push(' ');
        }
        for (_, run) in runs {
            out.push_str(run);
        }
    }

    fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
        let position = self.children.len();
        match self.runs.last_mut() {
            Some((pos, run)) if *pos == position => run.push_str(text),
            _ => self.runs.push((position, text.to_string())),
        }
    }
}

/// Resolve the XML predefined entities and numeric character references,
/// leaving any other `&name;` untouched for the HTML entity table.
fn unescape_lenient(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let name_len = tail[1..]
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '#'))
            .unwrap_or(tail.len() - 1);
        if tail[1 + name_len..].starts_with(';') && name_len > 0 {
            let reference = &tail[..name_len + 2];
            match quick_xml::escape::unescape(reference) {
                Ok(decoded) => out.push_str(&decoded),
                Err(_) => out.push_str(reference),
            }
            rest = &tail[name_len + 2..];
        } else {
            out.push('&');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

/// Parse a complete XML document into its root element.
pub fn parse_document(xml: &str) -> Result<Element, XmlError> {
    // SEC-002: quick-xml (0.37) never expands <!ENTITY> declarations, so
    // external entities in a hostile feed resolve to nothing.
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event().map_err(|e| XmlError::Syntax {
            position: reader.error_position(),
            message: e.to_string(),
        })?;

        match event {
            Event::Start(start) => {
                if stack.len() >= MAX_DEPTH {
                    return Err(XmlError::TooDeep(MAX_DEPTH));
                }
                stack.push(open_element(&start, &reader));
            }
            Event::Empty(start) => {
                let element = open_element(&start, &reader);
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element);
                }
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.push_text(&unescape_lenient(&String::from_utf8_lossy(&text)));
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.push_text(&String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(XmlError::Syntax {
            position: reader.buffer_position(),
            message: format!("unexpected end of document inside <{}>", open.name),
        });
    }

    root.ok_or(XmlError::NoRoot)
}

fn open_element(start: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Element {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let decoder = reader.decoder();
    let mut attributes = Vec::new();

    for attr_result in start.attributes() {
        let attr = match attr_result {
            Ok(attr) => attr,
            Err(e) => {
                tracing::debug!(element = %name, error = %e, "Skipping malformed XML attribute");
                continue;
            }
        };
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = match attr.decode_and_unescape_value(decoder) {
            Ok(v) => v.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        };
        attributes.push((key, value));
    }

    Element {
        name,
        attributes,
        ..Element::default()
    }
}

/// Attach a finished element to its parent, or make it the root.
/// Only the first top-level element is kept.
fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}
