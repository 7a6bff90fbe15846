//! Buffered XML parts.
//!
//! A part is kept as the full list of owned `quick_xml` events it was read
//! from, plus an element index over those events. Unchanged events are
//! written back verbatim, so anything this crate does not model (formatting,
//! extension lists, namespaces) survives a save untouched.

use deck_core::{Error, Result};
use quick_xml::events::Event;
use quick_xml::{Reader, Writer};

/// An element located in a part's event buffer.
#[derive(Debug, Clone)]
pub struct Element {
    /// Qualified name as written, e.g. `a:t`.
    pub qname: String,
    /// Name without namespace prefix, e.g. `t`.
    pub local: String,
    /// Index of the start (or empty) event.
    pub start: usize,
    /// Index of the end event; equals `start` for an empty element.
    pub end: usize,
    pub children: Vec<Element>,
}

impl Element {
    fn open(qname: &[u8], index: usize) -> Self {
        let qname = String::from_utf8_lossy(qname).into_owned();
        let local = String::from_utf8_lossy(local_name(qname.as_bytes())).into_owned();
        Self {
            qname,
            local,
            start: index,
            end: index,
            children: Vec::new(),
        }
    }

    /// First direct child with the given local name.
    pub fn child(&self, local: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.local == local)
    }

    /// Direct children with the given local name, in document order.
    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.local == local)
    }

    /// First descendant (depth-first, document order) with the given local name.
    pub fn descendant(&self, local: &str) -> Option<&Element> {
        self.children
            .iter()
            .find_map(|c| if c.local == local { Some(c) } else { c.descendant(local) })
    }

    /// Namespace prefix of the element, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.qname.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Element starting at `start` within this subtree.
    fn find(&self, start: usize) -> Option<&Element> {
        if self.start == start {
            return Some(self);
        }
        if start < self.start || start > self.end {
            return None;
        }
        self.children.iter().find_map(|c| c.find(start))
    }
}

/// A parsed XML part of the package.
#[derive(Debug, Clone)]
pub struct XmlPart {
    /// Path of the part inside the package.
    pub name: String,
    pub events: Vec<Event<'static>>,
    pub root: Element,
}

impl XmlPart {
    /// Parse a part, keeping every event including whitespace.
    pub fn parse(name: &str, xml: &str) -> Result<Self> {
        let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
        let mut reader = Reader::from_str(xml);

        let mut events: Vec<Event<'static>> = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let event = reader.read_event().map_err(|e| {
                Error::XmlError(format!(
                    "{} at position {}: {}",
                    name,
                    reader.buffer_position(),
                    e
                ))
            })?;
            let index = events.len();

            match &event {
                Event::Start(e) => stack.push(Element::open(e.name().as_ref(), index)),
                Event::Empty(e) => {
                    let element = Element::open(e.name().as_ref(), index);
                    attach(&mut stack, &mut root, element);
                }
                Event::End(_) => {
                    let mut element = stack.pop().ok_or_else(|| {
                        Error::XmlError(format!("{}: unexpected closing tag", name))
                    })?;
                    element.end = index;
                    attach(&mut stack, &mut root, element);
                }
                Event::Eof => break,
                _ => {}
            }

            events.push(event.into_owned());
        }

        if let Some(open) = stack.last() {
            return Err(Error::XmlError(format!(
                "{}: unclosed element <{}>",
                name, open.qname
            )));
        }

        let root = root.ok_or_else(|| Error::XmlError(format!("{}: no root element", name)))?;

        Ok(Self {
            name: name.to_string(),
            events,
            root,
        })
    }

    /// Element whose start event is at `start`.
    pub fn element_at(&self, start: usize) -> Option<&Element> {
        self.root.find(start)
    }

    /// Unescaped value of the attribute with the given qualified name.
    pub fn attribute(&self, element: &Element, key: &str) -> Option<String> {
        self.find_attribute(element, |k| k == key.as_bytes())
    }

    /// Unescaped value of the first attribute matching `matches` on its raw key.
    pub fn find_attribute<F>(&self, element: &Element, matches: F) -> Option<String>
    where
        F: Fn(&[u8]) -> bool,
    {
        let start = match self.events.get(element.start)? {
            Event::Start(e) | Event::Empty(e) => e,
            _ => return None,
        };

        start
            .attributes()
            .flatten()
            .find(|attr| matches(attr.key.as_ref()))
            .map(|attr| match attr.unescape_value() {
                Ok(value) => value.into_owned(),
                Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
            })
    }

    /// Character data inside an element, unescaped.
    pub fn text_content(&self, element: &Element) -> String {
        let mut text = String::new();
        if element.end <= element.start {
            return text;
        }

        for event in &self.events[element.start + 1..element.end] {
            match event {
                Event::Text(e) => match e.unescape() {
                    Ok(value) => text.push_str(&value),
                    Err(err) => {
                        log::warn!("{}: bad escape in text, keeping raw: {}", self.name, err);
                        text.push_str(&String::from_utf8_lossy(e));
                    }
                },
                Event::CData(e) => text.push_str(&String::from_utf8_lossy(e)),
                _ => {}
            }
        }

        text
    }

    /// Serialize the part, substituting each patch's events for the range it covers.
    ///
    /// Patches must not overlap.
    pub fn render(&self, patches: &mut [Patch]) -> Result<Vec<u8>> {
        patches.sort_by_key(|p| p.start);

        let mut writer = Writer::new(Vec::new());
        let mut pending = patches.iter().peekable();
        let mut index = 0;

        while index < self.events.len() {
            if let Some(patch) = pending.next_if(|p| p.start == index) {
                for event in &patch.events {
                    writer.write_event(event).map_err(xml_write_error)?;
                }
                index = patch.end + 1;
                continue;
            }

            writer
                .write_event(&self.events[index])
                .map_err(xml_write_error)?;
            index += 1;
        }

        Ok(writer.into_inner())
    }
}

/// Replacement of the events `start..=end` of a part.
#[derive(Debug, Clone)]
pub struct Patch {
    pub start: usize,
    pub end: usize,
    pub events: Vec<Event<'static>>,
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
    } else if root.is_none() {
        *root = Some(element);
    }
}

fn xml_write_error(e: quick_xml::Error) -> Error {
    Error::XmlError(format!("Failed to write XML: {}", e))
}

/// Extract the local name from a potentially namespaced XML element name.
pub fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}
