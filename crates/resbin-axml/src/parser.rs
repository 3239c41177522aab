//! Pull parser over binary XML documents.

use std::fmt;
use std::io::Read;

use resbin_res::{ResValue, ResourceMap, StringPool};

use crate::diagnostics::{Diagnostics, TracingDiagnostics};
use crate::dispatch::{Chunk, ChunkDispatcher};
use crate::node::{Attribute, XmlNode};
use crate::{Error, Result};

/// Parser states, one per event kind plus the lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum XmlEvent {
    /// `advance` has not been called yet.
    NotStarted,
    /// Decoding failed; the parser will not produce further events.
    BadDocument,
    StartDocument,
    /// The input is exhausted.
    EndDocument,
    /// The parser was closed.
    Closed,
    StartNamespace,
    EndNamespace,
    StartTag,
    EndTag,
    Text,
}

impl XmlEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "NOT_STARTED",
            Self::BadDocument => "BAD_DOCUMENT",
            Self::StartDocument => "START_DOCUMENT",
            Self::EndDocument => "END_DOCUMENT",
            Self::Closed => "CLOSED",
            Self::StartNamespace => "START_NAMESPACE",
            Self::EndNamespace => "END_NAMESPACE",
            Self::StartTag => "START_TAG",
            Self::EndTag => "END_TAG",
            Self::Text => "TEXT",
        }
    }

    /// Whether no event can follow this one.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::BadDocument | Self::EndDocument | Self::Closed)
    }
}

impl fmt::Display for XmlEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Resolve an optional pool index; absent indices resolve to `""`.
fn resolve(strings: Option<&StringPool>, index: Option<u32>) -> Result<&str> {
    match (index, strings) {
        (None, _) => Ok(""),
        (Some(index), None) => Err(Error::MissingStringPool(index)),
        (Some(index), Some(pool)) => Ok(pool.get(Some(index))?),
    }
}

/// Forward-only event cursor over a binary XML document.
///
/// Each call to [`XmlParser::advance`] decodes chunks until the next event.
/// Queries describe the node of the current event only; they return `None`
/// (or `""` for strings) when the current event has no such data.
///
/// # Example
///
/// ```no_run
/// use resbin_axml::{XmlEvent, XmlParser};
///
/// let file = std::fs::File::open("AndroidManifest.xml")?;
/// let mut parser = XmlParser::new(std::io::BufReader::new(file));
///
/// loop {
///     match parser.advance()? {
///         XmlEvent::StartTag => println!("<{}>", parser.element_name()?),
///         XmlEvent::EndDocument => break,
///         _ => {}
///     }
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct XmlParser<R, D = TracingDiagnostics> {
    dispatcher: Option<ChunkDispatcher<R>>,
    diagnostics: D,
    event: XmlEvent,
    strings: Option<StringPool>,
    resource_map: Option<ResourceMap>,
    node: Option<XmlNode>,
}

impl<R: Read> XmlParser<R> {
    /// Create a parser reporting warnings through `tracing`.
    pub fn new(reader: R) -> Self {
        Self::with_diagnostics(reader, TracingDiagnostics)
    }
}

impl<R: Read, D: Diagnostics> XmlParser<R, D> {
    /// Create a parser reporting warnings to `diagnostics`.
    pub fn with_diagnostics(reader: R, diagnostics: D) -> Self {
        Self {
            dispatcher: Some(ChunkDispatcher::new(reader)),
            diagnostics,
            event: XmlEvent::NotStarted,
            strings: None,
            resource_map: None,
            node: None,
        }
    }

    /// Move to the next event.
    ///
    /// Once a terminal event is reached it is returned again on every call.
    /// A decoding error is returned once; the parser then stays in
    /// [`XmlEvent::BadDocument`] and releases the stream.
    pub fn advance(&mut self) -> Result<XmlEvent> {
        if self.event.is_terminal() {
            return Ok(self.event);
        }

        loop {
            self.node = None;
            let Some(dispatcher) = self.dispatcher.as_mut() else {
                self.event = XmlEvent::BadDocument;
                return Ok(self.event);
            };

            match dispatcher.next_chunk(&mut self.diagnostics) {
                Ok(None) => {
                    self.event = XmlEvent::EndDocument;
                    return Ok(self.event);
                }
                Ok(Some(Chunk::StartDocument)) => {
                    self.event = XmlEvent::StartDocument;
                    return Ok(self.event);
                }
                Ok(Some(Chunk::StringPool(pool))) => {
                    tracing::debug!(strings = pool.len(), utf8 = pool.is_utf8(), "read string pool");
                    self.strings = Some(pool);
                }
                Ok(Some(Chunk::ResourceMap(map))) => {
                    tracing::debug!(ids = map.len(), "read resource map");
                    self.resource_map = Some(map);
                }
                Ok(Some(Chunk::Node(node))) => {
                    self.event = node.event();
                    self.node = Some(node);
                    return Ok(self.event);
                }
                Err(e) => {
                    tracing::debug!(error = %e, "binary XML document is malformed");
                    self.event = XmlEvent::BadDocument;
                    self.dispatcher = None;
                    return Err(e);
                }
            }
        }
    }

    /// The parser is single-pass; this always fails.
    pub fn restart(&mut self) -> Result<()> {
        Err(Error::RestartUnsupported)
    }

    /// Release the stream. Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.event == XmlEvent::Closed {
            return;
        }
        self.event = XmlEvent::Closed;
        self.dispatcher = None;
        self.node = None;
    }
}

impl<R, D> XmlParser<R, D> {
    /// The current event.
    pub fn event(&self) -> XmlEvent {
        self.event
    }

    /// The active string pool, once one was read.
    pub fn strings(&self) -> Option<&StringPool> {
        self.strings.as_ref()
    }

    /// The active resource map, once one was read.
    pub fn resource_map(&self) -> Option<&ResourceMap> {
        self.resource_map.as_ref()
    }

    pub fn diagnostics(&self) -> &D {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> D {
        self.diagnostics
    }

    /// The decoded node behind the current event.
    pub fn node(&self) -> Option<&XmlNode> {
        self.node.as_ref()
    }

    fn string(&self, index: Option<u32>) -> Result<&str> {
        resolve(self.strings.as_ref(), index)
    }

    pub fn line_number(&self) -> Option<u32> {
        self.node.as_ref().map(|node| node.header().line_number)
    }

    pub fn comment_id(&self) -> Option<u32> {
        self.node.as_ref().and_then(|node| node.header().comment.index())
    }

    pub fn comment(&self) -> Result<&str> {
        self.string(self.comment_id())
    }

    pub fn namespace_prefix_id(&self) -> Option<u32> {
        self.node.as_ref()?.namespace()?.prefix.index()
    }

    pub fn namespace_prefix(&self) -> Result<&str> {
        self.string(self.namespace_prefix_id())
    }

    pub fn namespace_uri_id(&self) -> Option<u32> {
        self.node.as_ref()?.namespace()?.uri.index()
    }

    pub fn namespace_uri(&self) -> Result<&str> {
        self.string(self.namespace_uri_id())
    }

    pub fn element_namespace_id(&self) -> Option<u32> {
        self.node.as_ref()?.element_name()?.0.index()
    }

    pub fn element_namespace(&self) -> Result<&str> {
        self.string(self.element_namespace_id())
    }

    pub fn element_name_id(&self) -> Option<u32> {
        self.node.as_ref()?.element_name()?.1.index()
    }

    pub fn element_name(&self) -> Result<&str> {
        self.string(self.element_name_id())
    }

    pub fn text_id(&self) -> Option<u32> {
        self.node.as_ref()?.text()?.data.index()
    }

    /// Character data of a text event.
    pub fn text(&self) -> Result<&str> {
        self.string(self.text_id())
    }

    /// Typed value of a text event.
    pub fn typed_text(&self) -> Option<ResValue> {
        Some(self.node.as_ref()?.text()?.typed_data)
    }

    /// 1-based index of the `id` attribute of a start tag, 0 if none.
    pub fn element_id_index(&self) -> Option<u16> {
        Some(self.node.as_ref()?.attr_ext()?.id_index)
    }

    pub fn element_class_index(&self) -> Option<u16> {
        Some(self.node.as_ref()?.attr_ext()?.class_index)
    }

    pub fn element_style_index(&self) -> Option<u16> {
        Some(self.node.as_ref()?.attr_ext()?.style_index)
    }

    fn indexed_attribute(&self, index: Option<u16>) -> Result<Option<AttributeInfo<'_>>> {
        match index {
            None | Some(0) => Ok(None),
            Some(index) => self.attribute(usize::from(index - 1)).map(Some),
        }
    }

    /// The attribute marked as the element's `id`.
    pub fn element_id(&self) -> Result<Option<AttributeInfo<'_>>> {
        self.indexed_attribute(self.element_id_index())
    }

    pub fn element_class(&self) -> Result<Option<AttributeInfo<'_>>> {
        self.indexed_attribute(self.element_class_index())
    }

    pub fn element_style(&self) -> Result<Option<AttributeInfo<'_>>> {
        self.indexed_attribute(self.element_style_index())
    }

    fn current_attributes(&self) -> &[Attribute] {
        self.node.as_ref().map_or(&[], |node| node.attributes())
    }

    /// Number of attributes of the current start tag.
    pub fn attribute_count(&self) -> usize {
        self.current_attributes().len()
    }

    /// Attribute at `index` of the current start tag.
    pub fn attribute(&self, index: usize) -> Result<AttributeInfo<'_>> {
        let attributes = self.current_attributes();
        let attribute = attributes
            .get(index)
            .ok_or_else(|| Error::AttributeIndexOutOfBounds {
                index,
                count: attributes.len(),
            })?;
        Ok(AttributeInfo {
            attribute,
            strings: self.strings.as_ref(),
            resource_map: self.resource_map.as_ref(),
        })
    }

    /// Iterate over the attributes of the current start tag.
    pub fn attributes(&self) -> impl Iterator<Item = AttributeInfo<'_>> {
        self.current_attributes().iter().map(|attribute| AttributeInfo {
            attribute,
            strings: self.strings.as_ref(),
            resource_map: self.resource_map.as_ref(),
        })
    }

    /// Position of the first attribute with the given namespace and name.
    ///
    /// A `None` (or empty) namespace only matches attributes without one.
    pub fn index_of_attribute(&self, namespace: Option<&str>, name: &str) -> Option<usize> {
        let pool = self.strings.as_ref()?;
        let name_id = pool.index_of(name)?;
        let namespace_id = match namespace {
            Some(namespace) if !namespace.is_empty() => Some(pool.index_of(namespace)?),
            _ => None,
        };
        self.current_attributes()
            .iter()
            .position(|a| a.namespace.index() == namespace_id && a.name.index() == Some(name_id))
    }
}

impl<R: Read, D: Diagnostics> Iterator for XmlParser<R, D> {
    type Item = Result<XmlEvent>;

    /// Yields every event up to and including the terminal one.
    fn next(&mut self) -> Option<Self::Item> {
        if self.event.is_terminal() {
            return None;
        }
        Some(self.advance())
    }
}

impl<R, D: fmt::Debug> fmt::Debug for XmlParser<R, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XmlParser")
            .field("event", &self.event)
            .field("diagnostics", &self.diagnostics)
            .field("strings", &self.strings.as_ref().map(StringPool::len))
            .field("node", &self.node)
            .finish_non_exhaustive()
    }
}

/// View of one attribute of the current start tag.
#[derive(Debug, Clone, Copy)]
pub struct AttributeInfo<'p> {
    attribute: &'p Attribute,
    strings: Option<&'p StringPool>,
    resource_map: Option<&'p ResourceMap>,
}

impl<'p> AttributeInfo<'p> {
    pub fn record(&self) -> &'p Attribute {
        self.attribute
    }

    pub fn namespace_id(&self) -> Option<u32> {
        self.attribute.namespace.index()
    }

    pub fn namespace(&self) -> Result<&'p str> {
        resolve(self.strings, self.namespace_id())
    }

    pub fn name_id(&self) -> Option<u32> {
        self.attribute.name.index()
    }

    pub fn name(&self) -> Result<&'p str> {
        resolve(self.strings, self.name_id())
    }

    pub fn value_string_id(&self) -> Option<u32> {
        self.attribute.raw_value.index()
    }

    /// Original string value; `""` when the compiler dropped it.
    pub fn value_string(&self) -> Result<&'p str> {
        resolve(self.strings, self.value_string_id())
    }

    pub fn typed_value(&self) -> ResValue {
        self.attribute.typed_value
    }

    /// Resource id of the attribute name, from the resource map.
    pub fn resource_id(&self) -> Option<u32> {
        self.resource_map?.resource_id(self.name_id()?)
    }

    /// String the typed value refers to, when it is a string value.
    pub fn typed_string(&self) -> Result<Option<&'p str>> {
        match self.attribute.typed_value.as_string_ref() {
            Ok(reference) => resolve(self.strings, reference.index()).map(Some),
            Err(_) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Warning;
    use crate::testutil::{DocumentBuilder, TestAttribute};
    use resbin_res::{DimensionUnit, ValueType};

    const ANDROID: &str = "http://schemas.android.com/apk/res/android";

    fn parser(data: &[u8]) -> XmlParser<&[u8], Vec<Warning>> {
        XmlParser::with_diagnostics(data, Vec::new())
    }

    fn events<R: Read, D: Diagnostics>(parser: &mut XmlParser<R, D>) -> Vec<XmlEvent> {
        parser.map(|event| event.unwrap()).collect()
    }

    #[test]
    fn test_minimal_document() {
        let mut builder = DocumentBuilder::new();
        builder
            .start_namespace("ns", "uri")
            .start_element(None, "root", &[])
            .end_element(None, "root")
            .end_namespace("ns", "uri");
        let data = builder.build();

        let mut parser = parser(&data);
        assert_eq!(parser.event(), XmlEvent::NotStarted);
        assert_eq!(parser.advance().unwrap(), XmlEvent::StartDocument);

        assert_eq!(parser.advance().unwrap(), XmlEvent::StartNamespace);
        assert_eq!(parser.strings().unwrap().strings().collect::<Vec<_>>(), ["ns", "uri", "root"]);
        assert_eq!(parser.namespace_prefix().unwrap(), "ns");
        assert_eq!(parser.namespace_uri().unwrap(), "uri");
        assert_eq!(parser.element_name_id(), None);

        assert_eq!(parser.advance().unwrap(), XmlEvent::StartTag);
        assert_eq!(parser.element_name().unwrap(), "root");
        assert_eq!(parser.element_namespace().unwrap(), "");
        assert_eq!(parser.namespace_prefix_id(), None);
        assert_eq!(parser.attribute_count(), 0);

        assert_eq!(parser.advance().unwrap(), XmlEvent::EndTag);
        assert_eq!(parser.element_name().unwrap(), "root");

        assert_eq!(parser.advance().unwrap(), XmlEvent::EndNamespace);
        assert_eq!(parser.namespace_prefix().unwrap(), "ns");

        assert_eq!(parser.advance().unwrap(), XmlEvent::EndDocument);
        assert_eq!(parser.advance().unwrap(), XmlEvent::EndDocument);
        assert_eq!(parser.line_number(), None);
        assert!(parser.diagnostics().is_empty());
    }

    #[test]
    fn test_event_sequence_via_iterator() {
        let mut builder = DocumentBuilder::new();
        builder
            .start_namespace("ns", "uri")
            .start_element(None, "root", &[])
            .end_element(None, "root")
            .end_namespace("ns", "uri");
        let data = builder.build();

        let mut parser = parser(&data);
        assert_eq!(
            events(&mut parser),
            [
                XmlEvent::StartDocument,
                XmlEvent::StartNamespace,
                XmlEvent::StartTag,
                XmlEvent::EndTag,
                XmlEvent::EndNamespace,
                XmlEvent::EndDocument,
            ]
        );
        assert!(parser.next().is_none());
    }

    #[test]
    fn test_unknown_chunk_between_tags() {
        let mut builder = DocumentBuilder::new();
        builder
            .raw_chunk(0x0555, 12, &[0, 0, 0, 0, 1, 2, 3, 4])
            .start_element(None, "item", &[])
            .end_element(None, "item");
        let data = builder.build_unwrapped();

        let mut parser = parser(&data);
        assert_eq!(
            events(&mut parser),
            [XmlEvent::StartTag, XmlEvent::EndTag, XmlEvent::EndDocument]
        );
        assert_eq!(
            parser.into_diagnostics(),
            [Warning::SkippedChunk { type_id: 0x0555 }]
        );
    }

    #[test]
    fn test_attributes() {
        let mut builder = DocumentBuilder::new();
        builder.resource_ids(&[0x0101_0000, 0x0101_00D0]);
        builder.intern("name");
        builder.intern("id");
        builder
            .start_namespace("android", ANDROID)
            .start_element_indexed(
                None,
                "activity",
                &[
                    TestAttribute::string(Some(ANDROID), "name", ".Main"),
                    TestAttribute::typed(
                        Some(ANDROID),
                        "id",
                        ResValue::reference(resbin_res::ResRef::new(0x7F08_0001)),
                    ),
                    TestAttribute::typed(None, "width", ResValue::dimension(12.0, DimensionUnit::Dip).unwrap()),
                    TestAttribute::string(None, "name", "plain"),
                ],
                [2, 0, 0],
            );
        let data = builder.build();

        let mut parser = parser(&data);
        while parser.advance().unwrap() != XmlEvent::StartTag {}

        assert_eq!(parser.attribute_count(), 4);
        let name = parser.attribute(0).unwrap();
        assert_eq!(name.name().unwrap(), "name");
        assert_eq!(name.namespace().unwrap(), ANDROID);
        assert_eq!(name.value_string().unwrap(), ".Main");
        assert_eq!(name.typed_string().unwrap(), Some(".Main"));
        assert_eq!(name.resource_id(), Some(0x0101_0000));

        let id = parser.element_id().unwrap().unwrap();
        assert_eq!(id.name().unwrap(), "id");
        assert_eq!(id.resource_id(), Some(0x0101_00D0));
        assert_eq!(id.value_string_id(), None);
        assert_eq!(id.value_string().unwrap(), "");
        assert_eq!(id.typed_value().as_reference().unwrap().ident(), Some(0x7F08_0001));
        assert!(parser.element_class().unwrap().is_none());

        let width = parser.attribute(2).unwrap();
        assert_eq!(width.typed_value().data_type(), Some(ValueType::Dimension));
        assert_eq!(width.typed_value().complex_value().unwrap(), 12.0);
        assert_eq!(width.resource_id(), None);
        assert_eq!(width.typed_string().unwrap(), None);

        assert_eq!(parser.index_of_attribute(Some(ANDROID), "name"), Some(0));
        assert_eq!(parser.index_of_attribute(None, "name"), Some(3));
        assert_eq!(parser.index_of_attribute(Some(""), "width"), Some(2));
        assert_eq!(parser.index_of_attribute(None, "id"), None);
        assert_eq!(parser.index_of_attribute(Some("missing"), "name"), None);
        assert_eq!(parser.index_of_attribute(None, "missing"), None);

        assert!(matches!(
            parser.attribute(4),
            Err(Error::AttributeIndexOutOfBounds { index: 4, count: 4 })
        ));
    }

    #[test]
    fn test_state_resets_between_events() {
        let mut builder = DocumentBuilder::new();
        builder
            .start_element(None, "a", &[TestAttribute::string(None, "k", "v")])
            .text("hello")
            .end_element(None, "a");
        let data = builder.build();

        let mut parser = parser(&data);
        parser.advance().unwrap();
        assert_eq!(parser.advance().unwrap(), XmlEvent::StartTag);
        assert_eq!(parser.attribute_count(), 1);

        assert_eq!(parser.advance().unwrap(), XmlEvent::Text);
        assert_eq!(parser.attribute_count(), 0);
        assert_eq!(parser.element_name_id(), None);
        assert_eq!(parser.element_id_index(), None);
        assert_eq!(parser.text().unwrap(), "hello");
        assert_eq!(
            parser.typed_text().unwrap().as_string_ref().unwrap().index(),
            parser.text_id()
        );
        assert_eq!(parser.line_number(), Some(2));
        assert_eq!(parser.comment().unwrap(), "");

        assert_eq!(parser.advance().unwrap(), XmlEvent::EndTag);
        assert_eq!(parser.text_id(), None);
        assert!(parser.attribute(0).is_err());
    }

    #[test]
    fn test_trailing_bytes_warning() {
        let mut builder = DocumentBuilder::new();
        let name = builder.intern("x");
        let mut body = Vec::new();
        for v in [1u32, 0xFFFF_FFFF, 0xFFFF_FFFF, name, 0xCAFE_F00D] {
            body.extend(v.to_le_bytes());
        }
        builder.raw_chunk(0x0103, 16, &body);
        let data = builder.build();

        let mut parser = parser(&data);
        assert_eq!(
            events(&mut parser),
            [XmlEvent::StartDocument, XmlEvent::EndTag, XmlEvent::EndDocument]
        );
        assert_eq!(
            parser.diagnostics(),
            &[Warning::TrailingBytes {
                type_id: 0x0103,
                bytes: 4
            }]
        );
    }

    #[test]
    fn test_truncated_document() {
        let mut builder = DocumentBuilder::new();
        builder
            .start_element(None, "root", &[])
            .end_element(None, "root");
        let mut data = builder.build();
        data.truncate(data.len() - 3);

        let mut parser = parser(&data);
        assert_eq!(parser.advance().unwrap(), XmlEvent::StartDocument);
        assert_eq!(parser.advance().unwrap(), XmlEvent::StartTag);
        assert!(parser.advance().is_err());
        assert_eq!(parser.event(), XmlEvent::BadDocument);
        assert_eq!(parser.advance().unwrap(), XmlEvent::BadDocument);
        assert!(parser.next().is_none());
    }

    #[test]
    fn test_truncated_header_between_chunks() {
        let mut builder = DocumentBuilder::new();
        builder.start_element(None, "root", &[]);
        let mut data = builder.build_unwrapped();
        data.extend([0x03, 0x01]);

        let mut parser = parser(&data);
        assert_eq!(parser.advance().unwrap(), XmlEvent::StartTag);
        assert!(parser.advance().is_err());
        assert_eq!(parser.event(), XmlEvent::BadDocument);
    }

    #[test]
    fn test_strings_without_pool() {
        let mut builder = DocumentBuilder::new();
        builder.start_element(None, "root", &[]);
        let data = builder.build_unwrapped();
        // Drop the leading string pool chunk.
        let pool_size = u32::from_le_bytes([data[4], data[5], data[6], data[7]]) as usize;

        let mut parser = parser(&data[pool_size..]);
        assert_eq!(parser.advance().unwrap(), XmlEvent::StartTag);
        assert!(parser.strings().is_none());
        assert!(matches!(parser.element_name(), Err(Error::MissingStringPool(0))));
        assert_eq!(parser.element_namespace().unwrap(), "");
        assert_eq!(parser.index_of_attribute(None, "root"), None);
    }

    #[test]
    fn test_restart_and_close() {
        let mut builder = DocumentBuilder::new();
        builder.start_element(None, "root", &[]);
        let data = builder.build();

        let mut parser = parser(&data);
        parser.advance().unwrap();
        assert!(matches!(parser.restart(), Err(Error::RestartUnsupported)));

        parser.advance().unwrap();
        parser.close();
        assert_eq!(parser.event(), XmlEvent::Closed);
        assert_eq!(parser.element_name_id(), None);
        parser.close();
        assert_eq!(parser.advance().unwrap(), XmlEvent::Closed);
        assert!(parser.next().is_none());
    }

    #[test]
    fn test_empty_input() {
        let mut parser = parser(&[]);
        assert_eq!(parser.advance().unwrap(), XmlEvent::EndDocument);
        assert!(parser.strings().is_none());
    }
}
