//! Conversion of binary XML to text XML.

use std::io::{Read, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::diagnostics::Diagnostics;
use crate::parser::AttributeInfo;
use crate::{Error, Result, XmlEvent, XmlParser};

/// Text output state: namespace scopes and an element that may still
/// turn out to be empty.
struct XmlOutput<W: Write> {
    writer: Writer<W>,
    /// Namespaces in scope as `(prefix, uri)`, innermost last.
    namespaces: Vec<(String, String)>,
    /// How many of the innermost namespaces still need an `xmlns` attribute.
    undeclared: usize,
    pending: Option<BytesStart<'static>>,
}

impl<W: Write> XmlOutput<W> {
    fn new(writer: W) -> Self {
        Self {
            writer: Writer::new_with_indent(writer, b' ', 2),
            namespaces: Vec::new(),
            undeclared: 0,
            pending: None,
        }
    }

    fn write(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| Error::Xml(e.to_string()))
    }

    fn flush_pending(&mut self) -> Result<()> {
        match self.pending.take() {
            Some(start) => self.write(Event::Start(start)),
            None => Ok(()),
        }
    }

    /// `prefix:name` for a namespaced name, `name` otherwise.
    fn qualify(&self, uri: &str, name: &str) -> String {
        if uri.is_empty() {
            return name.to_string();
        }
        match self.namespaces.iter().rev().find(|(_, u)| u == uri) {
            Some((prefix, _)) if !prefix.is_empty() => format!("{prefix}:{name}"),
            _ => name.to_string(),
        }
    }

    fn declare_namespaces(&mut self, start: &mut BytesStart<'_>) {
        let first = self.namespaces.len() - self.undeclared;
        for (prefix, uri) in &self.namespaces[first..] {
            let key = if prefix.is_empty() {
                "xmlns".to_string()
            } else {
                format!("xmlns:{prefix}")
            };
            start.push_attribute((key.as_str(), uri.as_str()));
        }
        self.undeclared = 0;
    }
}

/// Text form of an attribute value.
///
/// The original string is preferred; compiled values fall back to their
/// typed rendering.
fn attribute_value(attribute: &AttributeInfo<'_>) -> Result<String> {
    if attribute.value_string_id().is_some() {
        return Ok(attribute.value_string()?.to_string());
    }
    if let Some(text) = attribute.typed_string()? {
        return Ok(text.to_string());
    }
    Ok(attribute.typed_value().value().to_string())
}

impl<R: Read, D: Diagnostics> XmlParser<R, D> {
    /// Convert the remaining events to an indented text XML document.
    ///
    /// Namespaces are declared on the element following their start event.
    /// Elements without content are written self-closing.
    pub fn write_xml<W: Write>(&mut self, writer: W) -> Result<()> {
        let mut out = XmlOutput::new(writer);
        out.write(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

        loop {
            match self.advance()? {
                XmlEvent::StartNamespace => {
                    out.flush_pending()?;
                    let prefix = self.namespace_prefix()?.to_string();
                    let uri = self.namespace_uri()?.to_string();
                    out.namespaces.push((prefix, uri));
                    out.undeclared += 1;
                }
                XmlEvent::EndNamespace => {
                    out.flush_pending()?;
                    out.namespaces.pop();
                    out.undeclared = out.undeclared.saturating_sub(1);
                }
                XmlEvent::StartTag => {
                    out.flush_pending()?;
                    let name = out.qualify(self.element_namespace()?, self.element_name()?);
                    let mut start = BytesStart::new(name);
                    out.declare_namespaces(&mut start);
                    for attribute in self.attributes() {
                        let key = out.qualify(attribute.namespace()?, attribute.name()?);
                        let value = attribute_value(&attribute)?;
                        start.push_attribute((key.as_str(), value.as_str()));
                    }
                    out.pending = Some(start);
                }
                XmlEvent::EndTag => match out.pending.take() {
                    Some(start) => out.write(Event::Empty(start))?,
                    None => {
                        let name = out.qualify(self.element_namespace()?, self.element_name()?);
                        out.write(Event::End(BytesEnd::new(name)))?;
                    }
                },
                XmlEvent::Text => {
                    out.flush_pending()?;
                    out.write(Event::Text(BytesText::new(self.text()?)))?;
                }
                XmlEvent::NotStarted | XmlEvent::StartDocument => {}
                XmlEvent::EndDocument | XmlEvent::BadDocument | XmlEvent::Closed => break,
            }
        }

        out.flush_pending()
    }

    /// Convert the remaining events to a text XML string.
    pub fn to_xml_string(&mut self) -> Result<String> {
        let mut output = Vec::new();
        self.write_xml(&mut output)?;
        String::from_utf8(output).map_err(|e| Error::Xml(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use resbin_res::{ResRef, ResValue};

    use crate::diagnostics::Warning;
    use crate::testutil::{DocumentBuilder, TestAttribute};
    use crate::{Error, XmlParser};

    const ANDROID: &str = "http://schemas.android.com/apk/res/android";

    fn convert(data: &[u8]) -> String {
        XmlParser::with_diagnostics(data, Vec::<Warning>::new())
            .to_xml_string()
            .unwrap()
    }

    #[test]
    fn test_manifest_to_xml() {
        let mut builder = DocumentBuilder::new();
        builder
            .start_namespace("android", ANDROID)
            .start_element(
                None,
                "manifest",
                &[
                    TestAttribute::string(None, "package", "com.example"),
                    TestAttribute::typed(Some(ANDROID), "versionCode", ResValue::int_dec(7)),
                ],
            )
            .start_element(
                None,
                "application",
                &[TestAttribute::typed(
                    Some(ANDROID),
                    "icon",
                    ResValue::reference(ResRef::new(0x7F02_0000)),
                )],
            )
            .end_element(None, "application")
            .start_element(None, "label", &[])
            .text("a < b")
            .end_element(None, "label")
            .end_element(None, "manifest")
            .end_namespace("android", ANDROID);

        let xml = convert(&builder.build());
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(xml.contains(&format!(
            "<manifest xmlns:android=\"{ANDROID}\" package=\"com.example\" android:versionCode=\"7\">"
        )));
        assert!(xml.contains("<application android:icon=\"@0x7f020000\"/>"));
        assert!(xml.contains("<label>a &lt; b</label>"));
        assert!(xml.trim_end().ends_with("</manifest>"));
        assert_eq!(xml.matches("xmlns:android").count(), 1);
    }

    #[test]
    fn test_default_namespace_and_unresolved_attributes() {
        let mut builder = DocumentBuilder::new();
        builder
            .start_namespace("", "urn:test")
            .start_element(
                Some("urn:test"),
                "root",
                &[TestAttribute::typed(Some("urn:other"), "flag", ResValue::boolean(true))],
            )
            .end_element(Some("urn:test"), "root")
            .end_namespace("", "urn:test");

        let xml = convert(&builder.build());
        assert!(xml.contains("<root xmlns=\"urn:test\" flag=\"true\"/>"));
    }

    #[test]
    fn test_malformed_document_fails() {
        let mut builder = DocumentBuilder::new();
        builder.start_element(None, "root", &[]);
        let mut data = builder.build();
        data.truncate(data.len() - 2);

        let result = XmlParser::with_diagnostics(&data[..], Vec::<Warning>::new()).to_xml_string();
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
