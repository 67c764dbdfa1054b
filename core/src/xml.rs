// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Minimal XML building and reading helpers shared by entity serializers.

use crate::constants::XML_NAMESPACE;
use crate::hash::{base64_decode, base64_encode};
use crate::{Error, Result};
use bytes::Bytes;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::cell::RefCell;
use std::fmt::Display;
use std::str::FromStr;

thread_local! {
    // Read buffer reused by every parse on this thread, never shared across threads.
    static READ_BUFFER: RefCell<Vec<u8>> = RefCell::new(Vec::with_capacity(4096));
}

/// XmlBuilder writes one entity document.
///
/// ```
/// use reqmns_core::xml::XmlBuilder;
///
/// let mut builder = XmlBuilder::new("Queue")?;
/// builder
///     .element("DelaySeconds", Some(10), None)?
///     .element("VisibilityTimeout", None::<u64>, None)?;
/// let body = builder.finish()?;
/// # Ok::<(), reqmns_core::Error>(())
/// ```
pub struct XmlBuilder {
    root: String,
    writer: Writer<Vec<u8>>,
}

impl XmlBuilder {
    /// Start a document with the given root element.
    pub fn new(root: &str) -> Result<Self> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::Start(
            BytesStart::new(root).with_attributes([("xmlns", XML_NAMESPACE)]),
        ))?;

        Ok(Self {
            root: root.to_string(),
            writer,
        })
    }

    /// Write `<name>value</name>`.
    ///
    /// Falls back to `default` when `value` is absent, and omits the element
    /// entirely when both are absent.
    pub fn element<T: Display>(
        &mut self,
        name: &str,
        value: Option<T>,
        default: Option<&str>,
    ) -> Result<&mut Self> {
        match (value, default) {
            (Some(v), _) => self.write_text(name, &v.to_string())?,
            (None, Some(d)) => self.write_text(name, d)?,
            (None, None) => {}
        }
        Ok(self)
    }

    /// Write a binary value as base64 text, omitted when absent.
    pub fn binary_element(&mut self, name: &str, value: Option<&[u8]>) -> Result<&mut Self> {
        if let Some(v) = value {
            self.write_text(name, &base64_encode(v))?;
        }
        Ok(self)
    }

    fn write_text(&mut self, name: &str, text: &str) -> Result<()> {
        self.writer.write_event(Event::Start(BytesStart::new(name)))?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    /// Close the root element and return the document.
    pub fn finish(mut self) -> Result<Bytes> {
        self.writer
            .write_event(Event::End(BytesEnd::new(self.root.as_str())))?;
        Ok(Bytes::from(self.writer.into_inner()))
    }
}

/// XmlElement is one parsed element with its text and children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    text: String,
    children: Vec<XmlElement>,
}

impl XmlElement {
    fn new(name: String) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }

    /// Parse a document and return its root element.
    pub fn parse(body: &[u8]) -> Result<XmlElement> {
        READ_BUFFER.with(|buf| {
            let mut buf = buf.borrow_mut();
            buf.clear();
            parse_with(body, &mut buf)
        })
    }

    /// Local name of the element, without namespace prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Text content of the element.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Direct children.
    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    /// Direct children with the given name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// First descendant with the given name, in document order.
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        for child in &self.children {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// Text of the first matching element, or `default` if there is none.
    pub fn text_or<'a>(&'a self, name: &str, default: Option<&'a str>) -> Option<&'a str> {
        self.find(name).map(|v| v.text()).or(default)
    }

    /// Text of the first matching element, failing if there is none.
    pub fn require(&self, name: &str) -> Result<&str> {
        self.find(name).map(|v| v.text()).ok_or_else(|| {
            Error::response_unparsable(format!(
                "required element <{name}> is missing in <{}>",
                self.name
            ))
        })
    }

    /// Parsed value of the first matching element, or `default` if there is none.
    ///
    /// A present but malformed value is an error, never silently replaced.
    pub fn value_or<T>(&self, name: &str, default: Option<T>) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        let Some(el) = self.find(name) else {
            return Ok(default);
        };
        el.text().parse::<T>().map(Some).map_err(|e| {
            Error::response_unparsable(format!(
                "element <{name}> has invalid value {:?}: {e}",
                el.text()
            ))
        })
    }

    /// Base64 decoded value of the first matching element.
    pub fn binary(&self, name: &str) -> Result<Option<Vec<u8>>> {
        self.find(name).map(|v| base64_decode(v.text())).transpose()
    }
}

fn parse_with(body: &[u8], buf: &mut Vec<u8>) -> Result<XmlElement> {
    let mut reader = Reader::from_reader(body);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event_into(buf)? {
            Event::Start(e) => stack.push(XmlElement::new(local_name(&e))),
            Event::Empty(e) => attach(&mut stack, &mut root, XmlElement::new(local_name(&e)))?,
            Event::Text(e) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&e.unescape()?);
                }
            }
            Event::CData(e) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::End(_) => {
                let el = stack
                    .pop()
                    .ok_or_else(|| Error::response_unparsable("unexpected closing tag"))?;
                attach(&mut stack, &mut root, el)?;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(Error::response_unparsable(format!(
            "element <{}> is not closed",
            open.name
        )));
    }
    root.ok_or_else(|| Error::response_unparsable("document has no root element"))
}

fn local_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, el: XmlElement) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(el);
        return Ok(());
    }
    if root.is_some() {
        return Err(Error::response_unparsable("document has multiple root elements"));
    }
    *root = Some(el);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn test_builder_omits_absent_values() -> anyhow::Result<()> {
        let mut builder = XmlBuilder::new("Queue")?;
        builder
            .element("DelaySeconds", Some(10), None)?
            .element("VisibilityTimeout", None::<u64>, None)?
            .element("LoggingEnabled", None::<bool>, Some("false"))?;
        let body = builder.finish()?;

        assert_eq!(
            std::str::from_utf8(&body)?,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <Queue xmlns=\"http://mns.aliyuncs.com/doc/v1/\">\
             <DelaySeconds>10</DelaySeconds>\
             <LoggingEnabled>false</LoggingEnabled>\
             </Queue>"
        );
        Ok(())
    }

    #[test]
    fn test_escaped_text_roundtrip() -> anyhow::Result<()> {
        let mut builder = XmlBuilder::new("Message")?;
        builder.element("MessageBody", Some("a < b & \"c\""), None)?;
        let body = builder.finish()?;

        let root = XmlElement::parse(&body)?;
        assert_eq!(root.name(), "Message");
        assert_eq!(root.require("MessageBody")?, "a < b & \"c\"");
        Ok(())
    }

    #[test_case(Some(&[0u8, 1, 2, 255][..]); "binary set")]
    #[test_case(Some(&[][..]); "binary empty")]
    #[test_case(None; "binary unset")]
    fn test_binary_roundtrip(value: Option<&[u8]>) -> anyhow::Result<()> {
        let mut builder = XmlBuilder::new("Message")?;
        builder
            .element("MessageId", Some("m1"), None)?
            .binary_element("MessageBody", value)?;
        let body = builder.finish()?;

        if value.is_none() {
            assert!(!std::str::from_utf8(&body)?.contains("MessageBody"));
        }
        let root = XmlElement::parse(&body)?;
        assert_eq!(root.require("MessageId")?, "m1");
        assert_eq!(root.binary("MessageBody")?, value.map(|v| v.to_vec()));
        Ok(())
    }

    #[test]
    fn test_read_first_match_or_default() -> anyhow::Result<()> {
        let root = XmlElement::parse(
            br#"<?xml version="1.0" encoding="UTF-8"?>
            <Messages xmlns="http://mns.aliyuncs.com/doc/v1/">
              <Message><MessageId>first</MessageId></Message>
              <Message><MessageId>second</MessageId></Message>
              <Empty/>
            </Messages>"#,
        )?;

        assert_eq!(root.text_or("MessageId", None), Some("first"));
        assert_eq!(root.text_or("Missing", Some("fallback")), Some("fallback"));
        assert_eq!(root.text_or("Missing", None), None);
        assert_eq!(root.children_named("Message").count(), 2);
        assert_eq!(root.text_or("Empty", None), Some(""));
        Ok(())
    }

    #[test]
    fn test_value_or() -> anyhow::Result<()> {
        let root = XmlElement::parse(b"<Queue><DelaySeconds>5</DelaySeconds><Bad>x</Bad></Queue>")?;
        assert_eq!(root.value_or::<u64>("DelaySeconds", None)?, Some(5));
        assert_eq!(root.value_or::<u64>("Missing", Some(7))?, Some(7));
        assert_eq!(root.value_or::<u64>("Missing", None)?, None);
        assert_eq!(
            root.value_or::<u64>("Bad", None).unwrap_err().kind(),
            ErrorKind::ResponseUnparsable
        );
        Ok(())
    }

    #[test]
    fn test_parse_rejects_malformed_documents() {
        for body in [
            &b""[..],
            b"<Queue>",
            b"<Queue></Message>",
            b"<A/><B/>",
            b"not xml at all",
        ] {
            let err = XmlElement::parse(body).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ResponseUnparsable, "body: {body:?}");
        }
    }

    #[test]
    fn test_parse_on_many_threads() {
        let handles = (0..4)
            .map(|i| {
                std::thread::spawn(move || {
                    let body = format!("<Queue><DelaySeconds>{i}</DelaySeconds></Queue>");
                    let root = XmlElement::parse(body.as_bytes()).unwrap();
                    root.value_or::<u32>("DelaySeconds", None).unwrap()
                })
            })
            .collect::<Vec<_>>();
        for (i, h) in handles.into_iter().enumerate() {
            assert_eq!(h.join().unwrap(), Some(i as u32));
        }
    }
}
