//! Streaming access to WordprocessingML parts
//! Wraps the quick-xml reader and adds element-attribute and text-accumulation helpers

use crate::error::AuditError;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::BytesRef;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::BufRead;
use std::str::FromStr;
use thiserror::Error;

/// Errors specific to XML decoding
#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Unknown entity '&{0};'")]
    UnknownEntity(String),

    #[error("Attribute '{name}' has invalid value '{value}'")]
    InvalidAttribute { name: String, value: String },
}

/// Event reader reusing one buffer for the whole part
pub(crate) struct XmlReader<R: BufRead> {
    reader: Reader<R>,
    buffer: Vec<u8>,
}

impl<R: BufRead> XmlReader<R> {
    /// Empty elements are expanded so `<w:tab/>` arrives as a start/end pair,
    /// and whitespace is kept because `xml:space="preserve"` runs depend on it.
    pub(crate) fn new(source: R) -> XmlReader<R> {
        let mut reader = Reader::from_reader(source);
        let config = reader.config_mut();
        config.check_comments = false;
        config.check_end_names = false;
        config.expand_empty_elements = true;
        config.trim_text(false);
        XmlReader {
            reader,
            buffer: Vec::with_capacity(1024),
        }
    }

    /// Next event, or `None` at end of input
    pub(crate) fn next_event(&'_ mut self) -> Result<Option<Event<'_>>, AuditError> {
        self.buffer.clear();
        match self.reader.read_event_into(&mut self.buffer)? {
            Event::Eof => Ok(None),
            event => Ok(Some(event)),
        }
    }
}

/// Attribute lookup on a start tag
pub(crate) trait ElementExt {
    /// Unescaped value of the attribute with qualified name `name`
    fn attribute(&self, name: &str) -> Result<Option<String>, AuditError>;

    /// Attribute value parsed into `T`; a present but unparsable value is an error
    fn parse_attribute<T: FromStr>(&self, name: &str) -> Result<Option<T>, AuditError>;
}

impl ElementExt for BytesStart<'_> {
    fn attribute(&self, name: &str) -> Result<Option<String>, AuditError> {
        match self.try_get_attribute(name)? {
            Some(attribute) => Ok(Some(attribute.unescape_value()?.into_owned())),
            None => Ok(None),
        }
    }

    fn parse_attribute<T: FromStr>(&self, name: &str) -> Result<Option<T>, AuditError> {
        let Some(value) = self.attribute(name)? else {
            return Ok(None);
        };
        match value.parse() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(XmlError::InvalidAttribute {
                name: name.to_owned(),
                value,
            }
            .into()),
        }
    }
}

/// Accumulates character data from text and reference events
pub(crate) trait TextSink {
    fn push_text(&mut self, text: &BytesText) -> Result<(), AuditError>;

    /// Resolves `&amp;`-style entities and `&#NN;` / `&#xNN;` character references
    fn push_reference(&mut self, reference: &BytesRef) -> Result<(), AuditError>;
}

impl TextSink for String {
    fn push_text(&mut self, text: &BytesText) -> Result<(), AuditError> {
        self.push_str(&text.xml_content()?);
        Ok(())
    }

    fn push_reference(&mut self, reference: &BytesRef) -> Result<(), AuditError> {
        let raw = reference.xml_content()?;
        let code = match raw.strip_prefix('#') {
            Some(hex) if hex.starts_with(['x', 'X']) => Some(u32::from_str_radix(&hex[1..], 16)?),
            Some(decimal) => Some(decimal.parse::<u32>()?),
            None => None,
        };
        match code {
            Some(code) => self.extend(char::from_u32(code)),
            None => self.push_str(resolve_xml_entity(&raw).ok_or_else(|| XmlError::UnknownEntity(raw.to_string()))?),
        }
        Ok(())
    }
}

/// Loops over the events of an [`XmlReader`], dispatching to the given match arms.
/// Unmatched events are ignored; the loop ends at end of input.
#[macro_export]
macro_rules! match_xml_events {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(event) = $reader.next_event()? {
            match event {
                $($arms)*
                _ => (),
            }
        }
    };
}
