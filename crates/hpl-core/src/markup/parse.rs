//! XML text to [`Value`] tree.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::value::{Map, Value};
use super::{CodecConfig, ATTRIBUTE_PREFIX, TEXT_KEY};
use crate::error::{HplError, Result};

/// Parse a complete document. Top-level elements become entries of the
/// returned map, so `<root>…</root>` parses to `{root: …}`.
pub fn parse(text: &str, config: &CodecConfig) -> Result<Value> {
    parse_at(text, "", config)
}

/// Parse a fragment as if its top-level elements sat below `base_path`.
///
/// Used for the decrypted body, which must honor the `root.body.*`
/// sequence rules even though it is stored as a standalone fragment.
pub fn parse_at(text: &str, base_path: &str, config: &CodecConfig) -> Result<Value> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<Frame> = Vec::new();
    let mut top = Map::new();

    loop {
        let event = reader.read_event().map_err(|e| {
            HplError::Parse(format!(
                "malformed markup at byte {}: {}",
                reader.buffer_position(),
                e
            ))
        })?;

        match event {
            Event::Start(start) => {
                let parent = stack.last().map_or(base_path, |f| f.path.as_str());
                let frame = Frame::open(&start, parent)?;
                stack.push(frame);
            }
            Event::Empty(start) => {
                let parent = stack.last().map_or(base_path, |f| f.path.as_str());
                let frame = Frame::open(&start, parent)?;
                close(frame, &mut stack, &mut top, config);
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| HplError::Parse("unexpected closing tag".to_string()))?;
                close(frame, &mut stack, &mut top, config);
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| HplError::Parse(format!("invalid text content: {}", e)))?;
                push_text(&mut stack, &text)?;
            }
            Event::CData(data) => {
                let bytes = data.into_inner();
                let text = std::str::from_utf8(&bytes)
                    .map_err(|e| HplError::Parse(format!("invalid CDATA content: {}", e)))?;
                push_text(&mut stack, text)?;
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions and doctypes carry no data.
            _ => {}
        }
    }

    if let Some(frame) = stack.last() {
        return Err(HplError::Parse(format!(
            "unclosed element <{}>",
            frame.name
        )));
    }

    Ok(Value::Map(top))
}

/// An element whose closing tag has not been seen yet.
struct Frame {
    name: String,
    path: String,
    attributes: Vec<(String, String)>,
    children: Map,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>, parent_path: &str) -> Result<Self> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(|e| HplError::Parse(format!("invalid element name: {}", e)))?
            .to_string();
        let path = if parent_path.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", parent_path, name)
        };

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| {
                HplError::Parse(format!("invalid attribute on <{}>: {}", name, e))
            })?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| HplError::Parse(format!("invalid attribute name: {}", e)))?
                .to_string();
            let value = attr
                .unescape_value()
                .map_err(|e| HplError::Parse(format!("invalid attribute value: {}", e)))?
                .into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            name,
            path,
            attributes,
            children: Map::new(),
            text: String::new(),
        })
    }

    fn into_value(self, config: &CodecConfig) -> Value {
        let has_children = !self.children.is_empty();
        let sequence_child = config.sequence_child(&self.path);

        if self.attributes.is_empty() && !has_children && sequence_child.is_none() {
            return Value::Text(self.text);
        }

        // Whitespace between child elements is layout, not content.
        let keep_text = if has_children || sequence_child.is_some() {
            !self.text.trim().is_empty()
        } else {
            !self.text.is_empty()
        };

        let mut map = Map::new();
        for (key, value) in self.attributes {
            map.insert(format!("{}{}", ATTRIBUTE_PREFIX, key), Value::Text(value));
        }
        if keep_text {
            map.insert(TEXT_KEY, Value::Text(self.text));
        }
        for (key, value) in self.children {
            map.insert(key, value);
        }
        if let Some(child) = sequence_child {
            if map.get(child).is_none() {
                map.insert(child, Value::List(Vec::new()));
            }
        }
        Value::Map(map)
    }
}

fn close(frame: Frame, stack: &mut [Frame], top: &mut Map, config: &CodecConfig) {
    let force_list = config.is_sequence(&frame.path);
    let name = frame.name.clone();
    let value = frame.into_value(config);
    let siblings = match stack.last_mut() {
        Some(parent) => &mut parent.children,
        None => top,
    };
    siblings.append(name, value, force_list);
}

fn push_text(stack: &mut [Frame], text: &str) -> Result<()> {
    match stack.last_mut() {
        Some(frame) => {
            frame.text.push_str(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(HplError::Parse(
            "text content outside of any element".to_string(),
        )),
    }
}
