//! [`Value`] tree to XML text.

use std::io::Write;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::value::{Map, Value};
use super::{is_attribute_key, TEXT_KEY};
use crate::error::{HplError, Result};

/// Builder options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Indent nested elements by two spaces, one element per line.
    pub pretty: bool,
}

impl BuildOptions {
    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

/// Serialize a tree. The top-level value must be a map of element names.
pub fn build(value: &Value, options: BuildOptions) -> Result<String> {
    let map = value
        .as_map()
        .ok_or_else(|| HplError::Parse("top-level value must be a map".to_string()))?;

    let bytes = if options.pretty {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        write_top_level(&mut writer, map)?;
        writer.into_inner()
    } else {
        let mut writer = Writer::new(Vec::new());
        write_top_level(&mut writer, map)?;
        writer.into_inner()
    };

    String::from_utf8(bytes).map_err(|e| HplError::Parse(format!("built markup is not UTF-8: {}", e)))
}

fn write_top_level<W: Write>(writer: &mut Writer<W>, map: &Map) -> Result<()> {
    for (key, value) in map.iter() {
        if is_attribute_key(key) || key == TEXT_KEY {
            return Err(HplError::Parse(format!(
                "top-level entry '{}' must be an element",
                key
            )));
        }
        write_element(writer, key, value)?;
    }
    Ok(())
}

fn write_element<W: Write>(writer: &mut Writer<W>, name: &str, value: &Value) -> Result<()> {
    match value {
        Value::Text(text) if text.is_empty() => emit(writer, Event::Empty(BytesStart::new(name))),
        Value::Text(text) => {
            emit(writer, Event::Start(BytesStart::new(name)))?;
            emit(writer, Event::Text(BytesText::new(text)))?;
            emit(writer, Event::End(BytesEnd::new(name)))
        }
        Value::List(items) => {
            for item in items {
                if matches!(item, Value::List(_)) {
                    return Err(HplError::Parse(format!(
                        "sequence '{}' cannot directly contain another sequence",
                        name
                    )));
                }
                write_element(writer, name, item)?;
            }
            Ok(())
        }
        Value::Map(map) => write_map(writer, name, map),
    }
}

fn write_map<W: Write>(writer: &mut Writer<W>, name: &str, map: &Map) -> Result<()> {
    let mut start = BytesStart::new(name);
    for (key, value) in map.iter().filter(|(key, _)| is_attribute_key(key)) {
        let text = value.as_text().ok_or_else(|| {
            HplError::Parse(format!("attribute '{}' on <{}> must be text", key, name))
        })?;
        start.push_attribute((&key[1..], text));
    }

    let content: Vec<(&str, &Value)> = map
        .iter()
        .filter(|(key, _)| !is_attribute_key(key))
        .collect();

    if content.iter().all(|(key, value)| renders_nothing(key, value)) {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    for (key, value) in content {
        if key == TEXT_KEY {
            let text = value.as_text().ok_or_else(|| {
                HplError::Parse(format!("text of <{}> must be a text value", name))
            })?;
            if !text.is_empty() {
                emit(writer, Event::Text(BytesText::new(text)))?;
            }
        } else {
            write_element(writer, key, value)?;
        }
    }
    emit(writer, Event::End(BytesEnd::new(name)))
}

fn renders_nothing(key: &str, value: &Value) -> bool {
    match value {
        Value::List(items) => items.is_empty(),
        Value::Text(text) => key == TEXT_KEY && text.is_empty(),
        Value::Map(_) => false,
    }
}

fn emit<W: Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| HplError::Parse(format!("failed to write markup: {}", e)))
}
