//! Record to XML serialization
//!
//! Hand-rolled pretty printer matching the output contract of the feed
//! corpus: one RECORD element per record, headless (no XML declaration),
//! two-space indent, all records wrapped in a single DATA root.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::JsonObject;

/// Output shape options for the XML serializer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XmlOptions {
    /// Element name wrapping each record
    pub record_element: String,
    /// Root element wrapping the whole document
    pub root_element: String,
    /// Omit the XML declaration
    pub headless: bool,
    /// Emit indented output
    pub pretty: bool,
    /// Indent unit for pretty output
    pub indent: String,
    /// Line terminator for pretty output
    pub newline: String,
}

impl Default for XmlOptions {
    fn default() -> Self {
        Self {
            record_element: "RECORD".into(),
            root_element: "DATA".into(),
            headless: true,
            pretty: true,
            indent: "  ".into(),
            newline: "\n".into(),
        }
    }
}

/// Serializes records to XML fragments
#[derive(Debug, Clone, Default)]
pub struct XmlBuilder {
    options: XmlOptions,
}

impl XmlBuilder {
    /// Create a builder with the given options
    pub fn new(options: XmlOptions) -> Self {
        Self { options }
    }

    /// The builder's options
    pub fn options(&self) -> &XmlOptions {
        &self.options
    }

    /// Serialize one record to a RECORD element fragment.
    ///
    /// The fragment is indented one level, ready to sit inside the root
    /// element. Field order is preserved.
    pub fn build_record(&self, record: &JsonObject) -> String {
        let mut out = String::new();
        let value = Value::Object(record.clone());
        if self.options.pretty {
            self.write_pretty_element(&mut out, &self.options.record_element, &value, 1);
        } else {
            self.write_compact_element(&mut out, &self.options.record_element, &value);
        }
        out
    }

    /// Opening of the document: optional declaration plus the root open tag
    pub fn document_open(&self) -> String {
        let mut out = String::new();
        if !self.options.headless {
            out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>");
            if self.options.pretty {
                out.push_str(&self.options.newline);
            }
        }
        out.push('<');
        out.push_str(&sanitize_element_name(&self.options.root_element));
        out.push('>');
        if self.options.pretty {
            out.push_str(&self.options.newline);
        }
        out
    }

    /// Closing of the document: the root close tag
    pub fn document_close(&self) -> String {
        format!("</{}>", sanitize_element_name(&self.options.root_element))
    }

    fn write_pretty_element(&self, out: &mut String, name: &str, value: &Value, depth: usize) {
        let name = sanitize_element_name(name);
        let pad = self.options.indent.repeat(depth);

        match value {
            // Arrays repeat the element, one per item
            Value::Array(items) => {
                for item in items {
                    self.write_pretty_element(out, &name, item, depth);
                }
            }
            Value::Object(fields) => {
                if fields.is_empty() {
                    out.push_str(&format!("{pad}<{name}/>"));
                    out.push_str(&self.options.newline);
                    return;
                }
                out.push_str(&format!("{pad}<{name}>"));
                out.push_str(&self.options.newline);
                for (key, child) in fields {
                    self.write_pretty_element(out, key, child, depth + 1);
                }
                out.push_str(&format!("{pad}</{name}>"));
                out.push_str(&self.options.newline);
            }
            Value::Null => {
                out.push_str(&format!("{pad}<{name}/>"));
                out.push_str(&self.options.newline);
            }
            scalar => {
                let text = escape_text(&scalar_to_string(scalar));
                out.push_str(&format!("{pad}<{name}>{text}</{name}>"));
                out.push_str(&self.options.newline);
            }
        }
    }

    fn write_compact_element(&self, out: &mut String, name: &str, value: &Value) {
        let name = sanitize_element_name(name);

        match value {
            Value::Array(items) => {
                for item in items {
                    self.write_compact_element(out, &name, item);
                }
            }
            Value::Object(fields) => {
                if fields.is_empty() {
                    out.push_str(&format!("<{name}/>"));
                    return;
                }
                out.push_str(&format!("<{name}>"));
                for (key, child) in fields {
                    self.write_compact_element(out, key, child);
                }
                out.push_str(&format!("</{name}>"));
            }
            Value::Null => {
                out.push_str(&format!("<{name}/>"));
            }
            scalar => {
                let text = escape_text(&scalar_to_string(scalar));
                out.push_str(&format!("<{name}>{text}</{name}>"));
            }
        }
    }
}

/// Escape text content for XML
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Make a field name a legal XML element name.
///
/// Illegal characters become underscores; a leading digit gets an underscore
/// prefix. Display labels from field dictionaries routinely contain spaces.
pub fn sanitize_element_name(name: &str) -> String {
    if name.is_empty() {
        return "_".into();
    }

    let mut out = String::with_capacity(name.len());
    for (i, c) in name.chars().enumerate() {
        let legal = c.is_alphanumeric() || c == '_' || c == '-' || c == '.';
        if i == 0 && (c.is_ascii_digit() || !legal) {
            out.push('_');
            if c.is_ascii_digit() {
                out.push(c);
            }
        } else if legal {
            out.push(c);
        } else {
            out.push('_');
        }
    }
    out
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}
