//! Property-list values found in object record bodies.

use indexmap::IndexMap;

use crate::ObjectId;

/// Dictionary with keys in document order.
pub type Dict = IndexMap<String, Value>;

/// A value in an old-style ASCII property list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A bare or quoted string, optionally followed by a `/* comment */`.
    String(Scalar),
    /// `( a, b, )`
    Array(Vec<Value>),
    /// `{ key = value; }`
    Dict(Dict),
}

/// A string value and the annotation Xcode writes after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scalar {
    /// Unescaped text.
    pub(crate) text: String,
    /// Trailing comment, usually the display name of a referenced object.
    pub(crate) comment: Option<String>,
    quoted: bool,
    /// Source token of a parsed quoted string, written back as is.
    raw: Option<String>,
}

impl Scalar {
    /// A scalar read from a document. `raw` is the quoted source token, or
    /// `None` for a bare string.
    pub(crate) fn parsed(text: String, raw: Option<String>) -> Self {
        Self {
            text,
            comment: None,
            quoted: raw.is_some(),
            raw,
        }
    }
}

impl Value {
    /// A string value, quoted only if Xcode would quote it.
    pub fn string(text: impl Into<String>) -> Self {
        let text = text.into();
        let quoted = needs_quotes(&text);
        Value::String(Scalar {
            text,
            comment: None,
            quoted,
            raw: None,
        })
    }

    /// A reference to another object, annotated with its display name.
    pub fn reference(id: &ObjectId, comment: Option<&str>) -> Self {
        Value::String(Scalar {
            text: id.as_str().to_string(),
            comment: comment.map(str::to_string),
            quoted: false,
            raw: None,
        })
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(&s.text),
            _ => None,
        }
    }

    pub fn comment(&self) -> Option<&str> {
        match self {
            Value::String(s) => s.comment.as_deref(),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Whether `id` appears as a string anywhere in this value. Dictionary
    /// keys are not considered.
    pub(crate) fn mentions(&self, id: &str) -> bool {
        match self {
            Value::String(s) => s.text == id,
            Value::Array(items) => items.iter().any(|item| item.mentions(id)),
            Value::Dict(dict) => dict.values().any(|value| value.mentions(id)),
        }
    }
}

/// Whether Xcode writes `s` in double quotes.
pub(crate) fn needs_quotes(s: &str) -> bool {
    s.is_empty()
        || s.contains("//")
        || s.contains("___")
        || !s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$' | b'/' | b':' | b'.'))
}

fn write_text(out: &mut String, text: &str, quoted: bool) {
    if !quoted {
        out.push_str(text);
        return;
    }
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
}

fn write_key(out: &mut String, key: &str) {
    write_text(out, key, needs_quotes(key));
}

fn write_scalar(out: &mut String, scalar: &Scalar) {
    match &scalar.raw {
        Some(raw) => out.push_str(raw),
        None => write_text(out, &scalar.text, scalar.quoted),
    }
    if let Some(comment) = &scalar.comment {
        out.push_str(" /* ");
        out.push_str(comment);
        out.push_str(" */");
    }
}

fn tabs(out: &mut String, depth: usize) {
    out.extend(std::iter::repeat_n('\t', depth));
}

/// Write `value` on a single line: `{isa = PBXBuildFile; fileRef = X /* a */; }`.
pub(crate) fn write_inline(out: &mut String, value: &Value) {
    match value {
        Value::String(scalar) => write_scalar(out, scalar),
        Value::Array(items) => {
            out.push('(');
            for item in items {
                write_inline(out, item);
                out.push_str(", ");
            }
            out.push(')');
        }
        Value::Dict(dict) => {
            out.push('{');
            for (key, value) in dict {
                write_key(out, key);
                out.push_str(" = ");
                write_inline(out, value);
                out.push_str("; ");
            }
            out.push('}');
        }
    }
}

/// Write `value` in Xcode's multi-line layout. `depth` is the indentation of
/// the line the value starts on.
pub(crate) fn write_block(out: &mut String, value: &Value, depth: usize) {
    match value {
        Value::String(scalar) => write_scalar(out, scalar),
        Value::Array(items) => {
            out.push_str("(\n");
            for item in items {
                tabs(out, depth + 1);
                write_block(out, item, depth + 1);
                out.push_str(",\n");
            }
            tabs(out, depth);
            out.push(')');
        }
        Value::Dict(dict) => {
            out.push_str("{\n");
            for (key, value) in dict {
                tabs(out, depth + 1);
                write_key(out, key);
                out.push_str(" = ");
                write_block(out, value, depth + 1);
                out.push_str(";\n");
            }
            tabs(out, depth);
            out.push('}');
        }
    }
}
