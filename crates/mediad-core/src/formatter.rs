//! Structured-output builder that renders to JSON text (§4.2).
//!
//! The Formatter is instantiated per response; it is never shared across
//! requests. Member order is preserved as recorded, matching RFC 8259.

use serde_json::{Map, Value};

/// A scalar value settable via [`JsonFormatter::set_value`].
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    Str(String),
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Null => Self::Null,
            Scalar::Bool(b) => Self::Bool(b),
            Scalar::I64(n) => Self::Number(n.into()),
            Scalar::U64(n) => Self::Number(n.into()),
            Scalar::F64(n) => serde_json::Number::from_f64(n).map_or(Self::Null, Self::Number),
            Scalar::Str(s) => Self::String(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

enum Frame {
    Object(Map<String, Value>, Option<String>),
    Array(Vec<Value>),
}

/// Error raised by malformed builder call sequences (unbalanced
/// begin/end pairs, `set_value` without a preceding `set_member_name` inside
/// an object, …). These indicate a programming error in a Node's `read()`
/// implementation, never a client-triggerable condition.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum FormatterError {
    #[error("set_value called inside an object without a preceding set_member_name")]
    MissingMemberName,
    #[error("end_object/end_array called with no matching begin")]
    UnbalancedNesting,
    #[error("generate called with the document still open")]
    DocumentNotClosed,
}

/// Builder-style JSON document assembler mirroring `begin_object` /
/// `end_object` / `begin_array` / `end_array` / `set_member_name` /
/// `set_value` / `generate`.
#[derive(Default)]
pub struct JsonFormatter {
    stack: Vec<Frame>,
    root: Option<Value>,
}

impl JsonFormatter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_object(&mut self) {
        self.stack.push(Frame::Object(Map::new(), None));
    }

    pub fn end_object(&mut self) -> Result<(), FormatterError> {
        match self.stack.pop() {
            Some(Frame::Object(map, _)) => {
                self.push_value(Value::Object(map));
                Ok(())
            },
            Some(other) => {
                self.stack.push(other);
                Err(FormatterError::UnbalancedNesting)
            },
            None => Err(FormatterError::UnbalancedNesting),
        }
    }

    pub fn begin_array(&mut self) {
        self.stack.push(Frame::Array(Vec::new()));
    }

    pub fn end_array(&mut self) -> Result<(), FormatterError> {
        match self.stack.pop() {
            Some(Frame::Array(values)) => {
                self.push_value(Value::Array(values));
                Ok(())
            },
            Some(other) => {
                self.stack.push(other);
                Err(FormatterError::UnbalancedNesting)
            },
            None => Err(FormatterError::UnbalancedNesting),
        }
    }

    pub fn set_member_name(&mut self, name: impl Into<String>) -> Result<(), FormatterError> {
        match self.stack.last_mut() {
            Some(Frame::Object(_, pending)) => {
                *pending = Some(name.into());
                Ok(())
            },
            _ => Err(FormatterError::UnbalancedNesting),
        }
    }

    pub fn set_value(&mut self, value: impl Into<Scalar>) -> Result<(), FormatterError> {
        let value: Value = value.into().into();
        self.push_value(value);
        Ok(())
    }

    fn push_value(&mut self, value: Value) {
        match self.stack.last_mut() {
            Some(Frame::Array(values)) => values.push(value),
            Some(Frame::Object(map, pending)) => {
                if let Some(name) = pending.take() {
                    map.insert(name, value);
                }
            },
            None => self.root = Some(value),
        }
    }

    /// Emits the accumulated document as a UTF-8 string owned by the caller.
    pub fn generate(self) -> Result<String, FormatterError> {
        if !self.stack.is_empty() {
            return Err(FormatterError::DocumentNotClosed);
        }
        let root = self.root.unwrap_or(Value::Null);
        serde_json::to_string(&root).map_err(|_| FormatterError::DocumentNotClosed)
    }

    /// Consumes the builder and returns the accumulated document as a
    /// `serde_json::Value`, for callers composing it further (e.g. the wire
    /// envelope) instead of immediately serializing to text.
    pub fn into_value(self) -> Result<Value, FormatterError> {
        if !self.stack.is_empty() {
            return Err(FormatterError::DocumentNotClosed);
        }
        Ok(self.root.unwrap_or(Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_a_container_shape() {
        let mut f = JsonFormatter::new();
        f.begin_object();
        f.set_member_name("name").unwrap();
        f.set_value("pipelines").unwrap();
        f.set_member_name("children").unwrap();
        f.begin_array();
        f.begin_object();
        f.set_member_name("name").unwrap();
        f.set_value("p0").unwrap();
        f.end_object().unwrap();
        f.end_array().unwrap();
        f.end_object().unwrap();

        let rendered = f.generate().unwrap();
        let value: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["name"], "pipelines");
        assert_eq!(value["children"][0]["name"], "p0");
    }

    /// Guards the `preserve_order` feature on `serde_json` (workspace
    /// `Cargo.toml`): without it, `serde_json::Map` is backed by a
    /// `BTreeMap` and always serializes alphabetically, silently violating
    /// §4.2's "member order preserved as recorded". Asserting on the raw
    /// string (not a re-parsed `Value`, which would hide the regression
    /// behind key lookups) is the point of this test.
    #[test]
    fn member_order_is_preserved_as_recorded_not_sorted_alphabetically() {
        let mut f = JsonFormatter::new();
        f.begin_object();
        f.set_member_name("zebra").unwrap();
        f.set_value("z").unwrap();
        f.set_member_name("apple").unwrap();
        f.set_value("a").unwrap();
        f.set_member_name("mango").unwrap();
        f.set_value("m").unwrap();
        f.end_object().unwrap();

        let rendered = f.generate().unwrap();
        assert_eq!(rendered, r#"{"zebra":"z","apple":"a","mango":"m"}"#);
    }

    #[test]
    fn unbalanced_end_object_is_an_error() {
        let mut f = JsonFormatter::new();
        assert_eq!(f.end_object(), Err(FormatterError::UnbalancedNesting));
    }

    #[test]
    fn generate_before_closing_is_an_error() {
        let mut f = JsonFormatter::new();
        f.begin_object();
        assert_eq!(f.generate(), Err(FormatterError::DocumentNotClosed));
    }
}
