use tracing::trace;

use crate::error::DecodeError;
use crate::info::{TypeDescriptor, WireKind};
use crate::track::ReferenceTracker;
use crate::value::Value;

use super::scan;

// -----------------------------------------------------------------------------
// Decoder

/// One decoding session: recursively parses wire text back into values,
/// driven by the declared kind at every position and consulting the
/// tracker for id bookkeeping.
pub(crate) struct Decoder {
    tracker: ReferenceTracker,
}

impl Decoder {
    pub(crate) fn new() -> Self {
        Self {
            tracker: ReferenceTracker::new(),
        }
    }

    /// Runs the session against a declared kind.
    pub(crate) fn decode(&mut self, text: &str, kind: &WireKind) -> Result<Value, DecodeError> {
        self.tracker.reset();
        trace!("decode session opened");
        self.decode_value(text, kind)
    }

    /// Runs the session against a composite target type.
    pub(crate) fn decode_as(
        &mut self,
        text: &str,
        descriptor: &'static TypeDescriptor,
    ) -> Result<Value, DecodeError> {
        self.tracker.reset();
        trace!(ty = descriptor.name(), "decode session opened");
        self.decode_object(text, descriptor)
    }

    fn decode_value(&mut self, text: &str, kind: &WireKind) -> Result<Value, DecodeError> {
        let text = text.trim();
        if text == "null" {
            return Ok(Value::Null);
        }
        match kind {
            WireKind::Nullable(inner) => self.decode_value(text, inner),
            WireKind::Bool => match text {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                other => Err(mismatch("boolean", other)),
            },
            WireKind::Int => text
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| mismatch("integer", text)),
            WireKind::Float => text
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| mismatch("float", text)),
            WireKind::Char => {
                if !text.starts_with('"') {
                    return Err(mismatch("char", text));
                }
                let decoded = scan::read_quoted(text)?;
                let mut chars = decoded.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Value::Char(c)),
                    _ => Err(mismatch("char", text)),
                }
            }
            WireKind::Str => {
                if !text.starts_with('"') {
                    return Err(mismatch("string", text));
                }
                scan::read_quoted(text).map(Value::Str)
            }
            WireKind::List(element) | WireKind::Set(element) => {
                self.decode_elements(text, element).map(Value::List)
            }
            WireKind::Array(element, len) => {
                let items = self.decode_elements(text, element)?;
                if items.len() != *len {
                    return Err(DecodeError::TypeMismatch {
                        expected: format!("array of length {len}"),
                        found: format!("array of length {}", items.len()),
                    });
                }
                Ok(Value::List(items))
            }
            WireKind::Map(value_kind) => {
                let body = scan::strip_wrapped(text, '{', '}')?;
                let mut entries = Vec::new();
                for segment in scan::split_segments(body)? {
                    let (raw_key, raw_value) = scan::split_key_value(segment)?;
                    let key = scan::read_quoted(raw_key)?;
                    let value = self.decode_value(raw_value, value_kind)?;
                    entries.push((key, value));
                }
                Ok(Value::Map(entries))
            }
            WireKind::Object(descriptor) => self.decode_object(text, descriptor()),
        }
    }

    fn decode_elements(
        &mut self,
        text: &str,
        element: &WireKind,
    ) -> Result<Vec<Value>, DecodeError> {
        let body = scan::strip_wrapped(text, '[', ']')?;
        let mut items = Vec::new();
        for segment in scan::split_segments(body)? {
            items.push(self.decode_value(segment, element)?);
        }
        Ok(items)
    }

    fn decode_object(
        &mut self,
        text: &str,
        descriptor: &'static TypeDescriptor,
    ) -> Result<Value, DecodeError> {
        let text = text.trim();
        if text == "null" {
            return Ok(Value::Null);
        }

        let body = scan::strip_wrapped(text, '{', '}')?;
        let mut entries: Vec<(String, &str)> = Vec::new();
        for segment in scan::split_segments(body)? {
            let (raw_key, raw_value) = scan::split_key_value(segment)?;
            entries.push((scan::read_quoted(raw_key)?, raw_value));
        }

        // The reference shape is exactly the single-entry `$ref` body.
        if let [(key, raw_id)] = entries.as_slice() {
            if key.as_str() == "$ref" {
                let id = scan::read_quoted(raw_id)?;
                let handle = match self.tracker.resolve(&id) {
                    Some(handle) => handle,
                    None => return Err(DecodeError::UnresolvedReference { id }),
                };
                trace!(id = id.as_str(), "resolved repeat reference");
                return Ok(Value::Object(handle));
            }
        }

        let Some(construct) = descriptor.construct() else {
            return Err(DecodeError::InstantiationFailure {
                type_name: descriptor.name(),
            });
        };
        let handle = construct();

        // Register the instance before populating its fields, so a
        // backward reference to this id from a nested field resolves to
        // the instance being built.
        if let Some((_, raw_id)) = entries.iter().find(|(key, _)| key.as_str() == "$id") {
            let id = scan::read_quoted(raw_id)?;
            trace!(ty = descriptor.name(), id = id.as_str(), "decoding object");
            self.tracker.register(id, handle.clone());
        }

        for field in descriptor.fields() {
            if field.excluded() {
                continue;
            }
            match entries
                .iter()
                .find(|(key, _)| key.as_str() == field.wire_name())
            {
                Some((_, raw_value)) => {
                    let value = self
                        .decode_value(raw_value, field.kind())
                        .map_err(|err| err.in_field(descriptor.name(), field.wire_name()))?;
                    handle.set(field.name(), value).map_err(|err| {
                        DecodeError::from(err).in_field(descriptor.name(), field.wire_name())
                    })?;
                }
                None if field.required() => {
                    return Err(DecodeError::MissingRequiredField {
                        type_name: descriptor.name(),
                        field: field.wire_name(),
                    });
                }
                None => {}
            }
        }

        Ok(Value::Object(handle))
    }
}

fn mismatch(expected: &str, found: &str) -> DecodeError {
    DecodeError::TypeMismatch {
        expected: expected.into(),
        found: found.into(),
    }
}
