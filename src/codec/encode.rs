use tracing::trace;

use crate::error::EncodeError;
use crate::registry::TypeRegistry;
use crate::track::ReferenceTracker;
use crate::value::{Handle, Value};

use super::scan;

// -----------------------------------------------------------------------------
// Encoder

/// One encoding session: recursively renders a value graph to wire text,
/// consulting the registry for type metadata and the tracker for
/// reference bookkeeping.
pub(crate) struct Encoder<'r> {
    registry: &'r TypeRegistry,
    tracker: ReferenceTracker,
}

impl<'r> Encoder<'r> {
    pub(crate) fn new(registry: &'r TypeRegistry) -> Self {
        Self {
            registry,
            tracker: ReferenceTracker::new(),
        }
    }

    /// Runs the session. The tracker's lifetime is exactly this call.
    pub(crate) fn encode(&mut self, value: &Value) -> Result<String, EncodeError> {
        self.tracker.reset();
        trace!("encode session opened");
        let mut out = String::new();
        self.encode_value(value, &mut out)?;
        Ok(out)
    }

    fn encode_value(&mut self, value: &Value, out: &mut String) -> Result<(), EncodeError> {
        match value {
            Value::Null => out.push_str("null"),
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Int(n) => out.push_str(&n.to_string()),
            Value::Float(f) => out.push_str(&f.to_string()),
            Value::Char(c) => {
                let mut buf = [0u8; 4];
                scan::write_quoted(out, c.encode_utf8(&mut buf));
            }
            Value::Str(s) => scan::write_quoted(out, s),
            Value::List(items) => {
                out.push('[');
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        out.push(',');
                    }
                    self.encode_value(item, out)?;
                }
                out.push(']');
            }
            Value::Map(entries) => {
                // Plain mapping, no id/reference semantics on the
                // container itself. Keys are always text.
                out.push('{');
                for (index, (key, item)) in entries.iter().enumerate() {
                    if index > 0 {
                        out.push(',');
                    }
                    scan::write_quoted(out, key);
                    out.push(':');
                    self.encode_value(item, out)?;
                }
                out.push('}');
            }
            Value::Object(handle) => self.encode_object(handle, out)?,
        }
        Ok(())
    }

    fn encode_object(&mut self, handle: &Handle, out: &mut String) -> Result<(), EncodeError> {
        let identity = handle.identity();

        // Re-entering an instance whose fields are still being written is
        // a cycle, not a repeat reference.
        if self.tracker.begin_visit(identity).is_err() {
            return Err(EncodeError::CircularReference {
                type_name: handle.type_name(),
            });
        }

        if self.tracker.has_id(identity) {
            // Completed earlier in this session: collapse to a reference.
            let id = self.tracker.id_for(identity);
            self.tracker.end_visit(identity);
            trace!(id = id.as_str(), "emitting repeat reference");
            out.push_str("{\"$ref\":\"");
            out.push_str(&id);
            out.push_str("\"}");
            return Ok(());
        }

        let id = self.tracker.id_for(identity);
        let result = self.encode_object_body(handle, &id, out);
        // Guaranteed release on all exit paths, so a failure deeper in
        // the graph cannot poison a later encounter of this instance.
        self.tracker.end_visit(identity);
        result
    }

    fn encode_object_body(
        &mut self,
        handle: &Handle,
        id: &str,
        out: &mut String,
    ) -> Result<(), EncodeError> {
        let Some(descriptor) = self.registry.get(handle.ty_id()) else {
            return Err(EncodeError::NotSerializable {
                type_name: handle.type_name(),
            });
        };
        trace!(ty = descriptor.name(), id = id, "encoding object");

        out.push_str("{\"$id\":\"");
        out.push_str(id);
        out.push('"');

        for field in descriptor.fields() {
            if field.excluded() {
                continue;
            }
            // Descriptor and field accessors come from the same derive.
            let value = handle.get(field.name()).unwrap();
            if value.is_null() && !descriptor.include_nulls() {
                continue;
            }
            out.push(',');
            scan::write_quoted(out, field.wire_name());
            out.push(':');
            self.encode_value(&value, out)?;
        }

        out.push('}');
        Ok(())
    }
}
