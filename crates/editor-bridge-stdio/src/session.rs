//! One stdio session: call lines in, result and notification lines out.
//!
//! Every input line is a call document (see `editor_bridge_ffi::Call`) with an optional `id`.
//! Each call produces exactly one reply line, `{"id":…,"result":…}` or `{"id":…,"error":"…"}`;
//! notifications are written as they happen, as the bare event object.

use editor_bridge::{BridgeConfig, HostEvent, HostNotifier};
use editor_bridge_ffi::{Bridge, Call};
use serde_json::{Value, json};
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

/// Writes one JSON value per line.
pub struct JsonLines<W: Write> {
    out: RefCell<W>,
}

impl<W: Write> JsonLines<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: RefCell::new(out),
        }
    }

    pub fn emit(&self, value: &Value) {
        let mut out = self.out.borrow_mut();
        if let Err(err) = writeln!(out, "{value}").and_then(|()| out.flush()) {
            tracing::warn!(error = %err, "failed to write output line");
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: Write> HostNotifier for JsonLines<W> {
    fn notify(&self, event: HostEvent) {
        self.emit(&event.to_json());
    }
}

pub struct Session<W: Write + 'static> {
    bridge: Bridge,
    out: Rc<JsonLines<W>>,
}

impl<W: Write + 'static> Session<W> {
    pub fn new(config: BridgeConfig, out: W) -> Self {
        let out = Rc::new(JsonLines::new(out));
        Self {
            bridge: Bridge::new(config, out.clone()),
            out,
        }
    }

    /// Run one input line. Blank lines are skipped.
    pub fn handle_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        let mut document: Value = match serde_json::from_str(line) {
            Ok(document) => document,
            Err(err) => {
                self.out
                    .emit(&json!({"id": null, "error": format!("malformed call: {err}")}));
                return;
            }
        };
        let id = document
            .as_object_mut()
            .and_then(|object| object.remove("id"))
            .unwrap_or(Value::Null);

        let result = serde_json::from_value::<Call>(document)
            .map_err(editor_bridge_ffi::FfiError::from)
            .and_then(|call| self.bridge.dispatch(call));
        match result {
            Ok(result) => self.out.emit(&json!({"id": id, "result": result})),
            Err(err) => {
                tracing::debug!(error = %err, "call failed");
                self.out.emit(&json!({"id": id, "error": err.to_string()}));
            }
        }
    }

    /// Drive the language service connection.
    pub fn poll(&mut self) {
        self.bridge.poll();
    }

    #[cfg(test)]
    fn finish(self) -> W {
        let Session { bridge, out } = self;
        drop(bridge);
        match Rc::try_unwrap(out) {
            Ok(lines) => lines.into_inner(),
            Err(_) => panic!("output still shared"),
        }
    }
}
