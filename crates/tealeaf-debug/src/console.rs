//! Debugging through a local console.

use crate::action::{DebugAction, DebugData};
use crate::debugger::Debugger;
use serde::Serialize;
use serde_json::Value;

/// Field names checked, in order, for a message's discriminant.
const DISCRIMINANTS: [&str; 6] = ["tag", "_tag", "type", "_type", "kind", "_kind"];

/// A grouped, collapsible log sink in the style of a browser console.
pub trait Console: Send {
    fn group(&mut self, label: &str);
    fn group_collapsed(&mut self, label: &str);
    fn group_end(&mut self);
    fn log(&mut self, line: &str);
    fn dir(&mut self, value: &Value);
}

impl<C: Console + ?Sized> Console for Box<C> {
    fn group(&mut self, label: &str) {
        (**self).group(label)
    }
    fn group_collapsed(&mut self, label: &str) {
        (**self).group_collapsed(label)
    }
    fn group_end(&mut self) {
        (**self).group_end()
    }
    fn log(&mut self, line: &str) {
        (**self).log(line)
    }
    fn dir(&mut self, value: &Value) {
        (**self).dir(value)
    }
}

/// Writes console output as `tracing` events at `info`, indenting nested groups.
#[derive(Debug, Default)]
pub struct TracingConsole {
    depth: usize,
}

impl TracingConsole {
    fn emit(&self, line: &str) {
        tracing::info!(target: "tealeaf::debug", "{:indent$}{line}", "", indent = self.depth * 2);
    }
}

impl Console for TracingConsole {
    fn group(&mut self, label: &str) {
        self.emit(label);
        self.depth += 1;
    }

    fn group_collapsed(&mut self, label: &str) {
        self.group(label);
    }

    fn group_end(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn log(&mut self, line: &str) {
        self.emit(line);
    }

    fn dir(&mut self, value: &Value) {
        self.emit(&value.to_string());
    }
}

/// Prints one group per replay-log entry:
///
/// ```text
/// TEALEAF
///   [MESSAGE] Inc
///     {"type":"Inc"}
///   [MODEL]
///     1
/// ```
pub struct ConsoleDebugger<C = TracingConsole> {
    console: C,
    label: String,
}

impl Default for ConsoleDebugger<TracingConsole> {
    fn default() -> Self {
        Self::new(TracingConsole::default(), "TEALEAF")
    }
}

impl<C: Console> ConsoleDebugger<C> {
    pub fn new(console: C, label: impl Into<String>) -> Self {
        Self {
            console,
            label: label.into(),
        }
    }
}

impl<Model, Msg, C> Debugger<Model, Msg> for ConsoleDebugger<C>
where
    Model: Serialize,
    Msg: Serialize,
    C: Console,
{
    fn observe(&mut self, (action, model): &DebugData<Model, Msg>) {
        self.console.group(&self.label);

        match action {
            DebugAction::Init => self.console.log("[INIT]"),
            DebugAction::Message(msg) => {
                let payload = to_json(msg);
                self.console
                    .group_collapsed(&format!("[MESSAGE] {}", message_type(&payload)));
                self.console.dir(&payload);
                self.console.group_end();
            }
        }

        self.console.group_collapsed("[MODEL]");
        self.console.dir(&to_json(model));
        self.console.group_end();
        self.console.group_end();
    }
}

fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| Value::String(format!("<unserializable: {e}>")))
}

/// Best-effort label for a serialized message.
///
/// Objects are searched for the first non-null field among `tag`, `_tag`,
/// `type`, `_type`, `kind`, `_kind`.  A bare string (how serde writes a unit
/// enum variant) is its own label.  Anything else has the empty label.
pub fn message_type(payload: &Value) -> String {
    match payload {
        Value::Object(fields) => DISCRIMINANTS
            .iter()
            .filter_map(|name| fields.get(*name))
            .find(|value| !value.is_null())
            .map(|value| match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_default(),
        Value::String(s) => s.clone(),
        _ => String::new(),
    }
}
