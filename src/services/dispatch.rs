use anyhow::{anyhow, Context, Result};
use serde_json::Value as JsonValue;
use std::process::Command;
use std::sync::mpsc::Sender;
use std::thread;

/// Which external collaborator produced a result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchKind {
    Submit,
    Geocode,
}

/// Result of a background dispatch, pumped from the tick loop.
pub struct DispatchMsg {
    pub kind: DispatchKind,
    pub outcome: Result<JsonValue, String>,
}

/// Run a configured command line and parse its stdout as a JSON envelope.
/// Envelope contract: `{"ok":true,"data":{..}}` on success,
/// `{"ok":false,"error":{"message":"..","fields":{"name":"msg"}}}` on
/// validation failure.
pub fn run_cmdline_to_json(cmdline: &str) -> Result<JsonValue> {
    let parts = shlex::split(cmdline).ok_or_else(|| anyhow!("Failed to parse command line"))?;
    if parts.is_empty() {
        return Err(anyhow!("Empty command line"));
    }
    let program = &parts[0];
    let args = &parts[1..];
    let output = Command::new(program)
        .args(args)
        .env("OFDB_TUI_JSON", "1")
        .output()
        .with_context(|| format!("spawning {cmdline}"))?;
    if !output.status.success() {
        let err = String::from_utf8_lossy(&output.stderr).to_string();
        return Err(anyhow!("Command failed: {}\n{}", cmdline, err));
    }
    let text = String::from_utf8_lossy(&output.stdout).to_string();
    let v: JsonValue = serde_json::from_str(&text).with_context(|| "parsing command JSON")?;
    Ok(v)
}

/// Fire-and-forget: the component never awaits the result synchronously;
/// the envelope comes back over the channel and is rendered reactively.
pub fn spawn_dispatch(cmdline: String, kind: DispatchKind, tx: Sender<DispatchMsg>) {
    thread::spawn(move || {
        let outcome = run_cmdline_to_json(&cmdline).map_err(|e| format!("{e}"));
        let _ = tx.send(DispatchMsg { kind, outcome });
    });
}

/// Quote a single argument for a shlex-split command line. Anything that
/// shlex would reinterpret (whitespace, quotes, backslashes) or an empty
/// value gets single-quoted.
pub fn quote_arg(s: &str) -> String {
    let needs_quoting = s.is_empty()
        || s.chars()
            .any(|c| c.is_whitespace() || c == '\'' || c == '"' || c == '\\');
    if needs_quoting {
        format!("'{}'", s.replace('\'', "'\\''"))
    } else {
        s.to_string()
    }
}
