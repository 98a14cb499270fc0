//! Integration test common infrastructure.
//!
//! Runs the groupwarden binary against a fresh config, feeds it event lines
//! on stdin and collects the intents it echoes on stdout.

use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

/// A config directory plus database that survives several runs.
pub struct TestWarden {
    dir: TempDir,
}

impl TestWarden {
    /// Bot id `1`; `extra` is appended to the generated TOML.
    pub fn new(extra: &str) -> anyhow::Result<Self> {
        let dir = tempfile::tempdir()?;
        let config = format!(
            r#"
[bot]
self_id = 1
superusers = [900]

[database]
path = "{}"

[server]
metrics_port = 0
echo_intents = true
simulated_bot_role = "admin"

{extra}
"#,
            dir.path().join("warden.db").display()
        );
        std::fs::write(dir.path().join("groupwarden.toml"), config)?;
        Ok(Self { dir })
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("groupwarden.toml")
    }

    pub fn data_dir(&self) -> &Path {
        self.dir.path()
    }

    /// Run the binary until stdin is exhausted and return the intents it
    /// printed, in order.
    pub fn run(&self, events: &[Value]) -> anyhow::Result<Vec<Value>> {
        let mut child = Command::new(env!("CARGO_BIN_EXE_groupwarden"))
            .arg(self.config_path())
            .env("RUST_LOG", "warn")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        {
            let Some(mut stdin) = child.stdin.take() else {
                anyhow::bail!("child has no stdin");
            };
            for event in events {
                writeln!(stdin, "{event}")?;
            }
            writeln!(stdin, "this line is not json")?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            anyhow::bail!("groupwarden exited with {}", output.status);
        }

        String::from_utf8(output.stdout)?
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str::<Value>(line).map_err(anyhow::Error::from))
            .collect()
    }
}

/// A group message event with plain text and optional leading segments.
#[allow(dead_code)]
pub fn message(id: i64, from: i64, role: &str, segments: Vec<Value>) -> Value {
    serde_json::json!({
        "type": "group_message",
        "group_id": 10,
        "message_id": id,
        "sender": { "user_id": from, "nickname": format!("user{from}"), "role": role },
        "segments": segments,
    })
}

#[allow(dead_code)]
pub fn text(text: &str) -> Value {
    serde_json::json!({ "type": "text", "text": text })
}

#[allow(dead_code)]
pub fn at(user: i64) -> Value {
    serde_json::json!({ "type": "at", "user_id": user })
}

#[allow(dead_code)]
pub fn reply(message: i64) -> Value {
    serde_json::json!({ "type": "reply", "message_id": message })
}

/// Text of every `send_message` intent.
#[allow(dead_code)]
pub fn sent_texts(intents: &[Value]) -> Vec<String> {
    intents
        .iter()
        .filter(|i| i["action"] == "send_message")
        .filter_map(|i| i["text"].as_str().map(str::to_string))
        .collect()
}
