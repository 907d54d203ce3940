//! Local note storage and the `save_note` / `find_note` tools

use crate::error::{Result, ToolError};
use crate::tools::{Tool, ToolCall, ToolExample, ToolFactory, ToolResult};
use async_trait::async_trait;
use chrono::Local;
use serde_json::json;
use std::path::PathBuf;
use tracing::debug;
use walkdir::WalkDir;

/// Plain-text notes in a single directory
#[derive(Debug, Clone)]
pub struct NotesStore {
    dir: PathBuf,
}

impl NotesStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// Write `text` to a new timestamped note and return its path
    pub async fn save(&self, text: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let stem = format!("note_{}", Local::now().format("%Y-%m-%d_%H-%M-%S"));
        let mut path = self.dir.join(format!("{}.txt", stem));
        let mut n = 1;
        while tokio::fs::try_exists(&path).await? {
            n += 1;
            path = self.dir.join(format!("{}_{}.txt", stem, n));
        }

        tokio::fs::write(&path, format!("{}\n", text.trim())).await?;
        debug!("Saved note {}", path.display());
        Ok(path)
    }

    /// Case-insensitive substring search over `*.txt` notes, in file name order.
    ///
    /// Hits are formatted as `<file>:<line>: <text>`.
    pub fn grep(&self, pattern: &str) -> Result<Vec<String>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let needle = pattern.to_lowercase();
        let mut hits = Vec::new();

        let notes = WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "txt"));

        for entry in notes {
            let name = entry.file_name().to_string_lossy().to_string();
            let content = std::fs::read_to_string(entry.path())?;
            for (i, line) in content.lines().enumerate() {
                if line.to_lowercase().contains(&needle) {
                    hits.push(format!("{}:{}: {}", name, i + 1, line));
                }
            }
        }

        Ok(hits)
    }
}

pub struct SaveNoteTool {
    store: NotesStore,
}

impl SaveNoteTool {
    pub fn new(store: NotesStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for SaveNoteTool {
    fn name(&self) -> &str {
        "save_note"
    }

    fn description(&self) -> &str {
        "Save a short note to local disk"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "text": {"type": "string", "description": "Note text"}
            },
            "required": ["text"]
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let text: String = call.get_parameter("text")?;
        let path = self
            .store
            .save(&text)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                name: self.name().to_string(),
                message: e.to_string(),
            })?;
        Ok(ToolResult::success(
            call.id,
            format!("Saved note → {}", path.display()),
        ))
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![ToolExample {
            description: "Save a reminder".to_string(),
            parameters: json!({"text": "Ship the release notes on Friday"}),
            expected_result: "Saved note → notes/note_2026-10-16_09-30-00.txt".to_string(),
        }]
    }
}

pub struct FindNoteTool {
    store: NotesStore,
}

impl FindNoteTool {
    pub fn new(store: NotesStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for FindNoteTool {
    fn name(&self) -> &str {
        "find_note"
    }

    fn description(&self) -> &str {
        "Find notes containing a pattern (case-insensitive)"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "pattern": {"type": "string", "description": "Text to look for"}
            },
            "required": ["pattern"]
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let pattern: String = call.get_parameter("pattern")?;
        let hits = self.store.grep(&pattern)?;
        let body = if hits.is_empty() {
            "No matches.".to_string()
        } else {
            hits.join("\n")
        };
        Ok(ToolResult::success(call.id, body))
    }
}

/// Factory for the note tools, bound to one store
pub struct NoteToolFactory {
    store: NotesStore,
    find: bool,
}

impl NoteToolFactory {
    pub fn save(store: NotesStore) -> Self {
        Self { store, find: false }
    }

    pub fn find(store: NotesStore) -> Self {
        Self { store, find: true }
    }
}

impl ToolFactory for NoteToolFactory {
    fn create(&self) -> Box<dyn Tool> {
        if self.find {
            Box::new(FindNoteTool::new(self.store.clone()))
        } else {
            Box::new(SaveNoteTool::new(self.store.clone()))
        }
    }

    fn tool_name(&self) -> &str {
        if self.find {
            "find_note"
        } else {
            "save_note"
        }
    }

    fn tool_description(&self) -> &str {
        if self.find {
            "Find notes containing a pattern (case-insensitive)"
        } else {
            "Save a short note to local disk"
        }
    }
}
