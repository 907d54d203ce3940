//! Terminal output handlers for streamed replies

use super::formatters::{format_input, result_preview, turn_footer};
use async_trait::async_trait;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::time::Duration;
use tether_core::output::OutputError;
use tether_core::{Fragment, ReplyEvent, ReplyOutput};
use tokio::sync::Mutex;
use tracing::debug;

/// CLI output configuration
#[derive(Debug, Clone)]
pub struct CliOutputConfig {
    /// Print text deltas as they arrive
    pub realtime_updates: bool,
    /// Show a spinner until the first reply event
    pub spinner: bool,
}

impl Default for CliOutputConfig {
    fn default() -> Self {
        Self {
            realtime_updates: true,
            spinner: false,
        }
    }
}

fn write_stdout(text: &str) -> Result<(), OutputError> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

/// Streams assistant text to stdout and tool activity to stderr
pub struct CliOutputHandler {
    config: CliOutputConfig,
    spinner: Mutex<Option<ProgressBar>>,
}

impl CliOutputHandler {
    pub fn new(config: CliOutputConfig) -> Self {
        let spinner = config.spinner.then(|| {
            let bar = ProgressBar::new_spinner();
            if let Ok(spinner_style) = ProgressStyle::with_template("{spinner} {msg}") {
                bar.set_style(spinner_style);
            }
            bar.set_message("Thinking…");
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        });

        Self {
            config,
            spinner: Mutex::new(spinner),
        }
    }

    /// Clear the spinner if it is still showing
    pub async fn finish(&self) {
        if let Some(bar) = self.spinner.lock().await.take() {
            bar.finish_and_clear();
        }
    }
}

impl Default for CliOutputHandler {
    fn default() -> Self {
        Self::new(CliOutputConfig::default())
    }
}

#[async_trait]
impl ReplyOutput for CliOutputHandler {
    async fn emit_event(&self, event: ReplyEvent) -> Result<(), OutputError> {
        self.finish().await;

        match event {
            ReplyEvent::TextDelta { delta, .. } => write_stdout(&delta)?,
            ReplyEvent::ToolActivity { fragment } => {
                if let Fragment::ToolInvocation { name, .. } = &fragment {
                    eprintln!("{}", style(format!("  ⚙ {}", name)).dim());
                }
            }
            ReplyEvent::TurnFinished {
                text, truncated, ..
            } => {
                if !self.config.realtime_updates {
                    write_stdout(&text)?;
                }
                if truncated {
                    eprintln!("\n{}", style("(reply cut short)").yellow());
                }
                write_stdout("\n")?;
            }
        }
        Ok(())
    }

    fn supports_realtime_updates(&self) -> bool {
        self.config.realtime_updates
    }
}

/// NoteSmith output: text, tool notices and a per-turn footer
pub struct NotesOutput {
    default_model: String,
}

impl NotesOutput {
    pub fn new<S: Into<String>>(default_model: S) -> Self {
        Self {
            default_model: default_model.into(),
        }
    }
}

#[async_trait]
impl ReplyOutput for NotesOutput {
    async fn emit_event(&self, event: ReplyEvent) -> Result<(), OutputError> {
        match event {
            ReplyEvent::TextDelta { delta, .. } => write_stdout(&delta)?,
            ReplyEvent::ToolActivity { fragment } => match &fragment {
                Fragment::ToolInvocation { name, input, .. } => {
                    write_stdout(&format!(
                        "\n🛠️  Using tool: {} with input: {}",
                        name,
                        format_input(input)
                    ))?;
                }
                Fragment::ToolResult { .. } => {
                    if let Some(text) = fragment.result_text() {
                        write_stdout(&format!("\n🔎 Tool says: {}", text))?;
                    }
                }
                Fragment::Text { .. } => {}
            },
            ReplyEvent::TurnFinished { summary, .. } => {
                eprintln!(
                    "{}",
                    style(turn_footer(summary.as_ref(), &self.default_model)).dim()
                );
            }
        }
        Ok(())
    }
}

/// InspireBot output: tool notices as they happen, text kept for the final line
#[derive(Default)]
pub struct InspireOutput {
    parts: Mutex<Vec<String>>,
}

impl InspireOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text parts collected so far, joined into one line
    pub async fn final_line(&self) -> String {
        self.parts
            .lock()
            .await
            .iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl ReplyOutput for InspireOutput {
    async fn emit_event(&self, event: ReplyEvent) -> Result<(), OutputError> {
        match event {
            ReplyEvent::TextDelta { delta, .. } => self.parts.lock().await.push(delta),
            ReplyEvent::ToolActivity { fragment } => match &fragment {
                Fragment::ToolInvocation { name, input, .. } => {
                    println!("{} {}", style("🛠️  Tool used:").bold(), name);
                    println!("{} {}", style("   input:").dim(), format_input(input));
                }
                Fragment::ToolResult { .. } => match fragment.result_text() {
                    Some(text) => {
                        println!("{} {}", style("   result:").dim(), result_preview(&text))
                    }
                    None => println!("{}", style("   result: (no textual content)").dim()),
                },
                Fragment::Text { .. } => {}
            },
            ReplyEvent::TurnFinished { truncated, .. } => {
                debug!("Inspire reply finished (truncated={})", truncated);
            }
        }
        Ok(())
    }
}

/// Typewriter effect for the final InspireBot line
pub async fn typewrite(text: &str, delay: Duration) -> Result<(), OutputError> {
    for ch in text.chars() {
        let mut buf = [0u8; 4];
        write_stdout(ch.encode_utf8(&mut buf))?;
        tokio::time::sleep(delay).await;
    }
    write_stdout("\n")
}
