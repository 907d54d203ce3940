//! System prompts and prompt templates for the bundled applications

use anyhow::{Context, Result};
use handlebars::Handlebars;
use serde_json::json;

pub const NOTESMITH_SYSTEM_PROMPT: &str = "You are NoteSmith, a concise research assistant.
- Prefer bullet answers with crisp takeaways.
- When the user asks to /summarize <url>, use WebFetch to retrieve and then summarize 5 key points + a 1-line TL;DR.
- When the user types /note <text>, call the custom save_note tool.
- When the user types /find <pattern>, call the custom find_note tool.
- Keep answers short unless asked to expand.
";

pub const NOTESMITH_HELP: &str = "Commands:
  /summarize <url>      Summarize a webpage (WebFetch)
  /note <text>          Save a note locally
  /find <pattern>       Search saved notes
  /help                 Show this help
  /exit                 Quit
";

pub const INSPIRE_SYSTEM_PROMPT: &str = "You are InspireBot.
- First, try WebSearch to find a short, uplifting quote relevant to the user's topic.
- If WebSearch is unhelpful or no clear quote is found, call the custom 'inspire_me' tool.
- Output ONE short line only. No preface, no commentary, <= 120 characters.";

pub const INSPIRE_DEFAULT_TOPIC: &str = "engineering focus";

pub const OUTLINE_SYSTEM_PROMPT: &str = "You are a precise technical copy strategist.";

pub const OUTLINE_PROMPT: &str = "Create a crisp markdown outline (H2/H3 bullets) for a 500-word blog post:
Title: Why Sovereign AI Compute Matters in 2026
Audience: CTOs and Heads of AI
Tone: pragmatic, non-hype
Include: 3 buyer pains, 3 evaluation criteria, 1 closing CTA
";

pub const CHAT_SYSTEM_PROMPT: &str = "You are a helpful assistant. Use the utilities tools for arithmetic and the current time when they help. Keep answers concise.";

pub const CLI_INSTALL_HELP: &str = "Claude CLI not found or not usable by this process.

Fix:
1) Install:  npm i -g @anthropic-ai/claude-code
2) Make sure the global npm bin directory is on PATH (or pass --cli-path)
3) Verify:   claude --version
";

const SUMMARIZE: &str = "summarize";
const SAVE_NOTE: &str = "save_note";
const FIND_NOTE: &str = "find_note";
const INSPIRE: &str = "inspire";

/// Renders the prompts sent on behalf of user commands
pub struct PromptTemplates {
    registry: Handlebars<'static>,
}

impl PromptTemplates {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        // Prompts are plain text, not HTML
        registry.register_escape_fn(handlebars::no_escape);

        let templates = [
            (
                SUMMARIZE,
                "Summarize this URL using WebFetch and return 5 bullets + TL;DR:\n{{url}}",
            ),
            (SAVE_NOTE, "Please call tool save_note with text=\"{{text}}\""),
            (FIND_NOTE, "Please call tool find_note with pattern=\"{{pattern}}\""),
            (
                INSPIRE,
                "Find a short, uplifting quote for today's inspiration. Topic: {{topic}}. Prefer something crisp and modern.\nIf search yields multiple options, pick the best single line.",
            ),
        ];
        for (name, template) in templates {
            registry
                .register_template_string(name, template)
                .with_context(|| format!("Invalid prompt template: {}", name))?;
        }

        Ok(Self { registry })
    }

    pub fn summarize(&self, url: &str) -> Result<String> {
        self.render(SUMMARIZE, json!({ "url": url }))
    }

    pub fn save_note(&self, text: &str) -> Result<String> {
        self.render(SAVE_NOTE, json!({ "text": text }))
    }

    pub fn find_note(&self, pattern: &str) -> Result<String> {
        self.render(FIND_NOTE, json!({ "pattern": pattern }))
    }

    pub fn inspire(&self, topic: &str) -> Result<String> {
        self.render(INSPIRE, json!({ "topic": topic }))
    }

    fn render(&self, name: &str, data: serde_json::Value) -> Result<String> {
        self.registry
            .render(name, &data)
            .with_context(|| format!("Failed to render prompt: {}", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notesmith_help_layout() {
        let lines: Vec<&str> = NOTESMITH_HELP.lines().collect();
        assert_eq!(lines[0], "Commands:");
        assert_eq!(lines[1], "  /summarize <url>      Summarize a webpage (WebFetch)");
        assert_eq!(lines[5], "  /exit                 Quit");
        // Descriptions line up in one column
        let column = lines[1].find("Summarize").unwrap();
        for line in &lines[1..] {
            assert_ne!(line.as_bytes()[column], b' ', "{}", line);
            assert_eq!(line.as_bytes()[column - 1], b' ', "{}", line);
        }
        assert!(!NOTESMITH_HELP.contains('—'));
    }

    #[test]
    fn test_rendered_prompts_are_not_escaped() {
        let templates = PromptTemplates::new().unwrap();

        assert_eq!(
            templates.save_note("buy <milk> & eggs").unwrap(),
            "Please call tool save_note with text=\"buy <milk> & eggs\""
        );
        assert_eq!(
            templates.find_note("milk").unwrap(),
            "Please call tool find_note with pattern=\"milk\""
        );
        assert_eq!(
            templates.summarize("https://example.com/a?b=1&c=2").unwrap(),
            "Summarize this URL using WebFetch and return 5 bullets + TL;DR:\nhttps://example.com/a?b=1&c=2"
        );
        assert!(templates
            .inspire(INSPIRE_DEFAULT_TOPIC)
            .unwrap()
            .contains("Topic: engineering focus."));
    }
}
