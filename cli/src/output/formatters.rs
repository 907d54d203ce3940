//! Text formatting helpers for terminal output

use serde_json::Value;
use tether_core::TurnSummary;

/// Longest tool result preview shown before truncating
pub const PREVIEW_LIMIT: usize = 200;

/// Summarize token usage.
///
/// Uses `total_tokens` when reported, otherwise input plus output tokens.
pub fn token_summary(usage: Option<&Value>) -> String {
    let Some(usage) = usage.and_then(Value::as_object) else {
        return "tokens=?".to_string();
    };

    let count = |key: &str| usage.get(key).and_then(Value::as_u64);
    let input = count("input_tokens");
    let output = count("output_tokens");

    let total = count("total_tokens").or_else(|| match (input, output) {
        (None, None) => None,
        (i, o) => Some(i.unwrap_or(0) + o.unwrap_or(0)),
    });

    let Some(total) = total else {
        return "tokens=?".to_string();
    };

    if usage.contains_key("input_tokens") || usage.contains_key("output_tokens") {
        let shown = |n: Option<u64>| n.map(|n| n.to_string()).unwrap_or_else(|| "?".to_string());
        format!(
            "tokens={} (in={}, out={})",
            total,
            shown(input),
            shown(output)
        )
    } else {
        format!("tokens={}", total)
    }
}

/// Format a cost in USD, `?` when unknown
pub fn format_cost(cost: Option<f64>) -> String {
    cost.map(|c| c.to_string())
        .unwrap_or_else(|| "?".to_string())
}

/// Footer printed after a NoteSmith turn
pub fn turn_footer(summary: Option<&TurnSummary>, default_model: &str) -> String {
    let model = summary
        .and_then(|s| s.model.as_deref())
        .unwrap_or(default_model);
    let usage = summary.and_then(|s| s.usage.as_ref());
    let cost = summary.and_then(|s| s.total_cost_usd);

    format!(
        "\n\n— Turn done. model={} {} cost={} —",
        model,
        token_summary(usage),
        format_cost(cost)
    )
}

/// Shorten a tool result for display
pub fn result_preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_LIMIT {
        return text.to_string();
    }
    let head: String = text.chars().take(PREVIEW_LIMIT - 3).collect();
    format!("{}…", head)
}

/// Render a tool input compactly
pub fn format_input(input: &Value) -> String {
    serde_json::to_string(input).unwrap_or_else(|_| input.to_string())
}
