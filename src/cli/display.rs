use colored::Colorize;
use serde_json::Value;

use crate::config::{AppConfig, DisplayConfig};
use crate::conversation::{ConversationSummary, Message, Role};
use crate::memory::MemoryRecord;
use crate::personality::{Personality, PersonalityListing};

pub const HELP_TEXT: &str = "\
Available commands:

Basic:
  /help                        Show this help
  /clear                       Clear the screen
  /new                         Start a fresh conversation
  /history                     Show the latest messages
  /exit, /quit                 Exit Emma

Personality:
  /personality list            List available personalities
  /personality set <name>      Change personality (starts a new conversation)
  /personality info <name>     View personality details
  /personality add <name>      Add a new personality
  /personality remove <name>   Remove a personality

Conversations:
  /conversations list          List saved conversations
  /conversations load <id>     Load a saved conversation

Memory:
  /memory add <key> <value>    Remember a fact
  /memory get <key>            Recall a fact
  /memory search <query>       Search remembered facts
  /memory clear                Forget everything";

/// Frames `body` in a box with `title` on the top edge.
pub fn panel(title: &str, body: &str) -> String {
    let lines: Vec<&str> = body.lines().collect();
    let inner = lines
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0)
        .max(title.chars().count() + 2);

    let mut out = String::new();
    out.push_str(&format!("╭─ {} {}╮\n", title, "─".repeat(inner - title.chars().count() - 1)));
    for line in &lines {
        let pad = inner - line.chars().count();
        out.push_str(&format!("│ {}{} │\n", line, " ".repeat(pad)));
    }
    out.push_str(&format!("╰{}╯", "─".repeat(inner + 2)));
    out
}

pub fn print_welcome(config: &AppConfig, personality: &str) {
    let text = format!(
        "Welcome to Emma, {}!\n\nModel: {}\nTemperature: {}\nPersonality: {}\n\nType /help for commands, /exit to quit.",
        config.display.user_name, config.llm.model, config.llm.temperature, personality
    );
    if config.display.use_panels {
        println!("{}", panel("Emma", &text).green());
    } else {
        println!("{}", text.green());
    }
}

pub fn print_response(display: &DisplayConfig, response: &str) {
    if display.use_panels {
        println!("{}", panel(&display.assistant_name, response).blue());
    } else {
        println!("{} {}", format!("{}:", display.assistant_name).blue().bold(), response);
    }
}

pub fn print_error(message: &str) {
    eprintln!("{}", message.red().bold());
}

pub fn print_success(message: &str) {
    println!("{}", message.green().bold());
}

pub fn print_personalities(listings: &[PersonalityListing]) {
    println!("{:<14} | {:<45} | {}", "Name", "Description", "Preview");
    println!("{:-<14}-+-{:-<45}-+-{:-<30}", "", "", "");
    for p in listings {
        println!(
            "{:<14} | {:<45} | {}",
            p.id.cyan(),
            p.description.green(),
            p.preview.yellow()
        );
    }
}

pub fn print_personality(p: &Personality) {
    let body = format!("{}\n\nDescription: {}", p.prompt, p.description);
    println!("{}", panel(&format!("Personality: {}", p.name), &body).green());
}

pub fn print_conversations(conversations: &[ConversationSummary]) {
    if conversations.is_empty() {
        println!("{}", "No saved conversations found.".yellow());
        return;
    }
    println!("{:<11} | {:<16} | {:<16} | {:>8} | {}", "ID", "Created", "Updated", "Messages", "Preview");
    println!("{:-<11}-+-{:-<16}-+-{:-<16}-+-{:-<8}-+-{:-<30}", "", "", "", "", "");
    for c in conversations {
        let short_id: String = c.id.chars().take(8).collect();
        println!(
            "{:<11} | {:<16} | {:<16} | {:>8} | {}",
            format!("{short_id}...").dimmed(),
            c.created_at.format("%Y-%m-%d %H:%M").to_string().green(),
            c.updated_at.format("%Y-%m-%d %H:%M").to_string().blue(),
            c.message_count.to_string().cyan(),
            c.preview.yellow()
        );
    }
}

pub fn print_history(messages: &[Message], display: &DisplayConfig) {
    for m in messages {
        let label = match m.role {
            Role::System => "system".dimmed(),
            Role::User => display.user_name.green().bold(),
            Role::Assistant => display.assistant_name.blue().bold(),
        };
        println!("[{}] {}: {}", m.timestamp.format("%H:%M:%S"), label, m.content);
    }
}

pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn print_memory_records(records: &[MemoryRecord]) {
    if records.is_empty() {
        println!("{}", "No matching memories.".yellow());
        return;
    }
    for r in records {
        println!(
            "{} = {} {}",
            r.key.cyan(),
            value_text(&r.value),
            format!("({})", r.timestamp.format("%Y-%m-%d %H:%M")).dimmed()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_pads_every_line_to_the_same_width() {
        let rendered = panel("Emma", "hi\nlonger line");
        let widths: Vec<usize> = rendered.lines().map(|l| l.chars().count()).collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]), "{rendered}");
        assert!(rendered.starts_with("╭─ Emma "));
    }

    #[test]
    fn panel_is_at_least_as_wide_as_its_title() {
        let rendered = panel("A very long title", "x");
        let widths: Vec<usize> = rendered.lines().map(|l| l.chars().count()).collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]), "{rendered}");
    }
}
