use std::io::{self, Write};

use colored::Colorize;
use serde_json::Value;

use crate::chat::ChatSession;
use crate::cli::display;
use crate::config::AppConfig;
use crate::memory::{Memory, SimpleMemory};

#[derive(Debug, PartialEq)]
pub enum ReplCommand {
    Exit,
    Clear,
    Help,
    New,
    History,
    PersonalityList,
    PersonalitySet(String),
    PersonalityInfo(String),
    PersonalityAdd(String),
    PersonalityRemove(String),
    ConversationList,
    ConversationLoad(String),
    MemoryAdd { key: String, value: String },
    MemoryGet(String),
    MemorySearch(String),
    MemoryClear,
    Usage(&'static str),
    Unknown(String),
}

/// Parses a slash command. Plain text (anything not starting with `/`) yields `None`.
pub fn parse_command(line: &str) -> Option<ReplCommand> {
    let line = line.trim();
    if !line.starts_with('/') {
        return None;
    }

    let parts: Vec<&str> = line.split_whitespace().collect();
    let head = parts[0].to_lowercase();
    let action = parts.get(1).map(|a| a.to_lowercase());
    let arg = parts.get(2).map(|a| a.to_string());
    let rest = || parts.get(2..).map(|r| r.join(" ")).filter(|r| !r.is_empty());

    let command = match (head.as_str(), action.as_deref()) {
        ("/exit" | "/quit", _) => ReplCommand::Exit,
        ("/clear", _) => ReplCommand::Clear,
        ("/help", _) => ReplCommand::Help,
        ("/new", _) => ReplCommand::New,
        ("/history", _) => ReplCommand::History,

        ("/personality", None) => ReplCommand::Usage("/personality <list|set|info|add|remove> [name]"),
        ("/personality", Some("list")) => ReplCommand::PersonalityList,
        ("/personality", Some(action @ ("set" | "info" | "add" | "remove"))) => match arg {
            None => ReplCommand::Usage(match action {
                "set" => "/personality set <name>",
                "info" => "/personality info <name>",
                "add" => "/personality add <name>",
                _ => "/personality remove <name>",
            }),
            Some(name) => match action {
                "set" => ReplCommand::PersonalitySet(name),
                "info" => ReplCommand::PersonalityInfo(name),
                "add" => ReplCommand::PersonalityAdd(name),
                _ => ReplCommand::PersonalityRemove(name),
            },
        },
        ("/personality", Some(_)) => ReplCommand::Usage("/personality <list|set|info|add|remove> [name]"),

        ("/conversations", Some("list")) => ReplCommand::ConversationList,
        ("/conversations", Some("load")) => match arg {
            Some(id) => ReplCommand::ConversationLoad(id),
            None => ReplCommand::Usage("/conversations load <id>"),
        },
        ("/conversations", _) => ReplCommand::Usage("/conversations <list|load> [id]"),

        ("/memory", Some("add")) => match (arg, parts.get(3..).map(|r| r.join(" "))) {
            (Some(key), Some(value)) if !value.is_empty() => ReplCommand::MemoryAdd { key, value },
            _ => ReplCommand::Usage("/memory add <key> <value>"),
        },
        ("/memory", Some("get")) => match arg {
            Some(key) => ReplCommand::MemoryGet(key),
            None => ReplCommand::Usage("/memory get <key>"),
        },
        ("/memory", Some("search")) => match rest() {
            Some(query) => ReplCommand::MemorySearch(query),
            None => ReplCommand::Usage("/memory search <query>"),
        },
        ("/memory", Some("clear")) => ReplCommand::MemoryClear,
        ("/memory", _) => ReplCommand::Usage("/memory <add|get|search|clear> ..."),

        _ => ReplCommand::Unknown(line.to_string()),
    };
    Some(command)
}

/// Reads one line from stdin after printing `label`. `None` on end of input.
pub fn read_line(label: &str) -> Option<String> {
    print!("{}", label);
    io::stdout().flush().ok()?;

    let mut input = String::new();
    match io::stdin().read_line(&mut input) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(input.trim().to_string()),
    }
}

enum Flow {
    Continue,
    Exit,
}

pub async fn run_repl(mut session: ChatSession, mut memory: SimpleMemory, config: &AppConfig) {
    display::print_welcome(config, session.active_personality());

    loop {
        let label = format!("\n{}: ", config.display.user_name.green().bold());
        let Some(text) = read_line(&label) else {
            break;
        };
        if text.is_empty() {
            continue;
        }

        if let Some(command) = parse_command(&text) {
            match handle_command(command, &mut session, &mut memory, config) {
                Flow::Continue => continue,
                Flow::Exit => break,
            }
        }

        let response = session.get_response(&text).await;
        display::print_response(&config.display, &response);
    }

    println!("{}", "Goodbye!".yellow().bold());
}

fn handle_command(
    command: ReplCommand,
    session: &mut ChatSession,
    memory: &mut SimpleMemory,
    config: &AppConfig,
) -> Flow {
    match command {
        ReplCommand::Exit => return Flow::Exit,
        ReplCommand::Clear => {
            print!("\x1B[2J\x1B[1;1H");
            display::print_welcome(config, session.active_personality());
        }
        ReplCommand::Help => println!("{}", display::HELP_TEXT),
        ReplCommand::New => {
            session.new_conversation();
            display::print_success("Started a new conversation.");
        }
        ReplCommand::History => {
            display::print_history(session.history(config.chat.chat_history_limit), &config.display);
        }
        ReplCommand::PersonalityList => display::print_personalities(&session.personalities().list()),
        ReplCommand::PersonalitySet(name) => match session.change_personality(&name) {
            Ok(()) => display::print_success(&format!("Changed personality to: {name}")),
            Err(e) => display::print_error(&format!("Could not change personality: {e}")),
        },
        ReplCommand::PersonalityInfo(name) => match session.personalities().info(&name) {
            Some(p) => display::print_personality(&p),
            None => display::print_error(&format!("Personality '{name}' not found.")),
        },
        ReplCommand::PersonalityAdd(name) => {
            let Some(description) = read_line("Description of the personality: ") else {
                return Flow::Continue;
            };
            let Some(prompt) = read_line("System prompt for this personality: ") else {
                return Flow::Continue;
            };
            match session.personalities_mut().add(&name, &prompt, &description) {
                Ok(()) => display::print_success(&format!("Personality '{name}' added successfully.")),
                Err(e) => display::print_error(&format!("Error adding personality: {e}")),
            }
        }
        ReplCommand::PersonalityRemove(name) => match session.personalities_mut().remove(&name) {
            Ok(true) => display::print_success(&format!("Personality '{name}' removed successfully.")),
            Ok(false) => display::print_error(&format!("Personality '{name}' not found.")),
            Err(e) => display::print_error(&format!("Could not remove personality '{name}': {e}")),
        },
        ReplCommand::ConversationList => display::print_conversations(&session.list_conversations()),
        ReplCommand::ConversationLoad(id) => match session.load_conversation(&id) {
            Ok(()) => display::print_success(&format!("Loaded conversation: {}", session.conversation().id())),
            Err(e) => display::print_error(&format!("Could not load conversation: {e}")),
        },
        ReplCommand::MemoryAdd { key, value } => match memory.add(&key, Value::String(value)) {
            Ok(()) => display::print_success(&format!("Remembered '{key}'.")),
            Err(e) => display::print_error(&format!("Could not save memory: {e}")),
        },
        ReplCommand::MemoryGet(key) => match memory.get(&key) {
            Some(value) => println!("{} = {}", key.cyan(), display::value_text(value)),
            None => display::print_error(&format!("'{key}' not found.")),
        },
        ReplCommand::MemorySearch(query) => {
            display::print_memory_records(&memory.search(&query, config.memory.search_limit));
        }
        ReplCommand::MemoryClear => match memory.clear() {
            Ok(()) => display::print_success("Memory cleared."),
            Err(e) => display::print_error(&format!("Could not clear memory: {e}")),
        },
        ReplCommand::Usage(usage) => display::print_error(&format!("Usage: {usage}")),
        ReplCommand::Unknown(line) => display::print_error(&format!("Unknown command: {line} (try /help)")),
    }
    Flow::Continue
}
