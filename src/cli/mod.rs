pub mod commands;
pub mod display;
pub mod repl;

use std::fmt::Display;
use std::process::ExitCode;
use std::str::FromStr;

use colored::Colorize;
use serde_json::Value;
use tracing::error;

use crate::chat::ChatSession;
use crate::cli::commands::{Commands, ConversationAction, MemoryAction, PersonalityAction};
use crate::cli::repl::{read_line, run_repl};
use crate::config::AppConfig;
use crate::conversation::ConversationStore;
use crate::llm::AdapterFactory;
use crate::memory::{Memory, SimpleMemory};
use crate::personality::PersonalityStore;

pub async fn run_cli(command: Commands, config_path: &str, verbose: bool) -> ExitCode {
    let config = match AppConfig::load_or_init(config_path) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            display::print_error(&format!("Error: could not load configuration: {e}"));
            return ExitCode::FAILURE;
        }
    };

    let ok = match command {
        Commands::Chat { personality, resume } => run_chat(&config, verbose, personality, resume).await,
        Commands::Configure => configure(config, config_path),
        Commands::Status => status(&config).await,
        Commands::Personalities { action } => personalities(&config, action),
        Commands::Conversations { action } => conversations(&config, action),
        Commands::Memory { action } => memory(&config, action),
    };

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn run_chat(config: &AppConfig, verbose: bool, personality: Option<String>, resume: Option<String>) -> bool {
    let Some(adapter) = AdapterFactory::create_default(&config.llm) else {
        display::print_error(&format!("Error: unknown LLM provider '{}'", config.llm.provider));
        return false;
    };

    if !adapter.is_available().await {
        display::print_error("Error: Could not connect to Ollama. Make sure it's running.");
        return false;
    }
    if config.llm.verbose || verbose {
        adapter.version().await;
    }

    let personalities = match PersonalityStore::load(&config.chat.personalities_dir) {
        Ok(p) => p,
        Err(e) => {
            display::print_error(&format!("Error: could not load personalities: {e}"));
            return false;
        }
    };

    let mut session = match ChatSession::new(&config.chat, adapter, personalities) {
        Ok(s) => s,
        Err(e) => {
            display::print_error(&format!("Error: could not start session: {e}"));
            return false;
        }
    };

    if let Some(name) = personality {
        if let Err(e) = session.change_personality(&name) {
            display::print_error(&format!("{e}; using the default personality"));
        }
    }
    if let Some(id) = resume {
        if let Err(e) = session.load_conversation(&id) {
            display::print_error(&format!("{e}; starting a new conversation"));
        }
    }

    let memory = SimpleMemory::open(&config.memory.file);
    run_repl(session, memory, config).await;
    true
}

fn ask(label: &str, current: &str) -> String {
    match read_line(&format!("{} [{}]: ", label, current)) {
        Some(answer) if !answer.is_empty() => answer,
        _ => current.to_string(),
    }
}

fn ask_parsed<T: FromStr + Display + Copy>(label: &str, current: T) -> T {
    let answer = ask(label, &current.to_string());
    answer.parse().unwrap_or_else(|_| {
        display::print_error(&format!("'{answer}' is not valid for {label}, keeping {current}"));
        current
    })
}

fn ask_bool(label: &str, current: bool) -> bool {
    let answer = ask(&format!("{label} (y/n)"), if current { "y" } else { "n" });
    matches!(answer.to_lowercase().as_str(), "y" | "yes" | "s" | "si" | "sí" | "true")
}

fn configure(mut config: AppConfig, config_path: &str) -> bool {
    println!("{}", "Emma Configuration".bold());
    println!("======================\n");

    println!("{}", "Model Configuration".cyan().bold());
    config.llm.model = ask("Model", &config.llm.model);
    config.llm.temperature = ask_parsed("Temperature", config.llm.temperature);
    config.llm.max_tokens = ask_parsed("Max tokens", config.llm.max_tokens);

    println!("\n{}", "Conversation Configuration".cyan().bold());
    config.chat.save_conversations = ask_bool("Save conversations?", config.chat.save_conversations);

    println!("\n{}", "Ollama Configuration".cyan().bold());
    config.llm.host = ask("Ollama host", &config.llm.host);

    if let Err(e) = config.validate() {
        display::print_error(&format!("Invalid configuration: {e}"));
        return false;
    }
    match config.save(config_path) {
        Ok(()) => {
            display::print_success("Configuration saved successfully.");
            true
        }
        Err(e) => {
            display::print_error(&format!("Error saving configuration: {e}"));
            false
        }
    }
}

async fn status(config: &AppConfig) -> bool {
    let Some(adapter) = AdapterFactory::create_default(&config.llm) else {
        display::print_error(&format!("Error: unknown LLM provider '{}'", config.llm.provider));
        return false;
    };

    if !adapter.is_available().await {
        display::print_error(&format!("{} is not reachable at {}", adapter.name(), config.llm.host));
        return false;
    }
    let version = adapter.version().await.unwrap_or_else(|| "unknown".to_string());
    display::print_success(&format!("{} is available at {} (version {})", adapter.name(), config.llm.host, version));
    println!("Model: {}", config.llm.model);
    true
}

fn personalities(config: &AppConfig, action: PersonalityAction) -> bool {
    let mut store = match PersonalityStore::load(&config.chat.personalities_dir) {
        Ok(s) => s,
        Err(e) => {
            display::print_error(&format!("Error: could not load personalities: {e}"));
            return false;
        }
    };

    match action {
        PersonalityAction::List => {
            display::print_personalities(&store.list());
            true
        }
        PersonalityAction::View { name } => match store.info(&name) {
            Some(p) => {
                display::print_personality(&p);
                true
            }
            None => {
                display::print_error(&format!("Personality '{name}' not found."));
                false
            }
        },
        PersonalityAction::Add { name, prompt, description } => {
            let description = description.or_else(|| read_line("Description of the personality: "));
            let prompt = prompt
                .or_else(|| read_line("System prompt for this personality: "))
                .unwrap_or_default();
            match store.add(&name, &prompt, &description.unwrap_or_default()) {
                Ok(()) => {
                    display::print_success(&format!("Personality '{name}' added successfully."));
                    true
                }
                Err(e) => {
                    display::print_error(&format!("Error adding personality: {e}"));
                    false
                }
            }
        }
        PersonalityAction::Remove { name } => match store.remove(&name) {
            Ok(true) => {
                display::print_success(&format!("Personality '{name}' removed successfully."));
                true
            }
            Ok(false) => {
                display::print_error(&format!("Personality '{name}' not found."));
                false
            }
            Err(e) => {
                display::print_error(&format!("Could not remove personality '{name}': {e}"));
                false
            }
        },
    }
}

fn conversations(config: &AppConfig, action: ConversationAction) -> bool {
    match action {
        ConversationAction::List => match ConversationStore::new(&config.chat.conversation_dir).list() {
            Ok(list) => {
                display::print_conversations(&list);
                true
            }
            Err(e) => {
                display::print_error(&format!("Error listing conversations: {e}"));
                false
            }
        },
    }
}

fn memory(config: &AppConfig, action: MemoryAction) -> bool {
    let mut memory = SimpleMemory::open(&config.memory.file);

    match action {
        MemoryAction::Add { key, value } => match memory.add(&key, Value::String(value.join(" "))) {
            Ok(()) => {
                display::print_success(&format!("Remembered '{key}'."));
                true
            }
            Err(e) => {
                display::print_error(&format!("Could not save memory: {e}"));
                false
            }
        },
        MemoryAction::Get { key } => match memory.get(&key) {
            Some(value) => {
                println!("{}", display::value_text(value));
                true
            }
            None => {
                display::print_error(&format!("'{key}' not found."));
                false
            }
        },
        MemoryAction::Search { query, limit } => {
            let limit = limit.unwrap_or(config.memory.search_limit);
            display::print_memory_records(&memory.search(&query, limit));
            true
        }
        MemoryAction::Clear => match memory.clear() {
            Ok(()) => {
                display::print_success("Memory cleared.");
                true
            }
            Err(e) => {
                display::print_error(&format!("Could not clear memory: {e}"));
                false
            }
        },
    }
}
