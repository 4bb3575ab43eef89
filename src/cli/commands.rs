use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "emma", version, about = "Emma - chat with a local Ollama model", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file path globally
    #[arg(short, long, global = true, default_value = "config.yaml")]
    pub config: String,

    /// Log debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Start an interactive chat session (the default)
    Chat {
        /// Personality to start with
        #[arg(short, long)]
        personality: Option<String>,

        /// Resume a stored conversation by id or id prefix
        #[arg(short, long)]
        resume: Option<String>,
    },

    /// Interactively edit and save the configuration
    Configure,

    /// Check that the model service is reachable
    Status,

    /// Manage available personalities
    Personalities {
        #[command(subcommand)]
        action: PersonalityAction,
    },

    /// Inspect stored conversations
    Conversations {
        #[command(subcommand)]
        action: ConversationAction,
    },

    /// Manage the key/value memory store
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum PersonalityAction {
    /// List all personalities
    List,

    /// Show one personality's full prompt
    View { name: String },

    /// Add or replace a personality
    Add {
        name: String,
        /// System prompt (asked for interactively when omitted)
        #[arg(short, long)]
        prompt: Option<String>,
        /// Short description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Remove a personality
    Remove { name: String },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum ConversationAction {
    /// List stored conversations, newest first
    List,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum MemoryAction {
    /// Store a fact under a key
    Add {
        key: String,
        #[arg(required = true, num_args = 1..)]
        value: Vec<String>,
    },

    /// Look up a key
    Get { key: String },

    /// Substring search over keys and values
    Search {
        query: String,
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Remove every entry
    Clear,
}
