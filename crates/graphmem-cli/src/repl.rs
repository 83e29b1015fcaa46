//! REPL – Read-Eval-Print Loop for the graphmem interactive shell.
//!
//! Supported slash-commands:
//!   /ask <q>      – hybrid-ranked answer as pretty JSON
//!   /recall <q>   – raw retrieval results with score breakdown
//!   /add <text>   – store a fact stamped with the current time
//!   /stats        – memory size and parameters
//!   /help         – show this list
//!   /quit | /exit – leave the shell
//!
//! Any other line is a chat turn handled by the agent.

use colored::Colorize;
use graphmem_runtime::MemoryAgent;
use graphmem_runtime::agent::now;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Characters of fact text shown per `/recall` line.
const PREVIEW_CHARS: usize = 80;

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command<'a> {
    Ask(&'a str),
    Recall(&'a str),
    Add(&'a str),
    Stats,
    Help,
    Quit,
    Chat(&'a str),
    /// A known command given without its required argument; carries usage.
    MissingArgument(&'static str),
    Unknown(&'a str),
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse(line: &str) -> Option<Command<'_>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if !line.starts_with('/') {
        return Some(Command::Chat(line));
    }

    let (name, arg) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };
    let missing = |usage| arg.is_empty().then_some(Command::MissingArgument(usage));

    Some(match name {
        "/ask" => missing("/ask <question>").unwrap_or(Command::Ask(arg)),
        "/recall" => missing("/recall <query>").unwrap_or(Command::Recall(arg)),
        "/add" => missing("/add <text>").unwrap_or(Command::Add(arg)),
        "/stats" => Command::Stats,
        "/help" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        other => Command::Unknown(other),
    })
}

/// Entry point for the interactive REPL.
///
/// `shutdown` is polled each iteration; when set the REPL exits cleanly.
pub fn run(agent: &mut MemoryAgent, answer_k: usize, shutdown: Arc<AtomicBool>) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        print!("{} ", "graphmem>".bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        }

        let Some(command) = parse(&line) else {
            continue;
        };
        debug!(?command, "repl command");

        match command {
            Command::Ask(query) => match cmd_ask(agent, query, answer_k) {
                Ok(json) => println!("{json}"),
                Err(e) => println!("{}: {}", "Error".red(), e),
            },
            Command::Recall(query) => {
                let lines = cmd_recall(agent, query);
                if lines.is_empty() {
                    println!("{}", "Memory is empty.".dimmed());
                }
                for l in lines {
                    println!("{l}");
                }
            }
            Command::Add(text) => {
                let index = cmd_add(agent, text);
                println!("{} fact #{}", "✓ Stored".green(), index.to_string().bold());
            }
            Command::Stats => println!("{}", cmd_stats(agent)),
            Command::Help => cmd_help(),
            Command::Quit => {
                println!("{}", "Goodbye.".green());
                shutdown.store(true, Ordering::SeqCst);
                break;
            }
            Command::Chat(msg) => match agent.reply(msg) {
                Ok(answer) => println!("{} {}", "assistant:".bold().green(), answer),
                Err(e) => println!("{}: {}", "Error".red(), e),
            },
            Command::MissingArgument(usage) => {
                println!("{} {}", "Usage:".yellow(), usage.bold());
            }
            Command::Unknown(name) => {
                println!(
                    "{} '{}'. Type {} for available commands.",
                    "Unknown command:".red(),
                    name.yellow(),
                    "/help".bold()
                );
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Command handlers
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_help() {
    println!();
    println!("{}", "graphmem Commands".bold().underline());
    println!("  {}     – hybrid-ranked answer (JSON)", "/ask <q>".bold().cyan());
    println!("  {}  – retrieval results with scores", "/recall <q>".bold().cyan());
    println!("  {}  – store a new fact", "/add <text>".bold().cyan());
    println!("  {}       – memory size and parameters", "/stats".bold().cyan());
    println!("  {} – exit the shell", "/quit  /exit".bold().cyan());
    println!("  Anything else is sent to the agent as a chat message.");
    println!();
}

fn cmd_ask(agent: &MemoryAgent, query: &str, k: usize) -> Result<String, String> {
    let response = agent.answer(query, now(), k).map_err(|e| e.to_string())?;
    serde_json::to_string_pretty(&response).map_err(|e| e.to_string())
}

fn cmd_recall(agent: &MemoryAgent, query: &str) -> Vec<String> {
    agent
        .memory()
        .retrieve(query, now(), agent.config().top_k)
        .iter()
        .map(|hit| {
            format!(
                "  [{:>3}] score={:.3} sim={:.3} rec={:.3}  {}",
                hit.index,
                hit.score,
                hit.similarity,
                hit.recency,
                preview(&hit.fact.text)
            )
        })
        .collect()
}

fn cmd_add(agent: &mut MemoryAgent, text: &str) -> usize {
    agent.memory_mut().add(text, now())
}

fn cmd_stats(agent: &MemoryAgent) -> String {
    let memory = agent.memory();
    let links: usize = memory.facts().iter().map(|f| f.neighbors.len()).sum();
    let isolated = memory.facts().iter().filter(|f| f.neighbors.is_empty()).count();
    let cfg = memory.config();
    format!(
        "facts: {}  neighbor links: {}  isolated: {}\n\
         dimension: {}  tau: {}  neighbor_k: {}  alpha: {}",
        memory.len(),
        links,
        isolated,
        cfg.dimension,
        cfg.tau,
        cfg.neighbor_k,
        cfg.alpha
    )
}

/// Fact text flattened to one line and cut at [`PREVIEW_CHARS`].
fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= PREVIEW_CHARS {
        flat
    } else {
        let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphmem_memory::{FactStore, MemoryConfig};

    fn agent() -> MemoryAgent {
        let mut store = FactStore::new(MemoryConfig::default()).unwrap();
        store.add("[CATEGORY] card\nQ: Jak zmienić PIN?\nA: W aplikacji.", 0.0);
        store.add("[CATEGORY] transfers\nQ: Ile trwa przelew?\nA: Jeden dzień.", 1.0);
        MemoryAgent::new(store)
    }

    // ── parse ────────────────────────────────────────────────────────────────

    #[test]
    fn blank_line_is_ignored() {
        assert_eq!(parse("   \n"), None);
    }

    #[test]
    fn plain_text_is_a_chat_turn() {
        assert_eq!(parse(" hello there \n"), Some(Command::Chat("hello there")));
    }

    #[test]
    fn commands_take_the_rest_of_the_line() {
        assert_eq!(parse("/ask  Jak zmienić PIN? "), Some(Command::Ask("Jak zmienić PIN?")));
        assert_eq!(parse("/recall pin"), Some(Command::Recall("pin")));
        assert_eq!(parse("/add A: fact"), Some(Command::Add("A: fact")));
    }

    #[test]
    fn argument_commands_require_an_argument() {
        assert_eq!(parse("/ask"), Some(Command::MissingArgument("/ask <question>")));
        assert_eq!(parse("/add   "), Some(Command::MissingArgument("/add <text>")));
    }

    #[test]
    fn bare_commands_parse() {
        assert_eq!(parse("/stats"), Some(Command::Stats));
        assert_eq!(parse("/help"), Some(Command::Help));
        assert_eq!(parse("/quit"), Some(Command::Quit));
        assert_eq!(parse("/exit"), Some(Command::Quit));
        assert_eq!(parse("/start now"), Some(Command::Unknown("/start")));
    }

    // ── handlers ─────────────────────────────────────────────────────────────

    #[test]
    fn ask_renders_json_answer() {
        let json = cmd_ask(&agent(), "Jak zmienić PIN?", 5).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["answer"], "W aplikacji.");
        assert_eq!(value["category"], "card");
    }

    #[test]
    fn recall_lists_scored_hits() {
        let lines = cmd_recall(&agent(), "przelew");
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().any(|l| l.contains("Ile trwa przelew?")));
        assert!(lines[0].contains("score="));
    }

    #[test]
    fn add_appends_and_stats_reflect_it() {
        let mut agent = agent();
        assert_eq!(cmd_add(&mut agent, "A: nowy fakt"), 2);
        let stats = cmd_stats(&agent);
        assert!(stats.starts_with("facts: 3"));
        assert!(stats.contains("neighbor_k: 5"));
    }

    #[test]
    fn preview_flattens_and_truncates() {
        assert_eq!(preview("Q: a\nA: b"), "Q: a A: b");
        let long = "x".repeat(200);
        let p = preview(&long);
        assert_eq!(p.chars().count(), PREVIEW_CHARS + 1);
        assert!(p.ends_with('…'));
    }
}
