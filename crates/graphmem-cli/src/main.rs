//! `graphmem` – interactive shell over the graph memory.
//!
//! 1. Loads `~/.graphmem/config.toml`, writing defaults on first run.
//! 2. Builds the fact store and ingests the FAQ file given as the first
//!    argument (or `faq_path` from the config).
//! 3. Picks the heuristic or LLM generator and probes the model server.
//! 4. Drops the user into a REPL (`/ask`, `/recall`, `/add`, `/stats`,
//!    `/help`, `/quit`; anything else is a chat turn).

mod config;
mod probe;
mod repl;

use colored::Colorize;
use graphmem_memory::{FactStore, ingest, load_entries};
use graphmem_runtime::agent::now;
use graphmem_runtime::{
    AgentConfig, Generator, HeuristicGenerator, LlmDriver, MemoryAgent, init_tracing,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

use crate::config::{Config, GeneratorKind};

fn main() {
    // Logs go to stderr; user-facing output stays on stdout.
    let _tracing = init_tracing("graphmem");

    print_banner();

    // ── Shared shutdown flag ──────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – exiting graphmem.".yellow().bold());
        shutdown_clone.store(true, Ordering::SeqCst);
        // The REPL is blocked on stdin and would only see the flag after
        // the next line, so leave now. Memory is not persisted.
        std::process::exit(130);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler");
    }

    let cfg = load_config();

    // ── Memory ────────────────────────────────────────────────────────────
    let mut store = match FactStore::new(cfg.memory.clone()) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("{}: {}", "Invalid memory configuration".red(), e);
            std::process::exit(2);
        }
    };

    let faq_path = std::env::args().nth(1).map(PathBuf::from).or(cfg.faq_path.clone());
    match faq_path {
        Some(path) => match load_entries(&path) {
            Ok(entries) => {
                let ids = ingest(&mut store, &entries, now());
                println!(
                    "  Loaded {} FAQ entries from {}",
                    ids.len().to_string().bold(),
                    path.display().to_string().bold()
                );
            }
            Err(e) => {
                warn!(error = %e, "FAQ not loaded");
                println!("  {}: {}", "FAQ not loaded".yellow(), e);
            }
        },
        None => println!(
            "  {}  Pass a FAQ JSON file as the first argument or set {}.",
            "Memory starts empty.".dimmed(),
            "faq_path".bold()
        ),
    }

    // ── Generator ─────────────────────────────────────────────────────────
    let generator = build_generator(&cfg);

    let agent_config = AgentConfig {
        top_k: cfg.top_k,
        ranker: cfg.ranker.clone(),
        ..AgentConfig::default()
    };
    let mut agent = match MemoryAgent::with_generator(store, generator).with_config(agent_config) {
        Ok(agent) => agent,
        Err(e) => {
            eprintln!("{}: {}", "Invalid ranker configuration".red(), e);
            std::process::exit(2);
        }
    };
    info!(facts = agent.memory().len(), generator = %cfg.generator, "graphmem ready");

    println!();
    println!("  Type {} for a list of commands.\n", "/help".bold().cyan());

    // ── Interactive REPL ──────────────────────────────────────────────────
    repl::run(&mut agent, cfg.answer_k, shutdown);
}

// ─────────────────────────────────────────────────────────────────────────────
// Startup helpers
// ─────────────────────────────────────────────────────────────────────────────

fn load_config() -> Config {
    match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => {
            let mut cfg = Config::default();
            match config::save(&cfg) {
                Ok(()) => println!(
                    "  {} Default config written to {}",
                    "✓".green().bold(),
                    config::config_path().display().to_string().bold()
                ),
                Err(e) => println!("{}: {}", "Error saving config".red(), e),
            }
            config::apply_env_overrides(&mut cfg);
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            let mut cfg = Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    }
}

fn build_generator(cfg: &Config) -> Box<dyn Generator> {
    match cfg.generator {
        GeneratorKind::Heuristic => {
            println!("  Generator: {}", "heuristic".bold());
            Box::new(HeuristicGenerator)
        }
        GeneratorKind::Llm => {
            print!(
                "  Generator: {} at {} … ",
                cfg.model.bold(),
                cfg.llm_url.dimmed()
            );
            io::stdout().flush().ok();
            match probe::fetch_models(&cfg.llm_url) {
                Ok(models) if probe::has_model(&models, &cfg.model) => {
                    println!("{}", "online".green());
                }
                Ok(_) => {
                    println!("{}", "model not found".yellow());
                    println!("  Run `{}` on the server.", format!("ollama pull {}", cfg.model).bold());
                }
                Err(e) => {
                    println!("{}", "offline".yellow());
                    println!("  {}", e.dimmed());
                }
            }
            let mut driver = LlmDriver::new(cfg.llm_url.clone(), cfg.model.clone());
            if !cfg.api_key.is_empty() {
                driver = driver.with_api_key(cfg.api_key.clone());
            }
            Box::new(driver)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"   ____                 _     __  __"#.bold().cyan());
    println!("{}", r#"  / ___|_ __ __ _ _ __ | |__ |  \/  | ___ _ __ ___"#.bold().cyan());
    println!("{}", r#" | |  _| '__/ _` | '_ \| '_ \| |\/| |/ _ \ '_ ` _ \"#.bold().cyan());
    println!("{}", r#" | |_| | | | (_| | |_) | | | | |  | |  __/ | | | | |"#.bold().cyan());
    println!("{}", r#"  \____|_|  \__,_| .__/|_| |_|_|  |_|\___|_| |_| |_|"#.bold().cyan());
    println!("{}", r#"                 |_|"#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "graphmem".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Graph-linked retrieval memory for FAQ assistants");
    println!();
}
