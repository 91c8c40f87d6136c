//! `ragchat chat`: interactive or single-question mode.

use std::io::Write;
use std::sync::Arc;

use ragchat_assistant::{ConversationController, Session};
use ragchat_config::{AppConfig, TurnConfig};
use ragchat_core::event::{DomainEvent, EventBus};
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::debug;

/// Per-turn overrides from the command line.
#[derive(Debug, Default, Clone)]
pub struct ChatOptions {
    pub model: Option<String>,
    pub service: Option<String>,
    pub no_history: bool,
    pub history: Option<usize>,
    pub chunks: Option<usize>,
    pub debug: bool,
}

/// Apply command-line overrides on top of the `[chat]` defaults.
fn turn_config(config: &AppConfig, options: &ChatOptions, service: String) -> TurnConfig {
    let mut turn = config.turn_defaults(service);
    if let Some(model) = &options.model {
        turn.model = model.clone();
    }
    if options.no_history {
        turn.use_chat_history = false;
    }
    if let Some(n) = options.history {
        turn.num_chat_messages = n;
    }
    if let Some(n) = options.chunks {
        turn.num_retrieved_chunks = n;
    }
    turn.debug |= options.debug;
    turn
}

pub async fn run(message: Option<String>, options: ChatOptions) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let backends = ragchat_providers::build_from_config(&config)?;

    let events = Arc::new(EventBus::default());
    let mut debug_rx = events.subscribe();

    let mut session = Session::start(
        backends.directory.as_ref(),
        config.chat.greeting.clone(),
        events.clone(),
    )
    .await?;

    if !session.input_enabled() {
        eprintln!();
        eprintln!("  ERROR: No search services available!");
        eprintln!();
        eprintln!("  Add a [[search.services]] entry to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        session.require_input()?;
    }

    let service = match options.service.clone() {
        Some(s) => s,
        None => session
            .default_service()
            .map(String::from)
            .ok_or("No search service selected")?,
    };
    let turn = turn_config(&config, &options, service);
    turn.validate(&config.models)?;
    debug!(?turn, "Turn options");

    let controller = ConversationController::from_config(&backends, &config, events.clone());

    if let Some(question) = message {
        // Single question mode
        eprint!("  Thinking...");
        let result = controller.handle_turn(&question, &turn, &mut session).await;
        eprint!("\r              \r");
        print_debug_events(&mut debug_rx);
        let answer = result?;
        println!("{}", answer.content());
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║          RagChat: Interactive Mode           ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Service:   {}", turn.service);
    println!("  Model:     {}", turn.model);
    if turn.use_chat_history {
        println!("  History:   last {} messages", turn.num_chat_messages);
    } else {
        println!("  History:   off");
    }
    println!("  Chunks:    {}", turn.num_retrieved_chunks);
    println!();
    println!("  Type your question and press Enter.");
    println!("  Type '/new' to start over, 'exit' or Ctrl+C to quit.");
    println!();
    print_assistant(session.greeting());

    let mut lines = BufReader::new(io::stdin()).lines();

    print!("  You > ");
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            print!("  You > ");
            std::io::stdout().flush()?;
            continue;
        }
        if matches!(line, "exit" | "quit" | "/exit" | "/quit" | ":q") {
            break;
        }

        if line == "/new" {
            session.reset();
            println!();
            print_assistant(session.greeting());
        } else {
            eprint!("  ...");
            let result = controller.handle_turn(line, &turn, &mut session).await;
            eprint!("\r     \r");
            print_debug_events(&mut debug_rx);

            match result {
                Ok(answer) => {
                    println!();
                    print_assistant(answer.content());
                }
                Err(e) => {
                    eprintln!("  [Error] {e}");
                    println!();
                }
            }
        }

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    println!();
    println!("  Goodbye!");
    println!();

    Ok(())
}

fn print_assistant(text: &str) {
    for line in text.lines() {
        println!("  Assistant > {line}");
    }
    println!();
}

/// Drain pending events and print the debug ones.
fn print_debug_events(rx: &mut broadcast::Receiver<Arc<DomainEvent>>) {
    while let Ok(event) = rx.try_recv() {
        match event.as_ref() {
            DomainEvent::QueryReformulated { query, .. } => {
                eprintln!("  [debug] Summary to be used to find similar chunks in the docs:");
                eprintln!("  [debug] {query}");
            }
            DomainEvent::ContextRetrieved {
                service,
                fragments,
                context,
                ..
            } => {
                eprintln!("  [debug] {fragments} chunk(s) from {service}:");
                for line in context.lines() {
                    eprintln!("  [debug]   {line}");
                }
            }
            _ => {}
        }
    }
}
