//! Line-oriented front ends: one-shot `ask`, interactive `repl`, `health`.

use std::io::Write;

use anyhow::Result;
use colored::*;
use sqlagent_core::{AgentClient, ChatState, Message, TurnController};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

/// Formats one agent reply for a plain terminal.
pub fn format_reply(msg: &Message) -> String {
    if msg.is_error {
        return format!("\n❌ {}\n", msg.content.red());
    }

    let mut out = format!("\n📝 {} {}\n", "Answer:".bold().green(), msg.content);
    if let Some(sql) = &msg.sql {
        out.push_str(&format!("🔧 {} {}\n", "SQL:".bold().magenta(), sql.cyan()));
    }
    if let Some(result) = &msg.result {
        out.push_str(&format!("{}\n{}\n", "📋 Raw Result:".bold().blue(), result.dimmed()));
    }
    out.push_str(&format!("{}\n", "-".repeat(50).dimmed()));
    out
}

/// Calls `on_start` each time the published state goes from idle to busy.
/// Returns once the controller is dropped.
async fn watch_turns(mut updates: watch::Receiver<ChatState>, mut on_start: impl FnMut()) {
    let mut was_busy = updates.borrow_and_update().busy;
    while updates.changed().await.is_ok() {
        let busy = updates.borrow_and_update().busy;
        if busy && !was_busy {
            on_start();
        }
        was_busy = busy;
    }
}

fn spawn_thinking_indicator(controller: &TurnController<AgentClient>) {
    tokio::spawn(watch_turns(controller.subscribe(), || {
        eprintln!("{}", "⏳ Thinking...".dimmed());
    }));
}

/// Runs a single turn and prints the reply. Returns false when the turn
/// ended in an error message.
pub async fn ask(client: AgentClient, question: &str) -> Result<bool> {
    let mut controller = TurnController::new(client);
    spawn_thinking_indicator(&controller);
    if controller.submit(question).await == 0 {
        println!("{}", "Nothing to ask: the question is empty.".yellow());
        return Ok(false);
    }

    let Some(reply) = controller.transcript().last() else {
        return Ok(false);
    };
    print!("{}", format_reply(reply));
    Ok(!reply.is_error)
}

fn is_exit_command(line: &str) -> bool {
    matches!(line.trim().to_lowercase().as_str(), "exit" | "quit")
}

pub async fn repl(client: AgentClient) -> Result<()> {
    println!("\n{}", "📊 AI SQL Agent".bold().blue());
    println!("Connected to {}", client.endpoint().dimmed());
    println!("Type 'exit' or 'quit' to stop.\n");

    let mut controller = TurnController::new(client);
    spawn_thinking_indicator(&controller);
    if let Some(welcome) = controller.transcript().last() {
        println!("{}\n", welcome.content);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{}", "Ask a question: ".bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if is_exit_command(&line) {
            break;
        }

        // Blank lines append nothing; skip straight to the next prompt.
        if controller.submit(&line).await == 0 {
            continue;
        }
        if let Some(reply) = controller.transcript().last() {
            print!("{}", format_reply(reply));
        }
    }

    Ok(())
}

pub async fn health(client: AgentClient) -> Result<bool> {
    println!("🩺 Checking {}", client.health_url().as_str().cyan());

    match client.health().await {
        Ok(status) => {
            let provider = status.agent_provider.as_deref().unwrap_or("none configured");
            if status.is_ok() {
                println!("{} (provider: {})", "Backend is up".green(), provider.bold());
            } else {
                println!("{} {}", "Backend reported:".yellow(), status.status);
            }
            Ok(status.is_ok())
        }
        Err(e) => {
            println!("{}: {}", "Backend unreachable".red(), e);
            println!("Make sure the agent server is running and the endpoint is correct.");
            Ok(false)
        }
    }
}
