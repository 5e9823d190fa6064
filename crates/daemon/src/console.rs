//! Operator console
//!
//! Line-oriented commands read from stdin for local runs. Each line is parsed
//! with clap, maps to one queue operation and prints its result as JSON.

use anyhow::{Context, Result};
use brewline_core::application::EnqueueRequest;
use brewline_core::domain::{OrderId, Priority};
use brewline_core::QueueManager;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

#[derive(Parser, Debug)]
#[command(name = "brewline", no_binary_name = true)]
#[command(about = "Brewline operator console", long_about = None)]
struct ConsoleLine {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Enqueue an order
    Order {
        /// vip | mobile_order | regular
        priority: Priority,

        /// Customer name (one word)
        customer: String,

        /// Item names, comma separated (e.g. "latte, oat muffin")
        #[arg(trailing_var_arg = true)]
        items: Vec<String>,
    },

    /// Dispatch the next order
    Next,

    /// Start a queued order out of turn
    Start {
        /// Order ID (a leading '#' is accepted)
        id: OrderId,
    },

    /// Complete a preparing order
    #[command(alias = "done")]
    Complete {
        /// Order ID
        id: OrderId,
    },

    /// Cancel a queued or preparing order
    Cancel {
        /// Order ID
        id: OrderId,
    },

    /// Dispatch-ordered snapshot
    Status,

    /// Cumulative counters
    Stats,

    /// Stats, per-class lengths and recent completions
    Analytics,

    /// Active orders for a customer
    Customer {
        /// Customer name
        #[arg(required = true)]
        name: Vec<String>,
    },

    /// Exit the console
    #[command(alias = "exit")]
    Quit,
}

impl Command {
    /// Parse one console line.
    ///
    /// `help` and `--help` come back as a clap error of kind `DisplayHelp`
    /// whose rendering is the generated help text.
    pub fn parse(line: &str) -> std::result::Result<Self, clap::Error> {
        let mut words = line.split_whitespace().map(str::to_string);
        let verb = words.next().map(|verb| verb.to_ascii_lowercase());
        ConsoleLine::try_parse_from(verb.into_iter().chain(words)).map(|parsed| parsed.command)
    }
}

/// Regroup whitespace-split words into comma-separated item names
fn item_list(words: &[String]) -> Vec<String> {
    words
        .join(" ")
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Execute one command and render its output.
///
/// Queue errors come back as `Err` so the caller can report them and
/// keep reading.
pub fn execute(manager: &QueueManager, command: Command) -> Result<String> {
    match command {
        Command::Order {
            priority,
            customer,
            items,
        } => {
            let request = EnqueueRequest::new(customer, item_list(&items), priority);
            let order = manager.enqueue(request)?;
            let message = match order.position_in_queue {
                Some(position) => format!("Order created! You are #{} in queue", position),
                None => "Order created!".to_string(),
            };
            render(&json!({ "order": order, "message": message }))
        }
        Command::Next => match manager.dispatch_next()? {
            Some(order) => render(&order),
            None => render(&json!({ "message": "No orders in queue" })),
        },
        Command::Start { id } => render(&manager.start(id)?),
        Command::Complete { id } => render(&manager.complete(id)?),
        Command::Cancel { id } => render(&manager.cancel(id)?),
        Command::Status => render(&manager.snapshot()),
        Command::Stats => render(&manager.stats()),
        Command::Analytics => render(&manager.analytics()),
        Command::Customer { name } => {
            render(&json!({ "orders": manager.customer_orders(&name.join(" ")) }))
        }
        Command::Quit => Ok(String::new()),
    }
}

fn render<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed to render result")
}
