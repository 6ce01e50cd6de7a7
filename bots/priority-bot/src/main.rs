use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use sushigo::prelude::*;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "priority-bot",
    version,
    about = "Plays Sushi Go against a game server using a fixed card priority"
)]
struct Cli {
    /// Game server host
    host: String,

    /// Game server port
    port: u16,

    /// Game to join
    game_id: String,

    /// Name to join under
    player_name: String,

    /// Give up on a connect attempt after this many milliseconds
    #[arg(long, default_value_t = 5_000)]
    connect_timeout_ms: u64,

    /// Consecutive failed reconnects before giving up
    #[arg(long, default_value_t = 5)]
    max_reconnects: u32,

    /// Log filter, e.g. `debug` or `sushigo=trace` (default: RUST_LOG, then `info`)
    #[arg(long)]
    log: Option<String>,

    /// Print the final summary as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn client(&self) -> ClientBuilder {
        ClientBuilder::new()
            .host(&self.host)
            .port(self.port)
            .game(&self.game_id)
            .player_name(&self.player_name)
            .connect_timeout(Duration::from_millis(self.connect_timeout_ms))
            .backoff(BackoffConfig::with_max_attempts(self.max_reconnects))
    }
}

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

/// Best card first. Everything at or above `Sashimi` is worth doubling up
/// on with chopsticks.
const PRIORITY: [&str; 12] = [
    "Squid Nigiri",
    "Salmon Nigiri",
    "Maki Roll (3)",
    "Maki Roll (2)",
    "Tempura",
    "Sashimi",
    "Dumpling",
    "Wasabi",
    "Egg Nigiri",
    "Pudding",
    "Maki Roll (1)",
    "Chopsticks",
];

const CHOPSTICKS_WORTHY: usize = 6;
const NIGIRI: [&str; 3] = ["Squid Nigiri", "Salmon Nigiri", "Egg Nigiri"];

struct PriorityStrategy;

impl PriorityStrategy {
    /// Hand positions ordered by priority; unknown cards last.
    fn ranked(hand: &[&str]) -> Vec<(usize, usize)> {
        let mut ranked: Vec<(usize, usize)> = hand
            .iter()
            .enumerate()
            .map(|(i, card)| {
                let rank = PRIORITY.iter().position(|p| p == card).unwrap_or(PRIORITY.len());
                (rank, i)
            })
            .collect();
        ranked.sort_unstable();
        ranked
    }
}

fn find(hand: &[&str], card: &str) -> Option<usize> {
    hand.iter().position(|c| *c == card)
}

impl Strategy for PriorityStrategy {
    fn choose_card(&self, hand: &[&str], ctx: &DecisionContext<'_>) -> usize {
        // Early in a hand, set up combos for later turns.
        if !ctx.has_unused_wasabi && hand.len() > 3 {
            if let Some(i) = find(hand, "Wasabi") {
                return i;
            }
        }
        if !ctx.has_chopsticks && hand.len() > 2 {
            if let Some(i) = find(hand, "Chopsticks") {
                return i;
            }
        }
        if ctx.has_unused_wasabi {
            if let Some(i) = NIGIRI.iter().find_map(|n| find(hand, n)) {
                return i;
            }
        }
        Self::ranked(hand).first().map_or(0, |&(_, i)| i)
    }

    fn choose_chopsticks(
        &self,
        hand: &[&str],
        _ctx: &DecisionContext<'_>,
    ) -> Option<(usize, usize)> {
        match Self::ranked(hand).as_slice() {
            [(r1, first), (r2, second), ..]
                if *r1 < CHOPSTICKS_WORTHY && *r2 < CHOPSTICKS_WORTHY =>
            {
                Some((*first, *second))
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn init_tracing(filter: Option<&str>) {
    let filter = filter
        .and_then(|f| EnvFilter::try_new(f).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_summary(summary: &GameSummary, json: bool) {
    if json {
        match serde_json::to_string_pretty(summary) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                tracing::warn!(error = %e, "could not encode summary as JSON");
                println!("{summary}");
            }
        }
    } else {
        println!("{summary}");
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log.as_deref());

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupted");
                shutdown.cancel();
            }
        }
    });

    let client = match cli.client().shutdown(shutdown).build(PriorityStrategy) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    match client.run().await {
        Ok(Outcome::GameEnded(summary)) => {
            print_summary(&summary, cli.json);
            ExitCode::SUCCESS
        }
        Ok(Outcome::Cancelled) => ExitCode::from(130),
        Err(failure) => {
            eprintln!("error: {failure}");
            ExitCode::FAILURE
        }
    }
}
