//! Main Entrypoint for Simon Says
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Initializing logging.
//! 3. Resolving the robot's address (argument, environment, or prompt).
//! 4. Running one game session. The first Ctrl+C cancels it cleanly, a
//!    second one quits without waiting for the robot to reset.
//! 5. Printing the final score.

use anyhow::Context;
use clap::Parser;
use misty_client::{MistyClient, MistyConfig};
use simon_core::{GameConfig, SessionController, SessionEnd};
use simon_service::{
    address::{prompt_for_address, resolve_address},
    config::Config,
    interrupt::Interrupts,
};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "simon", version, about = "Play Simon Says with a Misty robot")]
struct Args {
    /// Robot address (host or host:port). Falls back to MISTY_ADDRESS, then a prompt.
    address: Option<String>,
}

fn print_rules(game: &GameConfig) {
    let rule = "=".repeat(50);
    println!("\n{rule}");
    println!("SIMON SAYS - TOUCH SENSORS ONLY");
    println!("{rule}");
    println!("\nHow to play:");
    println!("1. Misty will give you commands");
    println!(
        "2. Only follow commands that start with '{}'",
        game.authorization_phrase
    );
    println!(
        "3. If she doesn't say '{}', DON'T touch!",
        game.authorization_phrase
    );
    let sensors: Vec<&str> = game
        .sensor_catalog
        .entries()
        .iter()
        .map(|entry| entry.phrase.as_str())
        .collect();
    println!("4. Use the touch sensors: {}", sensors.join(", "));
    println!("5. Get {} correct to win!", game.win_threshold);
    println!("{rule}");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded.");

    print_rules(&config.game);

    // --- 3. Resolve the Robot ---
    let address = resolve_address(args.address, config.address.clone(), || {
        prompt_for_address(std::io::stdin().lock(), std::io::stdout())
    })
    .context("Failed to read the robot address")?;
    println!("\nConnecting to Misty at {address}...");

    let device = Arc::new(
        MistyClient::new(MistyConfig::new(address.clone()))
            .with_context(|| format!("Invalid robot address '{address}'"))?,
    );

    // --- 4. Play ---
    let controller = SessionController::new(device, config.game.clone())
        .context("Invalid game configuration")?;
    info!(
        %address,
        win_threshold = config.game.win_threshold,
        timeout_secs = config.game.response_timeout.as_secs_f64(),
        probability = config.game.authorization_probability,
        "Starting session..."
    );
    let interrupts = Interrupts::from_ctrl_c();
    let report = tokio::select! {
        report = controller.run(interrupts.nth(1)) => report,
        () = interrupts.nth(2) => {
            warn!("Second interrupt received; quitting before the robot finished resetting");
            println!("\nQuit before Misty finished resetting.");
            return Ok(());
        }
    };

    // --- 5. Report ---
    let rule = "=".repeat(50);
    match &report.end {
        SessionEnd::Won => println!("\nCONGRATULATIONS! YOU WIN!"),
        SessionEnd::Lost => println!("\nGAME OVER"),
        SessionEnd::Cancelled => println!("\nGame interrupted by user."),
        SessionEnd::Aborted(reason) => {
            println!("\nError during game: {reason}");
            println!("Make sure Misty is powered on and connected to your network.");
        }
    }
    println!("{rule}");
    println!("FINAL SCORE: {}/{}", report.score, report.win_threshold);
    println!("{rule}");
    println!("\nGoodbye!");

    info!(end = ?report.end, score = report.score, "Session has ended.");
    Ok(())
}
