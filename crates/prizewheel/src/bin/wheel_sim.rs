//! # Wheel Simulation
//!
//! Plays funding rounds headless: scripted wallets fill the pool, the
//! countdown runs, the wheel is drawn and a stand-in display confirms
//! each spin. Prints how often every segment won.
//!
//! ## Usage
//!
//! ```bash
//! wheel_sim --rounds 500 --fast --seed 42
//! wheel_sim --config wheel.toml --rounds 20
//! RUST_LOG=debug wheel_sim --rounds 3 --fast
//! ```

use std::time::Instant;

use prizewheel::{fast_timings, init_logging, Simulation, SimulationConfig, WheelConfig};

/// Grace given to a stalled display when the config sets none.
const STALL_GRACE_MS: u64 = 500;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         PRIZEWHEEL SIMULATION                                    ║");
    println!("║         HEADLESS ROUNDS, SCRIPTED WALLETS                        ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    // Parse command line arguments (simple parsing, no external deps)
    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<String> = None;
    let mut settings = SimulationConfig::default();
    let mut seed: Option<u64> = None;
    let mut fast = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--rounds" | "-r" => {
                if i + 1 < args.len() {
                    settings.rounds = args[i + 1].parse().unwrap_or(10);
                    i += 1;
                }
            }
            "--participants" | "-p" => {
                if i + 1 < args.len() {
                    settings.participants = args[i + 1].parse().unwrap_or(8);
                    i += 1;
                }
            }
            "--max-units" | "-m" => {
                if i + 1 < args.len() {
                    settings.max_units_per_purchase = args[i + 1].parse().unwrap_or(25);
                    i += 1;
                }
            }
            "--seed" | "-s" => {
                if i + 1 < args.len() {
                    seed = args[i + 1].parse().ok();
                    i += 1;
                }
            }
            "--stall-every" => {
                if i + 1 < args.len() {
                    settings.stall_every = args[i + 1].parse().ok();
                    i += 1;
                }
            }
            "--fast" | "-f" => fast = true,
            "--help" | "-h" => {
                println!("Usage: wheel_sim [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>        Wheel config TOML (default: built-in wheel)");
                println!("  -r, --rounds <NUM>         Rounds to play (default: 10)");
                println!("  -p, --participants <NUM>   Scripted wallets (default: 8)");
                println!("  -m, --max-units <NUM>      Largest single purchase (default: 25)");
                println!("  -s, --seed <SEED>          Seed wallets and draws for a repeatable run");
                println!("      --stall-every <N>      Display skips every Nth spin confirmation");
                println!("  -f, --fast                 10 ms ticks, 30-50 ms spins");
                println!("  -h, --help                 Show this help");
                return;
            }
            other => eprintln!("   ! Ignoring unknown argument: {}", other),
        }
        i += 1;
    }

    init_logging();

    let mut config = match &config_path {
        Some(path) => match WheelConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("   ✗ FATAL: {}", e);
                std::process::exit(1);
            }
        },
        None => WheelConfig::default(),
    };
    if seed.is_some() {
        config.rng_seed = seed;
        settings.seed = seed;
    }
    if fast {
        config = fast_timings(config);
    }
    if settings.stall_every.is_some() && config.animation_timeout_ms.is_none() {
        config.animation_timeout_ms = Some(STALL_GRACE_MS);
    }

    println!("┌─ CONFIGURATION ─────────────────────────────────────────────────┐");
    println!("│ Config:             {}", config_path.as_deref().unwrap_or("built-in"));
    println!("│ Rounds:             {}", settings.rounds);
    println!("│ Participants:       {}", settings.participants);
    println!("│ Countdown:          {} x {} ms", config.countdown_ticks, config.tick_interval_ms);
    println!(
        "│ Spin:               {}-{} ms",
        config.rotation.min_duration_ms, config.rotation.max_duration_ms
    );
    println!("│ Segments:           {}", config.segments.len());
    match seed {
        Some(s) => println!("│ Seed:               {}", s),
        None => println!("│ Seed:               OS entropy"),
    }
    println!("└─────────────────────────────────────────────────────────────────┘");
    println!();

    let mut simulation = match Simulation::new(config, settings) {
        Ok(simulation) => simulation,
        Err(e) => {
            eprintln!("   ✗ FATAL: {}", e);
            std::process::exit(1);
        }
    };

    let started = Instant::now();
    match simulation.run().await {
        Ok(report) => {
            println!("═══════════════════════════════════════════════════════════════════");
            println!("                         SIMULATION REPORT");
            println!("═══════════════════════════════════════════════════════════════════");
            println!();
            print!("{}", report);
            println!();
            println!("   Elapsed: {:.2?}", started.elapsed());
        }
        Err(e) => {
            eprintln!("   ✗ Simulation stopped: {}", e);
            std::process::exit(1);
        }
    }
}
