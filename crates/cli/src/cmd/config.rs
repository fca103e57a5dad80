//! Configuration inspection command
//!
//! Prints the effective configuration (file + flags + defaults) or an
//! example file to start from.

use anyhow::Result;
use owo_colors::OwoColorize;
use reload_core::config::example_config;
use reload_core::ReloaderConfig;
use std::path::Path;

/// Show the effective configuration
pub async fn run_show(config: &ReloaderConfig, source: Option<&Path>) -> Result<()> {
    println!("{}", "Agent Reloader Configuration".bold());
    match source {
        Some(path) => println!("{}: {}\n", "Location".dimmed(), path.display().dimmed()),
        None => println!("{}: {}\n", "Location".dimmed(), "(built-in defaults)".dimmed()),
    }

    println!("{}", "[watch]".yellow());
    println!("  {} = {}", "path".cyan(), config.watch.path.display());
    println!("  {} = {:?}", "suffix".cyan(), config.watch.suffix);
    println!(
        "  {} = {} {}",
        "debounce_ms".cyan(),
        config.watch.debounce_ms,
        format!("({:?})", config.debounce_delay()).dimmed()
    );

    println!("\n{}", "[service]".yellow());
    println!("  {} = {}", "unit".cyan(), config.service.unit);
    println!("  {} = {}", "process_pattern".cyan(), config.service.process_pattern);
    println!("  {} = {}", "signal".cyan(), config.service.signal);
    println!(
        "  {} = {} {}",
        "command_timeout_secs".cyan(),
        config.service.command_timeout_secs,
        if config.service.command_timeout_secs == 0 {
            "(no timeout)".dimmed().to_string()
        } else {
            format!("({}s)", config.service.command_timeout_secs).dimmed().to_string()
        }
    );
    println!("  {} = {}", "serialize_reloads".cyan(), config.service.serialize_reloads);

    println!("\n{}", "[log]".yellow());
    println!("  {} = {}", "level".cyan(), config.log.level);
    println!(
        "  {} = {}",
        "file".cyan(),
        config
            .log
            .file
            .as_ref()
            .map(|file| file.display().to_string())
            .unwrap_or_else(|| "(stderr)".to_string())
    );

    println!("\n{}", "Reload chain:".bold());
    println!("  1. systemctl daemon-reload {}", "(best effort)".dimmed());
    println!("  2. systemctl restart {}", config.service.unit);
    println!(
        "  3. pkill -{} -f {}",
        config.service.signal, config.service.process_pattern
    );

    Ok(())
}

/// Print an example configuration file
pub async fn run_example() -> Result<()> {
    print!("{}", example_config());
    Ok(())
}
