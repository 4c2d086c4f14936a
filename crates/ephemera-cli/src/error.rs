use colored::Colorize;

pub fn handle_error(err: anyhow::Error) -> ! {
    eprintln!("{} {:#}", "Error:".red().bold(), err);

    let msg = format!("{err:#}").to_lowercase();

    if msg.contains("connection refused") || msg.contains("transport error") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Check that Redis is running and reachable, e.g.:");
        eprintln!("  {} ephemera ping --redis-host <host> --redis-port <port>", "$".dimmed());
    }

    if msg.contains("noauth") || msg.contains("wrongpass") || msg.contains("authentication") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Check the Redis user and password in your config file or");
        eprintln!("  the EPHEMERA_REDIS_USER / EPHEMERA_REDIS_PASSWORD variables.");
    }

    if msg.contains("invalid redis configuration") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Fix the [redis] section of your config file.");
    }

    std::process::exit(1);
}
