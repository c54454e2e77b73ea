use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 16] = [
        "RUST_LOG",
        "BPS_HOST",
        "BPS_PORT",
        "BPS_DATABASE_URL",
        "BPS_DOWNSTREAM_TIMEOUT_MS",
        "BPS_OUTBOX_INTERVAL_SECS",
        "BPS_OUTBOX_MAX_ATTEMPTS",
        "BPS_OUTBOX_BATCH_SIZE",
        "PAYOS_CLIENT_ID",
        "PAYOS_API_URL",
        "PAYOS_RETURN_URL",
        "PAYOS_WEBHOOK_URL",
        "PAYOS_SIGNATURE_CHECKS",
        "PAYOS_TIMEOUT_MS",
        "ORDER_SERVICE_URL",
        "CART_SERVICE_URL",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
