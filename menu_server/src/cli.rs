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
    // MENU_JWT_SECRET and MENU_OWNER_PASSWORD are deliberately left out
    const DISPLAY_ENVS: [&str; 10] = [
        "RUST_LOG",
        "MENU_HOST",
        "MENU_PORT",
        "MENU_DATABASE_URL",
        "MENU_DB_MAX_CONNECTIONS",
        "MENU_STRICT_TRANSITIONS",
        "MENU_PRICING_POLICY",
        "MENU_EVENT_BUFFER",
        "MENU_OWNER_USERNAME",
        "MENU_JWT_SECRET_IS_SET",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match name {
            "MENU_JWT_SECRET_IS_SET" => env::var("MENU_JWT_SECRET").map(|_| "yes".to_string()).or(Ok("no".into())),
            _ => env::var(name),
        };
        let val = match val {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
