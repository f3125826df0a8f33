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
    // Be explicit about which envars to print, so as to avoid accidentally exposing the gateway passwords
    const DISPLAY_ENVS: [&str; 17] = [
        "RUST_LOG",
        "STORE_HOST",
        "STORE_PORT",
        "STORE_DATABASE_URL",
        "STORE_RUN_MIGRATIONS",
        "STORE_USE_X_FORWARDED_FOR",
        "STORE_USE_FORWARDED",
        "STORE_ROBOKASSA_MERCHANT_LOGIN",
        "STORE_ROBOKASSA_TEST_MODE",
        "STORE_ROBOKASSA_RESULT_URL",
        "STORE_ROBOKASSA_SUCCESS_URL",
        "STORE_ROBOKASSA_FAIL_URL",
        "STORE_ROBOKASSA_ENDPOINT",
        "STORE_ROBOKASSA_CULTURE",
        "STORE_ROBOKASSA_IP_WHITELIST",
        "STORE_INVOICE_ID_STRATEGY",
        "STORE_LEGACY_ENTITLEMENT_ORDER",
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
