//! Config validation CLI tool
//!
//! Validates an authwatch configuration file and prints the effective settings.

use authwatch_util::{default_config_path, format_duration};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates an authwatch configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match authwatch_config::load_config(&config_path) {
        Ok(settings) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Auth:");
            println!("  Origin:      {}", settings.auth.origin);
            println!("  Token:       {}", settings.auth.token_path);
            println!("  Logout:      {}", settings.auth.logout_path);
            println!("  Login:       {}", settings.auth.login_path);
            println!(
                "  Return URL:  {}",
                settings.auth.return_url.as_deref().unwrap_or("(origin)")
            );
            println!();
            println!("Credential:");
            println!("  Env var:     {}", settings.credential.env_var);
            if let Some(file) = &settings.credential.cookie_file {
                println!("  Cookie file: {}", file.display());
            }
            println!("  Cookies:     {}", settings.credential.cookie_names.join(", "));
            println!();
            println!("Timing:");
            println!("  Warning lead: {}", format_duration(settings.timing.warning_lead));
            println!("  Cooldown:     {}", format_duration(settings.timing.cooldown));
            println!("  Poll:         {}", format_duration(settings.timing.poll_interval));
            println!(
                "  Retries:      {} x {}ms",
                settings.timing.retry_attempts,
                settings.timing.retry_delay.as_millis()
            );

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                authwatch_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                authwatch_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                authwatch_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                authwatch_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        authwatch_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
