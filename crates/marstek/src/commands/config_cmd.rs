//! `marstek config` -- config file and credential management.

use marstek_config::{config_path, load_config_or_default, save_config, store_password, Config};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match &args.command {
        ConfigCommand::Path => {
            output::print_output(&config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => show(global),

        ConfigCommand::Init { email } => init(email, global),

        ConfigCommand::SetPassword { email, password } => {
            set_password(email.as_deref(), password.as_deref(), global)
        }
    }
}

fn show(global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = load_config_or_default();
    if cfg.password.is_some() {
        cfg.password = Some("<redacted>".into());
    }
    let rendered = toml::to_string_pretty(&cfg).map_err(marstek_config::ConfigError::from)?;
    output::print_output(rendered.trim_end(), global.quiet);
    Ok(())
}

fn init(email: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = Config {
        email: Some(email.to_owned()),
        ..Config::default()
    };
    save_config(&cfg)?;
    output::print_output(
        &format!(
            "Wrote {}\nStore the password with: marstek config set-password",
            config_path().display()
        ),
        global.quiet,
    );
    Ok(())
}

fn set_password(
    email: Option<&str>,
    password: Option<&str>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let cfg = load_config_or_default();
    let email = email
        .map(str::to_owned)
        .or_else(|| global.email.clone())
        .or(cfg.email)
        .ok_or(CliError::Validation {
            field: "email".into(),
            reason: "no account email given (use --email or config init)".into(),
        })?;
    let password = password.ok_or(CliError::Validation {
        field: "password".into(),
        reason: "no password given (use --password or MARSTEK_PASSWORD)".into(),
    })?;

    store_password(&email, password)?;
    output::print_output(&format!("Password stored in keyring for {email}"), global.quiet);
    Ok(())
}
