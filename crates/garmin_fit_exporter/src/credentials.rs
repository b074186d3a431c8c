//! Credential resolution: command line, then environment, then prompt.

use crate::{ExportError, ExportResult};
use garmin_connect_client::Credentials;
use secrecy::{ExposeSecret, SecretString};
use std::io::{self, BufRead, Write};

pub const USERNAME_ENV: &str = "GARMIN_USERNAME";
pub const PASSWORD_ENV: &str = "GARMIN_PASSWORD";

/// Source of interactive answers.
pub trait Prompter {
    fn prompt_line(&mut self, prompt: &str) -> io::Result<String>;
    fn prompt_hidden(&mut self, prompt: &str) -> io::Result<SecretString>;
}

/// Reads from the controlling terminal; the password is not echoed.
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn prompt_line(&mut self, prompt: &str) -> io::Result<String> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{prompt}")?;
        stdout.flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line)
    }

    fn prompt_hidden(&mut self, prompt: &str) -> io::Result<SecretString> {
        rpassword::prompt_password(prompt).map(|p| SecretString::new(p.into()))
    }
}

pub fn resolve_credentials(
    cli_username: Option<String>,
    cli_password: Option<String>,
    prompter: &mut dyn Prompter,
) -> ExportResult<Credentials> {
    resolve_credentials_with(cli_username, cli_password, |k| std::env::var(k).ok(), prompter)
}

/// Testable helper that reads environment values using the provided function.
pub fn resolve_credentials_with<F>(
    cli_username: Option<String>,
    cli_password: Option<String>,
    mut get: F,
    prompter: &mut dyn Prompter,
) -> ExportResult<Credentials>
where
    F: FnMut(&str) -> Option<String>,
{
    let username = match non_empty(cli_username).or_else(|| non_empty(get(USERNAME_ENV))) {
        Some(u) => u,
        None => prompter.prompt_line("Garmin username: ")?,
    };
    let username = username.trim().to_string();
    if username.is_empty() {
        return Err(ExportError::Credentials("username must not be empty".into()));
    }

    let password = match non_empty(cli_password).or_else(|| non_empty(get(PASSWORD_ENV))) {
        Some(p) => SecretString::new(p.into()),
        None => prompter.prompt_hidden("Garmin password: ")?,
    };
    let trimmed = password.expose_secret().trim();
    if trimmed.is_empty() {
        return Err(ExportError::Credentials("password must not be empty".into()));
    }
    let password = SecretString::new(trimmed.into());

    tracing::debug!(%username, "resolved Garmin credentials");
    Ok(Credentials::new(username, password))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
