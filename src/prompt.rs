use std::io::{self, BufRead, Write};

use anyhow::{anyhow, bail, Result};

use crate::error::PrefsError;

/// Read one line after printing `prompt`. Returns `default` when the line is empty.
pub fn prompt_line(prompt: &str, default: &str) -> Result<String> {
    let stdin = io::stdin();
    let mut stdin = stdin.lock();
    let mut stderr = io::stderr();

    if default.is_empty() {
        write!(stderr, "{}: ", prompt)?;
    } else {
        write!(stderr, "{} [{}]: ", prompt, default)?;
    }
    stderr.flush()?;

    let mut line = String::new();
    if BufRead::read_line(&mut stdin, &mut line)? == 0 {
        bail!("failed to read line: end of input");
    }
    Ok(line_or_default(&line, default))
}

fn line_or_default(line: &str, default: &str) -> String {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.is_empty() {
        default.to_string()
    } else {
        line.to_string()
    }
}

/// Read a password without echo. End of input reads as an empty password.
///
/// Prompts go to stderr, like every other prompt, so stdout only carries reports.
pub fn read_password(prompt: &str) -> Result<String> {
    use termion::input::TermRead;

    let stdin = io::stdin();
    let mut stdin = stdin.lock();
    let stderr = io::stderr();
    let mut stderr = stderr.lock();

    write!(stderr, "{}: ", prompt)?;
    stderr.flush()?;
    let password = stdin
        .read_passwd(&mut stderr)
        .map_err(|err| anyhow!("failed to read password: {}", err))?;
    writeln!(stderr)?;
    stderr.flush()?;

    Ok(password.unwrap_or_default())
}

/// Ask for a password twice until both answers agree. An empty first answer skips
/// the confirmation and yields `None`.
pub fn prompt_password(prompt: &str, confirm_prompt: &str) -> Result<Option<String>> {
    loop {
        let password = read_password(prompt)?;
        if password.is_empty() {
            return Ok(None);
        }

        let confirm_password = read_password(confirm_prompt)?;
        if confirm_password == password {
            return Ok(Some(password));
        }
        eprintln!("{}", PrefsError::PasswordMismatch);
    }
}
