use std::io::{BufRead, Write};

use anyhow::{anyhow, Result};
use thiserror::Error;

use crate::auth::Credentials;

pub const MIN_INTERVAL_SECS: u64 = 10;
pub const MAX_INTERVAL_SECS: u64 = 3600;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntervalError {
    #[error("interval must be a whole number of seconds, got {0:?}")]
    NotANumber(String),
    #[error(
        "interval must be between {min} and {max} seconds, got {0}",
        min = MIN_INTERVAL_SECS,
        max = MAX_INTERVAL_SECS
    )]
    OutOfRange(u64),
}

pub fn parse_interval(raw: &str) -> Result<u64, IntervalError> {
    let trimmed = raw.trim();
    let secs = trimmed
        .parse::<u64>()
        .map_err(|_| IntervalError::NotANumber(trimmed.to_string()))?;
    if !(MIN_INTERVAL_SECS..=MAX_INTERVAL_SECS).contains(&secs) {
        return Err(IntervalError::OutOfRange(secs));
    }
    Ok(secs)
}

/// Prints `label`, reads one line and strips the line ending. EOF is an error.
pub fn prompt_line<R: BufRead, W: Write>(input: &mut R, output: &mut W, label: &str) -> Result<String> {
    write!(output, "{label}")?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(anyhow!("input closed while waiting for {}", label.trim()));
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Asks for a username (unless one is given) and a password. Blank answers are asked again.
pub fn prompt_credentials<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    username: Option<&str>,
) -> Result<Credentials> {
    let username = match username.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => name.to_string(),
        None => prompt_non_empty(input, output, "学号: ")?.trim().to_string(),
    };
    let password = prompt_non_empty(input, output, "密码: ")?;
    Ok(Credentials { username, password })
}

fn prompt_non_empty<R: BufRead, W: Write>(input: &mut R, output: &mut W, label: &str) -> Result<String> {
    loop {
        let answer = prompt_line(input, output, label)?;
        if !answer.trim().is_empty() {
            return Ok(answer);
        }
    }
}

pub fn prompt_interval<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<u64> {
    loop {
        let answer = prompt_line(
            input,
            output,
            &format!("轮询间隔（{MIN_INTERVAL_SECS}-{MAX_INTERVAL_SECS} 秒）: "),
        )?;
        match parse_interval(&answer) {
            Ok(secs) => return Ok(secs),
            Err(err) => writeln!(output, "{err}")?,
        }
    }
}
