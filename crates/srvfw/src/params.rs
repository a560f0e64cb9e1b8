// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command line parameter handling.
//!
//! Servers take `/Key=Value` style parameters. The framework consumes
//! `/Port=` and `/Max=`; everything else starting with `/` is collected,
//! in order, for the derived server. Arguments not starting with `/`
//! are fatal.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamError {
    #[error("Bad value for the {what} parameter: {given}")]
    BadValue { what: &'static str, given: String },

    #[error("Unknown argument: {0}")]
    NotAnOption(String),
}

/// Parameters recognized by the framework plus the ordered remainder.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ParsedParams {
    /// `/Port=` override for the admin listen port.
    pub port: Option<u16>,
    /// `/Max=` maximum concurrent admin clients, not yet clamped.
    pub max_clients: Option<u32>,
    /// Unrecognized `/Key=Value` pairs, in command line order.
    pub others: Vec<(String, String)>,
}

/// Case-insensitive check for a `/Name=` prefix, returning the value.
fn strip_prefix_ci<'a>(arg: &'a str, prefix: &str) -> Option<&'a str> {
    match arg.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => Some(&arg[prefix.len()..]),
        _ => None,
    }
}

/// Parse the argument list (without the program name).
pub fn parse<I>(args: I) -> Result<ParsedParams, ParamError>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = ParsedParams::default();

    for arg in args {
        if let Some(val) = strip_prefix_ci(&arg, "/Port=") {
            let port: u16 = val
                .parse()
                .ok()
                .filter(|p| *p != 0)
                .ok_or(ParamError::BadValue { what: "admin port", given: arg.clone() })?;
            parsed.port = Some(port);
        } else if let Some(val) = strip_prefix_ci(&arg, "/Max=") {
            let max: u32 = val
                .parse()
                .map_err(|_| ParamError::BadValue { what: "maximum clients", given: arg.clone() })?;
            parsed.max_clients = Some(max);
        } else if let Some(rest) = arg.strip_prefix('/') {
            let (key, val) = match rest.split_once('=') {
                Some((k, v)) => (k.trim().to_string(), v.trim().to_string()),
                None => (rest.trim().to_string(), String::new()),
            };
            parsed.others.push((key, val));
        } else {
            return Err(ParamError::NotAnOption(arg));
        }
    }

    Ok(parsed)
}

#[cfg(test)]
#[path = "params_tests.rs"]
mod tests;
