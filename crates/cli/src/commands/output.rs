//! Result rendering shared by all commands.

use anyhow::Result;
use bumo_client::error::codes;
use bumo_client::{ClientError, Envelope, SdkError};
use bumo_core::{CryptoError, EncodingError, SigningError, ValidationError};
use colored::Colorize;
use serde::Serialize;

/// Print `value` wrapped in a success envelope.
pub fn print_json<T: Serialize>(value: T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&Envelope::ok(value))?);
    Ok(())
}

/// Envelope code for an error raised anywhere in the SDK.
pub fn error_code(e: &anyhow::Error) -> i64 {
    if let Some(e) = e.downcast_ref::<SdkError>() {
        e.code()
    } else if let Some(e) = e.downcast_ref::<ClientError>() {
        e.code()
    } else if let Some(e) = e.downcast_ref::<ValidationError>() {
        e.code()
    } else if let Some(e) = e.downcast_ref::<EncodingError>() {
        e.code()
    } else if let Some(e) = e.downcast_ref::<SigningError>() {
        e.code()
    } else if let Some(e) = e.downcast_ref::<CryptoError>() {
        e.code()
    } else {
        codes::SYSTEM_ERROR
    }
}

pub fn report_error(json: bool, e: &anyhow::Error) {
    if json {
        let env: Envelope<()> = Envelope::error(error_code(e), format!("{:#}", e));
        match serde_json::to_string_pretty(&env) {
            Ok(s) => println!("{}", s),
            Err(_) => eprintln!("Error: {:#}", e),
        }
    } else {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
    }
}
