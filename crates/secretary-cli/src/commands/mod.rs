pub mod config;
pub mod diff;
pub mod parse;
pub mod plan;
pub mod sync;

use secretary_core::error::{CoreError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Read a JSON document from `path`, or stdin when `path` is `-`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = read_input(path)?;
    serde_json::from_str(&content).map_err(|e| CoreError::Input {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

pub fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        Ok(std::io::read_to_string(std::io::stdin())?)
    } else {
        std::fs::read_to_string(path).map_err(|e| CoreError::Input {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
