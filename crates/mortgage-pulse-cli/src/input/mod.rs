pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Load a typed request from `--input <file>` or, failing that, piped stdin.
pub fn load<T: DeserializeOwned>(path: Option<&str>, what: &str) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        file::read_json(path)
    } else if let Some(value) = stdin::read_stdin()? {
        Ok(serde_json::from_value(value)?)
    } else {
        Err(format!("--input <file.json> or stdin required for {what}").into())
    }
}
