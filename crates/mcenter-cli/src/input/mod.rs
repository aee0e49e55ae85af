pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Structured input from `--input`, falling back to piped stdin.
///
/// Returns `None` when neither is present so the caller can build the input
/// from flags instead.
pub fn load<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return Ok(Some(file::read_input(path)?));
    }
    stdin::read_stdin()
}

/// Unwrap a flag that is mandatory when no input document is given.
pub fn required<T>(value: Option<T>, flag: &str) -> Result<T, Box<dyn std::error::Error>> {
    value.ok_or_else(|| format!("--{flag} is required (or provide --input)").into())
}
