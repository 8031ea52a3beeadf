pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;
use tracing::debug;

/// Load a command's input from `--input`, or from piped stdin when no file is
/// given. `Ok(None)` means neither was supplied and the caller should fall
/// back to its flags.
pub fn load<T: DeserializeOwned>(path: Option<&str>) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        debug!(path, "reading input file");
        return Ok(Some(file::read_input(path)?));
    }
    match stdin::read_stdin()? {
        Some(value) => {
            debug!("reading piped input");
            Ok(Some(serde_json::from_value(value)?))
        }
        None => Ok(None),
    }
}
