use std::fs;
use std::path::Path;

use crate::error::Error;

pub fn write_string(path: &Path, content: &str) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, content)?;
    Ok(())
}

pub fn read_text(path: &Path) -> Result<String, Error> {
    fs::read_to_string(path)
        .map_err(|e| Error::Format(format!("Unable to read {}: {e}", path.display())))
}
