use std::{io, path::Path};

use anyhow::{Context, Result};
use ipcstream::{FileInputStream, InputStream};

/// Open `input` as an IPC byte source; `-` reads standard input.
pub fn open_input(input: &str) -> Result<Box<dyn InputStream>> {
    if input == "-" {
        log::debug!("reading IPC stream from stdin");
        return Ok(Box::new(FileInputStream::new(io::stdin().lock())));
    }
    let stream = FileInputStream::open(Path::new(input))
        .with_context(|| format!("failed to open {input}"))?;
    Ok(Box::new(stream))
}
