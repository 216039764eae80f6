use std::{
    io::{self, Write},
    process::{Command, Stdio},
};

use tracing::debug;

use crate::services::{ClipboardSink, ServiceError};

const CANDIDATES: &[(&str, &[&str])] = &[
    ("pbcopy", &[]),
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
];

/// Pipes text into the first clipboard helper found on `PATH`.
#[derive(Debug, Clone, Default)]
pub struct CommandClipboard;

impl CommandClipboard {
    pub fn new() -> Self {
        Self
    }
}

fn pipe_to(program: &str, args: &[&str], text: &str) -> io::Result<bool> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes())?;
    }
    Ok(child.wait()?.success())
}

impl ClipboardSink for CommandClipboard {
    fn write(&self, text: &str) -> Result<(), ServiceError> {
        for (program, args) in CANDIDATES {
            match pipe_to(program, args, text) {
                Ok(true) => {
                    debug!(program, bytes = text.len(), "copied to clipboard");
                    return Ok(());
                }
                Ok(false) => {
                    return Err(ServiceError::io(format!("{program} exited with an error")));
                }
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => {
                    return Err(ServiceError::io(format!("{program}: {err}")));
                }
            }
        }
        Err(ServiceError::Unavailable("clipboard"))
    }
}
