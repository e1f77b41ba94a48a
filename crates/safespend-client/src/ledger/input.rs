use std::fs;
use std::io::{IsTerminal, Read};
use std::path::Path;

use crate::{ClientError, ClientResult};

pub const STDIN_PATH: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoadedSource {
    pub(crate) label: String,
    pub(crate) content: String,
}

/// Reads a ledger file, or stdin when `path` is `-`.
pub(crate) fn read_source(path: &str, stdin_override: Option<String>) -> ClientResult<LoadedSource> {
    if path == STDIN_PATH {
        let Some(body) = read_stdin(stdin_override)? else {
            return Err(ClientError::invalid_argument_with_recovery(
                "Path `-` means stdin input, but stdin was empty.",
                vec![
                    "Pipe JSON or CSV rows into the command.".to_string(),
                    "Or pass a file path instead of `-`.".to_string(),
                ],
            ));
        };
        return Ok(LoadedSource {
            label: "stdin".to_string(),
            content: body,
        });
    }

    let content = fs::read_to_string(path)
        .map_err(|error| ClientError::source_read_failed(Path::new(path), &error.to_string()))?;
    Ok(LoadedSource {
        label: path.to_string(),
        content,
    })
}

fn read_stdin(stdin_override: Option<String>) -> ClientResult<Option<String>> {
    if let Some(value) = stdin_override {
        return Ok(Some(value).filter(|body| !body.trim().is_empty()));
    }

    if std::io::stdin().is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|error| ClientError::source_read_failed(Path::new(STDIN_PATH), &error.to_string()))?;

    if buffer.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(buffer))
}
