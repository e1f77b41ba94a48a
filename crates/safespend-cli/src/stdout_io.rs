use std::io::{self, Write};

/// Writes help text verbatim. A closed pipe (`safespend ... | head`) is not
/// an error.
pub fn write_stdout_text(text: &str) -> io::Result<()> {
    write_tolerating_closed_pipe(&mut io::stdout().lock(), &[text.as_bytes()])
}

pub fn write_stdout_line(text: &str) -> io::Result<()> {
    write_tolerating_closed_pipe(&mut io::stdout().lock(), &[text.as_bytes(), b"\n"])
}

fn write_tolerating_closed_pipe<W: Write>(writer: &mut W, chunks: &[&[u8]]) -> io::Result<()> {
    let result = chunks
        .iter()
        .try_for_each(|chunk| writer.write_all(chunk))
        .and_then(|()| writer.flush());
    match result {
        Err(error) if error.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}
