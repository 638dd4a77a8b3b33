use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};

use monitor_engine::CodePrompt;

/// Asks the operator for the verification code on the controlling terminal.
///
/// Falls back to stdin when there is no terminal to open.
#[derive(Debug, Default, Clone, Copy)]
pub struct TtyPrompt;

impl CodePrompt for TtyPrompt {
    fn read_code(&self, message: &str) -> io::Result<String> {
        let mut stderr = io::stderr();
        match File::open("/dev/tty") {
            Ok(tty) => ask(&mut stderr, &mut BufReader::new(tty), message),
            Err(_) => ask(&mut stderr, &mut io::stdin().lock(), message),
        }
    }
}

/// Writes `message` verbatim and reads one trimmed line.
fn ask(out: &mut impl Write, input: &mut impl BufRead, message: &str) -> io::Result<String> {
    out.write_all(message.as_bytes())?;
    out.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}
