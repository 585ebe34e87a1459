//! Working out which robot to connect to.

use std::io::{self, BufRead, Write};

/// Used when the operator just presses Enter at the prompt.
pub const DEFAULT_ADDRESS: &str = "192.168.1.100";

/// Picks the robot address: command line first, then `MISTY_ADDRESS`, then
/// an interactive prompt.
pub fn resolve_address(
    cli: Option<String>,
    env: Option<String>,
    prompt: impl FnOnce() -> io::Result<String>,
) -> io::Result<String> {
    match cli.or(env).filter(|a| !a.trim().is_empty()) {
        Some(address) => Ok(address.trim().to_string()),
        None => prompt(),
    }
}

/// Asks for an address on `output` and reads one line from `input`.
pub fn prompt_for_address(mut input: impl BufRead, mut output: impl Write) -> io::Result<String> {
    write!(
        output,
        "Enter Misty's IP address (or press Enter for {DEFAULT_ADDRESS}): "
    )?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let address = line.trim();
    Ok(if address.is_empty() {
        DEFAULT_ADDRESS.to_string()
    } else {
        address.to_string()
    })
}
