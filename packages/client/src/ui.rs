//! UI utilities for the client.

use std::io::Write;

/// Prompt shown while waiting for input
pub fn prompt(room: &str) -> String {
    format!("#{}> ", room)
}

/// Redisplay the prompt after receiving a message
pub fn redisplay_prompt(room: &str) {
    print!("{}", prompt(room));
    std::io::stdout().flush().ok();
}
