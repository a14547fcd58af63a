//! Control signals for the interactive loop
//!
//! Merges keyboard commands read from stdin and Ctrl+C into one channel.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Control signals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// Enter: start if idle, stop if recording
    Toggle,
    /// Ctrl+C: cancel a recording, or exit when idle
    Interrupt,
    /// `q`: quit
    Quit,
    /// stdin was closed
    EndOfInput,
}

/// Map one line of keyboard input to a signal
pub fn parse_line(line: &str) -> Option<ControlSignal> {
    match line.trim().to_ascii_lowercase().as_str() {
        "" => Some(ControlSignal::Toggle),
        "q" | "quit" | "exit" => Some(ControlSignal::Quit),
        _ => None,
    }
}

/// Receives control signals from stdin and Ctrl+C
pub struct ControlSignalHandler {
    receiver: mpsc::Receiver<ControlSignal>,
}

impl ControlSignalHandler {
    /// Start listening on stdin and for Ctrl+C
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(10);

        let tx_int = tx.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                tracing::debug!("received Ctrl+C");
                if tx_int.send(ControlSignal::Interrupt).await.is_err() {
                    break;
                }
            }
        });

        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => match parse_line(&line) {
                        Some(signal) => {
                            if tx.send(signal).await.is_err() {
                                break;
                            }
                        }
                        None => tracing::debug!(input = %line.trim(), "ignoring unknown command"),
                    },
                    Ok(None) | Err(_) => {
                        let _ = tx.send(ControlSignal::EndOfInput).await;
                        break;
                    }
                }
            }
        });

        Self { receiver: rx }
    }

    /// Wait for the next signal
    pub async fn recv(&mut self) -> Option<ControlSignal> {
        self.receiver.recv().await
    }
}

impl Default for ControlSignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_toggles() {
        assert_eq!(parse_line(""), Some(ControlSignal::Toggle));
        assert_eq!(parse_line("   \r"), Some(ControlSignal::Toggle));
    }

    #[test]
    fn quit_words() {
        assert_eq!(parse_line("q"), Some(ControlSignal::Quit));
        assert_eq!(parse_line("Quit"), Some(ControlSignal::Quit));
        assert_eq!(parse_line("exit\n"), Some(ControlSignal::Quit));
    }

    #[test]
    fn other_input_is_ignored() {
        assert_eq!(parse_line("record"), None);
    }
}
