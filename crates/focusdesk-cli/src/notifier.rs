use std::io::Write;

use focusdesk_core::NotificationSink;

/// Prints notifications to stderr and rings the terminal bell.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalNotifier;

impl NotificationSink for TerminalNotifier {
    fn notify(&self, title: &str, body: &str) {
        eprintln!("[{title}] {body}");
    }

    fn chime(&self) {
        let mut err = std::io::stderr();
        let _ = err.write_all(b"\x07");
        let _ = err.flush();
    }
}
