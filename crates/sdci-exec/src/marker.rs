//! Marker chunks framing a run's output stream.
//!
//! A stream reads: [`SEPARATOR`], [`running`], raw output lines, optionally
//! [`TIMEOUT_REACHED`], [`truncated`] when a slow reader lost lines, and finally [`exited`].

pub const SEPARATOR: &str = "\n**********\n";

pub const TIMEOUT_REACHED: &str = "TIMEOUT REACHED";

/// Resolved command line announcement.
pub fn running(argv: &[String]) -> String {
    format!("RUNNING: {argv:?}")
}

/// Closing marker carrying the final exit code.
pub fn exited(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("{SEPARATOR}\nEXITED ({code})"),
        None => format!("{SEPARATOR}\nEXITED (None)"),
    }
}

/// Lines dropped because the reader fell behind.
pub fn truncated(dropped: u64) -> String {
    format!("OUTPUT TRUNCATED ({dropped} lines)")
}

pub fn read_failed(err: &std::io::Error) -> String {
    format!("OUTPUT READ FAILED: {err}")
}
