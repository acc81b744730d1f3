//! Minimal server-sent-events framing for the change feed.
//!
//! The feed uses data-only events: each `data:` line carries one JSON
//! payload, `:` lines are keepalive comments, blank lines separate
//! events. A partial trailing line stays in the buffer until the next
//! network chunk completes it.

/// Pull every complete `data:` payload out of the buffer, leaving any
/// incomplete trailing line in place.
pub(super) fn drain_data_lines(buffer: &mut String) -> Vec<String> {
    let mut payloads = Vec::new();
    while let Some(pos) = buffer.find('\n') {
        let line: String = buffer.drain(..=pos).collect();
        let line = line.trim_end_matches(['\n', '\r']);
        if let Some(data) = line.strip_prefix("data:") {
            let data = data.trim_start();
            if !data.is_empty() {
                payloads.push(data.to_string());
            }
        }
        // Blank separators and `:` keepalives carry nothing.
    }
    payloads
}
