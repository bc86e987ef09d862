use std::fmt::Write;

/// Format elapsed seconds as `m:ss` with cumulative minutes.
pub fn format_clock(total_secs: i64) -> String {
    let mut out = String::with_capacity(5);
    write_clock(&mut out, total_secs);
    out
}

pub fn write_clock(buf: &mut String, total_secs: i64) {
    buf.clear();
    let secs = total_secs.max(0);
    let minutes = secs / 60;
    let seconds = secs % 60;
    let _ = write!(buf, "{minutes}:{seconds:02}");
}
