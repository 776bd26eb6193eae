// Human-readable byte counts for diagnostics and demo output.

const KB: u64 = 1024;
const MB: u64 = 1024 * KB;
const GB: u64 = 1024 * MB;
const TB: u64 = 1024 * GB;

/// One-decimal rendering with 1024-step units, e.g. `512.0KB`.
pub fn format_byte_size(bytes: u64) -> String {
    match bytes {
        0..KB => format!("{:.1}B", bytes as f64),
        KB..MB => format!("{:.1}KB", bytes as f64 / KB as f64),
        MB..GB => format!("{:.1}MB", bytes as f64 / MB as f64),
        GB..TB => format!("{:.1}GB", bytes as f64 / GB as f64),
        _ => format!("{:.1}TB", bytes as f64 / TB as f64),
    }
}
