/// Format a byte count for display
///
/// 1024-based with two decimal places, e.g.:
/// - 512           -> "512.00 B"
/// - 1024          -> "1.00 KB"
/// - 1_572_864     -> "1.50 MB"
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    // Values that would round up to 1024.00 move to the next unit.
    const LIMIT: f64 = 1024.0 - 0.005;

    let mut size = bytes as f64;
    for unit in UNITS {
        if size < LIMIT {
            return format!("{:.2} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.2} TB", size)
}
