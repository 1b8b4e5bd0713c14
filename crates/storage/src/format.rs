/// Binary unit names, largest last.
const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Human-readable size using 1024-based units.
///
/// Values are rounded to two decimals with trailing zeros dropped, so `1536`
/// renders as `"1.5 KB"` and `1024` as `"1 KB"`. Zero is exactly `"0 B"`.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut exponent = 0;
    let mut divisor = 1u64;
    while exponent < UNITS.len() - 1 && bytes / divisor >= 1024 {
        divisor *= 1024;
        exponent += 1;
    }

    let scaled = format!("{:.2}", bytes as f64 / divisor as f64);
    let trimmed = scaled.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[exponent])
}
