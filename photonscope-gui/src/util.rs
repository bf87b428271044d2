//! Numeric conversion and formatting utilities for photonscope-gui.

/// Convert u64 to f64 with allowed precision loss.
#[allow(clippy::cast_precision_loss)]
pub fn u64_to_f64(value: u64) -> f64 {
    value as f64
}

/// Format a number with comma separators for readability.
#[must_use]
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Format a duration in seconds with a readable unit.
#[must_use]
pub fn format_seconds(seconds: f64) -> String {
    let magnitude = seconds.abs();
    if magnitude >= 60.0 {
        format!("{:.1} min", seconds / 60.0)
    } else if magnitude >= 1.0 {
        format!("{seconds:.3} s")
    } else if magnitude >= 1e-3 {
        format!("{:.3} ms", seconds * 1e3)
    } else {
        format!("{:.3} µs", seconds * 1e6)
    }
}
