//! Duration normalization
//!
//! Output is always milliseconds as a float. Input encodings across the
//! supported report formats: bare numbers (assumed seconds), suffixed
//! strings ("2.5s", "150ms"), and the TRX clock format "H:MM:SS.fraction".

/// Parse a JUnit-style duration value into milliseconds.
///
/// Bare numbers are seconds; "ms"/"s" suffixes are honored. Unparseable
/// input is 0.0.
pub fn suffixed_ms(value: &str) -> f64 {
    let text = value.trim().to_lowercase();
    if let Some(ms) = text.strip_suffix("ms") {
        return ms.parse().unwrap_or(0.0);
    }
    if let Some(secs) = text.strip_suffix('s') {
        return secs.parse::<f64>().map(|s| s * 1000.0).unwrap_or(0.0);
    }
    text.parse::<f64>().map(|s| s * 1000.0).unwrap_or(0.0)
}

/// Parse a TRX clock duration ("0:00:01.234") into milliseconds.
///
/// Anything other than exactly three colon-separated parts falls back to
/// the bare-number heuristic.
pub fn trx_ms(value: &str) -> f64 {
    let text = value.trim();
    let parts: Vec<&str> = text.split(':').collect();
    if parts.len() != 3 {
        return ambiguous_numeric_ms(text);
    }

    let (Ok(hours), Ok(minutes), Ok(seconds)) = (
        parts[0].parse::<f64>(),
        parts[1].parse::<f64>(),
        parts[2].parse::<f64>(),
    ) else {
        return 0.0;
    };

    (hours * 3600.0 + minutes * 60.0 + seconds) * 1000.0
}

/// Bare-number heuristic used by the TRX format only: values below 1000
/// are assumed seconds, at/above assumed already-milliseconds.
///
/// A run lasting 1000+ seconds would misclassify here; this mirrors the
/// format's documented handling and is deliberately left as-is.
fn ambiguous_numeric_ms(text: &str) -> f64 {
    let Ok(value) = text.parse::<f64>() else {
        return 0.0;
    };
    if value < 1000.0 {
        value * 1000.0
    } else {
        value
    }
}
