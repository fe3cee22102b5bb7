const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

/// Human readable byte count with two decimals, e.g. `3.50KB`.
///
/// Scales by 1024 while the scaled value is at least 1024 and a larger unit
/// remains; values past petabytes stay in `PB`.
pub fn binary_unit(length: u64) -> String {
    let mut size = length as f64;
    let mut unit_index = 0;

    while size / 1024.0 >= 1.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2}{}", size, UNITS[unit_index])
}
