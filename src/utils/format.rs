pub struct FormatUtils;

impl FormatUtils {
    pub fn format_size(size: u64) -> String {
        const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Ratio in [0, 1] rendered as a percentage with one decimal.
    pub fn format_percent(ratio: f64) -> String {
        format!("{:.1}%", ratio * 100.0)
    }
}
