/// Formats a duration given in samples as `HH:MM:SS.mmm`.
pub fn time_str(samples: u64, sample_rate: u32) -> String {
    if sample_rate == 0 {
        return "--:--:--.---".to_string();
    }

    let ms = samples * 1000 / sample_rate as u64;
    let hours = ms / 3_600_000;
    let minutes = ms % 3_600_000 / 60_000;
    let seconds = ms % 60_000 / 1000;
    let milliseconds = ms % 1000;

    format!(
        "{hours:0width$}:{minutes:02}:{seconds:02}.{milliseconds:03}",
        width = if hours >= 100 { 0 } else { 2 }
    )
}
