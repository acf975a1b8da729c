//! Output formatting and logging utilities

use std::fmt;
use std::fs::File;
use std::time::SystemTime as StdSystemTime;
use tracing::info;
use tracing_subscriber::{
    filter::LevelFilter, fmt::format::Writer, fmt::layer, fmt::time::FormatTime,
    layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry,
};

/// Custom time formatter that shows only seconds
struct SecondPrecisionTimer;

impl FormatTime for SecondPrecisionTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        let total_seconds = StdSystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let hours = (total_seconds / 3600) % 24;
        let minutes = (total_seconds / 60) % 60;
        let seconds = total_seconds % 60;

        write!(w, "{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

/// Map the integer verbosity onto a tracing level.
pub fn level_filter(verbose: i32) -> LevelFilter {
    match verbose {
        i32::MIN..=0 => LevelFilter::ERROR,
        1..=2 => LevelFilter::WARN,
        3..=4 => LevelFilter::INFO,
        5..=6 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Setup output logging to file or stdout
pub fn setup_output(output_path: Option<&String>, verbose: i32) {
    let level = level_filter(verbose);
    match output_path {
        Some(path) => {
            if let Ok(log) = File::create(path) {
                let file_layer = layer()
                    .with_writer(log)
                    .with_timer(SecondPrecisionTimer)
                    .with_ansi(false)
                    .with_filter(level);
                Registry::default().with(file_layer).init();
                info!("Output will be written to: {}", path);
            } else {
                eprintln!("Could not create output file: {}", path);
            }
        }
        None => {
            let stdout_layer = layer()
                .with_writer(std::io::stdout)
                .with_timer(SecondPrecisionTimer)
                .with_ansi(true)
                .with_filter(level);
            Registry::default().with(stdout_layer).init();
            info!("Output will be printed to stdout");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::level_filter;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level_filter(-3), LevelFilter::ERROR);
        assert_eq!(level_filter(0), LevelFilter::ERROR);
        assert_eq!(level_filter(2), LevelFilter::WARN);
        assert_eq!(level_filter(4), LevelFilter::INFO);
        assert_eq!(level_filter(5), LevelFilter::DEBUG);
        assert_eq!(level_filter(9), LevelFilter::TRACE);
    }
}
