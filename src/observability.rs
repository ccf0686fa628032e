// In: src/observability.rs

//! Logging hooks for the writer.
//!
//! The crate only talks to the `log` facade. Applications pick their own
//! logger; `init_logging` is a convenience that installs `env_logger` with a
//! terse `[LEVEL] message` format. The `log_metric!` macro emits one structured
//! key/value line per call at debug level, so stripe and stream sizes can be
//! inspected without a debugger.

use std::sync::Once;

use log::LevelFilter;

/// Logs a structured key-value metric line at debug level.
///
/// # Example
/// ```
/// use stripe_writer::log_metric;
/// let rows = 4;
/// log_metric!("event"="flush_stripe", "rows"=&rows);
/// ```
#[macro_export]
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        if $crate::__log::log_enabled!(target: "stripe_writer::metric", $crate::__log::Level::Debug) {
            let mut parts = Vec::new();
            $(
                parts.push(format!("\"{}\": \"{}\"", $key, $value));
            )+
            $crate::__log::debug!(
                target: "stripe_writer::metric",
                "METRIC: {{ {} }}",
                parts.join(", ")
            );
        }
    };
}

static INIT_LOGGER: Once = Once::new();

/// Installs an `env_logger` at `level`. Later calls are no-ops, as is the
/// first call when another logger is already installed.
pub fn init_logging(level: LevelFilter) {
    INIT_LOGGER.call_once(|| {
        let mut builder = env_logger::Builder::new();

        builder.is_test(cfg!(test));
        builder.filter_level(level);

        // Custom formatter: just print the level and message
        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{}] {}", record.level(), record.args())
        });

        let _ = builder.try_init();
    });
}
