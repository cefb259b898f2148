//!
//! Setup logging subsystem.
//!

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use super::config;

/// Keeps the non-blocking console writer alive; logs stop flushing once it is dropped.
#[derive(Debug)]
pub struct TelemetryGuard {
    _log_guards: Vec<WorkerGuard>,
}

/// Installs the global subscriber. `crates_to_watch` get the configured console level, every
/// other target is limited to `WARN` unless `filtering_directive` or `RUST_LOG` says otherwise.
pub fn setup<Str: AsRef<str>>(
    conf: &config::Log,
    crates_to_watch: impl IntoIterator<Item = Str>,
) -> Result<TelemetryGuard, tracing_subscriber::util::TryInitError> {
    let mut guards = Vec::new();
    let subscriber = tracing_subscriber::registry();

    if !conf.console.enabled {
        subscriber.try_init()?;
        return Ok(TelemetryGuard {
            _log_guards: guards,
        });
    }

    let (console_writer, guard) = tracing_appender::non_blocking(std::io::stdout());
    guards.push(guard);

    let console_filter = get_envfilter(
        conf.console.filtering_directive.as_ref(),
        conf.console.level.into_level(),
        crates_to_watch,
    );

    match conf.console.log_format {
        config::LogFormat::Default => {
            let logging_layer = fmt::layer()
                .with_span_events(fmt::format::FmtSpan::ACTIVE)
                .pretty()
                .with_writer(console_writer)
                .with_filter(console_filter);
            subscriber.with(logging_layer).try_init()?;
        }
        config::LogFormat::Json => {
            let logging_layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_writer(console_writer)
                .with_filter(console_filter);
            subscriber.with(logging_layer).try_init()?;
        }
    }

    Ok(TelemetryGuard {
        _log_guards: guards,
    })
}

fn get_envfilter<Str: AsRef<str>>(
    filtering_directive: Option<&String>,
    default_log_level: tracing::Level,
    crates_to_watch: impl IntoIterator<Item = Str>,
) -> EnvFilter {
    filtering_directive
        .map(|filter| {
            EnvFilter::builder()
                .with_default_directive(default_log_level.into())
                .parse_lossy(filter)
        })
        .unwrap_or_else(|| {
            let directive = crates_to_watch
                .into_iter()
                .map(|crate_name| format!("{}={default_log_level}", crate_name.as_ref()))
                .fold(tracing::Level::WARN.to_string(), |directive, watched| {
                    format!("{directive},{watched}")
                });

            EnvFilter::builder()
                .with_default_directive(tracing::Level::WARN.into())
                .parse_lossy(directive)
        })
}
