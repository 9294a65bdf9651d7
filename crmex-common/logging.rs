use anyhow::Result;
use std::io::Write;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_error::ErrorLayer;
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Initializes logging and returns worker guard that will flush logs on drop.\
/// Logs go to a daily rolling file inside `log_dir` if it is provided, to stdout otherwise.
pub fn initialize(app_name: &str, log_dir: Option<&Path>) -> Result<WorkerGuard> {
    let writer: Box<dyn Write + Send> = match log_dir {
        Some(dir) => Box::new(tracing_appender::rolling::daily(dir, format!("{app_name}.log"))),
        None => Box::new(std::io::stdout()),
    };
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(writer);

    let timer = time::format_description::parse("[year]-[month padding:zero]-[day padding:zero] [hour]:[minute]:[second]")?;
    let time_offset = time::UtcOffset::current_local_offset().unwrap_or(time::UtcOffset::UTC);
    let timer = tracing_subscriber::fmt::time::OffsetTime::new(time_offset, timer);

    let env_filter = tracing_subscriber::filter::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::filter::EnvFilter::new(default_filter(app_name)));

    #[cfg(debug_assertions)]
    let fmt_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_thread_ids(true)
        .with_timer(timer)
        .with_ansi(log_dir.is_none())
        .with_writer(non_blocking_writer)
        .with_filter(env_filter);

    #[cfg(not(debug_assertions))]
    let fmt_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(true)
        .with_timer(timer)
        .with_ansi(false)
        .with_writer(non_blocking_writer)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(ErrorLayer::default())
        .try_init()?;

    Ok(guard)
}

/// Returns `warn` filter with the `info` level for the application and its library crates.
fn default_filter(app_name: &str) -> String {
    let crate_name = app_name.replace('-', "_");
    format!("warn,{crate_name}=info,{crate_name}_kube=info,{crate_name}_metrics=info")
}
