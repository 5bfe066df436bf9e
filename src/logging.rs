use std::path::Path;

pub const LOG_FILE_BASENAME: &str = "cloud-todo";
pub const LOG_FILE_SUFFIX: &str = "log";
pub const LOG_ROTATE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
pub const LOG_ROTATE_KEEP_FILES: usize = 10;
pub const LOG_ENV: &str = "CLOUD_TODO_LOG";

pub fn log_directory(app_data_dir: &Path) -> &Path {
    app_data_dir
}

pub fn default_log_spec() -> &'static str {
    if cfg!(debug_assertions) {
        "warn,cloud_todo_lib=debug,cloud_todo=debug"
    } else {
        "warn,cloud_todo_lib=info,cloud_todo=info"
    }
}

/// `CLOUD_TODO_LOG`, then `RUST_LOG`, then the configured spec, then the default.
pub fn resolve_log_spec(
    lookup: impl Fn(&str) -> Option<String>,
    configured: Option<&str>,
) -> String {
    let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
    non_empty(lookup(LOG_ENV))
        .or_else(|| non_empty(lookup("RUST_LOG")))
        .or_else(|| non_empty(configured.map(str::to_string)))
        .unwrap_or_else(|| default_log_spec().to_string())
}

#[cfg(feature = "app")]
pub fn init_logging(
    app_data_dir: &Path,
    configured: Option<&str>,
) -> Result<flexi_logger::LoggerHandle, flexi_logger::FlexiLoggerError> {
    use flexi_logger::{
        detailed_format, Cleanup, Criterion, Duplicate, FileSpec, Logger, Naming, WriteMode,
    };

    std::fs::create_dir_all(app_data_dir)?;

    let spec = resolve_log_spec(|name| std::env::var(name).ok(), configured);

    let handle = Logger::try_with_str(spec)?
        .log_to_file(
            FileSpec::default()
                .directory(log_directory(app_data_dir))
                .basename(LOG_FILE_BASENAME)
                .suffix(LOG_FILE_SUFFIX),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .format_for_files(detailed_format)
        .rotate(
            Criterion::Size(LOG_ROTATE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(LOG_ROTATE_KEEP_FILES),
        )
        // Warnings also reach the terminal; the CLI prints its own results on stdout.
        .duplicate_to_stderr(if cfg!(debug_assertions) {
            Duplicate::Info
        } else {
            Duplicate::Warn
        })
        .start()?;

    install_panic_hook();

    log::info!(
        "logger initialized dir={} rotate_size_bytes={} keep_files={}",
        log_directory(app_data_dir).display(),
        LOG_ROTATE_SIZE_BYTES,
        LOG_ROTATE_KEEP_FILES
    );
    Ok(handle)
}

#[cfg(feature = "app")]
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info: &std::panic::PanicHookInfo<'_>| {
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| info.payload().downcast_ref::<String>().map(|s| s.as_str()))
            .unwrap_or("<non-string panic payload>");
        let location = info
            .location()
            .map(|loc| format!("{loc}"))
            .unwrap_or_else(|| "<unknown>".to_string());
        let backtrace = std::backtrace::Backtrace::force_capture();

        log::error!("panic: payload={payload} location={location}\nbacktrace:\n{backtrace}");
        default_hook(info);
    }));
}
