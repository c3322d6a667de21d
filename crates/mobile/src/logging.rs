use std::{panic::PanicHookInfo, sync::Once};

use tracing_subscriber::{
    filter::FilterFn, fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Install the tracing subscriber once; later calls are no-ops.
pub(crate) fn setup_logging() {
    static LOGGING_SETUP: Once = Once::new();

    LOGGING_SETUP.call_once(|| {
        let filter =
            FilterFn::new(|meta| meta.module_path().unwrap_or_default().starts_with("treasure_hunt"));

        #[cfg(target_os = "android")]
        {
            use tracing_logcat::{LogcatMakeWriter, LogcatTag};

            let tag = LogcatTag::Fixed("TreasureHunt-Rust".to_owned());
            match LogcatMakeWriter::new(tag) {
                Ok(writer) => {
                    let layer = tracing_subscriber::fmt::layer()
                        .event_format(Format::default().with_level(false).without_time())
                        .with_writer(writer)
                        .with_ansi(false);
                    let _ = tracing_subscriber::registry()
                        .with(layer)
                        .with(filter)
                        .try_init();
                }
                Err(error) => eprintln!("failed to initialize logcat writer: {error}"),
            }
        }

        #[cfg(not(target_os = "android"))]
        {
            let layer = tracing_subscriber::fmt::layer()
                .event_format(Format::default().without_time())
                .with_writer(std::io::stderr)
                .with_ansi(false);
            let _ = tracing_subscriber::registry()
                .with(layer)
                .with(filter)
                .try_init();
        }
    })
}

pub(crate) fn panic_hook(info: &PanicHookInfo) {
    let backtrace = std::backtrace::Backtrace::force_capture();
    tracing::error!("{info}\n{backtrace}");
}
