// File: ./src/logging.rs
// Desktop logger setup (terminal + log file). Android uses android_logger in mobile.rs.
use crate::context::AppContext;
use anyhow::Result;
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};
use std::fs::File;

/// Logs at `level` to stderr and at debug level to the context's log file.
/// The file logger is skipped if the file cannot be created.
pub fn init(ctx: &dyn AppContext, level: LevelFilter) -> Result<()> {
    let config = ConfigBuilder::new()
        .add_filter_allow_str("fetchlist")
        .set_target_level(LevelFilter::Off)
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    if let Some(path) = ctx.get_log_file_path() {
        match File::create(&path) {
            Ok(file) => loggers.push(WriteLogger::new(LevelFilter::Debug, config, file)),
            Err(e) => eprintln!("Cannot open log file {}: {}", path.display(), e),
        }
    }

    CombinedLogger::init(loggers)?;
    Ok(())
}
