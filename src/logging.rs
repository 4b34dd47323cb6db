use std::{
    path::PathBuf,
    sync::{LazyLock, OnceLock},
};

use directories::ProjectDirs;
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter,
    filter::Directive,
    fmt::{self},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::{app::cli::LogLevel, errors::AppError};

pub const DATA_ENV_VAR: &str = "THREADPANEL_DATA";
pub const LOG_FILE_NAME: &str = "threadpanel.log";

/// Overrides the data directory when `THREADPANEL_DATA` is set.
pub static DATA_FOLDER: LazyLock<Option<PathBuf>> =
    LazyLock::new(|| std::env::var_os(DATA_ENV_VAR).map(PathBuf::from));
static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

pub fn project_directory() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "threadpanel", "threadpanel")
}

/// Directory holding the log file and saved drafts.
pub fn get_data_dir() -> &'static PathBuf {
    DATA_DIR.get_or_init(|| {
        if let Some(dir) = DATA_FOLDER.clone() {
            dir
        } else if let Some(proj_dirs) = project_directory() {
            proj_dirs.data_local_dir().to_path_buf()
        } else {
            PathBuf::from(".").join(".data")
        }
    })
}

pub fn init(level: LogLevel) -> Result<(), AppError> {
    let data_dir = get_data_dir();
    std::fs::create_dir_all(data_dir)?;
    let log_file = std::fs::File::create(data_dir.join(LOG_FILE_NAME))?;
    let file_subscriber = fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_writer(log_file)
        .with_target(true)
        .with_ansi(false);
    let filter = EnvFilter::builder()
        .with_default_directive(Directive::try_from(level)?)
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(filter)
        .with(file_subscriber)
        .with(ErrorLayer::default())
        .try_init()?;

    Ok(())
}
