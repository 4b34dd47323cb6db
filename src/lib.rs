pub mod app;
pub mod attachment;
pub mod clipboard;
pub mod drafts;
pub mod errors;
pub mod logging;
pub mod source;
pub mod ui;
