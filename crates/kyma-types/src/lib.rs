pub mod config_file;
pub mod defaults;

#[cfg(feature = "events")]
pub mod event;
