pub mod alert;
pub mod auth;
pub mod config;
pub mod grading;
pub mod output;
pub mod portal;
pub mod prompt;
pub mod records;
pub mod snapshot;
pub mod watch;
