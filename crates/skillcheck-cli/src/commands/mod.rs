pub mod init;
pub mod list_sinks;
pub mod simulate;
