//! `filevault` command shell: turns text lines into ledger operations and
//! renders the outcome as text.

pub mod command;
pub mod config;
pub mod dispatcher;
pub mod messages;
pub mod shell;

pub use command::ShellCommand;
pub use config::ShellConfig;
pub use dispatcher::{DispatchError, Reply, dispatch_line};
pub use shell::Shell;
