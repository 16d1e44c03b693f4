//! User-facing text.

use filevault_storage::{AccountSummary, FileListing};

use crate::dispatcher::DispatchError;

pub const MAIN_PROMPT: &str = "Enter a command: (ADD, UPLOAD, SHARE, MINSPACE, LISTFILES, LISTALL, UPDATE, LASTUPDATE, EXIT)";
pub const ACCOUNT_ADDED: &str = "Account was added.";
pub const FILE_UPLOADED: &str = "File uploaded into account.";
pub const FILE_SHARED: &str = "File was shared.";
pub const FILE_UPDATED: &str = "File was updated.";
pub const EXITING: &str = "Exiting...";
pub const INVALID_COMMAND: &str = "Invalid command.";

pub fn least_free_space(email: &str) -> String {
    format!("Account with least free space: {email}")
}

pub fn last_update(email: &str) -> String {
    format!("Last update: {email}")
}

pub fn file_list(files: &[FileListing]) -> String {
    let mut out = String::from("Account files:");
    for file in files {
        out.push('\n');
        out.push_str(&format!("{} ({} MB)", file.name, file.size));
        if file.received {
            out.push_str(" (shared)");
        }
    }
    out
}

pub fn account_list(accounts: &[AccountSummary]) -> String {
    let mut out = String::from("All accounts:");
    for account in accounts {
        out.push_str(&format!("\n{} ({})", account.email, account.tier));
    }
    out
}

/// Domain errors print their own message; anything the parser rejected is an
/// invalid command.
pub fn render_error(err: &DispatchError) -> String {
    match err {
        DispatchError::Storage(e) => e.to_string(),
        _ => INVALID_COMMAND.to_string(),
    }
}
