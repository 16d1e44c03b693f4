//! Routes parsed commands to the ledger and turns results into replies.

use thiserror::Error;

use filevault_core::StorageError;
use filevault_storage::AccountLedger;

use crate::command::ShellCommand;
use crate::messages;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The first word is not a known command.
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    /// Too few arguments for the command.
    #[error("{command}: missing argument {argument}")]
    MissingArgument {
        command: String,
        argument: &'static str,
    },
    /// A size argument was not a whole number of megabytes.
    #[error("invalid file size: {0}")]
    InvalidSize(String),
    /// The ledger rejected the operation.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Text to show for one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Message(String),
    /// Final reply; the shell stops after printing it.
    Exit(String),
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Reply::Message(text) | Reply::Exit(text) => text,
        }
    }

    pub fn is_exit(&self) -> bool {
        matches!(self, Reply::Exit(_))
    }
}

/// Run one command against the ledger.
pub fn execute(ledger: &mut AccountLedger, command: &ShellCommand) -> Result<Reply, StorageError> {
    let text = match command {
        ShellCommand::Add { email, tier } => {
            ledger.create_account(email, *tier)?;
            messages::ACCOUNT_ADDED.to_string()
        }
        ShellCommand::Upload { email, file, size } => {
            ledger.upload(email, file, *size)?;
            messages::FILE_UPLOADED.to_string()
        }
        ShellCommand::Share {
            owner,
            receiver,
            file,
        } => {
            ledger.share(owner, receiver, file)?;
            messages::FILE_SHARED.to_string()
        }
        ShellCommand::MinSpace => messages::least_free_space(ledger.least_free_space_account()?.as_str()),
        ShellCommand::ListFiles { email } => messages::file_list(&ledger.list_files(email)?),
        ShellCommand::ListAll => messages::account_list(&ledger.list_all_accounts()),
        ShellCommand::Update {
            owner,
            updater,
            file,
        } => {
            ledger.update_file(owner, updater, file)?;
            messages::FILE_UPDATED.to_string()
        }
        ShellCommand::LastUpdate { email, file } => {
            messages::last_update(ledger.last_update_info(email, file)?.as_str())
        }
        ShellCommand::Exit => return Ok(Reply::Exit(messages::EXITING.to_string())),
    };
    Ok(Reply::Message(text))
}

/// Parse and run one input line. Returns `None` for a blank line.
///
/// Failures never escape: they are rendered into the reply text.
pub fn dispatch_line(ledger: &mut AccountLedger, line: &str) -> Option<Reply> {
    let result = ShellCommand::parse(line).and_then(|command| match command {
        Some(command) => execute(ledger, &command).map(Some).map_err(DispatchError::from),
        None => Ok(None),
    });

    match result {
        Ok(reply) => reply,
        Err(err) => {
            tracing::debug!(error = %err, line, "command failed");
            Some(Reply::Message(messages::render_error(&err)))
        }
    }
}
