//! Parsing of shell input lines.

use filevault_storage::{StorageSize, Tier};

use crate::dispatcher::DispatchError;

/// A parsed shell command with typed arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Add { email: String, tier: Tier },
    Upload { email: String, file: String, size: StorageSize },
    Share { owner: String, receiver: String, file: String },
    MinSpace,
    ListFiles { email: String },
    ListAll,
    Update { owner: String, updater: String, file: String },
    LastUpdate { email: String, file: String },
    Exit,
}

impl ShellCommand {
    /// Parse one input line. Returns `Ok(None)` for a blank line.
    ///
    /// Command names are case-insensitive; arguments past the expected count
    /// are ignored, except for `EXIT`, which must stand alone.
    pub fn parse(line: &str) -> Result<Option<Self>, DispatchError> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };
        let name = name.to_uppercase();
        let mut args = Args { name: &name, words };

        let command = match name.as_str() {
            "ADD" => {
                let email = args.next("email")?;
                let tier = args.next("tier")?.parse::<Tier>()?;
                ShellCommand::Add { email, tier }
            }
            "UPLOAD" => {
                let email = args.next("email")?;
                let file = args.next("fileName")?;
                let raw = args.next("fileSize")?;
                let size = raw
                    .parse::<StorageSize>()
                    .map_err(|_| DispatchError::InvalidSize(raw))?;
                ShellCommand::Upload { email, file, size }
            }
            "SHARE" => ShellCommand::Share {
                owner: args.next("ownerEmail")?,
                receiver: args.next("receiverEmail")?,
                file: args.next("fileName")?,
            },
            "MINSPACE" => ShellCommand::MinSpace,
            "LISTFILES" => ShellCommand::ListFiles {
                email: args.next("email")?,
            },
            "LISTALL" => ShellCommand::ListAll,
            "UPDATE" => ShellCommand::Update {
                owner: args.next("ownerEmail")?,
                updater: args.next("updaterEmail")?,
                file: args.next("fileName")?,
            },
            "LASTUPDATE" => ShellCommand::LastUpdate {
                email: args.next("email")?,
                file: args.next("fileName")?,
            },
            "EXIT" if args.words.next().is_none() => ShellCommand::Exit,
            _ => return Err(DispatchError::UnknownCommand(name.clone())),
        };

        Ok(Some(command))
    }
}

struct Args<'n, I> {
    name: &'n str,
    words: I,
}

impl<'n, 'w, I: Iterator<Item = &'w str>> Args<'n, I> {
    fn next(&mut self, argument: &'static str) -> Result<String, DispatchError> {
        self.words
            .next()
            .map(str::to_string)
            .ok_or_else(|| DispatchError::MissingArgument {
                command: self.name.to_string(),
                argument,
            })
    }
}
