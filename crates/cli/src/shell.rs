//! Read-eval-print loop over any line source.

use std::io::{self, BufRead, Write};

use filevault_storage::SharedLedger;

use crate::config::ShellConfig;
use crate::dispatcher::dispatch_line;
use crate::messages;

pub struct Shell {
    ledger: SharedLedger,
    config: ShellConfig,
}

impl Shell {
    /// A shell over a fresh, empty ledger.
    pub fn new(config: ShellConfig) -> Self {
        Self::with_ledger(SharedLedger::default(), config)
    }

    pub fn with_ledger(ledger: SharedLedger, config: ShellConfig) -> Self {
        Self { ledger, config }
    }

    pub fn ledger(&self) -> &SharedLedger {
        &self.ledger
    }

    /// Process lines until `EXIT` or end of input. Every reply is followed by
    /// a blank line.
    pub fn run<R: BufRead, W: Write>(&self, input: R, mut output: W) -> io::Result<()> {
        tracing::info!(prompt = self.config.show_prompt, "shell started");
        let mut lines = input.lines();
        let mut handled = 0usize;

        loop {
            if self.config.show_prompt {
                writeln!(output, "{}", messages::MAIN_PROMPT)?;
                output.flush()?;
            }

            let Some(line) = lines.next() else {
                break;
            };
            let line = line?;

            let Some(reply) = self.ledger.with(|ledger| dispatch_line(ledger, &line)) else {
                continue;
            };
            handled += 1;

            writeln!(output, "{}", reply.text())?;
            writeln!(output)?;
            output.flush()?;

            if reply.is_exit() {
                break;
            }
        }

        tracing::info!(commands = handled, "shell stopped");
        Ok(())
    }
}
