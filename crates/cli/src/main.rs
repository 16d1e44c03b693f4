use anyhow::Context;

use filevault_cli::{Shell, ShellConfig};

fn main() -> anyhow::Result<()> {
    let config = ShellConfig::from_env().context("failed to read configuration")?;
    filevault_observability::init(config.log_format, &config.log_filter);

    let shell = Shell::new(config);
    let stdin = std::io::stdin();
    shell
        .run(stdin.lock(), std::io::stdout().lock())
        .context("shell I/O failed")?;

    Ok(())
}
