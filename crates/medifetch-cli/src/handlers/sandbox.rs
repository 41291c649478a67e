//! `sandbox` command: runs the Extractor binary directly with the given
//! arguments and echoes its output. Bypasses the queue entirely -- a
//! debugging aid, not part of the download engine.

use anyhow::Result;
use tokio::process::Command;

pub async fn execute(extractor_bin: &str, args: &[String]) -> Result<()> {
    let output = Command::new(extractor_bin).args(args).output().await?;

    print!("{}", String::from_utf8_lossy(&output.stdout));
    eprint!("{}", String::from_utf8_lossy(&output.stderr));

    if !output.status.success() {
        anyhow::bail!("extractor exited with code {:?}", output.status.code());
    }
    Ok(())
}
