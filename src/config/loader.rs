//! One-shot execution of the configuration source.
//!
//! The config is an executable that writes protocol lines to stdout; the
//! lines are fed through the same dispatch path as socket commands.
use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::errors::Result;

/// The outcome of one configuration run.
#[derive(Debug)]
pub struct ConfigRun {
    /// Protocol lines the source produced, in order.
    pub lines: Vec<String>,
    /// The non-zero exit code, if the source failed after (or while)
    /// producing output. Lines already produced are still applied.
    pub failed: Option<i32>,
}

/// Execute the config source and collect its protocol lines.
///
/// # Errors
///
/// Errors only when the source cannot be spawned at all; a source that
/// starts and then exits non-zero is reported through [`ConfigRun::failed`].
pub async fn run_once(path: &Path) -> Result<ConfigRun> {
    let mut child = Command::new(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()?;

    let stdout = child.stdout.take().expect("stdout was piped");
    let mut lines = Vec::new();
    let mut reader = BufReader::new(stdout).lines();
    while let Some(line) = reader.next_line().await? {
        let line = line.trim().to_string();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        lines.push(line);
    }

    let status = child.wait().await?;
    let failed = match status.code() {
        Some(0) => None,
        Some(code) => Some(code),
        None => Some(-1),
    };
    Ok(ConfigRun { lines, failed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    use crate::utils::test::temp_path;

    async fn write_script(content: &str) -> std::path::PathBuf {
        let path = temp_path().await.unwrap();
        tokio::fs::write(&path, content).await.unwrap();
        let mut perms = tokio::fs::metadata(&path).await.unwrap().permissions();
        perms.set_mode(0o755);
        tokio::fs::set_permissions(&path, perms).await.unwrap();
        path
    }

    #[tokio::test]
    async fn lines_are_collected_in_order() {
        let script = write_script(
            "#!/bin/sh\n\
             echo 'set-gap 10'\n\
             echo '# a comment'\n\
             echo\n\
             echo 'bind Mod4-Return \"spawn xterm\"'\n",
        )
        .await;
        let run = run_once(&script).await.unwrap();
        assert_eq!(run.failed, None);
        assert_eq!(run.lines, vec![
            "set-gap 10".to_string(),
            "bind Mod4-Return \"spawn xterm\"".to_string(),
        ]);
    }

    #[tokio::test]
    async fn partial_output_survives_a_failing_source() {
        let script = write_script("#!/bin/sh\necho 'set-gap 4'\nexit 3\n").await;
        let run = run_once(&script).await.unwrap();
        assert_eq!(run.lines, vec!["set-gap 4".to_string()]);
        assert_eq!(run.failed, Some(3));
    }

    #[tokio::test]
    async fn missing_config_is_an_error() {
        let err = run_once(Path::new("/nonexistent/mywm-config")).await;
        assert!(err.is_err());
    }
}
