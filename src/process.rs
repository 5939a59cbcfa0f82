use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;

use crate::error::{Error, Result};

pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Captured result of an external command that exited successfully.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Renders a command line for logs and error messages.
pub fn describe(cmd: &Command) -> String {
    let std_cmd = cmd.as_std();
    let mut parts = vec![std_cmd.get_program().to_string_lossy().into_owned()];
    parts.extend(std_cmd.get_args().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}

/// How long to keep draining a killed command's pipes. Children of the
/// command may keep them open after it is gone.
const DRAIN_GRACE: Duration = Duration::from_millis(100);

type Captured = Arc<Mutex<Vec<u8>>>;

/// Copies everything from `pipe` into a shared buffer, so whatever was read
/// is still available when the reader has to be abandoned.
fn capture<R>(pipe: Option<R>) -> (Captured, JoinHandle<()>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let captured = Captured::default();
    let sink = Arc::clone(&captured);
    let task = tokio::spawn(async move {
        let Some(mut pipe) = pipe else {
            return;
        };
        let mut chunk = [0u8; 4096];
        loop {
            match pipe.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => sink
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .extend_from_slice(&chunk[..n]),
            }
        }
    });
    (captured, task)
}

fn captured_text(captured: &Captured) -> String {
    let bytes = captured.lock().unwrap_or_else(|e| e.into_inner());
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Runs `cmd` to completion, killing it when `timeout` passes.
///
/// A spawn failure, a timeout and a non-zero exit all map to
/// [`Error::ExternalTool`], carrying whatever the command wrote to stderr.
pub async fn run_with_timeout(mut cmd: Command, timeout: Duration) -> Result<CommandOutput> {
    let command = describe(&cmd);

    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|e| Error::ExternalTool {
        command: command.clone(),
        reason: format!("unable to start: {e}"),
        stderr: String::new(),
    })?;

    let (stdout, mut stdout_task) = capture(child.stdout.take());
    let (stderr, mut stderr_task) = capture(child.stderr.take());

    let finished = tokio::time::timeout(timeout, async {
        let status = child.wait().await?;
        let _ = (&mut stdout_task).await;
        let _ = (&mut stderr_task).await;
        Ok::<_, std::io::Error>(status)
    })
    .await;

    let status = match finished {
        Ok(status) => status?,
        Err(_) => {
            if let Err(e) = child.kill().await {
                tracing::warn!("unable to kill {command}: {e}");
            }
            let _ = tokio::time::timeout(DRAIN_GRACE, &mut stderr_task).await;
            stdout_task.abort();
            stderr_task.abort();
            return Err(Error::ExternalTool {
                command,
                reason: format!("timed out after {}s", timeout.as_secs_f32()),
                stderr: captured_text(&stderr).trim().to_string(),
            });
        }
    };

    let captured = CommandOutput {
        status: status.code(),
        stdout: captured_text(&stdout),
        stderr: captured_text(&stderr),
    };
    if !status.success() {
        return Err(Error::ExternalTool {
            command,
            reason: format!("exited with {status}"),
            stderr: captured.stderr.trim().to_string(),
        });
    }

    Ok(captured)
}
