use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;

use crate::error::ShepherdError;

/// 启动检测窗口：窗口内退出视为启动失败，窗口结束仍在运行视为成功
pub const LAUNCH_TIMEOUT: Duration = Duration::from_secs(1);

/// 由注册表独占的外部工具进程
///
/// 进程本身由后台监护任务持有，这里只保留终止通道。
#[derive(Debug)]
pub struct ToolProcess {
    pid: Option<u32>,
    command_line: String,
    kill_tx: Option<oneshot::Sender<()>>,
}

impl ToolProcess {
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// 启动时使用的完整命令行
    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    /// 发送终止信号，不等待进程真正退出
    pub fn terminate(&mut self) {
        if let Some(kill_tx) = self.kill_tx.take() {
            if kill_tx.send(()).is_err() {
                log::debug!("Process {:?} already exited", self.pid);
            }
        }
    }
}

pub struct Launcher {
    timeout: Duration,
}

impl Launcher {
    pub fn new() -> Self {
        Self::with_timeout(LAUNCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// 启动外部命令，并与检测窗口赛跑
    ///
    /// 窗口内退出（无论退出码）返回 `ShepherdError::Launch`，内容为合并后的输出；
    /// 窗口结束仍在运行则返回进程句柄。慢启动后失败的工具不在此检测范围内。
    pub async fn launch(&self, program: &Path, args: &[String]) -> Result<ToolProcess, ShepherdError> {
        let command_line = command_line(program, args);
        log::debug!("Launching: {}", command_line);

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ShepherdError::Launch(format!("failed to start {}: {}", program.display(), e)))?;

        let pid = child.id();
        let (exit_tx, exit_rx) = oneshot::channel();
        let (kill_tx, kill_rx) = oneshot::channel();
        tokio::spawn(supervise(child, program.display().to_string(), exit_tx, kill_rx));

        match tokio::time::timeout(self.timeout, exit_rx).await {
            Ok(Ok(output)) => Err(ShepherdError::Launch(output)),
            Ok(Err(_)) => Err(ShepherdError::Launch(format!(
                "{} supervisor stopped unexpectedly",
                program.display()
            ))),
            Err(_) => {
                log::debug!("Process {:?} still running after {:?}", pid, self.timeout);
                Ok(ToolProcess {
                    pid,
                    command_line,
                    kill_tx: Some(kill_tx),
                })
            }
        }
    }
}

impl Default for Launcher {
    fn default() -> Self {
        Self::new()
    }
}

/// 可执行文件 + 空格拼接的参数
pub fn command_line(program: &Path, args: &[String]) -> String {
    let mut line = program.display().to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

/// 监护任务：持有子进程直到其退出或收到终止信号
///
/// 退出时把合并输出交给 `exit_tx`；检测窗口过后接收端已丢弃，发送失败即可忽略。
/// `kill_rx` 的发送端被丢弃同样视为终止。
async fn supervise(
    mut child: Child,
    program: String,
    exit_tx: oneshot::Sender<String>,
    mut kill_rx: oneshot::Receiver<()>,
) {
    let pid = child.id();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let exited = tokio::select! {
        (status, out, err) = async {
            tokio::join!(child.wait(), read_pipe(stdout), read_pipe(stderr))
        } => Some((status, out, err)),
        _ = &mut kill_rx => None,
    };

    match exited {
        Some((status, out, err)) => {
            let output = combined_output(&program, status, &out, &err);
            if exit_tx.send(output).is_err() {
                log::info!("{} (pid {:?}) exited after startup", program, pid);
            }
        }
        None => {
            if let Err(e) = child.start_kill() {
                log::warn!("Failed to kill {}: {}", program, e);
                return;
            }
            // 回收僵尸进程
            let _ = child.wait().await;
            log::debug!("{} (pid {:?}) terminated", program, pid);
        }
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf).await;
    }
    buf
}

fn combined_output(
    program: &str,
    status: std::io::Result<ExitStatus>,
    stdout: &[u8],
    stderr: &[u8],
) -> String {
    let mut output = String::from_utf8_lossy(stdout).into_owned();
    output.push_str(&String::from_utf8_lossy(stderr));
    if !output.is_empty() {
        return output;
    }
    match status {
        Ok(status) => format!("{} exited early: {}", program, status),
        Err(e) => format!("{} exited early: {}", program, e),
    }
}
