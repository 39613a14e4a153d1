use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context};

use crate::models::ToolKind;

/// Go 工具链中 pprof 与 trace 的绝对路径
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub pprof: PathBuf,
    pub trace: PathBuf,
}

impl ToolPaths {
    pub fn program(&self, kind: ToolKind) -> &Path {
        match kind {
            ToolKind::Pprof | ToolKind::PprofDiff => &self.pprof,
            ToolKind::Trace => &self.trace,
        }
    }
}

/// 确定工具路径：显式指定优先，其余在 `$GOROOT/pkg/tool/<goos>_<goarch>` 下查找
pub fn discover(pprof: Option<PathBuf>, trace: Option<PathBuf>) -> anyhow::Result<ToolPaths> {
    if let (Some(pprof), Some(trace)) = (&pprof, &trace) {
        return Ok(ToolPaths {
            pprof: pprof.clone(),
            trace: trace.clone(),
        });
    }

    let tool_dir = goroot()?.join("pkg").join("tool").join(go_platform());
    log::info!("Looking for go tools in {}", tool_dir.display());

    let pprof = match pprof {
        Some(path) => path,
        None => find_tool(&tool_dir, "pprof")?
            .with_context(|| format!("pprof binary not found in {}", tool_dir.display()))?,
    };
    let trace = match trace {
        Some(path) => path,
        None => find_tool(&tool_dir, "trace")?
            .with_context(|| format!("trace binary not found in {}", tool_dir.display()))?,
    };

    Ok(ToolPaths { pprof, trace })
}

fn goroot() -> anyhow::Result<PathBuf> {
    if let Some(root) = env::var_os("GOROOT").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(root));
    }

    let output = Command::new("go")
        .args(["env", "GOROOT"])
        .output()
        .context("GOROOT is not set and `go env GOROOT` could not run")?;
    let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if !output.status.success() || root.is_empty() {
        bail!("GOROOT is not set and `go env GOROOT` returned nothing");
    }
    Ok(PathBuf::from(root))
}

/// Rust 平台名映射为 Go 的 `GOOS_GOARCH`
fn go_platform() -> String {
    let os = match env::consts::OS {
        "macos" => "darwin",
        other => other,
    };
    let arch = match env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        "powerpc64" => "ppc64",
        "loongarch64" => "loong64",
        other => other,
    };
    format!("{}_{}", os, arch)
}

/// 目录中第一个文件名以 `prefix` 开头的文件（按文件名排序）
fn find_tool(dir: &Path, prefix: &str) -> anyhow::Result<Option<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(prefix))
        .map(|entry| entry.path())
        .collect();
    candidates.sort();

    Ok(candidates.into_iter().next())
}
