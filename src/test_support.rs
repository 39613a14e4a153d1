use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tempfile::TempDir;

use crate::services::launcher::Launcher;
use crate::services::store::ConfigStore;
use crate::services::toolchain::ToolPaths;
use crate::state::Shepherd;

/// 伪造的工具脚本，整个测试进程只写一次，避免与并发 fork 竞争（ETXTBSY）
struct Scripts {
    _dir: TempDir,
    sleeping: PathBuf,
    usage: PathBuf,
    boom: PathBuf,
}

static SCRIPTS: OnceLock<Scripts> = OnceLock::new();

fn scripts() -> &'static Scripts {
    SCRIPTS.get_or_init(|| {
        let dir = tempfile::tempdir().unwrap();
        let sleeping = write_script(dir.path(), "sleeping-tool", "exec sleep 30\n");
        let usage = write_script(dir.path(), "usage-tool", "echo 'usage: bad-flag'\nexit 2\n");
        let boom = write_script(dir.path(), "boom-tool", "echo boom\nexit 1\n");
        Scripts {
            _dir: dir,
            sleeping,
            usage,
            boom,
        }
    })
}

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// 忽略参数并一直运行，模拟正常启动的 pprof / trace
pub fn fake_tools() -> ToolPaths {
    ToolPaths {
        pprof: scripts().sleeping.clone(),
        trace: scripts().sleeping.clone(),
    }
}

/// 立即打印 `usage: bad-flag` 并以 2 退出
pub fn usage_tool() -> PathBuf {
    scripts().usage.clone()
}

/// 立即打印 `boom` 并以 1 退出
pub fn boom_tool() -> PathBuf {
    scripts().boom.clone()
}

pub fn shepherd_in(dir: &Path, tools: ToolPaths) -> Shepherd {
    Shepherd::new(
        Launcher::new(),
        ConfigStore::new(dir.join("config.json")),
        tools,
        "127.0.0.1".to_string(),
    )
}
