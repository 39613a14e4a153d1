use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::ShepherdError;
use crate::metrics::METRICS;
use crate::models::{SheepConfig, SheepSummary, ToolKind};
use crate::services::launcher::{Launcher, ToolProcess};
use crate::services::port_allocator::allocate_port;
use crate::services::store::ConfigStore;
use crate::services::toolchain::ToolPaths;

/// 一个正在运行的工具进程及其元数据，链入后字段不再变化
pub struct Sheep {
    process: ToolProcess,
    name: String,
    path1: String,
    path2: String,
    port: u16,
}

impl Sheep {
    fn summary(&self) -> SheepSummary {
        SheepSummary {
            name: self.name.clone(),
            port: self.port,
            path1: self.path1.clone(),
            path2: self.path2.clone(),
        }
    }

    fn config(&self) -> SheepConfig {
        SheepConfig {
            name: self.name.clone(),
            inst: self.process.command_line().to_string(),
            port: self.port,
            path1: self.path1.clone(),
            path2: self.path2.clone(),
        }
    }
}

/// 进程注册表
///
/// 记录按加入顺序保存，所有读写都在同一把锁下进行；
/// 每次增删后在持锁状态下同步写入配置文件。
pub struct Shepherd {
    flock: Mutex<Vec<Sheep>>,
    launcher: Launcher,
    store: ConfigStore,
    tools: ToolPaths,
    host_ip: String,
}

pub type AppState = Arc<Shepherd>;

pub fn new_state(shepherd: Shepherd) -> AppState {
    Arc::new(shepherd)
}

impl Shepherd {
    pub fn new(launcher: Launcher, store: ConfigStore, tools: ToolPaths, host_ip: String) -> Self {
        Self {
            flock: Mutex::new(Vec::new()),
            launcher,
            store,
            tools,
            host_ip,
        }
    }

    pub fn host_ip(&self) -> &str {
        &self.host_ip
    }

    pub fn config_path(&self) -> &Path {
        self.store.path()
    }

    /// 启动一个工具并登记，返回分配给它的端口
    pub async fn add(
        &self,
        tool: &str,
        name: &str,
        path1: &str,
        path2: &str,
    ) -> Result<u16, ShepherdError> {
        let path1 = pure_path(path1);
        let mut path2 = pure_path(path2);

        let port = allocate_port()?;

        let kind: ToolKind = tool.parse().map_err(|e| {
            log::warn!("invalid tool type, got: {:?}", tool);
            e
        })?;
        if !kind.is_diff() {
            path2.clear();
        }

        let program = self.tools.program(kind);
        let args = self.tool_args(kind, port, &path1, &path2);
        let process = self.launcher.launch(program, &args).await.map_err(|e| {
            METRICS.launch_failures.inc();
            log::warn!("Failed to launch {}: {}", program.display(), e);
            e
        })?;

        let pid = process.pid();
        self.append(Sheep {
            process,
            name: name.to_string(),
            path1,
            path2,
            port,
        })?;

        log::info!("✓ '{}' is serving on {}:{} (pid {:?})", name, self.host_ip, port, pid);
        Ok(port)
    }

    /// 终止并移除指定端口上的记录；端口不存在时同样返回成功
    pub fn remove(&self, port: Option<&str>) -> Result<(), ShepherdError> {
        let port = parse_port(port)?;

        let mut flock = self.lock();
        let Some(index) = flock.iter().position(|sheep| sheep.port == port) else {
            log::debug!("No tool on port {}, nothing to remove", port);
            return Ok(());
        };

        let mut sheep = flock.remove(index);
        sheep.process.terminate();
        self.snapshot(&flock);

        log::info!("✓ Removed '{}' on port {}", sheep.name, port);
        Ok(())
    }

    /// 按加入顺序返回所有记录的摘要
    pub fn list(&self) -> Vec<SheepSummary> {
        self.lock().iter().map(Sheep::summary).collect()
    }

    /// 启动时按配置文件重新拉起工具，沿用原端口，返回恢复成功的数量
    ///
    /// 单条记录失败只记日志，不影响其余记录。
    pub async fn recover(&self) -> anyhow::Result<usize> {
        let entries = self.store.load()?;
        let total = entries.len();
        let mut recovered = 0;

        for entry in entries {
            let mut parts = entry.inst.split_whitespace();
            let Some(program) = parts.next() else {
                log::warn!("Skipping '{}' on port {}: empty command line", entry.name, entry.port);
                continue;
            };
            let args: Vec<String> = parts.map(str::to_string).collect();

            let process = match self.launcher.launch(Path::new(program), &args).await {
                Ok(process) => process,
                Err(e) => {
                    METRICS.launch_failures.inc();
                    log::warn!("Failed to recover '{}' on port {}: {}", entry.name, entry.port, e);
                    continue;
                }
            };

            let appended = self.append(Sheep {
                process,
                name: entry.name.clone(),
                path1: entry.path1.clone(),
                path2: entry.path2.clone(),
                port: entry.port,
            });
            match appended {
                Ok(()) => recovered += 1,
                Err(e) => log::warn!("Failed to recover '{}': {}", entry.name, e),
            }
        }

        log::info!("Recovered {}/{} tools from {}", recovered, total, self.store.path().display());
        Ok(recovered)
    }

    fn tool_args(&self, kind: ToolKind, port: u16, path1: &str, path2: &str) -> Vec<String> {
        let http = format!("-http={}:{}", self.host_ip, port);
        match kind {
            ToolKind::Pprof | ToolKind::Trace => vec![http, path1.to_string()],
            ToolKind::PprofDiff => vec![
                http,
                "-base".to_string(),
                path1.to_string(),
                path2.to_string(),
            ],
        }
    }

    /// 追加到队尾；端口已被占用时终止新进程并拒绝
    fn append(&self, mut sheep: Sheep) -> Result<(), ShepherdError> {
        let mut flock = self.lock();
        if flock.iter().any(|existing| existing.port == sheep.port) {
            sheep.process.terminate();
            return Err(ShepherdError::DuplicatePort(sheep.port));
        }

        flock.push(sheep);
        self.snapshot(&flock);
        Ok(())
    }

    /// 持久化失败只记录日志，不回滚内存中的变更
    fn snapshot(&self, flock: &[Sheep]) {
        METRICS.sheep_live.set(flock.len() as f64);

        let entries: Vec<SheepConfig> = flock.iter().map(Sheep::config).collect();
        if let Err(e) = self.store.save(&entries) {
            log::error!("Failed to persist registry: {:#}", e);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Sheep>> {
        self.flock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// 去掉引号与反引号并裁剪空白，防止参数注入
fn pure_path(path: &str) -> String {
    path.replace(['"', '`'], " ").trim().to_string()
}

/// 端口缺失、非数字或为 0 均视为无效
fn parse_port(port: Option<&str>) -> Result<u16, ShepherdError> {
    match port.map(str::trim).map(str::parse::<u16>) {
        Some(Ok(port)) if port != 0 => Ok(port),
        _ => Err(ShepherdError::InvalidPort),
    }
}
