use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;

use crate::models::SheepConfig;

/// 持久化配置文件，每次变更后整体覆盖
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取配置文件，文件不存在（首次运行）时返回空列表
    pub fn load(&self) -> anyhow::Result<Vec<SheepConfig>> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", self.path.display()))
            }
        };

        serde_json::from_slice(&content)
            .with_context(|| format!("failed to parse {}", self.path.display()))
    }

    /// 写入全部记录：先写临时文件再重命名，读者不会看到写了一半的文件
    pub fn save(&self, entries: &[SheepConfig]) -> anyhow::Result<()> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        entries
            .serialize(&mut ser)
            .context("failed to encode registry snapshot")?;

        let tmp = self.tmp_path();
        fs::write(&tmp, &buf).with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = OsString::from(self.path.as_os_str());
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}
