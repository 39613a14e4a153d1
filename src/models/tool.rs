use std::str::FromStr;

use crate::error::ShepherdError;

/// 工具类型，对应请求参数 `tool` 的取值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    /// "0": 单文件 pprof
    Pprof,
    /// "1": 单文件 trace
    Trace,
    /// "2": 两个 profile 做差异对比
    PprofDiff,
}

impl ToolKind {
    /// 是否需要第二个路径
    pub fn is_diff(self) -> bool {
        matches!(self, ToolKind::PprofDiff)
    }
}

impl FromStr for ToolKind {
    type Err = ShepherdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0" => Ok(ToolKind::Pprof),
            "1" => Ok(ToolKind::Trace),
            "2" => Ok(ToolKind::PprofDiff),
            _ => Err(ShepherdError::InvalidTool),
        }
    }
}
