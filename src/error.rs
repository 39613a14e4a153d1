use thiserror::Error;

/// 请求层可见的错误，`Display` 即响应正文
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShepherdError {
    /// 操作系统拒绝分配端口
    #[error("port resource exhausted")]
    PortExhausted,

    #[error("invalid tool type")]
    InvalidTool,

    /// 端口缺失、非数字或为 0
    #[error("invalid port")]
    InvalidPort,

    /// 工具在检测窗口内退出，内容为其原样输出
    #[error("{0}")]
    Launch(String),

    #[error("port {0} already registered")]
    DuplicatePort(u16),
}
