use std::net::TcpListener;

use crate::error::ShepherdError;

/// 向操作系统申请一个空闲的临时端口
///
/// 绑定 0 端口后读回分配结果，监听器随即释放，不维护私有端口池。
pub fn allocate_port() -> Result<u16, ShepherdError> {
    let listener = TcpListener::bind(("0.0.0.0", 0)).map_err(|e| {
        log::warn!("Failed to bind ephemeral listener: {}", e);
        ShepherdError::PortExhausted
    })?;

    let port = listener
        .local_addr()
        .map_err(|e| {
            log::warn!("Failed to read ephemeral listener address: {}", e);
            ShepherdError::PortExhausted
        })?
        .port();

    // 系统不会分配 0，出现即视为失败
    if port == 0 {
        return Err(ShepherdError::PortExhausted);
    }

    Ok(port)
}
