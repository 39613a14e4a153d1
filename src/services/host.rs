use std::net::IpAddr;

use sysinfo::Networks;

/// 第一个非回环 IPv4 地址（按网卡名排序），没有则回退到 127.0.0.1
///
/// 工具的 `-http=` 绑定到此地址，浏览器通过它访问工具页面。
pub fn detect_host_ip() -> String {
    let networks = Networks::new_with_refreshed_list();

    let mut interfaces: Vec<_> = networks.list().iter().collect();
    interfaces.sort_by(|a, b| a.0.cmp(b.0));

    for (name, data) in interfaces {
        for network in data.ip_networks() {
            if let IpAddr::V4(addr) = network.addr {
                if !addr.is_loopback() && !addr.is_unspecified() {
                    log::debug!("Using {} from interface {}", addr, name);
                    return addr.to_string();
                }
            }
        }
    }

    "127.0.0.1".to_string()
}
