use clap::Parser;
use std::path::PathBuf;

/// Shepherd - 按需启动 pprof / trace 的本地控制面
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// 监听端口
    #[arg(short, long, env = "PORT", default_value_t = 7777)]
    pub port: u16,

    /// 监听地址
    #[arg(short = 'a', long, env = "ADDRESS", default_value = "0.0.0.0")]
    pub address: String,

    /// 持久化配置文件
    #[arg(short, long, env = "SHEPHERD_CONFIG", default_value = "config.json")]
    pub config: PathBuf,

    /// 工具 `-http=` 绑定的地址，默认取第一个非回环 IPv4
    #[arg(long, env = "SHEPHERD_HOST_IP")]
    pub host_ip: Option<String>,

    /// pprof 可执行文件，默认在 GOROOT 中查找
    #[arg(long, env = "PPROF_PATH")]
    pub pprof_path: Option<PathBuf>,

    /// trace 可执行文件，默认在 GOROOT 中查找
    #[arg(long, env = "TRACE_PATH")]
    pub trace_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = CommandArgs::try_parse_from(["shepherd"]).unwrap();
        assert_eq!(args.port, 7777);
        assert_eq!(args.address, "0.0.0.0");
        assert_eq!(args.config, PathBuf::from("config.json"));
        assert!(args.pprof_path.is_none());
    }

    #[test]
    fn overrides() {
        let args = CommandArgs::try_parse_from([
            "shepherd", "-p", "8080", "-c", "/var/lib/shepherd.json",
            "--host-ip", "10.1.2.3", "--pprof-path", "/opt/go/pprof",
        ])
        .unwrap();
        assert_eq!(args.port, 8080);
        assert_eq!(args.config, PathBuf::from("/var/lib/shepherd.json"));
        assert_eq!(args.host_ip.as_deref(), Some("10.1.2.3"));
        assert_eq!(args.pprof_path, Some(PathBuf::from("/opt/go/pprof")));
    }
}
