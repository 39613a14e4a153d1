use serde::{Deserialize, Serialize};

/// `get` 返回的记录摘要，不包含启动命令
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SheepSummary {
    pub name: String,
    pub port: u16,
    pub path1: String,
    pub path2: String,
}

/// 配置文件中的一条记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SheepConfig {
    pub name: String,
    /// 启动时使用的完整命令行（可执行文件 + 空格拼接的参数）
    #[serde(default)]
    pub inst: String,
    pub port: u16,
    #[serde(default)]
    pub path1: String,
    #[serde(default)]
    pub path2: String,
}

impl From<&SheepConfig> for SheepSummary {
    fn from(config: &SheepConfig) -> Self {
        SheepSummary {
            name: config.name.clone(),
            port: config.port,
            path1: config.path1.clone(),
            path2: config.path2.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_uses_pascal_case_keys() {
        let config = SheepConfig {
            name: "api".to_string(),
            inst: "/go/pkg/tool/pprof -http=10.0.0.2:40001 /tmp/cpu.out".to_string(),
            port: 40001,
            path1: "/tmp/cpu.out".to_string(),
            path2: String::new(),
        };
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["Name"], "api");
        assert_eq!(value["Port"], 40001);
        assert_eq!(value["Inst"], config.inst.as_str());
        assert_eq!(value["Path2"], "");
    }

    #[test]
    fn summary_drops_command_line() {
        let config = SheepConfig {
            name: "api".to_string(),
            inst: "pprof -http=:1".to_string(),
            port: 1,
            path1: "a".to_string(),
            path2: "b".to_string(),
        };
        let value = serde_json::to_value(SheepSummary::from(&config)).unwrap();
        assert!(value.get("Inst").is_none());
        assert_eq!(value["Path1"], "a");
        assert_eq!(value["Path2"], "b");
    }
}
