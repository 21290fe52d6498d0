use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub spin: SpinConfig,
    #[serde(default)]
    pub broadcast: BroadcastConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64, // seconds
}

/// 抽奖库存争用时的重试参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpinConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    50
}

impl Default for SpinConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
        }
    }
}

/// 中奖事件推送配置。webhook_url 为空则仅记录日志不推送
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastConfig {
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default = "default_broadcast_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_broadcast_timeout_secs() -> u64 {
    5
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_secs: default_broadcast_timeout_secs(),
        }
    }
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => {
                // 有配置文件：先解析再用环境变量覆盖
                toml::from_str(&config_str).map_err(|e| format!("解析配置文件失败: {e}"))?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // 无配置文件：使用环境变量与默认值构建
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                // 数据库 URL 在无配置文件时必须提供
                let database_url = get_env("DATABASE_URL")
                    .ok_or("缺少 DATABASE_URL 环境变量，且未找到配置文件 config.toml")?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                        access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 7200i64),
                    },
                    spin: SpinConfig {
                        max_attempts: get_env_parse("SPIN_MAX_ATTEMPTS", default_max_attempts()),
                        initial_backoff_ms: get_env_parse(
                            "SPIN_INITIAL_BACKOFF_MS",
                            default_initial_backoff_ms(),
                        ),
                    },
                    broadcast: BroadcastConfig {
                        webhook_url: get_env("BROADCAST_WEBHOOK_URL"),
                        timeout_secs: get_env_parse(
                            "BROADCAST_TIMEOUT_SECS",
                            default_broadcast_timeout_secs(),
                        ),
                    },
                }
            }
            Err(e) => {
                return Err(format!("无法读取配置文件 {config_path}: {e}").into());
            }
        };

        // 环境变量覆盖（文件存在时同样生效）
        if let Ok(v) = env::var("SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            config.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            config.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            config.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            config.jwt.access_token_expires_in = n;
        }
        if let Ok(v) = env::var("SPIN_MAX_ATTEMPTS")
            && let Ok(n) = v.parse()
        {
            config.spin.max_attempts = n;
        }
        if let Ok(v) = env::var("SPIN_INITIAL_BACKOFF_MS")
            && let Ok(n) = v.parse()
        {
            config.spin.initial_backoff_ms = n;
        }
        if let Ok(v) = env::var("BROADCAST_WEBHOOK_URL") {
            config.broadcast.webhook_url = Some(v);
        }
        if let Ok(v) = env::var("BROADCAST_TIMEOUT_SECS")
            && let Ok(n) = v.parse()
        {
            config.broadcast.timeout_secs = n;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spin_config_defaults() {
        let cfg = SpinConfig::default();
        assert_eq!(cfg.max_attempts, 3);
        assert_eq!(cfg.initial_backoff_ms, 50);
    }

    #[test]
    fn test_broadcast_config_defaults_disabled() {
        let cfg = BroadcastConfig::default();
        assert!(cfg.webhook_url.is_none());
        assert_eq!(cfg.timeout_secs, 5);
    }

    #[test]
    fn test_partial_toml_uses_section_defaults() {
        let toml_str = r#"
[server]
host = "127.0.0.1"
port = 9000

[database]
url = "postgres://localhost/spinwheel"
max_connections = 5

[jwt]
secret = "test-secret"
access_token_expires_in = 3600
"#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.spin.max_attempts, 3);
        assert_eq!(cfg.spin.initial_backoff_ms, 50);
        assert!(cfg.broadcast.webhook_url.is_none());
        assert_eq!(cfg.broadcast.timeout_secs, 5);
    }

    #[test]
    fn test_spin_section_overrides() {
        let toml_str = r#"
[server]
host = "127.0.0.1"
port = 9000

[database]
url = "postgres://localhost/spinwheel"
max_connections = 5

[jwt]
secret = "test-secret"
access_token_expires_in = 3600

[spin]
max_attempts = 5
initial_backoff_ms = 10

[broadcast]
webhook_url = "http://localhost:9999/hooks/spin"
"#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.spin.max_attempts, 5);
        assert_eq!(cfg.spin.initial_backoff_ms, 10);
        assert_eq!(
            cfg.broadcast.webhook_url.as_deref(),
            Some("http://localhost:9999/hooks/spin")
        );
        assert_eq!(cfg.broadcast.timeout_secs, 5);
    }
}
