use super::*;
use crate::planner::DEFAULT_MAX_GAP;

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "192.168.1.100".to_string(),
            port: 502,
            slave_id: 1,
            protocol: Protocol::RtuOverTcp,
            connect_timeout_ms: 5000,
            operation_timeout_ms: 3000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            console_level: None,
            file_level: None,
            file: None,
            backup_count: 5,
            json_format: false,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8089,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            scan_interval_secs: 30,
            max_gap: DEFAULT_MAX_GAP,
            registers: RegisterMap::default(),
            logging: LoggingConfig::default(),
            web: WebConfig::default(),
        }
    }
}
