//! 설정 관리 -- depwatch.toml 파싱 및 런타임 설정
//!
//! [`DepwatchConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`DEPWATCH_DEPENDENCY_SCAN_INTERVAL_SECS=3600` 형식)
//! 3. 설정 파일 (`depwatch.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), depwatch_core::error::DepwatchError> {
//! use depwatch_core::config::DepwatchConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = DepwatchConfig::load("depwatch.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = DepwatchConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, DepwatchError};

/// depwatch 통합 설정
///
/// `depwatch.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepwatchConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 의존성 스캐너 설정
    #[serde(default)]
    pub dependency: DependencyConfig,
    /// 수동 트리거 명령 채널 설정
    #[serde(default)]
    pub command: CommandConfig,
    /// 메트릭 엔드포인트 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl DepwatchConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, DepwatchError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, DepwatchError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DepwatchError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                DepwatchError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, DepwatchError> {
        toml::from_str(toml_str).map_err(|e| {
            DepwatchError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `DEPWATCH_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "DEPWATCH_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "DEPWATCH_GENERAL_LOG_FORMAT");

        // Dependency
        override_bool(&mut self.dependency.enabled, "DEPWATCH_DEPENDENCY_ENABLED");
        override_u64(
            &mut self.dependency.scan_interval_secs,
            "DEPWATCH_DEPENDENCY_SCAN_INTERVAL_SECS",
        );
        override_u64(
            &mut self.dependency.initial_delay_secs,
            "DEPWATCH_DEPENDENCY_INITIAL_DELAY_SECS",
        );
        override_usize(
            &mut self.dependency.max_cached_paths,
            "DEPWATCH_DEPENDENCY_MAX_CACHED_PATHS",
        );
        override_string(
            &mut self.dependency.snapshot_path,
            "DEPWATCH_DEPENDENCY_SNAPSHOT_PATH",
        );
        override_string(
            &mut self.dependency.scratch_dir,
            "DEPWATCH_DEPENDENCY_SCRATCH_DIR",
        );

        // Command
        override_bool(&mut self.command.enabled, "DEPWATCH_COMMAND_ENABLED");
        override_string(&mut self.command.bind_addr, "DEPWATCH_COMMAND_BIND_ADDR");
        override_usize(
            &mut self.command.max_connections,
            "DEPWATCH_COMMAND_MAX_CONNECTIONS",
        );
        override_u64(
            &mut self.command.connection_timeout_secs,
            "DEPWATCH_COMMAND_CONNECTION_TIMEOUT_SECS",
        );

        // Metrics
        override_bool(&mut self.metrics.enabled, "DEPWATCH_METRICS_ENABLED");
        override_string(&mut self.metrics.listen_addr, "DEPWATCH_METRICS_LISTEN_ADDR");
        override_u16(&mut self.metrics.port, "DEPWATCH_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// 모듈 고유 범위 검증은 각 모듈 설정(`from_core` 이후 `validate`)에서 수행합니다.
    pub fn validate(&self) -> Result<(), DepwatchError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.dependency.enabled && self.dependency.initial_delay_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "dependency.initial_delay_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.dependency.enabled && self.dependency.max_cached_paths == 0 {
            return Err(ConfigError::InvalidValue {
                field: "dependency.max_cached_paths".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.command.enabled {
            if self.command.bind_addr.parse::<SocketAddr>().is_err() {
                return Err(ConfigError::InvalidValue {
                    field: "command.bind_addr".to_owned(),
                    reason: format!("'{}' is not a socket address", self.command.bind_addr),
                }
                .into());
            }

            if self.command.max_connections == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "command.max_connections".to_owned(),
                    reason: "must be greater than 0".to_owned(),
                }
                .into());
            }
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "metrics.port".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 의존성 스캐너 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DependencyConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 주기적 스캔 간격 (초). 0이면 수동 트리거만
    pub scan_interval_secs: u64,
    /// 첫 주기 스캔까지의 지연 (초). 0은 허용되지 않음
    pub initial_delay_secs: u64,
    /// 경로 캐시 최대 크기
    pub max_cached_paths: usize,
    /// 계측 에이전트가 기록하는 로드된 클래스 스냅샷 파일 경로
    pub snapshot_path: String,
    /// 중첩 아카이브 추출용 임시 디렉토리 (빈 문자열이면 OS 임시 디렉토리)
    pub scratch_dir: String,
}

impl Default for DependencyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            scan_interval_secs: 12 * 60 * 60,
            initial_delay_secs: 1,
            max_cached_paths: 1000,
            snapshot_path: "/var/run/depwatch/loaded-classes.tsv".to_owned(),
            scratch_dir: String::new(),
        }
    }
}

/// 수동 트리거 명령 채널 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 바인드 주소
    pub bind_addr: String,
    /// 최대 동시 연결 수
    pub max_connections: usize,
    /// 유휴 연결 타임아웃 (초)
    pub connection_timeout_secs: u64,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_addr: "127.0.0.1:9730".to_owned(),
            max_connections: 16,
            connection_timeout_secs: 30,
        }
    }
}

/// 메트릭 엔드포인트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 리슨 주소
    pub listen_addr: String,
    /// 포트
    pub port: u16,
    /// 엔드포인트 경로
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9731,
            endpoint: "/metrics".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn default_config_has_sane_values() {
        let config = DepwatchConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "json");
        assert!(config.dependency.enabled);
        assert_eq!(config.dependency.scan_interval_secs, 43_200);
        assert_eq!(config.dependency.initial_delay_secs, 1);
        assert_eq!(config.dependency.max_cached_paths, 1000);
        assert!(config.command.enabled);
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn default_config_passes_validation() {
        DepwatchConfig::default().validate().unwrap();
    }

    #[test]
    fn from_str_empty_toml_uses_defaults() {
        let config = DepwatchConfig::parse("").unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.command.bind_addr, "127.0.0.1:9730");
    }

    #[test]
    fn from_str_partial_toml_merges_with_defaults() {
        let toml = r#"
[general]
log_level = "debug"

[dependency]
scan_interval_secs = 3600
"#;
        let config = DepwatchConfig::parse(toml).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.dependency.scan_interval_secs, 3600);
        assert_eq!(config.dependency.max_cached_paths, 1000);
    }

    #[test]
    fn from_str_full_toml() {
        let toml = r#"
[general]
log_level = "warn"
log_format = "pretty"

[dependency]
enabled = true
scan_interval_secs = 600
initial_delay_secs = 5
max_cached_paths = 2000
snapshot_path = "/opt/app/classes.tsv"
scratch_dir = "/opt/app/tmp"

[command]
enabled = false
bind_addr = "127.0.0.1:7000"
max_connections = 4
connection_timeout_secs = 10

[metrics]
enabled = true
listen_addr = "0.0.0.0"
port = 9100
"#;
        let config = DepwatchConfig::parse(toml).unwrap();
        assert_eq!(config.general.log_format, "pretty");
        assert_eq!(config.dependency.initial_delay_secs, 5);
        assert_eq!(config.dependency.scratch_dir, "/opt/app/tmp");
        assert!(!config.command.enabled);
        assert_eq!(config.metrics.port, 9100);
        config.validate().unwrap();
    }

    #[test]
    fn from_str_invalid_toml_returns_error() {
        let err = DepwatchConfig::parse("invalid = [[[toml").unwrap_err();
        assert!(matches!(
            err,
            DepwatchError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = DepwatchConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_zero_initial_delay() {
        let mut config = DepwatchConfig::default();
        config.dependency.initial_delay_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("initial_delay_secs"));
    }

    #[test]
    fn validate_ignores_zero_initial_delay_when_disabled() {
        let mut config = DepwatchConfig::default();
        config.dependency.enabled = false;
        config.dependency.initial_delay_secs = 0;
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_bad_bind_addr() {
        let mut config = DepwatchConfig::default();
        config.command.bind_addr = "not-an-address".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("command.bind_addr"));
    }

    #[test]
    #[serial]
    fn env_override_applies_to_dependency_section() {
        let mut config = DepwatchConfig::default();
        // SAFETY: #[serial]로 환경변수를 만지는 테스트를 직렬화합니다.
        unsafe { std::env::set_var("DEPWATCH_DEPENDENCY_SCAN_INTERVAL_SECS", "120") };
        unsafe { std::env::set_var("DEPWATCH_DEPENDENCY_SCRATCH_DIR", "/tmp/depwatch") };
        config.apply_env_overrides();
        unsafe { std::env::remove_var("DEPWATCH_DEPENDENCY_SCAN_INTERVAL_SECS") };
        unsafe { std::env::remove_var("DEPWATCH_DEPENDENCY_SCRATCH_DIR") };

        assert_eq!(config.dependency.scan_interval_secs, 120);
        assert_eq!(config.dependency.scratch_dir, "/tmp/depwatch");
    }

    #[test]
    #[serial]
    fn env_override_bool_invalid_keeps_original() {
        let mut val = true;
        // SAFETY: #[serial]로 환경변수를 만지는 테스트를 직렬화합니다.
        unsafe { std::env::set_var("TEST_DEPWATCH_BOOL_BAD", "not-a-bool") };
        override_bool(&mut val, "TEST_DEPWATCH_BOOL_BAD");
        unsafe { std::env::remove_var("TEST_DEPWATCH_BOOL_BAD") };
        assert!(val);
    }

    #[test]
    fn env_override_missing_var_keeps_original() {
        let mut val = 7u64;
        override_u64(&mut val, "TEST_DEPWATCH_NONEXISTENT_12345");
        assert_eq!(val, 7);
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = DepwatchConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = DepwatchConfig::parse(&toml_str).unwrap();
        assert_eq!(
            config.dependency.scan_interval_secs,
            parsed.dependency.scan_interval_secs
        );
        assert_eq!(config.command.bind_addr, parsed.command.bind_addr);
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let err = DepwatchConfig::from_file("/nonexistent/path/depwatch.toml")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DepwatchError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}
