//! 에러 타입 -- 도메인별 에러 정의

/// depwatch 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum DepwatchError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 처리 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// 의존성 스캔 에러
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파이프라인 생명주기 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 이미 실행 중
    #[error("pipeline already running")]
    AlreadyRunning,

    /// 실행 중이 아님
    #[error("pipeline not running")]
    NotRunning,

    /// 채널 전송 실패
    #[error("channel send failed: {0}")]
    ChannelSend(String),
}

/// 의존성 스캔 에러
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// 아카이브 처리 실패
    #[error("archive error: {0}")]
    Archive(String),

    /// 메타데이터 해석 실패
    #[error("metadata error: {0}")]
    Metadata(String),

    /// 로드된 클래스 목록 조회 실패
    #[error("class source error: {0}")]
    ClassSource(String),

    /// 스캔 실행 실패
    #[error("scan failed: {0}")]
    Failed(String),
}
