//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `depwatch_`
//! - 모듈명: `dependency_`
//! - 접미어: `_total` (counter), `_seconds` (histogram), 없음 (gauge)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 트리거 레이블 키 (periodic, on_demand)
pub const LABEL_TRIGGER: &str = "trigger";

/// 스킵 사유 레이블 키 (stale, unreadable, malformed)
pub const LABEL_REASON: &str = "reason";

// ─── Dependency Scanner 메트릭 ─────────────────────────────────────

/// 완료된 스캔 수 (counter, label: trigger)
pub const DEPENDENCY_SCANS_TOTAL: &str = "depwatch_dependency_scans_total";

/// 실패한 스캔 수 (counter, label: trigger)
pub const DEPENDENCY_SCAN_FAILURES_TOTAL: &str = "depwatch_dependency_scan_failures_total";

/// 마지막 스캔에서 식별된 의존성 수 (gauge)
pub const DEPENDENCY_DEPENDENCIES_FOUND: &str = "depwatch_dependency_dependencies_found";

/// 경로 캐시 크기 (gauge)
pub const DEPENDENCY_PATHS_CACHED: &str = "depwatch_dependency_paths_cached";

/// 캐시에서 제거된 stale 경로 수 (counter)
pub const DEPENDENCY_PATHS_EVICTED_TOTAL: &str = "depwatch_dependency_paths_evicted_total";

/// 건너뛴 아카이브 수 (counter, label: reason)
pub const DEPENDENCY_ARCHIVE_SKIPS_TOTAL: &str = "depwatch_dependency_archive_skips_total";

/// 스캔 소요 시간 (histogram, 초)
pub const DEPENDENCY_SCAN_DURATION_SECONDS: &str = "depwatch_dependency_scan_duration_seconds";

/// 모든 메트릭의 설명을 등록합니다.
///
/// recorder 설치 직후 한 번 호출합니다. recorder가 없으면 아무 일도 하지 않습니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    describe_counter!(
        DEPENDENCY_SCANS_TOTAL,
        "Total number of completed dependency scans"
    );
    describe_counter!(
        DEPENDENCY_SCAN_FAILURES_TOTAL,
        "Total number of dependency scans that failed"
    );
    describe_gauge!(
        DEPENDENCY_DEPENDENCIES_FOUND,
        "Number of dependencies identified by the most recent scan"
    );
    describe_gauge!(
        DEPENDENCY_PATHS_CACHED,
        "Number of archive paths currently held in the path cache"
    );
    describe_counter!(
        DEPENDENCY_PATHS_EVICTED_TOTAL,
        "Total number of stale archive paths evicted from the path cache"
    );
    describe_counter!(
        DEPENDENCY_ARCHIVE_SKIPS_TOTAL,
        "Total number of archives skipped during resolution, by reason"
    );
    describe_histogram!(
        DEPENDENCY_SCAN_DURATION_SECONDS,
        "Dependency scan duration in seconds"
    );
}
