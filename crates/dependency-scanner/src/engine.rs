//! 스캔 엔진 -- 관측, 해석, 결과 집계
//!
//! [`DependencyEngine`]은 동기 코드로 한 번의 스캔을 수행합니다. 비동기 컨텍스트에서는
//! `spawn_blocking`으로 호출해야 합니다.
//!
//! # 스캔 흐름
//!
//! ```text
//! ClassSource --> normalize_location --> PathCache.observe
//!                                              |
//!                                        snapshot()
//!                                              |
//!                      +-----------------------+----------------------+
//!                      |                       |                      |
//!                    Stale                Unreadable               Resolved
//!                      |                       |                      |
//!                 forget + warn          warn (경로 유지)      DependencySet에 추가
//! ```
//!
//! # 동시성
//!
//! 경로 캐시 잠금은 스캔 전체 동안 유지되므로 스캔은 직렬화됩니다.
//! 스캔 중에 들어온 호출은 진행 중인 스캔이 끝날 때까지 기다린 뒤 자신의 스캔을 새로 수행합니다.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Instant, SystemTime};

use tracing::{debug, warn};

use depwatch_core::metrics as m;

use crate::archive::nested::{ExtractLimits, extract_entry};
use crate::archive::{JarArchive, split_nested};
use crate::cache::{PathCache, normalize_location};
use crate::config::DependencyScannerConfig;
use crate::error::DependencyScannerError;
use crate::report::{ScanReport, ScanTrigger};
use crate::resolver::ArchiveResolver;
use crate::source::{ClassSource, LoadedClass};
use crate::types::{Dependency, DependencySet};

/// 경로 하나를 해석한 결과
#[derive(Debug)]
pub enum PathOutcome {
    /// 외부 아카이브 파일이 사라짐. 캐시에서 제거 대상
    Stale,
    /// 외부 아카이브를 열 수 없음. 경로는 유지되고 다음 스캔에서 재시도
    Unreadable(DependencyScannerError),
    /// 아카이브를 열었음. 식별된 의존성과 아카이브별 실패 목록
    Resolved {
        dependencies: Vec<Dependency>,
        skipped: Vec<DependencyScannerError>,
    },
}

/// 의존성 스캔 엔진
pub struct DependencyEngine {
    cache: Mutex<PathCache>,
    class_source: Arc<dyn ClassSource>,
    resolver: ArchiveResolver,
    scratch_dir: PathBuf,
    limits: ExtractLimits,
}

impl DependencyEngine {
    /// 설정과 클래스 목록 제공자로 엔진을 생성합니다.
    pub fn new(config: &DependencyScannerConfig, class_source: Arc<dyn ClassSource>) -> Self {
        Self {
            cache: Mutex::new(PathCache::new(config.max_cached_paths)),
            class_source,
            resolver: ArchiveResolver::new(),
            scratch_dir: config.scratch_dir_path(),
            limits: ExtractLimits {
                max_size: config.max_nested_archive_size,
                buffer_size: config.copy_buffer_size,
            },
        }
    }

    /// 메타데이터 출처 체인을 교체합니다.
    pub fn with_resolver(mut self, resolver: ArchiveResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// 한 번의 스캔을 수행하고 새 결과 집합을 반환합니다.
    pub fn scan(&self) -> Result<DependencySet, DependencyScannerError> {
        self.run(ScanTrigger::OnDemand).map(|report| report.dependencies)
    }

    /// 한 번의 스캔을 수행하고 통계를 포함한 보고서를 반환합니다.
    ///
    /// 클래스 목록 조회 실패만 스캔 실패이며, 아카이브별 실패는 경고 로그로 남기고 건너뜁니다.
    pub fn run(&self, trigger: ScanTrigger) -> Result<ScanReport, DependencyScannerError> {
        let started = Instant::now();
        let mut cache = self.lock_cache();

        let classes = match self.class_source.loaded_classes() {
            Ok(classes) => classes,
            Err(e) => {
                metrics::counter!(m::DEPENDENCY_SCAN_FAILURES_TOTAL, m::LABEL_TRIGGER => trigger.as_str())
                    .increment(1);
                return Err(e);
            }
        };

        let paths_observed = observe_classes(&mut cache, &classes);

        let mut dependencies = DependencySet::new();
        let mut paths_evicted = 0;
        let mut archives_skipped = 0;

        for path in cache.snapshot() {
            match self.resolve_path(&path) {
                PathOutcome::Stale => {
                    cache.forget(&path);
                    paths_evicted += 1;
                    metrics::counter!(m::DEPENDENCY_PATHS_EVICTED_TOTAL).increment(1);
                    warn!(path = %path, "archive no longer exists, evicted from cache");
                }
                PathOutcome::Unreadable(e) => {
                    archives_skipped += 1;
                    record_skip(&path, &e);
                }
                PathOutcome::Resolved {
                    dependencies: found,
                    skipped,
                } => {
                    for e in &skipped {
                        record_skip(&path, e);
                    }
                    archives_skipped += skipped.len();
                    dependencies.extend(found);
                }
            }
        }

        let paths_cached = cache.len();
        drop(cache);

        let elapsed = started.elapsed();
        metrics::counter!(m::DEPENDENCY_SCANS_TOTAL, m::LABEL_TRIGGER => trigger.as_str())
            .increment(1);
        metrics::gauge!(m::DEPENDENCY_DEPENDENCIES_FOUND).set(dependencies.len() as f64);
        metrics::gauge!(m::DEPENDENCY_PATHS_CACHED).set(paths_cached as f64);
        metrics::histogram!(m::DEPENDENCY_SCAN_DURATION_SECONDS).record(elapsed.as_secs_f64());

        debug!(
            trigger = %trigger,
            classes = classes.len(),
            observed = paths_observed,
            cached = paths_cached,
            evicted = paths_evicted,
            skipped = archives_skipped,
            dependencies = dependencies.len(),
            "dependency scan finished"
        );

        Ok(ScanReport {
            scan_id: uuid::Uuid::new_v4().to_string(),
            trigger,
            dependencies,
            paths_observed,
            paths_cached,
            paths_evicted,
            archives_skipped,
            duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            completed_at: SystemTime::now(),
        })
    }

    /// 관측 경로 하나를 해석합니다.
    ///
    /// 열린 아카이브와 임시 파일은 이 함수가 반환하기 전에 모두 정리됩니다.
    /// 중첩 경로는 외부 아카이브와 내부 아카이브를 각각 식별하며,
    /// 두 결과 모두 관측 경로를 [`Dependency::path`]로 가집니다.
    pub fn resolve_path(&self, observed: &str) -> PathOutcome {
        let split = split_nested(observed);

        let mut outer = match JarArchive::open_as(Path::new(&split.outer), &split.outer) {
            Ok(archive) => archive,
            Err(e) if e.is_stale() => return PathOutcome::Stale,
            Err(e) => return PathOutcome::Unreadable(e),
        };

        let mut dependencies = Vec::new();
        let mut skipped = Vec::new();

        match self.resolver.resolve(&mut outer, observed) {
            Ok(Some(dependency)) => dependencies.push(dependency),
            Ok(None) => {}
            Err(e) => skipped.push(e),
        }

        if let Some(inner) = split.inner.as_deref() {
            match self.resolve_nested(&mut outer, observed, inner) {
                Ok(Some(dependency)) => dependencies.push(dependency),
                Ok(None) => {}
                Err(e) => skipped.push(e),
            }
        }

        PathOutcome::Resolved {
            dependencies,
            skipped,
        }
    }

    fn resolve_nested(
        &self,
        outer: &mut JarArchive,
        observed: &str,
        inner: &str,
    ) -> Result<Option<Dependency>, DependencyScannerError> {
        let scratch = extract_entry(outer, inner, &self.scratch_dir, self.limits)?;
        let display = format!("{}!/{inner}", outer.display_path());
        let mut archive = JarArchive::open_as(scratch.path(), &display)?;
        self.resolver.resolve(&mut archive, observed)
    }

    /// 현재 캐시된 경로 목록
    pub fn cached_paths(&self) -> Vec<String> {
        self.lock_cache().snapshot()
    }

    /// 현재 캐시 크기
    pub fn cached_len(&self) -> usize {
        self.lock_cache().len()
    }

    /// 이전 스캔이 패닉으로 끝나 잠금이 오염되었으면 복구합니다.
    ///
    /// 캐시는 단순 집합이라 패닉 이후에도 일관성이 유지됩니다.
    fn lock_cache(&self) -> MutexGuard<'_, PathCache> {
        match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("path cache lock poisoned by a previous scan, recovering");
                self.cache.clear_poison();
                poisoned.into_inner()
            }
        }
    }
}

impl std::fmt::Debug for DependencyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyEngine")
            .field("scratch_dir", &self.scratch_dir)
            .field("limits", &self.limits)
            .field("sources", &self.resolver.source_kinds())
            .finish_non_exhaustive()
    }
}

/// 로드된 클래스의 위치를 캐시에 기록하고 새로 추가된 경로 수를 반환합니다.
fn observe_classes(cache: &mut PathCache, classes: &[LoadedClass]) -> usize {
    let mut added = 0;
    for class in classes {
        let Some(location) = class.code_source.as_deref() else {
            continue;
        };
        if cache.is_full() {
            debug!(capacity = cache.capacity(), "path cache full, ignoring new archives");
            break;
        }
        if let Some(path) = normalize_location(location) {
            if cache.observe(path) {
                added += 1;
            }
        }
    }
    added
}

fn record_skip(path: &str, error: &DependencyScannerError) {
    metrics::counter!(m::DEPENDENCY_ARCHIVE_SKIPS_TOTAL, m::LABEL_REASON => error.skip_reason())
        .increment(1);
    warn!(path = %path, reason = error.skip_reason(), error = %error, "skipping archive");
}
