//! Scheduling and concurrency tests
//!
//! Periodic scans run on paused tokio time; concurrent on-demand scans share one engine.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use depwatch_core::pipeline::Pipeline;
use depwatch_dependency_scanner::{
    ClassSource, DependencyEngine, DependencyScannerBuilder, DependencyScannerConfig,
    DependencyScannerError, LoadedClass, ScanTrigger, StaticClassSource,
};

use common::{maven_jar, path_str};

#[derive(Clone, Copy)]
enum FirstCall {
    Fail,
    Panic,
}

/// Misbehaves on the first call, then returns `classes`.
struct FlakySource {
    calls: AtomicUsize,
    first: FirstCall,
    classes: Vec<LoadedClass>,
}

impl FlakySource {
    fn new(first: FirstCall, classes: Vec<LoadedClass>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            first,
            classes,
        }
    }
}

impl ClassSource for FlakySource {
    fn loaded_classes(&self) -> Result<Vec<LoadedClass>, DependencyScannerError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            match self.first {
                FirstCall::Fail => {
                    return Err(DependencyScannerError::ClassSource("agent not ready".to_owned()));
                }
                FirstCall::Panic => panic!("agent crashed"),
            }
        }
        Ok(self.classes.clone())
    }
}

fn periodic_config(scratch: &std::path::Path) -> DependencyScannerConfig {
    DependencyScannerConfig {
        scan_interval_secs: 60,
        initial_delay_secs: 1,
        scratch_dir: path_str(scratch),
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn periodic_scan_waits_for_initial_delay() {
    let dir = tempfile::tempdir().unwrap();
    let config = DependencyScannerConfig {
        initial_delay_secs: 30,
        ..periodic_config(dir.path())
    };
    let (mut scanner, rx) = DependencyScannerBuilder::new()
        .config(config)
        .class_source(Arc::new(StaticClassSource::default()))
        .build()
        .unwrap();
    let mut rx = rx.unwrap();

    scanner.start().await.unwrap();

    tokio::time::sleep(Duration::from_secs(29)).await;
    assert_eq!(scanner.scans_completed(), 0);

    let event = tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.report.trigger, ScanTrigger::Periodic);

    scanner.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn scheduler_survives_failed_scan() {
    let dir = tempfile::tempdir().unwrap();
    let jar = maven_jar(dir.path(), "a.jar", "org.a", "a", "1.0");
    let source = FlakySource::new(
        FirstCall::Fail,
        vec![LoadedClass::new("org.a.A", Some(&path_str(&jar)))],
    );

    let (mut scanner, rx) = DependencyScannerBuilder::new()
        .config(periodic_config(dir.path()))
        .class_source(Arc::new(source))
        .build()
        .unwrap();
    let mut rx = rx.unwrap();

    scanner.start().await.unwrap();

    // first tick (t=1s) fails, nothing is published before the next period
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(rx.try_recv().is_err());
    assert_eq!(scanner.scans_failed(), 1);
    assert_eq!(scanner.scans_completed(), 0);

    // second tick (t=61s) succeeds
    let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(event.report.trigger, ScanTrigger::Periodic);
    assert_eq!(event.report.dependencies.len(), 1);
    assert_eq!(scanner.scans_failed(), 1);
    assert_eq!(scanner.scans_completed(), 1);
    assert!(scanner.health_check().await.is_healthy());

    scanner.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn scheduler_survives_panicking_scan() {
    let dir = tempfile::tempdir().unwrap();
    let jar = maven_jar(dir.path(), "b.jar", "org.b", "b", "2.0");
    let source = FlakySource::new(
        FirstCall::Panic,
        vec![LoadedClass::new("org.b.B", Some(&path_str(&jar)))],
    );

    let (mut scanner, rx) = DependencyScannerBuilder::new()
        .config(periodic_config(dir.path()))
        .class_source(Arc::new(source))
        .build()
        .unwrap();
    let mut rx = rx.unwrap();

    scanner.start().await.unwrap();

    let event = tokio::time::timeout(Duration::from_secs(120), rx.recv())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(event.report.dependencies.len(), 1);
    assert_eq!(scanner.scans_failed(), 1);

    scanner.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn failed_scan_degrades_health_until_next_success() {
    let dir = tempfile::tempdir().unwrap();
    let (mut scanner, _rx) = DependencyScannerBuilder::new()
        .config(DependencyScannerConfig {
            scan_interval_secs: 0,
            scratch_dir: path_str(dir.path()),
            ..Default::default()
        })
        .class_source(Arc::new(FlakySource::new(FirstCall::Fail, Vec::new())))
        .build()
        .unwrap();

    scanner.start().await.unwrap();

    assert!(scanner.scan_once().await.is_err());
    assert!(!scanner.health_check().await.is_healthy());
    assert!(!scanner.health_check().await.is_unhealthy());

    scanner.scan_once().await.unwrap();
    assert!(scanner.health_check().await.is_healthy());

    scanner.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn no_scans_after_stop() {
    let dir = tempfile::tempdir().unwrap();
    let (mut scanner, rx) = DependencyScannerBuilder::new()
        .config(periodic_config(dir.path()))
        .class_source(Arc::new(StaticClassSource::default()))
        .build()
        .unwrap();
    let mut rx = rx.unwrap();

    scanner.start().await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    scanner.stop().await.unwrap();

    let completed = scanner.scans_completed();
    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(scanner.scans_completed(), completed);
}

#[tokio::test(start_paused = true)]
async fn manual_mode_never_scans_on_its_own() {
    let dir = tempfile::tempdir().unwrap();
    let (mut scanner, _rx) = DependencyScannerBuilder::new()
        .config(DependencyScannerConfig {
            scan_interval_secs: 0,
            scratch_dir: path_str(dir.path()),
            ..Default::default()
        })
        .class_source(Arc::new(StaticClassSource::default()))
        .build()
        .unwrap();

    scanner.start().await.unwrap();
    tokio::time::sleep(Duration::from_secs(86_400)).await;
    assert_eq!(scanner.scans_completed(), 0);
    scanner.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_on_demand_scans_agree() {
    let dir = tempfile::tempdir().unwrap();
    let classes = (0..8)
        .map(|i| {
            let jar = maven_jar(dir.path(), &format!("lib{i}.jar"), "org.example", &format!("lib{i}"), "1.0");
            LoadedClass::new(format!("org.example.C{i}"), Some(&path_str(&jar)))
        })
        .collect();

    let (scanner, _rx) = DependencyScannerBuilder::new()
        .config(DependencyScannerConfig {
            scan_interval_secs: 0,
            scratch_dir: path_str(dir.path()),
            ..Default::default()
        })
        .class_source(Arc::new(StaticClassSource::new(classes)))
        .event_channel_capacity(64)
        .build()
        .unwrap();

    let mut set = tokio::task::JoinSet::new();
    for _ in 0..8 {
        let handle = scanner.handle();
        set.spawn(async move { handle.scan_report().await });
    }

    let mut reports = Vec::new();
    while let Some(result) = set.join_next().await {
        reports.push(result.unwrap().unwrap());
    }

    assert_eq!(reports.len(), 8);
    assert!(reports.iter().all(|r| r == &reports[0]));
    let value: serde_json::Value = serde_json::from_str(&reports[0]).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 8);
    assert_eq!(scanner.scans_completed(), 8);
}

#[test]
fn engine_scans_from_many_threads() {
    let dir = tempfile::tempdir().unwrap();
    let classes: Vec<LoadedClass> = (0..4)
        .map(|i| {
            let jar = maven_jar(dir.path(), &format!("t{i}.jar"), "org.t", &format!("t{i}"), "1.0");
            LoadedClass::new(format!("org.t.T{i}"), Some(&path_str(&jar)))
        })
        .collect();

    let config = DependencyScannerConfig {
        scratch_dir: path_str(dir.path()),
        ..Default::default()
    };
    let engine = DependencyEngine::new(&config, Arc::new(StaticClassSource::new(classes)));

    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4).map(|_| s.spawn(|| engine.scan().unwrap())).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(results.iter().all(|r| r.len() == 4));
    assert!(results.iter().all(|r| r == &results[0]));
    assert_eq!(engine.cached_len(), 4);
}
