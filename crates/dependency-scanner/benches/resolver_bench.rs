//! 의존성 스캐너 벤치마크
//!
//! code-source 정규화, manifest 파싱, 아카이브 식별 성능을 측정합니다.

use std::io::Write;

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use depwatch_dependency_scanner::archive::Manifest;
use depwatch_dependency_scanner::{ArchiveResolver, JarArchive, normalize_location, split_nested};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const SPRING_MANIFEST: &str = "Manifest-Version: 1.0\r\n\
Created-By: Maven JAR Plugin 3.3.0\r\n\
Build-Jdk-Spec: 17\r\n\
Implementation-Title: spring-core\r\n\
Implementation-Version: 6.0.11\r\n\
Implementation-Vendor: VMware, Inc.\r\n\
Automatic-Module-Name: spring.core\r\n\
Bundle-SymbolicName: org.springframework.spring-core\r\n\
Bundle-Version: 6.0.11\r\n\
Export-Package: org.springframework.core;version=\"6.0.11\",org.springframework.cor\r\n\
 e.annotation;version=\"6.0.11\",org.springframework.util;version=\"6.0.11\"\r\n\
\r\n\
Name: org/springframework/core/\r\n\
Implementation-Title: spring-core\r\n";

fn write_jar(path: &std::path::Path, entries: &[(&str, &[u8])]) {
    let file = std::fs::File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    for (name, content) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(content).unwrap();
    }
    zip.finish().unwrap();
}

fn bench_location_normalization(c: &mut Criterion) {
    let locations = [
        "/opt/app/lib/guava-32.1.2-jre.jar",
        "file:/opt/app/lib/commons-io-2.13.0.jar",
        "jar:file:/opt/app/service.jar!/BOOT-INF/lib/snakeyaml-2.0.jar!/",
        "file:/C:/Program%20Files/app/lib/netty-common.jar",
        "nested:/opt/app/service.jar/!BOOT-INF/lib/jackson-core-2.15.2.jar",
    ];

    let mut group = c.benchmark_group("location_normalization");

    group.throughput(Throughput::Elements(locations.len() as u64));
    group.bench_function("normalize_location", |b| {
        b.iter(|| {
            for location in &locations {
                black_box(normalize_location(black_box(location)));
            }
        })
    });

    group.throughput(Throughput::Elements(1));
    group.bench_function("split_nested", |b| {
        b.iter(|| split_nested(black_box("/opt/app/service.jar!/BOOT-INF/lib/snakeyaml-2.0.jar")))
    });

    group.finish();
}

fn bench_manifest_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("manifest_parsing");
    group.throughput(Throughput::Bytes(SPRING_MANIFEST.len() as u64));
    group.bench_function("spring_core_manifest", |b| {
        b.iter(|| Manifest::parse(black_box(SPRING_MANIFEST)))
    });
    group.finish();
}

fn bench_archive_resolution(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();

    let pom_jar = dir.path().join("jackson-databind.jar");
    write_jar(
        &pom_jar,
        &[
            ("META-INF/MANIFEST.MF", SPRING_MANIFEST.as_bytes()),
            (
                "META-INF/maven/com.fasterxml.jackson.core/jackson-databind/pom.properties",
                b"groupId=com.fasterxml.jackson.core\nartifactId=jackson-databind\nversion=2.15.2\n",
            ),
        ],
    );

    let manifest_jar = dir.path().join("spring-core.jar");
    write_jar(&manifest_jar, &[("META-INF/MANIFEST.MF", SPRING_MANIFEST.as_bytes())]);

    let resolver = ArchiveResolver::new();
    let mut group = c.benchmark_group("archive_resolution");
    group.throughput(Throughput::Elements(1));

    group.bench_function("pom_properties", |b| {
        b.iter(|| {
            let mut archive = JarArchive::open(&pom_jar).unwrap();
            resolver.resolve(&mut archive, black_box("/opt/app/lib/jackson-databind.jar")).unwrap()
        })
    });

    group.bench_function("manifest_fallback", |b| {
        b.iter(|| {
            let mut archive = JarArchive::open(&manifest_jar).unwrap();
            resolver.resolve(&mut archive, black_box("/opt/app/lib/spring-core.jar")).unwrap()
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_location_normalization,
    bench_manifest_parsing,
    bench_archive_resolution,
);
criterion_main!(benches);
