//! Shared fixtures: builds JAR files with the zip writer.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Writes a JAR with the given `(entry name, content)` pairs.
pub fn write_jar(path: &Path, entries: &[(&str, &[u8])]) {
    let file = std::fs::File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    for (name, content) in entries {
        if name.ends_with('/') {
            zip.add_directory(*name, options).unwrap();
        } else {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content).unwrap();
        }
    }
    zip.finish().unwrap();
}

/// Builds a JAR in a temp dir and returns its bytes.
pub fn jar_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested.jar");
    write_jar(&path, entries);
    std::fs::read(path).unwrap()
}

pub fn pom_properties(group: &str, artifact: &str, version: &str) -> Vec<u8> {
    format!("#Generated by Maven\ngroupId={group}\nartifactId={artifact}\nversion={version}\n")
        .into_bytes()
}

pub fn pom_entry(group: &str, artifact: &str) -> String {
    format!("META-INF/maven/{group}/{artifact}/pom.properties")
}

/// A library JAR identified by pom.properties.
pub fn maven_jar(dir: &Path, file_name: &str, group: &str, artifact: &str, version: &str) -> PathBuf {
    let path = dir.join(file_name);
    let pom = pom_properties(group, artifact, version);
    write_jar(
        &path,
        &[
            ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\r\n\r\n"),
            (&pom_entry(group, artifact), &pom),
        ],
    );
    path
}

/// A JAR identified only by its manifest.
pub fn manifest_jar(dir: &Path, file_name: &str, manifest: &str) -> PathBuf {
    let path = dir.join(file_name);
    write_jar(&path, &[("META-INF/MANIFEST.MF", manifest.as_bytes())]);
    path
}

pub fn path_str(path: &Path) -> String {
    path.display().to_string()
}
