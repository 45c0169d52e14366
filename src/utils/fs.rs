// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use glob::glob;
use std::fs::FileTimes;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Format used for modification times in reports.
pub const MODIFIED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Expand a local source argument into files.
///
/// Glob patterns must match at least one file. Directories are rejected.
pub fn resolve_source_files(source: &Path) -> Result<Vec<PathBuf>> {
    let source_str = source.to_string_lossy();

    if source_str.contains('*') || source_str.contains('?') || source_str.contains('[') {
        let mut files = Vec::new();
        for entry in
            glob(&source_str).with_context(|| format!("Invalid glob pattern: {source_str}"))?
        {
            match entry {
                Ok(path) if path.is_file() => files.push(path),
                Ok(_) => {}
                Err(e) => tracing::warn!("Failed to read glob entry: {}", e),
            }
        }
        if files.is_empty() {
            anyhow::bail!("No files match pattern: {source_str}");
        }
        files.sort();
        Ok(files)
    } else if source.is_dir() {
        anyhow::bail!(
            "Source is a directory. Use a glob pattern like '{source_str}/*' to transfer its files"
        );
    } else {
        // Missing files are kept; the transfer records them per row.
        Ok(vec![source.to_path_buf()])
    }
}

/// Resolve every source argument, keeping order and dropping duplicates.
pub fn resolve_all_sources(sources: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();
    for source in sources {
        for file in resolve_source_files(source)? {
            if !files.contains(&file) {
                files.push(file);
            }
        }
    }
    Ok(files)
}

// Helper function to format bytes in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", size as u64, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

pub fn format_modified(time: SystemTime) -> String {
    DateTime::<Local>::from(time).format(MODIFIED_FORMAT).to_string()
}

/// Copy `src` to `dst`, overwriting it, then carry over the access and
/// modification times.
pub async fn copy_preserving_metadata(src: &Path, dst: &Path) -> io::Result<u64> {
    let bytes = tokio::fs::copy(src, dst).await?;
    let metadata = tokio::fs::metadata(src).await?;

    let mut times = FileTimes::new().set_modified(metadata.modified()?);
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }

    let dst = dst.to_path_buf();
    tokio::task::spawn_blocking(move || {
        std::fs::File::options()
            .write(true)
            .open(&dst)?
            .set_times(times)
    })
    .await
    .map_err(io::Error::other)??;

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(120), "120 B");
        assert_eq!(format_bytes(2048), "2.00 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.00 MB");
    }

    #[test]
    fn test_resolve_glob_and_plain_paths() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::write(dir.path().join("b.txt"), "b").unwrap();
        std::fs::write(dir.path().join("c.log"), "c").unwrap();

        let pattern = dir.path().join("*.txt");
        let files = resolve_source_files(&pattern).unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("a.txt"), dir.path().join("b.txt")]
        );

        let missing = dir.path().join("missing.txt");
        assert_eq!(resolve_source_files(&missing).unwrap(), vec![missing]);

        assert!(resolve_source_files(dir.path()).is_err());
        assert!(resolve_source_files(&dir.path().join("*.csv")).is_err());
    }

    #[test]
    fn test_resolve_all_sources_dedups() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();

        let files = resolve_all_sources(&[
            dir.path().join("a.txt"),
            dir.path().join("*.txt"),
        ])
        .unwrap();
        assert_eq!(files, vec![dir.path().join("a.txt")]);
    }

    #[tokio::test]
    async fn test_copy_preserves_modified_time() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src.bin");
        let dst = dir.path().join("dst.bin");
        std::fs::write(&src, b"payload").unwrap();
        std::fs::write(&dst, b"old contents that are longer").unwrap();

        let mtime = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        std::fs::File::options()
            .write(true)
            .open(&src)
            .unwrap()
            .set_times(FileTimes::new().set_modified(mtime))
            .unwrap();

        let copied = copy_preserving_metadata(&src, &dst).await.unwrap();
        assert_eq!(copied, 7);
        assert_eq!(std::fs::read(&dst).unwrap(), b"payload");
        assert_eq!(std::fs::metadata(&dst).unwrap().modified().unwrap(), mtime);
        assert_eq!(
            format_modified(std::fs::metadata(&dst).unwrap().modified().unwrap()),
            format_modified(mtime)
        );
    }
}
