//! Input collection from files, directories, and glob patterns.

use anyhow::{anyhow, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::color_utils::symbols;

/// How unusable sources are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Any missing, unsupported, or empty source is an error
    #[default]
    Strict,
    /// Problems are logged and the source is skipped
    Permissive,
}

impl InputMode {
    pub fn from_strict_flag(strict: bool) -> Self {
        if strict {
            InputMode::Strict
        } else {
            InputMode::Permissive
        }
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, InputMode::Strict)
    }

    /// Fail in strict mode, warn and carry on otherwise
    fn complain(&self, message: String) -> Result<()> {
        if self.is_strict() {
            Err(anyhow!(message))
        } else {
            log::warn!("{}{message}", symbols::warning());
            Ok(())
        }
    }
}

/// Kind of source argument, recorded in metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    File,
    Directory,
    Glob,
}

impl SourceKind {
    pub fn classify(source: &str) -> Self {
        if Path::new(source).is_dir() {
            SourceKind::Directory
        } else if looks_like_glob(source) {
            SourceKind::Glob
        } else {
            SourceKind::File
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::File => "file",
            SourceKind::Directory => "directory",
            SourceKind::Glob => "glob",
        }
    }
}

fn looks_like_glob(source: &str) -> bool {
    source.contains(['*', '?', '['])
}

/// jpg, jpeg, png, webp, bmp, tiff, tif (case-insensitive)
pub fn is_supported_image_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| {
            matches!(
                ext.as_str(),
                "jpg" | "jpeg" | "png" | "webp" | "bmp" | "tiff" | "tif"
            )
        })
}

/// Non-recursive, sorted
pub fn find_images_in_directory(dir_path: &Path) -> Result<Vec<PathBuf>> {
    let mut image_files = Vec::new();
    for entry in fs::read_dir(dir_path)? {
        let path = entry?.path();
        if path.is_file() && is_supported_image_file(&path) {
            image_files.push(path);
        }
    }
    image_files.sort();
    Ok(image_files)
}

fn expand_glob(pattern: &str, mode: InputMode, out: &mut Vec<PathBuf>) -> Result<()> {
    let paths = match glob::glob(pattern) {
        Ok(paths) => paths,
        Err(_) => {
            return mode.complain(format!(
                "Source path does not exist and is not a valid glob pattern: {pattern}"
            ))
        }
    };

    let before = out.len();
    for entry in paths {
        match entry {
            Ok(path) if path.is_file() && is_supported_image_file(&path) => out.push(path),
            Ok(_) => {}
            Err(e) => log::warn!(
                "{}Error reading path in glob {pattern}: {e}",
                symbols::warning()
            ),
        }
    }

    if out.len() == before {
        mode.complain(format!("No image files found matching pattern: {pattern}"))?;
    }
    Ok(())
}

/// Resolve every source into a sorted, de-duplicated list of image paths
pub fn collect_images_from_sources(sources: &[String], mode: InputMode) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();

    for source in sources {
        let path = Path::new(source);
        if path.is_file() {
            if is_supported_image_file(path) {
                images.push(path.to_path_buf());
            } else {
                mode.complain(format!(
                    "File is not a supported image format: {}",
                    path.display()
                ))?;
            }
        } else if path.is_dir() {
            images.extend(find_images_in_directory(path)?);
        } else if looks_like_glob(source) {
            expand_glob(source, mode, &mut images)?;
        } else {
            mode.complain(format!("File does not exist: {source}"))?;
        }
    }

    images.sort();
    images.dedup();

    if images.is_empty() && mode.is_strict() {
        return Err(anyhow!("No image files found in the specified sources"));
    }

    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"not really an image").unwrap();
        path
    }

    #[test]
    fn test_is_supported_image_file() {
        for name in ["a.jpg", "a.jpeg", "a.png", "a.webp", "a.bmp", "a.tiff", "a.tif", "A.JPG"] {
            assert!(is_supported_image_file(Path::new(name)), "{name}");
        }
        for name in ["a.txt", "a.gif", "a"] {
            assert!(!is_supported_image_file(Path::new(name)), "{name}");
        }
    }

    #[test]
    fn test_directory_is_filtered_and_sorted() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "b.png");
        touch(dir.path(), "a.jpg");
        touch(dir.path(), "notes.txt");

        let images = find_images_in_directory(dir.path()).unwrap();
        let names: Vec<_> = images
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.png"]);
    }

    #[test]
    fn test_strict_mode_rejects_unsupported_file() {
        let dir = tempdir().unwrap();
        let image = touch(dir.path(), "room.jpg");
        let text = touch(dir.path(), "room.txt");

        let ok = collect_images_from_sources(
            &[image.to_string_lossy().to_string()],
            InputMode::Strict,
        )
        .unwrap();
        assert_eq!(ok, vec![image]);

        assert!(collect_images_from_sources(
            &[text.to_string_lossy().to_string()],
            InputMode::Strict
        )
        .is_err());
    }

    #[test]
    fn test_permissive_mode_skips_bad_sources() {
        let dir = tempdir().unwrap();
        let image = touch(dir.path(), "room.jpg");
        let text = touch(dir.path(), "room.txt");
        let missing = dir.path().join("missing.png");

        let sources = vec![
            image.to_string_lossy().to_string(),
            text.to_string_lossy().to_string(),
            missing.to_string_lossy().to_string(),
        ];
        let images = collect_images_from_sources(&sources, InputMode::Permissive).unwrap();
        assert_eq!(images, vec![image]);
    }

    #[test]
    fn test_glob_and_duplicates() {
        let dir = tempdir().unwrap();
        let a = touch(dir.path(), "a.png");
        let b = touch(dir.path(), "b.png");
        touch(dir.path(), "c.jpg");

        let pattern = dir.path().join("*.png").to_string_lossy().to_string();
        let sources = vec![pattern.clone(), a.to_string_lossy().to_string()];
        let images = collect_images_from_sources(&sources, InputMode::Strict).unwrap();
        assert_eq!(images, vec![a, b]);
        assert_eq!(SourceKind::classify(&pattern), SourceKind::Glob);
    }

    #[test]
    fn test_empty_glob_strict_vs_permissive() {
        let dir = tempdir().unwrap();
        let pattern = dir.path().join("*.webp").to_string_lossy().to_string();
        assert!(collect_images_from_sources(&[pattern.clone()], InputMode::Strict).is_err());
        assert!(collect_images_from_sources(&[pattern], InputMode::Permissive)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_source_kind() {
        let dir = tempdir().unwrap();
        let dir_str = dir.path().to_string_lossy().to_string();
        assert_eq!(SourceKind::classify(&dir_str), SourceKind::Directory);
        assert_eq!(SourceKind::classify("room.jpg").as_str(), "file");
        assert_eq!(InputMode::from_strict_flag(false), InputMode::Permissive);
    }
}
