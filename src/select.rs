use std::io;
use std::path::{Path, PathBuf};

/// File extensions eligible for posting (matched case-insensitively).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Sidecar caption files live next to the image as `<name>.<ext>.caption.txt`.
pub const SIDECAR_SUFFIX: &str = ".caption.txt";

/// A pending image picked from the watched directory.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingImage {
    pub path: PathBuf,
    /// Lowercased extension from the supported set.
    pub extension: String,
}

impl PendingImage {
    /// Wrap a path as a pending image, if its extension is supported.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        if !SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
            return None;
        }
        Some(Self {
            path: path.to_path_buf(),
            extension: ext,
        })
    }

    /// Where this image's sidecar caption file would live. The sidecar is
    /// optional; this path is derived, not checked for existence.
    pub fn sidecar_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(SIDECAR_SUFFIX);
        PathBuf::from(name)
    }

    /// File name with extension, e.g. `sunset.jpg`.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File name without extension, e.g. `sunset`.
    pub fn file_stem(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Pick the next image to post from the pending directory.
///
/// Flat scan (no recursion), lexicographic ascending by file name, first
/// eligible file wins. Sidecar text files are never candidates. An empty
/// directory yields `Ok(None)` — a normal "nothing to do" state, not an
/// error. The scan has no hidden state, so repeated calls without a move
/// return the same file.
pub fn select_next(pending_dir: &Path) -> io::Result<Option<PendingImage>> {
    let mut candidates: Vec<PathBuf> = Vec::new();

    for entry in std::fs::read_dir(pending_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && PendingImage::from_path(&path).is_some() {
            candidates.push(path);
        }
    }

    candidates.sort_by_key(|p| p.file_name().map(|n| n.to_owned()));

    match candidates.first() {
        Some(path) => {
            log::info!("Selected image: {}", path.display());
            Ok(PendingImage::from_path(path))
        }
        None => {
            log::info!("No pending images in {}", pending_dir.display());
            Ok(None)
        }
    }
}
