//! The posting pipeline.
//!
//! One run moves through select → caption → upload → archive. The single
//! hard invariant: a file leaves the pending directory only after the
//! platform confirmed the upload, and it leaves by rename so a crash can
//! never strand it half-moved.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::caption;
use crate::config::{Config, Directories};
use crate::metadata;
use crate::select::{self, PendingImage};
use crate::uploader::{PostId, Uploader};

/// Per-run inputs from the command line.
#[derive(Debug, Default)]
pub struct RunRequest {
    /// Post this exact file instead of scanning the pending directory.
    pub image: Option<PathBuf>,
    /// Explicit caption, used verbatim (never templated).
    pub caption: Option<String>,
    /// Resolve and report the caption without uploading or moving anything.
    pub dry_run: bool,
}

/// How a run ended, when it did not fail.
#[derive(Debug)]
pub enum RunOutcome {
    /// Uploaded and archived.
    Posted {
        image: PendingImage,
        post_id: PostId,
        caption: String,
    },
    /// Dry run: caption resolved, nothing touched.
    DryRun { image: PendingImage, caption: String },
    /// Pending directory is empty. A normal no-op, not an error.
    NothingToUpload,
}

/// Fatal run outcomes. Each variant is a distinct, reportable kind; the CLI
/// maps all of them to a non-zero exit.
#[derive(Debug, Error)]
pub enum RunError {
    /// Bad explicit path or unsupported extension. No side effects.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The platform rejected the upload. Pending state untouched;
    /// re-running the tool is the retry mechanism.
    #[error("Upload failed: {0}")]
    UploadFailed(anyhow::Error),
    /// The selected file disappeared before it could be posted.
    #[error("Selected file vanished: {0}")]
    FileVanished(PathBuf),
    /// Upload succeeded but the move to the processed directory failed.
    /// Loud by design: the file is still discoverable as pending, so the
    /// next run would post it again.
    #[error("Uploaded as post {post_id} but failed to archive {path}: {source}")]
    ArchiveFailed {
        post_id: PostId,
        path: PathBuf,
        source: io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Run the pipeline once: post at most one image.
pub async fn run(
    request: &RunRequest,
    uploader: &dyn Uploader,
    config: &Config,
) -> Result<RunOutcome, RunError> {
    ensure_directories(&config.directories)?;

    // Select
    let image = match &request.image {
        Some(path) => validate_explicit(path)?,
        None => match select::select_next(&config.directories.pending_dir)? {
            Some(image) => image,
            None => return Ok(RunOutcome::NothingToUpload),
        },
    };

    // Caption
    let meta = metadata::extract(&image.path);
    let caption = caption::resolve(
        request.caption.as_deref(),
        &image,
        &meta,
        &config.default_caption,
    );

    if request.dry_run {
        log::info!(
            "DRY RUN — would post {} with caption {caption:?}",
            image.file_name()
        );
        return Ok(RunOutcome::DryRun { image, caption });
    }

    // Upload. The selection scan holds no lock, so the file may have been
    // removed externally in the meantime.
    let bytes = match std::fs::read(&image.path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(RunError::FileVanished(image.path.clone()));
        }
        Err(e) => return Err(RunError::Io(e)),
    };

    log::info!(
        "Uploading {} via {} ({} bytes)",
        image.file_name(),
        uploader.name(),
        bytes.len()
    );
    let post_id = uploader
        .upload(&bytes, &caption)
        .await
        .map_err(RunError::UploadFailed)?;
    log::info!("Published post {post_id}");

    // Archive
    archive(&image, &post_id, &config.directories.processed_dir)?;

    Ok(RunOutcome::Posted {
        image,
        post_id,
        caption,
    })
}

/// Check an explicitly given image path before skipping selection.
fn validate_explicit(path: &Path) -> Result<PendingImage, RunError> {
    if !path.is_file() {
        return Err(RunError::InvalidInput(format!(
            "image not found: {}",
            path.display()
        )));
    }
    PendingImage::from_path(path).ok_or_else(|| {
        RunError::InvalidInput(format!("unsupported image type: {}", path.display()))
    })
}

fn ensure_directories(dirs: &Directories) -> io::Result<()> {
    std::fs::create_dir_all(&dirs.pending_dir)?;
    std::fs::create_dir_all(&dirs.processed_dir)?;
    Ok(())
}

/// Move the posted image (and its sidecar, if any) out of the pending set.
///
/// Renames only — copy-then-delete could leave two pending-looking copies
/// after a crash. Any failure here happens after a confirmed upload, so it
/// is reported as [`RunError::ArchiveFailed`] carrying the post id rather
/// than being folded into an upload error.
fn archive(image: &PendingImage, post_id: &PostId, processed_dir: &Path) -> Result<(), RunError> {
    let dest = processed_dir.join(image.file_name());
    std::fs::rename(&image.path, &dest).map_err(|source| RunError::ArchiveFailed {
        post_id: post_id.clone(),
        path: image.path.clone(),
        source,
    })?;
    log::info!("Archived {} -> {}", image.path.display(), dest.display());

    let sidecar = image.sidecar_path();
    if sidecar.exists() {
        let sidecar_dest = processed_dir.join(
            sidecar
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );
        std::fs::rename(&sidecar, &sidecar_dest).map_err(|source| RunError::ArchiveFailed {
            post_id: post_id.clone(),
            path: sidecar.clone(),
            source,
        })?;
        log::info!(
            "Archived {} -> {}",
            sidecar.display(),
            sidecar_dest.display()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[derive(Default)]
    struct MockUploader {
        fail: bool,
        calls: AtomicUsize,
        captions: Mutex<Vec<String>>,
    }

    impl MockUploader {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl Uploader for MockUploader {
        fn name(&self) -> &str {
            "mock"
        }

        async fn upload(&self, _image: &[u8], caption: &str) -> Result<PostId> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.captions.lock().unwrap().push(caption.to_string());
            if self.fail {
                anyhow::bail!("simulated rejection");
            }
            Ok(PostId("post-1".to_string()))
        }
    }

    fn test_config(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.directories.pending_dir = dir.path().join("pending");
        config.directories.processed_dir = dir.path().join("processed");
        config
    }

    fn stage(config: &Config, name: &str, contents: &[u8]) -> PathBuf {
        let path = config.directories.pending_dir.join(name);
        fs::create_dir_all(&config.directories.pending_dir).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn end_to_end_posts_first_alphabetical() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir);
        config.default_caption = "default cap".to_string();
        stage(&config, "a.jpg", b"aaa");
        stage(&config, "b.png", b"bbb");
        stage(&config, "b.png.caption.txt", b"hi {FILE_NAME}");

        let uploader = MockUploader::default();
        let outcome = run(&RunRequest::default(), &uploader, &config)
            .await
            .unwrap();

        match outcome {
            RunOutcome::Posted {
                image,
                post_id,
                caption,
            } => {
                assert_eq!(image.file_name(), "a.jpg");
                assert_eq!(post_id, PostId("post-1".to_string()));
                assert_eq!(caption, "default cap");
            }
            other => panic!("expected Posted, got {other:?}"),
        }

        // a.jpg archived; b.png and its sidecar untouched in pending.
        assert!(config.directories.processed_dir.join("a.jpg").exists());
        assert!(!config.directories.pending_dir.join("a.jpg").exists());
        assert!(config.directories.pending_dir.join("b.png").exists());
        assert!(
            config
                .directories
                .pending_dir
                .join("b.png.caption.txt")
                .exists()
        );
        assert_eq!(uploader.call_count(), 1);
    }

    #[tokio::test]
    async fn upload_failure_leaves_pending_untouched() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let image = stage(&config, "a.jpg", b"original bytes");
        let sidecar = stage(&config, "a.jpg.caption.txt", b"cap");

        let uploader = MockUploader::failing();
        let err = run(&RunRequest::default(), &uploader, &config)
            .await
            .unwrap_err();

        assert!(matches!(err, RunError::UploadFailed(_)));
        assert_eq!(fs::read(&image).unwrap(), b"original bytes");
        assert_eq!(fs::read(&sidecar).unwrap(), b"cap");
        assert_eq!(
            fs::read_dir(&config.directories.processed_dir)
                .unwrap()
                .count(),
            0
        );
    }

    #[tokio::test]
    async fn sidecar_is_archived_with_image() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        stage(&config, "a.jpg", b"img");
        stage(&config, "a.jpg.caption.txt", b"from sidecar {FILE_NAME}");

        let uploader = MockUploader::default();
        run(&RunRequest::default(), &uploader, &config)
            .await
            .unwrap();

        assert!(config.directories.processed_dir.join("a.jpg").exists());
        assert!(
            config
                .directories
                .processed_dir
                .join("a.jpg.caption.txt")
                .exists()
        );
        assert_eq!(
            uploader.captions.lock().unwrap().as_slice(),
            ["from sidecar a"]
        );
    }

    #[tokio::test]
    async fn empty_pending_is_nothing_to_upload() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);

        let uploader = MockUploader::default();
        let outcome = run(&RunRequest::default(), &uploader, &config)
            .await
            .unwrap();

        assert!(matches!(outcome, RunOutcome::NothingToUpload));
        assert_eq!(uploader.call_count(), 0);
    }

    #[tokio::test]
    async fn explicit_missing_path_is_invalid_input() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);

        let request = RunRequest {
            image: Some(dir.path().join("nope.jpg")),
            ..Default::default()
        };
        let err = run(&request, &MockUploader::default(), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn explicit_unsupported_extension_is_invalid_input() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let path = dir.path().join("doc.pdf");
        fs::write(&path, b"pdf").unwrap();

        let request = RunRequest {
            image: Some(path),
            ..Default::default()
        };
        let err = run(&request, &MockUploader::default(), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn explicit_image_skips_selection() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        stage(&config, "a.jpg", b"pending one");
        let outside = dir.path().join("chosen.jpg");
        fs::write(&outside, b"chosen").unwrap();

        let request = RunRequest {
            image: Some(outside.clone()),
            ..Default::default()
        };
        let outcome = run(&request, &MockUploader::default(), &config)
            .await
            .unwrap();

        match outcome {
            RunOutcome::Posted { image, .. } => assert_eq!(image.file_name(), "chosen.jpg"),
            other => panic!("expected Posted, got {other:?}"),
        }
        // The alphabetically-first pending file was not involved.
        assert!(config.directories.pending_dir.join("a.jpg").exists());
    }

    #[tokio::test]
    async fn explicit_caption_reaches_uploader_verbatim() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        stage(&config, "a.jpg", b"img");

        let uploader = MockUploader::default();
        let request = RunRequest {
            caption: Some("Look at {FILE_NAME}".to_string()),
            ..Default::default()
        };
        run(&request, &uploader, &config).await.unwrap();

        assert_eq!(
            uploader.captions.lock().unwrap().as_slice(),
            ["Look at {FILE_NAME}"]
        );
    }

    #[tokio::test]
    async fn archive_failure_is_distinct_from_upload_failure() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        stage(&config, "a.jpg", b"img");
        // Block the rename target: a directory at processed/a.jpg.
        fs::create_dir_all(config.directories.processed_dir.join("a.jpg")).unwrap();

        let uploader = MockUploader::default();
        let err = run(&RunRequest::default(), &uploader, &config)
            .await
            .unwrap_err();

        // The upload did happen; the failure is archive-only and carries
        // the post id so the duplicate-post risk can be reported.
        assert_eq!(uploader.call_count(), 1);
        match err {
            RunError::ArchiveFailed { post_id, path, .. } => {
                assert_eq!(post_id, PostId("post-1".to_string()));
                assert_eq!(path, config.directories.pending_dir.join("a.jpg"));
            }
            other => panic!("expected ArchiveFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn dry_run_touches_nothing() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir);
        config.default_caption = "cap {FILE_NAME}".to_string();
        stage(&config, "a.jpg", b"img");

        let uploader = MockUploader::default();
        let request = RunRequest {
            dry_run: true,
            ..Default::default()
        };
        let outcome = run(&request, &uploader, &config).await.unwrap();

        match outcome {
            RunOutcome::DryRun { caption, .. } => assert_eq!(caption, "cap a"),
            other => panic!("expected DryRun, got {other:?}"),
        }
        assert_eq!(uploader.call_count(), 0);
        assert!(config.directories.pending_dir.join("a.jpg").exists());
    }
}
