//! # shutterpost
//!
//! Hands-off photo posting: pick the next pending image from a watched
//! directory, build a caption from its EXIF metadata, upload it through a
//! platform endpoint, and archive the file so it is never posted twice.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shutterpost::config::Config;
//! use shutterpost::pipeline::{self, RunOutcome, RunRequest};
//! use shutterpost::uploader::HttpUploader;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(Some("config.json".as_ref()))?;
//!     let uploader = HttpUploader::new(
//!         config.service.endpoint.clone(),
//!         config.service.access_token.clone(),
//!     );
//!
//!     match pipeline::run(&RunRequest::default(), &uploader, &config).await? {
//!         RunOutcome::Posted { image, post_id, .. } => {
//!             println!("Posted {} as {post_id}", image.file_name());
//!         }
//!         RunOutcome::DryRun { caption, .. } => println!("Would post: {caption}"),
//!         RunOutcome::NothingToUpload => println!("Nothing to do"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Caption resolution
//!
//! First match wins:
//!
//! 1. An explicit `--caption`, used verbatim (no templating).
//! 2. A sidecar file next to the image (`photo.jpg.caption.txt`), templated.
//! 3. The configured default caption, templated.
//!
//! Templates use `{VARIABLE}` placeholders filled from the image's EXIF
//! data — see [`template::variables`] or `shutterpost --list-vars` for the
//! full registry. Missing metadata substitutes as an empty string; unknown
//! names stay verbatim with a warning.
//!
//! ## Modules
//!
//! - [`metadata`] — EXIF and dimension extraction, formatted human-readable
//! - [`template`] — placeholder substitution and the variable registry
//! - [`caption`] — tiered caption resolution
//! - [`select`] — pending-directory scan and image selection
//! - [`uploader`] — the upload capability trait and the HTTP implementation
//! - [`pipeline`] — the select → caption → upload → archive run
//! - [`config`] — configuration types and loading/saving

pub mod caption;
pub mod config;
pub mod metadata;
pub mod pipeline;
pub mod select;
pub mod template;
pub mod uploader;
