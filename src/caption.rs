use crate::metadata::PhotoMetadata;
use crate::select::PendingImage;
use crate::template;

/// Resolve the caption for an image. First match wins:
///
/// 1. An explicit caption, used verbatim. Deliberately not templated —
///    pasted text containing `{}` must never be rewritten under the user.
/// 2. The sidecar file next to the image, templated. A sidecar that exists
///    but is empty is a valid empty caption; its presence signals intent.
/// 3. The configured default caption, templated.
///
/// An unreadable sidecar logs a warning and falls through to the default;
/// caption trouble never aborts a run.
pub fn resolve(
    explicit: Option<&str>,
    image: &PendingImage,
    metadata: &PhotoMetadata,
    default_caption: &str,
) -> String {
    if let Some(text) = explicit {
        if !text.is_empty() {
            log::info!("Using explicit caption");
            return text.to_string();
        }
    }

    let raw = match read_sidecar(image) {
        Some(text) => text,
        None => {
            log::info!("Using default caption");
            default_caption.to_string()
        }
    };

    let rendered = template::render(&raw, image, metadata);
    for name in &rendered.unknown {
        log::warn!("Unknown caption variable {{{name}}} left as-is");
    }
    if rendered.text != raw {
        log::debug!("Caption template expanded: {raw:?} -> {:?}", rendered.text);
    }
    rendered.text
}

/// Read the sidecar caption file, if there is one.
fn read_sidecar(image: &PendingImage) -> Option<String> {
    let path = image.sidecar_path();
    if !path.exists() {
        return None;
    }
    match std::fs::read_to_string(&path) {
        Ok(text) => {
            log::info!("Using caption from {}", path.display());
            Some(text.trim_end().to_string())
        }
        Err(e) => {
            log::warn!("Cannot read caption file {}: {e}", path.display());
            None
        }
    }
}
