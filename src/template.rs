//! Caption templating.
//!
//! Captions may contain `{VARIABLE_NAME}` placeholders that are filled in
//! from the image's metadata. The variable set is a static registry so the
//! `--list-vars` output and the render path can never drift apart.

use crate::metadata::PhotoMetadata;
use crate::select::PendingImage;

type Resolver = fn(&PendingImage, &PhotoMetadata) -> Option<String>;

/// One registered caption variable.
pub struct Variable {
    pub name: &'static str,
    pub description: &'static str,
    resolve: Resolver,
}

/// The full variable registry. Order here is presentation-free; use
/// [`variables`] for the sorted listing.
const REGISTRY: &[Variable] = &[
    Variable {
        name: "FILE_NAME",
        description: "Image file name without extension",
        resolve: |img, _| Some(img.file_stem()),
    },
    Variable {
        name: "FILE_NAME_FULL",
        description: "Image file name with extension",
        resolve: |img, _| Some(img.file_name()),
    },
    Variable {
        name: "IMAGE_MAKE",
        description: "Camera manufacturer (e.g. Canon, Nikon, Panasonic)",
        resolve: |_, meta| meta.make.clone(),
    },
    Variable {
        name: "IMAGE_MODEL",
        description: "Camera model (e.g. EOS 5D Mark IV, DMC-TZ8)",
        resolve: |_, meta| meta.model.clone(),
    },
    Variable {
        name: "IMAGE_MAKE_TAG",
        description: "Camera make as a hashtag-safe tag (e.g. nikoncorporation)",
        resolve: |_, meta| meta.make.as_deref().map(to_tag),
    },
    Variable {
        name: "IMAGE_MODEL_TAG",
        description: "Camera model as a hashtag-safe tag (e.g. eos5dmarkiv)",
        resolve: |_, meta| meta.model.as_deref().map(to_tag),
    },
    Variable {
        name: "IMAGE_F_NUMBER",
        description: "Aperture (f-stop) with \"f\" prefix (e.g. f6.3)",
        resolve: |_, meta| meta.f_number.clone(),
    },
    Variable {
        name: "IMAGE_EXPOSURE_TIME",
        description: "Shutter speed (e.g. 1/200 sec or 2.5 sec)",
        resolve: |_, meta| meta.exposure_time.clone(),
    },
    Variable {
        name: "IMAGE_ISO",
        description: "ISO sensitivity with \"ISO\" prefix",
        resolve: |_, meta| meta.sensitivity.as_deref().map(|v| format!("ISO {v}")),
    },
    Variable {
        name: "IMAGE_PHOTOGRAPHIC_SENSITIVITY",
        description: "ISO value only (number)",
        resolve: |_, meta| meta.sensitivity.clone(),
    },
    Variable {
        name: "IMAGE_FOCAL_LENGTH",
        description: "Focal length with \"mm\" suffix (e.g. 42.6 mm)",
        resolve: |_, meta| meta.focal_length.clone(),
    },
    Variable {
        name: "IMAGE_FOCAL_LENGTH_VALUE",
        description: "Focal length value only (number)",
        resolve: |_, meta| meta.focal_length_value.clone(),
    },
    Variable {
        name: "IMAGE_DATE",
        description: "Date the photo was taken",
        resolve: |_, meta| meta.date_time.as_deref().and_then(timestamp_date),
    },
    Variable {
        name: "IMAGE_TIME",
        description: "Time the photo was taken",
        resolve: |_, meta| meta.date_time.as_deref().and_then(timestamp_time),
    },
    Variable {
        name: "IMAGE_DATETIME",
        description: "Full capture date and time",
        resolve: |_, meta| meta.date_time.clone(),
    },
    Variable {
        name: "IMAGE_WIDTH",
        description: "Image width in pixels",
        resolve: |_, meta| meta.width.map(|w| w.to_string()),
    },
    Variable {
        name: "IMAGE_HEIGHT",
        description: "Image height in pixels",
        resolve: |_, meta| meta.height.map(|h| h.to_string()),
    },
    Variable {
        name: "IMAGE_ORIENTATION",
        description: "Image orientation (Portrait/Landscape/Square)",
        resolve: |_, meta| orientation(meta.width?, meta.height?),
    },
];

/// All registered variables, sorted by name. Backs `--list-vars`.
pub fn variables() -> Vec<&'static Variable> {
    let mut vars: Vec<&'static Variable> = REGISTRY.iter().collect();
    vars.sort_by_key(|v| v.name);
    vars
}

fn lookup(name: &str) -> Option<&'static Variable> {
    REGISTRY.iter().find(|v| v.name == name)
}

/// Normalize a value into a hashtag-safe tag: lowercase, then keep only
/// `[a-z0-9]`, so "Panasonic DMC-TZ8" becomes "panasonicdmctz8".
fn to_tag(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Date portion of a camera timestamp ("2021:06:05 11:22:33" or RFC 3339).
fn timestamp_date(ts: &str) -> Option<String> {
    ts.split([' ', 'T']).next().map(str::to_string)
}

/// Time portion of a camera timestamp, without any zone offset.
fn timestamp_time(ts: &str) -> Option<String> {
    let time = ts.split([' ', 'T']).nth(1)?;
    time.split(['+', '-', 'Z']).next().map(str::to_string)
}

fn orientation(width: u32, height: u32) -> Option<String> {
    let o = match width.cmp(&height) {
        std::cmp::Ordering::Greater => "Landscape",
        std::cmp::Ordering::Less => "Portrait",
        std::cmp::Ordering::Equal => "Square",
    };
    Some(o.to_string())
}

/// The output of a render pass.
#[derive(Debug)]
pub struct Rendered {
    pub text: String,
    /// Placeholder names that were not in the registry, left verbatim.
    pub unknown: Vec<String>,
}

/// Substitute `{NAME}` placeholders in a caption template.
///
/// Resolution policy:
/// - Unknown names stay verbatim in the output and are reported in
///   [`Rendered::unknown`] — a typo must not lose a post.
/// - Known names whose value is absent become the empty string.
/// - Substitution is a single pass; substituted values are never re-scanned,
///   so a value containing braces cannot trigger further expansion.
pub fn render(template: &str, image: &PendingImage, metadata: &PhotoMetadata) -> Rendered {
    let mut text = String::with_capacity(template.len());
    let mut unknown = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        text.push_str(&rest[..open]);
        let tail = &rest[open + 1..];

        let close = tail.find('}');
        let is_name = close.is_some_and(|c| {
            c > 0
                && tail[..c]
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'_')
        });

        if let (Some(close), true) = (close, is_name) {
            let name = &tail[..close];
            match lookup(name) {
                Some(var) => {
                    let value = (var.resolve)(image, metadata).unwrap_or_default();
                    log::debug!("Replaced {{{name}}} with {value:?}");
                    text.push_str(&value);
                }
                None => {
                    unknown.push(name.to_string());
                    text.push('{');
                    text.push_str(name);
                    text.push('}');
                }
            }
            rest = &tail[close + 1..];
        } else {
            // Stray or unclosed brace: copy it through untouched.
            text.push('{');
            rest = tail;
        }
    }

    text.push_str(rest);
    Rendered { text, unknown }
}
