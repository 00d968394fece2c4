use crate::key::rendition_key::RenditionKey;
use crate::rendition::model::{RenditionKind, VectorFormat};

/// Base name used when a rendition carries no usable name.
const FALLBACK_NAME: &str = "rendition";

/// Replace path separators and NUL so a name is safe as one path component.
pub fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c == '/' || c == '\0' { '_' } else { c })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => FALLBACK_NAME.to_string(),
        _ => cleaned,
    }
}

/// Extension for a uniform type identifier, if it names a well-known format.
pub fn extension_for_uti(uti: &str) -> Option<&'static str> {
    Some(match uti {
        "public.json" => "json",
        "public.xml" => "xml",
        "public.html" => "html",
        "public.plain-text" | "public.utf8-plain-text" => "txt",
        "public.png" => "png",
        "public.jpeg" => "jpg",
        "public.heic" | "public.heif" => "heic",
        "com.compuserve.gif" => "gif",
        "public.tiff" => "tiff",
        "public.svg-image" => "svg",
        "com.adobe.pdf" => "pdf",
        "com.apple.property-list" | "com.apple.xml-property-list" => "plist",
        "public.mp3" => "mp3",
        "public.mpeg-4" => "mp4",
        "com.apple.quicktime-movie" => "mov",
        "public.truetype-ttf-font" => "ttf",
        "public.opentype-font" => "otf",
        "public.zip-archive" => "zip",
        "com.apple.coreml.model" => "mlmodel",
        "public.data" => "bin",
        _ => return None,
    })
}

/// Extension written for a decoded kind.
pub fn extension_for(kind: &RenditionKind) -> Option<&'static str> {
    match kind {
        RenditionKind::Image(_)
        | RenditionKind::MultisizeImage { .. }
        | RenditionKind::LayerStack(_)
        | RenditionKind::ImageAtlas(_)
        | RenditionKind::RecognitionImage { .. }
        | RenditionKind::Color(_) => Some("png"),
        RenditionKind::VectorImage(v) => Some(match v.document.format {
            VectorFormat::Pdf => "pdf",
            VectorFormat::Svg => "svg",
        }),
        RenditionKind::Data { uti_type, .. } => uti_type.as_deref().and_then(extension_for_uti),
        _ => None,
    }
}

/// Deterministic output filename: sanitized rendition name (facet name when empty) plus the
/// extension of `kind`, unless the name already ends with it.
pub fn file_name(key: &RenditionKey, kind: Option<&RenditionKind>) -> String {
    let raw = if key.rendition_name.is_empty() {
        &key.name
    } else {
        &key.rendition_name
    };
    let base = sanitize(raw);
    match kind.and_then(extension_for) {
        Some(ext) if !has_extension(&base, ext) => format!("{base}.{ext}"),
        _ => base,
    }
}

fn has_extension(name: &str, ext: &str) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(stem, e)| !stem.is_empty() && e.eq_ignore_ascii_case(ext))
}

#[cfg(test)]
#[path = "../../tests/unit/export/naming.rs"]
mod tests;
