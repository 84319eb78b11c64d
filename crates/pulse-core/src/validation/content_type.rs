use std::path::Path;

/// Media types that are never accepted, whatever the allow-list says.
const EXECUTABLE_CONTENT_TYPES: &[&str] = &[
    "application/x-msdownload",
    "application/x-dosexec",
    "application/x-executable",
    "application/x-sharedlib",
    "application/x-sh",
    "application/x-msi",
    "application/vnd.microsoft.portable-executable",
];

/// Extensions that are never accepted, whatever the allow-list says.
const EXECUTABLE_EXTENSIONS: &[&str] = &[
    "exe", "dll", "com", "bat", "cmd", "msi", "scr", "ps1", "sh", "elf", "so",
];

/// Normalize a declared `Content-Type`: parameters stripped, lower-cased.
pub fn normalize_media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
        .to_lowercase()
}

/// Lower-cased extension of `filename`, if any.
pub(crate) fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .filter(|e| !e.is_empty())
}

/// True if either the media type or the extension names an executable.
pub fn is_executable(media_type: &str, extension: Option<&str>) -> bool {
    let media_type = normalize_media_type(media_type);
    EXECUTABLE_CONTENT_TYPES.contains(&media_type.as_str())
        || extension.is_some_and(|ext| EXECUTABLE_EXTENSIONS.contains(&ext))
}

/// Content types a file with this extension may legitimately declare.
/// `None` means the extension is not known and is not cross-checked.
pub fn expected_content_types(extension: &str) -> Option<&'static [&'static str]> {
    let types: &'static [&'static str] = match extension {
        "jpg" | "jpeg" => &["image/jpeg"],
        "png" => &["image/png"],
        "gif" => &["image/gif"],
        "webp" => &["image/webp"],
        "svg" => &["image/svg+xml"],
        "pdf" => &["application/pdf"],
        "doc" => &["application/msword"],
        "docx" => &["application/vnd.openxmlformats-officedocument.wordprocessingml.document"],
        "xls" => &["application/vnd.ms-excel"],
        "xlsx" => &["application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"],
        "ppt" => &["application/vnd.ms-powerpoint"],
        "pptx" => &["application/vnd.openxmlformats-officedocument.presentationml.presentation"],
        "txt" | "log" | "md" => &["text/plain", "text/markdown"],
        "csv" => &["text/csv", "application/csv"],
        "json" => &["application/json"],
        "zip" => &["application/zip"],
        _ => return None,
    };
    Some(types)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_parameters_and_case() {
        assert_eq!(normalize_media_type("Text/Plain; charset=UTF-8"), "text/plain");
        assert_eq!(normalize_media_type(" application/pdf "), "application/pdf");
    }

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(extension_of("REPORT.PDF").as_deref(), Some("pdf"));
        assert_eq!(extension_of("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(extension_of("README"), None);
        assert_eq!(extension_of("trailing."), None);
    }

    #[test]
    fn executables_detected_by_type_or_extension() {
        assert!(is_executable("application/x-msdownload", Some("pdf")));
        assert!(is_executable("application/pdf", Some("exe")));
        assert!(!is_executable("application/pdf", Some("pdf")));
    }
}
