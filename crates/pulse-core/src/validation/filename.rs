use crate::constants::MAX_FILENAME_LENGTH;

/// Reduce a client-supplied filename to a safe display name.
///
/// Directory components (`/` and `\`) and control characters are stripped and
/// the result is truncated to [`MAX_FILENAME_LENGTH`] characters, shortening
/// the stem so the extension survives. Names that contain NUL or that reduce
/// to nothing (or to `.`/`..`) are rejected.
pub fn sanitize_filename(filename: &str) -> Result<String, String> {
    clean_filename(filename).map(|name| truncate_keeping_extension(&name))
}

/// Strip directory components and control characters without truncating.
/// The policy reads the extension from this form.
pub(crate) fn clean_filename(filename: &str) -> Result<String, String> {
    if filename.contains('\0') {
        return Err("Filename contains a NUL character".to_string());
    }

    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);

    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control())
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        return Err("Filename is empty after sanitization".to_string());
    }

    Ok(cleaned.to_string())
}

fn truncate_keeping_extension(name: &str) -> String {
    if name.chars().count() <= MAX_FILENAME_LENGTH {
        return name.to_string();
    }

    if let Some((stem, extension)) = name.rsplit_once('.') {
        let suffix_len = extension.chars().count() + 1;
        if !stem.is_empty() && suffix_len < MAX_FILENAME_LENGTH {
            let stem: String = stem.chars().take(MAX_FILENAME_LENGTH - suffix_len).collect();
            return format!("{}.{}", stem, extension);
        }
    }

    name.chars().take(MAX_FILENAME_LENGTH).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_directory_components() {
        assert_eq!(sanitize_filename("../../etc/passwd.txt").unwrap(), "passwd.txt");
        assert_eq!(sanitize_filename("C:\\Users\\me\\notes.txt").unwrap(), "notes.txt");
        assert_eq!(sanitize_filename("plain.pdf").unwrap(), "plain.pdf");
    }

    #[test]
    fn strips_control_characters() {
        assert_eq!(sanitize_filename("re\u{7}port\n.pdf").unwrap(), "report.pdf");
    }

    #[test]
    fn rejects_nul_and_empty() {
        assert!(sanitize_filename("evil\0.pdf").is_err());
        assert!(sanitize_filename("").is_err());
        assert!(sanitize_filename("dir/").is_err());
        assert!(sanitize_filename("..").is_err());
        assert!(sanitize_filename("\u{1b}\u{7}").is_err());
    }

    #[test]
    fn truncation_keeps_extension() {
        let long = format!("{}.txt", "a".repeat(400));
        let name = sanitize_filename(&long).unwrap();
        assert_eq!(name.chars().count(), MAX_FILENAME_LENGTH);
        assert!(name.ends_with(".txt"));

        let disguised = format!("{}.pdf.exe", "a".repeat(251));
        let name = sanitize_filename(&disguised).unwrap();
        assert_eq!(name.chars().count(), MAX_FILENAME_LENGTH);
        assert!(name.ends_with(".exe"));
    }

    #[test]
    fn truncation_without_usable_extension() {
        let long = "b".repeat(300);
        assert_eq!(sanitize_filename(&long).unwrap(), "b".repeat(MAX_FILENAME_LENGTH));

        let long_extension = format!("x.{}", "c".repeat(300));
        assert_eq!(
            sanitize_filename(&long_extension).unwrap().chars().count(),
            MAX_FILENAME_LENGTH
        );
    }

    #[test]
    fn clean_filename_does_not_truncate() {
        let long = format!("{}.txt", "a".repeat(400));
        assert_eq!(clean_filename(&long).unwrap(), long);
    }
}
