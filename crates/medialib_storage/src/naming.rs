//! Storage filename generation.

use chrono::Utc;
use uuid::Uuid;

/// Collision-resistant stored name: `<unix-millis>-<16 hex>-<sanitized original>`.
pub fn generate_file_name(original: &str) -> String {
    let entropy = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}",
        Utc::now().timestamp_millis(),
        &entropy[..16],
        sanitize_file_name(original)
    )
}

/// Make a name safe to use as a single path segment on every backend.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '?' | '#' | '%' => '-',
            c if c.is_whitespace() || c.is_control() => '-',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_names_differ() {
        let a = generate_file_name("logo.png");
        let b = generate_file_name("logo.png");
        assert_ne!(a, b);
        assert!(a.ends_with("-logo.png"));
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_file_name("my photo.png"), "my-photo.png");
        assert_eq!(sanitize_file_name("../etc/passwd"), "-etc-passwd");
        assert_eq!(sanitize_file_name("   "), "file");
        assert_eq!(sanitize_file_name("100%.jpg"), "100-.jpg");
    }
}
