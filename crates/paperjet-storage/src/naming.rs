//! Destination-key naming for uploaded objects.
//!
//! Keys have the form `{timestamp_millis}_{sanitized_name}`. The
//! timestamp is the job's enqueue time, so a redelivered upload job
//! recomputes the exact same key and the store's overwriting put cannot
//! duplicate objects across retries.

use chrono::{DateTime, Utc};

/// Sanitize a file name for use in an object key.
///
/// Lowercases, collapses each run of characters outside `[a-z0-9.]` to a
/// single underscore, and trims leading/trailing underscores. Applying
/// it twice yields the same result as applying it once.
pub fn sanitize_file_name(file_name: &str) -> String {
    let mut out = String::with_capacity(file_name.len());
    let mut last_was_underscore = false;

    for c in file_name.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' {
            out.push(c);
            last_was_underscore = false;
        } else if !last_was_underscore {
            out.push('_');
            last_was_underscore = true;
        }
    }

    out.trim_matches('_').to_string()
}

/// Compute the object-store key for a staged file.
///
/// `enqueued_at` is the job's `created_at` — a stable per-job timestamp,
/// deliberately not the processing time.
pub fn destination_key(enqueued_at: DateTime<Utc>, staged_path: &str) -> String {
    let name = original_file_name(staged_path);
    format!("{}_{}", enqueued_at.timestamp_millis(), sanitize_file_name(name))
}

/// Recover the original file name from a staged path.
///
/// Takes the final path component and strips the `{millis}-` prefix the
/// staging handler adds to avoid collisions between concurrent uploads
/// of the same file name.
fn original_file_name(staged_path: &str) -> &str {
    let name = staged_path
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(staged_path);

    match name.split_once('-') {
        Some((prefix, rest)) if !prefix.is_empty() && prefix.bytes().all(|b| b.is_ascii_digit()) => {
            rest
        }
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sanitize_basic() {
        assert_eq!(sanitize_file_name("My Report.PDF"), "my_report.pdf");
        assert_eq!(sanitize_file_name("a  b--c.pdf"), "a_b_c.pdf");
        assert_eq!(sanitize_file_name("__hello__.txt"), "hello_.txt");
        assert_eq!(sanitize_file_name("!!!"), "");
    }

    #[test]
    fn test_sanitize_idempotent() {
        for name in ["My Report.PDF", "résumé (final) v2.pdf", "a..b..c", "&&&"] {
            let once = sanitize_file_name(name);
            assert_eq!(sanitize_file_name(&once), once);
        }
    }

    #[test]
    fn test_destination_key_shape() {
        let enqueued = chrono::Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let key = destination_key(enqueued, "uploads/1700000000000-My Report.PDF");
        assert_eq!(key, "1700000000123_my_report.pdf");
    }

    #[test]
    fn test_destination_key_stable_across_redelivery() {
        let enqueued = chrono::Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let first = destination_key(enqueued, "staging/1699_report.pdf");
        let second = destination_key(enqueued, "staging/1699_report.pdf");
        assert_eq!(first, second);
    }

    #[test]
    fn test_original_file_name_prefix_stripping() {
        assert_eq!(original_file_name("1700000000000-My Report.PDF"), "My Report.PDF");
        // No numeric prefix: used as-is.
        assert_eq!(original_file_name("notes-final.pdf"), "notes-final.pdf");
        assert_eq!(original_file_name("dir/sub/99-x.pdf"), "x.pdf");
    }
}
