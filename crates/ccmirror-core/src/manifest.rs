//! Checksum manifest attached to every release.
//!
//! Format: one `<platform_key>  <sha256_hex>` line per platform (two
//! spaces), sorted by platform key, trailing newline. The ordering is part
//! of the format: byte-identical output for identical digests, no matter
//! what order downloads finished in.

use crate::platform::Platform;

/// Asset name the manifest is uploaded under.
pub const MANIFEST_ASSET_NAME: &str = "checksums.txt";

/// Render the checksum manifest for the given digests. Input order is
/// irrelevant; digests are normalised to lowercase.
pub fn render(entries: &[(Platform, String)]) -> String {
    let mut sorted: Vec<(Platform, String)> = entries
        .iter()
        .map(|(p, digest)| (*p, digest.to_ascii_lowercase()))
        .collect();
    sorted.sort_by_key(|(p, _)| p.key());

    let mut out = String::new();
    for (platform, digest) in &sorted {
        out.push_str(platform.key());
        out.push_str("  ");
        out.push_str(digest);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entries() -> Vec<(Platform, String)> {
        Platform::ALL
            .iter()
            .enumerate()
            .map(|(i, p)| (*p, format!("{:064x}", i + 1)))
            .collect()
    }

    #[test]
    fn one_line_per_platform_in_key_order() {
        let text = render(&sample_entries());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 7);
        for (line, platform) in lines.iter().zip(Platform::ALL) {
            assert!(line.starts_with(platform.key()));
            let (key, digest) = line.split_once("  ").unwrap();
            assert_eq!(key, platform.key());
            assert_eq!(digest.len(), 64);
        }
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn output_is_independent_of_input_order() {
        let entries = sample_entries();
        let mut reversed = entries.clone();
        reversed.reverse();
        assert_eq!(render(&entries), render(&reversed));
    }

    #[test]
    fn digests_are_lowercased() {
        let entries = vec![(Platform::LinuxX64, "ABCDEF".to_string())];
        assert_eq!(render(&entries), "linux-x64  abcdef\n");
    }
}
