//! Ledger rendering
//!
//! Rewrites the version list of the ledger, patches checksum and URL lines
//! in place, and inserts newly discovered releases. Text outside the edited
//! lines is carried over byte for byte.

use super::{MISSING_URL, PENDING_CHECKSUM, ReleaseEntry, UNKNOWN_DATE, parse_heading};
use crate::core::version::{Platform, VersionKey};
use crate::error::LedgerError;
use std::collections::HashMap;

const LATEST_STABLE: &str = "### latest stable release";
const OLDER_VERSIONS: &str = "### older versions";
const VERSION_HISTORY: &str = "## version history";
const HOW_TO_VERIFY: &str = "## how to verify downloads";

/// Checksums and URL corrections to patch into an existing ledger
#[derive(Debug, Clone, Default)]
pub struct LedgerUpdates {
    pub sha_by_url: HashMap<String, String>,
    pub sha_by_version: HashMap<String, String>,
    pub url_by_url: HashMap<String, String>,
    pub url_by_version: HashMap<String, String>,
}

impl LedgerUpdates {
    pub fn is_empty(&self) -> bool {
        self.sha_by_url.is_empty()
            && self.sha_by_version.is_empty()
            && self.url_by_url.is_empty()
            && self.url_by_version.is_empty()
    }
}

/// Sort entries newest first
pub fn sort_entries(entries: &mut [ReleaseEntry]) {
    entries.sort_by_key(|e| std::cmp::Reverse(VersionKey::parse(&e.version)));
}

/// Render one release block
pub fn render_block(entry: &ReleaseEntry, platform: Platform) -> String {
    format!(
        "#### Platform-Tools {} ({})\n**{}:**\n- URL: {}\n- SHA-256: {}\n\n---\n\n",
        entry.version,
        entry.date.as_deref().unwrap_or(UNKNOWN_DATE),
        platform.label(),
        entry.url.as_deref().unwrap_or(MISSING_URL),
        entry.known_sha256().unwrap_or(PENDING_CHECKSUM),
    )
}

fn render_blocks(entries: &[ReleaseEntry], platform: Platform) -> String {
    entries.iter().map(|e| render_block(e, platform)).collect()
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn normalized(line: &str) -> String {
    line.trim().to_lowercase()
}

/// Locate the line range holding the version list
///
/// The range starts after `### Latest Stable Release` (or `## Version History`)
/// and its following blank lines, and ends before `### Older Versions`
/// (or `## How To Verify Downloads`).
pub fn section_bounds(lines: &[&str]) -> Result<(usize, usize), LedgerError> {
    let mut start = None;
    let mut end = None;

    for (idx, line) in lines.iter().enumerate() {
        let line = normalized(line);
        if line == LATEST_STABLE {
            start = Some(idx + 1);
        }
        if line.starts_with(OLDER_VERSIONS) {
            end = Some(idx);
            break;
        }
    }

    let start = start.or_else(|| {
        lines
            .iter()
            .position(|l| normalized(l) == VERSION_HISTORY)
            .map(|idx| idx + 1)
    });
    let end = end.or_else(|| lines.iter().position(|l| normalized(l) == HOW_TO_VERIFY));

    let (Some(mut start), Some(end)) = (start, end) else {
        return Err(LedgerError::SectionNotFound);
    };
    if start > end {
        return Err(LedgerError::SectionNotFound);
    }

    while start < end && is_blank(lines[start]) {
        start += 1;
    }

    Ok((start, end))
}

/// Replace the version list with `entries`, in the order given
pub fn rewrite_section(
    text: &str,
    entries: &[ReleaseEntry],
    platform: Platform,
) -> Result<String, LedgerError> {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let (start, end) = section_bounds(&lines)?;

    let mut out = String::with_capacity(text.len());
    out.extend(lines[..start].iter().copied());
    out.push_str(&render_blocks(entries, platform));
    out.extend(lines[end..].iter().copied());
    Ok(out)
}

/// Insert new release blocks at the top of the latest-stable section
pub fn append_releases(
    text: &str,
    entries: &[ReleaseEntry],
    platform: Platform,
) -> Result<String, LedgerError> {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let mut insert = lines
        .iter()
        .position(|l| normalized(l) == LATEST_STABLE)
        .map(|idx| idx + 1)
        .ok_or(LedgerError::AppendAnchorNotFound)?;

    while insert < lines.len() && is_blank(lines[insert]) {
        insert += 1;
    }

    let mut sorted = entries.to_vec();
    sort_entries(&mut sorted);

    let mut out = String::with_capacity(text.len());
    if insert == lines.len() && !text.is_empty() && !text.ends_with('\n') {
        out.push_str(text);
        out.push('\n');
    } else {
        out.extend(lines[..insert].iter().copied());
    }
    out.push_str(&render_blocks(&sorted, platform));
    out.extend(lines[insert..].iter().copied());
    Ok(out)
}

/// Line terminator of `line`, reused when a line is replaced
fn line_ending(line: &str) -> &'static str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else if line.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}

/// Whether a URL/SHA pair belongs to `platform`
///
/// A platform label line decides when present; otherwise the archive name
/// does. Placeholders and unrecognized URLs count as the target platform.
fn pair_belongs_to(label: Option<Platform>, url: Option<&str>, platform: Platform) -> bool {
    if let Some(label) = label {
        return label == platform;
    }
    match url {
        None | Some("") | Some(MISSING_URL) => true,
        Some(url) => Platform::from_url(url).is_none_or(|p| p == platform),
    }
}

/// Patch SHA-256 and URL lines matching `updates`; returns the new text and
/// the number of lines changed
///
/// URL-keyed updates apply wherever the URL appears. Version-keyed updates
/// only touch the pairs of `platform` under that version's heading.
pub fn apply_updates(text: &str, updates: &LedgerUpdates, platform: Platform) -> (String, usize) {
    let mut out = String::with_capacity(text.len());
    let mut current_version: Option<String> = None;
    let mut current_label: Option<Platform> = None;
    // URL of the pair being read, and whether it belongs to `platform`
    let mut current_pair: Option<(String, bool)> = None;
    let mut changed = 0;

    for line in text.split_inclusive('\n') {
        let stripped = line.trim();

        if let Some((version, _)) = parse_heading(stripped) {
            current_version = Some(version);
            current_label = None;
            current_pair = None;
            out.push_str(line);
            continue;
        }

        if let Some(label) = Platform::from_label(stripped) {
            current_label = Some(label);
            current_pair = None;
            out.push_str(line);
            continue;
        }

        let by_version = |map: &HashMap<String, String>| {
            current_version
                .as_ref()
                .and_then(|v| map.get(v))
                .cloned()
        };

        if let Some(url) = super::list_field(stripped, "URL:") {
            let owned = pair_belongs_to(current_label, Some(url), platform);
            let replacement = updates
                .url_by_url
                .get(url)
                .cloned()
                .or_else(|| owned.then(|| by_version(&updates.url_by_version)).flatten());

            match replacement {
                Some(new_url) if new_url != url => {
                    out.push_str(&format!("- URL: {}{}", new_url, line_ending(line)));
                    current_pair = Some((new_url, true));
                    changed += 1;
                }
                _ => {
                    out.push_str(line);
                    current_pair = Some((url.to_string(), owned));
                }
            }
            continue;
        }

        if let Some(existing) = super::list_field(stripped, "SHA-256:") {
            let (url, owned) = match &current_pair {
                Some((url, owned)) => (Some(url.as_str()), *owned),
                None => (None, pair_belongs_to(current_label, None, platform)),
            };
            let sha = url
                .and_then(|u| updates.sha_by_url.get(u))
                .cloned()
                .or_else(|| owned.then(|| by_version(&updates.sha_by_version)).flatten());

            if let Some(sha) = sha {
                if sha != existing {
                    out.push_str(&format!("- SHA-256: {}{}", sha, line_ending(line)));
                    changed += 1;
                } else {
                    out.push_str(line);
                }
                current_pair = None;
                continue;
            }
            current_pair = None;
        }

        out.push_str(line);
    }

    (out, changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ledger::{Checksum, parse_entries};

    const DOC: &str = "\
# Official ADB Versions

Intro text.

## Version History

### Latest Stable Release

#### Platform-Tools 34.0.0 (Old)
**Windows:**
- URL: https://example.com/34.zip
- SHA-256: aaa

---

### Older Versions

Archive notes stay untouched.

## How To Verify Downloads

Run the tool.
";

    fn entry(version: &str, date: Option<&str>, url: Option<&str>, sha: Option<Checksum>) -> ReleaseEntry {
        ReleaseEntry {
            version: version.to_string(),
            date: date.map(str::to_string),
            url: url.map(str::to_string),
            sha256: sha,
        }
    }

    fn sample_entries() -> Vec<ReleaseEntry> {
        vec![
            entry("33.0.3 RC1", None, Some("https://example.com/rc.zip"), None),
            entry(
                "35.0.2",
                Some("July 2024"),
                Some("https://example.com/35.zip"),
                Some(Checksum::Known("bbb".to_string())),
            ),
            entry("33.0.3", Some("August 2022"), None, Some(Checksum::Unknown)),
        ]
    }

    #[test]
    fn test_sort_entries_descending() {
        let mut entries = sample_entries();
        sort_entries(&mut entries);
        let versions: Vec<_> = entries.iter().map(|e| e.version.as_str()).collect();
        assert_eq!(versions, vec!["35.0.2", "33.0.3", "33.0.3 RC1"]);
    }

    #[test]
    fn test_render_block_placeholders() {
        let block = render_block(&entry("30.0.0", None, None, None), Platform::Macosx);
        assert_eq!(
            block,
            "#### Platform-Tools 30.0.0 (Unknown date)\n**macOS:**\n- URL: (no official URL found)\n- SHA-256: To be verified by downloading from official source\n\n---\n\n"
        );
    }

    #[test]
    fn test_rewrite_preserves_surrounding_text() {
        let mut entries = sample_entries();
        sort_entries(&mut entries);
        let out = rewrite_section(DOC, &entries, Platform::Windows).unwrap();

        let (head, _) = DOC.split_once("#### Platform-Tools 34.0.0").unwrap();
        let (_, tail) = DOC.split_once("### Older Versions").unwrap();
        assert!(out.starts_with(head));
        assert!(out.ends_with(&format!("### Older Versions{}", tail)));
        assert!(!out.contains("34.0.0"));

        let pos_35 = out.find("Platform-Tools 35.0.2").unwrap();
        let pos_33 = out.find("Platform-Tools 33.0.3 (").unwrap();
        let pos_rc = out.find("Platform-Tools 33.0.3 RC1").unwrap();
        assert!(pos_35 < pos_33 && pos_33 < pos_rc);
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let mut entries = sample_entries();
        sort_entries(&mut entries);
        let once = rewrite_section(DOC, &entries, Platform::Windows).unwrap();
        let twice = rewrite_section(&once, &entries, Platform::Windows).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_parse_render_parse_roundtrip() {
        let original = parse_entries(DOC);
        let rendered = rewrite_section(DOC, &original, Platform::Windows).unwrap();
        assert_eq!(parse_entries(&rendered), original);

        // A block without a SHA-256 line is stable too
        let no_sha = DOC.replace("- SHA-256: aaa\n", "");
        let original = parse_entries(&no_sha);
        assert_eq!(original.len(), 1);
        let rendered = rewrite_section(&no_sha, &original, Platform::Windows).unwrap();
        assert_eq!(parse_entries(&rendered), original);

        let mut entries = sample_entries();
        sort_entries(&mut entries);
        let rendered = rewrite_section(DOC, &entries, Platform::Windows).unwrap();
        let reparsed = parse_entries(&rendered);
        assert_eq!(reparsed.len(), 3);
        assert_eq!(reparsed[0], entries[0]);
        // Pending and absent checksums both come back as the explicit sentinel
        assert_eq!(reparsed[1].sha256, Some(Checksum::Unknown));
        assert_eq!(reparsed[2].url.as_deref(), Some("https://example.com/rc.zip"));
    }

    #[test]
    fn test_section_fallback_markers() {
        let doc = "## Version History\n\n#### Platform-Tools 1.0.0\n- URL: u\n- SHA-256: s\n## How To Verify Downloads\nend\n";
        let lines: Vec<&str> = doc.split_inclusive('\n').collect();
        assert_eq!(section_bounds(&lines), Ok((2, 5)));
    }

    #[test]
    fn test_missing_section_is_reported() {
        let doc = "# Nothing here\n\nJust text.\n";
        assert_eq!(
            rewrite_section(doc, &[], Platform::Windows),
            Err(LedgerError::SectionNotFound)
        );
    }

    #[test]
    fn test_rewrite_keeps_crlf_outside_region() {
        let doc = DOC.replace('\n', "\r\n");
        let out = rewrite_section(&doc, &sample_entries(), Platform::Windows).unwrap();
        assert!(out.starts_with("# Official ADB Versions\r\n\r\nIntro text.\r\n"));
        assert!(out.ends_with("Run the tool.\r\n"));
    }

    #[test]
    fn test_append_inserts_after_latest_heading() {
        let new = vec![
            entry("35.0.0", None, Some("https://example.com/350.zip"), None),
            entry("36.0.0", Some("Feb 2025"), Some("https://example.com/36.zip"), None),
        ];
        let out = append_releases(DOC, &new, Platform::Windows).unwrap();

        let latest = out.find("### Latest Stable Release\n\n").unwrap();
        let pos_36 = out.find("#### Platform-Tools 36.0.0 (Feb 2025)").unwrap();
        let pos_35 = out.find("#### Platform-Tools 35.0.0").unwrap();
        let pos_34 = out.find("#### Platform-Tools 34.0.0").unwrap();
        assert!(latest < pos_36 && pos_36 < pos_35 && pos_35 < pos_34);
    }

    #[test]
    fn test_append_without_anchor() {
        assert_eq!(
            append_releases("# empty\n", &[], Platform::Windows),
            Err(LedgerError::AppendAnchorNotFound)
        );
    }

    #[test]
    fn test_apply_updates_by_url_and_version() {
        let doc = "\
#### Platform-Tools 35.0.2 (July 2024)
- URL: https://example.com/old.zip
- SHA-256: To be verified by downloading from official source

#### Platform-Tools 34.0.0
- URL: https://example.com/34.zip
- SHA-256: keep
";
        let mut updates = LedgerUpdates::default();
        updates
            .url_by_url
            .insert("https://example.com/old.zip".into(), "https://example.com/new.zip".into());
        updates
            .sha_by_url
            .insert("https://example.com/new.zip".into(), "fff".into());

        let (out, changed) = apply_updates(doc, &updates, Platform::Windows);
        assert_eq!(changed, 2);
        assert!(out.contains("- URL: https://example.com/new.zip\n- SHA-256: fff\n"));
        assert!(out.contains("- URL: https://example.com/34.zip\n- SHA-256: keep\n"));

        let mut by_version = LedgerUpdates::default();
        by_version.sha_by_version.insert("34.0.0".into(), "eee".into());
        let (out, changed) = apply_updates(doc, &by_version, Platform::Windows);
        assert_eq!(changed, 1);
        assert!(out.contains("- SHA-256: eee\n"));
        assert!(out.contains("- SHA-256: To be verified"));
    }

    #[test]
    fn test_apply_updates_unchanged_value_is_not_counted() {
        let doc = "#### Platform-Tools 1.0.0\n- URL: u\n- SHA-256: abc\n";
        let mut updates = LedgerUpdates::default();
        updates.sha_by_url.insert("u".into(), "abc".into());

        let (out, changed) = apply_updates(doc, &updates, Platform::Windows);
        assert_eq!(changed, 0);
        assert_eq!(out, doc);
    }

    #[test]
    fn test_apply_updates_by_version_leaves_other_platforms() {
        let doc = "\
#### Platform-Tools 34.0.5 (October 2023)
**Windows:**
- URL: (no official URL found)
- SHA-256: To be verified by downloading from official source
**Linux:**
- URL: https://x/platform-tools_r34.0.5-linux.zip
- SHA-256: linuxsha
";
        let mut updates = LedgerUpdates::default();
        updates.url_by_version.insert(
            "34.0.5".into(),
            "https://x/platform-tools_r34.0.5-windows.zip".into(),
        );
        updates.sha_by_version.insert("34.0.5".into(), "winsha".into());

        let (out, changed) = apply_updates(doc, &updates, Platform::Windows);
        assert_eq!(changed, 2);
        assert!(out.contains(
            "**Windows:**\n- URL: https://x/platform-tools_r34.0.5-windows.zip\n- SHA-256: winsha\n"
        ));
        assert!(out.contains(
            "**Linux:**\n- URL: https://x/platform-tools_r34.0.5-linux.zip\n- SHA-256: linuxsha\n"
        ));
    }

    #[test]
    fn test_apply_updates_without_labels_uses_archive_name() {
        let doc = "\
#### Platform-Tools 34.0.5
- URL: https://x/platform-tools_r34.0.5-darwin.zip
- SHA-256: macsha
- URL: https://x/platform-tools_r34.0.5-win.zip
- SHA-256: ???
";
        let mut updates = LedgerUpdates::default();
        updates.sha_by_version.insert("34.0.5".into(), "winsha".into());

        let (out, changed) = apply_updates(doc, &updates, Platform::Windows);
        assert_eq!(changed, 1);
        assert!(out.contains("darwin.zip\n- SHA-256: macsha\n"));
        assert!(out.contains("win.zip\n- SHA-256: winsha\n"));
    }
}
