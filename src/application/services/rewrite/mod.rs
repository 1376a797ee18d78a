use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::assets::AssetRecord;

static REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!?\[[^\]]*\]\(\s*([^()\s]+)\s*\)").expect("valid regex"));

/// Document-relative references in first-seen order, de-duplicated. Absolute
/// URLs and inline data are already remote and are skipped.
pub fn extract_references(text: &str) -> Vec<String> {
    let mut refs: Vec<String> = Vec::new();
    for cap in REF_RE.captures_iter(text) {
        let target = cap[1].to_string();
        if target.starts_with("http://")
            || target.starts_with("https://")
            || target.starts_with("data:")
        {
            continue;
        }
        if !refs.contains(&target) {
            refs.push(target);
        }
    }
    refs
}

/// Replace every reference to each record's local path with its remote URL.
///
/// A single asset can be reachable as an image, as a plain link, and as a bare
/// literal occurrence; all three forms must be rewritten. Image and link
/// syntax are handled first so surrounding alt/link text survives, then a
/// literal pass catches whatever is left.
pub fn rewrite_references(text: &str, records: &[AssetRecord]) -> String {
    let mut out = text.to_string();
    for record in records {
        let escaped = regex::escape(&record.local_path);

        let image = Regex::new(&format!(r"(!\[[^\]]*\]\()\s*{escaped}\s*(\))"))
            .expect("valid regex");
        out = image
            .replace_all(&out, |caps: &regex::Captures| {
                format!("{}{}{}", &caps[1], record.remote_url, &caps[2])
            })
            .into_owned();

        let link =
            Regex::new(&format!(r"(\[[^\]]*\]\()\s*{escaped}\s*(\))")).expect("valid regex");
        out = link
            .replace_all(&out, |caps: &regex::Captures| {
                format!("{}{}{}", &caps[1], record.remote_url, &caps[2])
            })
            .into_owned();

        out = out.replace(&record.local_path, &record.remote_url);
    }
    out
}
