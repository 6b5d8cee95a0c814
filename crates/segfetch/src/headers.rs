//! Request header presets and merging.

use crate::error::{Error, Result};

const PRESET: &str = r#"
accept: text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.9
sec-ch-ua: "Chromium";v="88", "Google Chrome";v="88", ";Not A Brand";v="99"
sec-ch-ua-mobile: ?0
sec-fetch-dest: document
sec-fetch-mode: navigate
sec-fetch-site: same-origin
sec-fetch-user: ?1
user-agent: Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/88.0.4324.146 Safari/537.36
"#;

/// Browser-like headers sent underneath caller headers.
pub fn default_headers() -> Vec<(String, String)> {
    // the preset is a constant, every line is well-formed
    parse_header_lines(PRESET).unwrap_or_default()
}

/// Parse `name: value` lines. Blank lines are skipped; the value keeps any
/// further colons.
///
/// ```
/// use segfetch::headers::parse_header_lines;
///
/// let headers = parse_header_lines("Referer: https://a.example/x\nX-Id: 7").unwrap();
/// assert_eq!(headers[0], ("Referer".to_string(), "https://a.example/x".to_string()));
/// ```
pub fn parse_header_lines(text: &str) -> Result<Vec<(String, String)>> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_header_line)
        .collect()
}

pub fn parse_header_line(line: &str) -> Result<(String, String)> {
    let (name, value) = line
        .split_once(':')
        .ok_or_else(|| Error::InvalidHeader(line.to_string()))?;
    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(Error::InvalidHeader(line.to_string()));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Lay `overrides` over `base`. Names compare case-insensitively; an
/// override replaces the base entry in place, new names are appended.
pub fn merge(base: &[(String, String)], overrides: &[(String, String)]) -> Vec<(String, String)> {
    let mut merged = base.to_vec();
    for (name, value) in overrides {
        match merged.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some(entry) => *entry = (name.clone(), value.clone()),
            None => merged.push((name.clone(), value.clone())),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(k: &str, v: &str) -> (String, String) { (k.to_string(), v.to_string()) }

    #[test]
    fn preset_is_complete() {
        let headers = default_headers();
        assert_eq!(headers.len(), 8);
        assert!(headers.iter().any(|(k, v)| k == "user-agent" && v.starts_with("Mozilla/5.0")));
        assert!(headers.iter().any(|(k, v)| k == "sec-ch-ua-mobile" && v == "?0"));
    }

    #[test]
    fn parse_keeps_colons_in_value() {
        assert_eq!(
            parse_header_line("Referer: https://example.com:8443/a").unwrap(),
            pair("Referer", "https://example.com:8443/a")
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(parse_header_line("no colon"), Err(Error::InvalidHeader(_))));
        assert!(matches!(parse_header_line(": empty"), Err(Error::InvalidHeader(_))));
        assert!(matches!(parse_header_line("bad name: x"), Err(Error::InvalidHeader(_))));
    }

    #[test]
    fn merge_replaces_case_insensitively() {
        let base = vec![pair("User-Agent", "a"), pair("Accept", "*/*")];
        let merged = merge(&base, &[pair("user-agent", "b"), pair("X-New", "1")]);
        assert_eq!(merged, vec![pair("user-agent", "b"), pair("Accept", "*/*"), pair("X-New", "1")]);
    }

    #[test]
    fn merge_empty_overrides_is_identity() {
        let base = default_headers();
        assert_eq!(merge(&base, &[]), base);
    }
}
