//! Report id parsing
//!
//! Accepts either a full FFLogs report URL or a bare report code. Anything
//! else yields `None`; a partially matching input never produces a truncated
//! id.

/// Length of an FFLogs report code
pub const REPORT_ID_LENGTH: usize = 16;

const REPORT_PATH: &str = "fflogs.com/reports/";

/// Extract the report code from a URL or bare code
///
/// ```
/// use raidprog_ingest::services::report_id::parse_report_id;
///
/// assert_eq!(
///     parse_report_id("https://www.fflogs.com/reports/aBcD1234eFgH5678#fight=3").as_deref(),
///     Some("aBcD1234eFgH5678")
/// );
/// assert_eq!(parse_report_id("aBcD1234eFgH5678").as_deref(), Some("aBcD1234eFgH5678"));
/// assert_eq!(parse_report_id("not a report"), None);
/// ```
pub fn parse_report_id(input: &str) -> Option<String> {
    let input = input.trim();

    if is_report_code(input) {
        return Some(input.to_string());
    }

    let rest = input
        .strip_prefix("https://")
        .or_else(|| input.strip_prefix("http://"))?;
    let rest = rest.strip_prefix("www.").unwrap_or(rest);
    let rest = rest.strip_prefix(REPORT_PATH)?;

    let code_len = rest
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    let (code, tail) = rest.split_at(code_len);

    let tail_ok = tail.is_empty() || tail.starts_with(['/', '?', '#']);
    if tail_ok && is_report_code(code) {
        Some(code.to_string())
    } else {
        None
    }
}

fn is_report_code(s: &str) -> bool {
    s.len() == REPORT_ID_LENGTH && s.chars().all(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CODE: &str = "Xy7Kq2LmNp4RsT9v";

    #[test]
    fn test_bare_code() {
        assert_eq!(parse_report_id(CODE).as_deref(), Some(CODE));
        assert_eq!(parse_report_id(&format!("  {}\n", CODE)).as_deref(), Some(CODE));
    }

    #[test]
    fn test_url_variants() {
        for url in [
            format!("https://www.fflogs.com/reports/{}", CODE),
            format!("http://www.fflogs.com/reports/{}", CODE),
            format!("https://fflogs.com/reports/{}", CODE),
            format!("https://www.fflogs.com/reports/{}/", CODE),
            format!("https://www.fflogs.com/reports/{}#fight=last&type=damage-done", CODE),
            format!("https://www.fflogs.com/reports/{}?translate=true", CODE),
        ] {
            assert_eq!(parse_report_id(&url).as_deref(), Some(CODE), "url: {}", url);
        }
    }

    #[test]
    fn test_rejects_partial_and_foreign() {
        assert_eq!(parse_report_id(""), None);
        assert_eq!(parse_report_id("short"), None);
        assert_eq!(parse_report_id(&format!("{}x", CODE)), None);
        assert_eq!(parse_report_id("https://www.fflogs.com/reports/"), None);
        assert_eq!(parse_report_id("https://www.fflogs.com/reports/abc"), None);
        assert_eq!(parse_report_id(&format!("https://www.fflogs.com/reports/{}-x", CODE)), None);
        assert_eq!(parse_report_id(&format!("https://example.com/reports/{}", CODE)), None);
        assert_eq!(parse_report_id(&format!("ftp://www.fflogs.com/reports/{}", CODE)), None);
        assert_eq!(parse_report_id("Xy7Kq2LmNp4RsT9!"), None);
    }
}
