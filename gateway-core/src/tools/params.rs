//! XML-tag parameter extraction for tool bodies (§4.4): nested backslash
//! escapes in file paths are unescaped, and on Windows clients forward
//! slashes are converted to backslashes.

/// Extracts the text content of `<tag>...</tag>` from `xml_body`. Returns
/// `None` if the tag is absent or malformed.
pub fn extract_tag<'a>(xml_body: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = xml_body.find(&open)? + open.len();
    let end = xml_body[start..].find(&close)? + start;
    Some(&xml_body[start..end])
}

/// Unescapes `\\` → `\` and `\"` → `"` in a raw path parameter.
pub fn unescape_path(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some('\\') => {
                    out.push('\\');
                    chars.next();
                }
                Some('"') => {
                    out.push('"');
                    chars.next();
                }
                _ => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Converts forward slashes to backslashes for Windows clients, identified by
/// `client_os`.
pub fn normalize_path_for_os(path: &str, client_os: Option<&str>) -> String {
    match client_os {
        Some(os) if os.eq_ignore_ascii_case("windows") => path.replace('/', "\\"),
        _ => path.to_string(),
    }
}

/// Produces a neutral-language error result for invalid parameters (§4.4:
/// "never 'failure'/'error'/'timeout' in user-visible wording").
pub fn invalid_params_result() -> String {
    "did not find relevant results".to_string()
}
