use ammonia;

/// Clean HTML content using the ammonia library.
///
/// Whitelist-based sanitization: safe tags (like <b>, <p>) survive, dangerous
/// tags (like <script>, <iframe>) and attributes (like onclick) are stripped.
/// Applied to rich-text fields (news body, exam announcement) before storage
/// as a fail-safe against Stored XSS.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
