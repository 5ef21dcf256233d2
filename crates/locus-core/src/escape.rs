//! XPath string-literal quoting.
//!
//! XPath 1.0 has no escape sequence inside string literals, so a value that
//! mixes both quote characters has to be rebuilt with `concat()`. Every
//! fuzzy query template splices user text through [`xpath_literal`] before
//! it reaches a driver.

/// Quote `text` as an XPath 1.0 string literal.
///
/// Never fails; any string (including empty) produces a valid literal.
pub fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        return format!("'{text}'");
    }
    if !text.contains('"') {
        return format!("\"{text}\"");
    }
    // Both quote kinds present: split on single quotes and stitch the
    // fragments back together around literal "'" arguments.
    let parts: Vec<String> = text.split('\'').map(|part| format!("'{part}'")).collect();
    format!("concat({})", parts.join(", \"'\", "))
}

/// CSS attribute selector for the `~accessibility-id` convention on web
/// drivers. Mobile drivers keep the raw id instead.
pub fn aria_label_css(id: &str) -> String {
    let escaped = id.replace('\\', "\\\\").replace('"', "\\\"");
    format!("[aria-label=\"{escaped}\"]")
}
