//! String utilities for the domain layer.

/// Truncate a string to a maximum length with ellipsis (UTF-8 safe)
///
/// Uses byte length for max_len but ensures truncation occurs at valid
/// UTF-8 character boundaries.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let target = max_len.saturating_sub(3);
        let mut end = target.min(s.len());
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

/// Locate a JSON document inside free-form model output.
///
/// Checks, in order: a ` ```json ` fenced block, any fenced block whose body
/// starts with `{` or `[`, then the outermost `{ ... }` span. Returns the
/// candidate slice without validating it.
pub fn extract_json_block(text: &str) -> Option<&str> {
    if let Some(body) = fenced_body(text, "```json") {
        return Some(body);
    }
    if let Some(body) = fenced_body(text, "```")
        && (body.starts_with('{') || body.starts_with('['))
    {
        return Some(body);
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

fn fenced_body<'a>(text: &'a str, fence: &str) -> Option<&'a str> {
    let open = text.find(fence)?;
    let after_fence = open + fence.len();
    let body_start = after_fence + text[after_fence..].find('\n')? + 1;
    let body_len = text[body_start..].find("```")?;
    Some(text[body_start..body_start + body_len].trim())
}
