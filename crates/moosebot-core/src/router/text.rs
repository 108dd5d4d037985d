//! Prompt text helpers shared by the commands.

/// Drop a leading `@username` mention (plus trailing separators) from an
/// inbound message, as delivered in group chats.
pub fn strip_mention(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix('@') else {
        return trimmed;
    };
    let after_name = rest.trim_start_matches(|c: char| c.is_alphanumeric() || c == '_');
    // A bare '@' is not a mention.
    if after_name.len() == rest.len() {
        return trimmed;
    }
    after_name
        .trim_start_matches(|c: char| c == ',' || c.is_whitespace())
        .trim()
}

/// Case-insensitive prefix match returning the remainder.
///
/// `prefix.len()` may fall inside a multibyte character of `text`;
/// `get` returns `None` there instead of slicing.
pub(crate) fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}

/// Strip command/argument separators: whitespace, commas, colons.
pub(crate) fn trim_separators(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || c == ',' || c == ':')
}

/// The uniform user-visible failure notice.
pub fn failure_message(cause: Option<&str>) -> String {
    match cause {
        Some(cause) => format!("Could not complete that \u{1F622}: {cause}"),
        None => "Could not complete that \u{1F622}".to_string(),
    }
}
