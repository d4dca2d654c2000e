use std::borrow::Cow;

/// Cuts `text` to at most `max_bytes` (on a char boundary) for trace output.
pub(crate) fn clip(text: &str, max_bytes: usize) -> Cow<'_, str> {
    if text.len() <= max_bytes {
        return Cow::Borrowed(text);
    }
    let mut end = max_bytes;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    Cow::Owned(format!("{}…[{} bytes total]", &text[..end], text.len()))
}
