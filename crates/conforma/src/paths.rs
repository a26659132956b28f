//! JSON Pointer rendering for schema and instance locations.
//!
//! Locations are kept as rendered pointer strings: they are built once per
//! evaluation frame and compared byte-wise when aggregating annotations.
use std::fmt::Write;

/// One step down a JSON document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Chunk<'a> {
    /// A property name or keyword.
    Key(&'a str),
    /// An index within an array.
    Index(usize),
}

/// Append a single escaped segment to a rendered pointer.
pub(crate) fn push_chunk(pointer: &mut String, chunk: Chunk<'_>) {
    pointer.push('/');
    match chunk {
        Chunk::Key(key) => {
            for ch in key.chars() {
                match ch {
                    '~' => pointer.push_str("~0"),
                    '/' => pointer.push_str("~1"),
                    _ => pointer.push(ch),
                }
            }
        }
        Chunk::Index(index) => {
            let _ = pointer.write_str(itoa::Buffer::new().format(index));
        }
    }
}

/// Render `{parent}/{chunk}` without mutating the parent.
pub(crate) fn join(parent: &str, chunk: Chunk<'_>) -> String {
    let mut pointer = String::with_capacity(parent.len() + 8);
    pointer.push_str(parent);
    push_chunk(&mut pointer, chunk);
    pointer
}

/// The unescaped last segment of a rendered pointer, if any.
pub(crate) fn last_segment(pointer: &str) -> Option<String> {
    let (_, raw) = pointer.rsplit_once('/')?;
    Some(unescape(raw))
}

pub(crate) fn unescape(segment: &str) -> String {
    if !segment.contains('~') {
        return segment.to_string();
    }
    let mut out = String::with_capacity(segment.len());
    let mut chars = segment.chars();
    while let Some(ch) = chars.next() {
        if ch == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                Some(other) => {
                    out.push('~');
                    out.push(other);
                }
                None => out.push('~'),
            }
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{join, last_segment, Chunk};
    use test_case::test_case;

    #[test_case("", Chunk::Key("name"), "/name")]
    #[test_case("/properties", Chunk::Key("a/b"), "/properties/a~1b")]
    #[test_case("/properties", Chunk::Key("ti~lde"), "/properties/ti~0lde")]
    #[test_case("/items", Chunk::Index(3), "/items/3")]
    fn renders_escaped_segments(parent: &str, chunk: Chunk<'_>, expected: &str) {
        assert_eq!(join(parent, chunk), expected);
    }

    #[test]
    fn round_trips_last_segment() {
        assert_eq!(
            last_segment("/properties/a~1b~0c").as_deref(),
            Some("a/b~c")
        );
        assert_eq!(last_segment(""), None);
    }
}
