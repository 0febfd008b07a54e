use crate::error::BindingError;

/// One piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text copied to the output unchanged.
    Literal(String),
    /// `?`: the next binding in order.
    Next,
    /// `:key:`: a record field, or a binding index when `key` is numeric.
    Key(String),
}

enum State {
    Text,
    Key { start: usize, key: String },
}

/// Split template text into segments in one pass.
///
/// `?` is a placeholder wherever it appears, including between an opening
/// and closing `:`. Every `:` toggles key mode, so `a::b` yields an empty key.
pub(super) fn scan(sql: &str) -> Result<Vec<Segment>, BindingError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut state = State::Text;

    for (offset, c) in sql.char_indices() {
        if c == '?' {
            flush(&mut segments, &mut literal);
            segments.push(Segment::Next);
            continue;
        }
        let next = match &mut state {
            State::Text if c == ':' => {
                flush(&mut segments, &mut literal);
                Some(State::Key {
                    start: offset,
                    key: String::new(),
                })
            }
            State::Text => {
                literal.push(c);
                None
            }
            State::Key { key, .. } if c == ':' => {
                segments.push(Segment::Key(std::mem::take(key)));
                Some(State::Text)
            }
            State::Key { key, .. } => {
                key.push(c);
                None
            }
        };
        if let Some(next) = next {
            state = next;
        }
    }

    if let State::Key { start, key } = state {
        return Err(BindingError::UnterminatedPlaceholder { key, offset: start });
    }
    flush(&mut segments, &mut literal);
    Ok(segments)
}

fn flush(segments: &mut Vec<Segment>, literal: &mut String) {
    if !literal.is_empty() {
        segments.push(Segment::Literal(std::mem::take(literal)));
    }
}

/// A key names a binding index only when it is all ASCII digits.
pub(super) fn binding_index(key: &str) -> Option<usize> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse().ok()
}
