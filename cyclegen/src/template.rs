//! Named-placeholder substitution for host templates.
//!
//! Placeholders are written `$name` or `${name}`, where a name is an ASCII letter or
//! underscore followed by ASCII letters, digits or underscores. `$$` produces a literal
//! `$`. Substitution is permissive: placeholders without a value and `$` signs that do
//! not start a placeholder are copied through unchanged.

/// Placeholder delimiter.
const DELIMITER: u8 = b'$';

/// A host template document.
#[derive(Debug, Clone, Copy)]
pub struct Template<'a> {
    text: &'a str,
}

impl<'a> Template<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }

    /// Substitute every placeholder named in `values`, leaving all others as they are.
    pub fn safe_substitute(&self, values: &[(&str, &str)]) -> String {
        let lookup = |name: &str| {
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| *value)
        };

        let bytes = self.text.as_bytes();
        let mut out = String::with_capacity(self.text.len());
        // Start of the text not yet copied to `out`.
        let mut copied = 0;
        let mut pos = 0;
        while pos < bytes.len() {
            if bytes[pos] != DELIMITER {
                pos += 1;
                continue;
            }
            out.push_str(&self.text[copied..pos]);
            let (replacement, end) = match placeholder_at(bytes, pos + 1) {
                Placeholder::Escaped => (Some("$"), pos + 2),
                Placeholder::Named { name, end } => (lookup(&self.text[name..end]), end),
                Placeholder::Braced { name, end } => (lookup(&self.text[name..end - 1]), end),
                Placeholder::Invalid => (Some("$"), pos + 1),
            };
            match replacement {
                Some(replacement) => out.push_str(replacement),
                None => out.push_str(&self.text[pos..end]),
            }
            copied = end;
            pos = end;
        }
        out.push_str(&self.text[copied..]);
        out
    }
}

/// What follows a delimiter.
enum Placeholder {
    Escaped,
    /// `$name`: the name starts at `name`, and the placeholder ends at `end`.
    Named { name: usize, end: usize },
    /// `${name}`: the name starts at `name`, and the placeholder ends at `end`, just past
    /// the closing brace.
    Braced { name: usize, end: usize },
    Invalid,
}

/// Classify the text starting at `start`, immediately after a delimiter.
fn placeholder_at(bytes: &[u8], start: usize) -> Placeholder {
    match bytes.get(start) {
        Some(&DELIMITER) => Placeholder::Escaped,
        Some(b'{') => {
            let name = start + 1;
            let end = identifier_end(bytes, name);
            if end > name && bytes.get(end) == Some(&b'}') {
                Placeholder::Braced { name, end: end + 1 }
            } else {
                Placeholder::Invalid
            }
        }
        Some(_) => {
            let end = identifier_end(bytes, start);
            if end > start {
                Placeholder::Named { name: start, end }
            } else {
                Placeholder::Invalid
            }
        }
        None => Placeholder::Invalid,
    }
}

/// End of the identifier starting at `start`, or `start` if there is none.
fn identifier_end(bytes: &[u8], start: usize) -> usize {
    match bytes.get(start) {
        Some(b) if b.is_ascii_alphabetic() || *b == b'_' => {}
        _ => return start,
    }
    start
        + bytes[start..]
            .iter()
            .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
            .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subst(text: &str) -> String {
        Template::new(text).safe_substitute(&[("optable", "T"), ("decode_block", "D")])
    }

    #[test]
    fn substitutes_named_and_braced() {
        assert_eq!(subst("a $optable };"), "a T };");
        assert_eq!(subst("x${decode_block}y"), "xDy");
        assert_eq!(subst("$decode_block\n$optable"), "D\nT");
    }

    #[test]
    fn name_ends_at_first_non_identifier_char() {
        assert_eq!(subst("$optable[0]"), "T[0]");
        assert_eq!(subst("$optables"), "$optables");
    }

    #[test]
    fn unmatched_placeholders_are_kept() {
        assert_eq!(subst("$unknown and ${other}"), "$unknown and ${other}");
    }

    #[test]
    fn escapes_and_stray_delimiters() {
        assert_eq!(subst("cost: $$5"), "cost: $5");
        assert_eq!(subst("$ $1 ${ ${1x} $"), "$ $1 ${ ${1x} $");
        assert_eq!(subst("$$optable"), "$optable");
    }

    #[test]
    fn values_are_not_rescanned() {
        let out = Template::new("$a").safe_substitute(&[("a", "$b"), ("b", "no")]);
        assert_eq!(out, "$b");
    }

    #[test]
    fn non_ascii_text_is_preserved() {
        assert_eq!(subst("é $optable ü"), "é T ü");
    }
}
