//! Character classes used by the SPARQL tokenizer
//!
//! PN_CHARS_BASE, PN_CHARS and VARNAME from the SPARQL 1.1 grammar, plus the
//! IRIREF exclusions and whitespace.

/// PN_CHARS_BASE: letters that may start a prefix or local name
pub fn is_pn_chars_base(c: char) -> bool {
    c.is_ascii_alphabetic()
        || matches!(c,
            '\u{00C0}'..='\u{00D6}'
            | '\u{00D8}'..='\u{00F6}'
            | '\u{00F8}'..='\u{02FF}'
            | '\u{0370}'..='\u{037D}'
            | '\u{037F}'..='\u{1FFF}'
            | '\u{200C}'..='\u{200D}'
            | '\u{2070}'..='\u{218F}'
            | '\u{2C00}'..='\u{2FEF}'
            | '\u{3001}'..='\u{D7FF}'
            | '\u{F900}'..='\u{FDCF}'
            | '\u{FDF0}'..='\u{FFFD}'
            | '\u{10000}'..='\u{EFFFF}')
}

/// Digits and combining marks allowed after the first character of a name
fn is_name_continuation(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '\u{00B7}' | '\u{0300}'..='\u{036F}' | '\u{203F}'..='\u{2040}')
}

/// PN_CHARS: characters inside prefixed names
pub fn is_pn_chars(c: char) -> bool {
    is_pn_chars_base(c) || c == '_' || c == '-' || is_name_continuation(c)
}

/// VARNAME characters after `?` or `$`
pub fn is_varname_char(c: char) -> bool {
    is_pn_chars_base(c) || c == '_' || is_name_continuation(c)
}

pub fn is_ws(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Characters allowed unescaped between `<` and `>`
pub fn is_iri_char(c: char) -> bool {
    !matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' | '\x00'..='\x20')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_classes() {
        assert!(is_pn_chars_base('é'));
        assert!(!is_pn_chars_base('_'));
        assert!(is_pn_chars('-') && is_pn_chars('_') && is_pn_chars('7'));
        assert!(is_varname_char('_'));
        assert!(!is_varname_char('-'));
    }

    #[test]
    fn test_iri_exclusions() {
        assert!(is_iri_char('/') && is_iri_char('#'));
        assert!(!is_iri_char(' ') && !is_iri_char('>') && !is_iri_char('{'));
    }
}
