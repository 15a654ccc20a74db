//! SPARQL lexer implementation using winnow.
//!
//! Produces a coarse token stream: enough to find graph references and
//! prologue declarations, not a full SPARQL grammar. String literal contents
//! and blank node labels are discarded. Fails fast on the first unterminated
//! IRI or string.

use winnow::combinator::alt;
use winnow::error::{ContextError, ErrMode};
use winnow::stream::Location;
use winnow::token::{any, one_of, take_till, take_while};
use winnow::{LocatingSlice, ModalResult, Parser};

use super::chars::*;
use super::ScanError;

/// Input type for the lexer - tracks position for error reporting.
pub type Input<'a> = LocatingSlice<&'a str>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `<...>`, unresolved
    Iri(String),
    /// `prefix:local`; `local` is empty for a bare namespace `prefix:`
    PrefixedName { prefix: String, local: String },
    /// `?name` or `$name`
    Var(String),
    /// Keyword, function name or number, uppercased
    Word(String),
    /// String literal (content dropped)
    Literal,
    /// `_:label`
    BlankNode,
    Punct(char),
}

/// Lexer for SPARQL query and update text.
pub struct Lexer<'a> {
    input: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input }
    }

    /// Tokenize the entire input.
    pub fn tokenize(self) -> Result<Vec<Token>, ScanError> {
        let mut tokens = Vec::new();
        let mut input = LocatingSlice::new(self.input);

        loop {
            skip_ws_and_comments(&mut input);
            if input.is_empty() {
                break;
            }

            let start = input.current_token_start();
            match next_token(&mut input) {
                Ok(token) => tokens.push(token),
                Err(_) => return Err(self.make_error(start)),
            }
        }

        Ok(tokens)
    }

    fn make_error(&self, position: usize) -> ScanError {
        let bad_char = self.input[position..].chars().next().unwrap_or('?');
        let (line, column) = self.line_col(position);
        let line_content = self.input.lines().nth(line - 1).unwrap_or("");
        let pointer = " ".repeat(column.saturating_sub(1));

        let what = match bad_char {
            '"' | '\'' => "unterminated string literal".to_string(),
            '<' => "invalid or unterminated IRI".to_string(),
            c => format!("unexpected character '{}'", c),
        };
        ScanError::Lexer {
            line,
            column,
            message: format!("{}\n  |\n{} | {}\n  | {}^", what, line, line_content, pointer),
        }
    }

    /// Convert a byte position to (line, column), 1-indexed.
    fn line_col(&self, position: usize) -> (usize, usize) {
        let mut line = 1;
        let mut col = 1;

        for (i, c) in self.input.char_indices() {
            if i >= position {
                break;
            }
            if c == '\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }

        (line, col)
    }
}

fn backtrack<T>() -> ModalResult<T> {
    Err(ErrMode::Backtrack(ContextError::new()))
}

fn cut<T>() -> ModalResult<T> {
    Err(ErrMode::Cut(ContextError::new()))
}

/// Skip whitespace and comments.
fn skip_ws_and_comments(input: &mut Input<'_>) {
    loop {
        let _: ModalResult<&str> = take_while(0.., is_ws).parse_next(input);

        if input.starts_with('#') {
            let _: ModalResult<&str> = take_till(0.., |c| c == '\n' || c == '\r').parse_next(input);
        } else {
            break;
        }
    }
}

fn next_token(input: &mut Input<'_>) -> ModalResult<Token> {
    alt((
        parse_iri_ref,
        parse_var,
        parse_blank_node_label,
        parse_string_literal,
        parse_prefixed_name_or_word,
        any.map(Token::Punct),
    ))
    .parse_next(input)
}

// =============================================================================
// IRIs and names
// =============================================================================

/// `<...>`; a bare `<` followed by whitespace is the less-than operator
fn parse_iri_ref(input: &mut Input<'_>) -> ModalResult<Token> {
    '<'.parse_next(input)?;
    let content: &str = take_while(0.., is_iri_char).parse_next(input)?;

    if input.starts_with('>') {
        '>'.parse_next(input)?;
        return Ok(Token::Iri(content.to_string()));
    }
    let at_line_end = input.is_empty() || input.starts_with('\n') || input.starts_with('\r');
    if !content.is_empty() && at_line_end {
        return cut();
    }
    backtrack()
}

fn parse_var(input: &mut Input<'_>) -> ModalResult<Token> {
    one_of(['?', '$']).parse_next(input)?;
    let name: &str = take_while(1.., is_varname_char).parse_next(input)?;
    Ok(Token::Var(name.to_string()))
}

fn parse_blank_node_label(input: &mut Input<'_>) -> ModalResult<Token> {
    "_:".parse_next(input)?;
    take_while(1.., is_pn_chars).parse_next(input)?;
    Ok(Token::BlankNode)
}

/// Prefixed name (`ex:name`, `:name`, `ex:`) or bare word
fn parse_prefixed_name_or_word(input: &mut Input<'_>) -> ModalResult<Token> {
    let word: &str = take_while(0.., is_pn_chars).parse_next(input)?;

    if input.starts_with(':') {
        if word.starts_with(|c: char| !is_pn_chars_base(c)) {
            return backtrack();
        }
        ':'.parse_next(input)?;
        let local = parse_pn_local(input)?;
        return Ok(Token::PrefixedName {
            prefix: word.to_string(),
            local,
        });
    }

    if word.is_empty() {
        return backtrack();
    }
    Ok(Token::Word(word.to_ascii_uppercase()))
}

/// Local part of a prefixed name; may be empty
fn parse_pn_local(input: &mut Input<'_>) -> ModalResult<String> {
    let mut result = String::new();

    loop {
        let chunk: &str =
            take_while(0.., |c: char| is_pn_chars(c) || c == ':').parse_next(input)?;
        result.push_str(chunk);

        if input.starts_with('.') {
            // A trailing dot ends the triple, not the name
            let next_char = input.as_ref()[1..].chars().next();
            if next_char.is_some_and(|c| is_pn_chars(c) || c == ':' || c == '%' || c == '\\') {
                '.'.parse_next(input)?;
                result.push('.');
                continue;
            }
            break;
        }

        if input.starts_with('%') {
            '%'.parse_next(input)?;
            let hex: &str = take_while(2..=2, |c: char| c.is_ascii_hexdigit()).parse_next(input)?;
            result.push('%');
            result.push_str(hex);
        } else if input.starts_with('\\') {
            '\\'.parse_next(input)?;
            let escaped: char = any.parse_next(input)?;
            if "_~.-!$&'()*+,;=/?#@%".contains(escaped) {
                result.push(escaped);
            } else {
                return backtrack();
            }
        } else {
            break;
        }
    }

    Ok(result)
}

// =============================================================================
// String literals
// =============================================================================

fn parse_string_literal(input: &mut Input<'_>) -> ModalResult<Token> {
    alt((
        |i: &mut Input<'_>| parse_long_string(i, "\"\"\""),
        |i: &mut Input<'_>| parse_long_string(i, "'''"),
        |i: &mut Input<'_>| parse_short_string(i, '"'),
        |i: &mut Input<'_>| parse_short_string(i, '\''),
    ))
    .parse_next(input)
}

fn parse_long_string(input: &mut Input<'_>, mut quote: &'static str) -> ModalResult<Token> {
    quote.parse_next(input)?;
    loop {
        if input.is_empty() {
            return cut();
        }
        if input.starts_with(quote) {
            quote.parse_next(input)?;
            return Ok(Token::Literal);
        }
        let c: char = any.parse_next(input)?;
        if c == '\\' {
            if input.is_empty() {
                return cut();
            }
            let _: char = any.parse_next(input)?;
        }
    }
}

fn parse_short_string(input: &mut Input<'_>, mut quote: char) -> ModalResult<Token> {
    quote.parse_next(input)?;
    loop {
        if input.is_empty() || input.starts_with('\n') || input.starts_with('\r') {
            return cut();
        }
        let c: char = any.parse_next(input)?;
        if c == quote {
            return Ok(Token::Literal);
        }
        if c == '\\' {
            if input.is_empty() {
                return cut();
            }
            let _: char = any.parse_next(input)?;
        }
    }
}
