//! N-Triples lexer and line parser.
//!
//! Each non-empty line is tokenized into terms and a terminating `.`, then
//! assembled into a [`Triple`]. Positions in errors are 1-based characters.

use std::io::{BufRead, Lines};

use crate::model::{Literal, Term, Triple};
use crate::{Error, Result};

/// A token from one line of input.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// 1-based column of the token's first character.
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Term(Term),
    Dot,
}

/// Tokenize a single line. A `#` outside a term starts a comment.
pub fn tokenize(line: &str, line_no: usize) -> Result<Vec<Token>> {
    let mut lexer = Lexer { chars: line.chars().collect(), pos: 0, line: line_no };
    let mut tokens = Vec::new();

    while let Some(ch) = lexer.peek() {
        let column = lexer.pos + 1;
        let kind = match ch {
            c if c.is_whitespace() => {
                lexer.pos += 1;
                continue;
            }
            '#' => break,
            '.' => {
                lexer.pos += 1;
                TokenKind::Dot
            }
            '<' => TokenKind::Term(Term::Resource(lexer.iri()?)),
            '_' => TokenKind::Term(lexer.blank()?),
            '"' => TokenKind::Term(lexer.literal()?),
            c => return Err(lexer.error(column, format!("unexpected character '{c}'"))),
        };
        tokens.push(Token { kind, column });
    }
    Ok(tokens)
}

/// Parse one line. `Ok(None)` for blank and comment-only lines.
pub fn parse_line(line: &str, line_no: usize) -> Result<Option<Triple>> {
    let tokens = tokenize(line, line_no)?;
    if tokens.is_empty() {
        return Ok(None);
    }

    let syntax = |column: usize, message: String| Error::Syntax { line: line_no, column, message };
    let end_column = line.chars().count() + 1;

    let mut terms = Vec::with_capacity(3);
    let mut tokens = tokens.into_iter();
    loop {
        match tokens.next() {
            Some(Token { kind: TokenKind::Term(term), column }) => {
                if terms.len() == 3 {
                    return Err(syntax(column, "expected '.' after object, found another term".into()));
                }
                terms.push(term);
            }
            Some(Token { kind: TokenKind::Dot, column }) => {
                if terms.len() < 3 {
                    return Err(syntax(column, format!("expected 3 terms before '.', found {}", terms.len())));
                }
                break;
            }
            None => {
                let message = if terms.len() < 3 {
                    format!("expected 3 terms, found {}", terms.len())
                } else {
                    "missing '.' at end of triple".to_owned()
                };
                return Err(syntax(end_column, message));
            }
        }
    }
    if let Some(extra) = tokens.next() {
        return Err(syntax(extra.column, "unexpected token after '.'".into()));
    }

    let mut terms = terms.into_iter();
    match (terms.next(), terms.next(), terms.next()) {
        (Some(s), Some(p), Some(o)) => Ok(Some(Triple::new(s, p, o))),
        _ => Err(syntax(end_column, "expected 3 terms".into())),
    }
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl Lexer {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn error(&self, column: usize, message: impl Into<String>) -> Error {
        Error::Syntax { line: self.line, column, message: message.into() }
    }

    /// `<...>`, returning the text between the brackets.
    fn iri(&mut self) -> Result<String> {
        let start = self.pos + 1;
        self.pos += 1; // '<'
        let mut iri = String::new();
        loop {
            match self.bump() {
                Some('>') => break,
                Some('\\') => iri.push(self.unicode_escape()?),
                Some(c) if c.is_whitespace() || c == '<' || c == '"' => {
                    return Err(self.error(self.pos, format!("invalid character {c:?} in IRI")));
                }
                Some(c) => iri.push(c),
                None => return Err(self.error(start, "unterminated IRI")),
            }
        }
        if iri.is_empty() {
            return Err(self.error(start, "empty IRI"));
        }
        Ok(iri)
    }

    /// `_:label`. A trailing `.` ends the statement rather than the label.
    fn blank(&mut self) -> Result<Term> {
        let start = self.pos + 1;
        if self.chars.get(self.pos + 1) != Some(&':') {
            return Err(self.error(start, "expected ':' after '_'"));
        }
        self.pos += 2;
        let from = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || matches!(c, '_' | '-' | '.')) {
            self.pos += 1;
        }
        while self.pos > from && self.chars[self.pos - 1] == '.' {
            self.pos -= 1;
        }
        if self.pos == from {
            return Err(self.error(start, "empty blank node label"));
        }
        Ok(Term::BlankNode(self.chars[from..self.pos].iter().collect()))
    }

    /// `"..."` with an optional `@lang` or `^^<datatype>` suffix.
    fn literal(&mut self) -> Result<Term> {
        let start = self.pos + 1;
        self.pos += 1; // opening quote
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('"') => break,
                Some('\\') => value.push(self.string_escape()?),
                Some(c) => value.push(c),
                None => return Err(self.error(start, "unterminated string literal")),
            }
        }

        let lit = match self.peek() {
            Some('@') => {
                self.pos += 1;
                let from = self.pos;
                while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '-') {
                    self.pos += 1;
                }
                if self.pos == from {
                    return Err(self.error(from, "empty language tag"));
                }
                Literal::lang(value, self.chars[from..self.pos].iter().collect::<String>())
            }
            Some('^') => {
                if self.chars.get(self.pos + 1) != Some(&'^') || self.chars.get(self.pos + 2) != Some(&'<') {
                    return Err(self.error(self.pos + 1, "expected '^^<' before datatype"));
                }
                self.pos += 2;
                Literal::typed(value, self.iri()?)
            }
            _ => Literal::new(value),
        };
        Ok(Term::Literal(lit))
    }

    fn string_escape(&mut self) -> Result<char> {
        let column = self.pos;
        match self.bump() {
            Some('"') => Ok('"'),
            Some('\'') => Ok('\''),
            Some('\\') => Ok('\\'),
            Some('n') => Ok('\n'),
            Some('t') => Ok('\t'),
            Some('r') => Ok('\r'),
            Some('b') => Ok('\u{8}'),
            Some('f') => Ok('\u{c}'),
            Some('u') => self.hex_char(4),
            Some('U') => self.hex_char(8),
            Some(c) => Err(self.error(column, format!("unknown escape '\\{c}'"))),
            None => Err(self.error(column, "dangling '\\'")),
        }
    }

    fn unicode_escape(&mut self) -> Result<char> {
        let column = self.pos;
        match self.bump() {
            Some('u') => self.hex_char(4),
            Some('U') => self.hex_char(8),
            _ => Err(self.error(column, "only \\u and \\U escapes are allowed in IRIs")),
        }
    }

    fn hex_char(&mut self, digits: usize) -> Result<char> {
        let column = self.pos + 1;
        let end = self.pos + digits;
        let hex: String = self.chars.get(self.pos..end).unwrap_or_default().iter().collect();
        let code = if hex.len() == digits { u32::from_str_radix(&hex, 16).ok() } else { None };
        let Some(c) = code.and_then(char::from_u32) else {
            return Err(self.error(column, format!("invalid unicode escape '{hex}'")));
        };
        self.pos = end;
        Ok(c)
    }
}

/// Streams triples out of N-Triples text, one line at a time.
///
/// Syntax errors are yielded in place; iteration may continue past them.
pub struct NTriplesReader<R> {
    lines: Lines<R>,
    line_no: usize,
}

impl<R: BufRead> NTriplesReader<R> {
    pub fn new(reader: R) -> Self {
        Self { lines: reader.lines(), line_no: 0 }
    }

    /// Number of lines consumed so far.
    pub fn line_no(&self) -> usize {
        self.line_no
    }
}

impl<R: BufRead> Iterator for NTriplesReader<R> {
    type Item = Result<Triple>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(err) => return Some(Err(err.into())),
            };
            self.line_no += 1;
            match parse_line(&line, self.line_no) {
                Ok(Some(triple)) => return Some(Ok(triple)),
                Ok(None) => continue,
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn syntax_at(line: &str) -> (usize, String) {
        match parse_line(line, 7) {
            Err(Error::Syntax { line, column, message }) => {
                assert_eq!(line, 7);
                (column, message)
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_resources() {
        let triple = parse_line("<http://ex.org/a> <http://ex.org/p> <http://ex.org/b> .", 1)
            .unwrap()
            .unwrap();
        assert_eq!(triple.subject, Term::resource("http://ex.org/a"));
        assert_eq!(triple.predicate, Term::resource("http://ex.org/p"));
        assert_eq!(triple.object, Term::resource("http://ex.org/b"));
    }

    #[test]
    fn test_parse_blank_and_literals() {
        let t = parse_line("_:b0 <http://ex.org/name> \"chat\"@fr.", 1).unwrap().unwrap();
        assert_eq!(t.subject, Term::blank("b0"));
        assert_eq!(t.object, Term::lang_literal("chat", "fr"));

        let t = parse_line(
            "_:x.y <http://ex.org/age> \"3\"^^<http://www.w3.org/2001/XMLSchema#integer> .",
            1,
        )
        .unwrap()
        .unwrap();
        assert_eq!(t.subject, Term::blank("x.y"));
        assert_eq!(t.object, Term::typed_literal("3", "http://www.w3.org/2001/XMLSchema#integer"));
    }

    #[test]
    fn test_escapes() {
        let t = parse_line(r#"<a:s> <a:p> "say \"hi\"\n\tcafé \\ ok" ."#, 1).unwrap().unwrap();
        assert_eq!(t.object, Term::literal("say \"hi\"\n\tcafé \\ ok"));
    }

    #[test]
    fn test_blank_and_comment_lines() {
        assert_eq!(parse_line("", 1).unwrap(), None);
        assert_eq!(parse_line("   \t", 1).unwrap(), None);
        assert_eq!(parse_line("# just a comment", 1).unwrap(), None);
        let t = parse_line("<a:s> <a:p> \"#not a comment\" . # trailing", 1).unwrap().unwrap();
        assert_eq!(t.object, Term::literal("#not a comment"));
    }

    #[test]
    fn test_too_many_terms() {
        let (column, message) = syntax_at("<a:s> <a:p> <a:o> <a:x> .");
        assert_eq!(column, 19);
        assert!(message.contains("another term"));
    }

    #[test]
    fn test_too_few_terms() {
        let (column, message) = syntax_at("<a:s> <a:p> .");
        assert_eq!(column, 13);
        assert!(message.contains("found 2"));
    }

    #[test]
    fn test_missing_dot_and_bad_tokens() {
        let (column, message) = syntax_at("<a:s> <a:p> <a:o>");
        assert_eq!(column, 18);
        assert!(message.contains("missing '.'"));

        let (column, _) = syntax_at("<a:s> ?p <a:o> .");
        assert_eq!(column, 7);

        let (column, message) = syntax_at("<a:s> <a:p> \"open .");
        assert_eq!(column, 13);
        assert!(message.contains("unterminated"));

        let (_, message) = syntax_at("<a:s> <a:p> <a:o> . <a:x>");
        assert!(message.contains("after '.'"));
    }

    #[test]
    fn test_reader_counts_lines_and_continues_after_error() {
        let input = "# header\n<a:s> <a:p> <a:o> .\n\nbroken\n<a:s> <a:p> \"x\" .\n";
        let mut reader = NTriplesReader::new(input.as_bytes());

        assert!(reader.next().unwrap().is_ok());
        assert_eq!(reader.line_no(), 2);
        match reader.next().unwrap() {
            Err(Error::Syntax { line, column, .. }) => assert_eq!((line, column), (4, 1)),
            other => panic!("expected syntax error, got {other:?}"),
        }
        assert_eq!(reader.next().unwrap().unwrap().object, Term::literal("x"));
        assert!(reader.next().is_none());
    }
}
