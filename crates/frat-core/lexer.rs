//! Byte-oriented tokenizer over the grammar source.
//!
//! Token grammar (see `spec.md` §4.1):
//!
//! ```text
//! TERM       ≡ [_A-Z] [_A-Z0-9]*
//! NTERM      ≡ [a-z] [_a-zA-Z0-9]*
//! DEF        ≡ '=' | ':'
//! STRING     ≡ "'" SCHAR+ "'" | '"' DCHAR+ '"'
//! CHARSET    ≡ '[' SETCHAR+ ']'
//! COMMENT    ≡ "//" (non-newline)*           -- skipped
//! WHITESPACE ≡ [ \t\r\n]+                     -- skipped
//! ```

use crate::token::{Token, TokenKind};

/// A byte-oriented tokenizer over a grammar source buffer.
pub struct Lexer<'a> {
    source_name: String,
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source_name: impl Into<String>, buf: &'a [u8]) -> Self {
        Lexer { source_name: source_name.into(), buf, pos: 0 }
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn source(&self) -> &'a [u8] {
        self.buf
    }

    pub fn text(&self, tok: Token) -> &'a [u8] {
        &self.buf[tok.offset..tok.end()]
    }

    pub fn text_str(&self, tok: Token) -> &'a str {
        std::str::from_utf8(self.text(tok)).unwrap_or("")
    }

    /// 1-based line number of `tok`'s offset.
    pub fn line_number(&self, tok: Token) -> usize {
        1 + self.buf[..tok.offset.min(self.buf.len())]
            .iter()
            .filter(|&&b| b == b'\n')
            .count()
    }

    /// The byte slice of the line containing `tok`, as a `Token` spanning
    /// that line (newline excluded).
    pub fn line_token(&self, tok: Token) -> Token {
        let start = self.buf[..tok.offset.min(self.buf.len())]
            .iter()
            .rposition(|&b| b == b'\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        let end = self.buf[start..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|i| start + i)
            .unwrap_or(self.buf.len());
        Token::new(TokenKind::Invalid, start, end - start)
    }

    /// A caret-underline string aligned under `err_tok`'s column within
    /// `line_tok`'s line.
    pub fn line_marker(&self, line_tok: Token, err_tok: Token) -> String {
        let col = err_tok.offset.saturating_sub(line_tok.offset);
        let width = err_tok.len.max(1);
        let mut marker = " ".repeat(col);
        marker.push('^');
        for _ in 1..width {
            marker.push('~');
        }
        marker
    }

    fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    fn peek_at(&self, rel: usize) -> Option<u8> {
        self.buf.get(self.pos + rel).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') => {
                    self.pos += 1;
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    while let Some(b) = self.peek() {
                        if b == b'\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }

    fn is_ident_cont(b: u8) -> bool {
        b == b'_' || b.is_ascii_alphanumeric()
    }

    /// Consumes one escape-aware content byte of a quoted/bracketed
    /// literal, returning true if progress was made. Does not interpret
    /// the escape, only skips over it so the enclosing quote isn't
    /// mistaken for content.
    fn skip_escaped_content_byte(&mut self) -> bool {
        match self.peek() {
            Some(b'\\') => {
                self.pos += 1;
                if self.peek().is_some() {
                    self.pos += 1;
                }
                true
            }
            Some(_) => {
                self.pos += 1;
                true
            }
            None => false,
        }
    }

    fn lex_quoted(&mut self, quote: u8) -> TokenKind {
        self.pos += 1; // opening quote
        let mut any = false;
        loop {
            match self.peek() {
                Some(b) if b == quote => {
                    self.pos += 1;
                    return if any { TokenKind::String } else { TokenKind::Invalid };
                }
                Some(b'\n') | Some(b'\r') | None => return TokenKind::Invalid,
                _ => {
                    any = true;
                    self.skip_escaped_content_byte();
                }
            }
        }
    }

    fn lex_charset(&mut self) -> TokenKind {
        self.pos += 1; // '['
        let mut any = false;
        loop {
            match self.peek() {
                Some(b']') => {
                    self.pos += 1;
                    return if any { TokenKind::CharSet } else { TokenKind::Invalid };
                }
                Some(b'\n') | Some(b'\r') | None => return TokenKind::Invalid,
                _ => {
                    any = true;
                    self.skip_escaped_content_byte();
                }
            }
        }
    }

    /// Returns the next token, advancing past it. Yields `Eos` with zero
    /// length at end of input; an unrecognised starting byte yields
    /// `Invalid`.
    pub fn next(&mut self) -> Token {
        self.skip_trivia();
        let start = self.pos;

        let Some(b) = self.peek() else {
            return Token::new(TokenKind::Eos, start, 0);
        };

        let kind = match b {
            b'_' | b'A'..=b'Z' => {
                self.pos += 1;
                while self.peek().map(Self::is_ident_cont).unwrap_or(false) {
                    self.pos += 1;
                }
                TokenKind::Term
            }
            b'a'..=b'z' => {
                self.pos += 1;
                while self.peek().map(Self::is_ident_cont).unwrap_or(false) {
                    self.pos += 1;
                }
                TokenKind::NTerm
            }
            b'=' | b':' => {
                self.pos += 1;
                TokenKind::Def
            }
            b';' => {
                self.pos += 1;
                TokenKind::SemiColon
            }
            b'.' => {
                self.pos += 1;
                TokenKind::Dot
            }
            b'\'' | b'"' => self.lex_quoted(b),
            b'[' => self.lex_charset(),
            b'*' => {
                self.pos += 1;
                TokenKind::Zero
            }
            b'+' => {
                self.pos += 1;
                TokenKind::One
            }
            b'?' => {
                self.pos += 1;
                TokenKind::Opt
            }
            b'(' => {
                self.pos += 1;
                TokenKind::POpen
            }
            b')' => {
                self.pos += 1;
                TokenKind::PClose
            }
            b'|' => {
                self.pos += 1;
                TokenKind::Alt
            }
            _ => {
                self.pos += 1;
                TokenKind::Invalid
            }
        };

        Token::new(kind, start, self.pos - start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new("<test>", src.as_bytes());
        let mut out = Vec::new();
        loop {
            let tok = lexer.next();
            let done = tok.kind == TokenKind::Eos;
            out.push(tok.kind);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn lexes_a_simple_production() {
        use TokenKind::*;
        assert_eq!(
            kinds("a = 'x' ;"),
            vec![NTerm, Def, String, SemiColon, Eos]
        );
    }

    #[test]
    fn lexes_term_and_charset_and_dot() {
        use TokenKind::*;
        assert_eq!(kinds("A = [a-c] . ;"), vec![Term, Def, CharSet, Dot, SemiColon, Eos]);
    }

    #[test]
    fn skips_comments_and_whitespace() {
        use TokenKind::*;
        assert_eq!(kinds("  // comment\n a = 'x'; // trailing\n"), vec![NTerm, Def, String, SemiColon, Eos]);
    }

    #[test]
    fn unterminated_string_is_invalid() {
        assert_eq!(kinds("a = 'x"), vec![TokenKind::NTerm, TokenKind::Def, TokenKind::Invalid, TokenKind::Eos]);
    }

    #[test]
    fn unknown_byte_is_invalid() {
        assert_eq!(kinds("@"), vec![TokenKind::Invalid, TokenKind::Eos]);
    }

    #[test]
    fn line_number_and_marker() {
        let src = "a = 'x';\nb = BAD;\n";
        let mut lexer = Lexer::new("<t>", src.as_bytes());
        let mut last = lexer.next();
        let mut tok = last;
        loop {
            tok = lexer.next();
            if tok.kind == TokenKind::Eos {
                break;
            }
            last = tok;
        }
        let _ = last;
        // "BAD" on line 2, column 4
        let bad_offset = src.find("BAD").unwrap();
        let bad_tok = Token::new(TokenKind::Term, bad_offset, 3);
        assert_eq!(lexer.line_number(bad_tok), 2);
        let line_tok = lexer.line_token(bad_tok);
        assert_eq!(lexer.text_str(line_tok), "b = BAD;");
        let marker = lexer.line_marker(line_tok, bad_tok);
        assert_eq!(marker, "    ^~~");
    }
}
