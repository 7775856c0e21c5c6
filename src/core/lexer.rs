use crate::domain::token::{Token, TokenKind};
use crate::utils::error::{PlcError, Result};
use regex::Regex;

/// Turns PLC source text into a token stream.
///
/// Tokens are matched one character class at a time against compiled
/// single-character patterns; `peek` looks ahead without consuming and
/// `advance_if` consumes on a successful peek. Whitespace is skipped between
/// tokens and never emitted.
pub struct Lexer {
    chars: CharStream,
    patterns: Patterns,
}

struct Patterns {
    identifier_start: Regex,
    identifier_part: Regex,
    digit: Regex,
    sign: Regex,
    escape: Regex,
    character_plain: Regex,
    string_plain: Regex,
    comparison: Regex,
}

impl Patterns {
    fn new() -> Self {
        // Full-match single-character classes, anchored because regex::Regex
        // otherwise matches substrings.
        Patterns {
            identifier_start: Regex::new(r"^[A-Za-z]$").expect("static pattern"),
            identifier_part: Regex::new(r"^[A-Za-z0-9_-]$").expect("static pattern"),
            digit: Regex::new(r"^[0-9]$").expect("static pattern"),
            sign: Regex::new(r"^[+-]$").expect("static pattern"),
            escape: Regex::new(r#"^[bnrt'"\\]$"#).expect("static pattern"),
            character_plain: Regex::new(r"^[^'\n\r\\]$").expect("static pattern"),
            string_plain: Regex::new(r#"^[^"\n\r\\]$"#).expect("static pattern"),
            comparison: Regex::new(r"^[<>!=]$").expect("static pattern"),
        }
    }
}

fn check(pattern: &Regex, c: char) -> bool {
    let mut buf = [0u8; 4];
    pattern.is_match(c.encode_utf8(&mut buf))
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            chars: CharStream::new(input),
            patterns: Patterns::new(),
        }
    }

    pub fn lex(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        while self.chars.has(0) {
            match self.chars.get(0) {
                ' ' | '\u{8}' | '\n' | '\r' | '\t' => {
                    self.chars.advance();
                    self.chars.skip();
                }
                _ => tokens.push(self.lex_token()?),
            }
        }
        Ok(tokens)
    }

    /// Dispatches on the first character(s) without consuming them.
    fn lex_token(&mut self) -> Result<Token> {
        if self.chars.peek(&[&self.patterns.identifier_start]) {
            self.lex_identifier()
        } else if self.chars.peek(&[&self.patterns.sign, &self.patterns.digit])
            || self.chars.peek(&[&self.patterns.digit])
        {
            self.lex_number()
        } else if self.chars.get(0) == '\'' {
            self.lex_character()
        } else if self.chars.get(0) == '"' {
            self.lex_string()
        } else {
            self.lex_operator()
        }
    }

    fn lex_identifier(&mut self) -> Result<Token> {
        self.chars.advance();
        while self.chars.advance_if(&[&self.patterns.identifier_part]) {}
        Ok(self.chars.emit(TokenKind::Identifier))
    }

    fn lex_number(&mut self) -> Result<Token> {
        self.chars.advance_if(&[&self.patterns.sign]);
        if self.chars.has(0) && self.chars.get(0) == '0' {
            // A leading zero is a complete integer part by itself.
            self.chars.advance();
        } else {
            while self.chars.advance_if(&[&self.patterns.digit]) {}
        }

        if self.chars.has(1)
            && self.chars.get(0) == '.'
            && check(&self.patterns.digit, self.chars.get(1))
        {
            self.chars.advance();
            while self.chars.advance_if(&[&self.patterns.digit]) {}
            Ok(self.chars.emit(TokenKind::Decimal))
        } else {
            Ok(self.chars.emit(TokenKind::Integer))
        }
    }

    fn lex_character(&mut self) -> Result<Token> {
        self.chars.advance();
        if (self.chars.advance_if(&[&self.patterns.character_plain])
            || self.chars.advance_escape(&self.patterns.escape))
            && self.chars.has(0)
            && self.chars.get(0) == '\''
        {
            self.chars.advance();
            return Ok(self.chars.emit(TokenKind::Character));
        }
        Err(PlcError::lex(
            "unterminated or empty character literal",
            self.chars.index,
        ))
    }

    fn lex_string(&mut self) -> Result<Token> {
        self.chars.advance();
        while self.chars.advance_if(&[&self.patterns.string_plain])
            || self.chars.advance_escape(&self.patterns.escape)
        {}
        if self.chars.has(0) && self.chars.get(0) == '"' {
            self.chars.advance();
            Ok(self.chars.emit(TokenKind::String))
        } else {
            Err(PlcError::lex(
                "unterminated string literal",
                self.chars.index,
            ))
        }
    }

    fn lex_operator(&mut self) -> Result<Token> {
        if self.chars.advance_if(&[&self.patterns.comparison]) {
            if self.chars.has(0) && self.chars.get(0) == '=' {
                self.chars.advance();
            }
        } else {
            self.chars.advance();
        }
        Ok(self.chars.emit(TokenKind::Operator))
    }
}

/// Character cursor over the input plus the length of the token currently
/// being matched.
struct CharStream {
    input: Vec<char>,
    index: usize,
    length: usize,
}

impl CharStream {
    fn new(input: &str) -> Self {
        CharStream {
            input: input.chars().collect(),
            index: 0,
            length: 0,
        }
    }

    fn has(&self, offset: usize) -> bool {
        self.index + offset < self.input.len()
    }

    fn get(&self, offset: usize) -> char {
        self.input[self.index + offset]
    }

    fn advance(&mut self) {
        self.index += 1;
        self.length += 1;
    }

    fn skip(&mut self) {
        self.length = 0;
    }

    /// True when the next characters match the given single-char patterns in
    /// order.
    fn peek(&self, patterns: &[&Regex]) -> bool {
        patterns
            .iter()
            .enumerate()
            .all(|(i, pattern)| self.has(i) && check(pattern, self.get(i)))
    }

    fn advance_if(&mut self, patterns: &[&Regex]) -> bool {
        let matched = self.peek(patterns);
        if matched {
            for _ in 0..patterns.len() {
                self.advance();
            }
        }
        matched
    }

    /// Consumes a backslash escape (`\b \n \r \t \' \" \\`) if one is next.
    fn advance_escape(&mut self, escape: &Regex) -> bool {
        if self.has(1) && self.get(0) == '\\' && check(escape, self.get(1)) {
            self.advance();
            self.advance();
            true
        } else {
            false
        }
    }

    fn emit(&mut self, kind: TokenKind) -> Token {
        let start = self.index - self.length;
        let literal: String = self.input[start..self.index].iter().collect();
        self.skip();
        Token::new(kind, literal, start)
    }
}
