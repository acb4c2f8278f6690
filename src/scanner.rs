use peekmore::{PeekMore, PeekMoreIterator};
use substring::Substring;
use std::str::Chars;

use crate::literal::Literal;
use crate::runtime::Runtime;
use crate::token::{Kind, Token};

pub struct Scanner<'a> {
    source: &'a str,
    chars: PeekMoreIterator<Chars<'a>>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Scanner<'a> {
        Scanner {
            source,
            chars: source.chars().peekmore(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
        }
    }

    /// Scans every token in the source, reporting errors against `runtime`
    /// as it goes rather than stopping at the first one.
    pub fn scan_tokens(mut self, runtime: &Runtime) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token(runtime);
        }

        self.tokens.push(Token::new(Kind::Eof, String::new(), None, self.line));
        self.tokens
    }

    fn is_at_end(&mut self) -> bool {
        self.chars.peek().is_none()
    }

    fn advance(&mut self) -> char {
        let c = self.chars.next().expect("advance past end of source");
        self.current += 1;
        c
    }

    fn peek(&mut self) -> char {
        self.chars.peek().copied().unwrap_or('\0')
    }

    fn peek_next(&mut self) -> char {
        self.chars.peek_nth(1).copied().unwrap_or('\0')
    }

    fn matches(&mut self, expected: char) -> bool {
        if self.peek() != expected {
            return false;
        }
        self.advance();
        true
    }

    fn lexeme(&self) -> String {
        self.source.substring(self.start, self.current).to_string()
    }

    fn add_token(&mut self, kind: Kind, literal: Option<Literal>) {
        self.tokens.push(Token::new(kind, self.lexeme(), literal, self.line));
    }

    /// Handles a string literal. The opening quote has already been consumed.
    fn string(&mut self, runtime: &Runtime) {
        while self.peek() != '"' && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            runtime.error(self.line, "Unterminated string.");
            return;
        }

        self.advance(); // closing quote

        // Literal excludes the surrounding quotes unlike the lexeme.
        let value = self.source.substring(self.start + 1, self.current - 1).to_string();
        self.add_token(Kind::String, Some(Literal::String(value)));
    }

    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance(); // the dot
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let value: f64 = self.lexeme().parse().expect("scanned number lexeme must parse as f64");
        self.add_token(Kind::Number, Some(Literal::Number(value)));
    }

    /// Handles an identifier or a keyword.
    fn identifier(&mut self) {
        // is_alphanumeric does not include underscores.
        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let kind = match self.lexeme().as_str() {
            "and" => Kind::And,
            "class" => Kind::Class,
            "else" => Kind::Else,
            "false" => Kind::False,
            "for" => Kind::For,
            "fun" => Kind::Fun,
            "if" => Kind::If,
            "nil" => Kind::Nil,
            "or" => Kind::Or,
            "print" => Kind::Print,
            "return" => Kind::Return,
            "super" => Kind::Super,
            "this" => Kind::This,
            "true" => Kind::True,
            "var" => Kind::Var,
            "while" => Kind::While,
            "assert" => Kind::Assert,
            _ => Kind::Identifier,
        };

        self.add_token(kind, None);
    }

    fn scan_token(&mut self, runtime: &Runtime) {
        let c = self.advance();
        match c {
            '(' => self.add_token(Kind::LeftParen, None),
            ')' => self.add_token(Kind::RightParen, None),
            '{' => self.add_token(Kind::LeftBrace, None),
            '}' => self.add_token(Kind::RightBrace, None),
            ',' => self.add_token(Kind::Comma, None),
            '.' => self.add_token(Kind::Dot, None),
            '-' => self.add_token(Kind::Minus, None),
            '+' => self.add_token(Kind::Plus, None),
            ';' => self.add_token(Kind::Semicolon, None),
            '*' => self.add_token(Kind::Star, None),

            '!' => {
                let kind = if self.matches('=') { Kind::BangEqual } else { Kind::Bang };
                self.add_token(kind, None);
            }
            '=' => {
                let kind = if self.matches('=') { Kind::EqualEqual } else { Kind::Equal };
                self.add_token(kind, None);
            }
            '<' => {
                let kind = if self.matches('=') { Kind::LessEqual } else { Kind::Less };
                self.add_token(kind, None);
            }
            '>' => {
                let kind = if self.matches('=') { Kind::GreaterEqual } else { Kind::Greater };
                self.add_token(kind, None);
            }
            '/' => {
                if self.matches('/') {
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else {
                    self.add_token(Kind::Slash, None);
                }
            }

            ' ' | '\r' | '\t' => {}
            '\n' => self.line += 1,

            '"' => self.string(runtime),

            c if c.is_ascii_digit() => self.number(),
            c if c.is_alphabetic() || c == '_' => self.identifier(),

            _ => runtime.error(self.line, &format!("Unexpected character '{c}'.")),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn kinds(source: &str) -> Vec<Kind> {
        let runtime = Runtime::new();
        Scanner::new(source).scan_tokens(&runtime).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn scans_single_and_double_char_operators() {
        assert_eq!(kinds("!= =="), vec![Kind::BangEqual, Kind::EqualEqual, Kind::Eof]);
    }

    #[test]
    fn scans_string_literal() {
        let runtime = Runtime::new();
        let tokens = Scanner::new("\"hi\"").scan_tokens(&runtime);
        assert_eq!(tokens[0].kind, Kind::String);
        assert_eq!(tokens[0].literal, Some(Literal::String("hi".to_string())));
    }

    #[test]
    fn scans_number_literal() {
        let runtime = Runtime::new();
        let tokens = Scanner::new("3.14").scan_tokens(&runtime);
        assert_eq!(tokens[0].literal, Some(Literal::Number(3.14)));
    }

    #[test]
    fn keywords_are_distinguished_from_identifiers() {
        assert_eq!(kinds("nil assert foo"), vec![Kind::Nil, Kind::Assert, Kind::Identifier, Kind::Eof]);
    }

    #[test]
    fn unterminated_string_reports_error() {
        let runtime = Runtime::new();
        Scanner::new("\"oops").scan_tokens(&runtime);
        assert!(runtime.had_error());
    }

    #[test]
    fn line_comment_is_skipped() {
        assert_eq!(kinds("// a comment\n1"), vec![Kind::Number, Kind::Eof]);
    }
}
