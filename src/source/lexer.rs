//! Tokens of the class manifest format.

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Str(String),
    Num(i64),

    At,
    Colon,
    Comma,
    Dot,
    Eq,
    Semicolon,

    LAngle,
    RAngle,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,

    /// Appended once by [`Lexer::tokenize`]; never yielded by the iterator.
    Eof,
}

impl Token {
    fn punct(c: char) -> Option<Token> {
        let tok = match c {
            '@' => Token::At,
            ':' => Token::Colon,
            ',' => Token::Comma,
            '.' => Token::Dot,
            '=' => Token::Eq,
            ';' => Token::Semicolon,
            '<' => Token::LAngle,
            '>' => Token::RAngle,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            '(' => Token::LParen,
            ')' => Token::RParen,
            _ => return None,
        };
        Some(tok)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LexError {
    #[error("line {line}: unexpected character '{ch}'")]
    UnexpectedChar { ch: char, line: usize },
    #[error("line {line}: string is never closed")]
    UnterminatedString { line: usize },
    #[error("line {line}: block comment is never closed")]
    UnterminatedComment { line: usize },
    #[error("line {line}: {text} is not a valid integer")]
    InvalidNumber { text: String, line: usize },
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_part(c: char) -> bool {
    is_ident_start(c) || c.is_numeric()
}

/// Byte-offset cursor over manifest text, yielding tokens until the input
/// ends or the first error.
pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            done: false,
        }
    }

    /// All tokens followed by [`Token::Eof`].
    pub fn tokenize(self) -> Result<Vec<Token>, LexError> {
        let mut tokens = self.collect::<Result<Vec<_>, _>>()?;
        tokens.push(Token::Eof);
        Ok(tokens)
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(|c| pred(c)) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    /// Whitespace, `#` and `//` line comments, `/* */` block comments.
    fn skip_trivia(&mut self) -> Result<(), LexError> {
        loop {
            let rest = self.rest();
            if rest.starts_with(char::is_whitespace) {
                self.take_while(char::is_whitespace);
            } else if rest.starts_with('#') || rest.starts_with("//") {
                self.take_while(|c| c != '\n');
            } else if rest.starts_with("/*") {
                let end = rest
                    .find("*/")
                    .ok_or(LexError::UnterminatedComment { line: self.line })?;
                let comment = &rest[..end + 2];
                self.line += comment.matches('\n').count();
                self.pos += comment.len();
            } else {
                return Ok(());
            }
        }
    }

    fn string(&mut self) -> Result<Token, LexError> {
        let line = self.line;
        let mut text = String::new();
        loop {
            match self.bump().ok_or(LexError::UnterminatedString { line })? {
                '"' => return Ok(Token::Str(text)),
                '\\' => match self.bump() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some(c) => text.push(c),
                    None => return Err(LexError::UnterminatedString { line }),
                },
                c => text.push(c),
            }
        }
    }

    fn number(&mut self, start: usize) -> Result<Token, LexError> {
        self.take_while(|c| c.is_ascii_digit());
        let text = &self.src[start..self.pos];
        text.parse().map(Token::Num).map_err(|_| LexError::InvalidNumber {
            text: text.to_string(),
            line: self.line,
        })
    }

    fn token(&mut self) -> Result<Option<Token>, LexError> {
        self.skip_trivia()?;
        let start = self.pos;
        let Some(c) = self.bump() else {
            return Ok(None);
        };
        if let Some(tok) = Token::punct(c) {
            return Ok(Some(tok));
        }

        let tok = match c {
            '"' => self.string()?,
            '-' if self.peek().is_some_and(|d| d.is_ascii_digit()) => self.number(start)?,
            d if d.is_ascii_digit() => self.number(start)?,
            c if is_ident_start(c) => {
                self.take_while(is_ident_part);
                Token::Ident(self.src[start..self.pos].to_string())
            }
            ch => {
                return Err(LexError::UnexpectedChar {
                    ch,
                    line: self.line,
                });
            }
        };
        Ok(Some(tok))
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.token().transpose();
        self.done = !matches!(item, Some(Ok(_)));
        item
    }
}
