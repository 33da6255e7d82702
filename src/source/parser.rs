use std::collections::BTreeMap;

use super::lexer::{LexError, Lexer, Token};
use super::model::*;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Lex error: {0}")]
    Lex(#[from] LexError),
    #[error("Unexpected token: {0:?}, expected {1}")]
    Unexpected(Token, &'static str),
}

/// Classes declared by one manifest file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    pub package: Option<String>,
    pub classes: Vec<ClassInfo>,
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    package: Option<String>,
}

impl Parser {
    pub fn new(input: &str) -> Result<Self, ParseError> {
        let tokens = Lexer::new(input).tokenize()?;
        Ok(Self {
            tokens,
            pos: 0,
            package: None,
        })
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens.get(self.pos + offset).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> &Token {
        let tok = self.tokens.get(self.pos).unwrap_or(&Token::Eof);
        self.pos += 1;
        tok
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        match self.advance().clone() {
            Token::Ident(s) => Ok(s),
            tok => Err(ParseError::Unexpected(tok, "identifier")),
        }
    }

    fn expect(&mut self, expected: Token, what: &'static str) -> Result<(), ParseError> {
        let tok = self.advance().clone();
        if tok == expected {
            Ok(())
        } else {
            Err(ParseError::Unexpected(tok, what))
        }
    }

    fn check_ident(&self, name: &str) -> bool {
        matches!(self.peek(), Token::Ident(s) if s == name)
    }

    fn skip_semicolons(&mut self) {
        while *self.peek() == Token::Semicolon {
            self.advance();
        }
    }

    pub fn parse(&mut self) -> Result<Manifest, ParseError> {
        if self.check_ident("package") {
            self.advance();
            self.package = Some(self.parse_qualified_name()?);
            self.skip_semicolons();
        }

        let mut classes = Vec::new();
        while *self.peek() != Token::Eof {
            classes.push(self.parse_declaration()?);
            self.skip_semicolons();
        }

        Ok(Manifest {
            package: self.package.clone(),
            classes,
        })
    }

    fn qualify(&self, simple: &str) -> String {
        match &self.package {
            Some(pkg) if !pkg.is_empty() => format!("{}.{}", pkg, simple),
            _ => simple.to_string(),
        }
    }

    fn parse_declaration(&mut self) -> Result<ClassInfo, ParseError> {
        let annotations = self.parse_annotations()?;

        let kind = match self.advance().clone() {
            Token::Ident(k) if k == "class" => ClassKind::Class,
            Token::Ident(k) if k == "interface" => ClassKind::Interface,
            Token::Ident(k) if k == "enum" => {
                return self.parse_enum(annotations);
            }
            tok => return Err(ParseError::Unexpected(tok, "class, interface or enum")),
        };

        let simple_name = self.expect_ident()?;
        let mut supertypes = Vec::new();
        if *self.peek() == Token::Colon {
            self.advance();
            supertypes.push(self.parse_type()?);
            while *self.peek() == Token::Comma {
                self.advance();
                supertypes.push(self.parse_type()?);
            }
        }

        self.expect(Token::LBrace, "{")?;

        let mut members = Vec::new();
        let mut methods = Vec::new();
        let mut constructors = Vec::new();

        while *self.peek() != Token::RBrace {
            let member_annotations = self.parse_annotations()?;
            if self.check_ident("constructor") {
                self.advance();
                constructors.push(ConstructorInfo {
                    params: self.parse_params()?,
                });
            } else if self.check_ident("fun") {
                self.advance();
                methods.push(self.parse_method(member_annotations)?);
            } else {
                members.push(self.parse_member(member_annotations)?);
            }
            self.skip_semicolons();
        }

        self.expect(Token::RBrace, "}")?;

        Ok(ClassInfo {
            name: self.qualify(&simple_name),
            simple_name,
            kind,
            supertypes,
            annotations,
            members,
            methods,
            constructors,
        })
    }

    fn parse_enum(&mut self, annotations: Vec<Annotation>) -> Result<ClassInfo, ParseError> {
        let simple_name = self.expect_ident()?;
        self.expect(Token::LBrace, "{")?;

        let mut constants = Vec::new();
        while *self.peek() != Token::RBrace {
            constants.push(self.expect_ident()?);
            match self.peek() {
                Token::Comma | Token::Semicolon => {
                    self.advance();
                }
                Token::RBrace => {}
                tok => return Err(ParseError::Unexpected(tok.clone(), "enum constant separator")),
            }
        }
        self.expect(Token::RBrace, "}")?;

        Ok(ClassInfo {
            name: self.qualify(&simple_name),
            simple_name,
            kind: ClassKind::Enum(constants),
            supertypes: Vec::new(),
            annotations,
            members: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
        })
    }

    fn parse_member(&mut self, annotations: Vec<Annotation>) -> Result<MemberInfo, ParseError> {
        let mut getter = Some(Accessor::default());
        let mut setter = Some(Accessor::default());
        let mut public = false;

        // Modifiers are only keywords when a member name follows them.
        loop {
            let is_modifier = matches!(self.peek_at(1), Token::Ident(_));
            if is_modifier && self.check_ident("private") {
                self.advance();
                getter = None;
                setter = None;
            } else if is_modifier && self.check_ident("public") {
                self.advance();
                public = true;
            } else if is_modifier && self.check_ident("readonly") {
                self.advance();
                setter = None;
            } else {
                break;
            }
        }

        let name = self.expect_ident()?;
        self.expect(Token::Colon, ":")?;
        let ty = self.parse_type()?;

        // `get`/`set` clauses, unless they start the next member (`get: String`).
        loop {
            let next_is_member = *self.peek_at(1) == Token::Colon;
            if self.check_ident("get") && !next_is_member {
                self.advance();
                getter = Some(Accessor {
                    annotations: self.parse_annotations()?,
                });
            } else if self.check_ident("set") && !next_is_member {
                self.advance();
                setter = Some(Accessor {
                    annotations: self.parse_annotations()?,
                });
            } else {
                break;
            }
        }

        Ok(MemberInfo {
            name,
            ty,
            annotations,
            getter,
            setter,
            public,
        })
    }

    fn parse_method(&mut self, annotations: Vec<Annotation>) -> Result<MethodInfo, ParseError> {
        let name = self.expect_ident()?;
        let params = self.parse_params()?;

        let mut return_type = None;
        if *self.peek() == Token::Colon {
            self.advance();
            let ty = self.parse_type()?;
            if ty.name != "void" && ty.name != "Unit" {
                return_type = Some(ty);
            }
        }

        let body = if *self.peek() == Token::LBrace {
            Some(self.parse_block()?)
        } else {
            None
        };

        Ok(MethodInfo {
            name,
            annotations,
            params,
            return_type,
            body,
        })
    }

    fn parse_params(&mut self) -> Result<Vec<ParamInfo>, ParseError> {
        self.expect(Token::LParen, "(")?;
        let mut params = Vec::new();
        while *self.peek() != Token::RParen {
            let annotations = self.parse_annotations()?;
            let name = self.expect_ident()?;
            self.expect(Token::Colon, ":")?;
            let ty = self.parse_type()?;
            params.push(ParamInfo {
                name,
                ty,
                annotations,
            });
            if *self.peek() == Token::Comma {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(Token::RParen, ")")?;
        Ok(params)
    }

    fn parse_type(&mut self) -> Result<TypeRef, ParseError> {
        let name = self.parse_qualified_name()?;
        let mut args = Vec::new();

        if *self.peek() == Token::LAngle {
            self.advance();
            args.push(self.parse_type()?);
            while *self.peek() == Token::Comma {
                self.advance();
                args.push(self.parse_type()?);
            }
            self.expect(Token::RAngle, ">")?;
        }

        let mut array = false;
        if *self.peek() == Token::LBracket && *self.peek_at(1) == Token::RBracket {
            self.advance();
            self.advance();
            array = true;
        }

        Ok(TypeRef { name, args, array })
    }

    fn parse_qualified_name(&mut self) -> Result<String, ParseError> {
        let mut name = self.expect_ident()?;
        while *self.peek() == Token::Dot && matches!(self.peek_at(1), Token::Ident(_)) {
            self.advance();
            name.push('.');
            name.push_str(&self.expect_ident()?);
        }
        Ok(name)
    }

    fn parse_annotations(&mut self) -> Result<Vec<Annotation>, ParseError> {
        let mut annotations = Vec::new();
        while *self.peek() == Token::At {
            annotations.push(self.parse_annotation()?);
        }
        Ok(annotations)
    }

    fn parse_annotation(&mut self) -> Result<Annotation, ParseError> {
        self.expect(Token::At, "@")?;
        let name = self.parse_qualified_name()?;
        let mut values = BTreeMap::new();

        if *self.peek() == Token::LParen {
            self.advance();
            let named = matches!(self.peek(), Token::Ident(_)) && *self.peek_at(1) == Token::Eq;
            if named {
                loop {
                    let key = self.expect_ident()?;
                    self.expect(Token::Eq, "=")?;
                    values.insert(key, self.parse_annotation_value()?);
                    if *self.peek() == Token::Comma {
                        self.advance();
                    } else {
                        break;
                    }
                }
            } else if *self.peek() != Token::RParen {
                values.insert("value".to_string(), self.parse_annotation_value()?);
            }
            self.expect(Token::RParen, ")")?;
        }

        Ok(Annotation { name, values })
    }

    fn parse_annotation_value(&mut self) -> Result<AnnotationValue, ParseError> {
        match self.peek().clone() {
            Token::Str(s) => {
                self.advance();
                Ok(AnnotationValue::Str(s))
            }
            Token::Num(n) => {
                self.advance();
                Ok(AnnotationValue::Int(n))
            }
            Token::Ident(_) => Ok(AnnotationValue::Ident(self.parse_qualified_name()?)),
            Token::LBracket => {
                self.advance();
                let mut items = Vec::new();
                while *self.peek() != Token::RBracket {
                    items.push(self.parse_annotation_value()?);
                    if *self.peek() == Token::Comma {
                        self.advance();
                    } else {
                        break;
                    }
                }
                self.expect(Token::RBracket, "]")?;
                Ok(AnnotationValue::List(items))
            }
            tok => Err(ParseError::Unexpected(tok, "annotation value")),
        }
    }

    /// Parse a routine body: a sequence of fluent call chains.
    fn parse_block(&mut self) -> Result<Vec<CallChain>, ParseError> {
        self.expect(Token::LBrace, "{")?;
        let mut statements = Vec::new();

        while *self.peek() != Token::RBrace {
            let receiver = self.expect_ident()?;
            let mut calls = Vec::new();
            while *self.peek() == Token::Dot {
                self.advance();
                let method = self.expect_ident()?;
                calls.push(Call {
                    method,
                    args: self.parse_call_args()?,
                });
            }
            if calls.is_empty() {
                return Err(ParseError::Unexpected(self.peek().clone(), "method call"));
            }
            statements.push(CallChain { receiver, calls });
            self.skip_semicolons();
        }

        self.expect(Token::RBrace, "}")?;
        Ok(statements)
    }

    fn parse_call_args(&mut self) -> Result<Vec<CallArg>, ParseError> {
        self.expect(Token::LParen, "(")?;
        let mut args = Vec::new();
        while *self.peek() != Token::RParen {
            let arg = match self.peek().clone() {
                Token::Str(s) => {
                    self.advance();
                    CallArg::Str(s)
                }
                Token::Num(n) => {
                    self.advance();
                    CallArg::Int(n)
                }
                Token::Ident(_) => CallArg::Ident(self.parse_qualified_name()?),
                tok => return Err(ParseError::Unexpected(tok, "call argument")),
            };
            args.push(arg);
            if *self.peek() == Token::Comma {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(Token::RParen, ")")?;
        Ok(args)
    }
}
