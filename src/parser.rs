use anyhow::{
    Result,
    bail,
};
use logos::Logos;
use parser_helper::{
    LookaheadLexer,
    LogosTokenStream,
    Token as TokenTrait,
    new_parser,
};
use std::{
    ops::Range,
    rc::Rc,
};
use crate::{
    ast::*,
    error::SyntaxError,
    ops::BinOp,
};

pub use StartOrEnd::*;


#[derive(Debug, Logos, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"#[^\n]*")]
pub enum Token<'a> {
    #[token("let")]
    Let,
    #[token("if")]
    If,
    #[token("then")]
    Then,
    #[token("else")]
    Else,
    #[token("lambda")]
    #[token("λ")]
    Lambda,

    #[token("true", |_|true)]
    #[token("false", |_|false)]
    Bool(bool),

    #[regex(r"[a-zA-Zλ_][a-zA-Zλ_0-9?!<>=\-]*", |l|l.slice())]
    #[token("call/cc", |l|l.slice())]
    Ident(&'a str),

    #[regex(r"[0-9]+(\.[0-9]+)?", |l|l.slice().parse::<f64>().ok())]
    Number(f64),

    #[regex(r#""([^"\\]|\\.)*""#, |l|unescape(l.slice()))]
    Str(String),

    #[regex(r"[+\-*/%=&|<>!]+", |l|l.slice())]
    Op(&'a str),

    #[token(",")]
    Comma,

    #[token(";")]
    Semi,

    #[token("(", |_|Start)]
    #[token(")", |_|End)]
    Paren(StartOrEnd),

    #[token("{", |_|Start)]
    #[token("}", |_|End)]
    Brace(StartOrEnd),

    EOF,
}
impl<'a> TokenTrait for Token<'a> {
    fn eof()->Self {Self::EOF}
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum StartOrEnd {
    Start,
    End,
}

/// Strips the quotes. A backslash makes the next character literal.
fn unescape(raw: &str)->String {
    let mut out = String::with_capacity(raw.len());
    let mut escaped = false;
    for c in raw[1..raw.len() - 1].chars() {
        if escaped {
            out.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else {
            out.push(c);
        }
    }

    return out;
}


enum Infix {
    Assign,
    Binary(BinOp),
}
impl Infix {
    fn precedence(&self)->u8 {
        match self {
            Self::Assign=>1,
            Self::Binary(op)=>op.precedence(),
        }
    }
}


new_parser!(pub struct TokenParser<'a, 2, Token<'a>, LogosTokenStream<'a, Token<'a>>>);

/// Parses on top of [`TokenParser`], counting the tokens it takes so errors can point at the
/// offending token.
pub struct Parser<'a> {
    tokens: TokenParser<'a>,
    spans: Vec<Range<usize>>,
    taken: usize,
    source: &'a str,
}
// public methods
impl<'a> Parser<'a> {
    /// Fails on the first character no token matches.
    pub fn new_from_source(source: &'a str)->Result<Parser<'a>> {
        let mut spans = Vec::new();
        for (token, span) in Token::lexer(source).spanned() {
            if token.is_err() {
                bail!(SyntaxError::at(source, span.start, "Unexpected character"));
            }
            spans.push(span);
        }

        return Ok(Parser {
            tokens: TokenParser::new(Token::lexer(source), ()),
            spans,
            taken: 0,
            source,
        });
    }

    /// The whole program: `;` separated expressions, wrapped in a `Prog`.
    pub fn parse(&mut self)->Result<Node> {
        let mut out = Vec::new();
        while self.peek() != &Token::EOF {
            out.push(self.parse_expr()?);
            if self.peek() != &Token::EOF {
                self.match_token(Token::Semi, "Expected `;`")?;
            }
        }

        return Ok(Rc::new(Expr::Prog(out.into())));
    }

    pub fn parse_expr(&mut self)->Result<Node> {
        let atom = self.parse_atom()?;
        let expr = self.maybe_binary(atom, 0)?;

        return self.maybe_call(expr);
    }

    fn parse_atom(&mut self)->Result<Node> {
        let atom = match self.peek() {
            Token::Paren(Start)=>{
                self.next();
                let expr = self.parse_expr()?;
                self.paren_end()?;
                expr
            },
            Token::Brace(Start)=>self.parse_prog()?,
            Token::If=>self.parse_if()?,
            Token::Lambda=>{
                self.next();
                self.parse_lambda()?
            },
            Token::Let=>self.parse_let()?,
            _=>self.parse_lit()?,
        };

        return self.maybe_call(atom);
    }

    fn maybe_call(&mut self, func: Node)->Result<Node> {
        if self.peek() != &Token::Paren(Start) {
            return Ok(func);
        }

        let args = self.delimited(Token::Paren(Start), Token::Paren(End), Token::Comma, Self::parse_expr)?;

        return Ok(Rc::new(Expr::Call {func, args: args.into()}));
    }

    fn maybe_binary(&mut self, left: Node, my_prec: u8)->Result<Node> {
        let Token::Op(op) = self.peek() else {return Ok(left)};
        let op = *op;

        let infix = match op {
            "="=>Infix::Assign,
            _=>match op.parse::<BinOp>() {
                Ok(op)=>Infix::Binary(op),
                Err(err)=>bail!(self.error(err.to_string())),
            },
        };

        let his_prec = infix.precedence();
        if his_prec <= my_prec {
            return Ok(left);
        }
        self.next();

        let atom = self.parse_atom()?;
        let right = self.maybe_binary(atom, his_prec)?;
        let expr = match infix {
            Infix::Assign=>Expr::Assign {target: left, value: right},
            Infix::Binary(op)=>Expr::Binary {op, left, right},
        };

        return self.maybe_binary(Rc::new(expr), my_prec);
    }

    fn parse_prog(&mut self)->Result<Node> {
        let mut prog = self.delimited(Token::Brace(Start), Token::Brace(End), Token::Semi, Self::parse_expr)?;

        return Ok(match prog.len() {
            0=>Rc::new(Expr::Bool(false)),
            1=>prog.remove(0),
            _=>Rc::new(Expr::Prog(prog.into())),
        });
    }

    fn parse_if(&mut self)->Result<Node> {
        self.match_token(Token::If, "Expected `if`")?;

        let cond = self.parse_expr()?;
        if self.peek() != &Token::Brace(Start) {
            self.match_token(Token::Then, "Expected `then`")?;
        }
        let then = self.parse_expr()?;

        let mut otherwise = None;
        if self.try_match_token(Token::Else) {
            otherwise = Some(self.parse_expr()?);
        }

        return Ok(Rc::new(Expr::If {cond, then, otherwise}));
    }

    /// Everything after `λ`: an optional name, the parameter list and the body.
    fn parse_lambda(&mut self)->Result<Node> {
        let name = match self.peek() {
            Token::Ident(_)=>Some(self.ident()?),
            _=>None,
        };
        let params = self.delimited(Token::Paren(Start), Token::Paren(End), Token::Comma, Self::ident)?;
        let body = self.parse_expr()?;

        return Ok(Rc::new(Expr::Lambda(Rc::new(Lambda {name, params, body}))));
    }

    /// `let (a = 1, b = a) body`, or the named form `let loop (n = 10) body`, which becomes a call
    /// of a named lambda taking the bindings as parameters.
    fn parse_let(&mut self)->Result<Node> {
        self.match_token(Token::Let, "Expected `let`")?;

        if let Token::Ident(_) = self.peek() {
            let name = self.ident()?;
            let defs = self.delimited(Token::Paren(Start), Token::Paren(End), Token::Comma, Self::parse_vardef)?;
            let body = self.parse_expr()?;

            let mut params = Vec::with_capacity(defs.len());
            let mut args = Vec::with_capacity(defs.len());
            for VarDef{name,init} in defs {
                params.push(name);
                args.push(init.unwrap_or_else(||Rc::new(Expr::Bool(false))));
            }
            let func = Rc::new(Expr::Lambda(Rc::new(Lambda {
                name: Some(name),
                params,
                body,
            })));

            return Ok(Rc::new(Expr::Call {func, args: args.into()}));
        }

        let vars = self.delimited(Token::Paren(Start), Token::Paren(End), Token::Comma, Self::parse_vardef)?;
        let body = self.parse_expr()?;

        return Ok(Rc::new(Expr::Let {vars: vars.into(), body}));
    }

    /// `name = expr`, or a bare `name`, which binds `false`.
    fn parse_vardef(&mut self)->Result<VarDef> {
        let name = self.ident()?;
        let mut init = None;
        if self.try_match_token(Token::Op("=")) {
            init = Some(self.parse_expr()?);
        }

        return Ok(VarDef {name, init});
    }

    /// `start item (sep item)* sep? stop`
    fn delimited<T>(&mut self, start: Token<'a>, stop: Token<'a>, sep: Token<'a>, mut item: impl FnMut(&mut Self)->Result<T>)->Result<Vec<T>> {
        self.match_token(start, "Expected opening delimiter")?;

        let mut out = Vec::new();
        let mut first = true;
        while self.peek() != &Token::EOF {
            if self.peek() == &stop {
                break;
            }
            if first {
                first = false;
            } else {
                let msg = format!("Expected {sep:?}");
                self.match_token(sep.clone(), msg)?;
            }
            if self.peek() == &stop {
                break;
            }
            out.push(item(self)?);
        }
        match stop {
            Token::Brace(End)=>self.match_token(stop, "Expected `}`")?,
            _=>self.match_token(stop, "Expected `)`")?,
        }

        return Ok(out);
    }

    fn parse_lit(&mut self)->Result<Node> {
        let at = self.taken;
        let expr = match self.next() {
            Token::Bool(b)=>Expr::Bool(b),
            Token::Number(n)=>Expr::Number(n),
            Token::Str(s)=>Expr::String(s.into()),
            Token::Ident(name)=>Expr::Var(name.into()),
            t=>bail!(self.error_at(at, format!("Unexpected token: {t:?}"))),
        };

        return Ok(Rc::new(expr));
    }
}
// private helpers
#[allow(unused)]
impl<'a> Parser<'a> {
    #[inline]
    fn match_token<M: Into<String>>(&mut self, tok: Token<'a>, msg: M)->Result<()> {
        if self.peek() != &tok {
            bail!(self.error(msg));
        }
        self.next();

        return Ok(());
    }

    #[inline]
    fn try_match_token(&mut self, tok: Token<'a>)->bool {
        if self.peek() == &tok {
            self.next();
            return true;
        }

        return false;
    }

    #[inline]
    fn peek(&mut self)->&Token<'a> {
        self.tokens.lookahead(0)
    }

    #[inline]
    fn next(&mut self)->Token<'a> {
        self.taken += 1;
        self.tokens.take_token()
    }

    /// An error at the next token.
    #[inline]
    fn error(&self, msg: impl Into<String>)->SyntaxError {
        self.error_at(self.taken, msg)
    }

    /// An error at the `index`th token, or at the end of the source past the last one.
    fn error_at(&self, index: usize, msg: impl Into<String>)->SyntaxError {
        let offset = self.spans.get(index).map_or(self.source.len(), |span|span.start);
        SyntaxError::at(self.source, offset, msg)
    }

    fn ident(&mut self)->Result<Rc<str>> {
        let at = self.taken;
        match self.next() {
            Token::Ident(s)=>Ok(s.into()),
            _=>bail!(self.error_at(at, "Expected variable name")),
        }
    }

    fn paren_end(&mut self)->Result<()> {
        let at = self.taken;
        match self.next() {
            Token::Paren(End)=>Ok(()),
            _=>bail!(self.error_at(at, "Expected `)`")),
        }
    }
}


/// Lexes and parses a whole program.
pub fn parse(source: &str)->Result<Node> {
    Parser::new_from_source(source)?.parse()
}
