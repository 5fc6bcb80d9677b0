//! Query text to command conversion
//!
//! A hand-written tokenizer and recursive-descent parser for the engine's
//! query language. Keywords are case-insensitive, identifiers are
//! case-sensitive, and qualified `table.col` references are accepted
//! everywhere a column may appear. The parser is a pure function from text
//! to [`Command`]; it reads no external state.

use crate::error::{EngineError, Result};
use crate::parser::command::{
    ColumnDef, ColumnRef, Command, CreateTable, Delete, DropTable, Insert, Join, Predicate,
    Select, Update,
};
use crate::value::{ColumnType, Value};
use std::fmt;
use std::str::FromStr;


/// Parse a single statement into a [`Command`].
///
/// An optional trailing semicolon is accepted; anything else left over
/// after the statement is a parse error.
pub fn parse_statement(text: &str) -> Result<Command> {
    let tokens = tokenize(text)?;
    let mut parser = Parser { tokens, pos: 0 };

    let command = if parser.eat_keyword("CREATE") {
        parser.parse_create_table()?
    } else if parser.eat_keyword("DROP") {
        parser.parse_drop_table()?
    } else if parser.eat_keyword("INSERT") {
        parser.parse_insert()?
    } else if parser.eat_keyword("SELECT") {
        parser.parse_select()?
    } else if parser.eat_keyword("UPDATE") {
        parser.parse_update()?
    } else if parser.eat_keyword("DELETE") {
        parser.parse_delete()?
    } else {
        return Err(parse_error(format!(
            "expected CREATE, DROP, INSERT, SELECT, UPDATE or DELETE{}",
            parser
                .peek()
                .map(|t| format!(", got `{t}`"))
                .unwrap_or_default()
        )));
    };

    parser.eat_token(&Token::Semicolon);
    parser.expect_end()?;
    Ok(command)
}

fn parse_error(message: impl Into<String>) -> EngineError {
    EngineError::Parse(message.into())
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Int(i64),
    Real(f64),
    Str(String),
    LParen,
    RParen,
    Comma,
    Dot,
    Eq,
    Star,
    Semicolon,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(s) => write!(f, "{s}"),
            Token::Int(i) => write!(f, "{i}"),
            Token::Real(r) => write!(f, "{r}"),
            Token::Str(s) => write!(f, "'{s}'"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Dot => write!(f, "."),
            Token::Eq => write!(f, "="),
            Token::Star => write!(f, "*"),
            Token::Semicolon => write!(f, ";"),
        }
    }
}

fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '.' => {
                chars.next();
                tokens.push(Token::Dot);
            }
            '=' => {
                chars.next();
                tokens.push(Token::Eq);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            ';' => {
                chars.next();
                tokens.push(Token::Semicolon);
            }
            '\'' => {
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(ch) => s.push(ch),
                        None => return Err(parse_error("unterminated string literal")),
                    }
                }
                tokens.push(Token::Str(s));
            }
            c if c.is_ascii_digit() || c == '-' => {
                tokens.push(lex_number(&mut chars)?);
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut s = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_ascii_alphanumeric() || ch == '_' {
                        s.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(s));
            }
            other => {
                return Err(parse_error(format!("unexpected character `{other}`")));
            }
        }
    }

    Ok(tokens)
}

/// Lex a numeric literal. A literal with a `.` or an exponent is a Real,
/// everything else is an Integer.
fn lex_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Result<Token> {
    let mut s = String::new();
    let mut is_real = false;

    if chars.peek() == Some(&'-') {
        s.push('-');
        chars.next();
    }
    if !chars.peek().is_some_and(|c| c.is_ascii_digit()) {
        return Err(parse_error("expected digits after `-`"));
    }
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            s.push(c);
            chars.next();
        } else {
            break;
        }
    }
    if chars.peek() == Some(&'.') {
        is_real = true;
        s.push('.');
        chars.next();
        while let Some(&c) = chars.peek() {
            if c.is_ascii_digit() {
                s.push(c);
                chars.next();
            } else {
                break;
            }
        }
    }
    if matches!(chars.peek(), Some(&'e') | Some(&'E')) {
        is_real = true;
        s.push('e');
        chars.next();
        if matches!(chars.peek(), Some(&'+') | Some(&'-')) {
            if let Some(sign) = chars.next() {
                s.push(sign);
            }
        }
        if !chars.peek().is_some_and(|c| c.is_ascii_digit()) {
            return Err(parse_error(format!("malformed number literal `{s}`")));
        }
        while let Some(&c) = chars.peek() {
            if c.is_ascii_digit() {
                s.push(c);
                chars.next();
            } else {
                break;
            }
        }
    }

    if is_real {
        let value = s
            .parse::<f64>()
            .map_err(|_| parse_error(format!("malformed number literal `{s}`")))?;
        Ok(Token::Real(value))
    } else {
        let value = s
            .parse::<i64>()
            .map_err(|_| parse_error(format!("integer literal out of range `{s}`")))?;
        Ok(Token::Int(value))
    }
}

// ---------------------------------------------------------------------------
// Recursive descent
// ---------------------------------------------------------------------------

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Consume the next token if it is an identifier matching `kw`
    /// case-insensitively.
    fn eat_keyword(&mut self, kw: &str) -> bool {
        if let Some(Token::Ident(s)) = self.peek()
            && s.eq_ignore_ascii_case(kw)
        {
            self.pos += 1;
            return true;
        }
        false
    }

    fn expect_keyword(&mut self, kw: &str) -> Result<()> {
        if self.eat_keyword(kw) {
            Ok(())
        } else {
            Err(parse_error(format!(
                "expected {kw}{}",
                self.peek()
                    .map(|t| format!(", got `{t}`"))
                    .unwrap_or_else(|| ", got end of input".to_string())
            )))
        }
    }

    fn eat_token(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            return true;
        }
        false
    }

    fn expect_token(&mut self, token: &Token, what: &str) -> Result<()> {
        if self.eat_token(token) {
            Ok(())
        } else {
            Err(parse_error(format!(
                "expected {what}{}",
                self.peek()
                    .map(|t| format!(", got `{t}`"))
                    .unwrap_or_else(|| ", got end of input".to_string())
            )))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<String> {
        // Errors abort the parse, so consuming the offending token is fine.
        match self.advance() {
            Some(Token::Ident(s)) => Ok(s),
            Some(other) => Err(parse_error(format!("expected {what}, got `{other}`"))),
            None => Err(parse_error(format!("expected {what}, got end of input"))),
        }
    }

    fn expect_end(&self) -> Result<()> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(parse_error(format!("unexpected trailing input `{token}`"))),
        }
    }

    /// `ident` or `ident.ident`.
    fn parse_column_ref(&mut self) -> Result<ColumnRef> {
        let first = self.expect_ident("column name")?;
        if self.eat_token(&Token::Dot) {
            let name = self.expect_ident("column name")?;
            Ok(ColumnRef::qualified(first, name))
        } else {
            Ok(ColumnRef::bare(first))
        }
    }

    /// Literal with type inference: integer, real, quoted text,
    /// case-insensitive `true`/`false`/`null`.
    fn parse_literal(&mut self) -> Result<Value> {
        match self.advance() {
            Some(Token::Int(i)) => Ok(Value::Integer(i)),
            Some(Token::Real(r)) => Ok(Value::Real(r)),
            Some(Token::Str(s)) => Ok(Value::Text(s)),
            Some(Token::Ident(s)) if s.eq_ignore_ascii_case("true") => Ok(Value::Boolean(true)),
            Some(Token::Ident(s)) if s.eq_ignore_ascii_case("false") => Ok(Value::Boolean(false)),
            Some(Token::Ident(s)) if s.eq_ignore_ascii_case("null") => Ok(Value::Null),
            Some(other) => Err(parse_error(format!("expected a literal, got `{other}`"))),
            None => Err(parse_error("expected a literal, got end of input")),
        }
    }

    /// Optional `WHERE colref = literal [AND colref = literal]*`.
    /// A missing WHERE clause yields an empty conjunction (match-all).
    fn parse_where(&mut self) -> Result<Vec<Predicate>> {
        let mut filter = Vec::new();
        if !self.eat_keyword("WHERE") {
            return Ok(filter);
        }
        loop {
            let column = self.parse_column_ref()?;
            self.expect_token(&Token::Eq, "`=`")?;
            let value = self.parse_literal()?;
            filter.push(Predicate { column, value });
            if !self.eat_keyword("AND") {
                break;
            }
        }
        Ok(filter)
    }

    // -- statements ---------------------------------------------------------

    fn parse_create_table(&mut self) -> Result<Command> {
        self.expect_keyword("TABLE")?;
        let name = self.expect_ident("table name")?;
        self.expect_token(&Token::LParen, "`(`")?;

        let mut columns = Vec::new();
        let mut primary_key: Option<String> = None;
        let mut unique_columns = Vec::new();

        loop {
            let col_name = self.expect_ident("column name")?;
            let type_name = self.expect_ident("column type")?;
            let column_type = ColumnType::from_str(&type_name)
                .map_err(|_| parse_error(format!("unknown column type `{type_name}`")))?;

            loop {
                if self.eat_keyword("PRIMARY") {
                    self.expect_keyword("KEY")?;
                    if primary_key.is_some() {
                        return Err(parse_error("multiple PRIMARY KEY columns"));
                    }
                    primary_key = Some(col_name.clone());
                } else if self.eat_keyword("UNIQUE") {
                    unique_columns.push(col_name.clone());
                } else {
                    break;
                }
            }

            columns.push(ColumnDef {
                name: col_name,
                column_type,
            });

            if self.eat_token(&Token::Comma) {
                continue;
            }
            self.expect_token(&Token::RParen, "`,` or `)`")?;
            break;
        }

        Ok(Command::CreateTable(CreateTable {
            name,
            columns,
            primary_key,
            unique_columns,
        }))
    }

    fn parse_drop_table(&mut self) -> Result<Command> {
        self.expect_keyword("TABLE")?;
        let name = self.expect_ident("table name")?;
        Ok(Command::DropTable(DropTable { name }))
    }

    fn parse_insert(&mut self) -> Result<Command> {
        self.expect_keyword("INTO")?;
        let table = self.expect_ident("table name")?;
        self.expect_keyword("VALUES")?;
        self.expect_token(&Token::LParen, "`(`")?;

        let mut values = vec![self.parse_literal()?];
        while self.eat_token(&Token::Comma) {
            values.push(self.parse_literal()?);
        }
        self.expect_token(&Token::RParen, "`,` or `)`")?;

        Ok(Command::Insert(Insert { table, values }))
    }

    fn parse_select(&mut self) -> Result<Command> {
        let projection = if self.eat_token(&Token::Star) {
            None
        } else {
            let mut columns = vec![self.parse_column_ref()?];
            while self.eat_token(&Token::Comma) {
                columns.push(self.parse_column_ref()?);
            }
            Some(columns)
        };

        self.expect_keyword("FROM")?;
        let table = self.expect_ident("table name")?;

        let join = if self.eat_keyword("JOIN") {
            let join_table = self.expect_ident("table name")?;
            self.expect_keyword("ON")?;
            let on_first = self.parse_column_ref()?;
            self.expect_token(&Token::Eq, "`=`")?;
            let on_second = self.parse_column_ref()?;
            Some(Join {
                table: join_table,
                on_first,
                on_second,
            })
        } else {
            None
        };

        let filter = self.parse_where()?;

        Ok(Command::Select(Select {
            table,
            projection,
            join,
            filter,
        }))
    }

    fn parse_update(&mut self) -> Result<Command> {
        let table = self.expect_ident("table name")?;
        self.expect_keyword("SET")?;

        let mut assignments = Vec::new();
        loop {
            let column = self.expect_ident("column name")?;
            self.expect_token(&Token::Eq, "`=`")?;
            let value = self.parse_literal()?;
            assignments.push((column, value));
            if !self.eat_token(&Token::Comma) {
                break;
            }
        }

        let filter = self.parse_where()?;

        Ok(Command::Update(Update {
            table,
            assignments,
            filter,
        }))
    }

    fn parse_delete(&mut self) -> Result<Command> {
        self.expect_keyword("FROM")?;
        let table = self.expect_ident("table name")?;
        let filter = self.parse_where()?;
        Ok(Command::Delete(Delete { table, filter }))
    }
}
