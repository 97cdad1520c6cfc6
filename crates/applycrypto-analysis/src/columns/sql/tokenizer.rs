//! SQL tokenizer.
//!
//! Lexes enough SQL to find clause boundaries, identifiers and bind
//! placeholders. Literal contents and comments are discarded.

/// One SQL token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Identifier or keyword, as written.
    Word(String),
    /// `"Ident"` or `` `ident` ``, unquoted.
    Quoted(String),
    Str,
    Number,
    /// Bind placeholder. `#{x}`, `${x}` and `:x` carry `x`; positional `?`
    /// markers are numbered `?1`, `?2`, ... in order of appearance.
    Placeholder(String),
    Comma,
    LParen,
    RParen,
    Dot,
    Star,
    Semicolon,
    Op(String),
}

impl Token {
    /// Case-insensitive keyword test.
    pub fn is_word(&self, keyword: &str) -> bool {
        matches!(self, Token::Word(w) if w.eq_ignore_ascii_case(keyword))
    }

    /// Identifier text for words and quoted identifiers.
    pub fn ident(&self) -> Option<&str> {
        match self {
            Token::Word(w) | Token::Quoted(w) => Some(w),
            _ => None,
        }
    }
}

/// Tokenize a SQL string.
pub fn tokenize(sql: &str) -> Vec<Token> {
    let chars: Vec<char> = sql.chars().collect();
    let mut tokens = Vec::new();
    let mut positional = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '-' if chars.get(i + 1) == Some(&'-') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i + 1 < chars.len() && !(chars[i] == '*' && chars[i + 1] == '/') {
                    i += 1;
                }
                i += 2;
            }
            '#' | '$' if chars.get(i + 1) == Some(&'{') => {
                let start = i + 2;
                let mut end = start;
                while end < chars.len() && chars[end] != '}' {
                    end += 1;
                }
                let inner: String = chars[start..end.min(chars.len())].iter().collect();
                let name = inner.split(',').next().unwrap_or_default().trim().to_string();
                tokens.push(Token::Placeholder(name));
                i = end + 1;
            }
            '?' => {
                let mut end = i + 1;
                while end < chars.len() && chars[end].is_ascii_digit() {
                    end += 1;
                }
                if end > i + 1 {
                    let digits: String = chars[i + 1..end].iter().collect();
                    tokens.push(Token::Placeholder(format!("?{digits}")));
                } else {
                    positional += 1;
                    tokens.push(Token::Placeholder(format!("?{positional}")));
                }
                i = end;
            }
            ':' if chars.get(i + 1).is_some_and(|n| is_ident_start(*n)) && chars.get(i.wrapping_sub(1)) != Some(&':') => {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && is_ident_char(chars[end]) {
                    end += 1;
                }
                tokens.push(Token::Placeholder(chars[start..end].iter().collect()));
                i = end;
            }
            '\'' => {
                i += 1;
                while i < chars.len() {
                    if chars[i] == '\'' {
                        // '' escapes a quote
                        if chars.get(i + 1) == Some(&'\'') {
                            i += 2;
                            continue;
                        }
                        break;
                    }
                    i += 1;
                }
                i += 1;
                tokens.push(Token::Str);
            }
            '"' | '`' => {
                let close = c;
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && chars[end] != close {
                    end += 1;
                }
                tokens.push(Token::Quoted(chars[start..end.min(chars.len())].iter().collect()));
                i = end + 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '.' if !chars.get(i + 1).is_some_and(|n| n.is_ascii_digit()) => {
                tokens.push(Token::Dot);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            ';' => {
                tokens.push(Token::Semicolon);
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '.') {
                    i += 1;
                }
                tokens.push(Token::Number);
            }
            c if is_ident_start(c) => {
                let start = i;
                while i < chars.len() && is_ident_char(chars[i]) {
                    i += 1;
                }
                tokens.push(Token::Word(chars[start..i].iter().collect()));
            }
            _ => {
                let start = i;
                i += 1;
                while i < chars.len() && is_operator_char(chars[i]) && is_operator_char(chars[start]) {
                    i += 1;
                }
                tokens.push(Token::Op(chars[start..i].iter().collect()));
            }
        }
    }
    tokens
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '#'
}

fn is_operator_char(c: char) -> bool {
    matches!(c, '=' | '<' | '>' | '!' | '|' | '+' | '-' | '/' | '%' | '^' | '&' | '~')
}
