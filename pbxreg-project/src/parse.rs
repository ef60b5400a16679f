//! Parsing of project documents into sections and object records.
//!
//! Only the object records between `/* Begin X section */` and
//! `/* End X section */` markers are parsed; every other line is kept as
//! opaque text so that serialization reproduces it unchanged.

use crate::{
    ObjectId, Result,
    document::{Entry, Section, Segment},
    error::SourceContext,
    record::Record,
    value::{Dict, Scalar, Value},
};

/// A parse failure with an offset relative to the text being parsed.
#[derive(Debug)]
struct Failure {
    offset: usize,
    len: usize,
    message: String,
}

impl Failure {
    fn new(offset: usize, len: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            len,
            message: message.into(),
        }
    }
}

type Parsed<T> = std::result::Result<T, Failure>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    Equals,
    Semicolon,
    Comma,
    /// `raw` holds the source token of a quoted string.
    Str { text: String, raw: Option<String> },
    Comment(String),
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::OpenBrace => "'{'".to_string(),
            Token::CloseBrace => "'}'".to_string(),
            Token::OpenParen => "'('".to_string(),
            Token::CloseParen => "')'".to_string(),
            Token::Equals => "'='".to_string(),
            Token::Semicolon => "';'".to_string(),
            Token::Comma => "','".to_string(),
            Token::Str { text, .. } => format!("'{text}'"),
            Token::Comment(_) => "a comment".to_string(),
        }
    }
}

fn is_bare_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '{' | '}' | '(' | ')' | '=' | ';' | ',' | '"')
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn skip_trivia(&mut self) {
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();
            if trimmed.starts_with("//") {
                self.pos += trimmed.find('\n').unwrap_or(trimmed.len());
            } else {
                return;
            }
        }
    }

    /// Next token and its start offset, or `None` at end of input.
    fn next_token(&mut self) -> Parsed<Option<(usize, Token)>> {
        self.skip_trivia();
        let start = self.pos;
        let rest = self.rest();
        let Some(c) = rest.chars().next() else {
            return Ok(None);
        };

        let single = match c {
            '{' => Some(Token::OpenBrace),
            '}' => Some(Token::CloseBrace),
            '(' => Some(Token::OpenParen),
            ')' => Some(Token::CloseParen),
            '=' => Some(Token::Equals),
            ';' => Some(Token::Semicolon),
            ',' => Some(Token::Comma),
            _ => None,
        };
        if let Some(token) = single {
            self.pos += 1;
            return Ok(Some((start, token)));
        }

        if let Some(body) = rest.strip_prefix("/*") {
            let end = body
                .find("*/")
                .ok_or_else(|| Failure::new(start, 2, "unterminated comment"))?;
            self.pos += 2 + end + 2;
            return Ok(Some((start, Token::Comment(body[..end].trim().to_string()))));
        }

        if c == '"' {
            let text = self.quoted_string(start)?;
            let raw = self.src[start..self.pos].to_string();
            return Ok(Some((
                start,
                Token::Str {
                    text,
                    raw: Some(raw),
                },
            )));
        }

        let mut len = 0;
        for (i, ch) in rest.char_indices() {
            if !is_bare_char(ch) || rest[i..].starts_with("/*") || rest[i..].starts_with("//") {
                break;
            }
            len = i + ch.len_utf8();
        }
        if len == 0 {
            return Err(Failure::new(start, 1, format!("unexpected character '{c}'")));
        }
        self.pos += len;
        Ok(Some((
            start,
            Token::Str {
                text: rest[..len].to_string(),
                raw: None,
            },
        )))
    }

    fn quoted_string(&mut self, start: usize) -> Parsed<String> {
        let mut text = String::new();
        let mut chars = self.rest().char_indices().skip(1);
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    self.pos += i + 1;
                    return Ok(text);
                }
                '\\' => match chars.next() {
                    Some((_, 'n')) => text.push('\n'),
                    Some((_, 't')) => text.push('\t'),
                    Some((_, '"')) => text.push('"'),
                    Some((_, '\\')) => text.push('\\'),
                    Some((_, other)) => {
                        text.push('\\');
                        text.push(other);
                    }
                    None => break,
                },
                c => text.push(c),
            }
        }
        Err(Failure::new(start, 1, "unterminated string"))
    }
}

/// Recursive-descent parser for a single object record.
struct RecordParser<'a> {
    lexer: Lexer<'a>,
    peeked: Option<(usize, Token)>,
}

impl<'a> RecordParser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            lexer: Lexer::new(src),
            peeked: None,
        }
    }

    fn end_offset(&self) -> usize {
        self.lexer.src.len()
    }

    fn peek_raw(&mut self) -> Parsed<Option<&(usize, Token)>> {
        if self.peeked.is_none() {
            self.peeked = self.lexer.next_token()?;
        }
        Ok(self.peeked.as_ref())
    }

    fn next_raw(&mut self) -> Parsed<Option<(usize, Token)>> {
        match self.peeked.take() {
            Some(token) => Ok(Some(token)),
            None => self.lexer.next_token(),
        }
    }

    /// Next token that is not a comment.
    fn next(&mut self) -> Parsed<(usize, Token)> {
        loop {
            match self.next_raw()? {
                Some((_, Token::Comment(_))) => continue,
                Some(token) => return Ok(token),
                None => {
                    return Err(Failure::new(self.end_offset(), 0, "unexpected end of record"));
                }
            }
        }
    }

    fn peek(&mut self) -> Parsed<Option<Token>> {
        loop {
            let token = self.peek_raw()?.map(|(_, token)| token.clone());
            match token {
                Some(Token::Comment(_)) => self.peeked = None,
                other => return Ok(other),
            }
        }
    }

    fn expect(&mut self, expected: Token) -> Parsed<usize> {
        let (offset, token) = self.next()?;
        if token == expected {
            Ok(offset)
        } else {
            Err(Failure::new(
                offset,
                1,
                format!("expected {}, found {}", expected.describe(), token.describe()),
            ))
        }
    }

    /// Comment immediately following the previous token, if any.
    fn trailing_comment(&mut self) -> Parsed<Option<String>> {
        if !matches!(self.peek_raw()?, Some((_, Token::Comment(_)))) {
            return Ok(None);
        }
        match self.next_raw()? {
            Some((_, Token::Comment(text))) => Ok(Some(text)),
            _ => Ok(None),
        }
    }

    fn record(mut self) -> Parsed<(ObjectId, Option<String>, Dict)> {
        let (offset, token) = self.next()?;
        let id = match token {
            Token::Str { text, raw: None } => ObjectId::new(text),
            _ => None,
        }
        .ok_or_else(|| Failure::new(offset, 1, "expected an object id"))?;

        let comment = self.trailing_comment()?;
        self.expect(Token::Equals)?;
        self.expect(Token::OpenBrace)?;
        let body = self.dict_body()?;
        self.expect(Token::Semicolon)?;

        if let Some((offset, token)) = self.next_raw()? {
            if !matches!(token, Token::Comment(_)) {
                return Err(Failure::new(
                    offset,
                    1,
                    format!("unexpected {} after record", token.describe()),
                ));
            }
        }
        Ok((id, comment, body))
    }

    fn value(&mut self) -> Parsed<Value> {
        let (offset, token) = self.next()?;
        match token {
            Token::Str { text, raw } => {
                let mut scalar = Scalar::parsed(text, raw);
                scalar.comment = self.trailing_comment()?;
                Ok(Value::String(scalar))
            }
            Token::OpenBrace => Ok(Value::Dict(self.dict_body()?)),
            Token::OpenParen => Ok(Value::Array(self.array_body()?)),
            other => Err(Failure::new(
                offset,
                1,
                format!("expected a value, found {}", other.describe()),
            )),
        }
    }

    /// Entries up to and including the closing `}`.
    fn dict_body(&mut self) -> Parsed<Dict> {
        let mut dict = Dict::new();
        loop {
            if self.peek()? == Some(Token::CloseBrace) {
                self.next()?;
                return Ok(dict);
            }
            let (offset, token) = self.next()?;
            let key = match token {
                Token::Str { text, .. } => text,
                other => {
                    return Err(Failure::new(
                        offset,
                        1,
                        format!("expected a key, found {}", other.describe()),
                    ));
                }
            };
            self.expect(Token::Equals)?;
            let value = self.value()?;
            self.expect(Token::Semicolon)?;
            dict.insert(key, value);
        }
    }

    /// Items up to and including the closing `)`.
    fn array_body(&mut self) -> Parsed<Vec<Value>> {
        let mut items = Vec::new();
        loop {
            if self.peek()? == Some(Token::CloseParen) {
                self.next()?;
                return Ok(items);
            }
            items.push(self.value()?);
            let (offset, token) = self.next()?;
            match token {
                Token::Comma => {}
                Token::CloseParen => return Ok(items),
                other => {
                    return Err(Failure::new(
                        offset,
                        1,
                        format!("expected ',' or ')', found {}", other.describe()),
                    ));
                }
            }
        }
    }
}

/// Brace balance of `text`, ignoring strings and comments. Returns the depth
/// at the end and whether any brace was opened.
fn brace_balance(text: &str) -> (i64, bool) {
    let mut depth = 0i64;
    let mut opened = false;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => {
                            chars.next();
                        }
                        '"' => break,
                        _ => {}
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = ' ';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            '{' => {
                depth += 1;
                opened = true;
            }
            '}' => depth -= 1,
            _ => {}
        }
    }
    (depth, opened)
}

fn section_marker<'l>(line: &'l str, kind: &str) -> Option<&'l str> {
    line.trim()
        .strip_prefix("/* ")?
        .strip_prefix(kind)?
        .strip_prefix(' ')?
        .strip_suffix(" section */")
}

/// Parse one record whose text starts at `base` in the document.
pub(crate) fn parse_record(ctx: &SourceContext, text: &str, base: usize) -> Result<Record> {
    let (id, comment, body) = RecordParser::new(text)
        .record()
        .map_err(|f| ctx.parse_error(f.message, (base + f.offset, f.len)))?;
    let indent = &text[..text.len() - text.trim_start().len()];
    let depth = if indent.chars().all(|c| c == '\t') {
        indent.len()
    } else {
        2
    };
    Ok(Record::parsed(id, comment, body, depth, text.to_string()))
}

/// A record being accumulated line by line.
struct Pending {
    start: usize,
    text: String,
}

/// Split a document into text segments and parsed sections.
pub(crate) fn parse_segments(ctx: &SourceContext) -> Result<Vec<Segment>> {
    let src = ctx.src();
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut section: Option<(usize, Section)> = None;
    let mut pending: Option<Pending> = None;
    let mut offset = 0;

    for line in src.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();

        let Some((open_at, current)) = section.as_mut() else {
            if let Some(name) = section_marker(line, "Begin") {
                if !text.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut text)));
                }
                section = Some((line_start, Section::new(name, line)));
            } else {
                text.push_str(line);
            }
            continue;
        };

        if let Some(mut record) = pending.take() {
            record.text.push_str(line);
            match brace_balance(&record.text) {
                (depth, _) if depth < 0 => {
                    return Err(ctx.parse_error("unbalanced '}'", (line_start, line.len())));
                }
                (0, true) if record.text.trim_end().ends_with(';') => {
                    current
                        .entries
                        .push(Entry::Record(parse_record(ctx, &record.text, record.start)?));
                }
                _ => pending = Some(record),
            }
            continue;
        }

        if let Some(name) = section_marker(line, "End") {
            if name != current.name {
                return Err(ctx.parse_error(
                    format!("expected end of {} section, found end of {name}", current.name),
                    (line_start, line.len()),
                ));
            }
            if let Some((_, mut finished)) = section.take() {
                finished.end = line.to_string();
                tracing::trace!(
                    section = %finished.name,
                    records = finished.records().count(),
                    "parsed section"
                );
                segments.push(Segment::Section(finished));
            }
            continue;
        }

        if section_marker(line, "Begin").is_some() {
            return Err(ctx.parse_error(
                format!("missing '/* End {} section */'", current.name),
                (*open_at, current.begin.len()),
            ));
        }

        let trimmed = line.trim();
        if trimmed.is_empty() || (trimmed.starts_with("/*") && trimmed.ends_with("*/")) {
            current.entries.push(Entry::Text(line.to_string()));
            continue;
        }

        if !trimmed.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ctx.parse_error(
                format!("unexpected content in {} section", current.name),
                (line_start, line.len()),
            ));
        }

        let record = Pending {
            start: line_start,
            text: line.to_string(),
        };
        match brace_balance(&record.text) {
            (0, true) if record.text.trim_end().ends_with(';') => {
                current
                    .entries
                    .push(Entry::Record(parse_record(ctx, &record.text, record.start)?));
            }
            (depth, _) if depth < 0 => {
                return Err(ctx.parse_error("unbalanced '}'", (line_start, line.len())));
            }
            _ => pending = Some(record),
        }
    }

    if let Some(record) = pending {
        return Err(ctx.parse_error(
            "record is not terminated",
            (record.start, record.text.len()),
        ));
    }
    if let Some((start, open)) = section {
        return Err(ctx.parse_error(
            format!("missing '/* End {} section */'", open.name),
            (start, open.begin.len()),
        ));
    }
    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }
    Ok(segments)
}
