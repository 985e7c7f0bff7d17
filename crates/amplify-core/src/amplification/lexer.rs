// Copyright 2024 Helix Platform
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Tokenizer over statement and suite text.
//!
//! Structural parsing (bracket balance, declaration lookup, comment removal)
//! and numeric-literal discovery all run over this token stream, so brackets,
//! comment markers and digits inside string literals are never misread.

use super::Number;
use std::ops::Range;

/// Kind of a lexed token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword, including digit runs glued to letters (`0x1f`, `10n`)
    Identifier,
    /// Integer or decimal literal, optionally carrying a unary minus
    Number,
    /// Quoted string, quotes included
    Str,
    /// Any other single character
    Punct(char),
    /// `//` line comment or `/* */` block comment
    Comment,
}

/// A token and its byte span in the lexed text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

impl Token {
    /// Source text of this token
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.clone()]
    }

    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct(c)
    }

    pub fn is_identifier(&self, source: &str, name: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text(source) == name
    }
}

/// A numeric literal discovered in a piece of text
#[derive(Debug, Clone, PartialEq)]
pub struct NumericLiteral {
    /// Span of the literal text (inside the quotes for quoted literals)
    pub span: Range<usize>,
    pub value: Number,
    /// Whether the literal was unwrapped from a numeric string such as `"100"`
    pub quoted: bool,
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// A `-` may start a number only where an operand is expected.
fn operand_expected(previous: Option<&Token>) -> bool {
    match previous.map(|t| t.kind) {
        None => true,
        Some(TokenKind::Punct(c)) => !matches!(c, ')' | ']' | '}'),
        Some(_) => false,
    }
}

/// Split `text` into tokens. Whitespace is dropped; every other byte belongs
/// to exactly one token.
pub fn lex(text: &str) -> Vec<Token> {
    let bytes = text.as_bytes();
    let mut tokens: Vec<Token> = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        let start = i;

        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        let kind = if c == '/' && bytes.get(i + 1) == Some(&b'/') && !(i > 0 && bytes[i - 1] == b':') {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            TokenKind::Comment
        } else if c == '/' && bytes.get(i + 1) == Some(&b'*') {
            i += 2;
            while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                i += 1;
            }
            i = (i + 2).min(bytes.len());
            TokenKind::Comment
        } else if c == '"' || c == '\'' || c == '`' {
            i += 1;
            while i < bytes.len() && bytes[i] != c as u8 {
                if bytes[i] == b'\\' {
                    i += 1;
                }
                i += 1;
            }
            i = (i + 1).min(bytes.len());
            TokenKind::Str
        } else if c.is_ascii_digit()
            || (c == '-'
                && bytes.get(i + 1).map_or(false, |b| b.is_ascii_digit())
                && operand_expected(tokens.iter().rev().find(|t| t.kind != TokenKind::Comment)))
        {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if bytes.get(i) == Some(&b'.') && bytes.get(i + 1).map_or(false, |b| b.is_ascii_digit()) {
                i += 1;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
            }
            if i < bytes.len() && is_ident_continue(bytes[i] as char) {
                while i < bytes.len() && is_ident_continue(bytes[i] as char) {
                    i += 1;
                }
                TokenKind::Identifier
            } else {
                TokenKind::Number
            }
        } else if is_ident_start(c) {
            while i < bytes.len() && is_ident_continue(bytes[i] as char) {
                i += 1;
            }
            TokenKind::Identifier
        } else {
            // Advance over the whole UTF-8 sequence so spans stay on char boundaries.
            let ch = text[i..].chars().next().unwrap_or(c);
            i += ch.len_utf8();
            TokenKind::Punct(ch)
        };

        tokens.push(Token { kind, span: start..i });
    }

    tokens
}

/// Tokens without comments
pub fn significant_tokens(text: &str) -> Vec<Token> {
    lex(text)
        .into_iter()
        .filter(|t| t.kind != TokenKind::Comment)
        .collect()
}

/// Parse a numeric literal body such as `100`, `-3` or `0.25`.
fn parse_literal(text: &str) -> Option<Number> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let mut parts = digits.splitn(2, '.');
    let whole = parts.next()?;
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if let Some(fraction) = parts.next() {
        if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
    }
    Number::parse(text)
}

/// Every numeric literal in `text`, in source order.
///
/// Bare numbers count, and so do strings whose entire content is a number
/// (`"100"` in `ethers.parseEther("100")`). Strings with any other content
/// contribute nothing.
pub fn numeric_literals(text: &str) -> Vec<NumericLiteral> {
    let mut literals = Vec::new();

    for token in lex(text) {
        match token.kind {
            TokenKind::Number => {
                if let Some(value) = parse_literal(token.text(text)) {
                    literals.push(NumericLiteral {
                        span: token.span.clone(),
                        value,
                        quoted: false,
                    });
                }
            }
            TokenKind::Str if token.span.len() >= 2 => {
                let inner = token.span.start + 1..token.span.end - 1;
                if let Some(value) = parse_literal(&text[inner.clone()]) {
                    literals.push(NumericLiteral {
                        span: inner,
                        value,
                        quoted: true,
                    });
                }
            }
            _ => {}
        }
    }

    literals
}

/// Integer literals only
pub fn integer_literals(text: &str) -> Vec<NumericLiteral> {
    numeric_literals(text)
        .into_iter()
        .filter(|l| l.value.is_integer_literal())
        .collect()
}

/// Replace the given literals (which must come from `text`, in order) with
/// the replacement strings, pairwise.
pub fn replace_literals(text: &str, literals: &[NumericLiteral], replacements: &[String]) -> String {
    let mut result = String::with_capacity(text.len());
    let mut cursor = 0;

    for (literal, replacement) in literals.iter().zip(replacements) {
        result.push_str(&text[cursor..literal.span.start]);
        result.push_str(replacement);
        cursor = literal.span.end;
    }
    result.push_str(&text[cursor..]);
    result
}

/// Replace the first numeric literal of `text`. Returns `None` when the text
/// has no literal.
pub fn replace_first_literal(text: &str, value: &Number) -> Option<String> {
    let first = numeric_literals(text).into_iter().next()?;
    Some(replace_literals(text, &[first], &[value.to_string()]))
}

/// Whether `(`, `[` and `{` are closed in order outside strings and comments.
pub fn brackets_balanced(text: &str) -> bool {
    let mut stack = Vec::new();

    for token in lex(text) {
        match token.kind {
            TokenKind::Punct(open @ ('(' | '[' | '{')) => stack.push(open),
            TokenKind::Punct(close @ (')' | ']' | '}')) => {
                let expected = match close {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if stack.pop() != Some(expected) {
                    return false;
                }
            }
            _ => {}
        }
    }

    stack.is_empty()
}

/// Blank out every comment of `text`. Line breaks inside block comments are
/// kept, so line structure survives. A `//` directly after `:` is not a
/// comment, so URL-like text (`scheme://host`) is left alone.
pub fn strip_comments(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut cursor = 0;

    for token in lex(text).into_iter().filter(|t| t.kind == TokenKind::Comment) {
        result.push_str(&text[cursor..token.span.start]);
        result.extend(token.text(text).chars().filter(|&c| c == '\n'));
        cursor = token.span.end;
    }
    result.push_str(&text[cursor..]);
    result
}

/// Whether `name` appears as a standalone identifier.
pub fn contains_identifier(text: &str, name: &str) -> bool {
    lex(text).iter().any(|t| t.is_identifier(text, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(text: &str) -> Vec<String> {
        numeric_literals(text).iter().map(|l| l.value.to_string()).collect()
    }

    #[test]
    fn test_lex_kinds() {
        let text = r#"await token.mint(addr1, 100); // note"#;
        let kinds: Vec<TokenKind> = lex(text).iter().map(|t| t.kind).collect();
        assert_eq!(kinds[0], TokenKind::Identifier);
        assert!(kinds.contains(&TokenKind::Number));
        assert_eq!(*kinds.last().unwrap(), TokenKind::Comment);
    }

    #[test]
    fn test_identifier_digits_are_not_literals() {
        assert!(values("addr1.address").is_empty());
        assert!(values("x = 0x1f + 10n").is_empty());
    }

    #[test]
    fn test_quoted_numeric_string_unwrapped() {
        let text = r#"ethers.parseEther("100")"#;
        let literals = numeric_literals(text);
        assert_eq!(literals.len(), 1);
        assert!(literals[0].quoted);
        assert_eq!(&text[literals[0].span.clone()], "100");
    }

    #[test]
    fn test_non_numeric_strings_ignored() {
        assert!(values(r#"it("test 1", url = "http://host:8545/1")"#).is_empty());
    }

    #[test]
    fn test_decimal_and_negative() {
        assert_eq!(values("f(1.5, -3)"), vec!["1.5", "-3"]);
        // binary minus stays an operator
        assert_eq!(values("a - 3"), vec!["3"]);
        assert_eq!(values(r#"parseEther("-37")"#), vec!["-37"]);
    }

    #[test]
    fn test_replace_first_literal() {
        let text = r#"mint(addr1, ethers.parseEther("100"), 5)"#;
        let replaced = replace_first_literal(text, &Number::Int(0)).unwrap();
        assert_eq!(replaced, r#"mint(addr1, ethers.parseEther("0"), 5)"#);
        assert!(replace_first_literal("foo()", &Number::Int(1)).is_none());
    }

    #[test]
    fn test_brackets_balanced() {
        assert!(brackets_balanced("f(a, [1, 2], { b: 3 })"));
        assert!(!brackets_balanced("f(a, [1, 2]"));
        assert!(!brackets_balanced("f(]"));
        assert!(brackets_balanced(r#"f(")")"#));
    }

    #[test]
    fn test_strip_comments() {
        assert_eq!(strip_comments("a = 1; // one").trim_end(), "a = 1;");
        assert_eq!(strip_comments(r#"u = "http://x";"#), r#"u = "http://x";"#);
        assert_eq!(strip_comments("fetch(http://x)"), "fetch(http://x)");
        assert_eq!(strip_comments("// only"), "");
        assert_eq!(strip_comments("a(1);\n/*\n * b(2)\n */\nc(3);"), "a(1);\n\n\n\nc(3);");
        assert_eq!(strip_comments("f(/* 5 */ 6);"), "f( 6);");
    }

    #[test]
    fn test_contains_identifier() {
        assert!(contains_identifier("expect(x).to.equal(1)", "expect"));
        assert!(!contains_identifier("const expected = 1", "expect"));
    }
}
