//! Tokenizer for nginx configuration text.

use nom::bytes::complete::take_while1;
use nom::character::complete::char;
use nom::IResult;

/// Token types for nginx config
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Bare word: a directive name or unquoted argument
    Word(String),
    /// Quoted string argument (quotes and escapes already resolved)
    Quoted(String),
    /// Open brace {
    OpenBrace,
    /// Close brace }
    CloseBrace,
    /// Semicolon ;
    Semicolon,
}

/// Tokenization failure with the line it occurred on.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub line: usize,
    pub message: String,
}

/// Tokenize nginx configuration text, pairing each token with its 1-based
/// line number. Comments and whitespace are discarded here; the statement
/// parser never sees them.
pub fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, LexError> {
    let mut tokens = Vec::new();
    let mut line = 1usize;
    let mut rest = input;

    while let Some(c) = rest.chars().next() {
        match c {
            ' ' | '\t' | '\r' => rest = &rest[1..],
            '\n' => {
                line += 1;
                rest = &rest[1..];
            }
            '#' => {
                let end = rest.find('\n').unwrap_or(rest.len());
                rest = &rest[end..];
            }
            '{' => {
                tokens.push((Token::OpenBrace, line));
                rest = &rest[1..];
            }
            '}' => {
                tokens.push((Token::CloseBrace, line));
                rest = &rest[1..];
            }
            ';' => {
                tokens.push((Token::Semicolon, line));
                rest = &rest[1..];
            }
            '"' | '\'' => {
                let (remaining, value) = quoted_string(rest, c).map_err(|_| LexError {
                    line,
                    message: "unterminated string".to_string(),
                })?;
                tokens.push((Token::Quoted(value), line));
                line += newlines_consumed(rest, remaining);
                rest = remaining;
            }
            _ => {
                let (remaining, word) = bare_word(rest).map_err(|_| LexError {
                    line,
                    message: format!("unexpected character {:?}", c),
                })?;
                tokens.push((Token::Word(word.to_string()), line));
                rest = remaining;
            }
        }
    }

    Ok(tokens)
}

fn newlines_consumed(before: &str, after: &str) -> usize {
    let consumed = &before[..before.len() - after.len()];
    consumed.matches('\n').count()
}

fn bare_word(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| {
        !c.is_whitespace() && !matches!(c, '{' | '}' | ';' | '#' | '"' | '\'')
    })(input)
}

/// Parse a quoted string starting at `input`, resolving backslash escapes.
fn quoted_string(input: &str, delim: char) -> IResult<&str, String> {
    let (rest, _) = char(delim)(input)?;
    let mut value = String::new();
    let mut chars = rest.char_indices();

    while let Some((i, c)) = chars.next() {
        if c == delim {
            return Ok((&rest[i + c.len_utf8()..], value));
        }
        if c == '\\' {
            match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((_, 'r')) => value.push('\r'),
                Some((_, escaped)) if escaped == delim || escaped == '\\' => value.push(escaped),
                Some((_, other)) => {
                    value.push('\\');
                    value.push(other);
                }
                None => break,
            }
            continue;
        }
        value.push(c);
    }

    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Char,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_simple() {
        let input = "include ./*.conf;";
        let tokens = tokenize(input).unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].0, Token::Word("include".to_string()));
        assert_eq!(tokens[1].0, Token::Word("./*.conf".to_string()));
        assert_eq!(tokens[2].0, Token::Semicolon);
    }

    #[test]
    fn test_tokenize_block() {
        let input = "upstream app { server 10.0.0.1:80; }";
        let tokens = tokenize(input).unwrap();
        assert_eq!(tokens.len(), 7);
        assert_eq!(tokens[0].0, Token::Word("upstream".to_string()));
        assert_eq!(tokens[2].0, Token::OpenBrace);
        assert_eq!(tokens[5].0, Token::Semicolon);
        assert_eq!(tokens[6].0, Token::CloseBrace);
    }

    #[test]
    fn test_tokenize_quoted_string() {
        let input = r#"log_format main "a \"b\" c";"#;
        let tokens = tokenize(input).unwrap();
        assert_eq!(tokens[2].0, Token::Quoted(r#"a "b" c"#.to_string()));
    }

    #[test]
    fn test_tokenize_skips_comments() {
        let input = "# generated by nginx-proxy\nserver_name x.test;";
        let tokens = tokenize(input).unwrap();
        assert_eq!(tokens[0].0, Token::Word("server_name".to_string()));
        assert_eq!(tokens[0].1, 2);
    }

    #[test]
    fn test_tokenize_line_numbers() {
        let input = "a;\nb;\n\nc {\n}\n";
        let tokens = tokenize(input).unwrap();
        let lines: Vec<usize> = tokens.iter().map(|(_, l)| *l).collect();
        assert_eq!(lines, vec![1, 1, 2, 2, 4, 4, 5]);
    }

    #[test]
    fn test_tokenize_unterminated_string() {
        let err = tokenize("root \"/var/www").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.message.contains("unterminated"));
    }
}
