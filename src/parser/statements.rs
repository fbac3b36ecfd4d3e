//! Recursive-descent parser producing `Statement` trees from tokens.

use super::lexer::{tokenize, Token};
use super::ParseError;
use crate::config::Statement;
use std::path::Path;

/// Parse one configuration source into its top-level statements.
///
/// `include` directives are kept verbatim; expanding the aggregation
/// block's includes is the loader's job.
pub fn parse_source(content: &str, file: &Path) -> Result<Vec<Statement>, ParseError> {
    let tokens = tokenize(content).map_err(|e| ParseError::Syntax {
        file: file.to_path_buf(),
        line: e.line,
        message: e.message,
    })?;

    let mut parser = StatementParser {
        tokens: &tokens,
        pos: 0,
        file,
    };
    parser.parse_statements(false)
}

struct StatementParser<'a> {
    tokens: &'a [(Token, usize)],
    pos: usize,
    file: &'a Path,
}

impl<'a> StatementParser<'a> {
    /// Parse statements until end of input (top level) or a closing brace
    /// (inside a block).
    fn parse_statements(&mut self, in_block: bool) -> Result<Vec<Statement>, ParseError> {
        let mut statements = Vec::new();

        loop {
            match self.peek() {
                None => {
                    if in_block {
                        return Err(self.syntax(self.last_line(), "unexpected end of file inside block"));
                    }
                    return Ok(statements);
                }
                Some((Token::CloseBrace, line)) => {
                    if in_block {
                        self.pos += 1;
                        return Ok(statements);
                    }
                    return Err(self.syntax(*line, "unmatched closing brace"));
                }
                Some(_) => statements.push(self.parse_statement()?),
            }
        }
    }

    /// Parse a single statement: a directive name, its arguments, and
    /// either a terminating semicolon or a nested block.
    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let (directive, line) = match self.next() {
            Some((Token::Word(word), line)) => (word.clone(), *line),
            Some((token, line)) => {
                return Err(self.syntax(*line, format!("expected directive name, got {:?}", token)))
            }
            None => return Err(self.syntax(self.last_line(), "expected directive name")),
        };

        let mut statement = Statement::new(directive, line, self.file.to_path_buf());

        loop {
            match self.next() {
                Some((Token::Word(word), _)) => statement.args.push(word.clone()),
                Some((Token::Quoted(value), _)) => statement.args.push(value.clone()),
                Some((Token::Semicolon, _)) => return Ok(statement),
                Some((Token::OpenBrace, _)) => {
                    statement.block = Some(self.parse_statements(true)?);
                    return Ok(statement);
                }
                Some((Token::CloseBrace, close_line)) => {
                    return Err(self.syntax(*close_line, "unexpected closing brace in directive"))
                }
                None => {
                    return Err(self.syntax(line, "directive not terminated with ';' or a block"))
                }
            }
        }
    }

    fn peek(&self) -> Option<&'a (Token, usize)> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a (Token, usize)> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn last_line(&self) -> usize {
        self.tokens.last().map(|(_, line)| *line).unwrap_or(0)
    }

    fn syntax(&self, line: usize, message: impl Into<String>) -> ParseError {
        ParseError::Syntax {
            file: self.file.to_path_buf(),
            line,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(input: &str) -> Vec<Statement> {
        parse_source(input, Path::new("test.conf")).unwrap()
    }

    #[test]
    fn test_parse_simple_directive() {
        let statements = parse("include /etc/nginx/vhost.d/foo.conf;");
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].directive, "include");
        assert_eq!(statements[0].args, vec!["/etc/nginx/vhost.d/foo.conf"]);
        assert!(statements[0].block.is_none());
    }

    #[test]
    fn test_parse_block() {
        let statements = parse(
            r#"
            server {
                listen 80;
                server_name example.com;
            }
        "#,
        );
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].directive, "server");

        let block = statements[0].block.as_ref().unwrap();
        assert_eq!(block.len(), 2);
        assert_eq!(block[0].directive, "listen");
        assert_eq!(block[1].directive, "server_name");
        assert_eq!(block[1].args, vec!["example.com"]);
    }

    #[test]
    fn test_parse_nested_blocks() {
        let statements = parse(
            r#"
            server {
                location / {
                    proxy_pass http://backend;
                }
            }
        "#,
        );
        let server_block = statements[0].block.as_ref().unwrap();
        assert_eq!(server_block[0].directive, "location");
        assert_eq!(server_block[0].args, vec!["/"]);

        let location_block = server_block[0].block.as_ref().unwrap();
        assert_eq!(location_block[0].directive, "proxy_pass");
    }

    #[test]
    fn test_parse_records_location() {
        let statements = parse("a;\nupstream app {\n    server 10.0.0.1;\n}\n");
        assert_eq!(statements[1].location.line, 2);
        assert_eq!(statements[1].location.file, PathBuf::from("test.conf"));
        assert_eq!(statements[1].children()[0].location.line, 3);
    }

    #[test]
    fn test_parse_unterminated_directive() {
        let err = parse_source("server_name x.test", Path::new("bad.conf")).unwrap_err();
        match err {
            ParseError::Syntax { file, line, message } => {
                assert_eq!(file, PathBuf::from("bad.conf"));
                assert_eq!(line, 1);
                assert!(message.contains("not terminated"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_unclosed_block() {
        let err = parse_source("server {\n    listen 80;\n", Path::new("bad.conf")).unwrap_err();
        match err {
            ParseError::Syntax { line, message, .. } => {
                assert_eq!(line, 2);
                assert!(message.contains("end of file"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_unmatched_close_brace() {
        assert!(parse_source("}", Path::new("bad.conf")).is_err());
    }
}
