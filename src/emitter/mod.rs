//! Serializes merged statements back to nginx configuration syntax.

use crate::config::Statement;
use std::borrow::Cow;

/// Options for nginx emission
#[derive(Debug, Clone)]
pub struct EmitterOptions {
    /// Indent string (default: 4 spaces)
    pub indent: String,
}

impl Default for EmitterOptions {
    fn default() -> Self {
        Self {
            indent: "    ".to_string(),
        }
    }
}

/// nginx emitter for rendering a merged statement list
pub struct NginxEmitter {
    options: EmitterOptions,
}

impl NginxEmitter {
    pub fn new(options: EmitterOptions) -> Self {
        Self { options }
    }

    /// Render the statements as top-level nginx configuration text, ready
    /// for inclusion or direct use by the consuming server.
    pub fn emit(&self, statements: &[Statement]) -> String {
        let mut output = String::new();
        for statement in statements {
            self.emit_statement(&mut output, statement, 0);
        }
        output
    }

    fn emit_statement(&self, output: &mut String, statement: &Statement, depth: usize) {
        let pad = self.options.indent.repeat(depth);
        output.push_str(&pad);
        output.push_str(&statement.directive);

        for arg in &statement.args {
            output.push(' ');
            output.push_str(&quote_arg(arg));
        }

        match &statement.block {
            Some(children) => {
                output.push_str(" {\n");
                for child in children {
                    self.emit_statement(output, child, depth + 1);
                }
                output.push_str(&pad);
                output.push_str("}\n");
            }
            None => output.push_str(";\n"),
        }
    }
}

/// Quote an argument when the bare form would not survive re-parsing.
fn quote_arg(arg: &str) -> Cow<'_, str> {
    let needs_quoting = arg.is_empty()
        || arg.chars().any(|c| {
            c.is_whitespace() || matches!(c, ';' | '{' | '}' | '#' | '"' | '\'' | '\\')
        });
    if !needs_quoting {
        return Cow::Borrowed(arg);
    }

    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    for c in arg.chars() {
        match c {
            '"' | '\\' => {
                quoted.push('\\');
                quoted.push(c);
            }
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    Cow::Owned(quoted)
}
