// Copyright 2024 OctoFHIR Team
//
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

//! Indentation-aware text emission
//!
//! [`Printer`] accumulates lines at the current indentation level. Nested scopes are
//! entered through [`Printer::indent`], which returns an [`Indent`] guard; dropping
//! the guard restores the previous level, so an early return through `?` cannot
//! leave the printer unbalanced.
//!
//! [`MethodBody`] is a tree of statements that renders itself into a printer. It
//! knows nothing about files, imports or modules.

use std::ops::{Deref, DerefMut};

/// Spaces per indentation level
pub const INDENT_WIDTH: usize = 4;

/// Line-oriented text buffer with an indentation level
#[derive(Debug, Clone)]
pub struct Printer {
    buffer: String,
    level: usize,
    width: usize,
}

impl Default for Printer {
    fn default() -> Self {
        Self::new()
    }
}

impl Printer {
    /// Create an empty printer at level 0
    pub fn new() -> Self {
        Self::with_indent_width(INDENT_WIDTH)
    }

    /// Create a printer using `width` spaces per level
    pub fn with_indent_width(width: usize) -> Self {
        Self {
            buffer: String::new(),
            level: 0,
            width,
        }
    }

    /// Append text at the current level; every line of `text` is indented.
    ///
    /// Empty lines are written without trailing whitespace.
    pub fn line(&mut self, text: &str) -> &mut Self {
        for line in text.split('\n') {
            if !line.is_empty() {
                for _ in 0..self.level * self.width {
                    self.buffer.push(' ');
                }
                self.buffer.push_str(line);
            }
            self.buffer.push('\n');
        }
        self
    }

    /// Append an empty line
    pub fn blank(&mut self) -> &mut Self {
        self.buffer.push('\n');
        self
    }

    /// Enter a nested scope until the returned guard is dropped
    pub fn indent(&mut self) -> Indent<'_> {
        let restore = self.level;
        self.level += 1;
        Indent {
            printer: self,
            restore,
        }
    }

    /// Render one statement tree at the current level
    pub fn emit(&mut self, body: &MethodBody) -> &mut Self {
        body.render(self);
        self
    }

    /// Current indentation level
    pub fn level(&self) -> usize {
        self.level
    }

    /// Text produced so far
    pub fn result(&self) -> &str {
        &self.buffer
    }

    /// Consume the printer and return its text
    pub fn into_result(self) -> String {
        self.buffer
    }
}

/// Scope guard returned by [`Printer::indent`]
#[derive(Debug)]
pub struct Indent<'a> {
    printer: &'a mut Printer,
    restore: usize,
}

impl Deref for Indent<'_> {
    type Target = Printer;

    fn deref(&self) -> &Printer {
        self.printer
    }
}

impl DerefMut for Indent<'_> {
    fn deref_mut(&mut self) -> &mut Printer {
        self.printer
    }
}

impl Drop for Indent<'_> {
    fn drop(&mut self) {
        self.printer.level = self.restore;
    }
}

/// One node of a statement tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// A single line
    Line(String),
    /// An empty separator line
    Blank,
    /// A nested scope: `open`, the indented body, then `close`
    Block {
        /// Line opening the scope
        open: String,
        /// Statements inside the scope
        body: MethodBody,
        /// Line closing the scope
        close: String,
    },
}

/// Ordered statement tree forming a function or impl body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodBody {
    statements: Vec<Statement>,
}

impl MethodBody {
    /// Create an empty body
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line
    pub fn line(&mut self, text: impl Into<String>) -> &mut Self {
        self.statements.push(Statement::Line(text.into()));
        self
    }

    /// Append an empty line
    pub fn blank(&mut self) -> &mut Self {
        self.statements.push(Statement::Blank);
        self
    }

    /// Append a nested scope with an already built body
    pub fn block(
        &mut self,
        open: impl Into<String>,
        close: impl Into<String>,
        body: MethodBody,
    ) -> &mut Self {
        self.statements.push(Statement::Block {
            open: open.into(),
            body,
            close: close.into(),
        });
        self
    }

    /// Append a nested scope whose body is built by `build`
    pub fn block_with<F>(
        &mut self,
        open: impl Into<String>,
        close: impl Into<String>,
        build: F,
    ) -> &mut Self
    where
        F: FnOnce(&mut MethodBody),
    {
        let mut body = MethodBody::new();
        build(&mut body);
        self.block(open, close, body)
    }

    /// Statements in order
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Check if the body has no statements
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Render the statements into `printer` at its current level
    pub fn render(&self, printer: &mut Printer) {
        for statement in &self.statements {
            match statement {
                Statement::Line(text) => {
                    printer.line(text);
                }
                Statement::Blank => {
                    printer.blank();
                }
                Statement::Block { open, body, close } => {
                    printer.line(open);
                    {
                        let mut inner = printer.indent();
                        body.render(&mut inner);
                    }
                    printer.line(close);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn leading_spaces(line: &str) -> usize {
        line.len() - line.trim_start_matches(' ').len()
    }

    fn nested(depth: usize) -> MethodBody {
        let mut body = MethodBody::new();
        body.line(format!("level {depth}"));
        if depth < 4 {
            body.block(
                format!("open {depth} {{"),
                format!("}} {depth}"),
                nested(depth + 1),
            );
        }
        body
    }

    #[test]
    fn test_indent_guard_restores_level() {
        let mut printer = Printer::new();
        printer.line("a");
        {
            let mut inner = printer.indent();
            inner.line("b");
            {
                let mut innermost = inner.indent();
                assert_eq!(innermost.level(), 2);
                innermost.line("c");
            }
            assert_eq!(inner.level(), 1);
            inner.line("d");
        }
        assert_eq!(printer.level(), 0);
        printer.line("e");

        assert_eq!(printer.result(), "a\n    b\n        c\n    d\ne\n");
    }

    #[test]
    fn test_indent_restores_on_early_return() {
        fn render_line(printer: &mut Printer, text: &str) -> Result<(), String> {
            if text.is_empty() {
                return Err("render failed".to_string());
            }
            printer.line(text);
            Ok(())
        }

        fn failing(printer: &mut Printer) -> Result<(), String> {
            let mut inner = printer.indent();
            render_line(&mut inner, "partial")?;
            render_line(&mut inner, "")?;
            render_line(&mut inner, "unreachable")?;
            Ok(())
        }

        let mut printer = Printer::new();
        assert!(failing(&mut printer).is_err());
        assert_eq!(printer.level(), 0);

        printer.line("sibling");
        assert_eq!(printer.result(), "    partial\nsibling\n");
    }

    #[test]
    fn test_nested_levels_are_multiples_of_width() {
        let mut printer = Printer::with_indent_width(2);
        printer.emit(&nested(0));

        for line in printer.result().lines() {
            let depth: usize = line
                .split_whitespace()
                .nth(1)
                .and_then(|d| d.parse().ok())
                .unwrap();
            // open and close lines sit at the level of the statements around them
            assert_eq!(leading_spaces(line), depth * 2, "line {line:?}");
        }
    }

    #[test]
    fn test_empty_block_restores_enclosing_level() {
        let mut body = MethodBody::new();
        body.block_with("outer {", "}", |outer| {
            outer.block("empty {", "}", MethodBody::new());
            outer.line("after_empty();");
        });
        body.line("tail();");

        let mut printer = Printer::new();
        printer.emit(&body);

        assert_eq!(
            printer.result(),
            "outer {\n    empty {\n    }\n    after_empty();\n}\ntail();\n"
        );
        assert_eq!(printer.level(), 0);
    }

    #[test]
    fn test_emit_starts_at_current_level() {
        let mut body = MethodBody::new();
        body.line("x();").blank().line("y();");

        let mut printer = Printer::new();
        {
            let mut inner = printer.indent();
            inner.emit(&body);
        }

        assert_eq!(printer.result(), "    x();\n\n    y();\n");
    }

    #[test]
    fn test_block_order_is_preserved() {
        let mut body = MethodBody::new();
        body.block_with("first {", "}", |b| {
            b.line("1");
        });
        body.block_with("second {", "}", |b| {
            b.line("2");
        });

        let mut printer = Printer::new();
        printer.emit(&body);
        let first = printer.result().find("first").unwrap();
        let second = printer.result().find("second").unwrap();
        assert!(first < second);
        assert_eq!(body.statements().len(), 2);
    }
}
