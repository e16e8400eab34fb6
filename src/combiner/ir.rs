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

//! Intermediate representation of combined features
//!
//! A [`FeatureProgram`] is a list of assignments `result[target] = finish(expr)`,
//! where `expr` is a tree of three operations:
//!
//! - [`Expr::Const`]: a constant, possibly produced by folding
//! - [`Expr::Load`]: a lookup of one slot in one context slice
//! - [`Expr::Mix`]: combination of a hash state with a value
//!
//! The representation does not depend on a backend. It can be interpreted
//! ([`FeatureProgram::apply`]), compiled into closures
//! ([`super::compiled`]) or rendered as Rust source ([`FeatureProgram::emit_code`]).

use std::collections::BTreeSet;
use std::fmt;

use crate::codegen::emitter::{MethodBody, Printer};
use crate::context::Position;
use crate::features::FeatureKind;
use crate::hashing::{finish, mix};

/// Signature line of the generated `apply` method
pub(crate) const APPLY_SIGNATURE: &str =
    "fn apply(&self, result: &mut [u32], t2: &[u64], t1: &[u64], t0: &[u64]) {";

/// Read of one context slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Load {
    /// Position the slot belongs to
    pub position: Position,
    /// Slot index inside the context slice
    pub slot: u32,
}

impl Load {
    /// Create a load
    pub fn new(position: Position, slot: u32) -> Self {
        Self { position, slot }
    }

    /// Local variable name used when the load is hoisted
    pub fn binding(&self) -> String {
        format!("{}_{}", self.position, self.slot)
    }

    /// Indexing expression reading the slot
    pub fn index_expr(&self) -> String {
        format!("{}[{}]", self.position, self.slot)
    }

    #[inline]
    fn read(&self, t2: &[u64], t1: &[u64], t0: &[u64]) -> u64 {
        self.position.select(t2, t1, t0)[self.slot as usize]
    }
}

/// Expression tree computing a hash state
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    /// Constant value
    Const(u64),
    /// Context slot lookup
    Load(Load),
    /// `mix(state, value)`
    Mix(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Build `mix(state, value)`
    pub fn mix(state: Expr, value: Expr) -> Self {
        Expr::Mix(Box::new(state), Box::new(value))
    }

    /// Evaluate against a context
    pub fn eval(&self, t2: &[u64], t1: &[u64], t0: &[u64]) -> u64 {
        match self {
            Expr::Const(value) => *value,
            Expr::Load(load) => load.read(t2, t1, t0),
            Expr::Mix(state, value) => mix(state.eval(t2, t1, t0), value.eval(t2, t1, t0)),
        }
    }

    /// Replace every `Mix` of two constants by its value, bottom-up
    pub fn fold_constants(self) -> Self {
        match self {
            Expr::Mix(state, value) => match (state.fold_constants(), value.fold_constants()) {
                (Expr::Const(s), Expr::Const(v)) => Expr::Const(mix(s, v)),
                (state, value) => Expr::mix(state, value),
            },
            other => other,
        }
    }

    /// Collect every load of this expression
    pub fn collect_loads(&self, loads: &mut BTreeSet<Load>) {
        match self {
            Expr::Const(_) => {}
            Expr::Load(load) => {
                loads.insert(*load);
            }
            Expr::Mix(state, value) => {
                state.collect_loads(loads);
                value.collect_loads(loads);
            }
        }
    }

    /// Number of nodes in the tree
    pub fn size(&self) -> usize {
        match self {
            Expr::Const(_) | Expr::Load(_) => 1,
            Expr::Mix(state, value) => 1 + state.size() + value.size(),
        }
    }

    /// Render as Rust source; hoisted loads are referenced by their binding
    pub fn render(&self, hoisted: bool, out: &mut String) {
        match self {
            Expr::Const(value) => out.push_str(&format!("{value:#018x}")),
            Expr::Load(load) if hoisted => out.push_str(&load.binding()),
            Expr::Load(load) => out.push_str(&load.index_expr()),
            Expr::Mix(state, value) => {
                out.push_str("mix(");
                state.render(hoisted, out);
                out.push_str(", ");
                value.render(hoisted, out);
                out.push(')');
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(value) => write!(f, "{value:#x}"),
            Expr::Load(load) => write!(f, "{}", load.index_expr()),
            Expr::Mix(state, value) => write!(f, "mix({state}, {value})"),
        }
    }
}

/// `result[target] = finish(value)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Output index
    pub target: u32,
    /// Hash state computation
    pub value: Expr,
}

/// Combined features of one kind, ready for a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureProgram {
    kind: FeatureKind,
    context_width: usize,
    output_width: usize,
    hoisted: Vec<Load>,
    assignments: Vec<Assignment>,
}

impl FeatureProgram {
    /// Assemble a program; `hoisted` must be sorted and cover every load when non-empty
    pub(crate) fn new(
        kind: FeatureKind,
        context_width: usize,
        output_width: usize,
        hoisted: Vec<Load>,
        assignments: Vec<Assignment>,
    ) -> Self {
        Self {
            kind,
            context_width,
            output_width,
            hoisted,
            assignments,
        }
    }

    /// Feature kind this program evaluates
    pub fn kind(&self) -> FeatureKind {
        self.kind
    }

    /// Width of the context slices the program was validated against
    pub fn context_width(&self) -> usize {
        self.context_width
    }

    /// Minimum output buffer length
    pub fn output_width(&self) -> usize {
        self.output_width
    }

    /// Loads bound to locals before the assignments; empty when hoisting is off
    pub fn hoisted_loads(&self) -> &[Load] {
        &self.hoisted
    }

    /// Assignments in evaluation order
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Interpret the program
    pub fn apply(&self, result: &mut [u32], t2: &[u64], t1: &[u64], t0: &[u64]) {
        for assignment in &self.assignments {
            result[assignment.target as usize] = finish(assignment.value.eval(t2, t1, t0));
        }
    }

    /// Emit the statements of the `apply` method body
    pub fn emit_code(&self, body: &mut MethodBody) {
        if self.output_width > 0 {
            body.line(format!("debug_assert!(result.len() >= {});", self.output_width));
        }
        for load in &self.hoisted {
            body.line(format!("let {} = {};", load.binding(), load.index_expr()));
        }
        let hoisted = !self.hoisted.is_empty();
        for assignment in &self.assignments {
            let mut value = String::new();
            assignment.value.render(hoisted, &mut value);
            body.line(format!("result[{}] = finish({value});", assignment.target));
        }
    }

    /// Emit the whole body of the evaluator trait impl
    pub fn output_class_body(&self, printer: &mut Printer) {
        let mut class = MethodBody::new();
        class.block_with("fn output_width(&self) -> usize {", "}", |b| {
            b.line(self.output_width.to_string());
        });
        class.blank();
        class.line("#[inline(always)]");
        let mut apply = MethodBody::new();
        self.emit_code(&mut apply);
        class.block(APPLY_SIGNATURE, "}", apply);
        printer.emit(&class);
    }
}

impl fmt::Display for FeatureProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} program: {} assignments, context width {}, output width {}",
            self.kind,
            self.assignments.len(),
            self.context_width,
            self.output_width
        )?;
        for load in &self.hoisted {
            writeln!(f, "  let {} = {}", load.binding(), load.index_expr())?;
        }
        for assignment in &self.assignments {
            writeln!(
                f,
                "  result[{}] = finish({})",
                assignment.target, assignment.value
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::SEED;
    use pretty_assertions::assert_eq;

    fn sample_expr() -> Expr {
        Expr::mix(
            Expr::mix(Expr::mix(Expr::Const(SEED), Expr::Const(4)), Expr::Const(2)),
            Expr::Load(Load::new(Position::T1, 3)),
        )
    }

    #[test]
    fn test_fold_constants_keeps_value() {
        let ctx = [10u64, 20, 30, 40];
        let expr = sample_expr();
        let folded = expr.clone().fold_constants();

        assert_eq!(folded.size(), 3);
        assert_eq!(folded.eval(&ctx, &ctx, &ctx), expr.eval(&ctx, &ctx, &ctx));
        assert_eq!(
            folded,
            Expr::mix(
                Expr::Const(mix(mix(SEED, 4), 2)),
                Expr::Load(Load::new(Position::T1, 3))
            )
        );
    }

    #[test]
    fn test_render_uses_bindings_when_hoisted() {
        let expr = Expr::mix(Expr::Const(1), Expr::Load(Load::new(Position::T2, 0)));

        let mut hoisted = String::new();
        expr.render(true, &mut hoisted);
        assert_eq!(hoisted, "mix(0x0000000000000001, t2_0)");

        let mut inline = String::new();
        expr.render(false, &mut inline);
        assert_eq!(inline, "mix(0x0000000000000001, t2[0])");
    }

    #[test]
    fn test_emit_code_statement_order() {
        let load = Load::new(Position::T0, 1);
        let program = FeatureProgram::new(
            FeatureKind::Ngram,
            2,
            3,
            vec![load],
            vec![Assignment {
                target: 2,
                value: Expr::mix(Expr::Const(5), Expr::Load(load)),
            }],
        );

        let mut body = MethodBody::new();
        program.emit_code(&mut body);
        let mut printer = Printer::new();
        printer.emit(&body);

        assert_eq!(
            printer.result(),
            "debug_assert!(result.len() >= 3);\n\
             let t0_1 = t0[1];\n\
             result[2] = finish(mix(0x0000000000000005, t0_1));\n"
        );
    }

    #[test]
    fn test_output_class_body_shape() {
        let program = FeatureProgram::new(FeatureKind::PartialNgram, 1, 0, vec![], vec![]);
        let mut printer = Printer::new();
        program.output_class_body(&mut printer);

        assert_eq!(
            printer.result(),
            "fn output_width(&self) -> usize {\n    0\n}\n\n#[inline(always)]\n\
             fn apply(&self, result: &mut [u32], t2: &[u64], t1: &[u64], t0: &[u64]) {\n}\n"
        );
    }
}
