//! Pretty printer for expressions
//!
//! Converts expressions back to TLA+ notation. Used for error message context
//! and for tracing the rewriting engine.

use crate::ast::{Expr, ExprKind, ExprRef};
use std::fmt;

/// A string-building printer
pub struct PrettyPrinter {
    output: String,
}

impl Default for PrettyPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl PrettyPrinter {
    pub fn new() -> Self {
        Self {
            output: String::new(),
        }
    }

    pub fn finish(self) -> String {
        self.output
    }

    fn write(&mut self, s: &str) {
        self.output.push_str(s);
    }

    fn print_list(&mut self, items: &[ExprRef], sep: &str) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.write(sep);
            }
            self.print_expr(item);
        }
    }

    fn print_binary(&mut self, lhs: &Expr, op: &str, rhs: &Expr) {
        self.write("(");
        self.print_expr(lhs);
        self.write(op);
        self.print_expr(rhs);
        self.write(")");
    }

    fn print_binder(&mut self, head: &str, var: &str, set: &Expr, sep: &str, body: &Expr) {
        self.write(head);
        self.write(var);
        self.write(" \\in ");
        self.print_expr(set);
        self.write(sep);
        self.print_expr(body);
    }

    pub fn print_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Bool(true) => self.write("TRUE"),
            ExprKind::Bool(false) => self.write("FALSE"),
            ExprKind::Int(n) => self.write(&n.to_string()),
            ExprKind::Str(s) => {
                self.write("\"");
                self.write(s);
                self.write("\"");
            }
            ExprKind::Name(name) => self.write(name),
            ExprKind::Cell(cell) => self.write(&cell.to_string()),
            ExprKind::OperApp(name, args) => {
                self.write(name);
                if !args.is_empty() {
                    self.write("(");
                    self.print_list(args, ", ");
                    self.write(")");
                }
            }
            ExprKind::And(args) if args.is_empty() => self.write("TRUE"),
            ExprKind::And(args) => {
                self.write("(");
                self.print_list(args, " /\\ ");
                self.write(")");
            }
            ExprKind::Or(args) if args.is_empty() => self.write("FALSE"),
            ExprKind::Or(args) => {
                self.write("(");
                self.print_list(args, " \\/ ");
                self.write(")");
            }
            ExprKind::Not(inner) => {
                self.write("~");
                self.print_expr(inner);
            }
            ExprKind::Implies(a, b) => self.print_binary(a, " => ", b),
            ExprKind::Equiv(a, b) => self.print_binary(a, " <=> ", b),
            ExprKind::Exists { var, set, body } => {
                self.print_binder("\\E ", var, set, " : ", body)
            }
            ExprKind::Forall { var, set, body } => {
                self.print_binder("\\A ", var, set, " : ", body)
            }
            ExprKind::SetEnum(elems) => {
                self.write("{");
                self.print_list(elems, ", ");
                self.write("}");
            }
            ExprKind::In(a, b) => self.print_binary(a, " \\in ", b),
            ExprKind::NotIn(a, b) => self.print_binary(a, " \\notin ", b),
            ExprKind::SetFilter { var, set, pred } => {
                self.write("{");
                self.print_binder("", var, set, " : ", pred);
                self.write("}");
            }
            ExprKind::FunCtor { var, set, body } => {
                self.write("[");
                self.print_binder("", var, set, " |-> ", body);
                self.write("]");
            }
            ExprKind::FunApp(f, arg) => {
                self.print_expr(f);
                self.write("[");
                self.print_expr(arg);
                self.write("]");
            }
            ExprKind::Record(fields) => {
                self.write("[");
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.write(name);
                    self.write(" |-> ");
                    self.print_expr(value);
                }
                self.write("]");
            }
            ExprKind::RecordAccess(record, field) => {
                self.print_expr(record);
                self.write(".");
                self.write(field);
            }
            ExprKind::Assign(name, value) => {
                self.write(name);
                self.write(" := ");
                self.print_expr(value);
            }
            ExprKind::Unchanged(vars) => {
                self.write("UNCHANGED <<");
                self.print_list(vars, ", ");
                self.write(">>");
            }
            ExprKind::If(c, t, e) => {
                self.write("IF ");
                self.print_expr(c);
                self.write(" THEN ");
                self.print_expr(t);
                self.write(" ELSE ");
                self.print_expr(e);
            }
            ExprKind::Eq(a, b) => self.print_binary(a, " = ", b),
            ExprKind::Neq(a, b) => self.print_binary(a, " /= ", b),
            ExprKind::Lt(a, b) => self.print_binary(a, " < ", b),
            ExprKind::Leq(a, b) => self.print_binary(a, " <= ", b),
            ExprKind::Gt(a, b) => self.print_binary(a, " > ", b),
            ExprKind::Geq(a, b) => self.print_binary(a, " >= ", b),
            ExprKind::Add(a, b) => self.print_binary(a, " + ", b),
            ExprKind::Sub(a, b) => self.print_binary(a, " - ", b),
        }
    }
}

/// Pretty print an expression
pub fn pretty_expr(expr: &Expr) -> String {
    let mut pp = PrettyPrinter::new();
    pp.print_expr(expr);
    pp.finish()
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&pretty_expr(self))
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::ExprBuilder;
    use crate::types::TlaType;

    #[test]
    fn test_pretty_filter() {
        let b = ExprBuilder::new();
        let set = b.set_enum(TlaType::Int, vec![b.int(1), b.int(2)]);
        let pred = b.neq(b.name("x", TlaType::Int), b.int(2));
        let e = b.filter("x", set, pred);
        assert_eq!(e.to_string(), "{x \\in {1, 2} : (x /= 2)}");
    }

    #[test]
    fn test_pretty_actions() {
        let b = ExprBuilder::new();
        let e = b.and(vec![
            b.assign("x", b.add(b.name("x", TlaType::Int), b.int(1))),
            b.unchanged(vec![("y", TlaType::Bool)]),
        ]);
        assert_eq!(e.to_string(), "(x' := (x + 1) /\\ UNCHANGED <<y>>)");
    }

    #[test]
    fn test_pretty_cell() {
        let b = ExprBuilder::new();
        let e = b.int(3).to_cell(tla_cell(4));
        assert_eq!(e.to_string(), "$C$4");
    }

    fn tla_cell(n: u32) -> crate::cell::CellId {
        crate::cell::CellId(n)
    }
}
