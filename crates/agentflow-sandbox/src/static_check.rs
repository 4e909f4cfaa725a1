//! Pre-execution static validation (spec §4.4.1), applied in all modes.
//!
//! The teacher's scanner (`skilllite-sandbox/security/scanner.rs`) is a
//! regex/line-based rule set across several languages; that approach cannot
//! soundly reject dotted imports (`import os.path`) or attribute-access
//! escape chains (`x.__class__.__bases__`). This module walks the real
//! Python AST instead, checking three things the spec requires: an
//! allowlist-only import set, a call-site builtin blocklist, and a
//! dunder-attribute/subscript blocklist.

use std::collections::HashSet;
use std::sync::LazyLock;

use rustpython_parser::ast::{self, Expr, Stmt};
use rustpython_parser::Parse;

use crate::error::SandboxError;

/// Modules importable from sandboxed code (spec §4.4.1).
pub static ALLOWED_MODULES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "math",
        "json",
        "datetime",
        "re",
        "collections",
        "itertools",
        "functools",
        "statistics",
        "decimal",
        "csv",
        "hashlib",
        "base64",
        "urllib.parse",
    ]
    .into_iter()
    .collect()
});

/// Builtins that must never be called from sandboxed code (spec §4.4.1).
static DANGEROUS_BUILTINS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    ["eval", "exec", "compile", "__import__", "open", "input", "breakpoint", "getattr", "setattr", "delattr"]
        .into_iter()
        .collect()
});

/// Dunder names whose attribute/subscript access is blocked (spec §4.4.1):
/// this is the set that blocks common sandbox-escape chains
/// (`().__class__.__bases__[0].__subclasses__()`, etc).
static DANGEROUS_DUNDERS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "__class__",
        "__bases__",
        "__subclasses__",
        "__mro__",
        "__globals__",
        "__code__",
        "__builtins__",
        "__import__",
        "__reduce__",
        "__reduce_ex__",
        "__getstate__",
        "__setstate__",
    ]
    .into_iter()
    .collect()
});

/// A single static-check violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    DisallowedImport(String),
    DangerousBuiltinCall(String),
    DangerousDunderAccess(String),
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::DisallowedImport(m) => {
                let mut allowed: Vec<&str> = ALLOWED_MODULES.iter().copied().collect();
                allowed.sort_unstable();
                write!(f, "Import of '{m}' is not allowed. Allowed: {allowed:?}")
            }
            Violation::DangerousBuiltinCall(n) => write!(f, "Use of '{n}()' is not allowed"),
            Violation::DangerousDunderAccess(n) => write!(f, "Access to '{n}' is not allowed (potential sandbox escape)"),
        }
    }
}

/// Parse `source` and return every violation found, empty if the source is
/// safe to execute.
pub fn scan(source: &str) -> Result<Vec<Violation>, SandboxError> {
    let suite = ast::Suite::parse(source, "<sandboxed>").map_err(|e| SandboxError::ParseFailure(e.to_string()))?;
    let mut violations = Vec::new();
    walk_stmts(&suite, &mut violations);
    Ok(violations)
}

fn walk_stmts(stmts: &[Stmt], out: &mut Vec<Violation>) {
    for stmt in stmts {
        walk_stmt(stmt, out);
    }
}

fn walk_stmt(stmt: &Stmt, out: &mut Vec<Violation>) {
    match stmt {
        Stmt::Import(s) => {
            for alias in &s.names {
                check_import_name(alias.name.as_str(), out);
            }
        }
        Stmt::ImportFrom(s) => {
            if let Some(module) = &s.module {
                check_import_name(module.as_str(), out);
            }
        }
        Stmt::FunctionDef(s) => walk_stmts(&s.body, out),
        Stmt::AsyncFunctionDef(s) => walk_stmts(&s.body, out),
        Stmt::ClassDef(s) => walk_stmts(&s.body, out),
        Stmt::If(s) => {
            walk_expr(&s.test, out);
            walk_stmts(&s.body, out);
            walk_stmts(&s.orelse, out);
        }
        Stmt::For(s) => {
            walk_expr(&s.iter, out);
            walk_stmts(&s.body, out);
            walk_stmts(&s.orelse, out);
        }
        Stmt::AsyncFor(s) => {
            walk_expr(&s.iter, out);
            walk_stmts(&s.body, out);
            walk_stmts(&s.orelse, out);
        }
        Stmt::While(s) => {
            walk_expr(&s.test, out);
            walk_stmts(&s.body, out);
            walk_stmts(&s.orelse, out);
        }
        Stmt::With(s) => {
            for item in &s.items {
                walk_expr(&item.context_expr, out);
            }
            walk_stmts(&s.body, out);
        }
        Stmt::AsyncWith(s) => {
            for item in &s.items {
                walk_expr(&item.context_expr, out);
            }
            walk_stmts(&s.body, out);
        }
        Stmt::Try(s) => {
            walk_stmts(&s.body, out);
            for handler in &s.handlers {
                let ast::ExceptHandler::ExceptHandler(h) = handler;
                walk_stmts(&h.body, out);
            }
            walk_stmts(&s.orelse, out);
            walk_stmts(&s.finalbody, out);
        }
        Stmt::Expr(s) => walk_expr(&s.value, out),
        Stmt::Assign(s) => {
            for target in &s.targets {
                walk_expr(target, out);
            }
            walk_expr(&s.value, out);
        }
        Stmt::AugAssign(s) => {
            walk_expr(&s.target, out);
            walk_expr(&s.value, out);
        }
        Stmt::AnnAssign(s) => {
            if let Some(value) = &s.value {
                walk_expr(value, out);
            }
        }
        Stmt::Return(s) => {
            if let Some(value) = &s.value {
                walk_expr(value, out);
            }
        }
        Stmt::Assert(s) => {
            walk_expr(&s.test, out);
            if let Some(msg) = &s.msg {
                walk_expr(msg, out);
            }
        }
        Stmt::Delete(s) => {
            for target in &s.targets {
                walk_expr(target, out);
            }
        }
        Stmt::Raise(s) => {
            if let Some(exc) = &s.exc {
                walk_expr(exc, out);
            }
            if let Some(cause) = &s.cause {
                walk_expr(cause, out);
            }
        }
        _ => {}
    }
}

fn check_import_name(module: &str, out: &mut Vec<Violation>) {
    let top_level = module.split('.').next().unwrap_or(module);
    if !ALLOWED_MODULES.contains(module) && !ALLOWED_MODULES.contains(top_level) {
        out.push(Violation::DisallowedImport(module.to_string()));
    }
}

fn walk_expr(expr: &Expr, out: &mut Vec<Violation>) {
    match expr {
        Expr::Call(e) => {
            if let Expr::Name(name) = e.func.as_ref() {
                if DANGEROUS_BUILTINS.contains(name.id.as_str()) {
                    out.push(Violation::DangerousBuiltinCall(name.id.to_string()));
                }
            }
            walk_expr(&e.func, out);
            for arg in &e.args {
                walk_expr(arg, out);
            }
            for kw in &e.keywords {
                walk_expr(&kw.value, out);
            }
        }
        Expr::Attribute(e) => {
            if DANGEROUS_DUNDERS.contains(e.attr.as_str()) {
                out.push(Violation::DangerousDunderAccess(e.attr.to_string()));
            }
            walk_expr(&e.value, out);
        }
        Expr::Subscript(e) => {
            if let Expr::Constant(c) = e.slice.as_ref() {
                if let Some(s) = c.value.as_str() {
                    if DANGEROUS_DUNDERS.contains(s) {
                        out.push(Violation::DangerousDunderAccess(s.to_string()));
                    }
                }
            }
            walk_expr(&e.value, out);
            walk_expr(&e.slice, out);
        }
        Expr::BinOp(e) => {
            walk_expr(&e.left, out);
            walk_expr(&e.right, out);
        }
        Expr::BoolOp(e) => {
            for v in &e.values {
                walk_expr(v, out);
            }
        }
        Expr::UnaryOp(e) => walk_expr(&e.operand, out),
        Expr::Compare(e) => {
            walk_expr(&e.left, out);
            for c in &e.comparators {
                walk_expr(c, out);
            }
        }
        Expr::IfExp(e) => {
            walk_expr(&e.test, out);
            walk_expr(&e.body, out);
            walk_expr(&e.orelse, out);
        }
        Expr::List(e) => {
            for el in &e.elts {
                walk_expr(el, out);
            }
        }
        Expr::Tuple(e) => {
            for el in &e.elts {
                walk_expr(el, out);
            }
        }
        Expr::Set(e) => {
            for el in &e.elts {
                walk_expr(el, out);
            }
        }
        Expr::Dict(e) => {
            for k in e.keys.iter().flatten() {
                walk_expr(k, out);
            }
            for v in &e.values {
                walk_expr(v, out);
            }
        }
        Expr::Lambda(e) => walk_expr(&e.body, out),
        Expr::Starred(e) => walk_expr(&e.value, out),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_whitelisted_import() {
        let violations = scan("import math\nx = math.sqrt(4)\n").unwrap();
        assert!(violations.is_empty());
    }

    #[test]
    fn rejects_disallowed_import() {
        let violations = scan("import os\n").unwrap();
        assert_eq!(violations, vec![Violation::DisallowedImport("os".to_string())]);
    }

    #[test]
    fn rejects_dotted_disallowed_import() {
        let violations = scan("import os.path\n").unwrap();
        assert_eq!(violations.len(), 1);
        assert!(matches!(&violations[0], Violation::DisallowedImport(m) if m == "os.path"));
    }

    #[test]
    fn rejects_import_from() {
        let violations = scan("from subprocess import run\n").unwrap();
        assert_eq!(violations, vec![Violation::DisallowedImport("subprocess".to_string())]);
    }

    #[test]
    fn allows_dotted_allowlisted_import() {
        let violations = scan("import urllib.parse\n").unwrap();
        assert!(violations.is_empty());
    }

    #[test]
    fn rejects_eval_call() {
        let violations = scan("eval('1+1')\n").unwrap();
        assert_eq!(violations, vec![Violation::DangerousBuiltinCall("eval".to_string())]);
    }

    #[test]
    fn rejects_dunder_attribute_escape_chain() {
        let violations = scan("x = ().__class__.__bases__\n").unwrap();
        assert!(violations.iter().any(|v| matches!(v, Violation::DangerousDunderAccess(n) if n == "__class__")));
        assert!(violations.iter().any(|v| matches!(v, Violation::DangerousDunderAccess(n) if n == "__bases__")));
    }

    #[test]
    fn rejects_dunder_subscript_access() {
        let violations = scan("x = getattr.__dict__['__globals__']\n").unwrap();
        assert!(violations.iter().any(|v| matches!(v, Violation::DangerousDunderAccess(n) if n == "__globals__")));
    }

    #[test]
    fn safe_script_passes() {
        let source = "import json\nimport statistics\n\ndef summarize(values):\n    return {\"mean\": statistics.mean(values)}\n\nprint(json.dumps(summarize([1, 2, 3])))\n";
        assert!(scan(source).unwrap().is_empty());
    }
}
