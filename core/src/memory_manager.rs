//! Component B: decides which heap allocations outlive the scope that created them (§4.2).
//!
//! The analysis is a flow-insensitive, monotone fixed-point over an assignment graph: a container
//! "contains" whatever has ever been assigned or pushed into it, and an allocation escapes if it
//! is ever returned, or ever flows (transitively, through aliasing or containment) into something
//! that is returned. Loops and branches are treated as "may execute", so the graph is built once
//! over the whole body rather than per control-flow path; that is deliberately conservative.

use std::collections::{HashMap, HashSet};

use ts2c_ast::{BinOp, Expr, Function, Program, Stmt, VarKey};
use tracing::warn;

use crate::emitter::Emitter;
use crate::type_helper::TypeHelper;

#[derive(Debug, Default)]
pub struct MemoryManager {
    escaping: HashSet<VarKey>,
    edges: HashMap<VarKey, HashSet<VarKey>>,
}

impl MemoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the escape analysis over the whole program and writes `escapes = true` back onto
    /// every [`ts2c_ast::VariableInfo`] the analysis reaches. Never fails: a construct the graph
    /// builder doesn't recognize (e.g. an allocation passed to a non-builtin call) is resolved by
    /// conservatively marking it escaping, with a warning, rather than by erroring.
    pub fn preprocess(&mut self, program: &Program, types: &mut TypeHelper) {
        for func in &program.functions {
            self.preprocess_scope(&func.name, func, types);
        }
        self.preprocess_scope("main", &MainScope(&program.main), types);
        self.propagate(types);
        for key in &self.escaping {
            if let Some(info) = types.get_variable_info_mut(&key.scope, &key.name) {
                info.escapes = true;
            }
        }
    }

    fn preprocess_scope(&mut self, scope: &str, body: &dyn BodyLike, types: &TypeHelper) {
        let mut graph = Graph::default();
        for stmt in body.stmts() {
            walk_stmt(scope, stmt, &mut graph, types);
        }
        for source in graph.sources {
            self.escaping.insert(source);
        }
        self.edges.extend(graph.edges);
    }

    /// Runs the fixed-point over `self.edges`, the alias/containment graph accumulated across all
    /// scopes by `preprocess_scope`.
    fn propagate(&mut self, _types: &TypeHelper) {
        let mut frontier: Vec<VarKey> = self.escaping.iter().cloned().collect();
        while let Some(key) = frontier.pop() {
            if let Some(neighbors) = self.edges.get(&key).cloned() {
                for neighbor in neighbors {
                    if self.escaping.insert(neighbor.clone()) {
                        frontier.push(neighbor);
                    }
                }
            }
        }
    }

    pub fn is_escaping(&self, key: &VarKey) -> bool {
        self.escaping.contains(key)
    }

    pub fn escaping_keys(&self) -> impl Iterator<Item = &VarKey> {
        self.escaping.iter()
    }

    pub fn escaping_count(&self) -> usize {
        self.escaping.len()
    }

    /// Registers `var_name` in the emitter's global pointer table if its variable info marks it
    /// as both allocation-requiring and escaping; a no-op for anything else.
    pub fn insert_global_pointer_if_necessary(
        &self,
        scope: &str,
        var_name: &str,
        types: &TypeHelper,
        emitter: &mut Emitter,
    ) {
        let Some(info) = types.get_variable_info(scope, var_name) else {
            return;
        };
        if info.requires_allocation && self.is_escaping(&VarKey::new(scope, var_name)) {
            emitter.register_global_pointer(var_name);
        }
    }

    /// The `main`-epilogue loop that frees every registered global pointer, if any were
    /// registered; `None` when nothing escaped.
    pub fn global_cleanup_code(&self, emitter: &Emitter) -> Option<String> {
        emitter.global_cleanup_code()
    }
}

#[derive(Default)]
struct Graph {
    edges: HashMap<VarKey, HashSet<VarKey>>,
    sources: HashSet<VarKey>,
}

impl Graph {
    fn add_edge(&mut self, from: VarKey, to: VarKey) {
        self.edges.entry(from).or_default().insert(to);
    }
}

fn walk_stmt(scope: &str, stmt: &Stmt, graph: &mut Graph, types: &TypeHelper) {
    match stmt {
        Stmt::Block(stmts) => {
            for stmt in stmts {
                walk_stmt(scope, stmt, graph, types);
            }
        }
        Stmt::If {
            then_branch,
            else_branch,
            ..
        } => {
            walk_stmt(scope, then_branch, graph, types);
            if let Some(branch) = else_branch {
                walk_stmt(scope, branch, graph, types);
            }
        }
        Stmt::While { body, .. } | Stmt::DoWhile { body, .. } => {
            walk_stmt(scope, body, graph, types)
        }
        Stmt::For { init, body, .. } => {
            for binding in init {
                if let Some(init) = &binding.init {
                    walk_expr(scope, init, graph, types);
                }
            }
            walk_stmt(scope, body, graph, types);
        }
        Stmt::ForOf { iterand, body, .. } | Stmt::ForIn { iterand, body, .. } => {
            walk_expr(scope, iterand, graph, types);
            walk_stmt(scope, body, graph, types);
        }
        Stmt::Let(binding) => {
            if let Some(init) = &binding.init {
                walk_expr(scope, init, graph, types);
                match init {
                    Expr::Ident(source) => {
                        graph.add_edge(
                            VarKey::new(scope, source),
                            VarKey::new(scope, &binding.name),
                        );
                    }
                    Expr::ArrayLit(items) => {
                        for item in items {
                            if let Expr::Ident(value) = item {
                                // Container-escaping propagates to the contained value (§4.2).
                                graph.add_edge(
                                    VarKey::new(scope, &binding.name),
                                    VarKey::new(scope, value),
                                );
                            }
                        }
                    }
                    Expr::ObjectLit(fields) => {
                        for (_, value) in fields {
                            if let Expr::Ident(value) = value {
                                graph.add_edge(
                                    VarKey::new(scope, &binding.name),
                                    VarKey::new(scope, value),
                                );
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        Stmt::Expr(expr) => walk_expr(scope, expr, graph, types),
        Stmt::Return(Some(expr)) => {
            walk_expr(scope, expr, graph, types);
            if let Expr::Ident(name) = expr {
                let key = VarKey::new(scope, name);
                if types
                    .get_variable_info(scope, name)
                    .is_some_and(|info| info.requires_allocation)
                {
                    graph.sources.insert(key);
                }
            }
        }
        Stmt::Return(None) | Stmt::Break | Stmt::Continue => {}
    }
}

fn walk_expr(scope: &str, expr: &Expr, graph: &mut Graph, types: &TypeHelper) {
    match expr {
        Expr::Binary {
            op: BinOp::Assign,
            left,
            right,
        } => {
            walk_expr(scope, right, graph, types);
            if let (Expr::Ident(target), source) = (left.as_ref(), right.as_ref()) {
                match source {
                    Expr::Ident(source) => {
                        graph.add_edge(VarKey::new(scope, source), VarKey::new(scope, target));
                        graph.add_edge(VarKey::new(scope, target), VarKey::new(scope, source));
                    }
                    _ => {}
                }
            }
            if let Expr::Member { object, .. } = left.as_ref() {
                if let (Expr::Ident(container), Expr::Ident(value)) = (object.as_ref(), right.as_ref()) {
                    // A struct field stored into inherits escape from the struct that owns it,
                    // not the other way around (§4.2).
                    graph.add_edge(VarKey::new(scope, container), VarKey::new(scope, value));
                }
            }
        }
        Expr::Binary { left, right, .. } => {
            walk_expr(scope, left, graph, types);
            walk_expr(scope, right, graph, types);
        }
        Expr::Unary { expr, .. } | Expr::Postfix { expr, .. } => walk_expr(scope, expr, graph, types),
        Expr::Ternary {
            cond,
            then_expr,
            else_expr,
        } => {
            walk_expr(scope, cond, graph, types);
            walk_expr(scope, then_expr, graph, types);
            walk_expr(scope, else_expr, graph, types);
        }
        Expr::Call { callee, args } => {
            if let Expr::Member { object, property } = callee.as_ref() {
                if property == "push" {
                    if let Expr::Ident(container) = object.as_ref() {
                        for arg in args {
                            if let Expr::Ident(value) = arg {
                                // Pushed into a container that itself escapes ⇒ the pushed value
                                // escapes too (§4.2), so the edge runs container -> value.
                                graph.add_edge(
                                    VarKey::new(scope, container),
                                    VarKey::new(scope, value),
                                );
                            }
                        }
                    }
                    for arg in args {
                        walk_expr(scope, arg, graph, types);
                    }
                    return;
                }
                // `console.log` only ever reads its arguments (via the printf sub-transpiler);
                // it never stores them, so it is exempt from the conservative fallback below.
                if let Expr::Ident(namespace) = object.as_ref() {
                    if namespace == "console" && property == "log" {
                        for arg in args {
                            walk_expr(scope, arg, graph, types);
                        }
                        return;
                    }
                }
            }
            walk_expr(scope, callee, graph, types);
            for arg in args {
                walk_expr(scope, arg, graph, types);
                // Conservative fallback (§4.2): an allocation-requiring identifier handed to a
                // call this analysis doesn't otherwise model is assumed to escape through it.
                if let Expr::Ident(name) = arg {
                    if types
                        .get_variable_info(scope, name)
                        .is_some_and(|info| info.requires_allocation)
                    {
                        warn!(
                            scope,
                            name, "allocation passed to an unmodeled call, marking escaping"
                        );
                        graph.sources.insert(VarKey::new(scope, name));
                    }
                }
            }
        }
        Expr::Member { object, .. } => walk_expr(scope, object, graph, types),
        Expr::Index { object, index } => {
            walk_expr(scope, object, graph, types);
            walk_expr(scope, index, graph, types);
        }
        Expr::ArrayLit(items) => {
            for item in items {
                walk_expr(scope, item, graph, types);
            }
        }
        Expr::ObjectLit(fields) => {
            for (_, value) in fields {
                walk_expr(scope, value, graph, types);
            }
        }
        Expr::Ident(_) | Expr::IntLit(_) | Expr::StrLit(_) | Expr::BoolLit(_) | Expr::NullLit => {}
    }
}

trait BodyLike {
    fn stmts(&self) -> &[Stmt];
}

impl BodyLike for Function {
    fn stmts(&self) -> &[Stmt] {
        &self.body
    }
}

struct MainScope<'a>(&'a Vec<Stmt>);

impl BodyLike for MainScope<'_> {
    fn stmts(&self) -> &[Stmt] {
        self.0
    }
}
