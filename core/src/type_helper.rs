//! Component A: walks the AST once to assign each variable a C-level semantic type and
//! populates the variable registry with allocation hints (spec §4.1).

use std::collections::HashMap;

use ts2c_ast::{
    BinOp, CType, Expr, LetBinding, Param, Primitive, Program, SourceType, Stmt, StructRegistry,
    TypeOracle, TypeString, UnaryOp, VarKey, VariableInfo,
};
use tracing::info;

pub struct TypeHelper<'a> {
    oracle: &'a dyn TypeOracle,
    registry: HashMap<VarKey, VariableInfo>,
    structs: StructRegistry,
    iterator_counter: u32,
}

impl<'a> TypeHelper<'a> {
    pub fn new(oracle: &'a dyn TypeOracle) -> Self {
        TypeHelper {
            oracle,
            registry: HashMap::new(),
            structs: StructRegistry::new(),
            iterator_counter: 0,
        }
    }

    /// Populates the variable registry for the whole compilation unit. Idempotent: running it
    /// twice on the same `Program` produces the same registry (struct ids are assigned by
    /// canonical field signature, not call order).
    pub fn figure_out_variables_and_types(&mut self, program: &Program) {
        info!(
            functions = program.functions.len(),
            "reconstructing variable types"
        );
        for func in &program.functions {
            let mut known: HashMap<String, SourceType> = HashMap::new();
            for param in &func.params {
                self.register_param(&func.name, param, &mut known);
            }
            self.process_stmts(&func.name, &func.body, &mut known);
        }
        let mut known = HashMap::new();
        self.process_stmts("main", &program.main, &mut known);
    }

    fn register_param(&mut self, scope: &str, param: &Param, known: &mut HashMap<String, SourceType>) {
        let source = param.declared_type.clone().unwrap_or(SourceType::Unknown);
        known.insert(param.name.clone(), source.clone());
        let ty = self.convert_type(&source, &param.name);
        self.register(scope, &param.name, ty);
    }

    fn process_stmts(&mut self, scope: &str, stmts: &[Stmt], known: &mut HashMap<String, SourceType>) {
        for (index, stmt) in stmts.iter().enumerate() {
            self.process_stmt(scope, stmt, known, &stmts[index + 1..]);
        }
    }

    fn process_stmt(
        &mut self,
        scope: &str,
        stmt: &Stmt,
        known: &mut HashMap<String, SourceType>,
        rest: &[Stmt],
    ) {
        match stmt {
            Stmt::Let(binding) => self.process_let(scope, binding, known, rest),
            Stmt::Block(stmts) => self.process_stmts(scope, stmts, known),
            Stmt::If {
                then_branch,
                else_branch,
                ..
            } => {
                self.process_stmt(scope, then_branch, known, &[]);
                if let Some(branch) = else_branch {
                    self.process_stmt(scope, branch, known, &[]);
                }
            }
            Stmt::While { body, .. } | Stmt::DoWhile { body, .. } => {
                self.process_stmt(scope, body, known, &[])
            }
            Stmt::For { init, body, .. } => {
                for binding in init {
                    self.process_let(scope, binding, known, &[]);
                }
                self.process_stmt(scope, body, known, &[]);
            }
            Stmt::ForOf {
                binding,
                declared_type,
                iterand,
                body,
            } => {
                let element_type = declared_type.clone().unwrap_or_else(|| {
                    match self.infer_source_type(scope, iterand, known) {
                        SourceType::Array { element, .. } => *element,
                        _ => SourceType::Unknown,
                    }
                });
                known.insert(binding.clone(), element_type.clone());
                let ty = self.convert_type(&element_type, binding);
                self.register(scope, binding, ty);
                self.process_stmt(scope, body, known, &[]);
            }
            Stmt::ForIn { body, .. } => self.process_stmt(scope, body, known, &[]),
            _ => {}
        }
    }

    fn process_let(
        &mut self,
        scope: &str,
        binding: &LetBinding,
        known: &mut HashMap<String, SourceType>,
        rest: &[Stmt],
    ) {
        let mut source = binding.declared_type.clone().unwrap_or_else(|| {
            binding
                .init
                .as_ref()
                .map(|init| self.infer_source_type(scope, init, known))
                .unwrap_or(SourceType::Unknown)
        });
        if let SourceType::Array {
            element,
            capacity,
            fixed,
        } = &source
        {
            // The capacity actually used for the declaration is the maximum of: the literal
            // initializer length, and the declared (or otherwise known) capacity (§4.1) — a
            // declared fixed capacity shorter than its own literal initializer would otherwise
            // write past the end of the emitted C array.
            let mut resolved = *capacity;
            if let Some(Expr::ArrayLit(items)) = &binding.init {
                resolved = Some(resolved.map_or(items.len(), |existing| existing.max(items.len())));
            }
            if resolved.is_none() {
                resolved = push_count_bound(&binding.name, rest);
            }
            if resolved != *capacity {
                source = SourceType::Array {
                    element: element.clone(),
                    capacity: resolved,
                    fixed: *fixed,
                };
            }
        }
        known.insert(binding.name.clone(), source.clone());
        let ty = self.convert_type(&source, &binding.name);
        self.register(scope, &binding.name, ty);
    }

    fn register(&mut self, scope: &str, name: &str, ty: CType) {
        let key = VarKey::new(scope, name);
        self.registry.insert(key.clone(), VariableInfo::new(key, ty));
    }

    /// Maps a reconstructed source type to a semantic C type, per the table in §4.1.
    pub fn convert_type(&mut self, source: &SourceType, name_hint: &str) -> CType {
        match source {
            SourceType::Number => CType::Primitive(Primitive::Int16),
            SourceType::Boolean => CType::Primitive(Primitive::Bool),
            SourceType::String => CType::Primitive(Primitive::CharPtr),
            SourceType::Array {
                element,
                capacity,
                fixed,
            } => {
                let element_ty = self.convert_type(element, name_hint);
                if *fixed {
                    // Only an explicit type annotation reaches here with `fixed: true`; such
                    // annotations always carry a capacity.
                    CType::Array(Box::new(element_ty), capacity.unwrap_or(0), false)
                } else {
                    // Array literals and push-bounded inference stay on the `{data,size,capacity}`
                    // layout (§8 E1); `capacity` only sizes the initial `ARRAY_CREATE` call.
                    CType::Array(Box::new(element_ty), capacity.unwrap_or(0), true)
                }
            }
            SourceType::Object { fields } => {
                let converted = fields
                    .iter()
                    .map(|(name, ty)| (name.clone(), self.convert_type(ty, name)))
                    .collect::<Vec<_>>();
                let id = self.structs.intern(name_hint, converted);
                CType::Struct(id)
            }
            SourceType::Unknown => CType::Primitive(Primitive::VoidPtr),
        }
    }

    pub fn get_type_string(&self, ty: &CType) -> TypeString {
        ty.type_string(&self.structs)
    }

    pub fn get_variable_info(&self, scope: &str, name: &str) -> Option<&VariableInfo> {
        self.registry.get(&VarKey::new(scope, name))
    }

    pub fn get_variable_info_mut(&mut self, scope: &str, name: &str) -> Option<&mut VariableInfo> {
        self.registry.get_mut(&VarKey::new(scope, name))
    }

    pub fn variables(&self) -> impl Iterator<Item = &VariableInfo> {
        self.registry.values()
    }

    pub fn structs(&self) -> &StructRegistry {
        &self.structs
    }

    /// Returns a fresh, stable `int16_t` loop-counter name. Uniqueness scope is the whole
    /// translation unit.
    pub fn add_new_iterator_variable(&mut self) -> String {
        self.iterator_counter += 1;
        format!("iterator_{}", self.iterator_counter)
    }

    fn infer_source_type(
        &self,
        scope: &str,
        expr: &Expr,
        known: &HashMap<String, SourceType>,
    ) -> SourceType {
        match expr {
            Expr::IntLit(_) => SourceType::Number,
            Expr::StrLit(_) => SourceType::String,
            Expr::BoolLit(_) => SourceType::Boolean,
            Expr::NullLit => SourceType::Unknown,
            Expr::Ident(name) => known
                .get(name)
                .cloned()
                .or_else(|| self.oracle.type_of_ident(scope, name))
                .unwrap_or(SourceType::Unknown),
            Expr::ArrayLit(items) => {
                let element = items
                    .first()
                    .map(|item| self.infer_source_type(scope, item, known))
                    .unwrap_or(SourceType::Unknown);
                SourceType::Array {
                    element: Box::new(element),
                    capacity: Some(items.len()),
                    fixed: false,
                }
            }
            Expr::ObjectLit(fields) => SourceType::Object {
                fields: fields
                    .iter()
                    .map(|(name, value)| (name.clone(), self.infer_source_type(scope, value, known)))
                    .collect(),
            },
            Expr::Call { callee, .. } => match callee.as_ref() {
                Expr::Ident(name) => self.oracle.return_type_of(name).unwrap_or(SourceType::Unknown),
                _ => SourceType::Unknown,
            },
            Expr::Member { object, property } => {
                if property == "length" {
                    return SourceType::Number;
                }
                let object_type = self.infer_source_type(scope, object, known);
                self.oracle
                    .type_of_member(&object_type, property)
                    .unwrap_or(SourceType::Unknown)
            }
            Expr::Index { object, .. } => match self.infer_source_type(scope, object, known) {
                SourceType::Array { element, .. } => *element,
                _ => SourceType::Unknown,
            },
            Expr::Binary {
                op: BinOp::Add,
                left,
                ..
            } => match self.infer_source_type(scope, left, known) {
                SourceType::String => SourceType::String,
                _ => SourceType::Number,
            },
            Expr::Binary { op, left, .. } => match op {
                BinOp::Lt
                | BinOp::Le
                | BinOp::Gt
                | BinOp::Ge
                | BinOp::Eq
                | BinOp::NotEq
                | BinOp::And
                | BinOp::Or => SourceType::Boolean,
                BinOp::Assign => self.infer_source_type(scope, left, known),
                _ => SourceType::Number,
            },
            Expr::Unary {
                op: UnaryOp::Not, ..
            } => SourceType::Boolean,
            Expr::Unary { expr, .. } => self.infer_source_type(scope, expr, known),
            Expr::Postfix { expr, .. } => self.infer_source_type(scope, expr, known),
            Expr::Ternary { then_expr, .. } => self.infer_source_type(scope, then_expr, known),
        }
    }
}

/// Visits every `Expr` reachable from `expr`, including `expr` itself.
fn walk_expr(expr: &Expr, visit: &mut impl FnMut(&Expr)) {
    visit(expr);
    match expr {
        Expr::Binary { left, right, .. } => {
            walk_expr(left, visit);
            walk_expr(right, visit);
        }
        Expr::Unary { expr, .. } | Expr::Postfix { expr, .. } => walk_expr(expr, visit),
        Expr::Ternary {
            cond,
            then_expr,
            else_expr,
        } => {
            walk_expr(cond, visit);
            walk_expr(then_expr, visit);
            walk_expr(else_expr, visit);
        }
        Expr::Call { callee, args } => {
            walk_expr(callee, visit);
            for arg in args {
                walk_expr(arg, visit);
            }
        }
        Expr::Member { object, .. } => walk_expr(object, visit),
        Expr::Index { object, index } => {
            walk_expr(object, visit);
            walk_expr(index, visit);
        }
        Expr::ArrayLit(items) => {
            for item in items {
                walk_expr(item, visit);
            }
        }
        Expr::ObjectLit(fields) => {
            for (_, value) in fields {
                walk_expr(value, visit);
            }
        }
        Expr::Ident(_) | Expr::IntLit(_) | Expr::StrLit(_) | Expr::BoolLit(_) | Expr::NullLit => {}
    }
}

fn count_pushes(name: &str, expr: &Expr) -> usize {
    let mut count = 0;
    walk_expr(expr, &mut |node| {
        if let Expr::Call { callee, .. } = node {
            if let Expr::Member { object, property } = callee.as_ref() {
                if property == "push" {
                    if let Expr::Ident(ident) = object.as_ref() {
                        if ident == name {
                            count += 1;
                        }
                    }
                }
            }
        }
    });
    count
}

fn mentions_push(name: &str, stmt: &Stmt) -> bool {
    let mut found = false;
    walk_stmt_exprs(stmt, &mut |expr| {
        if count_pushes(name, expr) > 0 {
            found = true;
        }
    });
    found
}

fn walk_stmt_exprs(stmt: &Stmt, visit: &mut impl FnMut(&Expr)) {
    match stmt {
        Stmt::Let(binding) => {
            if let Some(init) = &binding.init {
                visit(init);
            }
        }
        Stmt::Block(stmts) => {
            for stmt in stmts {
                walk_stmt_exprs(stmt, visit);
            }
        }
        Stmt::If {
            cond,
            then_branch,
            else_branch,
        } => {
            visit(cond);
            walk_stmt_exprs(then_branch, visit);
            if let Some(branch) = else_branch {
                walk_stmt_exprs(branch, visit);
            }
        }
        Stmt::While { cond, body } => {
            visit(cond);
            walk_stmt_exprs(body, visit);
        }
        Stmt::DoWhile { body, cond } => {
            walk_stmt_exprs(body, visit);
            visit(cond);
        }
        Stmt::For {
            init,
            cond,
            step,
            body,
        } => {
            for binding in init {
                if let Some(init) = &binding.init {
                    visit(init);
                }
            }
            if let Some(cond) = cond {
                visit(cond);
            }
            if let Some(step) = step {
                visit(step);
            }
            walk_stmt_exprs(body, visit);
        }
        Stmt::ForOf { iterand, body, .. } | Stmt::ForIn { iterand, body, .. } => {
            visit(iterand);
            walk_stmt_exprs(body, visit);
        }
        Stmt::Return(Some(expr)) => visit(expr),
        Stmt::Return(None) | Stmt::Break | Stmt::Continue => {}
        Stmt::Expr(expr) => visit(expr),
    }
}

/// A statically provable upper bound on how many times `arr.push(...)` can run across `stmts`,
/// or `None` if no such bound can be proven (e.g. a push reachable from inside a loop body).
fn push_count_bound(name: &str, stmts: &[Stmt]) -> Option<usize> {
    let mut total = 0usize;
    for stmt in stmts {
        total += push_count_in_stmt(name, stmt)?;
    }
    Some(total)
}

fn push_count_in_stmt(name: &str, stmt: &Stmt) -> Option<usize> {
    match stmt {
        Stmt::Block(stmts) => push_count_bound(name, stmts),
        Stmt::If {
            then_branch,
            else_branch,
            ..
        } => {
            let then_count = push_count_in_stmt(name, then_branch)?;
            let else_count = match else_branch {
                Some(branch) => push_count_in_stmt(name, branch)?,
                None => 0,
            };
            Some(then_count.max(else_count))
        }
        Stmt::While { body, .. }
        | Stmt::DoWhile { body, .. }
        | Stmt::For { body, .. }
        | Stmt::ForOf { body, .. }
        | Stmt::ForIn { body, .. } => {
            if mentions_push(name, body) {
                None
            } else {
                Some(0)
            }
        }
        Stmt::Let(binding) => Some(
            binding
                .init
                .as_ref()
                .map(|init| count_pushes(name, init))
                .unwrap_or(0),
        ),
        Stmt::Return(Some(expr)) => Some(count_pushes(name, expr)),
        Stmt::Expr(expr) => Some(count_pushes(name, expr)),
        _ => Some(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ts2c_ast::{AnnotatedOracle, Function, LetBinding};

    fn push_stmt(name: &str) -> Stmt {
        Stmt::Expr(Expr::Call {
            callee: Box::new(Expr::Member {
                object: Box::new(Expr::Ident(name.to_string())),
                property: "push".to_string(),
            }),
            args: vec![Expr::IntLit(0)],
        })
    }

    #[test]
    fn straight_line_pushes_are_provable() {
        let stmts = vec![push_stmt("a"), push_stmt("a")];
        assert_eq!(push_count_bound("a", &stmts), Some(2));
    }

    #[test]
    fn push_inside_a_loop_is_not_provable() {
        let stmts = vec![Stmt::While {
            cond: Expr::BoolLit(true),
            body: Box::new(Stmt::Block(vec![push_stmt("a")])),
        }];
        assert_eq!(push_count_bound("a", &stmts), None);
    }

    #[test]
    fn if_branches_take_the_max_not_the_sum() {
        let stmts = vec![Stmt::If {
            cond: Expr::BoolLit(true),
            then_branch: Box::new(Stmt::Block(vec![push_stmt("a"), push_stmt("a")])),
            else_branch: Some(Box::new(Stmt::Block(vec![push_stmt("a")]))),
        }];
        assert_eq!(push_count_bound("a", &stmts), Some(2));
    }

    #[test]
    fn array_literal_yields_dynamic_array_with_matching_capacity() {
        // §8 scenario E1: even a fully-literal array goes through ARRAY_CREATE.
        let oracle = AnnotatedOracle;
        let mut helper = TypeHelper::new(&oracle);
        let program = Program {
            functions: vec![Function {
                name: "main".to_string(),
                params: vec![],
                declared_return: None,
                body: vec![Stmt::Let(LetBinding {
                    name: "a".to_string(),
                    declared_type: None,
                    init: Some(Expr::ArrayLit(vec![
                        Expr::IntLit(1),
                        Expr::IntLit(2),
                        Expr::IntLit(3),
                    ])),
                })],
            }],
            main: vec![],
        };
        helper.figure_out_variables_and_types(&program);
        let info = helper.get_variable_info("main", "a").unwrap();
        assert!(info.is_dynamic_array);
        assert_eq!(
            info.ty,
            CType::Array(Box::new(CType::Primitive(Primitive::Int16)), 3, true)
        );
    }

    #[test]
    fn an_explicitly_typed_fixed_array_is_not_dynamic() {
        let oracle = AnnotatedOracle;
        let mut helper = TypeHelper::new(&oracle);
        let program = Program {
            functions: vec![Function {
                name: "main".to_string(),
                params: vec![],
                declared_return: None,
                body: vec![Stmt::Let(LetBinding {
                    name: "a".to_string(),
                    declared_type: Some(SourceType::Array {
                        element: Box::new(SourceType::Number),
                        capacity: Some(5),
                        fixed: true,
                    }),
                    init: None,
                })],
            }],
            main: vec![],
        };
        helper.figure_out_variables_and_types(&program);
        let info = helper.get_variable_info("main", "a").unwrap();
        assert!(!info.is_dynamic_array);
    }

    #[test]
    fn a_fixed_array_s_declared_capacity_widens_to_fit_a_longer_literal() {
        let oracle = AnnotatedOracle;
        let mut helper = TypeHelper::new(&oracle);
        let program = Program {
            functions: vec![Function {
                name: "main".to_string(),
                params: vec![],
                declared_return: None,
                body: vec![Stmt::Let(LetBinding {
                    name: "a".to_string(),
                    declared_type: Some(SourceType::Array {
                        element: Box::new(SourceType::Number),
                        capacity: Some(2),
                        fixed: true,
                    }),
                    init: Some(Expr::ArrayLit(vec![
                        Expr::IntLit(1),
                        Expr::IntLit(2),
                        Expr::IntLit(3),
                    ])),
                })],
            }],
            main: vec![],
        };
        helper.figure_out_variables_and_types(&program);
        let info = helper.get_variable_info("main", "a").unwrap();
        assert_eq!(
            info.ty,
            CType::Array(Box::new(CType::Primitive(Primitive::Int16)), 3, false)
        );
    }

    #[test]
    fn unbounded_pushes_force_a_dynamic_array() {
        let oracle = AnnotatedOracle;
        let mut helper = TypeHelper::new(&oracle);
        let program = Program {
            functions: vec![Function {
                name: "main".to_string(),
                params: vec![],
                declared_return: None,
                body: vec![
                    Stmt::Let(LetBinding {
                        name: "a".to_string(),
                        declared_type: None,
                        init: Some(Expr::ArrayLit(vec![])),
                    }),
                    Stmt::While {
                        cond: Expr::BoolLit(true),
                        body: Box::new(Stmt::Block(vec![push_stmt("a")])),
                    },
                ],
            }],
            main: vec![],
        };
        helper.figure_out_variables_and_types(&program);
        let info = helper.get_variable_info("main", "a").unwrap();
        assert!(info.is_dynamic_array);
    }
}
