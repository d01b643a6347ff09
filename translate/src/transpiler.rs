//! Component D: the recursive AST walker that, consulting `TypeHelper` and `MemoryManager`,
//! drives the `Emitter` to produce C89 (spec §4.4).

use ts2c_ast::{BinOp, CType, Expr, Function, LetBinding, Param, Primitive, Stmt, UnaryOp, VarKey};
use ts2c_core::{Diagnostics, Emitter, HeaderKey, MemoryManager, Target, TranspileError, TypeHelper};

use crate::printf;

/// One translation. Owns the running diagnostics collector; `types` and `mm` are borrowed from
/// the orchestrator in `crate::transpile`, which ran both pre-passes before this walk starts.
pub struct Transpiler<'a, 'o> {
    pub(crate) types: &'a mut TypeHelper<'o>,
    pub(crate) mm: &'a MemoryManager,
    pub(crate) emitter: &'a mut Emitter,
    diagnostics: Diagnostics,
    scope: String,
    /// Non-escaping allocations declared so far in the current function scope, in declaration
    /// order; frees are emitted in reverse of this at every normal exit (§4.2).
    local_allocations: Vec<String>,
}

impl<'a, 'o> Transpiler<'a, 'o> {
    pub fn new(types: &'a mut TypeHelper<'o>, mm: &'a MemoryManager, emitter: &'a mut Emitter) -> Self {
        Transpiler {
            types,
            mm,
            emitter,
            diagnostics: Diagnostics::new(),
            scope: String::new(),
            local_allocations: Vec::new(),
        }
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    pub fn transpile_function(&mut self, func: &Function) {
        self.scope = func.name.clone();
        self.local_allocations.clear();

        let params = func
            .params
            .iter()
            .map(|p| self.param_declarator(p))
            .collect::<Vec<_>>()
            .join(", ");
        let params = if params.is_empty() {
            "void".to_string()
        } else {
            params
        };
        let ret = self.function_return_type_prefix(func);
        self.emitter
            .begin_function(format!("{ret}{}({params})", func.name));

        self.emitter.begin_function_body();
        let last_is_return = matches!(func.body.last(), Some(Stmt::Return(_)));
        for stmt in &func.body {
            self.transpile_stmt(stmt);
        }
        self.emitter.finalize_function();
        if !last_is_return {
            self.emit_destructors();
        }
    }

    pub fn transpile_main(&mut self, stmts: &[Stmt]) {
        self.scope = "main".to_string();
        self.local_allocations.clear();
        self.emitter.begin_function("int main(void)");
        self.emitter.begin_function_body();
        let last_is_return = matches!(stmts.last(), Some(Stmt::Return(_)));
        for stmt in stmts {
            self.transpile_stmt(stmt);
        }
        if !last_is_return {
            self.emit_destructors();
        }
        self.emitter.finalize_function();
        if let Some(cleanup) = self.mm.global_cleanup_code(self.emitter) {
            self.emitter.emit_default(&cleanup);
        }
        self.emitter.emit_default("return 0;\n");
    }

    fn param_declarator(&self, param: &Param) -> String {
        let info = self.types.get_variable_info(&self.scope, &param.name);
        match info {
            Some(info) => self
                .types
                .get_type_string(&info.ty)
                .with_var(&param.name),
            None => format!("void *{}", param.name),
        }
    }

    fn function_return_type_prefix(&mut self, func: &Function) -> String {
        let has_value_return = func
            .body
            .iter()
            .any(|stmt| matches!(stmt, Stmt::Return(Some(_))));
        match &func.declared_return {
            Some(source) => {
                let hint = format!("{}_ret", func.name);
                let ty = self.types.convert_type(source, &hint);
                match self.types.get_type_string(&ty) {
                    ts2c_ast::TypeString::Prefix(prefix) => prefix,
                    // C89 has no by-value array return; fall back to a pointer to the element.
                    ts2c_ast::TypeString::Declarator(_) => "void *".to_string(),
                }
            }
            None if has_value_return => "void *".to_string(),
            None => "void ".to_string(),
        }
    }

    // ---- statements -------------------------------------------------------

    fn transpile_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Let(binding) => self.transpile_let(binding),
            Stmt::Block(stmts) => self.transpile_block(stmts),
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond_text = self.transpile_expr(cond);
                self.emitter.emit_default(&format!("if ({cond_text}) {{\n"));
                self.emitter.increase_indent();
                self.transpile_stmt(then_branch);
                self.emitter.decrease_indent();
                self.emitter.emit_default("}\n");
                if let Some(branch) = else_branch {
                    self.emitter.emit_default("else {\n");
                    self.emitter.increase_indent();
                    self.transpile_stmt(branch);
                    self.emitter.decrease_indent();
                    self.emitter.emit_default("}\n");
                }
            }
            Stmt::While { cond, body } => {
                let cond_text = self.transpile_expr(cond);
                self.emitter.emit_default(&format!("while ({cond_text}){{\n"));
                self.emitter.increase_indent();
                self.transpile_stmt(body);
                self.emitter.decrease_indent();
                self.emitter.emit_default("}\n");
            }
            Stmt::DoWhile { body, cond } => {
                self.emitter.emit_default("do {\n");
                self.emitter.increase_indent();
                self.transpile_stmt(body);
                self.emitter.decrease_indent();
                let cond_text = self.transpile_expr(cond);
                self.emitter.emit_default(&format!("}} while ({cond_text});\n"));
            }
            Stmt::For {
                init,
                cond,
                step,
                body,
            } => self.transpile_for(init, cond, step, body),
            Stmt::ForOf {
                binding,
                iterand,
                body,
                ..
            } => self.transpile_for_of(binding, iterand, body),
            Stmt::ForIn { .. } => {
                self.diagnostics
                    .push(TranspileError::unsupported("for-in is not supported"));
            }
            Stmt::Return(expr) => {
                self.emit_destructors();
                match expr {
                    Some(expr) => {
                        let text = self.transpile_expr(expr);
                        self.emitter.emit_default(&format!("return {text};\n"));
                    }
                    None => self.emitter.emit_default("return;\n"),
                }
            }
            Stmt::Expr(expr) => self.transpile_expr_stmt(expr),
            Stmt::Break => self.emitter.emit_default("break;\n"),
            Stmt::Continue => self.emitter.emit_default("continue;\n"),
        }
    }

    fn transpile_block(&mut self, stmts: &[Stmt]) {
        self.emitter.emit_default("{\n");
        self.emitter.increase_indent();
        for stmt in stmts {
            self.transpile_stmt(stmt);
        }
        self.emitter.decrease_indent();
        self.emitter.emit_default("}\n");
    }

    fn transpile_expr_stmt(&mut self, expr: &Expr) {
        if let Expr::Binary {
            op: BinOp::Assign,
            left,
            right,
        } = expr
        {
            self.transpile_assignment(left, right);
            return;
        }
        let text = self.transpile_expr(expr);
        self.emitter.emit_default(&format!("{text};\n"));
    }

    fn transpile_let(&mut self, binding: &LetBinding) {
        let name = binding.name.clone();
        self.declare_prologue(&name);
        let Some(info) = self.types.get_variable_info(&self.scope, &name).cloned_info() else {
            return;
        };
        self.emit_allocator(&name, &info.ty);
        if let Some(init) = &binding.init {
            self.emit_initializer(&name, &info.ty, init);
        }
        self.track_allocation(&name, &info);
    }

    fn declare_prologue(&mut self, name: &str) {
        let Some(info) = self.types.get_variable_info(&self.scope, name) else {
            return;
        };
        let decl = self.types.get_type_string(&info.ty).with_var(name);
        self.emitter.emit(&format!("{decl};\n"), Target::FunctionPrologue);
    }

    fn emit_allocator(&mut self, name: &str, ty: &CType) {
        match ty {
            CType::Array(_, capacity, true) => {
                let physical = (*capacity * 2).max(4);
                self.emitter.emit_predefined_header(HeaderKey::Array);
                self.emitter.emit_default(&format!(
                    "ARRAY_CREATE({name}, {physical}, {capacity});\n"
                ));
            }
            CType::Array(_, _, false) => {}
            CType::Struct(_) => {
                self.emitter.emit_predefined_header(HeaderKey::StdlibH);
                self.emitter.emit_predefined_header(HeaderKey::AssertH);
                self.emitter
                    .emit_default(&format!("{name} = malloc(sizeof(*{name}));\n"));
                self.emitter
                    .emit_default(&format!("assert({name} != NULL);\n"));
            }
            _ => {}
        }
    }

    /// Assigns `init` into `name` (already declared and, if `ty` requires it, already
    /// allocated). An object- or array-literal field/element that itself requires allocation
    /// (a nested struct or array) is allocated and initialized in turn, recursively, rather than
    /// having the literal's text assigned straight into a pointer-typed slot.
    fn emit_initializer(&mut self, name: &str, ty: &CType, init: &Expr) {
        match init {
            Expr::ObjectLit(fields) => {
                let field_types: std::collections::HashMap<String, CType> = match ty {
                    CType::Struct(id) => self
                        .types
                        .structs()
                        .get(*id)
                        .fields
                        .iter()
                        .map(|(name, ty)| (name.clone(), ty.clone()))
                        .collect(),
                    _ => std::collections::HashMap::new(),
                };
                for (field, value) in fields {
                    let target = format!("{name}->{field}");
                    self.allocate_and_assign(&target, field_types.get(field.as_str()), value);
                }
            }
            Expr::ArrayLit(items) => {
                let dynamic = ty.is_dynamic_array();
                let element_ty = match ty {
                    CType::Array(element, _, _) => Some((**element).clone()),
                    _ => None,
                };
                for (index, item) in items.iter().enumerate() {
                    let target = if dynamic {
                        format!("{name}.data[{index}]")
                    } else {
                        format!("{name}[{index}]")
                    };
                    self.allocate_and_assign(&target, element_ty.as_ref(), item);
                }
            }
            other => {
                let text = self.transpile_expr(other);
                self.emitter.emit_default(&format!("{name} = {text};\n"));
            }
        }
    }

    /// Allocates `target` and recurses if `declared_ty` requires allocation; otherwise a plain
    /// assignment of the transpiled value.
    fn allocate_and_assign(&mut self, target: &str, declared_ty: Option<&CType>, value: &Expr) {
        match declared_ty {
            Some(ty) if ty.is_allocated() => {
                self.emit_allocator(target, ty);
                self.emit_initializer(target, ty, value);
            }
            _ => {
                let text = self.transpile_expr(value);
                self.emitter.emit_default(&format!("{target} = {text};\n"));
            }
        }
    }

    fn transpile_assignment(&mut self, left: &Expr, right: &Expr) {
        match left {
            Expr::Ident(name) => {
                let ty = self
                    .types
                    .get_variable_info(&self.scope, name)
                    .map(|info| info.ty.clone());
                match ty {
                    Some(ty) => self.emit_initializer(name, &ty, right),
                    None => {
                        let text = self.transpile_expr(right);
                        self.emitter.emit_default(&format!("{name} = {text};\n"));
                    }
                }
            }
            Expr::Member { object, property } => {
                let object_text = self.transpile_expr(object);
                let value_text = self.transpile_expr(right);
                self.emitter
                    .emit_default(&format!("{object_text}->{property} = {value_text};\n"));
            }
            Expr::Index { object, index } => {
                let target = self.element_access(object, index);
                let value_text = self.transpile_expr(right);
                self.emitter.emit_default(&format!("{target} = {value_text};\n"));
            }
            _ => self
                .diagnostics
                .push(TranspileError::unsupported("unsupported assignment target")),
        }
    }

    fn transpile_for(
        &mut self,
        init: &[LetBinding],
        cond: &Option<Expr>,
        step: &Option<Expr>,
        body: &Stmt,
    ) {
        let mut header_init = String::new();
        if let Some((last, leading)) = init.split_last() {
            for binding in leading {
                self.transpile_let(binding);
            }
            self.declare_prologue(&last.name);
            let info = self
                .types
                .get_variable_info(&self.scope, &last.name)
                .cloned_info();
            if let Some(info) = info {
                if info.requires_allocation {
                    self.emit_allocator(&last.name, &info.ty);
                    if let Some(init_expr) = &last.init {
                        self.emit_initializer(&last.name, &info.ty, init_expr);
                    }
                    self.track_allocation(&last.name, &info);
                } else {
                    let value = match &last.init {
                        Some(init_expr) => self.transpile_expr(init_expr),
                        None => "0".to_string(),
                    };
                    header_init = format!("{} = {value}", last.name);
                }
            }
        }
        let cond_text = cond.as_ref().map(|c| self.transpile_expr(c)).unwrap_or_default();
        let step_text = step.as_ref().map(|s| self.transpile_expr(s)).unwrap_or_default();
        self.emitter
            .emit_default(&format!("for ({header_init}; {cond_text}; {step_text}) {{\n"));
        self.emitter.increase_indent();
        self.transpile_stmt(body);
        self.emitter.decrease_indent();
        self.emitter.emit_default("}\n");
    }

    fn transpile_for_of(&mut self, binding: &str, iterand: &Expr, body: &Stmt) {
        let Expr::Ident(array_name) = iterand else {
            self.diagnostics.push(TranspileError::unsupported(
                "for-of requires the iterand to be an identifier naming an array",
            ));
            return;
        };
        let Some(array_info) = self
            .types
            .get_variable_info(&self.scope, array_name)
            .cloned_info()
        else {
            self.diagnostics
                .push(TranspileError::unsupported("for-of iterand has no known type"));
            return;
        };
        let CType::Array(_, capacity, dynamic) = array_info.ty else {
            self.diagnostics
                .push(TranspileError::unsupported("for-of requires an array-typed iterand"));
            return;
        };

        self.declare_prologue(binding);
        let counter = self.types.add_new_iterator_variable();
        self.emitter
            .emit_once_to_beginning_of_function(&format!("int16_t {counter};\n"));

        let size_text = if dynamic {
            format!("{array_name}.size")
        } else {
            capacity.to_string()
        };
        self.emitter.emit_default(&format!(
            "for ({counter} = 0; {counter} < {size_text}; {counter}++) {{\n"
        ));
        self.emitter.increase_indent();
        let element = if dynamic {
            format!("{array_name}.data[{counter}]")
        } else {
            format!("{array_name}[{counter}]")
        };
        self.emitter.emit_default(&format!("{binding} = {element};\n"));
        self.transpile_stmt(body);
        self.emitter.decrease_indent();
        self.emitter.emit_default("}\n");
    }

    fn track_allocation(&mut self, name: &str, info: &ts2c_ast::VariableInfo) {
        if !info.requires_allocation {
            return;
        }
        let key = VarKey::new(&self.scope, name);
        if self.mm.is_escaping(&key) {
            self.mm
                .insert_global_pointer_if_necessary(&self.scope, name, self.types, self.emitter);
        } else {
            self.local_allocations.push(name.to_string());
        }
    }

    /// Frees every non-escaping allocation declared so far in this scope, in reverse order
    /// (§4.2). Called before every `return` and once at the natural end of a function whose last
    /// statement isn't already a `return`.
    fn emit_destructors(&mut self) {
        let names = self.local_allocations.clone();
        for name in names.iter().rev() {
            let Some(info) = self.types.get_variable_info(&self.scope, name).cloned_info() else {
                continue;
            };
            self.free_value(name, &info.ty);
        }
    }

    /// Frees the lvalue `text` of type `ty`, recursing into owned sub-allocations (struct fields,
    /// array elements) first so that a nested `free` never reads through an already-freed pointer
    /// (§4.2: "array elements are freed before the array's backing `data` buffer").
    fn free_value(&mut self, text: &str, ty: &CType) {
        match ty {
            CType::Array(element, capacity, dynamic) => {
                if element.is_allocated() {
                    let counter = self.types.add_new_iterator_variable();
                    self.emitter
                        .emit_once_to_beginning_of_function(&format!("int16_t {counter};\n"));
                    let bound = if *dynamic {
                        format!("{text}.size")
                    } else {
                        capacity.to_string()
                    };
                    let element_text = if *dynamic {
                        format!("{text}.data[{counter}]")
                    } else {
                        format!("{text}[{counter}]")
                    };
                    self.emitter.emit_default(&format!(
                        "for ({counter} = 0; {counter} < {bound}; {counter}++) {{\n"
                    ));
                    self.emitter.increase_indent();
                    self.free_value(&element_text, element);
                    self.emitter.decrease_indent();
                    self.emitter.emit_default("}\n");
                }
                if *dynamic {
                    self.emitter.emit_default(&format!("free({text}.data);\n"));
                }
            }
            CType::Struct(id) => {
                let fields = self.types.structs().get(*id).fields.clone();
                for (field_name, field_ty) in &fields {
                    if field_ty.is_allocated() {
                        self.free_value(&format!("{text}->{field_name}"), field_ty);
                    }
                }
                self.emitter.emit_default(&format!("free({text});\n"));
            }
            _ => {}
        }
    }

    // ---- expressions --------------------------------------------------------

    pub(crate) fn transpile_expr(&mut self, expr: &Expr) -> String {
        match expr {
            Expr::Ident(name) => name.clone(),
            Expr::IntLit(value) => value.to_string(),
            Expr::StrLit(value) => c_string_literal(value),
            Expr::BoolLit(value) => {
                self.emitter.emit_predefined_header(HeaderKey::Bool);
                if *value { "TRUE".to_string() } else { "FALSE".to_string() }
            }
            Expr::NullLit => "NULL".to_string(),
            Expr::ArrayLit(items) => {
                // Only reachable as a nested expression (not a `let` or assignment RHS, which
                // are expanded index-by-index); render as a bracketed literal for any remaining
                // context, e.g. an argument position not covered by an allocation site.
                let parts = items.iter().map(|i| self.transpile_expr(i)).collect::<Vec<_>>();
                format!("{{{}}}", parts.join(", "))
            }
            Expr::ObjectLit(fields) => {
                let parts = fields
                    .iter()
                    .map(|(name, value)| format!(".{name} = {}", self.transpile_expr(value)))
                    .collect::<Vec<_>>();
                format!("{{{}}}", parts.join(", "))
            }
            Expr::Binary { op, left, right } => self.transpile_binary(*op, left, right),
            Expr::Unary { op, expr } => self.transpile_unary(*op, expr),
            Expr::Postfix { op, expr } => {
                let text = self.transpile_expr(expr);
                match op {
                    ts2c_ast::PostfixOp::Inc => format!("{text}++"),
                    ts2c_ast::PostfixOp::Dec => format!("{text}--"),
                }
            }
            Expr::Ternary { .. } => {
                self.diagnostics
                    .push(TranspileError::unsupported_node("Ternary"));
                "0".to_string()
            }
            Expr::Call { callee, args } => self.transpile_call(callee, args),
            Expr::Member { object, property } => self.transpile_member(object, property),
            Expr::Index { object, index } => self.element_access(object, index),
        }
    }

    fn transpile_binary(&mut self, op: BinOp, left: &Expr, right: &Expr) -> String {
        if op == BinOp::Assign {
            self.diagnostics.push(TranspileError::unsupported(
                "Assignments inside expressions are not yet supported.",
            ));
            return "0".to_string();
        }
        let left_text = self.transpile_expr(left);
        let right_text = self.transpile_expr(right);
        if op == BinOp::Eq {
            let left_ty = self.ctype_of_expr(left);
            let right_ty = self.ctype_of_expr(right);
            let is_char_ptr = |t: &CType| matches!(t, CType::Primitive(Primitive::CharPtr));
            let is_int16 = |t: &CType| matches!(t, CType::Primitive(Primitive::Int16));
            if is_char_ptr(&left_ty) && is_char_ptr(&right_ty) {
                self.emitter.emit_predefined_header(HeaderKey::StringH);
                return format!("strcmp({left_text}, {right_text}) == 0");
            }
            if !(is_int16(&left_ty) && is_int16(&right_ty)) {
                self.emitter.emit_predefined_header(HeaderKey::JsEq);
                return format!("js_eq({left_text}, {right_text})");
            }
            return format!("{left_text} == {right_text}");
        }
        let Some(symbol) = operator_symbol(op) else {
            self.diagnostics
                .push(TranspileError::unsupported_operator(op));
            return "0".to_string();
        };
        format!("{left_text} {symbol} {right_text}")
    }

    fn transpile_unary(&mut self, op: UnaryOp, expr: &Expr) -> String {
        if op != UnaryOp::Not {
            self.diagnostics
                .push(TranspileError::unsupported_operator(op));
            return "0".to_string();
        }
        let ty = self.ctype_of_expr(expr);
        let text = self.transpile_expr(expr);
        if matches!(ty, CType::Primitive(Primitive::CharPtr)) {
            format!("(!{text} || !{text}[0])")
        } else {
            format!("!{text}")
        }
    }

    fn transpile_call(&mut self, callee: &Expr, args: &[Expr]) -> String {
        if let Expr::Member { object, property } = callee {
            if let Expr::Ident(namespace) = object.as_ref() {
                if namespace == "console" && property == "log" {
                    self.emitter.emit_predefined_header(HeaderKey::StdioH);
                    return printf::build_call(self, args);
                }
            }
            if let Expr::Ident(array_name) = object.as_ref() {
                if let Some(info) = self
                    .types
                    .get_variable_info(&self.scope, array_name)
                    .cloned_info()
                {
                    if let CType::Array(_, _, dynamic) = info.ty {
                        if property == "push" && dynamic {
                            self.emitter.emit_predefined_header(HeaderKey::Array);
                            let arg_text = args
                                .first()
                                .map(|a| self.transpile_expr(a))
                                .unwrap_or_default();
                            return format!("ARRAY_PUSH({array_name}, {arg_text})");
                        }
                        if property == "pop" && dynamic {
                            self.emitter.emit_predefined_header(HeaderKey::ArrayPop);
                            return format!("ARRAY_POP({array_name})");
                        }
                    }
                }
            }
        }
        let callee_text = self.transpile_expr(callee);
        let args_text = args
            .iter()
            .map(|a| self.transpile_expr(a))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{callee_text}({args_text})")
    }

    fn transpile_member(&mut self, object: &Expr, property: &str) -> String {
        if property == "length" {
            if let CType::Array(_, capacity, dynamic) = self.ctype_of_expr(object) {
                let object_text = self.transpile_expr(object);
                return if dynamic {
                    format!("{object_text}.size")
                } else {
                    capacity.to_string()
                };
            }
        }
        let object_text = self.transpile_expr(object);
        format!("{object_text}->{property}")
    }

    fn element_access(&mut self, object: &Expr, index: &Expr) -> String {
        if let Expr::StrLit(field) = index {
            let object_text = self.transpile_expr(object);
            return format!("{object_text}->{field}");
        }
        let object_ty = self.ctype_of_expr(object);
        let object_text = self.transpile_expr(object);
        let index_text = self.transpile_expr(index);
        match object_ty {
            CType::Array(_, _, true) => format!("{object_text}.data[{index_text}]"),
            CType::Array(_, _, false) => format!("{object_text}[{index_text}]"),
            _ => {
                self.emitter.emit_predefined_header(HeaderKey::JsEq);
                format!("js_get({object_text}, {index_text})")
            }
        }
    }

    /// Best-effort CType classifier for an arbitrary expression, used by the binary-equality,
    /// `.length`, element-access, and printf specializations. Falls back to `void *` when the
    /// expression's shape carries no statically known type.
    pub(crate) fn ctype_of_expr(&self, expr: &Expr) -> CType {
        match expr {
            Expr::Ident(name) => self
                .types
                .get_variable_info(&self.scope, name)
                .map(|info| info.ty.clone())
                .unwrap_or(CType::Primitive(Primitive::VoidPtr)),
            Expr::IntLit(_) => CType::Primitive(Primitive::Int16),
            Expr::StrLit(_) => CType::Primitive(Primitive::CharPtr),
            Expr::BoolLit(_) => CType::Primitive(Primitive::Bool),
            Expr::NullLit => CType::Primitive(Primitive::VoidPtr),
            Expr::Binary {
                op: BinOp::Add,
                left,
                ..
            } => self.ctype_of_expr(left),
            Expr::Binary { op, .. } => match op {
                BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge | BinOp::Eq => {
                    CType::Primitive(Primitive::Bool)
                }
                _ => CType::Primitive(Primitive::Int16),
            },
            Expr::Unary {
                op: UnaryOp::Not, ..
            } => CType::Primitive(Primitive::Bool),
            Expr::Unary { expr, .. } | Expr::Postfix { expr, .. } => self.ctype_of_expr(expr),
            Expr::Member { object, property } => {
                if property == "length" {
                    return CType::Primitive(Primitive::Int16);
                }
                match self.ctype_of_expr(object) {
                    CType::Struct(id) => self
                        .types
                        .structs()
                        .get(id)
                        .fields
                        .iter()
                        .find(|(name, _)| name == property)
                        .map(|(_, ty)| ty.clone())
                        .unwrap_or(CType::Primitive(Primitive::VoidPtr)),
                    _ => CType::Primitive(Primitive::VoidPtr),
                }
            }
            Expr::Index { object, .. } => match self.ctype_of_expr(object) {
                CType::Array(element, _, _) => *element,
                _ => CType::Primitive(Primitive::VoidPtr),
            },
            Expr::Call { .. } | Expr::ArrayLit(_) | Expr::ObjectLit(_) | Expr::Ternary { .. } => {
                CType::Primitive(Primitive::VoidPtr)
            }
        }
    }

    pub(crate) fn push_diagnostic(&mut self, error: TranspileError) {
        self.diagnostics.push(error);
    }
}

fn operator_symbol(op: BinOp) -> Option<&'static str> {
    match op {
        BinOp::Lt => Some("<"),
        BinOp::Le => Some("<="),
        BinOp::Gt => Some(">"),
        BinOp::Ge => Some(">="),
        BinOp::Add => Some("+"),
        BinOp::Sub => Some("-"),
        BinOp::Mul => Some("*"),
        BinOp::Div => Some("/"),
        _ => None,
    }
}

/// Reflows a decoded source string literal into a double-quoted C string literal, escaping
/// backslashes, double quotes, and embedded newlines.
pub(crate) fn c_string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

trait OptionVariableInfoExt {
    fn cloned_info(self) -> Option<ts2c_ast::VariableInfo>;
}

impl OptionVariableInfoExt for Option<&ts2c_ast::VariableInfo> {
    fn cloned_info(self) -> Option<ts2c_ast::VariableInfo> {
        self.cloned()
    }
}
