//! Component C: the text-buffer half of the translator. The Transpiler (in the `translate` crate)
//! decides WHAT to emit; the `Emitter` decides WHERE it lands and owns indentation, header
//! dedup, and the global pointer table used to free escaping allocations at program exit (§4.3).

use std::collections::{BTreeSet, HashSet};

/// A private runtime header or a system one, deduplicated by value rather than by the literal
/// `#include` text so two call sites asking for the same facility never double-emit it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HeaderKey {
    StdioH,
    StdlibH,
    StringH,
    AssertH,
    Bool,
    JsEq,
    Array,
    ArrayPop,
}

impl HeaderKey {
    fn include_line(self) -> &'static str {
        match self {
            HeaderKey::StdioH => "#include <stdio.h>",
            HeaderKey::StdlibH => "#include <stdlib.h>",
            HeaderKey::StringH => "#include <string.h>",
            HeaderKey::AssertH => "#include <assert.h>",
            HeaderKey::Bool => "#include \"ts2c_runtime_bool.h\"",
            HeaderKey::JsEq => "#include \"ts2c_runtime_eq.h\"",
            HeaderKey::Array => "#include \"ts2c_runtime_array.h\"",
            HeaderKey::ArrayPop => "#include \"ts2c_runtime_array_pop.h\"",
        }
    }
}

/// Which region of the output a call to [`Emitter::emit`] appends to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Globals,
    FunctionPrologue,
    FunctionBody,
    FunctionEpilogue,
}

/// An indentation-aware text accumulator. Tracks whether the cursor sits at the start of a line
/// so `emit` can prefix newly-started lines with the current indent without the caller having to
/// ask for it explicitly.
#[derive(Debug, Default)]
struct Buf {
    text: String,
    at_line_start: bool,
}

impl Buf {
    fn new() -> Self {
        Buf {
            text: String::new(),
            at_line_start: true,
        }
    }

    fn push(&mut self, text: &str, indent: usize, indent_unit: &str) {
        for ch in text.chars() {
            if self.at_line_start && ch != '\n' {
                self.text.push_str(&indent_unit.repeat(indent));
            }
            self.text.push(ch);
            self.at_line_start = ch == '\n';
        }
    }
}

struct FunctionBuf {
    signature: String,
    prologue: Buf,
    body: Buf,
    epilogue: Buf,
    seen_prologue_lines: HashSet<String>,
}

impl FunctionBuf {
    fn new(signature: String) -> Self {
        FunctionBuf {
            signature,
            prologue: Buf::new(),
            body: Buf::new(),
            epilogue: Buf::new(),
            seen_prologue_lines: HashSet::new(),
        }
    }
}

/// The multi-target text buffer. One `Emitter` lives for the whole translation unit: `globals`
/// accumulates typedefs and the global pointer table, while each function's prologue/body/
/// epilogue are buffered separately so a late-discovered local declaration (most commonly a loop
/// counter `TypeHelper::add_new_iterator_variable` hands out) can still land above the code that
/// uses it, as C89 requires.
pub struct Emitter {
    headers: BTreeSet<HeaderKey>,
    globals: Buf,
    current: Option<FunctionBuf>,
    finished_functions: Vec<FunctionBuf>,
    default_target: Target,
    indent: usize,
    indent_unit: String,
    global_pointers: Vec<String>,
    global_pointer_seen: HashSet<String>,
}

impl Default for Emitter {
    fn default() -> Self {
        Emitter {
            headers: BTreeSet::new(),
            globals: Buf::new(),
            current: None,
            finished_functions: Vec::new(),
            default_target: Target::Globals,
            indent: 0,
            indent_unit: " ".repeat(2),
            global_pointers: Vec::new(),
            global_pointer_seen: HashSet::new(),
        }
    }
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// An emitter whose indentation unit is `indent_width` spaces, per [`crate::config::Config`].
    pub fn with_indent_width(indent_width: usize) -> Self {
        Emitter {
            indent_unit: " ".repeat(indent_width),
            ..Self::default()
        }
    }

    pub fn emit_predefined_header(&mut self, header: HeaderKey) {
        self.headers.insert(header);
    }

    /// Appends `text` to `target`, indented at the current level. Falls back to `globals` if
    /// `target` names a function region but no function is open, which only happens while
    /// emitting top-level `main`-scope code before `begin_function` is called for it.
    pub fn emit(&mut self, text: &str, target: Target) {
        let indent = self.indent;
        let unit = self.indent_unit.clone();
        match (target, &mut self.current) {
            (Target::Globals, _) => self.globals.push(text, indent, &unit),
            (Target::FunctionPrologue, Some(func)) => func.prologue.push(text, indent, &unit),
            (Target::FunctionBody, Some(func)) => func.body.push(text, indent, &unit),
            (Target::FunctionEpilogue, Some(func)) => func.epilogue.push(text, indent, &unit),
            (_, None) => self.globals.push(text, indent, &unit),
        }
    }

    /// Emits to the currently open region, per `default_target` (set by `begin_function`/
    /// `begin_function_body`/`finalize_function`).
    pub fn emit_default(&mut self, text: &str) {
        self.emit(text, self.default_target);
    }

    /// Emits `text` as a line in the current function's prologue, once per unique line per
    /// function: used for loop-counter declarations that a nested block might otherwise ask for
    /// more than once.
    pub fn emit_once_to_beginning_of_function(&mut self, text: &str) {
        let unit = self.indent_unit.clone();
        let Some(func) = &mut self.current else {
            return;
        };
        if func.seen_prologue_lines.insert(text.to_string()) {
            func.prologue.push(text, 1, &unit);
        }
    }

    pub fn begin_function(&mut self, signature: impl Into<String>) {
        self.finish_current_function();
        self.current = Some(FunctionBuf::new(signature.into()));
        self.default_target = Target::FunctionPrologue;
    }

    pub fn begin_function_body(&mut self) {
        self.default_target = Target::FunctionBody;
    }

    pub fn finalize_function(&mut self) {
        self.default_target = Target::FunctionEpilogue;
    }

    fn finish_current_function(&mut self) {
        if let Some(func) = self.current.take() {
            self.finished_functions.push(func);
        }
        self.default_target = Target::Globals;
    }

    pub fn increase_indent(&mut self) {
        self.indent += 1;
    }

    pub fn decrease_indent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    /// Adds `name` to the global pointer table, if it isn't already registered. The table itself
    /// is declared lazily by `finalize`, once every escaping allocation for the whole unit is
    /// known.
    pub fn register_global_pointer(&mut self, name: &str) {
        if self.global_pointer_seen.insert(name.to_string()) {
            self.global_pointers.push(name.to_string());
        }
    }

    /// The nested-block `for` loop that frees every registered global pointer. Lives in its own
    /// braces so its loop counter satisfies C89's "declarations at the top of a block" rule
    /// without colliding with `main`'s own locals. `None` if nothing escaped.
    pub fn global_cleanup_code(&self) -> Option<String> {
        if self.global_pointers.is_empty() {
            return None;
        }
        let mut out = String::new();
        out.push_str("{\n");
        out.push_str("    int ts2c_cleanup_i;\n");
        out.push_str(&format!(
            "    for (ts2c_cleanup_i = 0; ts2c_cleanup_i < {}; ts2c_cleanup_i++) {{\n",
            self.global_pointers.len()
        ));
        out.push_str("        free(ts2c_global_pointers[ts2c_cleanup_i]);\n");
        out.push_str("    }\n");
        out.push_str("}\n");
        Some(out)
    }

    fn global_pointer_table_decl(&self) -> Option<String> {
        if self.global_pointers.is_empty() {
            return None;
        }
        Some(format!(
            "void *ts2c_global_pointers[{}];\n",
            self.global_pointers.len()
        ))
    }

    /// Concatenates everything emitted so far into the final C89 translation unit: headers,
    /// globals (including the pointer table if non-empty), then each function in the order it was
    /// opened, each as `signature {\n<prologue><body><epilogue>}\n`.
    pub fn finalize(mut self) -> String {
        self.finish_current_function();
        let mut out = String::new();
        for header in &self.headers {
            out.push_str(header.include_line());
            out.push('\n');
        }
        if !self.headers.is_empty() {
            out.push('\n');
        }
        out.push_str(&self.globals.text);
        if let Some(table) = self.global_pointer_table_decl() {
            out.push_str(&table);
        }
        if !self.globals.text.is_empty() || self.global_pointer_table_decl().is_some() {
            out.push('\n');
        }
        for func in &self.finished_functions {
            out.push_str(&func.signature);
            out.push_str(" {\n");
            out.push_str(&func.prologue.text);
            out.push_str(&func.body.text);
            out.push_str(&func.epilogue.text);
            out.push_str("}\n\n");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_are_deduplicated_and_ordered() {
        let mut emitter = Emitter::new();
        emitter.emit_predefined_header(HeaderKey::StdioH);
        emitter.emit_predefined_header(HeaderKey::StdlibH);
        emitter.emit_predefined_header(HeaderKey::StdioH);
        let out = emitter.finalize();
        assert_eq!(out.matches("#include <stdio.h>").count(), 1);
        let stdio_at = out.find("<stdio.h>").unwrap();
        let stdlib_at = out.find("<stdlib.h>").unwrap();
        assert!(stdio_at < stdlib_at);
    }

    #[test]
    fn function_regions_concatenate_in_order() {
        let mut emitter = Emitter::new();
        emitter.begin_function("int main(void)");
        emitter.emit_default("int16_t x;\n");
        emitter.begin_function_body();
        emitter.emit_default("x = 1;\n");
        emitter.finalize_function();
        emitter.emit_default("return 0;\n");
        let out = emitter.finalize();
        assert!(out.contains("int main(void) {\nint16_t x;\nx = 1;\nreturn 0;\n}"));
    }

    #[test]
    fn cleanup_loop_is_absent_when_nothing_escapes() {
        let emitter = Emitter::new();
        assert!(emitter.global_cleanup_code().is_none());
    }

    #[test]
    fn registered_pointers_produce_a_table_and_cleanup_loop() {
        let mut emitter = Emitter::new();
        emitter.register_global_pointer("a");
        emitter.register_global_pointer("b");
        emitter.register_global_pointer("a");
        let out = emitter.finalize();
        assert!(out.contains("void *ts2c_global_pointers[2];"));
    }

    #[test]
    fn nested_indentation_is_applied_per_line() {
        let mut emitter = Emitter::new();
        emitter.begin_function("int main(void)");
        emitter.begin_function_body();
        emitter.increase_indent();
        emitter.emit_default("if (x) {\n");
        emitter.increase_indent();
        emitter.emit_default("y = 1;\n");
        emitter.decrease_indent();
        emitter.emit_default("}\n");
        let out = emitter.finalize();
        assert!(out.contains("  if (x) {\n    y = 1;\n  }\n"));
    }
}
