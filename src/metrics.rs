// src/metrics.rs

//! Cyclomatic complexity from tree-sitter syntax trees.
//!
//! Every function node starts at 1 and is charged one point per decision
//! node found in its body. Nested functions and closures that the grammar
//! reports as functions are measured on their own and do not charge their
//! parent. `line_count` counts lines holding at least one non-comment token.

use crate::complexity::{FileMetrics, FunctionMetrics, MetricsError, MetricsProvider};
use tree_sitter::{Language, Node, Parser};

const ANONYMOUS: &str = "<anonymous>";

/// Node kinds that matter for one grammar
struct Rules {
    /// Function-like nodes; only counted when they carry a `body`
    functions: &'static [&'static str],
    /// Each occurrence adds one, except `default` switch labels
    decisions: &'static [&'static str],
    /// Nodes whose operator children are counted
    logic_parents: &'static [&'static str],
    logic_operators: &'static [&'static str],
}

const PYTHON: Rules = Rules {
    functions: &["function_definition"],
    decisions: &[
        "if_statement",
        "elif_clause",
        "for_statement",
        "while_statement",
        "except_clause",
        "conditional_expression",
        "case_clause",
        "for_in_clause",
        "if_clause",
    ],
    logic_parents: &["boolean_operator"],
    logic_operators: &["and", "or"],
};

const SCRIPT: Rules = Rules {
    functions: &[
        "function_declaration",
        "function_expression",
        "generator_function_declaration",
        "generator_function",
        "arrow_function",
        "method_definition",
    ],
    decisions: &[
        "if_statement",
        "for_statement",
        "for_in_statement",
        "while_statement",
        "do_statement",
        "switch_case",
        "catch_clause",
        "ternary_expression",
    ],
    logic_parents: &["binary_expression"],
    logic_operators: &["&&", "||", "??"],
};

const RUST: Rules = Rules {
    functions: &["function_item"],
    decisions: &["if_expression", "while_expression", "for_expression", "match_arm"],
    logic_parents: &["binary_expression"],
    logic_operators: &["&&", "||"],
};

const GO: Rules = Rules {
    functions: &["function_declaration", "method_declaration", "func_literal"],
    decisions: &["if_statement", "for_statement", "expression_case", "type_case", "communication_case"],
    logic_parents: &["binary_expression"],
    logic_operators: &["&&", "||"],
};

const JAVA: Rules = Rules {
    functions: &["method_declaration", "constructor_declaration", "lambda_expression"],
    decisions: &[
        "if_statement",
        "for_statement",
        "enhanced_for_statement",
        "while_statement",
        "do_statement",
        "catch_clause",
        "ternary_expression",
        "switch_label",
    ],
    logic_parents: &["binary_expression"],
    logic_operators: &["&&", "||"],
};

const C: Rules = Rules {
    functions: &["function_definition"],
    decisions: &[
        "if_statement",
        "for_statement",
        "while_statement",
        "do_statement",
        "case_statement",
        "conditional_expression",
    ],
    logic_parents: &["binary_expression"],
    logic_operators: &["&&", "||"],
};

const CPP: Rules = Rules {
    functions: &["function_definition", "lambda_expression"],
    decisions: &[
        "if_statement",
        "for_statement",
        "for_range_loop",
        "while_statement",
        "do_statement",
        "case_statement",
        "conditional_expression",
        "catch_clause",
    ],
    ..C
};

const CSHARP: Rules = Rules {
    functions: &[
        "method_declaration",
        "constructor_declaration",
        "local_function_statement",
        "lambda_expression",
    ],
    decisions: &[
        "if_statement",
        "for_statement",
        "foreach_statement",
        "while_statement",
        "do_statement",
        "catch_clause",
        "switch_section",
        "conditional_expression",
    ],
    logic_parents: &["binary_expression"],
    logic_operators: &["&&", "||", "??"],
};

fn grammar_for(path: &str) -> Option<(Language, &'static Rules)> {
    let ext = path.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase())?;
    let grammar = match ext.as_str() {
        "py" | "pyw" => (tree_sitter_python::LANGUAGE.into(), &PYTHON),
        "js" | "jsx" | "mjs" | "cjs" => (tree_sitter_javascript::LANGUAGE.into(), &SCRIPT),
        "ts" | "mts" | "cts" => (tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(), &SCRIPT),
        "tsx" => (tree_sitter_typescript::LANGUAGE_TSX.into(), &SCRIPT),
        "rs" => (tree_sitter_rust::LANGUAGE.into(), &RUST),
        "go" => (tree_sitter_go::LANGUAGE.into(), &GO),
        "java" => (tree_sitter_java::LANGUAGE.into(), &JAVA),
        "c" | "h" => (tree_sitter_c::LANGUAGE.into(), &C),
        "cc" | "cpp" | "cxx" | "hpp" | "hh" | "hxx" => (tree_sitter_cpp::LANGUAGE.into(), &CPP),
        "cs" => (tree_sitter_c_sharp::LANGUAGE.into(), &CSHARP),
        _ => return None,
    };
    Some(grammar)
}

/// [`MetricsProvider`] backed by tree-sitter grammars
#[derive(Debug, Default, Clone, Copy)]
pub struct SyntaxMetrics;

impl MetricsProvider for SyntaxMetrics {
    fn analyze(&self, path: &str, content: &str) -> Result<FileMetrics, MetricsError> {
        let (language, rules) = grammar_for(path).ok_or_else(|| MetricsError::Unsupported(path.to_string()))?;
        let failure = |message: String| MetricsError::Analysis { path: path.to_string(), message };

        let mut parser = Parser::new();
        parser.set_language(&language).map_err(|e| failure(e.to_string()))?;
        let tree = parser
            .parse(content, None)
            .ok_or_else(|| failure("parser returned no tree".to_string()))?;

        Ok(measure(rules, tree.root_node(), content.as_bytes()))
    }
}

fn measure(rules: &Rules, root: Node<'_>, source: &[u8]) -> FileMetrics {
    let mut functions: Vec<FunctionMetrics> = Vec::new();
    // (node id, index into `functions`) of the enclosing functions
    let mut scopes: Vec<(usize, usize)> = Vec::new();
    let mut code_rows = vec![false; root.end_position().row + 1];

    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        let is_comment = node.kind().contains("comment");

        if is_function(rules, &node) {
            functions.push(FunctionMetrics { name: function_name(&node, source), complexity: 1 });
            scopes.push((node.id(), functions.len() - 1));
        } else if let Some(&(_, idx)) = scopes.last() {
            functions[idx].complexity += weight(rules, &node);
        }

        if !is_comment && node.child_count() == 0 && node.start_byte() < node.end_byte() {
            mark_rows(&mut code_rows, &node);
        }

        if !is_comment && cursor.goto_first_child() {
            continue;
        }
        loop {
            if scopes.last().map_or(false, |&(id, _)| id == cursor.node().id()) {
                scopes.pop();
            }
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return FileMetrics {
                    functions,
                    line_count: code_rows.iter().filter(|&&code| code).count(),
                };
            }
        }
    }
}

fn is_function(rules: &Rules, node: &Node<'_>) -> bool {
    rules.functions.contains(&node.kind()) && node.child_by_field_name("body").is_some()
}

fn weight(rules: &Rules, node: &Node<'_>) -> u32 {
    let kind = node.kind();
    if !node.is_named() {
        return 0;
    }
    let mut walker = node.walk();
    if rules.decisions.contains(&kind) {
        let is_default = node.children(&mut walker).next().map_or(false, |c| c.kind() == "default");
        return u32::from(!is_default);
    }
    if rules.logic_parents.contains(&kind) {
        let operators = node
            .children(&mut walker)
            .filter(|c| rules.logic_operators.contains(&c.kind()))
            .count();
        return operators as u32;
    }
    0
}

fn function_name(node: &Node<'_>, source: &[u8]) -> String {
    let text = |n: Node<'_>| n.utf8_text(source).ok().map(str::to_string);

    if let Some(name) = node.child_by_field_name("name").and_then(text) {
        return name;
    }

    // C and C++ bury the name in nested declarators
    if let Some(mut declarator) = node.child_by_field_name("declarator") {
        while let Some(inner) = declarator.child_by_field_name("declarator") {
            declarator = inner;
        }
        if let Some(name) = text(declarator) {
            return name;
        }
    }

    // `const pick = (x) => ...`
    node.parent()
        .filter(|p| p.kind() == "variable_declarator")
        .and_then(|p| p.child_by_field_name("name"))
        .and_then(text)
        .unwrap_or_else(|| ANONYMOUS.to_string())
}

fn mark_rows(rows: &mut [bool], node: &Node<'_>) {
    let start = node.start_position();
    let end = node.end_position();
    let last = if end.column == 0 && end.row > start.row { end.row - 1 } else { end.row };
    for row in start.row..=last.min(rows.len().saturating_sub(1)) {
        rows[row] = true;
    }
}
