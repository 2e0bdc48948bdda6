//! # Codeview Syntax
//!
//! Syntax modes and highlighting for the code viewer.
//!
//! A *mode* is the name a page gives to a highlighting grammar: either an
//! explicit name such as `python`, or a bare file extension such as `rs`.
//! [`Grammar::from_mode`] resolves both spellings to the same tree-sitter
//! grammar. Modes without a bundled grammar are still valid modes; they just
//! render as plain text.
//!
//! Highlighting walks the parse tree and classifies nodes one grammar at a
//! time: anonymous nodes by the grammar's keyword table, named nodes by kind,
//! and identifiers by the field they fill in their parent (a function's name,
//! the callee of a call).

use tree_sitter::{Language, Node, Parser, Tree};

/// Errors that can occur during syntax highlighting.
#[derive(Debug, thiserror::Error)]
pub enum SyntaxError {
    #[error("Unknown syntax mode: {0}")]
    UnknownMode(String),

    #[error("Grammar {0:?} could not be loaded")]
    GrammarLoad(Grammar),

    #[error("Parser produced no tree")]
    ParseError,
}

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "pub",
    "ref", "return", "static", "struct", "super", "trait", "type", "unsafe", "use", "where",
    "while",
];

const JAVASCRIPT_KEYWORDS: &[&str] = &[
    "async", "await", "break", "case", "catch", "class", "const", "continue", "default",
    "delete", "else", "export", "extends", "finally", "for", "from", "function", "if",
    "import", "in", "instanceof", "let", "new", "of", "return", "switch", "throw", "try",
    "typeof", "var", "void", "while", "yield",
];

const PYTHON_KEYWORDS: &[&str] = &[
    "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del",
    "elif", "else", "except", "finally", "for", "from", "global", "if", "import", "in", "is",
    "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try", "while", "with",
    "yield",
];

const OPERATORS: &[&str] = &[
    "=", "==", "!=", "===", "!==", "<", ">", "<=", ">=", "+", "-", "*", "/", "%", "&&", "||",
    "+=", "-=", "*=", "/=", "=>", "->", "**",
];

/// The grammars bundled with the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grammar {
    Rust,
    JavaScript,
    Python,
    Json,
}

impl Grammar {
    /// Resolves a mode name or file extension to a bundled grammar.
    ///
    /// Matching ignores ASCII case, so `RS` and `rs` are the same mode.
    pub fn from_mode(mode: &str) -> Option<Self> {
        match mode.to_ascii_lowercase().as_str() {
            "rust" | "rs" => Some(Grammar::Rust),
            "javascript" | "js" | "jsx" | "mjs" | "cjs" => Some(Grammar::JavaScript),
            "python" | "py" | "pyw" => Some(Grammar::Python),
            "json" => Some(Grammar::Json),
            _ => None,
        }
    }

    /// Canonical mode name for this grammar.
    pub fn name(&self) -> &'static str {
        match self {
            Grammar::Rust => "rust",
            Grammar::JavaScript => "javascript",
            Grammar::Python => "python",
            Grammar::Json => "json",
        }
    }

    /// Returns every bundled grammar.
    pub fn all() -> &'static [Grammar] {
        &[
            Grammar::Rust,
            Grammar::JavaScript,
            Grammar::Python,
            Grammar::Json,
        ]
    }

    fn language(&self) -> Language {
        match self {
            Grammar::Rust => tree_sitter_rust::LANGUAGE.into(),
            Grammar::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Grammar::Python => tree_sitter_python::LANGUAGE.into(),
            Grammar::Json => tree_sitter_json::LANGUAGE.into(),
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Grammar::Rust => RUST_KEYWORDS,
            Grammar::JavaScript => JAVASCRIPT_KEYWORDS,
            Grammar::Python => PYTHON_KEYWORDS,
            Grammar::Json => &[],
        }
    }

    /// Classifies one node of a tree produced by this grammar.
    fn classify(&self, node: Node) -> HighlightKind {
        let kind = node.kind();
        if !node.is_named() {
            if self.keywords().contains(&kind) {
                return HighlightKind::Keyword;
            }
            if OPERATORS.contains(&kind) {
                return HighlightKind::Operator;
            }
            return HighlightKind::None;
        }

        if names_function(node) {
            return HighlightKind::Function;
        }

        match (self, kind) {
            (_, "comment" | "line_comment" | "block_comment") => HighlightKind::Comment,

            (Grammar::Rust, "string_literal" | "raw_string_literal" | "char_literal") => {
                HighlightKind::String
            }
            (Grammar::Rust, "integer_literal" | "float_literal") => HighlightKind::Number,
            (Grammar::Rust, "boolean_literal") => HighlightKind::Constant,
            (Grammar::Rust, "self" | "mutable_specifier") => HighlightKind::Keyword,
            (Grammar::Rust, "primitive_type" | "type_identifier") => HighlightKind::Type,
            (Grammar::Rust, "attribute_item" | "inner_attribute_item") => HighlightKind::Attribute,
            (Grammar::Rust, "field_identifier") => HighlightKind::Property,

            (Grammar::JavaScript, "string" | "template_string") => HighlightKind::String,
            (Grammar::JavaScript, "number") => HighlightKind::Number,
            (Grammar::JavaScript, "true" | "false" | "null" | "undefined") => {
                HighlightKind::Constant
            }
            (Grammar::JavaScript, "this" | "super") => HighlightKind::Keyword,
            (
                Grammar::JavaScript,
                "property_identifier" | "shorthand_property_identifier",
            ) => HighlightKind::Property,

            (Grammar::Python, "string") => HighlightKind::String,
            (Grammar::Python, "integer" | "float") => HighlightKind::Number,
            (Grammar::Python, "true" | "false" | "none") => HighlightKind::Constant,
            (Grammar::Python, "decorator") => HighlightKind::Attribute,

            (Grammar::Json, "string") if is_object_key(node) => HighlightKind::Property,
            (Grammar::Json, "string") => HighlightKind::String,
            (Grammar::Json, "number") => HighlightKind::Number,
            (Grammar::Json, "true" | "false" | "null") => HighlightKind::Constant,

            _ => HighlightKind::None,
        }
    }
}

/// Whether `node` is the name of a function definition or the callee of a
/// call.
fn names_function(node: Node) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    let field = match parent.kind() {
        "function_item" | "function_definition" | "function_declaration"
        | "method_definition" => "name",
        "call_expression" | "call" => "function",
        "macro_invocation" => "macro",
        _ => return false,
    };
    parent.child_by_field_name(field) == Some(node)
}

fn is_object_key(node: Node) -> bool {
    node.parent()
        .filter(|parent| parent.kind() == "pair")
        .and_then(|pair| pair.child_by_field_name("key"))
        == Some(node)
}

/// A syntax highlighter for a single grammar.
pub struct Highlighter {
    parser: Parser,
    grammar: Grammar,
    tree: Option<Tree>,
}

impl Highlighter {
    /// Creates a new highlighter for a grammar.
    pub fn new(grammar: Grammar) -> Result<Self, SyntaxError> {
        let mut parser = Parser::new();
        parser
            .set_language(&grammar.language())
            .map_err(|_| SyntaxError::GrammarLoad(grammar))?;

        Ok(Self {
            parser,
            grammar,
            tree: None,
        })
    }

    /// Creates a highlighter for a mode name or file extension.
    pub fn for_mode(mode: &str) -> Result<Self, SyntaxError> {
        let grammar =
            Grammar::from_mode(mode).ok_or_else(|| SyntaxError::UnknownMode(mode.to_string()))?;
        Self::new(grammar)
    }

    /// Parses source code from scratch.
    ///
    /// Viewer content is always replaced as a whole, so the previous tree
    /// is discarded instead of being edited incrementally.
    pub fn parse(&mut self, source: &str) -> Result<(), SyntaxError> {
        self.tree = None;
        let tree = self
            .parser
            .parse(source, None)
            .ok_or(SyntaxError::ParseError)?;
        tracing::trace!("Parsed {} bytes as {}", source.len(), self.grammar.name());
        self.tree = Some(tree);
        Ok(())
    }

    /// Returns syntax highlights for the last parsed source.
    ///
    /// Spans are emitted parent first, so a later span overrides an
    /// earlier one that encloses it.
    pub fn highlight(&self) -> Vec<HighlightSpan> {
        let Some(tree) = &self.tree else {
            return Vec::new();
        };

        let mut spans = Vec::new();
        let mut cursor = tree.walk();
        // Pre-order walk without recursion
        loop {
            let node = cursor.node();
            let kind = self.grammar.classify(node);
            if kind != HighlightKind::None {
                spans.push(HighlightSpan {
                    start: node.start_byte(),
                    end: node.end_byte(),
                    kind,
                });
            }

            if cursor.goto_first_child() || cursor.goto_next_sibling() {
                continue;
            }
            loop {
                if !cursor.goto_parent() {
                    return spans;
                }
                if cursor.goto_next_sibling() {
                    break;
                }
            }
        }
    }
}

/// A byte range of source and how to color it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightSpan {
    pub start: usize,
    pub end: usize,
    pub kind: HighlightKind,
}

/// Types of syntax elements for highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HighlightKind {
    Keyword,
    String,
    Number,
    Comment,
    Function,
    Type,
    Constant,
    Operator,
    Attribute,
    Property,
    None,
}

/// Returns the canonical names of every bundled grammar.
pub fn supported_modes() -> Vec<&'static str> {
    Grammar::all().iter().map(Grammar::name).collect()
}
