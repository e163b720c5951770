use std::fmt::Write;

use crate::node::Node;

/// Indented dump of a tree with 0-based display coordinates, for debugging
/// and test snapshots. Node spans print as `(line, col) -> (line, col)`,
/// tokens as `(line, col->end_col)`; a node with no position prints line -1.
pub fn dump_tree(origin: &Node) -> String {
    let mut out = String::new();
    dump_node(origin, 0, &mut out);
    // Drop the final newline so the dump embeds cleanly in snapshots.
    out.truncate(out.trim_end_matches('\n').len());
    out
}

fn dump_node(node: &Node, level: usize, out: &mut String) {
    let indent = "  ".repeat(level);
    let span = node.span();
    let _ = writeln!(
        out,
        "{indent}{}  ({}, {}) -> ({}, {})",
        node.tag,
        i64::from(span.start.line) - 1,
        span.start.col,
        i64::from(span.end.line) - 1,
        span.end.col,
    );
    for token in &node.tokens {
        let _ = writeln!(
            out,
            "{indent}  - {:?} {:?}  ({}, {}->{})",
            token.kind,
            token.value,
            i64::from(token.line) - 1,
            token.col,
            token.end_col(),
        );
    }
    for child in &node.children {
        dump_node(child, level + 1, out);
    }
}
