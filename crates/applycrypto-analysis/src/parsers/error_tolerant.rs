//! Syntax-fault summary for trees tree-sitter recovered from.

use tree_sitter::{Node, TreeCursor};

/// ERROR and MISSING nodes found in one tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyntaxFaults {
    pub count: u32,
    /// 1-based line of the first fault in document order.
    pub first_line: Option<u32>,
}

impl SyntaxFaults {
    pub fn is_clean(&self) -> bool {
        self.count == 0
    }

    /// Human-readable summary for `ParseResult::error_detail`.
    pub fn detail(&self) -> Option<String> {
        self.first_line
            .map(|line| format!("{} syntax error(s), first at line {}", self.count, line))
    }
}

/// Walk only the subtrees that contain a fault.
pub fn syntax_faults(root: Node) -> SyntaxFaults {
    let mut faults = SyntaxFaults::default();
    if !root.has_error() {
        return faults;
    }
    let mut cursor = root.walk();
    visit(&mut cursor, &mut faults);
    faults
}

fn visit(cursor: &mut TreeCursor, faults: &mut SyntaxFaults) {
    let node = cursor.node();
    if node.is_error() || node.is_missing() {
        faults.count += 1;
        faults.first_line.get_or_insert(node.start_position().row as u32 + 1);
    }
    if !cursor.goto_first_child() {
        return;
    }
    loop {
        let child = cursor.node();
        if child.has_error() || child.is_missing() {
            visit(cursor, faults);
        }
        if !cursor.goto_next_sibling() {
            break;
        }
    }
    cursor.goto_parent();
}
