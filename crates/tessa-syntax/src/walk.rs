use std::sync::Arc;

use crate::node::Node;

/// Depth-first pre-order traversal of every node below `origin`.
///
/// The visitor receives the ancestor stack relative to `origin` (the origin
/// itself is not part of the stack) followed by the visited node, in
/// document encounter order. Returning `Err` aborts the walk immediately and
/// propagates, which is how cooperative cancellation travels through long
/// traversals.
pub fn try_visit<E, F>(origin: &Node, visit: &mut F) -> Result<(), E>
where
    F: FnMut(&[Arc<Node>], &Arc<Node>) -> Result<(), E>,
{
    let mut stack = Vec::new();
    walk(origin, &mut stack, visit)
}

fn walk<E, F>(node: &Node, stack: &mut Vec<Arc<Node>>, visit: &mut F) -> Result<(), E>
where
    F: FnMut(&[Arc<Node>], &Arc<Node>) -> Result<(), E>,
{
    for child in &node.children {
        visit(stack, child)?;
        stack.push(Arc::clone(child));
        let result = walk(child, stack, visit);
        stack.pop();
        result?;
    }
    Ok(())
}
