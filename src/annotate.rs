//! Offline hint annotation.
//!
//! Every node gets one `LB` value per child move: `pt:o` when some line
//! through that child reaches a comment marking the solution as correct,
//! `pt:x` otherwise. The result is a new tree; the input is not modified.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::constants::{CORRECT_MARKER, HINT_CORRECT, HINT_INCORRECT};
use crate::error::TreeError;
use crate::tree::{GameTree, NodeId};

/// Whether a comment declares the line correct.
///
/// Matching is case-insensitive and only counts "correct" at the start of a
/// word, so "Correct!" and "correctly" match but "incorrect" does not.
pub fn is_correct_comment(comment: &str) -> bool {
    let lower = comment.to_lowercase();
    lower.match_indices(CORRECT_MARKER).any(|(i, _)| {
        !lower[..i]
            .chars()
            .next_back()
            .is_some_and(char::is_alphanumeric)
    })
}

/// True if `id` or any descendant carries a correct comment.
pub fn leads_to_correct(tree: &GameTree, id: NodeId) -> Result<bool, TreeError> {
    let mut stack = vec![id];
    while let Some(next) = stack.pop() {
        let node = tree.get(next)?;
        if node.data.comment.as_deref().is_some_and(is_correct_comment) {
            return Ok(true);
        }
        stack.extend(node.children.iter().copied());
    }
    Ok(false)
}

/// Compute [`leads_to_correct`] for every node in one post-order pass.
pub fn correct_subtrees(tree: &GameTree) -> HashMap<NodeId, bool> {
    let order: Vec<_> = tree.iter().map(|n| n.id).collect();
    let mut result = HashMap::with_capacity(order.len());
    for id in order.into_iter().rev() {
        let Ok(node) = tree.get(id) else {
            continue;
        };
        let own = node.data.comment.as_deref().is_some_and(is_correct_comment);
        // pre-order reversed visits children before their parent
        let any_child = node
            .children
            .iter()
            .any(|c| result.get(c).copied().unwrap_or(false));
        result.insert(id, own || any_child);
    }
    result
}

/// Hint labels for the children of `id`; children without a move are skipped.
pub fn label_children(tree: &GameTree, id: NodeId) -> Result<Vec<String>, TreeError> {
    let mut labels = Vec::new();
    for child in tree.children(id)? {
        let Some(mv) = tree.get(*child)?.data.mv.as_ref() else {
            continue;
        };
        let mark = if leads_to_correct(tree, *child)? { HINT_CORRECT } else { HINT_INCORRECT };
        labels.push(format!("{}:{mark}", mv.point));
    }
    Ok(labels)
}

/// Return a copy of `tree` with hint labels appended to every node.
pub fn annotate(tree: &GameTree) -> Result<GameTree, TreeError> {
    let correct = correct_subtrees(tree);
    let (annotated, count) = tree.mutate(|draft| {
        let mut count = 0usize;
        for node in tree.iter() {
            for child in &node.children {
                let Some(mv) = tree.get(*child)?.data.mv.as_ref() else {
                    continue;
                };
                let mark = if correct.get(child).copied().unwrap_or(false) {
                    HINT_CORRECT
                } else {
                    HINT_INCORRECT
                };
                draft.add_to_property(node.id, "LB", format!("{}:{mark}", mv.point))?;
                count += 1;
            }
            debug!(node = %node.id, "labelled node");
        }
        Ok(count)
    })?;
    info!(labels = count, "finished labelling tree");
    Ok(annotated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_comment_matching() {
        assert!(is_correct_comment("Correct!"));
        assert!(is_correct_comment("That is CORRECT."));
        assert!(is_correct_comment("correctly played"));
        assert!(!is_correct_comment("incorrect, try again"));
        assert!(!is_correct_comment("Wrong."));
        assert!(is_correct_comment("incorrect? no, correct"));
    }

    #[test]
    fn test_scenario_two_children() {
        let tree = GameTree::parse("(;AB[aa](;B[dd]C[incorrect, try again])(;B[pd]C[Correct!]))").unwrap();
        let root = tree.root();
        assert!(!leads_to_correct(&tree, root.children[0]).unwrap());
        assert!(leads_to_correct(&tree, root.children[1]).unwrap());
        assert_eq!(label_children(&tree, root.id).unwrap(), vec!["dd:x", "pd:o"]);

        let annotated = annotate(&tree).unwrap();
        assert_eq!(annotated.root().data.labels, vec!["dd:x", "pd:o"]);
        assert!(tree.root().data.labels.is_empty());
    }

    #[test]
    fn test_deep_correct_leaf() {
        let tree = GameTree::parse("(;AB[aa];B[bb](;W[cc];B[dd]C[correct])(;W[ee];B[ff]))").unwrap();
        let b = tree.root().children[0];
        let annotated = annotate(&tree).unwrap();
        assert_eq!(annotated.get(b).unwrap().data.labels, vec!["cc:o", "ee:x"]);
        assert_eq!(annotated.root().data.labels, vec!["bb:o"]);
        assert_eq!(annotated.len(), tree.len());
    }

    #[test]
    fn test_memoized_pass_agrees() {
        let tree = GameTree::parse(
            "(;AB[aa](;B[bb](;W[cc]C[Correct])(;W[dd]))(;B[ee];W[ff];B[gg]C[wrong])(;B[hh]C[correct]))",
        )
        .unwrap();
        let memo = correct_subtrees(&tree);
        for node in tree.iter() {
            assert_eq!(memo[&node.id], leads_to_correct(&tree, node.id).unwrap(), "{}", node.id);
        }
    }

    #[test]
    fn test_moveless_children_skipped() {
        let tree = GameTree::parse("(;AB[aa](;C[note])(;B[bb]C[correct]))").unwrap();
        assert_eq!(label_children(&tree, tree.root_id()).unwrap(), vec!["bb:o"]);
    }

    #[test]
    fn test_annotated_roundtrips_through_sgf() {
        let tree = GameTree::parse("(;GM[1]SZ[19]AB[aa](;B[dd]C[no])(;B[pd]C[Correct!]))").unwrap();
        let text = annotate(&tree).unwrap().to_sgf();
        let reparsed = GameTree::parse(&text).unwrap();
        assert_eq!(reparsed.root().data.labels, vec!["dd:x", "pd:o"]);
        assert_eq!(reparsed.root().data.values("SZ"), vec!["19"]);
        assert_eq!(reparsed.root().data.add_black, vec!["aa"]);
        assert_eq!(reparsed.len(), tree.len());
    }
}
