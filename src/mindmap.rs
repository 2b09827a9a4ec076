//! Mind map node defaults, two-click edge selection and graph queries.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::models::{Id, MindMapEdge, MindMapNode, NewEdge, NewNode, NodeDraft, Position};

/// Colours handed to nodes created without one.
pub const PALETTE: [&str; 5] = ["#6C5CE7", "#00B894", "#FF6B6B", "#FDCB6E", "#E056FD"];

pub fn random_color<R: Rng + ?Sized>(rng: &mut R) -> String {
    PALETTE
        .choose(rng)
        .copied()
        .unwrap_or(PALETTE[0])
        .to_string()
}

/// A point inside the default 400x200 drop area offset by (100, 100).
pub fn random_position<R: Rng + ?Sized>(rng: &mut R) -> Position {
    Position {
        x: rng.gen_range(100.0..500.0),
        y: rng.gen_range(100.0..300.0),
    }
}

/// Fill in whatever layout the client left out.
pub fn place<R: Rng + ?Sized>(draft: NodeDraft, rng: &mut R) -> NewNode {
    let position = draft.position.unwrap_or_else(|| random_position(rng));
    let color = draft.color.unwrap_or_else(|| random_color(rng));
    NewNode {
        title: draft.title,
        parent_id: draft.parent_id,
        position,
        color: Some(color),
        task_id: draft.task_id,
    }
}

/// Two-click edge creation: the first node arms the selection, a second,
/// different node produces an edge from the first to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeSelection {
    armed: Option<Id>,
}

impl EdgeSelection {
    pub fn armed(&self) -> Option<Id> {
        self.armed
    }

    /// Selecting the armed node again keeps it armed.
    pub fn select(&mut self, node: Id) -> Option<NewEdge> {
        match self.armed {
            Some(source) if source != node => {
                self.armed = None;
                Some(NewEdge {
                    source_id: source,
                    target_id: node,
                })
            }
            _ => {
                self.armed = Some(node);
                None
            }
        }
    }

    pub fn clear(&mut self) {
        self.armed = None;
    }
}

pub fn children(nodes: &[MindMapNode], parent: Id) -> Vec<&MindMapNode> {
    nodes
        .iter()
        .filter(|node| node.parent_id == Some(parent))
        .collect()
}

/// Targets reachable in one step from `node`, in edge order. Duplicates are
/// kept since the graph allows parallel edges.
pub fn outgoing(edges: &[MindMapEdge], node: Id) -> Vec<Id> {
    edges
        .iter()
        .filter(|edge| edge.source_id == node)
        .map(|edge| edge.target_id)
        .collect()
}
