//! Shortest-path search over the navigation graph.
//!
//! A* via [`petgraph::algo::astar`] with unit edge costs and the Euclidean
//! distance to the goal as the estimate. Euclidean distance never exceeds
//! the number of 4-neighbor steps still needed, so the estimate is
//! admissible and consistent and the returned path has the minimum number
//! of steps.
//!
//! Ties in the open set are resolved by petgraph's binary heap, which
//! depends only on the graph and the order nodes are pushed. The graph
//! builder fixes that order, so the same mask always yields the same path.

use petgraph::algo::astar;
use petgraph::graph::NodeIndex;

use crate::graph::NavigationGraph;
use crate::types::{GridPath, GridPoint, NodeIssue, PathError};

/// Resolve a requested cell to its graph node.
///
/// # Errors
///
/// Returns [`PathError::InvalidNode`] with [`NodeIssue::OutOfBounds`] for
/// cells outside the image and [`NodeIssue::Blocked`] for cells that are
/// not walkable.
pub fn resolve_node(graph: &NavigationGraph, point: GridPoint) -> Result<NodeIndex, PathError> {
    let dimensions = graph.dimensions();
    if !point.is_within(dimensions) {
        return Err(PathError::InvalidNode {
            point,
            issue: NodeIssue::OutOfBounds {
                width: dimensions.width,
                height: dimensions.height,
            },
        });
    }
    graph.node_at(point).ok_or(PathError::InvalidNode {
        point,
        issue: NodeIssue::Blocked,
    })
}

/// Find a minimum-step path from `start` to `end`.
///
/// `start == end` yields the single-cell path `[start]`.
///
/// # Errors
///
/// Returns [`PathError::InvalidNode`] if either cell is out of bounds or
/// blocked (start is checked first), and [`PathError::NoPathFound`] if
/// they lie in different walkable regions.
pub fn shortest_path(
    graph: &NavigationGraph,
    start: GridPoint,
    end: GridPoint,
) -> Result<GridPath, PathError> {
    let start_ix = resolve_node(graph, start)?;
    let end_ix = resolve_node(graph, end)?;

    if start_ix == end_ix {
        return Ok(GridPath::new(vec![start]));
    }

    let inner = graph.inner();
    let (cost, nodes) = astar(
        inner,
        start_ix,
        |n| n == end_ix,
        |e| f64::from(*e.weight()),
        |n| inner[n].distance(end),
    )
    .ok_or(PathError::NoPathFound { start, end })?;

    log::debug!(
        "route {start} -> {end}: {} cells, cost {cost}",
        nodes.len()
    );

    Ok(GridPath::new(nodes.into_iter().map(|n| inner[n]).collect()))
}
