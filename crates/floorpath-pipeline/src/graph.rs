//! Navigation graph construction from a binary mask.
//!
//! Every walkable cell becomes a node (cells with no walkable neighbor
//! stay in the graph with degree 0) and every pair of 4-adjacent walkable
//! cells is joined by one undirected edge of weight [`EDGE_WEIGHT`].
//!
//! # Construction
//!
//! Building runs in two row-major passes over the mask:
//!
//! 1. Number the walkable cells in scan order. Node `i` is the `i`-th
//!    walkable cell, and a dense lookup table maps each cell to its node.
//! 2. Discover edges. Each walkable cell emits at most two edges, to its
//!    right and lower neighbors, so every edge is produced exactly once
//!    and no deduplication is needed. The rows are split into bands that
//!    are scanned independently into preallocated buffers; a band reads
//!    one row past its end to find the vertical edges that cross into
//!    the next band.
//!
//! Bands are merged in row order, so the resulting graph (node and edge
//! indices included) is identical whether the bands ran on one thread or
//! on the rayon pool (`parallel` feature).

use std::ops::Range;

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use crate::binarize::{BinaryMask, WALKABLE};
use crate::types::{Dimensions, GridPoint};

/// Weight of every edge in the navigation graph.
pub const EDGE_WEIGHT: u8 = 1;

/// Lookup-table entry for cells that are not nodes.
const NO_NODE: u32 = u32::MAX;

/// Bands shorter than this are not worth a separate task.
const MIN_BAND_ROWS: usize = 64;

/// An edge as a pair of node indices.
type EdgePair = (u32, u32);

/// Undirected grid graph over the walkable cells of a mask.
#[derive(Debug, Clone)]
pub struct NavigationGraph {
    graph: UnGraph<GridPoint, u8>,
    lookup: Vec<u32>,
    dimensions: Dimensions,
}

impl NavigationGraph {
    /// Number of nodes (walkable cells).
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of undirected edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Dimensions of the mask the graph was built from.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// The node for `point`, or `None` if the cell is out of bounds or
    /// blocked.
    #[must_use]
    pub fn node_at(&self, point: GridPoint) -> Option<NodeIndex> {
        if !point.is_within(self.dimensions) {
            return None;
        }
        let cell = point.row as usize * self.dimensions.width as usize + point.col as usize;
        match self.lookup[cell] {
            NO_NODE => None,
            ix => Some(NodeIndex::new(ix as usize)),
        }
    }

    /// Returns `true` if `point` is a node of the graph.
    #[must_use]
    pub fn contains(&self, point: GridPoint) -> bool {
        self.node_at(point).is_some()
    }

    /// The cell a node stands for.
    ///
    /// # Panics
    ///
    /// Panics if `node` does not belong to this graph.
    #[must_use]
    pub fn point(&self, node: NodeIndex) -> GridPoint {
        self.graph[node]
    }

    /// Walkable 4-neighbors of `point` (empty if `point` is not a node).
    pub fn neighbors(&self, point: GridPoint) -> impl Iterator<Item = GridPoint> + '_ {
        self.node_at(point)
            .into_iter()
            .flat_map(|ix| self.graph.neighbors(ix))
            .map(|n| self.graph[n])
    }

    /// Returns `true` if an edge joins `a` and `b`.
    #[must_use]
    pub fn has_edge(&self, a: GridPoint, b: GridPoint) -> bool {
        match (self.node_at(a), self.node_at(b)) {
            (Some(a), Some(b)) => self.graph.find_edge(a, b).is_some(),
            _ => false,
        }
    }

    /// Every edge as a `(cell, cell)` pair, in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (GridPoint, GridPoint)> + '_ {
        self.graph
            .edge_references()
            .map(|e| (self.graph[e.source()], self.graph[e.target()]))
    }

    /// The underlying petgraph graph (node weights are cells).
    #[must_use]
    pub const fn inner(&self) -> &UnGraph<GridPoint, u8> {
        &self.graph
    }
}

/// Build the navigation graph for `mask`.
///
/// An all-blocked mask yields an empty graph. With the `parallel` feature
/// the edge scan is split into one band per rayon worker.
#[must_use]
pub fn build_graph(mask: &BinaryMask) -> NavigationGraph {
    build_graph_with_bands(mask, default_band_count())
}

/// Build the navigation graph scanning at most `bands` row bands.
///
/// The result does not depend on `bands`; this entry point exists for
/// callers that size their own thread usage.
#[must_use]
pub fn build_graph_with_bands(mask: &BinaryMask, bands: usize) -> NavigationGraph {
    let dimensions = mask.dimensions();
    let width = dimensions.width as usize;
    let height = dimensions.height as usize;
    let cells = mask.cells();

    let walkable = mask.walkable_count();
    let mut graph = UnGraph::with_capacity(walkable, 2 * walkable);
    let lookup = number_nodes(cells, width, &mut graph);

    let ranges = row_bands(height, bands);
    let parts = scan_bands(cells, &lookup, width, height, &ranges);
    for part in &parts {
        for &(a, b) in part {
            graph.add_edge(
                NodeIndex::new(a as usize),
                NodeIndex::new(b as usize),
                EDGE_WEIGHT,
            );
        }
    }

    log::debug!(
        "navigation graph: {}x{} mask, {} nodes, {} edges, {} bands",
        dimensions.width,
        dimensions.height,
        graph.node_count(),
        graph.edge_count(),
        ranges.len(),
    );

    NavigationGraph {
        graph,
        lookup,
        dimensions,
    }
}

/// Add one node per walkable cell in row-major order and return the
/// cell-to-node lookup table.
#[allow(clippy::cast_possible_truncation)]
fn number_nodes(cells: &[u8], width: usize, graph: &mut UnGraph<GridPoint, u8>) -> Vec<u32> {
    let mut lookup = vec![NO_NODE; cells.len()];
    if width == 0 {
        return lookup;
    }
    for (cell, (&value, slot)) in cells.iter().zip(lookup.iter_mut()).enumerate() {
        if value == WALKABLE {
            // Mask dimensions are u32, so row and col fit; the decoder's
            // allocation limit keeps node counts below NO_NODE.
            let point = GridPoint::new((cell / width) as u32, (cell % width) as u32);
            *slot = graph.add_node(point).index() as u32;
        }
    }
    lookup
}

fn default_band_count() -> usize {
    #[cfg(feature = "parallel")]
    {
        rayon::current_num_threads()
    }
    #[cfg(not(feature = "parallel"))]
    {
        1
    }
}

/// Split `0..height` into at most `bands` contiguous row ranges of at
/// least [`MIN_BAND_ROWS`] rows (except when the image is shorter).
pub(crate) fn row_bands(height: usize, bands: usize) -> Vec<Range<usize>> {
    if height == 0 {
        return Vec::new();
    }
    let max_bands = height.div_ceil(MIN_BAND_ROWS);
    let count = bands.clamp(1, max_bands);
    let rows_per_band = height.div_ceil(count);
    (0..height)
        .step_by(rows_per_band)
        .map(|start| start..(start + rows_per_band).min(height))
        .collect()
}

#[cfg(feature = "parallel")]
fn scan_bands(
    cells: &[u8],
    lookup: &[u32],
    width: usize,
    height: usize,
    ranges: &[Range<usize>],
) -> Vec<Vec<EdgePair>> {
    use rayon::prelude::*;

    ranges
        .par_iter()
        .map(|rows| scan_band(cells, lookup, width, height, rows.clone()))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn scan_bands(
    cells: &[u8],
    lookup: &[u32],
    width: usize,
    height: usize,
    ranges: &[Range<usize>],
) -> Vec<Vec<EdgePair>> {
    ranges
        .iter()
        .map(|rows| scan_band(cells, lookup, width, height, rows.clone()))
        .collect()
}

/// Emit the right and down edges of every walkable cell in `rows`.
///
/// Reads row `rows.end` (if any) for the down edges of the band's last
/// row.
pub(crate) fn scan_band(
    cells: &[u8],
    lookup: &[u32],
    width: usize,
    height: usize,
    rows: Range<usize>,
) -> Vec<EdgePair> {
    let band = &cells[rows.start * width..rows.end * width];
    // Each walkable cell emits at most two edges.
    let capacity = 2 * band.iter().filter(|&&v| v == WALKABLE).count();
    let mut edges = Vec::with_capacity(capacity);

    for r in rows {
        let start = r * width;
        let row = &cells[start..start + width];
        let below = (r + 1 < height).then(|| &cells[start + width..start + 2 * width]);

        for c in 0..width {
            if row[c] != WALKABLE {
                continue;
            }
            let here = lookup[start + c];
            if c + 1 < width && row[c + 1] == WALKABLE {
                edges.push((here, lookup[start + c + 1]));
            }
            if let Some(below) = below
                && below[c] == WALKABLE
            {
                edges.push((here, lookup[start + width + c]));
            }
        }
    }
    log::trace!("band scan emitted {} edges", edges.len());
    edges
}
