//! Breaking a template page with data-dependent heights into physical pages.
//!
//! Each schema contributes one node per height (a table contributes its header
//! or `0` placeholder plus one node per data row). Schemas that grow or shrink
//! push everything starting at or below their original bottom edge by the
//! difference. Nodes that cross the bottom padding move to the top of the next
//! page together with everything after them, and the nodes of one schema on
//! one page merge back into a single instance.

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use stencil_template_core::{BodyRange, PageGeometry, Schema};

// Tolerance for floating point noise when comparing positions.
const EPSILON: f64 = 0.01;

/// How the heights of a split-able schema map onto table rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSplit {
    /// Data row index of the first row the template instance renders.
    pub first_row: usize,
    /// Whether height 0 is the real header (`true`) or a placeholder.
    pub show_head: bool,
    /// Repeat the header at the top of every continuation page.
    pub repeat_head: bool,
}

/// A template schema with its measured heights.
#[derive(Debug, Clone)]
pub struct PlannedSchema<'a> {
    pub schema: &'a Schema,
    pub heights: Vec<f64>,
    pub rows: Option<RowSplit>,
}

impl<'a> PlannedSchema<'a> {
    /// A schema whose height is fixed by the template.
    pub fn fixed(schema: &'a Schema) -> Self {
        Self {
            schema,
            heights: vec![schema.height],
            rows: None,
        }
    }

    fn total_height(&self) -> f64 {
        self.heights.iter().sum()
    }
}

#[derive(Debug, Clone, Copy)]
struct Node {
    schema: usize,
    index: usize,
    y: f64,
    height: f64,
}

/// Whether a node of `height` starting at `y` crosses the content bottom.
fn overflows(y: f64, height: f64, content_bottom: f64) -> bool {
    y + height > content_bottom + EPSILON
}

/// Lays out `planned` (one template page, declaration order) onto as many
/// physical pages as needed. Returns at least one page; schemas on each page
/// are in declaration order.
pub fn paginate(planned: &[PlannedSchema], page: &PageGeometry) -> Vec<Vec<Schema>> {
    let changed = planned
        .iter()
        .any(|p| (p.total_height() - p.schema.height).abs() > EPSILON);
    if !changed {
        return vec![planned.iter().map(|p| p.schema.clone()).collect()];
    }

    let nodes = build_long_page(planned);
    let pages = break_into_pages(nodes, planned, page);
    log::debug!(
        "Paginated {} schemas onto {} page(s)",
        planned.len(),
        pages.len()
    );

    let mut emitted = BTreeSet::new();
    pages
        .into_iter()
        .map(|nodes| merge_page(nodes, planned, &mut emitted))
        .collect()
}

fn build_long_page(planned: &[PlannedSchema]) -> Vec<Node> {
    let mut order: Vec<usize> = (0..planned.len()).collect();
    order.sort_by(|&a, &b| {
        planned[a]
            .schema
            .position
            .y
            .total_cmp(&planned[b].schema.position.y)
    });

    // (original bottom edge, height difference)
    let mut diffs: Vec<(f64, f64)> = Vec::new();
    let mut nodes = Vec::new();

    for idx in order {
        let item = &planned[idx];
        let top = item.schema.position.y;
        let offset: f64 = diffs
            .iter()
            .filter(|(bottom, _)| *bottom <= top + EPSILON)
            .map(|(_, diff)| diff)
            .sum();

        let mut y = top + offset;
        for (index, &height) in item.heights.iter().enumerate() {
            nodes.push(Node {
                schema: idx,
                index,
                y,
                height,
            });
            y += height;
        }

        let diff = item.total_height() - item.schema.height;
        if diff.abs() > EPSILON {
            diffs.push((top + item.schema.height, diff));
        }
    }

    nodes.sort_by(|a, b| a.y.total_cmp(&b.y));
    nodes
}

fn break_into_pages(nodes: Vec<Node>, planned: &[PlannedSchema], page: &PageGeometry) -> Vec<Vec<Node>> {
    let content_top = page.padding.top;
    let content_bottom = page.height - page.padding.bottom;

    let mut pages: Vec<Vec<Node>> = vec![Vec::new()];
    let mut shift = 0.0;

    for node in nodes {
        let local_y = node.y - shift;
        let starts_below_top = local_y > content_top + EPSILON;

        if starts_below_top && overflows(local_y, node.height, content_bottom) {
            let mut fresh = Vec::new();
            let mut head_height = 0.0;

            if let Some(split) = planned[node.schema].rows.filter(|split| split.show_head) {
                // a header never stays behind without its first row
                let orphan = match (node.index, pages.last_mut()) {
                    (1, Some(current)) => current
                        .iter()
                        .position(|n| {
                            n.schema == node.schema && n.index == 0 && n.y > content_top + EPSILON
                        })
                        .map(|pos| current.remove(pos)),
                    _ => None,
                };

                if let Some(head) = orphan {
                    head_height = head.height;
                    fresh.push(Node {
                        y: content_top,
                        ..head
                    });
                } else if node.index > 0 && split.repeat_head {
                    head_height = planned[node.schema].heights[0];
                    fresh.push(Node {
                        schema: node.schema,
                        index: 0,
                        y: content_top,
                        height: head_height,
                    });
                }
            }

            pages.push(fresh);
            shift = node.y - (content_top + head_height);
        }

        if let Some(current) = pages.last_mut() {
            current.push(Node {
                y: node.y - shift,
                ..node
            });
        }
    }
    pages
}

fn merge_page(nodes: Vec<Node>, planned: &[PlannedSchema], emitted: &mut BTreeSet<usize>) -> Vec<Schema> {
    let mut groups: BTreeMap<usize, Vec<Node>> = BTreeMap::new();
    for node in nodes {
        groups.entry(node.schema).or_default().push(node);
    }

    let mut instances = Vec::new();
    for (idx, group) in groups {
        let item = &planned[idx];
        let mut schema = item.schema.clone();
        schema.position.y = group.iter().map(|n| n.y).fold(f64::INFINITY, f64::min);
        schema.height = group.iter().map(|n| n.height).sum();

        if let Some(split) = item.rows {
            let data_rows: Vec<usize> = group
                .iter()
                .filter(|n| n.index > 0)
                .map(|n| split.first_row + n.index - 1)
                .collect();
            let has_head = split.show_head && group.iter().any(|n| n.index == 0);
            if data_rows.is_empty() && !has_head {
                continue;
            }

            let start = data_rows.iter().copied().min().unwrap_or(split.first_row);
            let end = data_rows.iter().copied().max().map_or(start, |last| last + 1);
            schema.body_range = Some(BodyRange::new(start, Some(end)));
            schema.props.insert("showHead".into(), Value::Bool(has_head));
        }

        schema.is_split = !emitted.insert(idx);
        instances.push(schema);
    }
    instances
}
