//! Layered layout and SVG output.
//!
//! Nodes are placed in layers by longest path from the roots, in declaration
//! order within a layer. Cycles are tolerated: relaxation stops after one pass
//! per node, so a back edge simply points upward.

use std::fmt::Write;

use super::parse::{Direction, EdgeStyle, Graph, Shape};
use crate::utils::html::escape;

const NODE_HEIGHT: f64 = 40.0;
const MIN_NODE_WIDTH: f64 = 80.0;
const CHAR_WIDTH: f64 = 8.0;
const LAYER_GAP: f64 = 60.0;
const SIBLING_GAP: f64 = 40.0;
const MARGIN: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Rect {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

impl Rect {
    fn cx(&self) -> f64 {
        self.x + self.w / 2.0
    }

    fn cy(&self) -> f64 {
        self.y + self.h / 2.0
    }
}

/// Longest-path layer of every node.
fn layers(graph: &Graph) -> Vec<usize> {
    let n = graph.nodes.len();
    let mut layer = vec![0usize; n];

    for _ in 0..n {
        let mut changed = false;
        for edge in &graph.edges {
            let next = (layer[edge.from] + 1).min(n.saturating_sub(1));
            if edge.from != edge.to && layer[edge.to] < next {
                layer[edge.to] = next;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    layer
}

fn place(graph: &Graph) -> (Vec<Rect>, f64, f64) {
    let layer = layers(graph);
    let depth = layer.iter().copied().max().map_or(0, |m| m + 1);

    let width = graph
        .nodes
        .iter()
        .map(|n| (n.label.chars().count() as f64 * CHAR_WIDTH + 24.0).max(MIN_NODE_WIDTH))
        .fold(MIN_NODE_WIDTH, f64::max);

    let mut slot_in_layer = vec![0usize; depth];
    let mut rects = Vec::with_capacity(graph.nodes.len());
    for &l in &layer {
        let slot = slot_in_layer[l];
        slot_in_layer[l] += 1;

        let rank = if graph.direction.is_reversed() { depth - 1 - l } else { l };
        let (main, cross) = if graph.direction.is_horizontal() {
            (rank as f64 * (width + LAYER_GAP), slot as f64 * (NODE_HEIGHT + SIBLING_GAP))
        } else {
            (rank as f64 * (NODE_HEIGHT + LAYER_GAP), slot as f64 * (width + SIBLING_GAP))
        };
        let (x, y) = if graph.direction.is_horizontal() { (main, cross) } else { (cross, main) };

        rects.push(Rect {
            x: x + MARGIN,
            y: y + MARGIN,
            w: width,
            h: NODE_HEIGHT,
        });
    }

    let breadth = slot_in_layer.iter().copied().max().unwrap_or(0) as f64;
    let (total_w, total_h) = if graph.direction.is_horizontal() {
        (
            depth as f64 * (width + LAYER_GAP) - LAYER_GAP,
            breadth * (NODE_HEIGHT + SIBLING_GAP) - SIBLING_GAP,
        )
    } else {
        (
            breadth * (width + SIBLING_GAP) - SIBLING_GAP,
            depth as f64 * (NODE_HEIGHT + LAYER_GAP) - LAYER_GAP,
        )
    };

    (rects, total_w.max(0.0) + 2.0 * MARGIN, total_h.max(0.0) + 2.0 * MARGIN)
}

/// Point where an edge leaves `from` towards `to`.
fn anchor(from: &Rect, to: &Rect, direction: Direction) -> (f64, f64) {
    if direction.is_horizontal() {
        let x = if to.cx() >= from.cx() { from.x + from.w } else { from.x };
        (x, from.cy())
    } else {
        let y = if to.cy() >= from.cy() { from.y + from.h } else { from.y };
        (from.cx(), y)
    }
}

/// Render a parsed graph as a standalone SVG document.
pub fn to_svg(graph: &Graph) -> String {
    let (rects, width, height) = place(graph);
    let mut svg = String::with_capacity(512 + graph.nodes.len() * 256);

    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width:.0}" height="{height:.0}" viewBox="0 0 {width:.0} {height:.0}" font-family="Arial, sans-serif" font-size="14">"#
    );
    svg.push_str(
        r##"<defs><marker id="arrow" viewBox="0 0 10 10" refX="10" refY="5" markerWidth="8" markerHeight="8" orient="auto-start-reverse"><path d="M 0 0 L 10 5 L 0 10 z" fill="#333"/></marker></defs>"##,
    );

    for edge in &graph.edges {
        let (from, to) = (&rects[edge.from], &rects[edge.to]);
        let (x1, y1) = anchor(from, to, graph.direction);
        let (x2, y2) = anchor(to, from, graph.direction);
        let stroke = match edge.style {
            EdgeStyle::Thick => r#"stroke-width="3""#,
            EdgeStyle::Dotted => r#"stroke-width="1.5" stroke-dasharray="4 3""#,
            EdgeStyle::Arrow | EdgeStyle::Open => r#"stroke-width="1.5""#,
        };
        let head = if edge.style.has_head() { r#" marker-end="url(#arrow)""# } else { "" };
        let _ = write!(
            svg,
            r##"<line x1="{x1:.1}" y1="{y1:.1}" x2="{x2:.1}" y2="{y2:.1}" stroke="#333" {stroke}{head}/>"##
        );
        if let Some(label) = &edge.label {
            let _ = write!(
                svg,
                r##"<text x="{:.1}" y="{:.1}" text-anchor="middle" fill="#555" font-size="12">{}</text>"##,
                (x1 + x2) / 2.0 + 4.0,
                (y1 + y2) / 2.0 - 4.0,
                escape(label)
            );
        }
    }

    for (node, rect) in graph.nodes.iter().zip(&rects) {
        let Rect { x, y, w, h } = *rect;
        let (cx, cy) = (rect.cx(), rect.cy());
        let _ = match node.shape {
            Shape::Box => write!(
                svg,
                r##"<rect x="{x:.1}" y="{y:.1}" width="{w:.1}" height="{h:.1}" fill="#ECECFF" stroke="#9370DB"/>"##
            ),
            Shape::Round => write!(
                svg,
                r##"<rect x="{x:.1}" y="{y:.1}" width="{w:.1}" height="{h:.1}" rx="12" fill="#ECECFF" stroke="#9370DB"/>"##
            ),
            Shape::Decision => write!(
                svg,
                r##"<polygon points="{cx:.1},{y:.1} {:.1},{cy:.1} {cx:.1},{:.1} {x:.1},{cy:.1}" fill="#ECECFF" stroke="#9370DB"/>"##,
                x + w,
                y + h
            ),
            Shape::Circle => write!(
                svg,
                r##"<ellipse cx="{cx:.1}" cy="{cy:.1}" rx="{:.1}" ry="{:.1}" fill="#ECECFF" stroke="#9370DB"/>"##,
                w / 2.0,
                h / 2.0
            ),
        };
        let _ = write!(
            svg,
            r#"<text x="{cx:.1}" y="{:.1}" text-anchor="middle">{}</text>"#,
            cy + 5.0,
            escape(&node.label)
        );
    }

    svg.push_str("</svg>");
    svg
}

#[cfg(test)]
mod tests {
    use super::super::parse::parse;
    use super::*;

    #[test]
    fn test_layers_longest_path() {
        let graph = parse("graph TD\nA --> B --> C\nA --> C").unwrap();
        assert_eq!(layers(&graph), vec![0, 1, 2]);
    }

    #[test]
    fn test_layers_tolerate_cycles() {
        let graph = parse("graph TD\nA --> B --> A\nB --> B").unwrap();
        let layer = layers(&graph);
        assert!(layer.iter().all(|&l| l < graph.nodes.len()));
    }

    #[test]
    fn test_horizontal_layout() {
        let graph = parse("graph LR\nA --> B").unwrap();
        let (rects, w, h) = place(&graph);
        assert!(rects[1].x > rects[0].x);
        assert_eq!(rects[1].y, rects[0].y);
        assert!(w > h);
    }

    #[test]
    fn test_reversed_layout() {
        let graph = parse("graph BT\nA --> B").unwrap();
        let (rects, _, _) = place(&graph);
        assert!(rects[0].y > rects[1].y);
    }

    #[test]
    fn test_svg_shapes_and_escaping() {
        let graph = parse("graph TD\nA[\"a < b\"] -->|yes & no| B{ok?} --- C((c))").unwrap();
        let svg = to_svg(&graph);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("a &lt; b"));
        assert!(svg.contains("yes &amp; no"));
        assert!(svg.contains("<polygon"));
        assert!(svg.contains("<ellipse"));
        // Open link has no arrow head
        assert_eq!(svg.matches("marker-end").count(), 1);
    }
}
