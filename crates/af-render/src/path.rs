//! Edge curve geometry.
//!
//! Edges are drawn as cubic Béziers leaving each anchor perpendicular to the
//! side its handle sits on. The pending connection is a straight segment from
//! the click point to the pointer.

use af_core::geometry::HandleResolver;
use af_core::handle::{HandleId, Side};
use af_core::id::EdgeId;
use af_core::model::{Edge, FlowGraph, Node, Point};
use kurbo::{CubicBez, Line, ParamCurveNearest, Rect};

/// Control points never sit closer to their anchor than this.
const MIN_CONTROL_REACH: f64 = 40.0;
/// Accuracy passed to `nearest` when picking edges.
const PICK_ACCURACY: f64 = 1e-3;

pub fn to_kurbo(p: Point) -> kurbo::Point {
    kurbo::Point::new(p.x, p.y)
}

pub fn from_kurbo(p: kurbo::Point) -> Point {
    Point::new(p.x, p.y)
}

/// World-space rectangle covered by `node`.
pub fn node_rect(resolver: &HandleResolver, node: &Node) -> Rect {
    let size = resolver.size_of(node);
    Rect::new(
        node.position.x,
        node.position.y,
        node.position.x + size.width,
        node.position.y + size.height,
    )
}

fn outward(handle: &HandleId) -> (f64, f64) {
    match handle.side() {
        Side::Top => (0.0, -1.0),
        Side::Bottom => (0.0, 1.0),
        Side::Left => (-1.0, 0.0),
        Side::Right => (1.0, 0.0),
    }
}

/// Curve for `edge`, or `None` if either endpoint is missing.
pub fn edge_curve(graph: &FlowGraph, resolver: &HandleResolver, edge: &Edge) -> Option<CubicBez> {
    let (Some(source), Some(target)) = (graph.node(edge.source), graph.node(edge.target)) else {
        log::debug!(
            "edge {} has a missing endpoint ({} -> {})",
            edge.id.get(),
            edge.source,
            edge.target
        );
        return None;
    };
    let a = resolver.anchor(source, &edge.source_handle);
    let b = resolver.anchor(target, &edge.target_handle);
    Some(curve_between(a, &edge.source_handle, b, &edge.target_handle))
}

pub fn curve_between(a: Point, from: &HandleId, b: Point, to: &HandleId) -> CubicBez {
    let reach = ((b.x - a.x).abs().max((b.y - a.y).abs()) / 2.0).max(MIN_CONTROL_REACH);
    let (ax, ay) = outward(from);
    let (bx, by) = outward(to);
    CubicBez::new(
        to_kurbo(a),
        to_kurbo(a.offset(ax * reach, ay * reach)),
        to_kurbo(b.offset(bx * reach, by * reach)),
        to_kurbo(b),
    )
}

/// Topmost edge within `tolerance` of `p`.
pub fn edge_at(
    graph: &FlowGraph,
    resolver: &HandleResolver,
    p: Point,
    tolerance: f64,
) -> Option<EdgeId> {
    let target = to_kurbo(p);
    graph.edges.iter().rev().find_map(|edge| {
        let curve = edge_curve(graph, resolver, edge)?;
        let nearest = curve.nearest(target, PICK_ACCURACY);
        (nearest.distance_sq <= tolerance * tolerance).then_some(edge.id)
    })
}

/// Segment drawn while a connection is pending.
pub fn pending_line(start: Point, pointer: Point) -> Line {
    Line::new(to_kurbo(start), to_kurbo(pointer))
}
