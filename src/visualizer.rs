//! Live diagram of a network: one band per layer, output layer on top.
//!
//! Everything is derived from the network's current snapshot and the time value,
//! so drawing the same network at the same time always issues the same primitives.

use std::f64::consts::TAU;

use crate::brain::{Layer, Network};
use crate::geometry::{lerp, Point};

/// Glyphs for the four controls, in output order.
pub const CONTROL_LABELS: [&str; 4] = ["↑", "←", "→", "↓"];

const EDGE_DASH: [f64; 2] = [7., 3.];
const BIAS_DASH: [f64; 2] = [3., 3.];
const LINE_WIDTH: f64 = 2.;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba { r: 0, g: 0, b: 0, a: 1. };
    pub const WHITE: Rgba = Rgba { r: 255, g: 255, b: 255, a: 1. };

    /// Yellow for positive, blue for negative, opacity from the magnitude.
    pub fn signed(value: f64) -> Rgba {
        let warm = if value < 0. { 0 } else { 255 };
        let b = if value > 0. { 0 } else { 255 };
        Rgba { r: warm, g: warm, b, a: value.abs().min(1.) }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dash {
    pub on: f64,
    pub off: f64,
    pub offset: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    pub color: Rgba,
    pub width: f64,
    pub dash: Option<Dash>,
}

/// A 2D canvas-like target.
///
/// Paths are built with `begin_path`, `move_to`, `line_to` and `arc`, then
/// painted with `fill` or `stroke`.
pub trait Surface {
    fn size(&self) -> (f64, f64);
    fn begin_path(&mut self);
    fn move_to(&mut self, p: Point);
    fn line_to(&mut self, p: Point);
    fn arc(&mut self, center: Point, radius: f64, start: f64, end: f64);
    fn fill(&mut self, color: Rgba);
    fn stroke(&mut self, stroke: &Stroke);
    /// Text centred on `at`, filled then outlined.
    fn text(&mut self, text: &str, at: Point, size: f64, fill: Rgba, outline: Rgba);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiagramStyle {
    pub margin: f64,
    pub node_radius: f64,
    pub dash_time_divisor: f64,
}

impl Default for DiagramStyle {
    fn default() -> Self {
        DiagramStyle {
            margin: 50.,
            node_radius: 18.,
            dash_time_divisor: 50.,
        }
    }
}

/// Horizontal position of node `index` out of `count`, spread over `[left, right]`.
pub fn node_x(count: usize, index: usize, left: f64, right: f64) -> f64 {
    let t = if count == 1 { 0.5 } else { index as f64 / (count - 1) as f64 };
    lerp(left, right, t)
}

/// Screen placement of one layer: inputs along `bottom`, outputs along `top`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Band {
    pub layer: usize,
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

/// Bands in drawing order, last layer first so it ends up at the top.
pub fn layout(n_layers: usize, width: f64, height: f64, margin: f64) -> Vec<Band> {
    let left = margin;
    let top = margin;
    let inner_width = width - margin * 2.;
    let inner_height = height - margin * 2.;
    let band_height = inner_height / n_layers as f64;

    (0..n_layers)
        .rev()
        .map(|layer| {
            let t = if n_layers == 1 { 0.5 } else { layer as f64 / (n_layers - 1) as f64 };
            let band_top = top + lerp(inner_height - band_height, 0., t);
            Band {
                layer,
                left,
                right: left + inner_width,
                top: band_top,
                bottom: band_top + band_height,
            }
        })
        .collect()
}

pub fn draw_network<S: Surface>(surface: &mut S, network: &Network, time: f64) {
    draw_network_with(surface, network, time, &DiagramStyle::default());
}

pub fn draw_network_with<S: Surface>(surface: &mut S, network: &Network, time: f64, style: &DiagramStyle) {
    let (width, height) = surface.size();
    let dash_offset = -time / style.dash_time_divisor;
    let last = network.layers.len().saturating_sub(1);

    for band in layout(network.layers.len(), width, height, style.margin) {
        let labels: &[&str] = if band.layer == last { &CONTROL_LABELS } else { &[] };
        draw_layer(surface, &network.layers[band.layer], &band, labels, dash_offset, style.node_radius);
    }
}

fn draw_layer<S: Surface>(surface: &mut S, layer: &Layer, band: &Band, labels: &[&str], dash_offset: f64, radius: f64) {
    let n_inputs = layer.inputs.len();
    let n_outputs = layer.outputs.len();
    let input_x = |i| node_x(n_inputs, i, band.left, band.right);
    let output_x = |j| node_x(n_outputs, j, band.left, band.right);

    let edge_dash = Dash { on: EDGE_DASH[0], off: EDGE_DASH[1], offset: dash_offset };
    for (i, row) in layer.weights.iter().enumerate() {
        for (j, &weight) in row.iter().enumerate() {
            surface.begin_path();
            surface.move_to(Point::new(input_x(i), band.bottom));
            surface.line_to(Point::new(output_x(j), band.top));
            surface.stroke(&Stroke {
                color: Rgba::signed(weight),
                width: LINE_WIDTH,
                dash: Some(edge_dash),
            });
        }
    }

    for (i, &value) in layer.inputs.iter().enumerate() {
        draw_node(surface, Point::new(input_x(i), band.bottom), radius, value);
    }

    let bias_dash = Dash { on: BIAS_DASH[0], off: BIAS_DASH[1], offset: dash_offset };
    for (j, &value) in layer.outputs.iter().enumerate() {
        let center = Point::new(output_x(j), band.top);
        draw_node(surface, center, radius, value);

        surface.begin_path();
        surface.arc(center, radius * 0.8, 0., TAU);
        surface.stroke(&Stroke {
            color: Rgba::signed(layer.biases.get(j).copied().unwrap_or(0.)),
            width: LINE_WIDTH,
            dash: Some(bias_dash),
        });

        if let Some(label) = labels.get(j) {
            let at = Point::new(center.x, center.y + radius * 0.1);
            surface.text(label, at, radius * 1.5, Rgba::BLACK, Rgba::WHITE);
        }
    }
}

fn draw_node<S: Surface>(surface: &mut S, center: Point, radius: f64, value: f64) {
    surface.begin_path();
    surface.arc(center, radius, 0., TAU);
    surface.fill(Rgba::BLACK);

    surface.begin_path();
    surface.arc(center, radius * 0.6, 0., TAU);
    surface.fill(Rgba::signed(value));
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[derive(Debug, PartialEq)]
    enum Op {
        MoveTo(Point),
        LineTo(Point),
        Arc(Point, f64),
        Fill(Rgba),
        Stroke(Stroke),
        Text(String, Point),
    }

    struct Recorder {
        width: f64,
        height: f64,
        ops: Vec<Op>,
    }

    impl Recorder {
        fn new(width: f64, height: f64) -> Recorder {
            Recorder { width, height, ops: Vec::new() }
        }
    }

    impl Surface for Recorder {
        fn size(&self) -> (f64, f64) {
            (self.width, self.height)
        }
        fn begin_path(&mut self) {}
        fn move_to(&mut self, p: Point) {
            self.ops.push(Op::MoveTo(p));
        }
        fn line_to(&mut self, p: Point) {
            self.ops.push(Op::LineTo(p));
        }
        fn arc(&mut self, center: Point, radius: f64, _start: f64, _end: f64) {
            self.ops.push(Op::Arc(center, radius));
        }
        fn fill(&mut self, color: Rgba) {
            self.ops.push(Op::Fill(color));
        }
        fn stroke(&mut self, stroke: &Stroke) {
            self.ops.push(Op::Stroke(*stroke));
        }
        fn text(&mut self, text: &str, at: Point, _size: f64, _fill: Rgba, _outline: Rgba) {
            self.ops.push(Op::Text(text.to_string(), at));
        }
    }

    #[test]
    fn single_node_is_centred() {
        assert_approx_eq!(node_x(1, 0, 50., 250.), 150.);
    }

    #[test]
    fn four_nodes_span_the_width() {
        let xs: Vec<_> = (0..4).map(|i| node_x(4, i, 50., 250.)).collect();
        assert_approx_eq!(xs[0], 50.);
        assert_approx_eq!(xs[1], 50. + 200. / 3.);
        assert_approx_eq!(xs[2], 50. + 400. / 3.);
        assert_approx_eq!(xs[3], 250.);
    }

    #[test]
    fn bands_stack_output_on_top() {
        let bands = layout(2, 300., 500., 50.);
        assert_eq!(bands.len(), 2);
        assert_eq!(bands[0].layer, 1);
        assert_approx_eq!(bands[0].top, 50.);
        assert_approx_eq!(bands[0].bottom, 250.);
        assert_eq!(bands[1].layer, 0);
        assert_approx_eq!(bands[1].top, 250.);
        assert_approx_eq!(bands[1].bottom, 450.);
        assert_approx_eq!(bands[1].left, 50.);
        assert_approx_eq!(bands[1].right, 250.);
    }

    #[test]
    fn single_band_is_centred() {
        let bands = layout(1, 300., 500., 50.);
        assert_approx_eq!(bands[0].top, 50.);
        assert_approx_eq!(bands[0].bottom, 450.);
    }

    #[test]
    fn colour_encodes_sign_and_magnitude() {
        assert_eq!(Rgba::signed(0.5), Rgba { r: 255, g: 255, b: 0, a: 0.5 });
        assert_eq!(Rgba::signed(-0.25), Rgba { r: 0, g: 0, b: 255, a: 0.25 });
        assert_eq!(Rgba::signed(-3.).a, 1.);
    }

    #[test]
    fn draws_every_edge_and_node() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(41);
        let mut network = Network::init(&mut rng, &[5, 6, 4]).unwrap();
        network.evaluate(&[0.1, 0.2, 0.3, 0.4, 0.5]).unwrap();

        let mut surface = Recorder::new(300., 600.);
        draw_network(&mut surface, &network, 1000.);

        let strokes = surface.ops.iter().filter(|op| matches!(op, Op::Stroke(_))).count();
        // edges plus one bias ring per output node
        assert_eq!(strokes, 5 * 6 + 6 * 4 + 6 + 4);
        let fills = surface.ops.iter().filter(|op| matches!(op, Op::Fill(_))).count();
        assert_eq!(fills, 2 * (5 + 6 + 6 + 4));

        let labels: Vec<_> = surface
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::Text(text, _) => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(labels, CONTROL_LABELS.to_vec());
    }

    #[test]
    fn first_edge_follows_first_weight() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let network = Network::init(&mut rng, &[2, 1]).unwrap();
        let mut surface = Recorder::new(300., 300.);
        draw_network(&mut surface, &network, 500.);

        assert_eq!(surface.ops[0], Op::MoveTo(Point::new(50., 250.)));
        assert_eq!(surface.ops[1], Op::LineTo(Point::new(150., 50.)));
        match &surface.ops[2] {
            Op::Stroke(stroke) => {
                assert_eq!(stroke.color, Rgba::signed(network.layers[0].weights[0][0]));
                assert_approx_eq!(stroke.dash.unwrap().offset, -10.);
            }
            other => panic!("expected a stroke, got {other:?}"),
        }
    }

    #[test]
    fn drawing_is_a_pure_function_of_snapshot_and_time() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(43);
        let network = Network::init(&mut rng, &[3, 2]).unwrap();
        let mut first = Recorder::new(300., 400.);
        let mut second = Recorder::new(300., 400.);
        draw_network(&mut first, &network, 250.);
        draw_network(&mut second, &network, 250.);
        assert_eq!(first.ops, second.ops);
    }
}
