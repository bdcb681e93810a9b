//! A character-cell raster that implements [`Surface`] on top of crossterm.

use std::io::{self, Write};

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
};

use crate::geometry::Point;
use crate::visualizer::{Dash, Rgba, Stroke, Surface};

/// Terminal cells are roughly twice as tall as they are wide.
const CELL_ASPECT: f64 = 2.;
/// Samples per cell when walking a line or an arc.
const OVERSAMPLE: f64 = 2.;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Cell {
    glyph: char,
    rgb: (u8, u8, u8),
}

const BLANK: Cell = Cell { glyph: ' ', rgb: (0, 0, 0) };

#[derive(Clone, Copy, Debug)]
enum PathOp {
    MoveTo(Point),
    LineTo(Point),
    Arc { center: Point, radius: f64, start: f64, end: f64 },
}

pub struct TerminalSurface {
    width: f64,
    height: f64,
    cols: u16,
    rows: u16,
    cells: Vec<Cell>,
    path: Vec<PathOp>,
}

impl TerminalSurface {
    /// A `cols` x `rows` grid showing a canvas `width` units wide; the canvas
    /// height follows from the grid's aspect.
    pub fn new(cols: u16, rows: u16, width: f64) -> TerminalSurface {
        let cols = cols.max(1);
        let rows = rows.max(1);
        let height = width * rows as f64 * CELL_ASPECT / cols as f64;
        TerminalSurface {
            width,
            height,
            cols,
            rows,
            cells: vec![BLANK; cols as usize * rows as usize],
            path: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.cells.fill(BLANK);
        self.path.clear();
    }

    fn cell_of(&self, p: Point) -> Option<usize> {
        let col = (p.x / self.width * self.cols as f64).floor();
        let row = (p.y / self.height * self.rows as f64).floor();
        if col < 0. || row < 0. || col >= self.cols as f64 || row >= self.rows as f64 {
            return None;
        }
        Some(row as usize * self.cols as usize + col as usize)
    }

    /// Canvas units covered by one sample step.
    fn step(&self) -> f64 {
        self.width / self.cols as f64 / OVERSAMPLE
    }

    fn plot(&mut self, p: Point, glyph: char, color: Rgba) {
        if let Some(i) = self.cell_of(p) {
            let below = self.cells[i].rgb;
            self.cells[i] = Cell { glyph, rgb: blend(color, below) };
        }
    }

    /// Canvas-space points along the current path, each with its running length.
    fn trace(&self) -> Vec<(Point, f64, char)> {
        let step = self.step();
        let mut points = Vec::new();
        let mut cursor: Option<Point> = None;
        let mut travelled = 0.;

        for op in &self.path {
            match *op {
                PathOp::MoveTo(p) => cursor = Some(p),
                PathOp::LineTo(p) => {
                    if let Some(from) = cursor {
                        let length = (p.x - from.x).hypot(p.y - from.y);
                        let glyph = line_glyph(from, p);
                        let n = (length / step).ceil().max(1.) as usize;
                        for k in 0..=n {
                            let t = k as f64 / n as f64;
                            let at = Point::new(from.x + (p.x - from.x) * t, from.y + (p.y - from.y) * t);
                            points.push((at, travelled + length * t, glyph));
                        }
                        travelled += length;
                    }
                    cursor = Some(p);
                }
                PathOp::Arc { center, radius, start, end } => {
                    let length = radius * (end - start).abs();
                    let n = (length / step).ceil().max(1.) as usize;
                    for k in 0..=n {
                        let t = k as f64 / n as f64;
                        let a = start + (end - start) * t;
                        let at = Point::new(center.x + radius * a.cos(), center.y + radius * a.sin());
                        points.push((at, travelled + length * t, '·'));
                    }
                    travelled += length;
                    cursor = Some(Point::new(center.x + radius * end.cos(), center.y + radius * end.sin()));
                }
            }
        }
        points
    }

    /// Writes the grid to `out` starting at the terminal's top-left corner.
    pub fn render<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for row in 0..self.rows {
            queue!(out, MoveTo(0, row))?;
            let start = row as usize * self.cols as usize;
            for cell in &self.cells[start..start + self.cols as usize] {
                let (r, g, b) = cell.rgb;
                queue!(out, SetForegroundColor(Color::Rgb { r, g, b }), Print(cell.glyph))?;
            }
        }
        queue!(out, ResetColor)?;
        out.flush()
    }

    /// The glyphs of row `row`, mostly for tests.
    pub fn row_text(&self, row: u16) -> String {
        let start = row as usize * self.cols as usize;
        self.cells[start..start + self.cols as usize].iter().map(|c| c.glyph).collect()
    }
}

fn blend(color: Rgba, below: (u8, u8, u8)) -> (u8, u8, u8) {
    let a = color.a.clamp(0., 1.);
    let mix = |top: u8, bottom: u8| (top as f64 * a + bottom as f64 * (1. - a)).round() as u8;
    (mix(color.r, below.0), mix(color.g, below.1), mix(color.b, below.2))
}

fn line_glyph(from: Point, to: Point) -> char {
    let dx = to.x - from.x;
    let dy = (to.y - from.y) / CELL_ASPECT;
    if dx.abs() > 2. * dy.abs() {
        '─'
    } else if dy.abs() > 2. * dx.abs() {
        '│'
    } else if (dx > 0.) == (dy > 0.) {
        '╲'
    } else {
        '╱'
    }
}

fn dashed_on(dash: Option<Dash>, distance: f64) -> bool {
    match dash {
        Some(dash) if dash.on + dash.off > 0. => (distance + dash.offset).rem_euclid(dash.on + dash.off) < dash.on,
        _ => true,
    }
}

impl Surface for TerminalSurface {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, p: Point) {
        self.path.push(PathOp::MoveTo(p));
    }

    fn line_to(&mut self, p: Point) {
        self.path.push(PathOp::LineTo(p));
    }

    fn arc(&mut self, center: Point, radius: f64, start: f64, end: f64) {
        self.path.push(PathOp::Arc { center, radius, start, end });
    }

    /// Only arcs enclose area here; each arc fills as a disk.
    fn fill(&mut self, color: Rgba) {
        let disks: Vec<_> = self
            .path
            .iter()
            .filter_map(|op| match *op {
                PathOp::Arc { center, radius, .. } => Some((center, radius)),
                _ => None,
            })
            .collect();
        let step = self.step();
        for (center, radius) in disks {
            let mut y = center.y - radius;
            while y <= center.y + radius {
                let mut x = center.x - radius;
                while x <= center.x + radius {
                    if (x - center.x).hypot(y - center.y) <= radius {
                        self.plot(Point::new(x, y), '█', color);
                    }
                    x += step;
                }
                y += step * CELL_ASPECT;
            }
        }
    }

    fn stroke(&mut self, stroke: &Stroke) {
        for (p, distance, glyph) in self.trace() {
            if dashed_on(stroke.dash, distance) {
                self.plot(p, glyph, stroke.color);
            }
        }
    }

    /// Drawn in the outline colour; the fill colour would vanish on a dark terminal.
    fn text(&mut self, text: &str, at: Point, _size: f64, _fill: Rgba, outline: Rgba) {
        let cell_width = self.width / self.cols as f64;
        let n = text.chars().count() as f64;
        let left = at.x - (n - 1.) * cell_width / 2.;
        for (k, glyph) in text.chars().enumerate() {
            let p = Point::new(left + k as f64 * cell_width, at.y);
            if let Some(i) = self.cell_of(p) {
                self.cells[i] = Cell { glyph, rgb: (outline.r, outline.g, outline.b) };
            }
        }
    }
}
