//! Two-layer render surface: a static grid background and an ink layer.
//!
//! The ink layer is a projection of the committed strokes plus the active
//! stroke. While a stroke is being drawn it is extended one segment at a time;
//! undo and resize replay the whole stroke list.

use crate::color::ink_color;
use crate::config::DEFAULT_GRID_STEP;
use crate::stroke::Stroke;
use crate::surface::DrawingSurface;
use kurbo::{BezPath, Cap, Join, Point, Rect};
use peniko::Color;

/// Background grid appearance.
#[derive(Debug, Clone, Copy)]
pub struct GridStyle {
    /// Spacing between grid lines in pixels.
    pub step: f64,
    pub fill: Color,
    pub line: Color,
    pub line_width: f64,
}

impl Default for GridStyle {
    fn default() -> Self {
        Self {
            step: DEFAULT_GRID_STEP,
            fill: Color::from_rgba8(255, 255, 255, 255),
            line: Color::from_rgba8(0xe5, 0xe7, 0xeb, 255), // Light gray
            line_width: 1.0,
        }
    }
}

impl GridStyle {
    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }
}

/// Stroke style used for ink: round caps so single taps show as dots.
fn ink_style(thickness: f64) -> kurbo::Stroke {
    kurbo::Stroke::new(thickness)
        .with_caps(Cap::Round)
        .with_join(Join::Round)
}

fn segment(from: Point, to: Point) -> BezPath {
    let mut path = BezPath::new();
    path.move_to(from);
    path.line_to(to);
    path
}

/// Ink and background surfaces kept at the same size.
#[derive(Debug)]
pub struct RenderSurface<S> {
    ink: S,
    background: S,
    grid: GridStyle,
}

impl<S: DrawingSurface> RenderSurface<S> {
    pub fn new(ink: S, background: S, grid: GridStyle) -> Self {
        Self { ink, background, grid }
    }

    pub fn ink(&self) -> &S {
        &self.ink
    }

    pub fn background(&self) -> &S {
        &self.background
    }

    /// Size of the ink layer (the background always matches it).
    pub fn size(&self) -> (u32, u32) {
        self.ink.size()
    }

    /// Resize both layers. Content of both is discarded.
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.ink.set_size(width, height);
        self.background.set_size(width, height);
    }

    /// Paint the grid: white fill, then vertical and horizontal lines.
    pub fn render_background(&mut self) {
        let (width, height) = self.background.size();
        let (width, height) = (f64::from(width), f64::from(height));
        let grid = self.grid;
        let stroke = kurbo::Stroke::new(grid.line_width);

        self.background.clear();
        self.background.fill_rect(Rect::new(0.0, 0.0, width, height), grid.fill);

        // Vertical lines
        let mut x = 0.0;
        while x < width {
            self.background
                .stroke_path(&segment(Point::new(x, 0.0), Point::new(x, height)), &stroke, grid.line);
            x += grid.step;
        }

        // Horizontal lines
        let mut y = 0.0;
        while y < height {
            self.background
                .stroke_path(&segment(Point::new(0.0, y), Point::new(width, y)), &stroke, grid.line);
            y += grid.step;
        }
    }

    /// Paint the newest point of `stroke`.
    ///
    /// The first point becomes a zero-length round-capped segment; later points
    /// add the segment from the previous point. Earlier segments are left alone.
    pub fn extend_stroke(&mut self, stroke: &Stroke) {
        let [.., previous, last] = stroke.points.as_slice() else {
            if let Some(first) = stroke.first_point() {
                let p = first.position();
                self.ink
                    .stroke_path(&segment(p, p), &ink_style(stroke.thickness), ink_color(&stroke.color));
            }
            return;
        };

        self.ink.stroke_path(
            &segment(previous.position(), last.position()),
            &ink_style(stroke.thickness),
            ink_color(&stroke.color),
        );
    }

    /// Erase the ink layer.
    pub fn clear_ink(&mut self) {
        self.ink.clear();
    }

    /// Erase the ink layer and replay every stroke as a connected polyline,
    /// followed by the stroke still being drawn.
    pub fn redraw(&mut self, strokes: &[Stroke], active: Option<&Stroke>) {
        self.ink.clear();
        for stroke in strokes.iter().chain(active) {
            let mut path = stroke.to_path();
            match stroke.points.as_slice() {
                [] => continue,
                [only] => path.line_to(only.position()),
                _ => {}
            }
            self.ink
                .stroke_path(&path, &ink_style(stroke.thickness), ink_color(&stroke.color));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::StrokePoint;
    use crate::surface::{DrawCommand, RecordingSurface};
    use kurbo::PathEl;

    fn layers(width: u32, height: u32) -> RenderSurface<RecordingSurface> {
        RenderSurface::new(
            RecordingSurface::new(width, height),
            RecordingSurface::new(width, height),
            GridStyle::default(),
        )
    }

    #[test]
    fn test_background_grid_lines() {
        let mut render = layers(100, 50);
        render.render_background();

        let commands = render.background().commands();
        assert!(matches!(commands[0], DrawCommand::FillRect { .. }));
        // x = 0, 25, 50, 75 and y = 0, 25
        assert_eq!(render.background().stroked_paths().count(), 6);
        assert!(render.ink().commands().is_empty());
    }

    #[test]
    fn test_set_size_keeps_layers_in_lockstep() {
        let mut render = layers(100, 50);
        render.set_size(400, 300);
        assert_eq!(render.ink().size(), (400, 300));
        assert_eq!(render.background().size(), (400, 300));
    }

    #[test]
    fn test_extend_first_point_is_dot() {
        let mut render = layers(100, 100);
        let mut stroke = Stroke::new("#ff0000", 4.0);
        stroke.add_point(StrokePoint::new(10.0, 10.0, 0));
        render.extend_stroke(&stroke);

        let (path, width, color) = render.ink().stroked_paths().next().unwrap();
        assert_eq!(width, 4.0);
        assert_eq!(color.to_rgba8().r, 255);
        assert_eq!(
            path.elements(),
            &[PathEl::MoveTo(Point::new(10.0, 10.0)), PathEl::LineTo(Point::new(10.0, 10.0))]
        );
    }

    #[test]
    fn test_extend_is_append_only() {
        let mut render = layers(100, 100);
        let mut stroke = Stroke::new("#000000", 2.0);
        for (i, x) in [0.0, 10.0, 20.0].into_iter().enumerate() {
            stroke.add_point(StrokePoint::new(x, 0.0, i as u64));
            render.extend_stroke(&stroke);
        }

        let paths: Vec<_> = render.ink().stroked_paths().map(|(p, _, _)| p.clone()).collect();
        assert_eq!(paths.len(), 3);
        assert_eq!(
            paths[2].elements(),
            &[PathEl::MoveTo(Point::new(10.0, 0.0)), PathEl::LineTo(Point::new(20.0, 0.0))]
        );
    }

    #[test]
    fn test_redraw_replays_polylines() {
        let mut render = layers(100, 100);
        let mut a = Stroke::new("#000000", 2.0);
        a.add_point(StrokePoint::new(0.0, 0.0, 0));
        a.add_point(StrokePoint::new(5.0, 5.0, 1));
        a.add_point(StrokePoint::new(9.0, 1.0, 2));
        let mut b = Stroke::new("#0000ff", 6.0);
        b.add_point(StrokePoint::new(50.0, 50.0, 3));
        let empty = Stroke::new("#000000", 2.0);

        render.redraw(&[a, empty], Some(&b));

        let paths: Vec<_> = render.ink().stroked_paths().collect();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].0.elements().len(), 3);
        // Active stroke comes last; a lone point is a zero-length dot
        assert_eq!(paths[1].1, 6.0);
        assert_eq!(
            paths[1].0.elements(),
            &[PathEl::MoveTo(Point::new(50.0, 50.0)), PathEl::LineTo(Point::new(50.0, 50.0))]
        );
    }
}
