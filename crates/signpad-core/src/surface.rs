//! Drawing surface abstraction.

use kurbo::{BezPath, Rect, Stroke};
use peniko::Color;

/// A 2D raster target the engine paints into.
///
/// Implementations can wrap an HTML canvas, an offscreen bitmap, or simply
/// record the commands.
pub trait DrawingSurface {
    /// Current drawable size in pixels.
    fn size(&self) -> (u32, u32);

    /// Resize the drawable area. Like a canvas, resizing discards the content.
    fn set_size(&mut self, width: u32, height: u32);

    /// Erase everything to transparent.
    fn clear(&mut self);

    fn fill_rect(&mut self, rect: Rect, color: Color);

    fn stroke_path(&mut self, path: &BezPath, style: &Stroke, color: Color);
}

/// A recorded drawing operation.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    FillRect { rect: Rect, color: Color },
    StrokePath { path: BezPath, width: f64, color: Color },
}

/// Surface that records draw commands since the last clear or resize.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    commands: Vec<DrawCommand>,
    clear_count: usize,
}

impl RecordingSurface {
    /// Create a recording surface of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
            clear_count: 0,
        }
    }

    /// Commands drawn since the content was last discarded.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Stroked paths drawn since the content was last discarded.
    pub fn stroked_paths(&self) -> impl Iterator<Item = (&BezPath, f64, Color)> {
        self.commands.iter().filter_map(|cmd| match cmd {
            DrawCommand::StrokePath { path, width, color } => Some((path, *width, *color)),
            DrawCommand::FillRect { .. } => None,
        })
    }

    /// How many times the content was discarded (clear or resize).
    pub fn clear_count(&self) -> usize {
        self.clear_count
    }
}

impl DrawingSurface for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.clear();
    }

    fn clear(&mut self) {
        self.commands.clear();
        self.clear_count += 1;
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::FillRect { rect, color });
    }

    fn stroke_path(&mut self, path: &BezPath, style: &Stroke, color: Color) {
        self.commands.push(DrawCommand::StrokePath {
            path: path.clone(),
            width: style.width,
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    #[test]
    fn test_resize_discards_content() {
        let mut surface = RecordingSurface::new(100, 100);
        surface.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), Color::from_rgba8(255, 255, 255, 255));
        assert_eq!(surface.commands().len(), 1);

        surface.set_size(300, 150);
        assert_eq!(surface.size(), (300, 150));
        assert!(surface.commands().is_empty());
        assert_eq!(surface.clear_count(), 1);
    }

    #[test]
    fn test_records_strokes() {
        let mut surface = RecordingSurface::new(100, 100);
        let mut path = BezPath::new();
        path.move_to(Point::new(1.0, 1.0));
        path.line_to(Point::new(5.0, 5.0));
        surface.stroke_path(&path, &Stroke::new(3.0), Color::from_rgba8(0, 0, 0, 255));

        let strokes: Vec<_> = surface.stroked_paths().collect();
        assert_eq!(strokes.len(), 1);
        assert_eq!(strokes[0].1, 3.0);
    }
}
