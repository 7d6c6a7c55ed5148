//! `<canvas>` 2D context as a drawing surface.

use kurbo::{BezPath, Cap, Join, PathEl, Rect, Stroke};
use peniko::Color;
use signpad_core::color::to_hex;
use signpad_core::{DrawingSurface, SignatureError, SignatureResult};
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement};

fn cap_name(cap: Cap) -> &'static str {
    match cap {
        Cap::Butt => "butt",
        Cap::Square => "square",
        Cap::Round => "round",
    }
}

fn join_name(join: Join) -> &'static str {
    match join {
        Join::Bevel => "bevel",
        Join::Miter => "miter",
        Join::Round => "round",
    }
}

/// A canvas element and its 2D rendering context.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    /// Look up a canvas by element id. `role` names the layer in errors.
    pub fn from_element_id(document: &Document, id: &str, role: &'static str) -> SignatureResult<Self> {
        let canvas = document
            .get_element_by_id(id)
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
            .ok_or(SignatureError::MissingSurface(role))?;
        Self::new(canvas, role)
    }

    pub fn new(canvas: HtmlCanvasElement, role: &'static str) -> SignatureResult<Self> {
        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
            .ok_or(SignatureError::MissingSurface(role))?;
        Ok(Self { canvas, ctx })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    fn trace(&self, path: &BezPath) {
        self.ctx.begin_path();
        for el in path.elements() {
            match *el {
                PathEl::MoveTo(p) => self.ctx.move_to(p.x, p.y),
                PathEl::LineTo(p) => self.ctx.line_to(p.x, p.y),
                PathEl::QuadTo(c, p) => self.ctx.quadratic_curve_to(c.x, c.y, p.x, p.y),
                PathEl::CurveTo(c1, c2, p) => self.ctx.bezier_curve_to(c1.x, c1.y, c2.x, c2.y, p.x, p.y),
                PathEl::ClosePath => self.ctx.close_path(),
            }
        }
    }
}

impl DrawingSurface for CanvasSurface {
    fn size(&self) -> (u32, u32) {
        (self.canvas.width(), self.canvas.height())
    }

    fn set_size(&mut self, width: u32, height: u32) {
        // Assigning the backing size resets the bitmap
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    fn clear(&mut self) {
        let (width, height) = self.size();
        self.ctx.clear_rect(0.0, 0.0, f64::from(width), f64::from(height));
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.ctx.set_fill_style_str(&to_hex(color));
        self.ctx.fill_rect(rect.x0, rect.y0, rect.width(), rect.height());
    }

    fn stroke_path(&mut self, path: &BezPath, style: &Stroke, color: Color) {
        self.ctx.set_stroke_style_str(&to_hex(color));
        self.ctx.set_line_width(style.width);
        self.ctx.set_line_cap(cap_name(style.start_cap));
        self.ctx.set_line_join(join_name(style.join));
        self.trace(path);
        self.ctx.stroke();
    }
}
