//! Renderer trait abstraction.

use geoplan_core::scene::{SceneError, SceneGraph};
use geoplan_core::widget::HandleContainer;
use kurbo::{Rect, Size};
use peniko::Color;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Render failed: {0}")]
    RenderFailed(String),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("Formatting failed")]
    Format(#[from] std::fmt::Error),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Context for a single render frame.
pub struct RenderContext<'a> {
    /// The scene to render.
    pub scene: &'a SceneGraph,
    /// Visible part of the drawing; the whole scene when `None`.
    pub viewbox: Option<Rect>,
    /// Output size in pixels.
    pub viewport_size: Option<Size>,
    /// Handles of the current selection, drawn on top.
    pub handles: Option<&'a HandleContainer>,
    /// Handle color.
    pub selection_color: Color,
    /// Painted behind everything when set.
    pub background_color: Option<Color>,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context.
    pub fn new(scene: &'a SceneGraph) -> Self {
        Self {
            scene,
            viewbox: None,
            viewport_size: None,
            handles: None,
            selection_color: Color::from_rgba8(59, 130, 246, 255),
            background_color: None,
        }
    }

    pub fn with_viewbox(mut self, viewbox: Option<Rect>) -> Self {
        self.viewbox = viewbox;
        self
    }

    pub fn with_viewport(mut self, size: Size) -> Self {
        self.viewport_size = Some(size);
        self
    }

    /// Set the handle overlay.
    pub fn with_handles(mut self, handles: Option<&'a HandleContainer>) -> Self {
        self.handles = handles;
        self
    }

    pub fn with_selection_color(mut self, color: Color) -> Self {
        self.selection_color = color;
        self
    }

    /// Set the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = Some(color);
        self
    }
}

/// Trait for rendering backends.
///
/// A renderer only reads the scene and returns one complete frame.
pub trait Renderer {
    fn render(&mut self, ctx: &RenderContext) -> RenderResult<String>;
}

/// `#rrggbb`, or `rgba(...)` when not opaque.
pub fn css_color(color: Color) -> String {
    let rgba = color.to_rgba8();
    if rgba.a == 255 {
        format!("#{:02x}{:02x}{:02x}", rgba.r, rgba.g, rgba.b)
    } else {
        format!("rgba({},{},{},{:.3})", rgba.r, rgba.g, rgba.b, f64::from(rgba.a) / 255.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_color() {
        assert_eq!(css_color(Color::from_rgba8(59, 130, 246, 255)), "#3b82f6");
        assert_eq!(css_color(Color::from_rgba8(0, 0, 0, 0)), "rgba(0,0,0,0.000)");
    }
}
