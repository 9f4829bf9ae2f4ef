//! GeoPlan Render Library
//!
//! Renderer abstraction and an SVG implementation. Rendering is a pure
//! projection of the scene graph; nothing here mutates it.

mod renderer;
mod svg;

pub use renderer::{RenderContext, RenderResult, Renderer, RendererError, css_color};
pub use svg::SvgRenderer;
