//! Drops a copy of a symbol definition into the project layer.

use super::{ToolContext, ToolName};
use crate::scene::{NodeDescriptor, SceneResult};
use kurbo::{Affine, Point};

#[derive(Debug, Default)]
pub struct SymbolTool;

impl SymbolTool {
    pub fn new() -> Self {
        Self
    }

    /// Place the chosen symbol with its origin on the pointer.
    pub fn pointer_down(&mut self, ctx: &mut ToolContext<'_>, point: Point) -> bool {
        let Some(symbol) = ctx.options.symbol.clone() else {
            log::warn!("No symbol chosen");
            return false;
        };
        match place(ctx, &symbol, point) {
            Ok(true) => true,
            Ok(false) => {
                log::warn!("Symbol {symbol} not found");
                false
            }
            Err(err) => {
                log::error!("Cannot place symbol {symbol}: {err}");
                false
            }
        }
    }
}

fn place(ctx: &mut ToolContext<'_>, symbol: &str, point: Point) -> SceneResult<bool> {
    let (Some(source), Some((layer, origin))) = (ctx.scene.find_by_id(symbol), ctx.layer_point(point)) else {
        return Ok(false);
    };
    let mut copy = ctx.scene.get_node(source)?;
    copy.attributes.retain(|attribute| attribute.name != "id");

    let wrapper = ctx.add_transient(Some(layer), &NodeDescriptor::new("g").child(copy))?;
    ctx.scene.set_transform(wrapper, Affine::translate(origin.to_vec2()))?;
    ctx.commit_shape(wrapper, ToolName::Symbol)?;
    Ok(true)
}
