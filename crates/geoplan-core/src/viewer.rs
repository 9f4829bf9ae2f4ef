//! Viewbox handling: per-plan zoom, panning and handle scale.

use crate::plans::{Massstab, PlanKind};
use kurbo::{Affine, Point, Rect, Size, Vec2};
use std::collections::HashMap;

/// Wheel zoom step as a fraction of the viewbox.
const ZOOM_STEP: f64 = 0.1;
/// Smallest handle scale.
const MIN_HANDLE_SCALE: f64 = 0.2;

/// A pan in progress.
#[derive(Debug, Clone, Copy)]
struct Pan {
    /// Screen to user at press time; kept fixed while dragging.
    inverse: Affine,
    start: Point,
    origin: Point,
}

/// The visible part of the drawing.
///
/// Every plan keeps its own zoomed viewbox, so switching plans returns to
/// where the user left off.
#[derive(Debug, Clone)]
pub struct Viewer {
    zooms: HashMap<PlanKind, Rect>,
    plan: Option<PlanKind>,
    massstab: Massstab,
    viewport: Option<Size>,
    enabled: bool,
    pan: Option<Pan>,
}

impl Default for Viewer {
    fn default() -> Self {
        Self {
            zooms: HashMap::new(),
            plan: None,
            massstab: Massstab::default(),
            viewport: None,
            enabled: true,
            pan: None,
        }
    }
}

impl Viewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a plan. The stored zoom is reused; `viewbox` only seeds it.
    pub fn set_plan(&mut self, plan: PlanKind, viewbox: Rect, massstab: Massstab) {
        self.zooms.entry(plan).or_insert(viewbox);
        self.plan = Some(plan);
        self.massstab = massstab;
        self.pan = None;
    }

    /// Drop a plan's zoom, e.g. after its region moved.
    pub fn reset_plan(&mut self, plan: PlanKind, viewbox: Rect) {
        self.zooms.insert(plan, viewbox);
    }

    pub fn plan(&self) -> Option<PlanKind> {
        self.plan
    }

    /// Current viewbox in user space.
    pub fn viewbox(&self) -> Option<Rect> {
        self.plan.and_then(|plan| self.zooms.get(&plan).copied())
    }

    fn viewbox_mut(&mut self) -> Option<&mut Rect> {
        let plan = self.plan?;
        self.zooms.get_mut(&plan)
    }

    /// Size of the drawing surface in screen pixels.
    pub fn set_viewport(&mut self, size: Size) {
        self.viewport = Some(size);
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Stop reacting to wheel and pan input.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.pan = None;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// User to screen, fitting the viewbox into the viewport centered.
    ///
    /// Identity until both a viewport and a viewbox are known.
    pub fn transform(&self) -> Affine {
        let (Some(viewport), Some(viewbox)) = (self.viewport, self.viewbox()) else {
            return Affine::IDENTITY;
        };
        if viewbox.width() <= 0.0 || viewbox.height() <= 0.0 {
            return Affine::IDENTITY;
        }
        let scale = (viewport.width / viewbox.width()).min(viewport.height / viewbox.height());
        let offset = Vec2::new(
            (viewport.width - viewbox.width() * scale) / 2.0,
            (viewport.height - viewbox.height() * scale) / 2.0,
        );
        Affine::translate(offset) * Affine::scale(scale) * Affine::translate(-viewbox.origin().to_vec2())
    }

    /// Screen to user.
    pub fn inverse_transform(&self) -> Affine {
        self.transform().inverse()
    }

    pub fn screen_to_user(&self, screen: Point) -> Point {
        self.inverse_transform() * screen
    }

    pub fn user_to_screen(&self, user: Point) -> Point {
        self.transform() * user
    }

    /// Zoom 10% in (negative `delta_y`) or out around the pointer.
    pub fn wheel(&mut self, screen: Point, delta_y: f64) -> bool {
        if !self.enabled || delta_y == 0.0 {
            return false;
        }
        let pointer = self.screen_to_user(screen);
        let Some(zoom) = self.viewbox_mut() else {
            return false;
        };
        let ratio_x = (pointer.x - zoom.x0) / zoom.width();
        let ratio_y = (pointer.y - zoom.y0) / zoom.height();
        let (width, height) = (zoom.width(), zoom.height());
        let sign = if delta_y < 0.0 { 1.0 } else { -1.0 };

        let x = zoom.x0 + sign * width * ratio_x * ZOOM_STEP;
        let y = zoom.y0 + sign * height * ratio_y * ZOOM_STEP;
        let size = Size::new(width * (1.0 - sign * ZOOM_STEP), height * (1.0 - sign * ZOOM_STEP));
        *zoom = Rect::from_origin_size((x, y), size);
        true
    }

    pub fn pan_start(&mut self, screen: Point) {
        if !self.enabled {
            return;
        }
        let Some(viewbox) = self.viewbox() else {
            return;
        };
        let inverse = self.inverse_transform();
        self.pan = Some(Pan {
            inverse,
            start: inverse * screen,
            origin: viewbox.origin(),
        });
    }

    /// Move the viewbox opposite to the pointer.
    pub fn pan_move(&mut self, screen: Point) -> bool {
        let Some(pan) = self.pan else {
            return false;
        };
        let pointer = pan.inverse * screen;
        let origin = pan.origin - (pointer - pan.start);
        match self.viewbox_mut() {
            Some(zoom) => {
                *zoom = Rect::from_origin_size(origin, zoom.size());
                true
            }
            None => false,
        }
    }

    pub fn pan_end(&mut self) {
        self.pan = None;
    }

    pub fn is_panning(&self) -> bool {
        self.pan.is_some()
    }

    /// Handle scale for the current zoom and plan scale.
    pub fn handle_scale(&self) -> Option<f64> {
        let width = self.viewbox()?.width();
        let scale = match self.massstab {
            Massstab::M200 => 0.4 * width / 200.0,
            Massstab::M500 => 1.2 * width / 500.0,
            Massstab::M1000 => 1.5 * width / 1000.0,
        };
        Some(scale.max(MIN_HANDLE_SCALE))
    }
}
