//! Window surface size tracking.
//!
//! winit reports physical pixels; the scale factor (device pixel ratio) is
//! kept alongside so logical sizes can be derived. Zero sizes, which Wayland
//! and minimized windows produce, are clamped to 1x1.

/// Minimum surface dimension (prevents zero-size panics).
pub const MIN_SURFACE_DIMENSION: u32 = 1;

/// Physical pixel dimensions of a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhysicalSize {
    pub width: u32,
    pub height: u32,
}

impl PhysicalSize {
    /// Width over height.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Produced when the surface dimensions or scale factor change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceResizeEvent {
    pub physical: PhysicalSize,
    pub scale_factor: f64,
}

/// Current size of the render surface.
#[derive(Clone, Debug)]
pub struct SurfaceWrapper {
    physical: PhysicalSize,
    scale_factor: f64,
}

impl SurfaceWrapper {
    pub fn new(physical_width: u32, physical_height: u32, scale_factor: f64) -> Self {
        Self {
            physical: clamp(physical_width, physical_height),
            scale_factor: sanitize_scale(scale_factor),
        }
    }

    /// Apply a window resize. Returns an event only if the size changed.
    pub fn handle_resize(
        &mut self,
        physical_width: u32,
        physical_height: u32,
    ) -> Option<SurfaceResizeEvent> {
        let size = clamp(physical_width, physical_height);
        if size == self.physical {
            return None;
        }
        self.physical = size;
        Some(SurfaceResizeEvent {
            physical: size,
            scale_factor: self.scale_factor,
        })
    }

    /// Apply a scale factor change (window moved to another display, or the
    /// user changed display scaling). Returns an event if anything changed.
    pub fn handle_scale_factor_changed(
        &mut self,
        scale_factor: f64,
        physical_width: u32,
        physical_height: u32,
    ) -> Option<SurfaceResizeEvent> {
        let scale_factor = sanitize_scale(scale_factor);
        let scale_changed = scale_factor != self.scale_factor;
        self.scale_factor = scale_factor;
        match self.handle_resize(physical_width, physical_height) {
            Some(event) => Some(event),
            None if scale_changed => Some(SurfaceResizeEvent {
                physical: self.physical,
                scale_factor,
            }),
            None => None,
        }
    }

    pub fn physical_size(&self) -> PhysicalSize {
        self.physical
    }

    /// Logical size (physical / scale factor).
    pub fn logical_size(&self) -> (f64, f64) {
        (
            self.physical.width as f64 / self.scale_factor,
            self.physical.height as f64 / self.scale_factor,
        )
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.physical.aspect_ratio()
    }
}

fn clamp(width: u32, height: u32) -> PhysicalSize {
    PhysicalSize {
        width: width.max(MIN_SURFACE_DIMENSION),
        height: height.max(MIN_SURFACE_DIMENSION),
    }
}

fn sanitize_scale(scale_factor: f64) -> f64 {
    if scale_factor.is_finite() && scale_factor > 0.0 {
        scale_factor
    } else {
        1.0
    }
}
