//! Window and screen dimensions.

use log::debug;

use crate::context::PageContext;

/// Inner window and physical screen size in CSS pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub window_width: u32,
    pub window_height: u32,
    pub screen_width: u32,
    pub screen_height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 800,
            screen_width: 1920,
            screen_height: 1080,
        }
    }
}

impl PageContext {
    pub const fn viewport(&self) -> Viewport {
        *self.viewport_state()
    }

    pub const fn window_width(&self) -> u32 {
        self.viewport_state().window_width
    }

    pub const fn window_height(&self) -> u32 {
        self.viewport_state().window_height
    }

    pub const fn screen_width(&self) -> u32 {
        self.viewport_state().screen_width
    }

    pub const fn screen_height(&self) -> u32 {
        self.viewport_state().screen_height
    }

    /// Resize the window. The screen is grown to contain it.
    pub fn resize_window(&mut self, width: u32, height: u32) {
        let viewport = self.viewport_state_mut();
        viewport.window_width = width;
        viewport.window_height = height;
        viewport.screen_width = viewport.screen_width.max(width);
        viewport.screen_height = viewport.screen_height.max(height);
        debug!(target: "page_kit::viewport", "window resized to {width}x{height}");
    }

    pub fn resize_screen(&mut self, width: u32, height: u32) {
        let viewport = self.viewport_state_mut();
        viewport.screen_width = width;
        viewport.screen_height = height;
        debug!(target: "page_kit::viewport", "screen resized to {width}x{height}");
    }
}
