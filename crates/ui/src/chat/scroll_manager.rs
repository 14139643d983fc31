use std::time::Instant;

use confab_chat::ScrollAnimation;
use gpui::{Pixels, ScrollHandle, point, px};

#[derive(Debug, Clone, Copy)]
struct ActiveAnimation {
    animation: ScrollAnimation,
    started_at: Instant,
}

/// Drives the animated scroll to the newest message.
pub struct ScrollManager {
    scroll_handle: ScrollHandle,
    pending_scroll_to_bottom: bool,
    active: Option<ActiveAnimation>,
}

impl ScrollManager {
    pub fn new() -> Self {
        Self {
            scroll_handle: ScrollHandle::new(),
            pending_scroll_to_bottom: false,
            active: None,
        }
    }

    pub fn handle(&self) -> &ScrollHandle {
        &self.scroll_handle
    }

    pub fn request_scroll_to_bottom(&mut self) {
        self.pending_scroll_to_bottom = true;
    }

    pub fn reset(&mut self) {
        self.active = None;
        self.pending_scroll_to_bottom = false;
        let current_x = self.scroll_handle.offset().x;
        self.scroll_handle.set_offset(point(current_x, Pixels::ZERO));
    }

    /// Advances the animation by one frame.
    ///
    /// Returns true while another frame is needed to finish.
    pub fn apply_pending_scroll(&mut self) -> bool {
        let target = self.bottom_offset();

        if self.pending_scroll_to_bottom {
            self.pending_scroll_to_bottom = false;
            if self.active.is_none() {
                self.active = Some(ActiveAnimation {
                    animation: ScrollAnimation::new(f32::from(self.scroll_handle.offset().y), target),
                    started_at: Instant::now(),
                });
            }
        }

        let Some(active) = self.active.as_mut() else {
            return false;
        };

        // Content keeps growing while the animation runs; chase the live bottom.
        active.animation.to = target;
        let elapsed = active.started_at.elapsed();
        let current_x = self.scroll_handle.offset().x;
        self.scroll_handle
            .set_offset(point(current_x, px(active.animation.offset_at(elapsed))));

        if active.animation.is_finished(elapsed) {
            self.active = None;
            return false;
        }
        true
    }

    /// GPUI uses negative Y offsets for scrolling down, so the tail sits at `-max`.
    fn bottom_offset(&self) -> f32 {
        let max_offset = self.scroll_handle.max_offset().height;
        if max_offset > Pixels::ZERO {
            -f32::from(max_offset)
        } else {
            0.0
        }
    }
}

impl Default for ScrollManager {
    fn default() -> Self {
        Self::new()
    }
}
