// src/display.rs

use anyhow::Result;
use opencv::{core::Mat, highgui};
use tracing::warn;

/// `wait_key` codes carry modifier bits above the low byte.
pub fn is_quit_key(key: i32, quit_key: char) -> bool {
    key >= 0 && u32::from(quit_key) == (key & 0xFF) as u32
}

/// Live preview window. Closed on drop.
pub struct DisplayWindow {
    name: String,
    quit_key: char,
    poll_interval_ms: i32,
}

impl DisplayWindow {
    pub fn open(name: &str, quit_key: char, poll_interval_ms: i32) -> Result<Self> {
        highgui::named_window(name, highgui::WINDOW_AUTOSIZE)?;
        Ok(Self {
            name: name.to_string(),
            quit_key,
            poll_interval_ms: poll_interval_ms.max(1),
        })
    }

    /// Show a frame and poll the keyboard once. Returns `true` when the quit
    /// key was pressed.
    pub fn show(&self, frame: &Mat) -> Result<bool> {
        highgui::imshow(&self.name, frame)?;
        let key = highgui::wait_key(self.poll_interval_ms)?;
        Ok(is_quit_key(key, self.quit_key))
    }
}

impl Drop for DisplayWindow {
    fn drop(&mut self) {
        if let Err(e) = highgui::destroy_window(&self.name) {
            warn!("Failed to close display window: {}", e);
        }
    }
}
