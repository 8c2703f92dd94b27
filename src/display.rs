use minifb::{Window, WindowOptions};

use crate::emulator::{FRAME_HEIGHT, FRAME_WIDTH};
use crate::error::{EnvError, Result};

/// Window surface backing the `windowed` render mode.
pub struct Display {
    window: Window,
    buffer: Vec<u32>,
}

impl Display {
    pub fn open(title: &str) -> Result<Self> {
        let window = Window::new(
            title,
            FRAME_WIDTH,
            FRAME_HEIGHT,
            WindowOptions {
                scale: minifb::Scale::X2,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| EnvError::Config(format!("failed to open window: {e}")))?;
        Ok(Self {
            window,
            buffer: vec![0; FRAME_WIDTH * FRAME_HEIGHT],
        })
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    pub fn present(&mut self, rgb: &[u8]) -> Result<()> {
        blit_rgb_to_u32(rgb, &mut self.buffer);
        self.window
            .update_with_buffer(&self.buffer, FRAME_WIDTH, FRAME_HEIGHT)
            .map_err(EnvError::engine)
    }
}

fn blit_rgb_to_u32(fb: &[u8], out: &mut [u32]) {
    for (dst, src) in out.iter_mut().zip(fb.chunks_exact(3)) {
        *dst = ((src[0] as u32) << 16) | ((src[1] as u32) << 8) | (src[2] as u32);
    }
}
