//! Tray icon rendering
//!
//! The icons are drawn procedurally instead of shipping image assets: a
//! filled dot whose color tells the armed state apart at a glance. Muted
//! gray while idle, green while the boss key is live.

use tray_icon::Icon;

const ICON_SIZE: u32 = 32;

/// Idle dot color (gray)
const IDLE_RGBA: [u8; 4] = [0x9e, 0x9e, 0x9e, 0xff];
/// Armed dot color (green)
const ARMED_RGBA: [u8; 4] = [0x43, 0xa0, 0x47, 0xff];

/// Pre-rendered icons for both armed states
pub struct TrayIcons {
    pub idle: Icon,
    pub armed: Icon,
}

impl TrayIcons {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            idle: render_dot(IDLE_RGBA)?,
            armed: render_dot(ARMED_RGBA)?,
        })
    }
}

/// Rasterize a centered anti-aliased dot in the given color
fn render_dot(color: [u8; 4]) -> anyhow::Result<Icon> {
    let size = ICON_SIZE;
    let center = (size as f32 - 1.0) / 2.0;
    let radius = size as f32 * 0.38;

    let mut rgba = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let dx = x as f32 - center;
            let dy = y as f32 - center;
            let distance = (dx * dx + dy * dy).sqrt();
            // one-pixel soft edge
            let coverage = (radius - distance + 0.5).clamp(0.0, 1.0);
            let alpha = (color[3] as f32 * coverage) as u8;
            rgba.extend_from_slice(&[color[0], color[1], color[2], alpha]);
        }
    }

    Icon::from_rgba(rgba, size, size)
        .map_err(|e| anyhow::anyhow!("Failed to create tray icon: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_buffer_dimensions() {
        // exercise the rasterizer without a windowing system
        let size = ICON_SIZE;
        let center = (size as f32 - 1.0) / 2.0;
        let radius = size as f32 * 0.38;
        let mut opaque = 0usize;
        for y in 0..size {
            for x in 0..size {
                let dx = x as f32 - center;
                let dy = y as f32 - center;
                if (dx * dx + dy * dy).sqrt() < radius {
                    opaque += 1;
                }
            }
        }
        // the dot covers a meaningful share of the canvas but not all of it
        assert!(opaque > (size * size) as usize / 8);
        assert!(opaque < (size * size) as usize / 2);
    }
}
