//! Alpha-channel filters and resampling
//!
//! Blur and dilation operate on the alpha channel only (separable,
//! horizontal pass then vertical pass). Downscaling is area weighted.

use super::{Bitmap, PixelFormat};

impl Bitmap {
    /// Box blur of the alpha channel
    ///
    /// Each pass averages over a (2 * radius + 1) window, horizontally then
    /// vertically. Window samples outside the bitmap are not counted.
    pub fn blur_alpha(&mut self, radius: u32, passes: u32) {
        self.separable_alpha(radius, passes, |window| {
            let sum: u32 = window.iter().map(|&a| a as u32).sum();
            (sum / window.len() as u32) as u8
        });
    }

    /// Dilation of the alpha channel (max over the window)
    pub fn expand_alpha(&mut self, radius: u32, passes: u32) {
        self.separable_alpha(radius, passes, |window| {
            window.iter().copied().max().unwrap_or(0)
        });
    }

    fn separable_alpha(&mut self, radius: u32, passes: u32, reduce: impl Fn(&[u8]) -> u8) {
        if self.format != PixelFormat::Rgba {
            return;
        }
        let width = self.width as i32;
        let height = self.height as i32;
        let radius = radius as i32;
        let mut tmp = vec![0u8; (self.width * self.height) as usize];
        let mut window = Vec::with_capacity((2 * radius + 1) as usize);

        for _ in 0..passes {
            // Horizontal pass into tmp
            for y in 0..height {
                for x in 0..width {
                    window.clear();
                    for kx in -radius..=radius {
                        if let Some(a) = self.alpha(x + kx, y) {
                            window.push(a);
                        }
                    }
                    tmp[(y * width + x) as usize] = reduce(&window);
                }
            }

            // Vertical pass back into self
            for x in 0..width {
                for y in 0..height {
                    window.clear();
                    for ky in -radius..=radius {
                        let ypos = y + ky;
                        if ypos >= 0 && ypos < height {
                            window.push(tmp[(ypos * width + x) as usize]);
                        }
                    }
                    let value = reduce(&window);
                    self.set_alpha(x, y, value);
                }
            }
        }
    }

    /// Area-weighted resample to `new_width` x `new_height`
    ///
    /// Color is averaged over non-transparent source pixels only; alpha is
    /// averaged over the full covered area. Works for up- and down-scaling.
    pub fn downscale(&self, new_width: u32, new_height: u32) -> Bitmap {
        let mut out = Bitmap::new(new_width, new_height, self.format);
        if new_width == 0 || new_height == 0 || self.width == 0 || self.height == 0 {
            return out;
        }

        let xscale = self.width as f32 / new_width as f32;
        let yscale = self.height as f32 / new_height as f32;
        let weight_scale = xscale * yscale;
        let max_x = self.width as i32 - 1;
        let max_y = self.height as i32 - 1;

        for m in 0..new_height as i32 {
            for n in 0..new_width as i32 {
                // Edges of the new pixel in old pixel coordinates
                let left_f = n as f32 * xscale;
                let right_f = (n + 1) as f32 * xscale;
                let top_f = m as f32 * yscale;
                let bottom_f = (m + 1) as f32 * yscale;

                let left = (left_f as i32).max(0);
                let top = (top_f as i32).max(0);
                let right = (right_f as i32).min(max_x);
                let bottom = (bottom_f as i32).min(max_y);

                let mut summed = [0f32; 4];
                let mut colour_weight = 0f32;

                for j in top..=bottom {
                    for i in left..=right {
                        let span_x = right_f.min((i + 1) as f32) - left_f.max(i as f32);
                        let span_y = bottom_f.min((j + 1) as f32) - top_f.max(j as f32);
                        let weight = span_x * span_y;
                        let Some([r, g, b, a]) = self.pixel(i, j) else {
                            continue;
                        };

                        summed[3] += weight * a as f32;
                        if a != 0 {
                            summed[0] += weight * r as f32;
                            summed[1] += weight * g as f32;
                            summed[2] += weight * b as f32;
                            colour_weight += weight;
                        }
                    }
                }

                let channel = |v: f32| v.clamp(0.0, 255.0) as u8;
                let (r, g, b) = if colour_weight > 0.0 {
                    (
                        channel(summed[0] / colour_weight),
                        channel(summed[1] / colour_weight),
                        channel(summed[2] / colour_weight),
                    )
                } else {
                    (0, 0, 0)
                };
                out.set_pixel(n, m, [r, g, b, channel(summed[3] / weight_scale)]);
            }
        }

        out
    }
}
