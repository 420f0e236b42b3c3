//! Initial-condition families for dataset trajectories.

use clap::ValueEnum;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Smallest grid every family can be drawn on.
pub const MIN_IC_SIZE: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum IcFamily {
    Gaussians,
    Rectangles,
    SmoothNoise,
    GradientMix,
}

impl IcFamily {
    pub const ALL: [IcFamily; 4] = [
        IcFamily::Gaussians,
        IcFamily::Rectangles,
        IcFamily::SmoothNoise,
        IcFamily::GradientMix,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IcFamily::Gaussians => "gaussians",
            IcFamily::Rectangles => "rectangles",
            IcFamily::SmoothNoise => "smooth_noise",
            IcFamily::GradientMix => "gradient_mix",
        }
    }

    /// Uniform over the four families.
    pub fn sample<R: Rng>(rng: &mut R) -> IcFamily {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    /// Draws an N×N row-major field normalized so its maximum is 1.
    pub fn generate<R: Rng>(&self, rng: &mut R, n: usize) -> Vec<f32> {
        debug_assert!(n >= MIN_IC_SIZE);
        let mut f = vec![0.0f32; n * n];
        let span = n as f32 - 1.0;

        match self {
            IcFamily::Gaussians => {
                for _ in 0..rng.gen_range(1..=3) {
                    let cx = rng.gen_range(0.15..0.85) * span;
                    let cy = rng.gen_range(0.15..0.85) * span;
                    let sigma = rng.gen_range(1.5..6.0);
                    let amp = rng.gen_range(0.6..1.0);
                    add_gaussian(&mut f, n, (cx, cy), sigma, amp);
                }
            }

            IcFamily::Rectangles => {
                for _ in 0..rng.gen_range(1..=4) {
                    let x0 = rng.gen_range(1..n / 2);
                    let y0 = rng.gen_range(1..n / 2);
                    let x1 = (x0 + rng.gen_range(2..n / 2)).min(n - 2);
                    let y1 = (y0 + rng.gen_range(2..n / 2)).min(n - 2);
                    let level = rng.gen_range(0.5..1.0);

                    for y in y0..=y1 {
                        for v in &mut f[y * n + x0..=y * n + x1] {
                            *v = v.max(level);
                        }
                    }
                }
            }

            IcFamily::SmoothNoise => {
                f.iter_mut().for_each(|v| *v = rng.gen_range(0.0..1.0));
                f = box_blur(&f, n, 2);
            }

            IcFamily::GradientMix => {
                let axis = rng.gen_range(0..4);
                for y in 0..n {
                    for x in 0..n {
                        let t = match axis {
                            0 => x as f32 / span,
                            1 => y as f32 / span,
                            2 => 1.0 - x as f32 / span,
                            _ => 1.0 - y as f32 / span,
                        };
                        f[y * n + x] = 0.6 * t;
                    }
                }
                let cx = rng.gen_range(0.2..0.8) * span;
                let cy = rng.gen_range(0.2..0.8) * span;
                let sigma = rng.gen_range(2.0..7.0);
                let amp = rng.gen_range(0.4..0.9);
                add_gaussian(&mut f, n, (cx, cy), sigma, amp);
            }
        }

        normalize_peak(&mut f);
        f
    }
}

fn add_gaussian(f: &mut [f32], n: usize, (cx, cy): (f32, f32), sigma: f32, amp: f32) {
    let inv = -0.5 / (sigma * sigma);
    for y in 0..n {
        for x in 0..n {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            f[y * n + x] += amp * ((dx * dx + dy * dy) * inv).exp();
        }
    }
}

fn normalize_peak(f: &mut [f32]) {
    let peak = f.iter().copied().fold(0.0f32, f32::max);
    if peak > 0.0 {
        f.iter_mut().for_each(|v| *v = (*v / peak).clamp(0.0, 1.0));
    }
}

/// 3×3 mean filter, truncated at the edges.
fn box_blur(src: &[f32], n: usize, passes: usize) -> Vec<f32> {
    let mut cur = src.to_vec();
    let mut tmp = vec![0.0f32; n * n];

    for _ in 0..passes {
        for y in 0..n {
            for x in 0..n {
                let ys = y.saturating_sub(1)..=(y + 1).min(n - 1);
                let mut sum = 0.0;
                let mut count = 0.0;
                for yy in ys {
                    for xx in x.saturating_sub(1)..=(x + 1).min(n - 1) {
                        sum += cur[yy * n + xx];
                        count += 1.0;
                    }
                }
                tmp[y * n + x] = sum / count;
            }
        }
        std::mem::swap(&mut cur, &mut tmp);
    }
    cur
}
