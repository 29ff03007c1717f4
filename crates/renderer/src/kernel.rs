//! Stamp kernels: the filled disk mask and the Gaussian weight square.

/// Default standard deviation of the Gaussian kernel, in pixels.
pub const DEFAULT_SIGMA: f32 = 8.0;

/// A `2r x 2r` raster of the disk inscribed in its square.
///
/// The fill follows the scanline rule of a non-antialiased arc fill: the
/// outline is snapped to the quarter-pixel grid (so the circle of radius `r`
/// is centered at `r + 0.25`) and a pixel is filled when its center lies
/// inside the outline. Row `y` covers columns `ceil(left - 0.5)` up to but
/// excluding `ceil(right - 0.5)`, where `left`/`right` are the outline
/// crossings of the scanline through `y + 0.5`.
#[derive(Debug, Clone)]
pub struct DiskMask {
    radius: u32,
    filled: Vec<bool>,
}

impl DiskMask {
    pub fn new(radius: u32) -> Self {
        let size = (radius * 2) as usize;
        let mut filled = vec![false; size * size];

        let r = radius as f64;
        let center = r + 0.25;
        for y in 0..size {
            let dy = y as f64 + 0.5 - center;
            let half_sq = r * r - dy * dy;
            if half_sq <= 0.0 {
                continue;
            }
            let half = half_sq.sqrt();
            let first = ((center - half) - 0.5).ceil().max(0.0) as usize;
            let last = (((center + half) - 0.5).ceil().max(0.0) as usize).min(size);
            for x in first..last {
                filled[x * size + y] = true;
            }
        }

        Self { radius, filled }
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }

    /// Side length of the mask square.
    pub fn size(&self) -> usize {
        (self.radius * 2) as usize
    }

    pub fn is_filled(&self, x: usize, y: usize) -> bool {
        let size = self.size();
        x < size && y < size && self.filled[x * size + y]
    }

    /// Number of filled pixels.
    pub fn count(&self) -> usize {
        self.filled.iter().filter(|&&f| f).count()
    }

    /// Filled pixel offsets relative to the stamp center, `(x - r, y - r)`.
    pub fn offsets(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        let size = self.size();
        let r = self.radius as i64;
        self.filled
            .iter()
            .enumerate()
            .filter(|(_, &f)| f)
            .map(move |(i, _)| ((i / size) as i64 - r, (i % size) as i64 - r))
    }
}

/// Un-normalized Gaussian weights over a `(2r+1) x (2r+1)` square.
///
/// `weight(i, j) = exp(-((i-r)^2 + (j-r)^2) / (2 sigma^2))`, so the center
/// weight is exactly 1.
#[derive(Debug, Clone)]
pub struct GaussianKernel {
    radius: u32,
    sigma: f32,
    weights: Vec<f32>,
}

impl GaussianKernel {
    pub fn new(radius: u32, sigma: f32) -> Self {
        let size = (2 * radius + 1) as usize;
        let r = radius as f64;
        let denom = 2.0 * (sigma as f64) * (sigma as f64);

        let mut weights = vec![0.0f32; size * size];
        for i in 0..size {
            for j in 0..size {
                let di = i as f64 - r;
                let dj = j as f64 - r;
                weights[i * size + j] = (-(di * di + dj * dj) / denom).exp() as f32;
            }
        }

        Self {
            radius,
            sigma,
            weights,
        }
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }

    pub fn sigma(&self) -> f32 {
        self.sigma
    }

    pub fn size(&self) -> usize {
        (2 * self.radius + 1) as usize
    }

    pub fn weight(&self, i: usize, j: usize) -> f32 {
        self.weights[i * self.size() + j]
    }
}
