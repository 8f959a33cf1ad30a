// this_file: crates/glyphgen-ttf/src/sdf.rs

//! Signed distance fields from coverage masks
//!
//! Two Euclidean distance transforms (Felzenszwalb-Huttenlocher, separable
//! 1D parabola envelopes) over the inside and outside point sets of a
//! thresholded coverage mask, combined into a signed distance and mapped to
//! 8-bit values around a configurable edge level.

/// 1D squared-distance transform.
///
/// `f` holds per-cell source costs (0 at sites, a large sentinel elsewhere);
/// `d` receives the lower envelope of the shifted parabolas.
fn edt_1d(f: &[f32], d: &mut [f32]) {
    let n = f.len();
    if n == 0 {
        return;
    }
    if n == 1 {
        d[0] = f[0];
        return;
    }

    // v: parabola apexes forming the envelope, z: their intersection points
    let mut v = vec![0usize; n];
    let mut z = vec![f32::NEG_INFINITY; n + 1];
    z[1] = f32::INFINITY;
    let mut k = 0;

    for q in 1..n {
        let mut s;
        loop {
            let vk = v[k];
            s = ((f[q] + (q * q) as f32) - (f[vk] + (vk * vk) as f32)) / (2.0 * (q - vk) as f32);
            // z[0] is -inf, so the envelope head always accepts
            if s > z[k] || k == 0 {
                break;
            }
            k -= 1;
        }
        k += 1;
        v[k] = q;
        z[k] = s;
        z[k + 1] = f32::INFINITY;
    }

    k = 0;
    for q in 0..n {
        while z[k + 1] < q as f32 {
            k += 1;
        }
        let vk = v[k];
        let dx = q as i32 - vk as i32;
        d[q] = (dx * dx) as f32 + f[vk];
    }
}

/// 2D Euclidean distance to the nearest `true` cell, row pass then column
/// pass. Returns real distances, not squared.
pub(crate) fn distance_transform(sites: &[bool], width: usize, height: usize) -> Vec<f32> {
    let far = (width * width + height * height) as f32;
    let mut grid: Vec<f32> = sites.iter().map(|&s| if s { 0.0 } else { far }).collect();

    let mut row = vec![0.0f32; width];
    let mut row_out = vec![0.0f32; width];
    for y in 0..height {
        let span = y * width..(y + 1) * width;
        row.copy_from_slice(&grid[span.clone()]);
        edt_1d(&row, &mut row_out);
        grid[span].copy_from_slice(&row_out);
    }

    let mut col = vec![0.0f32; height];
    let mut col_out = vec![0.0f32; height];
    for x in 0..width {
        for y in 0..height {
            col[y] = grid[y * width + x];
        }
        edt_1d(&col, &mut col_out);
        for y in 0..height {
            grid[y * width + x] = col_out[y].sqrt();
        }
    }

    grid
}

/// Convert a coverage mask into an 8-bit signed distance field.
///
/// Coverage above 127 counts as inside. The result maps distance `d` (in
/// pixels, positive inside) to `edge_value + d * edge_value / padding`,
/// clamped to 0..=255, so the field reaches zero exactly `padding` pixels
/// outside the edge.
pub fn sdf_from_mask(
    coverage: &[u8],
    width: u32,
    height: u32,
    padding: u32,
    edge_value: u8,
) -> Vec<u8> {
    let w = width as usize;
    let h = height as usize;
    debug_assert_eq!(coverage.len(), w * h);
    debug_assert!(padding > 0);

    let inside: Vec<bool> = coverage.iter().map(|&a| a > 127).collect();
    let outside: Vec<bool> = inside.iter().map(|&b| !b).collect();

    let dist_to_inside = distance_transform(&inside, w, h);
    let dist_to_outside = distance_transform(&outside, w, h);

    let pixel_dist_scale = f32::from(edge_value) / padding.max(1) as f32;
    let edge = f32::from(edge_value);

    let mut out = vec![0u8; w * h];
    for i in 0..w * h {
        let signed = if inside[i] {
            dist_to_outside[i]
        } else {
            -dist_to_inside[i]
        };
        out[i] = (edge + signed * pixel_dist_scale).clamp(0.0, 255.0) as u8;
    }
    out
}
