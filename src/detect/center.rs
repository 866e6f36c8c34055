pub const CENTER_SEARCH_RADIUS_PERCENT: usize = 5;

/// The first lowest window wins ties.
pub fn find_center(curve: &[f64]) -> usize {
    let n = curve.len();
    if n == 0 {
        return 0;
    }
    let radius = (n * CENTER_SEARCH_RADIUS_PERCENT / 100) as isize;

    let mut offset = 0;
    let mut minimum = f64::INFINITY;
    for i in 0..n as isize {
        let v: f64 = (i - radius..=i + radius)
            .map(|j| curve[j.rem_euclid(n as isize) as usize])
            .sum();
        if v < minimum {
            minimum = v;
            offset = i as usize;
        }
    }
    offset
}

pub fn recenter(curve: &[f64], offset: usize) -> Vec<f64> {
    let n = curve.len();
    if n == 0 {
        return Vec::new();
    }
    let shift = n / 2 + n - offset % n;
    let mut centered = vec![0.0; n];
    for (i, &v) in curve.iter().enumerate() {
        centered[(i + shift) % n] = v;
    }
    centered
}
