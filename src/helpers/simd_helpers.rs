#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::{
    __m256i, _mm256_add_pd, _mm256_castsi256_pd, _mm256_cmpeq_epi64, _mm256_loadu_pd,
    _mm256_loadu_si256, _mm256_max_pd, _mm256_min_pd, _mm256_movemask_pd, _mm256_set1_epi64x,
    _mm256_set1_pd, _mm256_setzero_pd, _mm256_storeu_pd,
};

const LANES: usize = 4; // __m256d / __m256i hold 4 x 64-bit lanes

/// Sum of `values`; 0.0 for an empty slice.
pub fn sum_f64(values: &[f64]) -> f64 {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            return unsafe { sum_f64_avx2(values) };
        }
    }
    values.iter().sum()
}

/// Minimum and maximum of `values`, or `None` for an empty slice.
pub fn min_max_f64(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            return Some(unsafe { min_max_f64_avx2(values) });
        }
    }
    Some(min_max_f64_scalar(values))
}

/// Indices of every element equal to `target`, ascending.
pub fn filter_eq_i64(values: &[i64], target: i64) -> Vec<usize> {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            return unsafe { filter_eq_i64_avx2(values, target) };
        }
    }
    filter_eq_i64_scalar(values, target)
}

fn min_max_f64_scalar(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

fn filter_eq_i64_scalar(values: &[i64], target: i64) -> Vec<usize> {
    values
        .iter()
        .enumerate()
        .filter_map(|(i, &v)| if v == target { Some(i) } else { None })
        .collect()
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn sum_f64_avx2(values: &[f64]) -> f64 {
    let mut sum = _mm256_setzero_pd();

    let chunks = values.chunks_exact(LANES);
    let remainder = chunks.remainder();

    for chunk in chunks {
        let v = unsafe { _mm256_loadu_pd(chunk.as_ptr()) };
        sum = _mm256_add_pd(sum, v);
    }

    let mut sum_arr = [0f64; LANES];
    unsafe { _mm256_storeu_pd(sum_arr.as_mut_ptr(), sum) };

    let mut total: f64 = sum_arr.iter().sum();
    for &v in remainder {
        total += v;
    }
    total
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn min_max_f64_avx2(values: &[f64]) -> (f64, f64) {
    let mut min = _mm256_set1_pd(f64::INFINITY);
    let mut max = _mm256_set1_pd(f64::NEG_INFINITY);

    let chunks = values.chunks_exact(LANES);
    let remainder = chunks.remainder();

    for chunk in chunks {
        let v = unsafe { _mm256_loadu_pd(chunk.as_ptr()) };
        min = _mm256_min_pd(min, v);
        max = _mm256_max_pd(max, v);
    }

    let mut min_arr = [f64::INFINITY; LANES];
    let mut max_arr = [f64::NEG_INFINITY; LANES];
    unsafe { _mm256_storeu_pd(min_arr.as_mut_ptr(), min) };
    unsafe { _mm256_storeu_pd(max_arr.as_mut_ptr(), max) };

    let mut total_min = min_arr.iter().copied().fold(f64::INFINITY, f64::min);
    let mut total_max = max_arr.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    for &v in remainder {
        total_min = total_min.min(v);
        total_max = total_max.max(v);
    }
    (total_min, total_max)
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn filter_eq_i64_avx2(values: &[i64], target: i64) -> Vec<usize> {
    let mut out = Vec::new();
    let needle = _mm256_set1_epi64x(target);

    let chunks = values.chunks_exact(LANES);
    let remainder = chunks.remainder();

    for (chunk_idx, chunk) in chunks.enumerate() {
        let v = unsafe { _mm256_loadu_si256(chunk.as_ptr() as *const __m256i) };
        let mask = _mm256_cmpeq_epi64(v, needle);

        // trick: reinterpret as f64 lanes so movemask yields one bit per i64
        let mask_bits = _mm256_movemask_pd(_mm256_castsi256_pd(mask));
        for i in 0..LANES {
            if (mask_bits & (1 << i)) != 0 {
                out.push(chunk_idx * LANES + i);
            }
        }
    }

    let base = values.len() - remainder.len();
    for (i, &v) in remainder.iter().enumerate() {
        if v == target {
            out.push(base + i);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sum_matches_scalar() {
        let values: Vec<f64> = (1..=11).map(|v| v as f64).collect();
        assert_eq!(sum_f64(&values), 66.0);
        assert_eq!(sum_f64(&[]), 0.0);
    }

    #[test]
    fn min_max_covers_lanes_and_remainder() {
        let values = [5.0, 3.0, 9.0, 4.0, 7.0, -2.0, 8.0, 6.0, 11.0];
        assert_eq!(min_max_f64(&values), Some((-2.0, 11.0)));
        assert_eq!(min_max_f64(&[4.5]), Some((4.5, 4.5)));
        assert_eq!(min_max_f64(&[]), None);
    }

    #[test]
    fn filter_eq_returns_ascending_indices() {
        let years = [2020, 2021, 2020, 2022, 2020, 2021, 2020];
        assert_eq!(filter_eq_i64(&years, 2020), vec![0, 2, 4, 6]);
        assert_eq!(filter_eq_i64(&years, 2021), vec![1, 5]);
        assert!(filter_eq_i64(&years, 1999).is_empty());
    }
}
