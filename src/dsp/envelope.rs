use crate::utils::error::{AnalysisError, Result};
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// 依最大絕對值正規化到 [-1, 1]
pub fn normalize_peak(samples: &[f32]) -> Result<Vec<f64>> {
    let peak = samples
        .iter()
        .fold(0.0_f64, |acc, &s| acc.max(f64::from(s).abs()));

    if peak == 0.0 || !peak.is_finite() {
        return Err(AnalysisError::EmptySignal);
    }

    Ok(samples.iter().map(|&s| f64::from(s) / peak).collect())
}

/// Magnitude of the analytic signal.
pub fn hilbert_envelope(x: &[f64]) -> Vec<f64> {
    let n = x.len();
    if n == 0 {
        return Vec::new();
    }

    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(n);
    let inverse = planner.plan_fft_inverse(n);

    let mut spectrum: Vec<Complex<f64>> = x.iter().map(|&v| Complex::new(v, 0.0)).collect();
    forward.process(&mut spectrum);

    // 單邊頻譜加倍；DC 與 Nyquist 保持不變
    let positive_end = if n % 2 == 0 { n / 2 } else { n.div_ceil(2) };
    for bin in spectrum.iter_mut().take(positive_end).skip(1) {
        *bin *= 2.0;
    }
    let negative_start = if n % 2 == 0 { n / 2 + 1 } else { n.div_ceil(2) };
    for bin in spectrum.iter_mut().skip(negative_start) {
        *bin = Complex::new(0.0, 0.0);
    }

    inverse.process(&mut spectrum);

    let scale = 1.0 / n as f64;
    spectrum.iter().map(|c| c.norm() * scale).collect()
}

pub fn mean(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    x.iter().sum::<f64>() / x.len() as f64
}
