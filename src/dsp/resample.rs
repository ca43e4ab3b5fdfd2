use crate::utils::error::{AnalysisError, Result};
use std::f64::consts::PI;

const ZERO_CROSSINGS: f64 = 16.0;
const ROLLOFF: f64 = 0.95;

fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-12 {
        1.0
    } else {
        (PI * x).sin() / (PI * x)
    }
}

fn blackman(u: f64) -> f64 {
    if u.abs() >= 1.0 {
        return 0.0;
    }
    0.42 + 0.5 * (PI * u).cos() + 0.08 * (2.0 * PI * u).cos()
}

/// Band-limited windowed-sinc resampling.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == 0 || to_rate == 0 {
        return Err(AnalysisError::processing(format!(
            "Cannot resample from {} Hz to {} Hz",
            from_rate, to_rate
        )));
    }
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let ratio = f64::from(to_rate) / f64::from(from_rate);
    // 降頻時截止頻率落在新的 Nyquist
    let cutoff = ratio.min(1.0) * ROLLOFF;
    let half_width = ZERO_CROSSINGS / cutoff;

    let len = samples.len();
    let (from, to) = (u64::from(from_rate), u64::from(to_rate));
    let out_len = ((len as u64 * to).div_ceil(from)) as usize;
    let last = (len - 1) as f64;

    let mut out = Vec::with_capacity(out_len);
    for n in 0..out_len {
        let t = (n as u64 * from) as f64 / to as f64;
        let lo = (t - half_width).ceil().max(0.0) as usize;
        let hi = (t + half_width).floor().min(last) as usize;

        let mut acc = 0.0;
        for (k, &sample) in samples.iter().enumerate().take(hi + 1).skip(lo) {
            let offset = t - k as f64;
            acc += f64::from(sample) * sinc(cutoff * offset) * blackman(offset / half_width);
        }
        out.push((acc * cutoff) as f32);
    }

    tracing::debug!(
        "Resampled {} samples at {} Hz to {} samples at {} Hz",
        len,
        from_rate,
        out.len(),
        to_rate
    );

    Ok(out)
}
