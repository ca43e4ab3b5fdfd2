// Butterworth 帶通：二階節串接，正反兩次套用達到零相位
use crate::utils::error::{AnalysisError, Result};
use std::f64::consts::PI;

/// 轉置直接二型，a0 正規化為 1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl Biquad {
    fn lowpass(k: f64, q: f64) -> Self {
        let k2 = k * k;
        let norm = 1.0 / (1.0 + k / q + k2);
        let b0 = k2 * norm;
        Self {
            b0,
            b1: 2.0 * b0,
            b2: b0,
            a1: 2.0 * (k2 - 1.0) * norm,
            a2: (1.0 - k / q + k2) * norm,
        }
    }

    fn highpass(k: f64, q: f64) -> Self {
        let k2 = k * k;
        let norm = 1.0 / (1.0 + k / q + k2);
        Self {
            b0: norm,
            b1: -2.0 * norm,
            b2: norm,
            a1: 2.0 * (k2 - 1.0) * norm,
            a2: (1.0 - k / q + k2) * norm,
        }
    }

    fn first_order_lowpass(k: f64) -> Self {
        let norm = 1.0 / (1.0 + k);
        Self {
            b0: k * norm,
            b1: k * norm,
            b2: 0.0,
            a1: (k - 1.0) * norm,
            a2: 0.0,
        }
    }

    fn first_order_highpass(k: f64) -> Self {
        let norm = 1.0 / (1.0 + k);
        Self {
            b0: norm,
            b1: -norm,
            b2: 0.0,
            a1: (k - 1.0) * norm,
            a2: 0.0,
        }
    }

    /// 0 Hz 增益
    pub fn dc_gain(&self) -> f64 {
        (self.b0 + self.b1 + self.b2) / (1.0 + self.a1 + self.a2)
    }

    // 常數輸入 x0 不產生暫態的初始狀態
    fn steady_state(&self, x0: f64) -> [f64; 2] {
        let y = self.dc_gain() * x0;
        [y - self.b0 * x0, self.b2 * x0 - self.a2 * y]
    }

    fn run(&self, data: &mut [f64], mut z: [f64; 2]) {
        for sample in data.iter_mut() {
            let x = *sample;
            let y = self.b0 * x + z[0];
            z[0] = self.b1 * x - self.a1 * y + z[1];
            z[1] = self.b2 * x - self.a2 * y;
            *sample = y;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Low,
    High,
}

fn butterworth_sections(kind: Kind, cutoff_hz: f64, fs: f64, order: usize) -> Vec<Biquad> {
    // 預翹曲後的雙線性轉換
    let k = (PI * cutoff_hz / fs).tan();
    let mut sections = Vec::with_capacity(order.div_ceil(2));

    for i in 0..order / 2 {
        let angle = if order % 2 == 0 {
            (2 * i + 1) as f64 * PI / (2 * order) as f64
        } else {
            (i + 1) as f64 * PI / order as f64
        };
        let q = 1.0 / (2.0 * angle.cos());
        sections.push(match kind {
            Kind::Low => Biquad::lowpass(k, q),
            Kind::High => Biquad::highpass(k, q),
        });
    }

    if order % 2 == 1 {
        sections.push(match kind {
            Kind::Low => Biquad::first_order_lowpass(k),
            Kind::High => Biquad::first_order_highpass(k),
        });
    }

    sections
}

#[derive(Debug, Clone)]
pub struct BandPassFilter {
    sections: Vec<Biquad>,
    order: usize,
}

impl BandPassFilter {
    pub fn butterworth(lowcut_hz: f64, highcut_hz: f64, fs: f64, order: usize) -> Result<Self> {
        let nyquist = fs / 2.0;
        let invalid = |field: &str, value: f64, reason: &str| AnalysisError::InvalidConfigValueError {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        };

        if order == 0 {
            return Err(invalid("filter_order", 0.0, "Order must be at least 1"));
        }
        if lowcut_hz <= 0.0 {
            return Err(invalid("lowcut_hz", lowcut_hz, "Must be positive"));
        }
        if highcut_hz >= nyquist {
            return Err(invalid(
                "highcut_hz",
                highcut_hz,
                "Must be below the Nyquist frequency",
            ));
        }
        if lowcut_hz >= highcut_hz {
            return Err(invalid("lowcut_hz", lowcut_hz, "Must be below highcut"));
        }

        let mut sections = butterworth_sections(Kind::High, lowcut_hz, fs, order);
        sections.extend(butterworth_sections(Kind::Low, highcut_hz, fs, order));

        Ok(Self { sections, order })
    }

    pub fn sections(&self) -> &[Biquad] {
        &self.sections
    }

    fn run_with_initial_conditions(&self, data: &mut [f64]) {
        let Some(&first) = data.first() else {
            return;
        };
        let mut level = first;
        for section in &self.sections {
            let z = section.steady_state(level);
            section.run(data, z);
            level *= section.dc_gain();
        }
    }

    /// 零相位濾波，兩端以奇對稱反射補值
    pub fn filtfilt(&self, x: &[f64]) -> Vec<f64> {
        let n = x.len();
        if n < 2 {
            return x.to_vec();
        }

        let padlen = (3 * (2 * self.order + 1)).min(n - 1);
        let first = x[0];
        let last = x[n - 1];

        let mut ext = Vec::with_capacity(n + 2 * padlen);
        ext.extend((1..=padlen).rev().map(|i| 2.0 * first - x[i]));
        ext.extend_from_slice(x);
        ext.extend((1..=padlen).map(|i| 2.0 * last - x[n - 1 - i]));

        self.run_with_initial_conditions(&mut ext);
        ext.reverse();
        self.run_with_initial_conditions(&mut ext);
        ext.reverse();

        ext[padlen..padlen + n].to_vec()
    }
}
