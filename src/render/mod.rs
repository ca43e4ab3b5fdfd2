pub mod svg;

use crate::domain::model::HeartRateStatus;
use crate::domain::services::{cycle_label, is_murmur};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use svg::{Anchor, SvgDocument, TextStyle};

pub const SVG_MIME: &str = "image/svg+xml";

/// 波形圖所需資料
#[derive(Debug, Clone, Copy)]
pub struct WaveformInput<'a> {
    pub signal: &'a [f64],
    pub sample_rate: u32,
    pub peaks: &'a [usize],
    pub probabilities: &'a [f64],
    pub heart_rate: f64,
    pub hr_status: HeartRateStatus,
}

struct Frame {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
    duration: f64,
}

impl Frame {
    fn x(&self, seconds: f64) -> f64 {
        if self.duration <= 0.0 {
            return self.left;
        }
        self.left + (seconds / self.duration).clamp(0.0, 1.0) * self.width
    }

    fn right(&self) -> f64 {
        self.left + self.width
    }

    fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

fn tick_step(duration: f64) -> f64 {
    match duration {
        d if d <= 2.0 => 0.25,
        d if d <= 5.0 => 0.5,
        d if d <= 15.0 => 1.0,
        d if d <= 40.0 => 2.0,
        d if d <= 100.0 => 5.0,
        _ => 10.0,
    }
}

fn draw_time_axis(doc: &mut SvgDocument, frame: &Frame) {
    doc.line(
        (frame.left, frame.bottom()),
        (frame.right(), frame.bottom()),
        "black",
        1.0,
        1.0,
        false,
    );

    let step = tick_step(frame.duration);
    let ticks = (frame.duration / step).floor() as usize;
    for i in 0..=ticks {
        let t = i as f64 * step;
        let x = frame.x(t);
        doc.line((x, frame.bottom()), (x, frame.bottom() + 5.0), "black", 1.0, 1.0, false);
        doc.text(
            x,
            frame.bottom() + 20.0,
            &format!("{}", (t * 100.0).round() / 100.0),
            TextStyle {
                size: 12.0,
                anchor: Anchor::Middle,
                ..TextStyle::default()
            },
        );
    }

    doc.text(
        frame.left + frame.width / 2.0,
        frame.bottom() + 45.0,
        "Time (seconds)",
        TextStyle {
            anchor: Anchor::Middle,
            ..TextStyle::default()
        },
    );
}

/// (填色, 標籤) 圖例，由 (x, y) 往下排列
fn draw_legend(doc: &mut SvgDocument, x: f64, y: f64, items: &[(&str, &str)]) {
    for (i, (color, label)) in items.iter().enumerate() {
        let row = y + i as f64 * 22.0;
        doc.rect(x, row - 12.0, 16.0, 14.0, color, 0.8, Some("black"));
        doc.text(x + 24.0, row, label, TextStyle::default());
    }
}

/// 每個像素欄保留最小與最大值，點數上限約為 2 * columns
fn decimate(signal: &[f64], columns: usize) -> Vec<(usize, f64)> {
    if signal.len() <= columns * 2 || columns == 0 {
        return signal.iter().copied().enumerate().collect();
    }

    let bucket = signal.len().div_ceil(columns);
    let mut points = Vec::with_capacity(columns * 2);
    for (b, chunk) in signal.chunks(bucket).enumerate() {
        let base = b * bucket;
        let (mut min_i, mut max_i) = (0, 0);
        for (i, &v) in chunk.iter().enumerate() {
            if v < chunk[min_i] {
                min_i = i;
            }
            if v > chunk[max_i] {
                max_i = i;
            }
        }
        let (first, second) = if min_i <= max_i { (min_i, max_i) } else { (max_i, min_i) };
        points.push((base + first, chunk[first]));
        if second != first {
            points.push((base + second, chunk[second]));
        }
    }
    points
}

pub fn render_waveform(input: &WaveformInput<'_>) -> String {
    let (width, height) = (1800.0, 800.0);
    let fs = f64::from(input.sample_rate.max(1));
    let frame = Frame {
        left: 90.0,
        top: 90.0,
        width: width - 90.0 - 260.0,
        height: height - 90.0 - 80.0,
        duration: input.signal.len() as f64 / fs,
    };

    let max_amp = input.signal.iter().copied().fold(f64::MIN, f64::max).max(1e-9);
    let min_amp = input.signal.iter().copied().fold(f64::MAX, f64::min).min(-1e-9);
    // 上方保留空間放 S1/S2 標籤
    let y_top = max_amp * 1.15;
    let y = |v: f64| frame.top + (y_top - v) / (y_top - min_amp) * frame.height;

    let mut doc = SvgDocument::new(width, height);

    doc.text(
        width / 2.0,
        35.0,
        "Complete Heart Sound Explanation",
        TextStyle {
            size: 22.0,
            anchor: Anchor::Middle,
            bold: true,
            ..TextStyle::default()
        },
    );
    doc.text(
        width / 2.0,
        62.0,
        "S1 → Systole → S2 → Diastole",
        TextStyle {
            size: 16.0,
            anchor: Anchor::Middle,
            ..TextStyle::default()
        },
    );

    // 收縮期 / 舒張期區段
    for (i, window) in input.peaks.windows(3).enumerate() {
        let probability = input.probabilities.get(i).copied().unwrap_or(0.0);
        let murmur = is_murmur(probability);
        let systole = if murmur { "red" } else { "lightblue" };
        let diastole = if murmur { "darkred" } else { "plum" };

        let (s1, s2, next) = (
            window[0] as f64 / fs,
            window[1] as f64 / fs,
            window[2] as f64 / fs,
        );
        doc.rect(frame.x(s1), frame.top, frame.x(s2) - frame.x(s1), frame.height, systole, 0.25, None);
        doc.rect(frame.x(s2), frame.top, frame.x(next) - frame.x(s2), frame.height, diastole, 0.25, None);
    }

    let points: Vec<(f64, f64)> = decimate(input.signal, frame.width as usize)
        .into_iter()
        .map(|(i, v)| (frame.x(i as f64 / fs), y(v)))
        .collect();
    doc.polyline(&points, "black", 1.0, 0.7);

    for (i, &peak) in input.peaks.iter().enumerate() {
        let x = frame.x(peak as f64 / fs);
        let (label, color) = if i % 2 == 0 {
            ("S1 (Lub)", "purple")
        } else {
            ("S2 (Dub)", "darkcyan")
        };
        doc.line((x, frame.top), (x, frame.bottom()), "blue", 1.0, 0.4, true);
        doc.text(
            x,
            y(1.05 * max_amp),
            label,
            TextStyle {
                size: 11.0,
                color,
                anchor: Anchor::Middle,
                bold: true,
            },
        );
    }

    doc.line((frame.left, frame.top), (frame.left, frame.bottom()), "black", 1.0, 1.0, false);
    doc.text(
        25.0,
        frame.top + frame.height / 2.0,
        "Amplitude",
        TextStyle {
            anchor: Anchor::Middle,
            ..TextStyle::default()
        },
    );
    draw_time_axis(&mut doc, &frame);

    // 心率框
    doc.rect(frame.left + 10.0, frame.top + 10.0, 220.0, 52.0, input.hr_status.color(), 0.25, Some("black"));
    doc.text(
        frame.left + 20.0,
        frame.top + 32.0,
        &format!("Heart Rate: {:.1} BPM", input.heart_rate),
        TextStyle::default(),
    );
    doc.text(frame.left + 20.0, frame.top + 52.0, input.hr_status.label(), TextStyle::default());

    doc.text(frame.right() + 30.0, frame.top + 5.0, "S1 (Lub)", TextStyle {
        color: "purple",
        bold: true,
        ..TextStyle::default()
    });
    doc.text(frame.right() + 30.0, frame.top + 27.0, "S2 (Dub)", TextStyle {
        color: "darkcyan",
        bold: true,
        ..TextStyle::default()
    });
    draw_legend(
        &mut doc,
        frame.right() + 30.0,
        frame.top + 55.0,
        &[
            ("lightblue", "Normal Systole"),
            ("plum", "Normal Diastole"),
            ("red", "Systolic Murmur"),
            ("darkred", "Diastolic Murmur"),
        ],
    );

    doc.finish()
}

pub fn timeline_color(probability: f64) -> &'static str {
    match cycle_label(probability) {
        "Normal" => "green",
        "Murmur / Borderline" => "orange",
        _ => "red",
    }
}

/// 每個心動週期一段色條
pub fn render_timeline(cycles: &[(f64, f64)], probabilities: &[f64], duration: f64) -> String {
    let (width, height) = (1600.0, 220.0);
    let frame = Frame {
        left: 40.0,
        top: 70.0,
        width: width - 80.0,
        height: 70.0,
        duration,
    };

    let mut doc = SvgDocument::new(width, height);
    doc.text(
        width / 2.0,
        25.0,
        "Heart Sound Timeline",
        TextStyle {
            size: 18.0,
            anchor: Anchor::Middle,
            bold: true,
            ..TextStyle::default()
        },
    );

    let legend = [
        ("green", "Normal"),
        ("orange", "Murmur / Borderline"),
        ("red", "Abnormal"),
    ];
    for (i, (color, label)) in legend.iter().enumerate() {
        let x = width / 2.0 - 270.0 + i as f64 * 190.0;
        doc.rect(x, 40.0, 16.0, 14.0, color, 1.0, Some("black"));
        doc.text(x + 24.0, 52.0, label, TextStyle::default());
    }

    for (&(start, end), &probability) in cycles.iter().zip(probabilities) {
        let x0 = frame.x(start);
        doc.rect(
            x0,
            frame.top,
            frame.x(end) - x0,
            frame.height,
            timeline_color(probability),
            1.0,
            Some("black"),
        );
    }

    draw_time_axis(&mut doc, &frame);
    doc.finish()
}

pub fn to_base64(document: &str) -> String {
    STANDARD.encode(document.as_bytes())
}
