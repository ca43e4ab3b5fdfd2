use crate::domain::model::Recording;
use crate::utils::error::{AnalysisError, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::Cursor;

/// 解碼 WAV 並把多聲道平均成單聲道
pub fn decode_wav(bytes: &[u8], source: &str) -> Result<Recording> {
    let mut reader = WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();

    tracing::debug!(
        "WAV {}: {} Hz, {} channel(s), {} bit {:?}",
        source,
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample,
        spec.sample_format
    );

    if spec.channels == 0 {
        return Err(AnalysisError::processing(format!(
            "Invalid WAV header in {}: no channels",
            source
        )));
    }
    // 先檢查標頭，避免讀入整個檔案後才拒絕
    Recording::new(Vec::new(), spec.sample_rate, source).check_sample_rate()?;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<std::result::Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    let channels = usize::from(spec.channels);
    let samples: Vec<f32> = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    if samples.is_empty() {
        return Err(AnalysisError::EmptySignal);
    }

    Ok(Recording::new(samples, spec.sample_rate, source))
}

/// 以 32-bit float 單聲道編碼
pub fn encode_wav_mono(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}
