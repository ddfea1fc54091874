use std::path::{Path, PathBuf};

use anyhow::Context;
use rubato::{FastFixedIn, PolynomialDegree, Resampler};

/// Sample rate the media server plays back natively.
pub const PLAYBACK_SAMPLE_RATE: u32 = 8000;

const RESAMPLER_CHUNK_SIZE: usize = 1024;

pub fn create_resampler(
    in_sampling_rate: f64,
    out_sampling_rate: f64,
    chunk_size: usize,
) -> anyhow::Result<FastFixedIn<f32>> {
    let resampler = FastFixedIn::<f32>::new(
        out_sampling_rate / in_sampling_rate,
        1.0,
        PolynomialDegree::Cubic,
        chunk_size,
        1
    )?;
    Ok(resampler)
}

pub fn split_for_chunks(samples: &[f32], chunk_size: usize) -> Vec<Vec<f32>> {
    samples.chunks(chunk_size).map(|chunk| {
        let mut chunk = chunk.to_vec();
        chunk.resize(chunk_size, 0.0);
        chunk
    }).collect()
}

/// Resamples mono samples, returning exactly `len * out / in` frames.
pub fn resample(
    samples: &[f32],
    in_sampling_rate: u32,
    out_sampling_rate: u32,
) -> anyhow::Result<Vec<f32>> {
    if in_sampling_rate == out_sampling_rate {
        return Ok(samples.to_vec());
    }
    let mut resampler = create_resampler(
        in_sampling_rate as f64,
        out_sampling_rate as f64,
        RESAMPLER_CHUNK_SIZE,
    )?;
    let mut out = Vec::new();
    for chunk in split_for_chunks(samples, RESAMPLER_CHUNK_SIZE) {
        let frames = resampler.process(&[chunk], None)?;
        if let Some(channel) = frames.first() {
            out.extend_from_slice(channel);
        }
    }
    let ratio = out_sampling_rate as f64 / in_sampling_rate as f64;
    let expected = (samples.len() as f64 * ratio).round() as usize;
    out.resize(expected, 0.0);
    Ok(out)
}

/// Reads a WAV file and downmixes it to mono f32 samples.
fn read_mono(path: &Path) -> anyhow::Result<(Vec<f32>, u32)> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    let mono = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();
    Ok((mono, spec.sample_rate))
}

fn write_pcm16(path: &Path, samples: &[f32], sample_rate: u32) -> anyhow::Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Transcodes `file_in` into a mono 16-bit WAV at [`PLAYBACK_SAMPLE_RATE`] and
/// returns the path of the resulting file.
pub fn transcode(file_in: &Path, file_out: &Path) -> anyhow::Result<PathBuf> {
    let (samples, sample_rate) = read_mono(file_in)
        .with_context(|| format!("Cannot process audio: {}", file_in.display()))?;
    let resampled = resample(&samples, sample_rate, PLAYBACK_SAMPLE_RATE)
        .context("Cannot process audio: resampling failed")?;
    write_pcm16(file_out, &resampled, PLAYBACK_SAMPLE_RATE)
        .with_context(|| format!("Cannot process audio: {}", file_out.display()))?;
    tracing::debug!(
        "transcoded {} ({} Hz, {} frames) -> {}",
        file_in.display(),
        sample_rate,
        samples.len(),
        file_out.display()
    );
    Ok(file_out.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_tone(path: &Path, sample_rate: u32, channels: u16, frames: usize) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..frames {
            let t = i as f32 / sample_rate as f32;
            let v = ((t * 440.0 * std::f32::consts::TAU).sin() * 0.5 * i16::MAX as f32) as i16;
            for _ in 0..channels {
                writer.write_sample(v).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_transcode_to_playback_format() {
        let dir = tempfile::tempdir().unwrap();
        let file_in = dir.path().join("in.wav");
        let file_out = dir.path().join("out.wav");
        write_tone(&file_in, 16000, 2, 16000);

        let out = transcode(&file_in, &file_out).unwrap();
        assert_eq!(out, file_out);

        let reader = hound::WavReader::open(&out).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, PLAYBACK_SAMPLE_RATE);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(reader.duration(), 8000);
    }

    #[test]
    fn test_transcode_keeps_matching_rate() {
        let dir = tempfile::tempdir().unwrap();
        let file_in = dir.path().join("in.wav");
        let file_out = dir.path().join("out.wav");
        write_tone(&file_in, PLAYBACK_SAMPLE_RATE, 1, 400);

        transcode(&file_in, &file_out).unwrap();
        let reader = hound::WavReader::open(&file_out).unwrap();
        assert_eq!(reader.duration(), 400);
    }

    #[test]
    fn test_transcode_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = transcode(&dir.path().join("missing.wav"), &dir.path().join("out.wav"))
            .unwrap_err();
        assert!(err.to_string().starts_with("Cannot process audio"));
    }

    #[test]
    fn test_split_for_chunks_pads_last_chunk() {
        let chunks = split_for_chunks(&[1.0; 5], 4);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1], vec![1.0, 0.0, 0.0, 0.0]);
    }
}
