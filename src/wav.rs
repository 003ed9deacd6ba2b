use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use hound::{WavReader, WavSpec, WavWriter};

/// Write mono samples as a 32-bit float WAV file
pub fn save_wav<P: AsRef<Path>>(
    path: P,
    samples: &[f32],
    sample_rate: u32,
) -> Result<(), hound::Error> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = WavWriter::create(path, spec)?;

    for &sample in samples {
        writer.write_sample(sample)?;
    }

    writer.finalize()?;
    Ok(())
}

/// Read a WAV file, keeping only its first channel
///
/// Returns the samples scaled to `[-1, 1]` and the file's sample rate.
pub fn read_wav_mono<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, u32), hound::Error> {
    let reader = WavReader::open(path.as_ref())?;
    let spec = reader.spec();
    let interleaved = read_samples(reader, &spec)?;

    let samples = interleaved
        .iter()
        .step_by(spec.channels.max(1) as usize)
        .copied()
        .collect();

    Ok((samples, spec.sample_rate))
}

fn read_samples(
    mut reader: WavReader<BufReader<File>>,
    spec: &WavSpec,
) -> Result<Vec<f32>, hound::Error> {
    match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect(),
        hound::SampleFormat::Int => {
            // 32-bit files overflow an i32 power of two
            let max_val = 2f32.powi(spec.bits_per_sample as i32 - 1);
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_read_mono() {
        let path =
            std::env::temp_dir().join(format!("firstream_wav_{}.wav", std::process::id()));
        let samples = vec![0.0, 0.25, -0.5, 1.0];

        save_wav(&path, &samples, 22050).unwrap();
        let (read, rate) = read_wav_mono(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(rate, 22050);
        assert_eq!(read, samples);
    }

    #[test]
    fn test_read_keeps_first_channel() {
        let path =
            std::env::temp_dir().join(format!("firstream_stereo_{}.wav", std::process::id()));
        let spec = WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for (left, right) in [(16384i16, -1i16), (-16384, 1)] {
            writer.write_sample(left).unwrap();
            writer.write_sample(right).unwrap();
        }
        writer.finalize().unwrap();

        let (read, _) = read_wav_mono(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(read, vec![0.5, -0.5]);
    }

    #[test]
    fn test_read_32_bit_int() {
        let path =
            std::env::temp_dir().join(format!("firstream_int32_{}.wav", std::process::id()));
        let spec = WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for sample in [0i32, 1 << 30, i32::MIN, i32::MAX] {
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();

        let (read, rate) = read_wav_mono(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(rate, 44100);
        assert_eq!(read.len(), 4);
        assert_eq!(read[0], 0.0);
        assert_eq!(read[1], 0.5);
        assert_eq!(read[2], -1.0);
        assert!((read[3] - 1.0).abs() < 1e-6);
    }
}
