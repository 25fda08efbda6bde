use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::ExtractError;

/// Decoded audio as mono PCM samples at the file's native sample rate.
#[derive(Debug)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Decode an audio file to mono PCM samples.
///
/// Stereo and multichannel sources are mixed down by averaging
/// channels. No resampling is performed; feature computation works in
/// terms of the native rate.
pub fn decode_audio(path: &Path) -> Result<DecodedAudio, ExtractError> {
    let fail = |message: String| ExtractError::new(path, message);

    // 1. Open the media source
    let file = std::fs::File::open(path).map_err(|e| fail(format!("failed to open file: {e}")))?;
    let mss = MediaSourceStream::new(
        Box::new(file),
        symphonia::core::io::MediaSourceStreamOptions::default(),
    );

    // 2. Probe the format
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|s| s.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| fail(format!("failed to probe format: {e}")))?;

    let mut format = probed.format;

    // 3. Find the default audio track
    let track = format
        .default_track()
        .ok_or_else(|| fail("no default audio track found".to_string()))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    // 4. Create decoder
    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| fail(format!("failed to create decoder: {e}")))?;

    // 5. Decode all packets
    let mut sample_buf = None;
    let mut all_samples = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(fail(format!("failed to read packet: {e}"))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(audio_buf) => {
                if sample_buf.is_none() {
                    let spec = *audio_buf.spec();
                    let duration = audio_buf.capacity() as u64;
                    sample_buf = Some(SampleBuffer::<f32>::new(duration, spec));
                }

                if let Some(ref mut buf) = sample_buf {
                    buf.copy_interleaved_ref(audio_buf);
                    all_samples.extend_from_slice(buf.samples());
                }
            }
            // Recoverable per symphonia's contract: skip the bad packet.
            Err(symphonia::core::errors::Error::DecodeError(_)) => {}
            Err(e) => return Err(fail(format!("failed to decode packet: {e}"))),
        }
    }

    // 6. Convert to mono if multichannel (average channels)
    let channels = codec_params.channels.map_or(1, |c| c.count());
    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = if channels > 1 {
        all_samples
            .chunks(channels)
            .map(|chunk| chunk.iter().sum::<f32>() / channels as f32)
            .collect()
    } else {
        all_samples
    };

    if samples.is_empty() {
        return Err(fail("decoded stream contained no samples".to_string()));
    }

    let sample_rate = codec_params.sample_rate.unwrap_or(44100);

    Ok(DecodedAudio {
        samples,
        sample_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonexistent_file_reports_the_path() {
        let result = decode_audio(Path::new("/nonexistent/file.mp3"));
        let err = result.unwrap_err();
        assert_eq!(err.path, Path::new("/nonexistent/file.mp3"));
        assert!(
            err.message.contains("failed to open file"),
            "unexpected message: {}",
            err.message
        );
    }

    #[test]
    fn garbage_bytes_fail_to_probe() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("noise.wav");
        std::fs::write(&path, b"this is not a wav file at all").unwrap();

        let err = decode_audio(&path).unwrap_err();
        assert!(
            err.message.contains("probe") || err.message.contains("decode"),
            "unexpected message: {}",
            err.message
        );
    }
}
