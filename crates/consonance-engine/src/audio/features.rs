//! Fingerprint computation: STFT, mel-cepstral coefficients, and
//! pitch-class energies.
//!
//! A fingerprint is two time-averaged vectors. The MFCC vector carries
//! the spectral envelope (timbre); the chroma vector carries how much
//! energy lands in each of the twelve pitch classes (harmony). Frame
//! matrices are collapsed by an arithmetic mean over time, so the
//! output size depends only on [`FeatureConfig`], never on the input.

use std::path::Path;

use rustfft::{num_complex::Complex, FftPlanner};

use consonance_core::Fingerprint;

use super::decoder::decode_audio;
use crate::error::ExtractError;

/// Parameters fixing fingerprint dimensionality and analysis
/// resolution.
///
/// Two caches built with different parameter sets are not comparable,
/// and the cache file carries no version marker; re-index after
/// changing any of these.
#[derive(Debug, Clone)]
pub struct FeatureConfig {
    pub fft_size: usize,
    pub hop_size: usize,
    pub mel_filters: usize,
    pub mfcc_coeffs: usize,
    pub chroma_bins: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            hop_size: 512,
            mel_filters: 40,
            mfcc_coeffs: 13,
            chroma_bins: 12,
        }
    }
}

/// Extract a fingerprint from one audio file.
///
/// Deterministic: the same bytes under the same configuration always
/// produce the same vectors.
pub fn extract(path: &Path, config: &FeatureConfig) -> Result<Fingerprint, ExtractError> {
    let audio = decode_audio(path)?;
    if audio.samples.len() < config.fft_size {
        return Err(ExtractError::new(
            path,
            format!(
                "audio too short for analysis: {} samples, need at least {}",
                audio.samples.len(),
                config.fft_size
            ),
        ));
    }

    let spectrogram = stft(&audio.samples, config);
    let mfcc = mfcc_mean(&spectrogram, audio.sample_rate, config);
    let chroma = chroma_mean(&spectrogram, audio.sample_rate, config);

    Ok(Fingerprint { mfcc, chroma })
}

#[allow(clippy::cast_precision_loss)]
fn hann_window(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| {
            let t = (std::f32::consts::PI * i as f32) / (n as f32);
            t.sin() * t.sin()
        })
        .collect()
}

/// Magnitude spectrogram: one `fft_size / 2 + 1` row per hop-advanced
/// Hann-windowed frame. A trailing partial frame is dropped.
fn stft(samples: &[f32], config: &FeatureConfig) -> Vec<Vec<f32>> {
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(config.fft_size);
    let window = hann_window(config.fft_size);
    let bins = config.fft_size / 2 + 1;

    let mut frames = Vec::new();
    let mut buffer = vec![Complex::new(0.0_f32, 0.0); config.fft_size];
    let mut pos = 0;
    while pos + config.fft_size <= samples.len() {
        for (slot, (&sample, &w)) in buffer
            .iter_mut()
            .zip(samples[pos..pos + config.fft_size].iter().zip(&window))
        {
            *slot = Complex::new(sample * w, 0.0);
        }
        fft.process(&mut buffer);
        frames.push(buffer[..bins].iter().map(|c| c.norm()).collect());
        pos += config.hop_size;
    }
    frames
}

fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10.0_f32.powf(mel / 2595.0) - 1.0)
}

/// Triangular mel filterbank over the STFT bins, filters evenly spaced
/// on the mel scale from 0 Hz to Nyquist.
#[allow(clippy::cast_precision_loss)]
fn mel_filterbank(config: &FeatureConfig, sample_rate: u32) -> Vec<Vec<f32>> {
    let bins = config.fft_size / 2 + 1;
    let nyquist = sample_rate as f32 / 2.0;
    let mel_max = hz_to_mel(nyquist);

    // num_filters + 2 edge points; filter m spans points m..m+2.
    let edges: Vec<f32> = (0..config.mel_filters + 2)
        .map(|i| {
            let mel = mel_max * i as f32 / (config.mel_filters + 1) as f32;
            mel_to_hz(mel) * config.fft_size as f32 / sample_rate as f32
        })
        .collect();

    let mut bank = vec![vec![0.0_f32; bins]; config.mel_filters];
    for (m, filter) in bank.iter_mut().enumerate() {
        let (lo, center, hi) = (edges[m], edges[m + 1], edges[m + 2]);
        for (bin, weight) in filter.iter_mut().enumerate() {
            let b = bin as f32;
            *weight = if b <= center {
                (b - lo) / (center - lo).max(1e-6)
            } else {
                (hi - b) / (hi - center).max(1e-6)
            }
            .clamp(0.0, 1.0);
        }
    }
    bank
}

/// Time-averaged MFCC vector: mel filterbank energies, logged, then
/// DCT-II down to `mfcc_coeffs` coefficients per frame, averaged over
/// frames.
#[allow(clippy::cast_precision_loss)]
fn mfcc_mean(spectrogram: &[Vec<f32>], sample_rate: u32, config: &FeatureConfig) -> Vec<f32> {
    let bank = mel_filterbank(config, sample_rate);

    // Pre-compute the DCT-II basis once per call.
    let mut dct_basis = vec![vec![0.0_f32; config.mel_filters]; config.mfcc_coeffs];
    for (k, basis) in dct_basis.iter_mut().enumerate() {
        for (n, b) in basis.iter_mut().enumerate() {
            *b = (std::f32::consts::PI * k as f32 * (n as f32 + 0.5) / config.mel_filters as f32)
                .cos();
        }
    }

    let mut mean = vec![0.0_f32; config.mfcc_coeffs];
    for frame in spectrogram {
        let log_energies: Vec<f32> = bank
            .iter()
            .map(|filter| {
                let energy: f32 = filter.iter().zip(frame).map(|(&w, &mag)| w * mag).sum();
                (energy + 1e-10).ln()
            })
            .collect();

        for (slot, basis) in mean.iter_mut().zip(&dct_basis) {
            *slot += log_energies
                .iter()
                .zip(basis)
                .map(|(&e, &b)| e * b)
                .sum::<f32>();
        }
    }

    let frames = spectrogram.len().max(1) as f32;
    for slot in &mut mean {
        *slot /= frames;
    }
    mean
}

/// Time-averaged chroma vector: STFT bins assigned to pitch classes by
/// their MIDI note number, energy-weighted, L1-normalized per frame,
/// averaged over frames.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn chroma_mean(spectrogram: &[Vec<f32>], sample_rate: u32, config: &FeatureConfig) -> Vec<f32> {
    let bins = config.fft_size / 2 + 1;
    let classes = config.chroma_bins;

    // Bin → pitch class, computed once. Bins outside the musically
    // useful band contribute nothing.
    let bin_class: Vec<Option<usize>> = (0..bins)
        .map(|bin| {
            let freq = bin as f32 * sample_rate as f32 / config.fft_size as f32;
            if !(20.0..=8000.0).contains(&freq) {
                return None;
            }
            let midi = 69.0 + 12.0 * (freq / 440.0).log2();
            let class = (midi.round() as i32).rem_euclid(classes as i32) as usize;
            Some(class)
        })
        .collect();

    let mut mean = vec![0.0_f32; classes];
    for frame in spectrogram {
        let mut energies = vec![0.0_f32; classes];
        for (&mag, class) in frame.iter().zip(&bin_class) {
            if let Some(class) = class {
                energies[*class] += mag * mag;
            }
        }
        let total: f32 = energies.iter().sum::<f32>().max(1e-10);
        for (slot, energy) in mean.iter_mut().zip(&energies) {
            *slot += energy / total;
        }
    }

    let frames = spectrogram.len().max(1) as f32;
    for slot in &mut mean {
        *slot /= frames;
    }
    mean
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(clippy::cast_precision_loss)]
    fn sine(freq: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                (2.0 * std::f32::consts::PI * freq * t).sin() * 0.5
            })
            .collect()
    }

    #[test]
    fn stft_frame_count_follows_hop() {
        let config = FeatureConfig::default();
        let samples = sine(440.0, 22050, 8192);
        let frames = stft(&samples, &config);
        // (8192 - 2048) / 512 + 1
        assert_eq!(frames.len(), 13);
        assert_eq!(frames[0].len(), config.fft_size / 2 + 1);
    }

    #[test]
    fn hann_window_tapers_to_zero() {
        let window = hann_window(2048);
        assert!(window[0].abs() < 1e-6);
        assert!((window[1024] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn vector_lengths_are_fixed_by_config() {
        let config = FeatureConfig::default();
        let samples = sine(440.0, 22050, 8192);
        let spectrogram = stft(&samples, &config);
        assert_eq!(mfcc_mean(&spectrogram, 22050, &config).len(), 13);
        assert_eq!(chroma_mean(&spectrogram, 22050, &config).len(), 12);
    }

    #[test]
    fn sine_at_concert_pitch_peaks_in_pitch_class_a() {
        let config = FeatureConfig::default();
        let samples = sine(440.0, 22050, 16384);
        let spectrogram = stft(&samples, &config);
        let chroma = chroma_mean(&spectrogram, 22050, &config);

        // With C = 0, A is pitch class 9.
        let peak = chroma
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i);
        assert_eq!(peak, Some(9));
    }

    #[test]
    fn different_tones_produce_different_features() {
        let config = FeatureConfig::default();
        let low = stft(&sine(220.0, 22050, 8192), &config);
        let high = stft(&sine(3520.0, 22050, 8192), &config);
        assert_ne!(
            mfcc_mean(&low, 22050, &config),
            mfcc_mean(&high, 22050, &config)
        );
        assert_ne!(
            chroma_mean(&low, 22050, &config),
            chroma_mean(&high, 22050, &config)
        );
    }

    #[test]
    fn identical_input_produces_identical_features() {
        let config = FeatureConfig::default();
        let samples = sine(523.25, 44100, 8192);
        let a = stft(&samples, &config);
        let b = stft(&samples, &config);
        assert_eq!(mfcc_mean(&a, 44100, &config), mfcc_mean(&b, 44100, &config));
        assert_eq!(
            chroma_mean(&a, 44100, &config),
            chroma_mean(&b, 44100, &config)
        );
    }
}
