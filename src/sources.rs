//! Excitation signals and observers
//!
//! Excitation sequences are generated up front and read one sample per step,
//! which keeps runs reproducible bit for bit. Three flavors:
//! - continuous sinusoid,
//! - Gaussian pulse,
//! - band-limited impulse with a flat spectrum between two bounds, for
//!   transfer-function extraction.
//!
//! Observers: the listener probe appends one pressure sample per step; a
//! [`FieldSink`] receives periodic field snapshots; the spectrum analyzer
//! turns a recorded series into a dB magnitude spectrum.

use rustfft::{num_complex::Complex, FftPlanner};

use crate::config::SourceSpec;

/// A pre-generated excitation sequence.
#[derive(Clone, Debug)]
pub struct SourceSignal {
    samples: Vec<f32>,
}

impl SourceSignal {
    /// Generate the configured signal, `len` samples at `srate` Hz.
    pub fn from_spec(spec: SourceSpec, srate: f32, len: usize) -> SourceSignal {
        match spec {
            SourceSpec::Sinusoid { freq } => Self::sinusoid(freq, srate, len),
            SourceSpec::Gaussian { freq } => Self::gaussian_pulse(freq, srate, len),
            SourceSpec::Impulse { fmin, fmax } => Self::band_impulse(fmin, fmax, srate, len),
        }
    }

    /// sin(2 pi f t).
    pub fn sinusoid(freq: f32, srate: f32, len: usize) -> SourceSignal {
        let dt = 1.0 / srate as f64;
        let samples = (0..len)
            .map(|n| {
                (std::f64::consts::TAU * freq as f64 * n as f64 * dt).sin() as f32
            })
            .collect();
        SourceSignal { samples }
    }

    /// exp(-((t - 6 tau) / tau)^2) with tau = 0.5 / f: effectively silent at
    /// t = 0, peaking at 6 tau.
    pub fn gaussian_pulse(freq: f32, srate: f32, len: usize) -> SourceSignal {
        let dt = 1.0 / srate;
        let tau = 0.5 / freq;
        let samples = (0..len)
            .map(|n| {
                let arg = (n as f32 * dt - 6.0 * tau) / tau;
                (-arg * arg).exp()
            })
            .collect();
        SourceSignal { samples }
    }

    /// Band-limited impulse: unit magnitude between `fmin` and `fmax`, zero
    /// outside, linear phase centering the pulse mid-buffer. Synthesized by
    /// an inverse FFT and peak-normalized.
    pub fn band_impulse(fmin: f32, fmax: f32, srate: f32, len: usize) -> SourceSignal {
        let n = len.next_power_of_two().clamp(256, 8192);
        let delay = (n / 2) as f32;

        let mut buf = vec![Complex::new(0.0f32, 0.0); n];
        for k in 0..=n / 2 {
            let f = k as f32 * srate / n as f32;
            if f >= fmin && f <= fmax {
                let phase = -2.0 * std::f32::consts::PI * k as f32 * delay / n as f32;
                let bin = Complex::from_polar(1.0, phase);
                buf[k] = bin;
                if k != 0 && k != n / 2 {
                    buf[n - k] = bin.conj();
                }
            }
        }

        let mut planner = FftPlanner::new();
        let ifft = planner.plan_fft_inverse(n);
        ifft.process(&mut buf);

        let mut samples: Vec<f32> = buf.iter().take(len.min(n)).map(|c| c.re).collect();
        let peak = samples.iter().fold(0.0f32, |m, &v| m.max(v.abs()));
        if peak > 0.0 {
            for s in &mut samples {
                *s /= peak;
            }
        }
        samples.resize(len, 0.0);
        SourceSignal { samples }
    }

    /// All-zero sequence.
    pub fn silence(len: usize) -> SourceSignal {
        SourceSignal {
            samples: vec![0.0; len],
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Listener probe: one pressure sample per completed step, append-only.
#[derive(Clone, Debug)]
pub struct Listener {
    position: (usize, usize),
    samples: Vec<f32>,
}

impl Listener {
    pub fn new(position: (usize, usize)) -> Listener {
        Listener {
            position,
            samples: Vec::new(),
        }
    }

    pub fn position(&self) -> (usize, usize) {
        self.position
    }

    pub fn record(&mut self, sample: f32) {
        self.samples.push(sample);
    }

    /// Drop the newest sample (used when a step's output is rejected).
    pub fn discard_last(&mut self) {
        self.samples.pop();
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Receiver for periodic pressure-field snapshots. Solid cells in the frame
/// carry [`crate::fdtd::WALL_SENTINEL`].
pub trait FieldSink {
    fn frame(&mut self, step: u64, width: usize, height: usize, pressure: &[f32]);
}

/// Keeps only the most recent snapshot.
#[derive(Default)]
pub struct LatestFrame {
    pub step: u64,
    pub width: usize,
    pub height: usize,
    pub pressure: Vec<f32>,
    pub frames_seen: usize,
}

impl FieldSink for LatestFrame {
    fn frame(&mut self, step: u64, width: usize, height: usize, pressure: &[f32]) {
        self.step = step;
        self.width = width;
        self.height = height;
        self.pressure.clear();
        self.pressure.extend_from_slice(pressure);
        self.frames_seen += 1;
    }
}

// ============================================================================
// Spectrum Analyzer (FFT-based)
// ============================================================================

/// Magnitude spectrum of a recorded series, Hann-windowed to tame leakage.
pub struct SpectrumAnalyzer {
    size: usize,
    window: Vec<f32>,
    spectrum: Vec<f32>,
    scratch: Vec<Complex<f32>>,
}

impl SpectrumAnalyzer {
    /// `size` is rounded up to a power of two.
    pub fn new(size: usize) -> SpectrumAnalyzer {
        let size = size.next_power_of_two();
        let mut window = vec![0.0; size];
        for (i, wv) in window.iter_mut().enumerate() {
            *wv = 0.5
                * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32).cos());
        }
        SpectrumAnalyzer {
            size,
            window,
            spectrum: vec![0.0; size / 2],
            scratch: vec![Complex::new(0.0, 0.0); size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Compute the spectrum in dB (20 log10 |X|), N/2 bins.
    pub fn compute(&mut self, samples: &[f32]) -> &[f32] {
        let n = self.size.min(samples.len());
        for i in 0..self.size {
            self.scratch[i] = if i < n {
                Complex::new(samples[i] * self.window[i], 0.0)
            } else {
                Complex::new(0.0, 0.0)
            };
        }

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(self.size);
        fft.process(&mut self.scratch);

        let scale = 1.0 / (self.size as f32).sqrt();
        for i in 0..self.size / 2 {
            let mag = self.scratch[i].norm() * scale;
            self.spectrum[i] = if mag > 1e-10 {
                20.0 * mag.log10()
            } else {
                -200.0
            };
        }
        &self.spectrum
    }

    /// Frequency of a bin at the given sample rate.
    pub fn bin_to_hz(&self, bin: usize, srate: f32) -> f32 {
        bin as f32 * srate / self.size as f32
    }

    /// Loudest bin between `lo_hz` and `hi_hz` in the last computed spectrum.
    pub fn peak_in_band(&self, lo_hz: f32, hi_hz: f32, srate: f32) -> usize {
        let hz_per_bin = srate / self.size as f32;
        let lo = (lo_hz / hz_per_bin).ceil() as usize;
        let hi = ((hi_hz / hz_per_bin).floor() as usize).min(self.spectrum.len() - 1);
        let mut best = lo;
        for bin in lo..=hi {
            if self.spectrum[bin] > self.spectrum[best] {
                best = bin;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sinusoid_starts_at_zero() {
        let signal = SourceSignal::sinusoid(1000.0, 44100.0, 64);
        assert_eq!(signal.samples()[0], 0.0);
        assert!(signal.samples()[5] > 0.0);
    }

    #[test]
    fn test_gaussian_peak_position() {
        let srate = 44100.0;
        let freq = 2000.0;
        let signal = SourceSignal::gaussian_pulse(freq, srate, 256);
        let peak_idx = (6.0 * 0.5 / freq * srate).round() as usize;
        let (argmax, _) = signal
            .samples()
            .iter()
            .enumerate()
            .fold((0, 0.0f32), |acc, (i, &v)| {
                if v > acc.1 {
                    (i, v)
                } else {
                    acc
                }
            });
        assert!(argmax.abs_diff(peak_idx) <= 1);
        assert!(signal.samples()[0] < 1e-6);
    }

    #[test]
    fn test_band_impulse_reproducible() {
        let a = SourceSignal::band_impulse(40.0, 2000.0, 44100.0, 4096);
        let b = SourceSignal::band_impulse(40.0, 2000.0, 44100.0, 4096);
        assert_eq!(a.samples(), b.samples());

        let peak = a.samples().iter().fold(0.0f32, |m, &v| m.max(v.abs()));
        assert!((peak - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_band_impulse_spectrum_is_banded() {
        let srate = 44100.0;
        let signal = SourceSignal::band_impulse(500.0, 4000.0, srate, 4096);
        let mut analyzer = SpectrumAnalyzer::new(4096);

        let hz_per_bin = srate / analyzer.size() as f32;
        let mid = (2000.0 / hz_per_bin).round() as usize;
        let out = (12000.0 / hz_per_bin).round() as usize;
        let spectrum = analyzer.compute(signal.samples());
        assert!(
            spectrum[mid] > spectrum[out] + 20.0,
            "in-band {} dB, out-of-band {} dB",
            spectrum[mid],
            spectrum[out]
        );
    }

    #[test]
    fn test_spectrum_peak_of_sine() {
        let srate = 44100.0;
        let freq = 1378.125; // exactly bin 128 of a 4096 FFT
        let signal = SourceSignal::sinusoid(freq, srate, 4096);
        let mut analyzer = SpectrumAnalyzer::new(4096);
        analyzer.compute(signal.samples());
        let bin = analyzer.peak_in_band(100.0, 20000.0, srate);
        assert_eq!(bin, 128);
        assert!((analyzer.bin_to_hz(bin, srate) - freq).abs() < 1e-3);
    }

    #[test]
    fn test_listener_is_append_only() {
        let mut listener = Listener::new((3, 4));
        listener.record(0.1);
        listener.record(0.2);
        assert_eq!(listener.samples(), &[0.1, 0.2]);
        listener.discard_last();
        assert_eq!(listener.samples(), &[0.1]);
    }

    #[test]
    fn test_latest_frame_sink() {
        let mut sink = LatestFrame::default();
        sink.frame(10, 2, 2, &[1.0, 2.0, 3.0, 4.0]);
        sink.frame(20, 2, 2, &[5.0, 6.0, 7.0, 8.0]);
        assert_eq!(sink.frames_seen, 2);
        assert_eq!(sink.step, 20);
        assert_eq!(sink.pressure, vec![5.0, 6.0, 7.0, 8.0]);
    }
}
