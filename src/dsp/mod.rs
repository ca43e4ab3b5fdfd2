pub mod envelope;
pub mod filter;
pub mod mfcc;
pub mod peaks;
pub mod resample;

pub use envelope::{hilbert_envelope, mean, normalize_peak};
pub use filter::BandPassFilter;
pub use mfcc::MfccExtractor;
pub use peaks::{find_peaks, PeakOptions};
pub use resample::resample;
