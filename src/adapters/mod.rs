// Adapters layer: concrete implementations for external systems (audio files, remote sources).

pub mod remote;
pub mod wav;

pub use remote::{AudioSource, HttpStorage};
pub use wav::{decode_wav, encode_wav_mono};
