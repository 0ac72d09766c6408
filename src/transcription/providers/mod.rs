pub mod cloud_speech;

pub use cloud_speech::CloudSpeechProvider;
