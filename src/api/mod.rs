mod tts;

pub use tts::{is_audio_content_type, TtsClient, CHUNK_SIZE};
