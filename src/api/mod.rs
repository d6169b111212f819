pub mod elevenlabs;
pub mod youtube;
