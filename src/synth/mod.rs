// Purpose: Voice management, polyphony, note hand-off
// This layer sits above the wavetable oscillator and manages multiple voices

pub mod message;
pub mod poly;
pub mod sound;
pub mod voice;
