pub mod array;
pub mod cli;
pub mod config;
pub mod control;
pub mod envelope;
pub mod field;
pub mod harmonics;
pub mod jump;
pub mod output;
pub mod patterns;
pub mod plotting;
pub mod sweep;
pub mod waveform;
