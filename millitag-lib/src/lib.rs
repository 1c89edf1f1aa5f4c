pub mod blowfish;
pub mod config;
pub mod constants;
pub mod crc;
pub mod error;
pub mod frame;
pub mod gps;
pub mod kdf;
pub mod machine;
pub mod message;
pub mod net;
pub mod reporter;
pub mod telemetry;
pub mod timestamp;

// Re-export the main entry points for easy access
pub use error::BeaconError;
pub use message::FrameBuilder;
pub use reporter::Reporter;
