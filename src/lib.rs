//! Emotion Bridge - stabilized behavioral signal from a per-frame emotion classifier
//!
//! The bridge accepts decoded camera frames over a WebSocket, scores each frame
//! with an emotion classifier, and turns the noisy per-frame scores into two
//! stable outputs: a debounced emotion label and a continuous inner-state
//! scalar (0.0 = stressed, 1.0 = calm) suitable for driving a game or UI.
//!
//! ## Modules
//!
//! - **frame**: bounded, lossy intake queue decoupling the transport from the engine
//! - **classifier**: the frame-scoring collaborator (ONNX-backed provider)
//! - **engine**: calibration, baseline removal, smoothing, disambiguation,
//!   label debouncing and the inner-state integrator
//! - **state**: the shared snapshot read by the transport
//! - **server**: WebSocket/health endpoints publishing the snapshot

pub mod classifier;
pub mod config;
pub mod engine;
pub mod frame;
pub mod server;
pub mod state;
pub mod types;


pub use classifier::{ClassifierConfig, ClassifierError, EmotionClassifier, OnnxEmotionClassifier};
pub use config::Config;
pub use engine::{run_engine, EmotionEngine, EngineConfig};
pub use frame::{frame_queue, Frame, FrameSender};
pub use state::SharedState;
pub use types::{Emotion, EmotionScores, SessionStatus, StateSnapshot, StateUpdate};
