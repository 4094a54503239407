//! Turning a run into the external event protocol.

pub mod events;
pub mod store;
pub mod streamer;

pub use events::{AgentInteraction, FileUpdate, InteractionKind, StreamEvent};
pub use store::{FileInteractionStore, InteractionLog, InteractionStore, MemoryInteractionStore};
pub use streamer::{EventStream, ExecutionStreamer, StreamRequest, StreamerConfig};
