#![deny(missing_docs)]
//! # relaycap: umbrella crate
//!
//! A single import surface for capability execution over an event relay.
//! Re-exports the protocol crate and its implementations behind feature
//! flags, plus a `prelude` for the common path of building an
//! [`Executor`](prelude::Executor) and calling a tool.

#[cfg(feature = "cache")]
pub use relaycap_cache;
#[cfg(feature = "exec")]
pub use relaycap_exec;
#[cfg(feature = "core")]
pub use relaycap_protocol;
#[cfg(feature = "signer")]
pub use relaycap_signer;
#[cfg(feature = "state-memory")]
pub use relaycap_state_memory;

/// Happy-path imports.
pub mod prelude {
    #[cfg(feature = "core")]
    pub use relaycap_protocol::{
        CapabilityCall, CapabilityIdentity, CapabilityType, DurationMs, Event, EventId,
        ExecutionId, ExecutionState, ExecutionStatus, PaymentInfo, PromptSpec, PublicKey,
        ResourceSpec, Signer, Target, ToolSpec, Transport,
    };

    #[cfg(feature = "signer")]
    pub use relaycap_signer::KeySigner;

    #[cfg(feature = "state-memory")]
    pub use relaycap_state_memory::{ExecutionStateStore, StateCell};

    #[cfg(feature = "cache")]
    pub use relaycap_cache::{CacheKey, ExecutionCache};

    #[cfg(feature = "exec")]
    pub use relaycap_exec::{ExecutionError, Executor, ExecutorConfig, populate_uri_template};
}
