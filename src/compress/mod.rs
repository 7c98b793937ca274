//! Remote compression domain — best-effort shrinking of the output image.
//!
//! Nothing in here can fail a capture. [`CompressionClient::compress`]
//! always hands back a usable image and says whether it was compressed.

mod client;
mod session;
mod types;
mod workflow;

pub use client::CompressionClient;
pub(crate) use session::now_ms;
pub use session::{AuthError, CompressionCredential, CompressionSession, CREDENTIAL_LIFETIME};
pub use types::{CompressionOutcome, SizeDetails};
pub use workflow::{WorkflowError, WorkflowStep};

pub use tokio_util::sync::CancellationToken;
