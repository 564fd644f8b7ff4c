//! driftwatch-probe: identity probe IO boundary.
//! One round-trip to the backend identity endpoint, with payload validation.
//! No retries and no business logic; callers own the retry policy.

pub mod error;
pub mod http;
pub mod payload;
pub mod probe;

pub use error::{MalformedResponseError, ProbeError};
pub use http::HttpIdentityProbe;
pub use payload::parse_identity;
pub use probe::IdentityProbe;
