pub mod error;
pub mod nullifier;
pub mod policy;
pub mod recorder;
pub mod request;

pub use error::{Error, Result};
pub use nullifier::Nullifier;
pub use policy::{AttestationType, VerificationPolicy, MINIMUM_AGE};
pub use recorder::{RecordStatus, VerificationRecorder};
pub use request::{VerifierVerdict, VerifyPayload, REQUIRED_FIELDS_MESSAGE};
