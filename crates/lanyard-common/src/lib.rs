pub mod errors;
pub mod id;

pub use errors::{ConfigError, LanyardError, SubjectIdError};
pub use id::{new_correlation_id, SessionId, SubjectId};
