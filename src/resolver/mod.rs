// Resolver module - turns a video reference into one playable stream URL

pub mod backends;
pub mod cookies;
pub mod diagnostics;
pub mod errors;
pub mod format_selector;
pub mod models;
pub mod orchestrator;
pub mod traits;
pub mod utils;

pub use cookies::{load_jar, parse_jar, CookieJar, SessionCredential};
pub use errors::{FailureKind, ResolveError, MAX_DETAIL_LEN};
pub use format_selector::FormatSelector;
pub use models::{Format, ResolvedStream, VideoReference};
pub use orchestrator::{Orchestrator, SessionMode};
pub use traits::{FormatSource, ResolverConfig, ResolverMode, StreamResolver};
