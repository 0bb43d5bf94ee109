// ViewerContext middleware - resolves the session token once per request
// and hands handlers a ready ViewerContext

pub mod viewer_context_extractor;
pub mod viewer_context_middleware;

pub use viewer_context_extractor::{AuthenticatedUser, HasLoginUrl, Vc};
pub use viewer_context_middleware::*;
