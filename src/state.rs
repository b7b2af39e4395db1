//! Shared application state
//!
//! Explicit, injectable dependencies constructed once at process start
//! and handed to the request handlers: the read-only fitted vectorizer,
//! the endpoint invoker handle, and the endpoint name. Requests share
//! nothing mutable, so no locking is needed.

use std::sync::Arc;

use crate::platform::EndpointInvoker;
use crate::vectorizer::TfidfVectorizer;

#[derive(Clone)]
pub struct AppState {
    pub vectorizer: Arc<TfidfVectorizer>,
    pub invoker: Arc<dyn EndpointInvoker>,
    pub endpoint_name: String,
}
