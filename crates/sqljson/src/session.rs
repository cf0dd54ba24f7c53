//! Per-session context handed to the SQL/JSON functions

use std::fmt;
use std::sync::Arc;

use crate::coerce::{StandardCoercion, TypeCoercion};

/// Session-level collaborators. Cheap to clone and shareable across threads.
#[derive(Clone)]
pub struct SessionContext {
    coercion: Arc<dyn TypeCoercion + Send + Sync>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the output coercion
    pub fn with_coercion(mut self, coercion: impl TypeCoercion + Send + Sync + 'static) -> Self {
        self.coercion = Arc::new(coercion);
        self
    }

    pub fn coercion(&self) -> &(dyn TypeCoercion + Send + Sync) {
        self.coercion.as_ref()
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            coercion: Arc::new(StandardCoercion),
        }
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext").finish_non_exhaustive()
    }
}
