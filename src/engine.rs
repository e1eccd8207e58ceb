//! Engine facade: parse -> build -> query -> serialize, with exactly one
//! continuation fired per `list` call.
//!
//! The cursor is owned by a guard from the moment the store hands it over and
//! is closed exactly once, whichever stage ends the call (including a panic
//! unwinding through the serializer).
//!
//! CHANGELOG:
//! - 10/16/2026 - Row cap forwarded to the store as a query limit
//! - 02/05/2026 - list_descriptor entry point for structured callers
//! - 02/04/2026 - Initial implementation

use std::panic::{self, AssertUnwindSafe};

use crate::error::{EngineError, Result};
use crate::filter::{self, FilterDescriptor};
use crate::query;
use crate::serializer;
use crate::store::{ContentStore, Cursor, SMS_CONTENT_URI};

/// Pipeline stage, used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Parsing,
    Building,
    Querying,
    Serializing,
}

/// Successful `list` result: the two positional values handed to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPayload {
    pub count: u32,
    /// JSON array of message records.
    pub messages: String,
}

/// Closes the cursor on drop unless it was already released.
struct CursorGuard<'a> {
    cursor: Option<Box<dyn Cursor + 'a>>,
}

impl<'a> CursorGuard<'a> {
    fn new(cursor: Option<Box<dyn Cursor + 'a>>) -> Self {
        Self { cursor }
    }

    fn cursor_mut(&mut self) -> Option<&mut (dyn Cursor + 'a)> {
        self.cursor.as_deref_mut()
    }

    fn release(&mut self) {
        if let Some(mut cursor) = self.cursor.take() {
            cursor.close();
        }
    }
}

impl Drop for CursorGuard<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

/// SMS query engine over a content store.
pub struct SmsEngine<S> {
    store: S,
    uri: String,
}

impl<S: ContentStore> SmsEngine<S> {
    /// Engine reading `content://sms`.
    pub fn new(store: S) -> Self {
        Self::with_uri(store, SMS_CONTENT_URI)
    }

    pub fn with_uri(store: S, uri: impl Into<String>) -> Self {
        Self {
            store,
            uri: uri.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Host entry point. Exactly one of `on_failure(diagnostic)` or
    /// `on_success(count, messages)` runs, once.
    pub fn list<F, G>(&self, raw_filter: Option<&str>, on_failure: F, on_success: G)
    where
        F: FnOnce(String),
        G: FnOnce(u32, String),
    {
        dispatch(self.execute(raw_filter), on_failure, on_success);
    }

    /// Same as [`list`](Self::list) for callers that already hold a descriptor.
    pub fn list_descriptor<F, G>(&self, desc: &FilterDescriptor, on_failure: F, on_success: G)
    where
        F: FnOnce(String),
        G: FnOnce(u32, String),
    {
        dispatch(self.execute_descriptor(desc), on_failure, on_success);
    }

    /// Run the full pipeline on raw filter text. Never panics.
    pub fn execute(&self, raw_filter: Option<&str>) -> Result<ListPayload> {
        self.guarded(|| {
            tracing::debug!(stage = ?Stage::Parsing, "list");
            let desc = filter::parse(raw_filter)?;
            self.run(&desc)
        })
    }

    /// Run the pipeline from the building stage on. Never panics.
    pub fn execute_descriptor(&self, desc: &FilterDescriptor) -> Result<ListPayload> {
        self.guarded(|| self.run(desc))
    }

    fn run(&self, desc: &FilterDescriptor) -> Result<ListPayload> {
        tracing::debug!(stage = ?Stage::Building, filter = %desc.to_filter_json(), "list");
        let plan = query::build(desc);

        tracing::debug!(stage = ?Stage::Querying, uri = %self.uri, "list");
        let cursor = self.store.query(
            &self.uri,
            plan.projection,
            plan.predicate.as_deref(),
            &plan.args,
            plan.sort,
            Some(plan.cap),
        )?;
        let mut guard = CursorGuard::new(cursor);

        tracing::debug!(stage = ?Stage::Serializing, cap = plan.cap, "list");
        let (count, messages) = serializer::serialize(guard.cursor_mut(), plan.cap)?;
        guard.release();

        tracing::debug!(count, "list complete");
        Ok(ListPayload { count, messages })
    }

    fn guarded(&self, pipeline: impl FnOnce() -> Result<ListPayload>) -> Result<ListPayload> {
        match panic::catch_unwind(AssertUnwindSafe(pipeline)) {
            Ok(result) => result,
            Err(payload) => {
                let detail = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(EngineError::StoreUnavailable(format!(
                    "internal error: {}",
                    detail
                )))
            }
        }
    }
}

fn dispatch<F, G>(outcome: Result<ListPayload>, on_failure: F, on_success: G)
where
    F: FnOnce(String),
    G: FnOnce(u32, String),
{
    match outcome {
        Ok(payload) => on_success(payload.count, payload.messages),
        Err(err) => {
            tracing::warn!(kind = err.kind_code(), error = %err, "list failed");
            on_failure(err.diagnostic().to_string());
        }
    }
}
