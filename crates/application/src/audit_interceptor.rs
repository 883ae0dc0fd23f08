//! START / OK / FAIL audit envelope around declared operations.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use divehub_core::{AppError, AppResult, AuditLevel, TraceId};
use divehub_domain::{AuditSource, OperationDescriptor};

use crate::audit_ports::{AuditEvent, AuditRepository};
use crate::trace_context::{TraceContext, TraceGuard};


/// Wraps operations of one audit source with start and outcome events.
///
/// The interceptor only observes: the wrapped operation's value or error is
/// returned to the caller unchanged, and failures to persist audit events are
/// logged and dropped.
#[derive(Clone)]
pub struct AuditInterceptor {
    source: AuditSource,
    repository: Arc<dyn AuditRepository>,
}

impl AuditInterceptor {
    /// Creates an interceptor for one operation group.
    #[must_use]
    pub fn new(source: AuditSource, repository: Arc<dyn AuditRepository>) -> Self {
        Self { source, repository }
    }

    /// Returns the audit source stamped on every emitted event.
    #[must_use]
    pub fn source(&self) -> &AuditSource {
        &self.source
    }

    /// Runs `operation` inside an audit envelope described by `descriptor`.
    ///
    /// A call made while another audited operation of the same task is in
    /// flight joins the outer trace id and leaves clearing it to the outer call.
    pub async fn intercept<T, F>(
        &self,
        descriptor: &OperationDescriptor,
        operation: F,
    ) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        if TraceContext::is_scoped() {
            self.run_envelope(descriptor, operation).await
        } else {
            TraceContext::scope(self.run_envelope(descriptor, operation)).await
        }
    }

    async fn run_envelope<T, F>(
        &self,
        descriptor: &OperationDescriptor,
        operation: F,
    ) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        let (trace_id, _guard): (TraceId, Option<TraceGuard>) = match TraceContext::get() {
            Some(outer_trace_id) => (outer_trace_id, None),
            None => {
                let trace_id = TraceId::new();
                (trace_id, Some(TraceContext::enter(trace_id)))
            }
        };

        self.emit(trace_id, descriptor.start_message(), descriptor.level())
            .await;

        let outcome = operation.await;

        match &outcome {
            Ok(_) => {
                self.emit(trace_id, descriptor.ok_message(), descriptor.level())
                    .await;
            }
            Err(AppError::Audit(failure)) => {
                self.emit(trace_id, failure.message(), failure.level()).await;
            }
            Err(error) => match descriptor.fail_message() {
                Some(fail_message) => {
                    self.emit(trace_id, fail_message, descriptor.level()).await;
                }
                None => {
                    debug!(
                        trace_id = %trace_id,
                        source = %self.source,
                        error = %error,
                        "operation failed without a declared fail message"
                    );
                }
            },
        }

        outcome
    }

    async fn emit(&self, trace_id: TraceId, message: &str, level: AuditLevel) {
        let event = AuditEvent {
            trace_id,
            source: self.source.clone(),
            message: message.to_owned(),
            level,
            occurred_at: Utc::now(),
        };

        if let Err(error) = self.repository.append_event(event).await {
            warn!(
                trace_id = %trace_id,
                source = %self.source,
                audit_message = message,
                error = %error,
                "failed to persist audit event"
            );
        }
    }
}
