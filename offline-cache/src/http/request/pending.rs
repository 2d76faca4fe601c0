use super::{Request, SendError, SendErrorCause};
use crate::error::Error;
use crate::Response;
use tokio::task::JoinHandle;

/// A handle to a pending asynchronous request returned by [`Request::send_async()`].
///
/// A handle can be evaluated using [`PendingRequest::poll()`] or [`PendingRequest::wait()`]. It
/// can also be discarded if the request was sent for effects it might have, and the response is
/// unimportant; the send keeps running on the runtime either way.
#[derive(Debug)]
pub struct PendingRequest {
    task: JoinHandle<Result<Response, SendError>>,
    backend: String,
    /// The request that was sent, without its body, kept to build an error if the task is lost.
    sent_req: Request,
}

impl PendingRequest {
    pub(super) fn new(
        task: JoinHandle<Result<Response, SendError>>,
        backend: String,
        sent_req: Request,
    ) -> Self {
        Self {
            task,
            backend,
            sent_req,
        }
    }

    /// Try to get the result of a pending request without blocking.
    ///
    /// This function returns immediately with a [`PollResult`]; if you want to wait until a result
    /// is ready, use [`PendingRequest::wait()`].
    pub async fn poll(self) -> PollResult {
        if self.task.is_finished() {
            PollResult::Done(self.wait().await)
        } else {
            PollResult::Pending(self)
        }
    }

    /// Wait until the result of a pending request is ready.
    pub async fn wait(self) -> Result<Response, SendError> {
        let Self {
            task,
            backend,
            sent_req,
        } = self;
        match task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => {
                Err(SendError::new(backend, sent_req, SendErrorCause::Cancelled))
            }
            Err(e) => Err(SendError::new(
                backend,
                sent_req,
                SendErrorCause::Generic(Error::msg(format!("send task failed: {}", e))),
            )),
        }
    }

    /// Get a reference to the original [`Request`] associated with this pending request.
    ///
    /// The request's body is already sending, so the returned request does not have a body.
    pub fn sent_req(&self) -> &Request {
        &self.sent_req
    }

    /// Abandon the request. A subsequent [`wait()`][`Self::wait()`] would report
    /// [`SendErrorCause::Cancelled`].
    pub fn abort(&self) {
        self.task.abort();
    }
}

/// The result of a call to [`PendingRequest::poll()`].
#[derive(Debug)]
pub enum PollResult {
    /// The request is still in progress, and can be polled again.
    Pending(PendingRequest),
    /// The request has either completed or errored.
    Done(Result<Response, SendError>),
}
