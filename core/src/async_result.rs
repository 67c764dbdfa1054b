// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use crate::{Error, Result};
use log::debug;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::AbortHandle;

/// Callback invoked exactly once when a call completes, on the completing thread.
pub type Callback<V> = Box<dyn FnOnce(&Result<V>) + Send + 'static>;

/// AsyncResult is the handle of one in-flight call.
///
/// It is created pending when the call is dispatched and completed exactly
/// once, either by the transport's completion or by [`AsyncResult::cancel`].
/// After completion it can be read any number of times.
///
/// Clones share the same call.
pub struct AsyncResult<V> {
    inner: Arc<Inner<V>>,
    timeout: Duration,
}

struct Inner<V> {
    request_id: Option<String>,
    outcome: Mutex<Option<Result<V>>>,
    completed: Condvar,
    completed_tx: watch::Sender<bool>,
    callback: Mutex<Option<Callback<V>>>,
    abort: Mutex<Option<AbortHandle>>,
}

impl<V> Clone for AsyncResult<V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            timeout: self.timeout,
        }
    }
}

impl<V> Debug for AsyncResult<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncResult")
            .field("request_id", &self.inner.request_id)
            .field("done", &*self.inner.completed_tx.borrow())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl<V: Clone + Send + 'static> AsyncResult<V> {
    pub(crate) fn new(
        timeout: Duration,
        request_id: Option<String>,
        callback: Option<Callback<V>>,
    ) -> Self {
        let (completed_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                request_id,
                outcome: Mutex::new(None),
                completed: Condvar::new(),
                completed_tx,
                callback: Mutex::new(callback),
                abort: Mutex::new(None),
            }),
            timeout,
        }
    }

    pub(crate) fn set_abort_handle(&self, handle: AbortHandle) {
        *self.inner.abort.lock().expect("lock poisoned") = Some(handle);
    }

    /// Complete the call. Returns `false` if it was already completed, in
    /// which case `result` is dropped.
    pub(crate) fn complete(&self, result: Result<V>) -> bool {
        let callback = {
            let mut outcome = self.inner.outcome.lock().expect("lock poisoned");
            if outcome.is_some() {
                return false;
            }
            *outcome = Some(result.clone());
            self.inner.callback.lock().expect("lock poisoned").take()
        };
        self.inner.completed.notify_all();
        self.inner.completed_tx.send_replace(true);
        *self.inner.abort.lock().expect("lock poisoned") = None;

        if let Some(callback) = callback {
            callback(&result);
        }
        true
    }

    /// The request id of the action that issued this call.
    pub fn request_id(&self) -> Option<&str> {
        self.inner.request_id.as_deref()
    }

    /// Time [`AsyncResult::get`] and [`AsyncResult::wait`] wait for completion.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Change the wait timeout of this handle.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Check whether the call has completed.
    pub fn is_done(&self) -> bool {
        self.inner.outcome.lock().expect("lock poisoned").is_some()
    }

    /// Check whether the call has completed successfully.
    ///
    /// `false` while the call is pending.
    pub fn is_success(&self) -> bool {
        matches!(
            *self.inner.outcome.lock().expect("lock poisoned"),
            Some(Ok(_))
        )
    }

    /// Block the calling thread until the call completes or the timeout elapses.
    ///
    /// # Notes
    ///
    /// Must not be called from a thread that drives the runtime of the call.
    pub fn get(&self) -> Result<V> {
        self.get_with_timeout(self.timeout)
    }

    /// Block the calling thread until the call completes or `timeout` elapses.
    ///
    /// An elapsed timeout returns a local `Timeout` error and leaves the call
    /// pending; it can be waited on again or cancelled.
    pub fn get_with_timeout(&self, timeout: Duration) -> Result<V> {
        let outcome = self.inner.outcome.lock().expect("lock poisoned");
        let (outcome, _) = self
            .inner
            .completed
            .wait_timeout_while(outcome, timeout, |v| v.is_none())
            .expect("lock poisoned");

        match outcome.as_ref() {
            Some(result) => result.clone(),
            None => Err(self.timeout_error(timeout)),
        }
    }

    /// Wait for the call to complete without blocking the thread.
    pub async fn wait(&self) -> Result<V> {
        let mut rx = self.inner.completed_tx.subscribe();
        match tokio::time::timeout(self.timeout, rx.wait_for(|done| *done)).await {
            Ok(Ok(_)) => {}
            Ok(Err(_)) => return Err(Error::unexpected("completion channel closed")),
            Err(_) => return Err(self.timeout_error(self.timeout)),
        }

        self.inner
            .outcome
            .lock()
            .expect("lock poisoned")
            .clone()
            .unwrap_or_else(|| Err(Error::unexpected("call completed without outcome")))
    }

    /// Cancel the call.
    ///
    /// Before completion, the call resolves to a `Cancelled` error and the
    /// in-flight transport operation is aborted. After completion this is a
    /// no-op. Returns whether this call did the cancellation.
    pub fn cancel(&self) -> bool {
        let abort = self.inner.abort.lock().expect("lock poisoned").take();
        let err = Error::cancelled("call cancelled before completion")
            .or_request_id(self.request_id());
        if !self.complete(Err(err)) {
            return false;
        }

        debug!("call {:?} cancelled", self.request_id());
        if let Some(abort) = abort {
            abort.abort();
        }
        true
    }

    fn timeout_error(&self, timeout: Duration) -> Error {
        Error::timeout(format!("no response within {timeout:?}")).or_request_id(self.request_id())
    }
}
