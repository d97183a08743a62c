//! Voice capture flow: listening -> processing -> idle.
//!
//! Audio capture and speech recognition sit behind [`SpeechRecognizer`]. The
//! demo recognizer only waits out the configured timings and never hears
//! anything. Each step publishes the new status to the store and to an
//! observer callback so the shell can push it to the UI.

use crate::config::PlaceholderTimings;
use crate::model::VoiceStatus;
use crate::SharedStore;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("Audio device error: {0}")]
    Device(String),
}

#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Record until the utterance ends.
    async fn record(&self) -> Result<(), VoiceError>;
    /// Turn the last recording into text; `None` when nothing was understood.
    async fn transcribe(&self) -> Result<Option<String>, VoiceError>;
}

pub struct DemoRecognizer {
    listen: Duration,
    process: Duration,
}

impl DemoRecognizer {
    pub fn new(timings: PlaceholderTimings) -> Self {
        Self {
            listen: timings.listen,
            process: timings.process,
        }
    }
}

#[async_trait]
impl SpeechRecognizer for DemoRecognizer {
    async fn record(&self) -> Result<(), VoiceError> {
        tokio::time::sleep(self.listen).await;
        Ok(())
    }

    async fn transcribe(&self) -> Result<Option<String>, VoiceError> {
        tokio::time::sleep(self.process).await;
        Ok(None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceOutcome {
    /// The session ran to the end; carries the recognized text, if any.
    Finished(Option<String>),
    Cancelled,
    Failed(String),
}

pub struct VoiceController<R: SpeechRecognizer> {
    recognizer: R,
}

impl<R: SpeechRecognizer> VoiceController<R> {
    pub fn new(recognizer: R) -> Self {
        Self { recognizer }
    }

    /// Run one listen/transcribe cycle. If another session starts before
    /// this one ends, this one stops publishing status.
    pub async fn run<F>(
        &self,
        store: &SharedStore,
        cancel: &CancellationToken,
        on_status: F,
    ) -> VoiceOutcome
    where
        F: Fn(VoiceStatus) + Send + Sync,
    {
        let session = store.lock().await.begin_voice();
        on_status(VoiceStatus::Listening);

        let recorded = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            r = self.recognizer.record() => Some(r),
        };
        match recorded {
            None => {
                publish(store, &on_status, session, VoiceStatus::Idle).await;
                return VoiceOutcome::Cancelled;
            }
            Some(Err(e)) => return fail(store, &on_status, session, &e).await,
            Some(Ok(())) => {}
        }

        publish(store, &on_status, session, VoiceStatus::Processing).await;
        let transcript = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            t = self.recognizer.transcribe() => Some(t),
        };
        match transcript {
            None => {
                publish(store, &on_status, session, VoiceStatus::Idle).await;
                VoiceOutcome::Cancelled
            }
            Some(Err(e)) => fail(store, &on_status, session, &e).await,
            Some(Ok(text)) => {
                publish(store, &on_status, session, VoiceStatus::Idle).await;
                VoiceOutcome::Finished(text)
            }
        }
    }
}

async fn publish<F: Fn(VoiceStatus)>(
    store: &SharedStore,
    on_status: &F,
    session: u64,
    status: VoiceStatus,
) {
    if store.lock().await.set_voice_status_for(session, status) {
        on_status(status);
    }
}

async fn fail<F: Fn(VoiceStatus)>(
    store: &SharedStore,
    on_status: &F,
    session: u64,
    error: &VoiceError,
) -> VoiceOutcome {
    tracing::error!(error = %error, "voice session failed");
    publish(store, on_status, session, VoiceStatus::Error).await;
    VoiceOutcome::Failed(error.to_string())
}

/// Force the status back to idle; used by the stop command after cancelling.
pub async fn stop(store: &SharedStore, cancel: Option<CancellationToken>) {
    if let Some(token) = cancel {
        token.cancel();
    }
    store.lock().await.set_voice_status(VoiceStatus::Idle);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::store::AppStore;
    use std::sync::{Arc, Mutex as StdMutex};
    use tokio::sync::Mutex;

    fn shared_store() -> SharedStore {
        Arc::new(Mutex::new(AppStore::new(Arc::new(MemoryStore::new()))))
    }

    struct DeafRecognizer;

    #[async_trait]
    impl SpeechRecognizer for DeafRecognizer {
        async fn record(&self) -> Result<(), VoiceError> {
            Err(VoiceError::Device("no microphone".to_string()))
        }
        async fn transcribe(&self) -> Result<Option<String>, VoiceError> {
            Ok(None)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_cycle_status_sequence() {
        let store = shared_store();
        let seen = StdMutex::new(Vec::new());
        let controller = VoiceController::new(DemoRecognizer::new(PlaceholderTimings::default()));
        let started = tokio::time::Instant::now();

        let outcome = controller
            .run(&store, &CancellationToken::new(), |s| seen.lock().unwrap().push(s))
            .await;

        assert_eq!(outcome, VoiceOutcome::Finished(None));
        assert_eq!(
            *seen.lock().unwrap(),
            vec![VoiceStatus::Listening, VoiceStatus::Processing, VoiceStatus::Idle]
        );
        assert!(started.elapsed() >= Duration::from_millis(3000));
        assert_eq!(store.lock().await.voice_status(), VoiceStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_listening() {
        let store = shared_store();
        let cancel = CancellationToken::new();
        let controller = VoiceController::new(DemoRecognizer::new(PlaceholderTimings::default()));

        let store_for_run = store.clone();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            controller.run(&store_for_run, &token, |_| {}).await
        });

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(store.lock().await.voice_status(), VoiceStatus::Listening);
        stop(&store, Some(cancel)).await;

        assert_eq!(handle.await.unwrap(), VoiceOutcome::Cancelled);
        assert_eq!(store.lock().await.voice_status(), VoiceStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_old_session_leaves_new_one_alone() {
        let store = shared_store();
        let controller = Arc::new(VoiceController::new(DemoRecognizer::new(
            PlaceholderTimings::default(),
        )));
        let old_seen = Arc::new(StdMutex::new(Vec::new()));
        let (old_token, new_token) = (CancellationToken::new(), CancellationToken::new());

        let old = {
            let (controller, store, token, seen) =
                (controller.clone(), store.clone(), old_token.clone(), old_seen.clone());
            tokio::spawn(async move {
                controller
                    .run(&store, &token, move |s| seen.lock().unwrap().push(s))
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(500)).await;
        let new = {
            let (controller, store, token) = (controller.clone(), store.clone(), new_token.clone());
            tokio::spawn(async move { controller.run(&store, &token, |_| {}).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        old_token.cancel();
        assert_eq!(old.await.unwrap(), VoiceOutcome::Cancelled);
        assert_eq!(store.lock().await.voice_status(), VoiceStatus::Listening);
        assert_eq!(*old_seen.lock().unwrap(), vec![VoiceStatus::Listening]);

        assert_eq!(new.await.unwrap(), VoiceOutcome::Finished(None));
        assert_eq!(store.lock().await.voice_status(), VoiceStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_device_failure_sets_error() {
        let store = shared_store();
        let controller = VoiceController::new(DeafRecognizer);
        let outcome = controller.run(&store, &CancellationToken::new(), |_| {}).await;
        assert!(matches!(outcome, VoiceOutcome::Failed(_)));
        assert_eq!(store.lock().await.voice_status(), VoiceStatus::Error);
    }
}
