// src/plugins/executor.rs — Hook execution engine
//
// Runs every hook registered at one point, in stored order, threading a
// single payload through them. Hooks run strictly one after another; the
// executor only suspends inside a hook's own await points.
//
// Failure isolation: an error, a panic, or a payload of the wrong kind from
// one hook is logged and the chain continues with the payload as it was
// before that hook ran. Audio sources are sealed for the whole chain, so a
// hook cannot drain the stream out from under that snapshot.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use crate::core::types::TtsRequest;
use crate::plugins::hooks::{HookContext, HookPoint};
use crate::plugins::payload::{AudioStream, Payload};
use crate::plugins::registry::HookRegistry;

#[derive(Clone, Default)]
pub struct HookExecutor {
    registry: Arc<HookRegistry>,
}

impl HookExecutor {
    pub fn new(registry: Arc<HookRegistry>) -> Self {
        Self { registry }
    }

    /// An executor with no registrations: every point is a pass-through.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &HookRegistry {
        &self.registry
    }

    /// Run the chain at `point`. Never fails; returns `payload` untouched
    /// when nothing is registered.
    pub async fn run(&self, point: &HookPoint, payload: Payload, ctx: &HookContext) -> Payload {
        let chain = self.registry.registrations(point);
        if chain.is_empty() {
            return payload;
        }

        let mut seals = Vec::new();
        let mut current = payload;
        for registration in chain {
            if let Payload::Audio(audio) = &current {
                seals.push(audio.seal());
            }
            tracing::debug!(
                hook = %registration.name,
                priority = registration.priority,
                point = %point,
                "Running hook"
            );

            let snapshot = current.clone();
            let expected = snapshot.kind();
            let attempt = AssertUnwindSafe(registration.hook().call(current, ctx))
                .catch_unwind()
                .await;

            current = match attempt {
                Ok(Ok(next)) if next.kind() == expected => next,
                Ok(Ok(next)) => {
                    tracing::error!(
                        hook = %registration.name,
                        point = %point,
                        "Hook returned a {} payload where {} was expected; discarding",
                        next.kind(),
                        expected
                    );
                    snapshot
                }
                Ok(Err(e)) => {
                    tracing::error!(
                        hook = %registration.name,
                        point = %point,
                        error = %e,
                        "Hook failed; continuing with previous payload"
                    );
                    snapshot
                }
                Err(_) => {
                    tracing::error!(
                        hook = %registration.name,
                        point = %point,
                        "Hook panicked; continuing with previous payload"
                    );
                    snapshot
                }
            };
        }

        drop(seals);
        current
    }

    pub async fn run_text(&self, point: &HookPoint, text: String, ctx: &HookContext) -> String {
        match self.run(point, Payload::Text(text), ctx).await {
            Payload::Text(text) => text,
            _ => unreachable!("executor preserves payload kind"),
        }
    }

    pub async fn run_request(
        &self,
        point: &HookPoint,
        request: TtsRequest,
        ctx: &HookContext,
    ) -> TtsRequest {
        match self.run(point, Payload::Request(request), ctx).await {
            Payload::Request(request) => request,
            _ => unreachable!("executor preserves payload kind"),
        }
    }

    pub async fn run_audio(
        &self,
        point: &HookPoint,
        audio: AudioStream,
        ctx: &HookContext,
    ) -> AudioStream {
        match self.run(point, Payload::Audio(audio), ctx).await {
            Payload::Audio(audio) => audio,
            _ => unreachable!("executor preserves payload kind"),
        }
    }
}
