//! MIME dispatcher
//!
//! Evaluates source through the runtime bridge, asks the runtime's display
//! helper for a MIME representation, and hands the result to the matching
//! [`Surface`] call.

use crate::rendition::{PayloadShapeError, Rendition};
use crate::surface::Surface;
use livecall_runtime::{Bridge, ForeignRuntime, MimePayload, MimeType};
use thiserror::Error;

/// What to display: source to evaluate, or an already evaluated value
#[derive(Debug, Clone)]
pub enum Displayable<V> {
    Source(String),
    Value(V),
}

impl<V> Displayable<V> {
    pub fn source(source: impl Into<String>) -> Self {
        Displayable::Source(source.into())
    }
}

#[derive(Debug, Error)]
pub enum DisplayError<E: std::error::Error + 'static> {
    /// Evaluation or helper failure, exactly as the runtime raised it
    #[error(transparent)]
    Runtime(E),

    #[error(transparent)]
    PayloadShape(#[from] PayloadShapeError),
}

impl<E: std::error::Error + 'static> DisplayError<E> {
    /// The runtime's own error, if that is what failed
    pub fn runtime(&self) -> Option<&E> {
        match self {
            DisplayError::Runtime(e) => Some(e),
            DisplayError::PayloadShape(_) => None,
        }
    }
}

/// Dispatches runtime values to rendering surfaces
pub struct Dispatcher<R: ForeignRuntime> {
    bridge: Bridge<R>,
}

impl<R: ForeignRuntime> Clone for Dispatcher<R> {
    fn clone(&self) -> Self {
        Self {
            bridge: self.bridge.clone(),
        }
    }
}

impl<R: ForeignRuntime> Dispatcher<R> {
    pub fn new(bridge: Bridge<R>) -> Self {
        Self { bridge }
    }

    pub fn bridge(&self) -> &Bridge<R> {
        &self.bridge
    }

    /// Evaluate source in the runtime's global namespace
    pub fn evaluate(&self, source: &str) -> Result<R::Value, R::Error> {
        let evaluate = self
            .bridge
            .call(|runtime: &mut R, source: String| runtime.evaluate(&source));
        evaluate(source.to_string())
    }

    /// Ask the display helper for a MIME representation of `value`.
    ///
    /// Without `mime` the helper picks the type; with it the value is
    /// rendered as that type and the payload is labelled with it.
    pub fn resolve_mime(
        &self,
        value: R::Value,
        mime: Option<&str>,
    ) -> Result<MimePayload, R::Error> {
        match mime {
            None => self
                .bridge
                .run_blocking(move |runtime| runtime.best_mime(&value)),
            Some(requested) => {
                let requested = MimeType::new(requested);
                let target = requested.clone();
                let mut payload = self
                    .bridge
                    .run_blocking(move |runtime| runtime.render_mime(&target, &value))?;
                if payload.mime != requested {
                    tracing::debug!(
                        requested = %requested,
                        echoed = %payload.mime,
                        "Helper echoed a different MIME type, keeping the requested one"
                    );
                    payload.mime = requested;
                }
                Ok(payload)
            }
        }
    }

    /// Evaluate if needed, resolve a MIME representation and render it
    pub fn display<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        input: Displayable<R::Value>,
        mime: Option<&str>,
    ) -> Result<(), DisplayError<R::Error>> {
        let value = match input {
            Displayable::Source(source) => {
                self.evaluate(&source).map_err(DisplayError::Runtime)?
            }
            Displayable::Value(value) => value,
        };

        let payload = self
            .resolve_mime(value, mime)
            .map_err(DisplayError::Runtime)?;
        tracing::debug!(mime = %payload.mime, size = payload.data.len(), "Displaying payload");

        present(surface, payload)?;
        Ok(())
    }
}

/// Render an already resolved payload
pub fn present<S: Surface + ?Sized>(
    surface: &mut S,
    payload: MimePayload,
) -> Result<(), PayloadShapeError> {
    Rendition::from_payload(payload)?.render_to(surface);
    Ok(())
}
