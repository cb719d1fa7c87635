//! Values produced by processor chains.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::ProcessError;

/// Boxed future used at the processor and route seams.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A deferred artifact: called later with call-site arguments.
///
/// Produced by processors such as `template-function`; a decorator calls it
/// with the decorated body.
#[derive(Clone)]
pub struct Callable(Arc<CallableFn>);

type CallableFn =
    dyn Fn(Value) -> BoxFuture<'static, Result<Artifact, ProcessError>> + Send + Sync;

impl Callable {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Artifact, ProcessError>> + Send + 'static,
    {
        Self(Arc::new(move |args| Box::pin(f(args))))
    }

    /// Invoke the callable with the given arguments.
    pub async fn call(&self, args: Value) -> Result<Artifact, ProcessError> {
        (self.0)(args).await
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callable")
    }
}

/// The value threaded through a processor chain.
///
/// A chain starts with [`Artifact::Text`] holding the body of the source file;
/// each processor may return any variant.
#[derive(Clone, Debug, Default)]
pub enum Artifact {
    /// No output. Build mode writes nothing; serve mode falls through.
    #[default]
    Nothing,
    Text(String),
    Bytes(Vec<u8>),
    /// Structured data, persisted as JSON.
    Data(Value),
    Callable(Callable),
}

impl Artifact {
    /// Borrow the text content, if this is a text artifact.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Take the text content, failing for any other variant.
    pub fn into_text(self) -> Result<String, ProcessError> {
        match self {
            Self::Text(text) => Ok(text),
            other => Err(ProcessError::Transform(format!(
                "expected text content, got {}",
                other.kind()
            ))),
        }
    }

    /// Serialize the artifact into the bytes that get written or served.
    ///
    /// Returns `Ok(None)` for [`Artifact::Nothing`]. Callables cannot be persisted.
    pub fn into_bytes(self) -> Result<Option<Vec<u8>>, ProcessError> {
        match self {
            Self::Nothing => Ok(None),
            Self::Text(text) => Ok(Some(text.into_bytes())),
            Self::Bytes(bytes) => Ok(Some(bytes)),
            Self::Data(value) => serde_json::to_vec_pretty(&value)
                .map(Some)
                .map_err(ProcessError::transform),
            Self::Callable(_) => Err(ProcessError::Transform(
                "a callable artifact cannot be written out".to_owned(),
            )),
        }
    }

    /// Convert into a template value: text becomes a string, nothing becomes null.
    pub fn into_value(self) -> Result<Value, ProcessError> {
        match self {
            Self::Nothing => Ok(Value::Null),
            Self::Text(text) => Ok(Value::String(text)),
            Self::Data(value) => Ok(value),
            other => Err(ProcessError::Transform(format!(
                "{} content cannot be used as a template value",
                other.kind()
            ))),
        }
    }

    /// Short variant name for diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Nothing => "nothing",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Data(_) => "data",
            Self::Callable(_) => "callable",
        }
    }
}

impl From<String> for Artifact {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Artifact {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<Vec<u8>> for Artifact {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_has_no_bytes() {
        assert!(Artifact::Nothing.into_bytes().unwrap().is_none());
    }

    #[test]
    fn test_data_serializes_as_json() {
        let bytes = Artifact::Data(serde_json::json!({"a": 1}))
            .into_bytes()
            .unwrap()
            .unwrap();
        let parsed: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed["a"], 1);
    }

    #[test]
    fn test_callable_cannot_be_written() {
        let callable = Callable::new(|_| async { Ok(Artifact::Nothing) });
        assert!(Artifact::Callable(callable).into_bytes().is_err());
    }

    #[tokio::test]
    async fn test_callable_receives_args() {
        let callable = Callable::new(|args: Value| async move {
            Ok(Artifact::Text(format!("hello {}", args["name"].as_str().unwrap_or(""))))
        });

        let result = callable
            .call(serde_json::json!({"name": "world"}))
            .await
            .unwrap();

        assert_eq!(result.as_text(), Some("hello world"));
    }

    #[test]
    fn test_into_value() {
        assert_eq!(Artifact::Nothing.into_value().unwrap(), Value::Null);
        assert_eq!(Artifact::from("hi").into_value().unwrap(), Value::from("hi"));
        assert!(Artifact::Bytes(vec![0]).into_value().is_err());
    }

    #[test]
    fn test_into_text_rejects_bytes() {
        let err = Artifact::Bytes(vec![1, 2]).into_text().unwrap_err();
        assert!(err.to_string().contains("bytes"));
    }
}
