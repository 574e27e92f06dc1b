use crate::di::Instance;
use crate::execution::{IncomingRequest, RequestContext, ResponseHandle};
use crate::pipe::Pipe;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::type_name;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Raised when an action reads an argument with the wrong accessor or when a value
/// cannot be coerced into the requested type.
#[derive(Debug, Error)]
pub enum BindingError {
    #[error("No argument bound at index {index}")]
    OutOfRange { index: usize },

    #[error("Argument {index} is a {found} binding, expected {expected}")]
    KindMismatch {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    /// A client-supplied value could not be converted. Reported as `400`.
    #[error("{message}")]
    Coercion { index: usize, message: String },

    #[error("Argument {index} does not hold a {type_name}")]
    Downcast {
        index: usize,
        type_name: &'static str,
    },
}

/// One bound action argument.
#[derive(Clone)]
pub enum Argument {
    /// Path, query or header value; `None` when absent from the request.
    Value(Option<String>),
    Body(Value),
    Context(RequestContext),
    Request(Arc<IncomingRequest>),
    Response(ResponseHandle),
    Dependency(Instance),
}

impl Argument {
    fn kind(&self) -> &'static str {
        match self {
            Argument::Value(_) => "value",
            Argument::Body(_) => "body",
            Argument::Context(_) => "context",
            Argument::Request(_) => "request",
            Argument::Response(_) => "response",
            Argument::Dependency(_) => "dependency",
        }
    }
}

impl std::fmt::Debug for Argument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Argument::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Argument::Body(body) => f.debug_tuple("Body").field(body).finish(),
            other => f.write_str(other.kind()),
        }
    }
}

/// The positional argument list built for one action invocation, ordered by target index.
///
/// Accessors are the explicit coercion step at the call boundary: each one checks the
/// binding kind and converts the value, returning a [`BindingError`] on mismatch.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    values: Vec<Argument>,
}

impl Arguments {
    pub fn new(values: Vec<Argument>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&Argument, BindingError> {
        self.values.get(index).ok_or(BindingError::OutOfRange { index })
    }

    /// A path, query or header value as a string.
    pub fn string(&self, index: usize) -> Result<Option<String>, BindingError> {
        match self.get(index)? {
            Argument::Value(value) => Ok(value.clone()),
            other => Err(mismatch(index, "value", other)),
        }
    }

    /// A path, query or header value parsed with `FromStr`.
    pub fn parse<T>(&self, index: usize) -> Result<Option<T>, BindingError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.string(index)?
            .map(|raw| {
                raw.parse::<T>().map_err(|e| BindingError::Coercion {
                    index,
                    message: format!("Invalid value {:?}: {}", raw, e),
                })
            })
            .transpose()
    }

    /// A path, query or header value passed through a [`Pipe`].
    pub fn pipe<P: Pipe>(&self, index: usize, pipe: &P) -> Result<P::Output, BindingError> {
        let raw = self.string(index)?;
        pipe.transform(raw.as_deref())
            .map_err(|e| BindingError::Coercion {
                index,
                message: e.to_string(),
            })
    }

    /// The raw parsed body.
    pub fn json(&self, index: usize) -> Result<&Value, BindingError> {
        match self.get(index)? {
            Argument::Body(body) => Ok(body),
            other => Err(mismatch(index, "body", other)),
        }
    }

    /// The body deserialized into `T`.
    pub fn body<T: DeserializeOwned>(&self, index: usize) -> Result<T, BindingError> {
        let body = self.json(index)?;
        T::deserialize(body).map_err(|e| BindingError::Coercion {
            index,
            message: format!("Invalid body: {}", e),
        })
    }

    pub fn context(&self, index: usize) -> Result<&RequestContext, BindingError> {
        match self.get(index)? {
            Argument::Context(context) => Ok(context),
            other => Err(mismatch(index, "context", other)),
        }
    }

    pub fn request(&self, index: usize) -> Result<&Arc<IncomingRequest>, BindingError> {
        match self.get(index)? {
            Argument::Request(request) => Ok(request),
            other => Err(mismatch(index, "request", other)),
        }
    }

    pub fn response(&self, index: usize) -> Result<&ResponseHandle, BindingError> {
        match self.get(index)? {
            Argument::Response(response) => Ok(response),
            other => Err(mismatch(index, "response", other)),
        }
    }

    pub fn dependency<T: Send + Sync + 'static>(&self, index: usize) -> Result<Arc<T>, BindingError> {
        self.instance(index)?
            .downcast::<T>()
            .map_err(|_| BindingError::Downcast {
                index,
                type_name: type_name::<T>(),
            })
    }

    /// A trait object injected through a binding.
    pub fn dependency_trait<T: ?Sized + Send + Sync + 'static>(
        &self,
        index: usize,
    ) -> Result<Arc<T>, BindingError> {
        let wrapper = self
            .instance(index)?
            .downcast::<Arc<T>>()
            .map_err(|_| BindingError::Downcast {
                index,
                type_name: type_name::<T>(),
            })?;
        Ok(wrapper.as_ref().clone())
    }

    fn instance(&self, index: usize) -> Result<Instance, BindingError> {
        match self.get(index)? {
            Argument::Dependency(instance) => Ok(Arc::clone(instance)),
            other => Err(mismatch(index, "dependency", other)),
        }
    }
}

fn mismatch(index: usize, expected: &'static str, found: &Argument) -> BindingError {
    BindingError::KindMismatch {
        index,
        expected,
        found: found.kind(),
    }
}
