//! Transport contracts.
//!
//! [`Client`] and [`AsyncClient`] describe what a blocking and a
//! future-returning HTTP transport offer. The caching decorators implement
//! the very same traits, so a cached client can be dropped in anywhere a
//! plain one is expected.

use std::any::{type_name, TypeId};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};

use crate::error::{Result, TransportError};
use crate::request::{HttpRequest, HttpResponse, RawResponse};

/// Bounds a decoded response body must meet to be cached and shared.
pub trait ResponseBody: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> ResponseBody for T {}

/// Turns a raw transport response into a typed one.
pub type Transformer<T> = Arc<dyn Fn(RawResponse) -> HttpResponse<T> + Send + Sync>;

/// Future returned by an [`AsyncClient`]. Cloning it does not restart the
/// request: every clone observes the same completion.
pub type ResponseFuture<T> = Shared<BoxFuture<'static, Result<HttpResponse<T>>>>;

/// Completion hook handed to an [`AsyncClient`] along with a request.
pub type ResponseCallback<T> = Box<dyn FnOnce(&Result<HttpResponse<T>>) + Send>;

/// Wraps a closure into a [`Transformer`].
pub fn transformer<T, F>(f: F) -> Transformer<T>
where
    F: Fn(RawResponse) -> HttpResponse<T> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Boxes and shares a response future.
pub fn response_future<T, F>(future: F) -> ResponseFuture<T>
where
    T: ResponseBody,
    F: Future<Output = Result<HttpResponse<T>>> + Send + 'static,
{
    future.boxed().shared()
}

/// Identity of the type a response body is decoded into.
///
/// # Examples
///
/// ```
/// use reqcache::ResponseType;
///
/// assert_eq!(ResponseType::of::<String>(), ResponseType::of::<String>());
/// assert_ne!(ResponseType::of::<String>(), ResponseType::of::<Vec<u8>>());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResponseType {
    id: TypeId,
    name: &'static str,
}

impl ResponseType {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResponseType({})", self.name)
    }
}

/// A blocking HTTP transport.
pub trait Client: Send + Sync {
    /// Handle of the underlying HTTP library.
    type Native;

    fn native_client(&self) -> &Self::Native;

    /// Executes `request` and decodes the response with `transformer`.
    fn request_as<T: ResponseBody>(
        &self,
        request: &dyn HttpRequest,
        transformer: &Transformer<T>,
        response_type: ResponseType,
    ) -> Result<HttpResponse<T>>;

    /// Same as [`request_as`](Client::request_as) with the response type of `T`.
    fn request<T: ResponseBody>(
        &self,
        request: &dyn HttpRequest,
        transformer: &Transformer<T>,
    ) -> Result<HttpResponse<T>> {
        self.request_as(request, transformer, ResponseType::of::<T>())
    }

    /// Releases the transport, returning every error hit while doing so.
    fn close(&self) -> Vec<TransportError>;

    fn register_shutdown_hook(&self);
}

/// A future-returning HTTP transport.
pub trait AsyncClient: Send + Sync {
    /// Handle of the underlying HTTP library.
    type Native;

    fn native_client(&self) -> &Self::Native;

    /// Starts `request` and returns a future of the decoded response.
    ///
    /// The transport invokes `callback`, when given, once the response is
    /// complete.
    fn request_as<T: ResponseBody>(
        &self,
        request: &dyn HttpRequest,
        transformer: &Transformer<T>,
        callback: Option<ResponseCallback<T>>,
        response_type: ResponseType,
    ) -> ResponseFuture<T>;

    /// Same as [`request_as`](AsyncClient::request_as) with the response type of `T`.
    fn request<T: ResponseBody>(
        &self,
        request: &dyn HttpRequest,
        transformer: &Transformer<T>,
        callback: Option<ResponseCallback<T>>,
    ) -> ResponseFuture<T> {
        self.request_as(request, transformer, callback, ResponseType::of::<T>())
    }

    fn is_running(&self) -> bool;

    fn register_shutdown_hook(&self);

    /// Releases the transport, returning every error hit while doing so.
    fn close(&self) -> Vec<TransportError>;
}

impl<C: Client> Client for Arc<C> {
    type Native = C::Native;

    fn native_client(&self) -> &Self::Native {
        (**self).native_client()
    }

    fn request_as<T: ResponseBody>(
        &self,
        request: &dyn HttpRequest,
        transformer: &Transformer<T>,
        response_type: ResponseType,
    ) -> Result<HttpResponse<T>> {
        (**self).request_as(request, transformer, response_type)
    }

    fn close(&self) -> Vec<TransportError> {
        (**self).close()
    }

    fn register_shutdown_hook(&self) {
        (**self).register_shutdown_hook()
    }
}

impl<A: AsyncClient> AsyncClient for Arc<A> {
    type Native = A::Native;

    fn native_client(&self) -> &Self::Native {
        (**self).native_client()
    }

    fn request_as<T: ResponseBody>(
        &self,
        request: &dyn HttpRequest,
        transformer: &Transformer<T>,
        callback: Option<ResponseCallback<T>>,
        response_type: ResponseType,
    ) -> ResponseFuture<T> {
        (**self).request_as(request, transformer, callback, response_type)
    }

    fn is_running(&self) -> bool {
        (**self).is_running()
    }

    fn register_shutdown_hook(&self) {
        (**self).register_shutdown_hook()
    }

    fn close(&self) -> Vec<TransportError> {
        (**self).close()
    }
}
