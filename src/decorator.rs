//! Caching decorators for [`Client`] and [`AsyncClient`].
//!
//! Both decorators derive a [`Key`](crate::Key) for every request and route
//! the call through the shared [`Cache`]. Everything that is not a request
//! (native handle, liveness, shutdown hooks, closing) goes straight to the
//! wrapped transport.

use std::fmt;
use std::sync::{Arc, Weak};

use futures::future::{BoxFuture, WeakShared};
use once_cell::sync::OnceCell;

use crate::client::{
    response_future, AsyncClient, Client, ResponseBody, ResponseCallback, ResponseFuture,
    ResponseType, Transformer,
};
use crate::error::{Result, TransportError};
use crate::key_generator::KeyGenerator;
use crate::request::{HttpRequest, HttpResponse};
use crate::{BoundedCache, Cache, Key};

type WeakResponseFuture<T> = WeakShared<BoxFuture<'static, Result<HttpResponse<T>>>>;

/// A [`Client`] that answers repeated requests from a cache.
///
/// A miss runs the wrapped client and stores its successful response; a
/// failed request is returned as-is and not stored. While an entry exists,
/// concurrent callers for its key never reach the transport twice.
pub struct CachingClient<C, S = BoundedCache> {
    delegate: C,
    cache: Arc<S>,
    key_generator: Arc<dyn KeyGenerator>,
}

impl<C: Client, S: Cache> CachingClient<C, S> {
    pub fn new(delegate: C, cache: Arc<S>, key_generator: Arc<dyn KeyGenerator>) -> Self {
        Self {
            delegate,
            cache,
            key_generator,
        }
    }

    /// Returns the wrapped transport.
    pub fn delegate(&self) -> &C {
        &self.delegate
    }

    pub fn cache(&self) -> &Arc<S> {
        &self.cache
    }
}

impl<C: Client, S: Cache> Client for CachingClient<C, S> {
    type Native = C::Native;

    fn native_client(&self) -> &Self::Native {
        self.delegate.native_client()
    }

    fn request_as<T: ResponseBody>(
        &self,
        request: &dyn HttpRequest,
        transformer: &Transformer<T>,
        response_type: ResponseType,
    ) -> Result<HttpResponse<T>> {
        let key = self.key_generator.generate(request, false, response_type);
        self.cache.get(key, || {
            self.delegate.request_as(request, transformer, response_type)
        })
    }

    fn close(&self) -> Vec<TransportError> {
        self.delegate.close()
    }

    fn register_shutdown_hook(&self) {
        self.delegate.register_shutdown_hook()
    }
}

impl<C, S> fmt::Debug for CachingClient<C, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachingClient")
            .field("delegate", &std::any::type_name::<C>())
            .finish_non_exhaustive()
    }
}

/// An [`AsyncClient`] that shares in-flight and completed response futures.
///
/// The cache stores the future returned by the wrapped client, not its
/// output, so callers arriving while the request is still running wait on
/// the same future instead of issuing a new request.
///
/// A future that resolves to an error stays cached until it expires or is
/// evicted, unless the decorator was built with `cache_failures` disabled;
/// then the entry is dropped as soon as the failure is observed.
pub struct CachingAsyncClient<A, S = BoundedCache> {
    delegate: A,
    cache: Arc<S>,
    key_generator: Arc<dyn KeyGenerator>,
    cache_failures: bool,
}

impl<A: AsyncClient, S: Cache> CachingAsyncClient<A, S> {
    pub fn new(
        delegate: A,
        cache: Arc<S>,
        key_generator: Arc<dyn KeyGenerator>,
        cache_failures: bool,
    ) -> Self {
        Self {
            delegate,
            cache,
            key_generator,
            cache_failures,
        }
    }

    /// Returns the wrapped transport.
    pub fn delegate(&self) -> &A {
        &self.delegate
    }

    pub fn cache(&self) -> &Arc<S> {
        &self.cache
    }

    /// Wraps `future` so that resolving to an error drops `key` from the cache.
    ///
    /// Only the wrapped future itself is dropped: if it was already evicted
    /// and a newer future now sits under `key`, the newer one stays. Both the
    /// cache and the wrapped future are held weakly, since the wrapped future
    /// is itself stored in the cache.
    fn evict_on_failure<T: ResponseBody>(
        &self,
        key: Key,
        future: ResponseFuture<T>,
    ) -> ResponseFuture<T> {
        let cache: Weak<S> = Arc::downgrade(&self.cache);
        let this: Arc<OnceCell<WeakResponseFuture<T>>> = Arc::new(OnceCell::new());
        let slot = Arc::clone(&this);

        let wrapped = response_future(async move {
            let result = future.await;
            if let Err(error) = &result {
                let current = slot.get().and_then(WeakShared::upgrade);
                if let (Some(cache), Some(current)) = (cache.upgrade(), current) {
                    if cache.remove_if(&key, |stored: &ResponseFuture<T>| stored.ptr_eq(&current)) {
                        tracing::debug!(%key, %error, "dropped failed response from cache");
                    }
                }
            }
            result
        });

        if let Some(weak) = wrapped.downgrade() {
            let _ = this.set(weak);
        }
        wrapped
    }
}

impl<A: AsyncClient, S: Cache> AsyncClient for CachingAsyncClient<A, S> {
    type Native = A::Native;

    fn native_client(&self) -> &Self::Native {
        self.delegate.native_client()
    }

    fn request_as<T: ResponseBody>(
        &self,
        request: &dyn HttpRequest,
        transformer: &Transformer<T>,
        callback: Option<ResponseCallback<T>>,
        response_type: ResponseType,
    ) -> ResponseFuture<T> {
        let key = self.key_generator.generate(request, true, response_type);
        self.cache.get_async(key, || {
            let future = self
                .delegate
                .request_as(request, transformer, callback, response_type);
            if self.cache_failures {
                future
            } else {
                self.evict_on_failure(key, future)
            }
        })
    }

    fn is_running(&self) -> bool {
        self.delegate.is_running()
    }

    fn register_shutdown_hook(&self) {
        self.delegate.register_shutdown_hook()
    }

    fn close(&self) -> Vec<TransportError> {
        self.delegate.close()
    }
}

impl<A, S> fmt::Debug for CachingAsyncClient<A, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachingAsyncClient")
            .field("delegate", &std::any::type_name::<A>())
            .field("cache_failures", &self.cache_failures)
            .finish_non_exhaustive()
    }
}
