//! Resolution of named input types through introspection
//!
//! The set of types an operation depends on is only discovered as shapes are
//! fetched, and input types may refer to themselves. Every name is marked as
//! visited when it is first queued so that each type is fetched exactly once
//! and cycles terminate.

use std::collections::{HashSet, VecDeque};

use futures::{StreamExt as _, TryStreamExt as _};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::{
    converter::{Converted, convert_shape},
    errors::ResolveError,
    introspection::{IntrospectionProvider, TypeShape},
    scalar::BuiltinScalar,
};

/// Resolves named types into a `definitions` map
pub struct TypeResolver<'a, P: ?Sized> {
    provider: &'a P,
    max_concurrent_fetches: usize,
}

impl<'a, P> TypeResolver<'a, P>
where
    P: IntrospectionProvider + ?Sized,
{
    /// Create a resolver which fetches one type at a time
    pub fn new(provider: &'a P) -> Self {
        Self {
            provider,
            max_concurrent_fetches: 1,
        }
    }

    /// Allow fetching up to `limit` independent types at once.
    ///
    /// Types discovered in the same round do not depend on one another, so
    /// they may be fetched together. A limit of zero is treated as one.
    pub fn with_max_concurrent_fetches(mut self, limit: usize) -> Self {
        self.max_concurrent_fetches = limit.max(1);
        self
    }

    /// Resolve every type reachable from `seeds` into its definition
    pub async fn resolve<I>(&self, seeds: I) -> Result<Map<String, Value>, ResolveError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut state = Resolution::default();
        state.enqueue_all(seeds);

        while !state.pending.is_empty() {
            let round = state.pending.drain(..).collect::<Vec<_>>();
            trace!(types = ?round, "resolving round of types");

            let shapes = futures::stream::iter(round)
                .map(|type_name| async move {
                    let shape = self.fetch(&type_name).await?;
                    Ok::<_, ResolveError>((type_name, shape))
                })
                .buffered(self.max_concurrent_fetches)
                .try_collect::<Vec<_>>()
                .await?;

            for (type_name, shape) in shapes {
                let Converted {
                    definition,
                    discovered,
                } = convert_shape(&shape);
                state.resolved.insert(type_name, definition.into());
                state.enqueue_all(discovered);
            }
        }

        Ok(state.resolved)
    }

    async fn fetch(&self, type_name: &str) -> Result<TypeShape, ResolveError> {
        debug!(type_name, "fetching type shape");
        self.provider
            .fetch_type_shape(type_name)
            .await
            .and_then(|response| response.into_shape())
            .map_err(|source| ResolveError {
                type_name: type_name.to_string(),
                source,
            })
    }
}

/// The bookkeeping for one resolution
#[derive(Default)]
struct Resolution {
    /// Types waiting to be fetched
    pending: VecDeque<String>,

    /// Types which have been queued at some point, resolved or not
    visited: HashSet<String>,

    resolved: Map<String, Value>,
}

impl Resolution {
    fn enqueue_all(&mut self, names: impl IntoIterator<Item = String>) {
        for name in names {
            if BuiltinScalar::is_builtin(&name) || !self.visited.insert(name.clone()) {
                continue;
            }
            self.pending.push_back(name);
        }
    }
}
