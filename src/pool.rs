//! Reuse of builders and their buffers across meshes.

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, PoisonError};

use crate::builder::PolygonMeshBuilder;

/// A free list of reset builders.
///
/// One pool can be shared between threads; each acquired builder is used by
/// one thread at a time.
#[derive(Debug, Default)]
pub struct BuilderPool {
    free: Mutex<Vec<PolygonMeshBuilder>>,
}

impl BuilderPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a builder from the pool, creating one if none is free.
    ///
    /// The builder goes back to the pool when the guard is dropped.
    pub fn acquire(&self) -> PooledBuilder<'_> {
        let builder = self
            .free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_default();

        PooledBuilder {
            pool: self,
            builder: Some(builder),
        }
    }

    /// Resets `builder` and stores it for later reuse.
    pub fn release(&self, mut builder: PolygonMeshBuilder) {
        builder.reset();
        self.free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(builder);
    }

    /// Number of builders waiting to be reused.
    #[must_use]
    pub fn idle_count(&self) -> usize {
        self.free.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// A builder on loan from a [`BuilderPool`].
#[derive(Debug)]
pub struct PooledBuilder<'a> {
    pool: &'a BuilderPool,
    // Only `None` after `detach` or during drop.
    builder: Option<PolygonMeshBuilder>,
}

impl PooledBuilder<'_> {
    /// Keeps the builder instead of returning it to the pool.
    #[must_use]
    pub fn detach(mut self) -> PolygonMeshBuilder {
        self.builder.take().unwrap_or_default()
    }
}

impl Deref for PooledBuilder<'_> {
    type Target = PolygonMeshBuilder;

    fn deref(&self) -> &Self::Target {
        match &self.builder {
            Some(builder) => builder,
            None => unreachable!("pooled builder used after detach"),
        }
    }
}

impl DerefMut for PooledBuilder<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match &mut self.builder {
            Some(builder) => builder,
            None => unreachable!("pooled builder used after detach"),
        }
    }
}

impl Drop for PooledBuilder<'_> {
    fn drop(&mut self) {
        if let Some(builder) = self.builder.take() {
            self.pool.release(builder);
        }
    }
}
