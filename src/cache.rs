//! Resolution cache from raw name bytes to type handles.
//!
//! Resolving a compact name means UTF-8 decoding, placeholder expansion, name parsing and a
//! registry lookup. Streams repeat the same few names constantly, so the [`TypeNameCache`] maps
//! the exact bytes read from the stream straight to the resolved handle. Keys are compared by
//! content; a hit costs one hash of the bytes and no allocation.
//!
//! # Thread Safety
//!
//! The cache is append-only and backed by a `DashMap`. Concurrent misses on the same key may
//! both run the resolver; the first insert wins and every caller gets the stored handle, so a key
//! never maps to two different handles.
//!
//! A cache is only valid for one [`crate::TypeLookup`]: handles from another registry compare
//! unequal even when their names match. Keys are compact bytes, so it is equally tied to one
//! [`crate::NameCompressor`] substitution table. [`TypeNameCache::shared`] is meant for processes
//! with a single registry and compressor.

use std::{
    borrow::Borrow,
    hash::{BuildHasherDefault, Hasher},
    sync::{Arc, OnceLock},
};

use dashmap::DashMap;
use log::{debug, trace};

use crate::{typesystem::TypeHandle, Result};

/// Content-compared byte sequence used as cache key.
///
/// Hashing delegates to the byte content so lookups can borrow a plain `&[u8]`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ByteKey(Arc<[u8]>);

impl ByteKey {
    /// Copy `bytes` into a new key.
    #[must_use]
    pub fn new(bytes: &[u8]) -> Self {
        ByteKey(Arc::from(bytes))
    }

    /// The key content.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Borrow<[u8]> for ByteKey {
    fn borrow(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for ByteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ByteKey({:?})", String::from_utf8_lossy(&self.0))
    }
}

/// FNV-1a hasher with a final avalanche step.
///
/// Cache keys are short ASCII names; FNV-1a hashes them in one pass without the per-hash setup
/// cost of the default SipHash.
#[derive(Clone, Copy)]
pub struct FnvHasher(u64);

impl Default for FnvHasher {
    fn default() -> Self {
        FnvHasher(0xcbf2_9ce4_8422_2325) // FNV-1a 64-bit offset basis
    }
}

impl Hasher for FnvHasher {
    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.0 ^= u64::from(*byte);
            self.0 = self.0.wrapping_mul(0x0100_0000_01b3); // FNV-1a 64-bit prime
        }
    }

    fn finish(&self) -> u64 {
        let mut state = self.0;
        state ^= state >> 33;
        state = state.wrapping_mul(0xff51_afd7_ed55_8ccd);
        state ^= state >> 33;
        state
    }
}

/// [`std::hash::BuildHasher`] producing [`FnvHasher`]s, used by [`TypeNameCache`].
pub type FnvBuildHasher = BuildHasherDefault<FnvHasher>;

static SHARED: OnceLock<Arc<TypeNameCache>> = OnceLock::new();

/// Concurrent, append-only map from compact-name bytes to resolved type handles.
///
/// # Examples
///
/// ```rust
/// use wiretype::{TypeLookup, TypeNameCache, TypeRegistry};
///
/// let registry = TypeRegistry::new();
/// let cache = TypeNameCache::new();
///
/// let first = cache.get_or_resolve(b"System.Int32", |bytes| {
///     registry.resolve_type_by_name(std::str::from_utf8(bytes).unwrap())
/// })?;
/// let hit = cache.get(b"System.Int32").unwrap();
/// assert_eq!(first, hit);
/// # Ok::<(), wiretype::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct TypeNameCache {
    entries: DashMap<ByteKey, TypeHandle, FnvBuildHasher>,
}

impl TypeNameCache {
    /// Create an empty, isolated cache.
    #[must_use]
    pub fn new() -> Self {
        TypeNameCache {
            entries: DashMap::with_hasher(FnvBuildHasher::default()),
        }
    }

    /// The process-wide cache.
    ///
    /// Created empty on first use and never cleared.
    #[must_use]
    pub fn shared() -> Arc<TypeNameCache> {
        SHARED.get_or_init(|| Arc::new(TypeNameCache::new())).clone()
    }

    /// Look up the handle cached for `bytes`.
    #[must_use]
    pub fn get(&self, bytes: &[u8]) -> Option<TypeHandle> {
        self.entries.get(bytes).map(|entry| entry.value().clone())
    }

    /// Returns `true` if `bytes` has a cached handle.
    #[must_use]
    pub fn contains(&self, bytes: &[u8]) -> bool {
        self.entries.contains_key(bytes)
    }

    /// Cache `handle` for `bytes` unless an entry exists, returning the stored handle.
    pub fn insert(&self, bytes: &[u8], handle: TypeHandle) -> TypeHandle {
        self.entries
            .entry(ByteKey::new(bytes))
            .or_insert(handle)
            .value()
            .clone()
    }

    /// Return the cached handle for `bytes`, running `resolve` and caching its result on a miss.
    ///
    /// `resolve` runs without holding any lock. Failed resolutions are not cached.
    ///
    /// # Errors
    /// Returns whatever `resolve` returns.
    pub fn get_or_resolve<F>(&self, bytes: &[u8], resolve: F) -> Result<TypeHandle>
    where
        F: FnOnce(&[u8]) -> Result<TypeHandle>,
    {
        if let Some(handle) = self.get(bytes) {
            trace!("type name cache hit for {}", handle.full_name());
            return Ok(handle);
        }

        debug!(
            "type name cache miss for '{}'",
            String::from_utf8_lossy(bytes)
        );
        let handle = resolve(bytes)?;
        Ok(self.insert(bytes, handle))
    }

    /// Number of cached names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
