//! Named hash registry
//!
//! Fiat–Shamir challenges and the circuit configuration digest are derived
//! from a hash chosen **by name** (e.g. `"blake3"`). A [`HashRegistry`] maps
//! names to a [`HashBuilder`], which hands out two flavours of the same hash:
//!
//! - a [`NativeHasher`] over bytes, driving the transcript;
//! - a [`FieldHasher`] over field elements, the gadget-side view used to
//!   digest circuit structure in field form.
//!
//! The registry is an explicit value: build it once at startup, then pass it
//! by reference to every prove/verify call. Registering a name twice is an
//! error ([`RegistryError::DuplicateRegistration`]); an existing binding is
//! never overwritten.
//!
//! ```
//! use gkrzkp::hash::{HashBuilder, HashRegistry, RegistryError};
//!
//! let mut reg = HashRegistry::with_defaults();
//! assert!(reg.resolve("blake3").is_ok());
//! assert!(matches!(reg.resolve("mimc"), Err(RegistryError::UnknownHash(_))));
//!
//! let dup = reg.register("sha256", HashBuilder::from_native(|| Box::new(gkrzkp::hash::Sha256Hasher::default())));
//! assert!(matches!(dup, Err(RegistryError::DuplicateRegistration(_))));
//! ```

#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use ark_ff::PrimeField;
use ark_serialize::CanonicalSerialize;
use sha2::Digest;

use crate::F;

/// Name under which the BLAKE3 binding is registered by [`HashRegistry::with_defaults`].
pub const BLAKE3: &str = "blake3";
/// Name under which the SHA-256 binding is registered by [`HashRegistry::with_defaults`].
pub const SHA256: &str = "sha256";

/// Registry failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The name is already bound.
    #[error("hash `{0}` is already registered")]
    DuplicateRegistration(String),
    /// No binding under this name.
    #[error("hash `{0}` is not registered")]
    UnknownHash(String),
}

/// Incremental byte hasher (the off-circuit half of a binding).
pub trait NativeHasher: Send {
    /// Absorb bytes.
    fn update(&mut self, bytes: &[u8]);
    /// Digest of everything absorbed so far. Does not consume the state.
    fn finalize(&self) -> Vec<u8>;
    /// Clone behind the trait object (challenge derivation forks the state).
    fn box_clone(&self) -> Box<dyn NativeHasher>;
}

/// Hasher over field elements (the gadget-side half of a binding).
pub trait FieldHasher: Send {
    /// Absorb field elements.
    fn write(&mut self, elems: &[F]);
    /// Digest of everything absorbed since the last reset, as a field element.
    fn sum(&self) -> F;
    /// Forget all absorbed elements.
    fn reset(&mut self);
}

type NativeCtor = Arc<dyn Fn() -> Box<dyn NativeHasher> + Send + Sync>;
type FieldCtor = Arc<dyn Fn() -> Box<dyn FieldHasher> + Send + Sync>;

/// Constructor pair stored in the registry.
#[derive(Clone)]
pub struct HashBuilder {
    native: NativeCtor,
    field: FieldCtor,
}

impl HashBuilder {
    /// Bind explicit native and field constructors.
    pub fn new<N, G>(native: N, field: G) -> Self
    where
        N: Fn() -> Box<dyn NativeHasher> + Send + Sync + 'static,
        G: Fn() -> Box<dyn FieldHasher> + Send + Sync + 'static,
    {
        Self { native: Arc::new(native), field: Arc::new(field) }
    }

    /// Bind a native constructor; the field hasher is derived from it
    /// (compressed element encoding → native digest → reduction mod `r`).
    pub fn from_native<N>(native: N) -> Self
    where
        N: Fn() -> Box<dyn NativeHasher> + Send + Sync + 'static,
    {
        let native: NativeCtor = Arc::new(native);
        let for_field = native.clone();
        let field: FieldCtor =
            Arc::new(move || Box::new(BytesFieldHasher::new(for_field.clone())) as Box<dyn FieldHasher>);
        Self { native, field }
    }

    /// Fresh native hasher.
    pub fn native(&self) -> Box<dyn NativeHasher> {
        (self.native)()
    }

    /// Fresh field hasher.
    pub fn field_hasher(&self) -> Box<dyn FieldHasher> {
        (self.field)()
    }
}

impl fmt::Debug for HashBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashBuilder { .. }")
    }
}

/// Name → [`HashBuilder`] mapping. Read-mostly after startup.
#[derive(Clone, Debug, Default)]
pub struct HashRegistry {
    entries: BTreeMap<String, HashBuilder>,
}

impl HashRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with [`BLAKE3`] and [`SHA256`] bound.
    pub fn with_defaults() -> Self {
        let mut reg = Self::new();
        reg.entries
            .insert(BLAKE3.to_string(), HashBuilder::from_native(|| Box::new(Blake3Hasher::default())));
        reg.entries
            .insert(SHA256.to_string(), HashBuilder::from_native(|| Box::new(Sha256Hasher::default())));
        reg
    }

    /// Bind `name`. Fails if it is already bound.
    pub fn register(&mut self, name: &str, builder: HashBuilder) -> Result<(), RegistryError> {
        if self.entries.contains_key(name) {
            return Err(RegistryError::DuplicateRegistration(name.to_string()));
        }
        tracing::debug!(hash = name, "registered hash binding");
        self.entries.insert(name.to_string(), builder);
        Ok(())
    }

    /// Look up `name`.
    pub fn resolve(&self, name: &str) -> Result<&HashBuilder, RegistryError> {
        self.entries.get(name).ok_or_else(|| RegistryError::UnknownHash(name.to_string()))
    }

    /// Whether `name` is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Built-in bindings
// ---------------------------------------------------------------------------

/// BLAKE3 (32-byte digest).
#[derive(Clone, Default)]
pub struct Blake3Hasher(blake3::Hasher);

impl NativeHasher for Blake3Hasher {
    fn update(&mut self, bytes: &[u8]) {
        self.0.update(bytes);
    }
    fn finalize(&self) -> Vec<u8> {
        self.0.finalize().as_bytes().to_vec()
    }
    fn box_clone(&self) -> Box<dyn NativeHasher> {
        Box::new(self.clone())
    }
}

/// SHA-256.
#[derive(Clone, Default)]
pub struct Sha256Hasher(sha2::Sha256);

impl NativeHasher for Sha256Hasher {
    fn update(&mut self, bytes: &[u8]) {
        Digest::update(&mut self.0, bytes);
    }
    fn finalize(&self) -> Vec<u8> {
        self.0.clone().finalize().to_vec()
    }
    fn box_clone(&self) -> Box<dyn NativeHasher> {
        Box::new(self.clone())
    }
}

/// Field hasher derived from a native byte hasher.
struct BytesFieldHasher {
    ctor: NativeCtor,
    buf: Vec<u8>,
}

impl BytesFieldHasher {
    fn new(ctor: NativeCtor) -> Self {
        Self { ctor, buf: Vec::new() }
    }
}

impl FieldHasher for BytesFieldHasher {
    fn write(&mut self, elems: &[F]) {
        for e in elems {
            e.serialize_compressed(&mut self.buf).expect("serialize field");
        }
    }
    fn sum(&self) -> F {
        let mut h = (self.ctor)();
        h.update(b"gkrzkp.field_hasher.v1");
        h.update(&self.buf);
        F::from_le_bytes_mod_order(&h.finalize())
    }
    fn reset(&mut self) {
        self.buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve_and_unknown_fails() {
        let reg = HashRegistry::with_defaults();
        assert_eq!(reg.names().collect::<Vec<_>>(), vec![BLAKE3, SHA256]);
        assert!(reg.resolve(BLAKE3).is_ok());
        assert_eq!(reg.resolve("mimc").unwrap_err(), RegistryError::UnknownHash("mimc".into()));
    }

    #[test]
    fn duplicate_registration_is_rejected_and_keeps_first_binding() {
        let mut reg = HashRegistry::new();
        reg.register("h", HashBuilder::from_native(|| Box::new(Blake3Hasher::default()))).unwrap();
        let before = reg.resolve("h").unwrap().native().finalize();

        let err = reg
            .register("h", HashBuilder::from_native(|| Box::new(Sha256Hasher::default())))
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateRegistration("h".into()));
        assert_eq!(reg.resolve("h").unwrap().native().finalize(), before);
    }

    #[test]
    fn native_finalize_does_not_consume_state() {
        let b = HashRegistry::with_defaults().resolve(SHA256).unwrap().clone();
        let mut h = b.native();
        h.update(b"abc");
        let d1 = h.finalize();
        let d2 = h.finalize();
        assert_eq!(d1, d2);
        assert_eq!(hex::encode(&d1), "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
    }

    #[test]
    fn field_hasher_is_deterministic_and_resettable() {
        let reg = HashRegistry::with_defaults();
        let b = reg.resolve(BLAKE3).unwrap();
        let mut g = b.field_hasher();
        g.write(&[F::from(1u64), F::from(2u64)]);
        let s1 = g.sum();

        let mut g2 = b.field_hasher();
        g2.write(&[F::from(1u64)]);
        g2.write(&[F::from(2u64)]);
        assert_eq!(s1, g2.sum());

        g2.reset();
        g2.write(&[F::from(2u64), F::from(1u64)]);
        assert_ne!(s1, g2.sum());
    }

    #[test]
    fn bindings_differ_between_hashes() {
        let reg = HashRegistry::with_defaults();
        let mut a = reg.resolve(BLAKE3).unwrap().field_hasher();
        let mut b = reg.resolve(SHA256).unwrap().field_hasher();
        a.write(&[F::from(7u64)]);
        b.write(&[F::from(7u64)]);
        assert_ne!(a.sum(), b.sum());
    }
}
