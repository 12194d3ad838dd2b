//! Reusable element type fixtures.
//!
//! Every fixture element is a little-endian `i32` except
//! [`reference_type`], so [`i32_bytes`](crate::i32_bytes) and
//! [`decode_i32s`](crate::decode_i32s) read and write all of them.
//!
//! - [`int32_type`]: plain trivially copied integer.
//! - [`counting_postblit_type`]: postblit policy, counts every hook call.
//! - [`failing_copy_type`]: copy-construct policy, fails on the Nth copy.
//! - [`failing_finalized_type`]: as above, plus a finalizer.
//! - [`failing_default_type`]: non-zero default, fails on the Nth default.
//! - [`finalized_type`]: carries a finalizer.
//! - [`sentinel_default_type`]: non-zero default value.
//! - [`reference_type`]: holds references, so its blocks are scanned.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use sprawl_core::{CopyPolicy, ElementHooks, HookError, TypeInfo};

/// A 4-byte integer with no hooks.
pub fn int32_type() -> Arc<TypeInfo> {
    TypeInfo::builder("int", 4)
        .build()
        .expect("int fixture is valid")
}

/// An 8-byte element that contains references.
pub fn reference_type() -> Arc<TypeInfo> {
    TypeInfo::builder("ref", 8)
        .references(true)
        .build()
        .expect("ref fixture is valid")
}

/// Hooks that count every call and otherwise behave like plain bytes.
#[derive(Debug, Default)]
pub struct CountingHooks {
    postblits: AtomicUsize,
    copies: AtomicUsize,
    defaults: AtomicUsize,
    finalized: AtomicUsize,
}

impl CountingHooks {
    pub fn postblits(&self) -> usize {
        self.postblits.load(Ordering::SeqCst)
    }

    pub fn copies(&self) -> usize {
        self.copies.load(Ordering::SeqCst)
    }

    pub fn defaults(&self) -> usize {
        self.defaults.load(Ordering::SeqCst)
    }

    pub fn finalized(&self) -> usize {
        self.finalized.load(Ordering::SeqCst)
    }
}

impl ElementHooks for CountingHooks {
    fn default_construct(&self, dst: &mut [u8], init: &[u8]) -> Result<(), HookError> {
        self.defaults.fetch_add(1, Ordering::SeqCst);
        dst.copy_from_slice(init);
        Ok(())
    }

    fn postblit(&self, _elem: &mut [u8]) -> Result<(), HookError> {
        self.postblits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn copy_construct(&self, dst: &mut [u8], src: &[u8]) -> Result<(), HookError> {
        self.copies.fetch_add(1, Ordering::SeqCst);
        dst.copy_from_slice(src);
        Ok(())
    }

    fn finalize(&self, _elem: &mut [u8]) {
        self.finalized.fetch_add(1, Ordering::SeqCst);
    }
}

/// A 4-byte integer copied by postblit.
pub fn counting_postblit_type() -> (Arc<TypeInfo>, Arc<CountingHooks>) {
    let hooks = Arc::new(CountingHooks::default());
    let ty = TypeInfo::builder("counted", 4)
        .copy_policy(CopyPolicy::Postblit)
        .hooks(hooks.clone())
        .build()
        .expect("counted fixture is valid");
    (ty, hooks)
}

/// A 4-byte integer with a finalizer.
pub fn finalized_type() -> (Arc<TypeInfo>, Arc<CountingHooks>) {
    let hooks = Arc::new(CountingHooks::default());
    let ty = TypeInfo::builder("resource", 4)
        .finalizer(true)
        .hooks(hooks.clone())
        .build()
        .expect("resource fixture is valid");
    (ty, hooks)
}

/// A 4-byte integer whose default value is `value`.
pub fn sentinel_default_type(value: i32) -> (Arc<TypeInfo>, Arc<CountingHooks>) {
    let hooks = Arc::new(CountingHooks::default());
    let ty = TypeInfo::builder("sentinel", 4)
        .initializer(value.to_le_bytes())
        .hooks(hooks.clone())
        .build()
        .expect("sentinel fixture is valid");
    (ty, hooks)
}

/// Hooks that fail on one chosen construction call.
///
/// Copy and default construction share one call counter. Unarmed hooks
/// never fail. [`arm`](Self::arm) resets the counter.
#[derive(Debug, Default)]
pub struct FailingHooks {
    calls: AtomicUsize,
    fail_on: AtomicUsize,
    finalized: AtomicUsize,
}

impl FailingHooks {
    /// Fail the `nth` construction from now (1-based). Zero disarms.
    pub fn arm(&self, nth: usize) {
        self.calls.store(0, Ordering::SeqCst);
        self.fail_on.store(nth, Ordering::SeqCst);
    }

    /// Constructions attempted since the last [`arm`](Self::arm),
    /// including a failed one.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn finalized(&self) -> usize {
        self.finalized.load(Ordering::SeqCst)
    }

    fn attempt(&self, what: &str) -> Result<(), HookError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on.load(Ordering::SeqCst) {
            return Err(HookError::new(format!("{what} {call} refused")));
        }
        Ok(())
    }
}

impl ElementHooks for FailingHooks {
    fn default_construct(&self, dst: &mut [u8], init: &[u8]) -> Result<(), HookError> {
        self.attempt("default")?;
        dst.copy_from_slice(init);
        Ok(())
    }

    fn copy_construct(&self, dst: &mut [u8], src: &[u8]) -> Result<(), HookError> {
        self.attempt("copy")?;
        dst.copy_from_slice(src);
        Ok(())
    }

    fn finalize(&self, _elem: &mut [u8]) {
        self.finalized.fetch_add(1, Ordering::SeqCst);
    }
}

/// A 4-byte integer copied by copy-construction.
pub fn failing_copy_type() -> (Arc<TypeInfo>, Arc<FailingHooks>) {
    let hooks = Arc::new(FailingHooks::default());
    let ty = TypeInfo::builder("fragile", 4)
        .copy_policy(CopyPolicy::CopyConstruct)
        .hooks(hooks.clone())
        .build()
        .expect("fragile fixture is valid");
    (ty, hooks)
}

/// Like [`failing_copy_type`], but its blocks carry a finalizer.
pub fn failing_finalized_type() -> (Arc<TypeInfo>, Arc<FailingHooks>) {
    let hooks = Arc::new(FailingHooks::default());
    let ty = TypeInfo::builder("fragile_resource", 4)
        .copy_policy(CopyPolicy::CopyConstruct)
        .finalizer(true)
        .hooks(hooks.clone())
        .build()
        .expect("fragile_resource fixture is valid");
    (ty, hooks)
}

/// A 4-byte integer defaulting to `value` whose default construction
/// can be made to fail.
pub fn failing_default_type(value: i32) -> (Arc<TypeInfo>, Arc<FailingHooks>) {
    let hooks = Arc::new(FailingHooks::default());
    let ty = TypeInfo::builder("fragile_default", 4)
        .initializer(value.to_le_bytes())
        .hooks(hooks.clone())
        .build()
        .expect("fragile_default fixture is valid");
    (ty, hooks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_have_expected_shape() {
        assert!(int32_type().is_zero_init());
        assert!(reference_type().contains_references());
        let (ty, _) = finalized_type();
        assert!(ty.has_finalizer());
        let (ty, _) = sentinel_default_type(5);
        assert_eq!(ty.initializer(), &5i32.to_le_bytes());
    }

    #[test]
    fn failing_copy_fails_once_armed() {
        let hooks = FailingHooks::default();
        let mut dst = [0u8; 4];
        assert!(hooks.copy_construct(&mut dst, &[1, 0, 0, 0]).is_ok());
        hooks.arm(2);
        assert!(hooks.copy_construct(&mut dst, &[2, 0, 0, 0]).is_ok());
        assert!(hooks.copy_construct(&mut dst, &[3, 0, 0, 0]).is_err());
        assert_eq!(hooks.calls(), 2);
        assert_eq!(dst, [2, 0, 0, 0]);
    }

    #[test]
    fn failing_default_shares_the_call_counter() {
        let hooks = FailingHooks::default();
        let mut dst = [0u8; 4];
        hooks.arm(2);
        assert!(hooks.default_construct(&mut dst, &[5, 0, 0, 0]).is_ok());
        assert!(hooks.copy_construct(&mut dst, &[6, 0, 0, 0]).is_err());
        assert_eq!(hooks.calls(), 2);
        assert_eq!(dst, [5, 0, 0, 0]);
        hooks.finalize(&mut dst);
        assert_eq!(hooks.finalized(), 1);
    }
}
