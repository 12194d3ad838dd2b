//! Element type descriptions.
//!
//! A [`TypeInfo`] is what the runtime's reflection layer tells the array
//! machinery about an element type: its size and default value, how its
//! elements are copied, whether its blocks need finalization or scanning,
//! and the hooks that run per element. The machinery reads it once per
//! call and never inspects the element bytes itself.

use std::fmt;
use std::sync::Arc;

use crate::attrs::BlockAttrs;
use crate::error::{HookError, TypeInfoError};
use crate::policy::CopyPolicy;

/// Per-element hooks supplied by the runtime for one element type.
///
/// Every slice handed to a hook is exactly one element long. The default
/// bodies describe a plain value type, so implementors override only
/// the hooks their type needs.
pub trait ElementHooks: Send + Sync {
    /// Construct the default value into `dst`. `init` holds the type's
    /// initializer bytes.
    fn default_construct(&self, dst: &mut [u8], init: &[u8]) -> Result<(), HookError> {
        dst.copy_from_slice(init);
        Ok(())
    }

    /// Fix up an element that was just byte-copied into place.
    fn postblit(&self, _elem: &mut [u8]) -> Result<(), HookError> {
        Ok(())
    }

    /// Construct `dst` as a copy of `src`.
    fn copy_construct(&self, dst: &mut [u8], src: &[u8]) -> Result<(), HookError> {
        dst.copy_from_slice(src);
        Ok(())
    }

    /// Destroy an element before its block is reclaimed.
    fn finalize(&self, _elem: &mut [u8]) {}
}

/// Hooks for plain value types: every hook keeps its default body.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainHooks;

impl ElementHooks for PlainHooks {}

/// Description of one element type.
pub struct TypeInfo {
    name: String,
    size: usize,
    init: Vec<u8>,
    zero_init: bool,
    copy_policy: CopyPolicy,
    has_finalizer: bool,
    contains_references: bool,
    hooks: Arc<dyn ElementHooks>,
}

impl TypeInfo {
    /// Start describing a type named `name` whose elements are `size` bytes.
    ///
    /// Defaults: all-zero initializer, [`CopyPolicy::Trivial`], no
    /// finalizer, no references, [`PlainHooks`].
    pub fn builder(name: impl Into<String>, size: usize) -> TypeInfoBuilder {
        TypeInfoBuilder {
            name: name.into(),
            size,
            init: None,
            copy_policy: CopyPolicy::Trivial,
            has_finalizer: false,
            contains_references: false,
            hooks: Arc::new(PlainHooks),
        }
    }

    /// Type name, used in diagnostics and for type-identity checks.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size of one element in bytes. Never zero.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Initializer bytes: the default value of one element.
    pub fn initializer(&self) -> &[u8] {
        &self.init
    }

    /// Whether the default value is the all-zero bit pattern.
    pub fn is_zero_init(&self) -> bool {
        self.zero_init
    }

    /// How existing elements are duplicated.
    pub fn copy_policy(&self) -> CopyPolicy {
        self.copy_policy
    }

    /// Whether elements need destruction before their block is reclaimed.
    pub fn has_finalizer(&self) -> bool {
        self.has_finalizer
    }

    /// Whether elements hold references the collector must trace.
    pub fn contains_references(&self) -> bool {
        self.contains_references
    }

    /// The per-element hooks.
    pub fn hooks(&self) -> &dyn ElementHooks {
        self.hooks.as_ref()
    }

    /// Block attributes implied by this element type.
    ///
    /// `FINALIZE` iff elements need destruction, `NO_SCAN` iff they hold
    /// no traceable references.
    pub fn block_attrs(&self) -> BlockAttrs {
        let mut attrs = BlockAttrs::empty();
        if self.has_finalizer {
            attrs |= BlockAttrs::FINALIZE;
        }
        if !self.contains_references {
            attrs |= BlockAttrs::NO_SCAN;
        }
        attrs
    }

    /// Whether `other` describes the same element type.
    ///
    /// Name, size, initializer, copy policy and attributes must all agree.
    /// Hooks are not compared: a runtime may build equal descriptions with
    /// separate hook instances.
    pub fn same_type(&self, other: &TypeInfo) -> bool {
        std::ptr::eq(self, other)
            || (self.name == other.name
                && self.size == other.size
                && self.init == other.init
                && self.copy_policy == other.copy_policy
                && self.has_finalizer == other.has_finalizer
                && self.contains_references == other.contains_references)
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("zero_init", &self.zero_init)
            .field("copy_policy", &self.copy_policy)
            .field("has_finalizer", &self.has_finalizer)
            .field("contains_references", &self.contains_references)
            .finish_non_exhaustive()
    }
}

/// Builder for [`TypeInfo`].
pub struct TypeInfoBuilder {
    name: String,
    size: usize,
    init: Option<Vec<u8>>,
    copy_policy: CopyPolicy,
    has_finalizer: bool,
    contains_references: bool,
    hooks: Arc<dyn ElementHooks>,
}

impl TypeInfoBuilder {
    /// Set the default value of one element (default: all zero).
    pub fn initializer(mut self, init: impl Into<Vec<u8>>) -> Self {
        self.init = Some(init.into());
        self
    }

    /// Set how elements are copied (default: [`CopyPolicy::Trivial`]).
    pub fn copy_policy(mut self, policy: CopyPolicy) -> Self {
        self.copy_policy = policy;
        self
    }

    /// Mark elements as needing destruction (default: false).
    pub fn finalizer(mut self, has_finalizer: bool) -> Self {
        self.has_finalizer = has_finalizer;
        self
    }

    /// Mark elements as holding traceable references (default: false).
    pub fn references(mut self, contains_references: bool) -> Self {
        self.contains_references = contains_references;
        self
    }

    /// Install per-element hooks (default: [`PlainHooks`]).
    pub fn hooks(mut self, hooks: Arc<dyn ElementHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Validate and build the description.
    ///
    /// # Errors
    ///
    /// Returns `Err` if:
    /// - `size` is zero
    /// - the initializer is not exactly `size` bytes
    /// - the copy policy is [`CopyPolicy::DefaultConstruct`]
    pub fn build(self) -> Result<Arc<TypeInfo>, TypeInfoError> {
        if self.size == 0 {
            return Err(TypeInfoError::ZeroSize { name: self.name });
        }
        if !self.copy_policy.is_copy_policy() {
            return Err(TypeInfoError::NotACopyPolicy { name: self.name });
        }
        let init = self.init.unwrap_or_else(|| vec![0; self.size]);
        if init.len() != self.size {
            return Err(TypeInfoError::InitializerSize {
                name: self.name,
                expected: self.size,
                found: init.len(),
            });
        }
        let zero_init = init.iter().all(|&b| b == 0);
        Ok(Arc::new(TypeInfo {
            name: self.name,
            size: self.size,
            init,
            zero_init,
            copy_policy: self.copy_policy,
            has_finalizer: self.has_finalizer,
            contains_references: self.contains_references,
            hooks: self.hooks,
        }))
    }
}
