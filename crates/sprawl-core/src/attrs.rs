//! Block-level attribute bits.

bitflags::bitflags! {
    /// Attributes attached to a block when it is allocated.
    ///
    /// The collector reads these to decide whether to scan a block for
    /// references and whether element destructors must run before the
    /// block is reclaimed.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct BlockAttrs: u8 {
        /// The block holds no collector-traceable references.
        const NO_SCAN = 1 << 0;
        /// The block tracks a used size that array views may extend in place.
        const APPENDABLE = 1 << 1;
        /// Element destructors must run before the block is reclaimed.
        const FINALIZE = 1 << 2;
    }
}
