//! Prefetcher descriptor lists.
//!
//! The prefetcher walks a circular list of descriptors in memory on its own.
//! Here the list lives in a [`DescriptorPool`]: a fixed arena of hardware
//! descriptors plus a software link table. Links are slot indices; the
//! hardware `next` address fields are derived from them whenever the list
//! changes and again when it is armed.
//!
//! Lifecycle of a slot:
//!
//! 1. [`DescriptorPool::construct`] loads a validated descriptor, links the
//!    slot to itself and leaves it software-owned.
//! 2. [`DescriptorPool::append`] splices it in front of the list root,
//!    closing the circle.
//! 3. [`DescriptorPool::mark_hardware_owned`] hands every node to hardware
//!    right before [`MsgDma::start_prefetcher`](crate::MsgDma::start_prefetcher).
//!
//! Whether hardware returns ownership after completion is not tracked; call
//! [`DescriptorPool::reset_ownership`] before reusing a list.
//!
//! The pool must stay at a fixed address (typically a `static`) from the
//! moment a list is armed until the prefetcher is stopped.

use crate::driver::descriptor::{ExtendedDescriptor, StandardDescriptor};
use crate::driver::status::Response;
use crate::error::{Error, Result};
use crate::internal::register::descriptor::control;

mod volatile;

use volatile::VolatileCell;

// =============================================================================
// Hardware Descriptor Layouts
// =============================================================================

/// A descriptor format the prefetcher can walk.
pub trait PrefetcherDescriptor: Sync {
    /// Validated transfer this format is loaded from
    type Source;

    /// Zeroed descriptor
    const EMPTY: Self;

    /// Copy transfer fields; the control word is stored with the ownership
    /// bit cleared
    fn load(&self, source: &Self::Source);

    /// Control word
    fn control(&self) -> u32;

    /// Replace the control word
    fn set_control(&self, value: u32);

    /// Hardware next-descriptor address
    fn next_address(&self) -> u64;

    /// Replace the hardware next-descriptor address
    fn set_next_address(&self, addr: u64);
}

/// Standard-format prefetcher descriptor (32 bytes).
#[repr(C, align(32))]
pub struct PrefetcherStandardDescriptor {
    read_address: VolatileCell<u32>,
    write_address: VolatileCell<u32>,
    length: VolatileCell<u32>,
    next_desc_ptr: VolatileCell<u32>,
    actual_bytes_transferred: VolatileCell<u32>,
    status: VolatileCell<u32>,
    _reserved: VolatileCell<u32>,
    control: VolatileCell<u32>,
}

impl PrefetcherStandardDescriptor {
    /// Bytes written by hardware after processing
    pub fn actual_bytes_transferred(&self) -> u32 {
        self.actual_bytes_transferred.get()
    }

    /// Write-back response
    pub fn response(&self) -> Response {
        Response::from_raw(self.actual_bytes_transferred.get(), self.status.get())
    }

    /// Length in bytes
    pub fn length(&self) -> u32 {
        self.length.get()
    }
}

impl PrefetcherDescriptor for PrefetcherStandardDescriptor {
    type Source = StandardDescriptor;

    const EMPTY: Self = Self {
        read_address: VolatileCell::new(0),
        write_address: VolatileCell::new(0),
        length: VolatileCell::new(0),
        next_desc_ptr: VolatileCell::new(0),
        actual_bytes_transferred: VolatileCell::new(0),
        status: VolatileCell::new(0),
        _reserved: VolatileCell::new(0),
        control: VolatileCell::new(0),
    };

    fn load(&self, source: &StandardDescriptor) {
        self.read_address.set(source.read_address());
        self.write_address.set(source.write_address());
        self.length.set(source.length());
        self.actual_bytes_transferred.set(0);
        self.status.set(0);
        self.control.set(source.control().bits() & !control::OWNED_BY_HW);
    }

    fn control(&self) -> u32 {
        self.control.get()
    }

    fn set_control(&self, value: u32) {
        self.control.set(value);
    }

    fn next_address(&self) -> u64 {
        u64::from(self.next_desc_ptr.get())
    }

    fn set_next_address(&self, addr: u64) {
        self.next_desc_ptr.set(addr as u32);
    }
}

/// Extended-format prefetcher descriptor (64 bytes).
#[repr(C, align(64))]
pub struct PrefetcherExtendedDescriptor {
    read_address_low: VolatileCell<u32>,
    write_address_low: VolatileCell<u32>,
    length: VolatileCell<u32>,
    next_desc_ptr_low: VolatileCell<u32>,
    actual_bytes_transferred: VolatileCell<u32>,
    status: VolatileCell<u32>,
    _reserved0: VolatileCell<u32>,
    sequence_burst: VolatileCell<u32>,
    stride: VolatileCell<u32>,
    read_address_high: VolatileCell<u32>,
    write_address_high: VolatileCell<u32>,
    next_desc_ptr_high: VolatileCell<u32>,
    _reserved1: [VolatileCell<u32>; 3],
    control: VolatileCell<u32>,
}

impl PrefetcherExtendedDescriptor {
    /// Bytes written by hardware after processing
    pub fn actual_bytes_transferred(&self) -> u32 {
        self.actual_bytes_transferred.get()
    }

    /// Write-back response
    pub fn response(&self) -> Response {
        Response::from_raw(self.actual_bytes_transferred.get(), self.status.get())
    }

    /// Length in bytes
    pub fn length(&self) -> u32 {
        self.length.get()
    }
}

impl PrefetcherDescriptor for PrefetcherExtendedDescriptor {
    type Source = ExtendedDescriptor;

    const EMPTY: Self = Self {
        read_address_low: VolatileCell::new(0),
        write_address_low: VolatileCell::new(0),
        length: VolatileCell::new(0),
        next_desc_ptr_low: VolatileCell::new(0),
        actual_bytes_transferred: VolatileCell::new(0),
        status: VolatileCell::new(0),
        _reserved0: VolatileCell::new(0),
        sequence_burst: VolatileCell::new(0),
        stride: VolatileCell::new(0),
        read_address_high: VolatileCell::new(0),
        write_address_high: VolatileCell::new(0),
        next_desc_ptr_high: VolatileCell::new(0),
        _reserved1: [VolatileCell::new(0), VolatileCell::new(0), VolatileCell::new(0)],
        control: VolatileCell::new(0),
    };

    fn load(&self, source: &ExtendedDescriptor) {
        self.read_address_low.set(source.read_address() as u32);
        self.write_address_low.set(source.write_address() as u32);
        self.read_address_high.set((source.read_address() >> 32) as u32);
        self.write_address_high.set((source.write_address() >> 32) as u32);
        self.length.set(source.length());
        self.sequence_burst.set(source.sequence_burst_word());
        self.stride.set(source.stride_word());
        self.actual_bytes_transferred.set(0);
        self.status.set(0);
        self.control.set(source.control().bits() & !control::OWNED_BY_HW);
    }

    fn control(&self) -> u32 {
        self.control.get()
    }

    fn set_control(&self, value: u32) {
        self.control.set(value);
    }

    fn next_address(&self) -> u64 {
        u64::from(self.next_desc_ptr_low.get()) | (u64::from(self.next_desc_ptr_high.get()) << 32)
    }

    fn set_next_address(&self, addr: u64) {
        self.next_desc_ptr_low.set(addr as u32);
        self.next_desc_ptr_high.set((addr >> 32) as u32);
    }
}

// =============================================================================
// Handles
// =============================================================================

/// Index of a slot in a [`DescriptorPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlotId(pub usize);

impl SlotId {
    /// Slot index
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Root of a circular descriptor list; empty until the first append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DescriptorList {
    root: Option<SlotId>,
}

impl DescriptorList {
    /// Empty list
    pub const fn new() -> Self {
        Self { root: None }
    }

    /// Root slot, if the list is non-empty
    pub const fn root(&self) -> Option<SlotId> {
        self.root
    }

    /// Check if the list has no nodes
    pub const fn is_empty(&self) -> bool {
        self.root.is_none()
    }
}

// =============================================================================
// Descriptor Pool
// =============================================================================

/// Arena of `N` prefetcher descriptors with index links.
///
/// # Example
///
/// ```ignore
/// static POOL: StaticCell<DescriptorPool<PrefetcherStandardDescriptor, 8>> = StaticCell::new();
/// let pool = POOL.init(DescriptorPool::new());
/// let mut list = DescriptorList::new();
///
/// let desc = StandardDescriptor::mm_to_mm(dma.capabilities(), src, dst, 64, ctl)?;
/// pool.construct(SlotId(0), &desc)?;
/// pool.append(&mut list, SlotId(0))?;
/// dma.start_prefetcher_with_list(pool, &list, false, false)?;
/// ```
pub struct DescriptorPool<D: PrefetcherDescriptor, const N: usize> {
    slots: [D; N],
    /// `None` until constructed; `Some(self)` for an unlinked node
    links: [Option<usize>; N],
}

impl<D: PrefetcherDescriptor, const N: usize> DescriptorPool<D, N> {
    /// Pool of unconstructed slots (const, suitable for static initialization)
    pub const fn new() -> Self {
        Self {
            slots: [const { D::EMPTY }; N],
            links: [None; N],
        }
    }

    /// Number of slots
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Hardware descriptor in `slot`
    pub fn descriptor(&self, slot: SlotId) -> Option<&D> {
        self.slots.get(slot.0)
    }

    /// Bus address of `slot`
    pub fn slot_address(&self, slot: SlotId) -> Option<u64> {
        self.slots
            .get(slot.0)
            .map(|desc| core::ptr::from_ref(desc) as usize as u64)
    }

    /// Bus address of the list root, written to the prefetcher to arm it
    pub fn list_address(&self, list: &DescriptorList) -> Option<u64> {
        list.root.and_then(|root| self.slot_address(root))
    }

    /// Software link of `slot`
    pub fn next(&self, slot: SlotId) -> Option<SlotId> {
        self.links.get(slot.0).copied().flatten().map(SlotId)
    }

    /// Check the ownership bit of `slot`
    pub fn is_hardware_owned(&self, slot: SlotId) -> bool {
        self.slots
            .get(slot.0)
            .is_some_and(|desc| desc.control() & control::OWNED_BY_HW != 0)
    }

    /// Load `source` into an unlinked slot.
    ///
    /// The slot ends up self-linked (a park-eligible single-node list) and
    /// software-owned. Fails with [`Error::BadArgument`] if the slot is out
    /// of range or currently linked to other nodes.
    pub fn construct(&mut self, slot: SlotId, source: &D::Source) -> Result<()> {
        let link = *self.links.get(slot.0).ok_or(Error::BadArgument)?;
        if link.is_some_and(|next| next != slot.0) {
            return Err(Error::BadArgument);
        }

        let addr = self.slot_address(slot).ok_or(Error::BadArgument)?;
        let desc = &self.slots[slot.0];
        desc.load(source);
        desc.set_next_address(addr);
        self.links[slot.0] = Some(slot.0);
        Ok(())
    }

    /// Rewrite the transfer of a constructed, software-owned slot in place.
    ///
    /// The slot keeps its list position. Fails with [`Error::Busy`] while the
    /// slot is hardware-owned.
    pub fn reload(&self, slot: SlotId, source: &D::Source) -> Result<()> {
        let next = self.next(slot).ok_or(Error::BadArgument)?;
        if self.is_hardware_owned(slot) {
            return Err(Error::Busy);
        }
        let next_addr = self.slot_address(next).ok_or(Error::BadArgument)?;
        let desc = &self.slots[slot.0];
        desc.load(source);
        desc.set_next_address(next_addr);
        Ok(())
    }

    /// Append a freshly constructed slot to `list`.
    ///
    /// Fails with [`Error::BadArgument`] if the slot is out of range or not
    /// constructed, not self-linked, already the root, or already a member.
    pub fn append(&mut self, list: &mut DescriptorList, slot: SlotId) -> Result<()> {
        if self.next(slot) != Some(slot) {
            return Err(Error::BadArgument);
        }

        let Some(root) = list.root else {
            list.root = Some(slot);
            return Ok(());
        };
        if root == slot {
            return Err(Error::BadArgument);
        }

        let tail = self.find_tail(root, Some(slot))?;
        self.links[tail.0] = Some(slot.0);
        self.links[slot.0] = Some(root.0);
        self.sync_next(tail)?;
        self.sync_next(slot)?;
        Ok(())
    }

    /// Set the ownership bit on every node, root through tail.
    ///
    /// Hardware next addresses are refreshed from the links in the same
    /// pass. Fails with [`Error::BadArgument`] on an empty list.
    pub fn mark_hardware_owned(&self, list: &DescriptorList) -> Result<()> {
        let root = list.root.ok_or(Error::BadArgument)?;
        self.for_each_node(root, |slot, desc| {
            self.sync_next(slot)?;
            desc.set_control(desc.control() | control::OWNED_BY_HW);
            Ok(())
        })?;

        #[cfg(feature = "defmt")]
        defmt::trace!("descriptor list at slot {} handed to hardware", root.0);
        Ok(())
    }

    /// Clear the ownership bit on every node.
    ///
    /// The driver does not know whether hardware hands nodes back after a
    /// list completes; call this before rebuilding or re-arming a list.
    pub fn reset_ownership(&self, list: &DescriptorList) -> Result<()> {
        let root = list.root.ok_or(Error::BadArgument)?;
        self.for_each_node(root, |_, desc| {
            desc.set_control(desc.control() & !control::OWNED_BY_HW);
            Ok(())
        })
    }

    /// Iterate over the list once, starting at the root
    pub fn walk<'p>(&'p self, list: &DescriptorList) -> Walk<'p, D, N> {
        Walk {
            pool: self,
            root: list.root,
            cur: list.root,
            steps: 0,
        }
    }

    fn find_tail(&self, root: SlotId, reject: Option<SlotId>) -> Result<SlotId> {
        let mut cur = root;
        for _ in 0..N {
            let next = self.next(cur).ok_or(Error::BadArgument)?;
            if next == root {
                return Ok(cur);
            }
            if Some(next) == reject {
                return Err(Error::BadArgument);
            }
            cur = next;
        }
        // Links do not close within N steps
        Err(Error::BadArgument)
    }

    fn for_each_node<F>(&self, root: SlotId, mut f: F) -> Result<()>
    where
        F: FnMut(SlotId, &D) -> Result<()>,
    {
        let mut cur = root;
        for _ in 0..N {
            let desc = self.slots.get(cur.0).ok_or(Error::BadArgument)?;
            f(cur, desc)?;
            cur = self.next(cur).ok_or(Error::BadArgument)?;
            if cur == root {
                return Ok(());
            }
        }
        Err(Error::BadArgument)
    }

    fn sync_next(&self, slot: SlotId) -> Result<()> {
        let next = self.next(slot).ok_or(Error::BadArgument)?;
        let addr = self.slot_address(next).ok_or(Error::BadArgument)?;
        self.slots[slot.0].set_next_address(addr);
        Ok(())
    }
}

impl<D: PrefetcherDescriptor, const N: usize> Default for DescriptorPool<D, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over one pass of a circular list.
pub struct Walk<'p, D: PrefetcherDescriptor, const N: usize> {
    pool: &'p DescriptorPool<D, N>,
    root: Option<SlotId>,
    cur: Option<SlotId>,
    steps: usize,
}

impl<D: PrefetcherDescriptor, const N: usize> Iterator for Walk<'_, D, N> {
    type Item = SlotId;

    fn next(&mut self) -> Option<SlotId> {
        let cur = self.cur?;
        if self.steps >= N {
            return None;
        }
        self.steps += 1;
        let next = self.pool.next(cur);
        self.cur = if next == self.root { None } else { next };
        Some(cur)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
