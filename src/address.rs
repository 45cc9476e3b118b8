use num_enum::IntoPrimitive;
use snafu::Snafu;

use crate::{BROADCAST_ADDRESS, UNCONFIGURED_ADDRESS};

/// Cells of the persistent store holding the local address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StorageKey {
    /// The unit address
    Address = 0,
    /// Bitwise complement of the unit address
    Complement = 1,
}

/// Persistent key-value storage (typically EEPROM) backing the local address.
pub trait AddressStore {
    fn read_u16(&mut self, key: StorageKey) -> u16;

    fn write_u16(&mut self, key: StorageKey, value: u16);
}

impl<T: AddressStore + ?Sized> AddressStore for &mut T {
    fn read_u16(&mut self, key: StorageKey) -> u16 {
        (**self).read_u16(key)
    }

    fn write_u16(&mut self, key: StorageKey, value: u16) {
        (**self).write_u16(key, value)
    }
}

/// In-memory [`AddressStore`]. A new store reads like erased EEPROM (all cells `0xFFFF`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryStore {
    cells: [u16; 2],
}

impl MemoryStore {
    pub const fn new() -> Self {
        Self {
            cells: [0xFFFF; 2],
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressStore for MemoryStore {
    fn read_u16(&mut self, key: StorageKey) -> u16 {
        self.cells[u8::from(key) as usize]
    }

    fn write_u16(&mut self, key: StorageKey, value: u16) {
        self.cells[u8::from(key) as usize] = value;
    }
}

/// The unit's own network address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LocalAddress(u16);

impl LocalAddress {
    /// Address of a unit that has not been (validly) configured.
    pub const UNCONFIGURED: LocalAddress = LocalAddress(UNCONFIGURED_ADDRESS);

    /// Creates a local address, rejecting the reserved values.
    pub fn new(address: u16) -> Result<Self, AddressError> {
        if is_reserved(address) {
            Err(AddressError::Reserved { address })
        } else {
            Ok(LocalAddress(address))
        }
    }

    pub fn get(&self) -> u16 {
        self.0
    }

    pub fn is_configured(&self) -> bool {
        self.0 != UNCONFIGURED_ADDRESS
    }

    /// Whether a frame sent to `frame_address` is meant for this unit.
    pub fn matches(&self, frame_address: u16) -> bool {
        matches(self.0, frame_address)
    }
}

impl PartialEq<u16> for LocalAddress {
    fn eq(&self, other: &u16) -> bool {
        self.0 == *other
    }
}

/// Whether a frame sent to `frame_address` is meant for a unit at `local`.
///
/// Broadcast frames match every configured unit. An unconfigured unit matches nothing,
/// and no frame can target the unconfigured address.
pub fn matches(local: u16, frame_address: u16) -> bool {
    if local == UNCONFIGURED_ADDRESS || frame_address == UNCONFIGURED_ADDRESS {
        return false;
    }

    frame_address == BROADCAST_ADDRESS || frame_address == local
}

fn is_reserved(address: u16) -> bool {
    address == UNCONFIGURED_ADDRESS || address == BROADCAST_ADDRESS
}

/// Loads and persists the local address, stored next to its complement.
#[derive(Debug)]
pub struct AddressResolver<S> {
    store: S,
}

impl<S: AddressStore> AddressResolver<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Reads the persisted address, checking it against its stored complement.
    pub fn try_load_local_address(&mut self) -> Result<LocalAddress, AddressError> {
        let address = self.store.read_u16(StorageKey::Address);
        let complement = self.store.read_u16(StorageKey::Complement);

        if complement != !address || address == BROADCAST_ADDRESS {
            return Err(AddressError::RedundancyFailed {
                address,
                complement,
            });
        }

        Ok(LocalAddress(address))
    }

    /// Reads the persisted address, falling back to [`LocalAddress::UNCONFIGURED`] when the
    /// stored value cannot be trusted.
    pub fn load_local_address(&mut self) -> LocalAddress {
        match self.try_load_local_address() {
            Ok(address) => address,
            Err(err) => {
                warn!("local address not configured: {:?}", err);
                LocalAddress::UNCONFIGURED
            }
        }
    }

    /// Persists `address` together with its complement.
    pub fn store_local_address(&mut self, address: u16) -> Result<LocalAddress, AddressError> {
        let local = LocalAddress::new(address)?;

        self.store.write_u16(StorageKey::Address, address);
        self.store.write_u16(StorageKey::Complement, !address);
        debug!("local address set to {:#x}", address);

        Ok(local)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

/// Enum of address errors.
#[non_exhaustive]
#[derive(Debug, PartialEq, Snafu)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressError {
    #[snafu(display("Address {address:#06x} is reserved"))]
    Reserved { address: u16 },
    #[snafu(display(
        "Stored address {address:#06x} does not match its complement {complement:#06x}"
    ))]
    RedundancyFailed { address: u16, complement: u16 },
    #[snafu(display("Address change to {address:#06x} was not confirmed"))]
    Cancelled { address: u16 },
}

#[cfg(test)]
mod tests {
    use crate::{
        matches, AddressError, AddressResolver, AddressStore, LocalAddress, MemoryStore,
        StorageKey,
    };

    #[test]
    fn test_matches() {
        assert!(matches(0x0123, 0xFFFF));
        assert!(!matches(0x0123, 0x0001));
        assert!(matches(0x0123, 0x0123));
    }

    #[test]
    fn test_unconfigured_matches_nothing() {
        assert!(!matches(0x0000, 0x0000));
        assert!(!matches(0x0000, 0xFFFF));
        assert!(!matches(0x0000, 0x0123));
        assert!(!LocalAddress::UNCONFIGURED.matches(0xFFFF));
    }

    #[test]
    fn test_store_rejects_reserved() {
        let mut resolver = AddressResolver::new(MemoryStore::new());

        assert_eq!(
            resolver.store_local_address(0x0000),
            Err(AddressError::Reserved { address: 0x0000 })
        );
        assert_eq!(
            resolver.store_local_address(0xFFFF),
            Err(AddressError::Reserved { address: 0xFFFF })
        );
        // Nothing was written
        assert_eq!(resolver.store(), &MemoryStore::new());
    }

    #[test]
    fn test_store_then_load() {
        let mut resolver = AddressResolver::new(MemoryStore::new());

        let stored = resolver.store_local_address(0x0123).unwrap();
        assert_eq!(stored, 0x0123);

        let loaded = resolver.load_local_address();
        assert_eq!(loaded, 0x0123);
        assert!(loaded.is_configured());

        let mut store = resolver.into_store();
        assert_eq!(store.read_u16(StorageKey::Address), 0x0123);
        assert_eq!(store.read_u16(StorageKey::Complement), 0xFEDC);
    }

    #[test]
    fn test_load_erased_store_is_unconfigured() {
        let mut resolver = AddressResolver::new(MemoryStore::new());

        assert_eq!(
            resolver.try_load_local_address(),
            Err(AddressError::RedundancyFailed {
                address: 0xFFFF,
                complement: 0xFFFF
            })
        );
        assert_eq!(resolver.load_local_address(), LocalAddress::UNCONFIGURED);
    }

    #[test]
    fn test_load_corrupted_store_is_unconfigured() {
        let mut store = MemoryStore::new();
        store.write_u16(StorageKey::Address, 0x0123);
        store.write_u16(StorageKey::Complement, 0xFEDD);

        let mut resolver = AddressResolver::new(&mut store);
        let local = resolver.load_local_address();

        assert!(!local.is_configured());
        assert!(!local.matches(0x0123));
        assert!(!local.matches(0xFFFF));
    }

    #[test]
    fn test_load_rejects_stored_broadcast() {
        let mut store = MemoryStore::new();
        store.write_u16(StorageKey::Address, 0xFFFF);
        store.write_u16(StorageKey::Complement, 0x0000);

        let mut resolver = AddressResolver::new(store);
        assert!(matches!(
            resolver.try_load_local_address(),
            Err(AddressError::RedundancyFailed { .. })
        ));
    }
}
