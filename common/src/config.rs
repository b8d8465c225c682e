use anyhow::Result;
use embedded_storage::Storage;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error_with_location;

/// Settings that survive a power cycle.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Config {
    /// global output scale handed to the frame sink
    pub brightness: u8,
    /// index into the pattern catalog
    pub program_index: u8,
    pub full_brightness: bool,
}

/// postcard writes `u8` raw and `bool` as a single 0/1 byte
pub const CONFIG_SIZE: usize = 3;

impl Config {
    /// Serialize config to binary data using postcard
    pub fn to_bytes<const B: usize>(&self) -> postcard::Result<heapless::Vec<u8, B>> {
        postcard::to_vec::<_, B>(self)
    }

    /// Deserialize config from binary data using postcard
    pub fn from_bytes(data: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(data)
    }

    /// Points `program_index` back at the first pattern if it is past the
    /// end of a catalog of `catalog_len` entries.
    pub fn clamp_program(&mut self, catalog_len: usize) {
        if self.program_index as usize >= catalog_len {
            warn!(
                "Stored program index {} out of range, using 0",
                self.program_index
            );
            self.program_index = 0;
        }
    }
}

pub trait ConfigStore {
    /// Reads the stored config. Missing or unreadable data yields
    /// `Config::default()`.
    fn load(&mut self) -> Config;

    fn store(&mut self, config: &Config) -> Result<()>;
}

/// Config record at a fixed byte offset of a storage device.
pub struct StorageConfigStore<S> {
    storage: S,
    offset: u32,
}

impl<S: Storage> StorageConfigStore<S> {
    pub fn new(storage: S, offset: u32) -> Self {
        Self { storage, offset }
    }

    pub fn into_inner(self) -> S {
        self.storage
    }
}

impl<S: Storage> ConfigStore for StorageConfigStore<S>
where
    S::Error: core::fmt::Debug,
{
    fn load(&mut self) -> Config {
        let mut raw = [0u8; CONFIG_SIZE];
        if let Err(err) = self.storage.read(self.offset, &mut raw) {
            warn!("Failed to read config at {:#x}: {:?}", self.offset, err);
            return Config::default();
        }
        match Config::from_bytes(&raw) {
            Ok(config) => config,
            Err(err) => {
                warn!("Stored config unreadable ({err:?}), starting from defaults");
                Config::default()
            }
        }
    }

    fn store(&mut self, config: &Config) -> Result<()> {
        let bytes = config
            .to_bytes::<CONFIG_SIZE>()
            .map_err(|err| error_with_location!("Failed to encode config: {:?}", err))?;
        self.storage
            .write(self.offset, &bytes)
            .map_err(|err| error_with_location!("Failed to write config: {:?}", err))
    }
}

/// The live config plus its store. Every setter writes through before it
/// returns; a failed write leaves the live config untouched.
pub struct PersistentConfig<C> {
    config: Config,
    store: C,
}

impl<C: ConfigStore> PersistentConfig<C> {
    /// Loads from `store` and clamps the program index into the catalog.
    pub fn load(mut store: C, catalog_len: usize) -> Self {
        let mut config = store.load();
        config.clamp_program(catalog_len);
        info!("Loaded config: {config:?}");
        Self { config, store }
    }

    pub fn get(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &C {
        &self.store
    }

    pub fn set_brightness(&mut self, brightness: u8) -> Result<()> {
        self.commit(Config {
            brightness,
            ..self.config
        })
    }

    pub fn set_program_index(&mut self, program_index: u8) -> Result<()> {
        self.commit(Config {
            program_index,
            ..self.config
        })
    }

    pub fn set_full_brightness(&mut self, full_brightness: bool) -> Result<()> {
        self.commit(Config {
            full_brightness,
            ..self.config
        })
    }

    /// The live config only changes once the store accepted the write.
    fn commit(&mut self, next: Config) -> Result<()> {
        self.store.store(&next)?;
        self.config = next;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use alloc::vec;
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::Cell;
    use embedded_storage::ReadStorage;

    /// Byte-addressable RAM standing in for EEPROM/flash.
    pub struct RamStorage {
        pub bytes: Vec<u8>,
        pub writes: usize,
    }

    impl RamStorage {
        pub fn erased(len: usize) -> Self {
            Self {
                bytes: vec![0xFF; len],
                writes: 0,
            }
        }
    }

    impl ReadStorage for RamStorage {
        type Error = ();

        fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), ()> {
            let start = offset as usize;
            let src = self.bytes.get(start..start + bytes.len()).ok_or(())?;
            bytes.copy_from_slice(src);
            Ok(())
        }

        fn capacity(&self) -> usize {
            self.bytes.len()
        }
    }

    impl Storage for RamStorage {
        fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), ()> {
            let start = offset as usize;
            let dst = self.bytes.get_mut(start..start + bytes.len()).ok_or(())?;
            dst.copy_from_slice(bytes);
            self.writes += 1;
            Ok(())
        }
    }

    /// In-memory store that keeps every write. Writes fail while
    /// `offline` is set.
    #[derive(Default)]
    pub struct MemoryStore {
        pub initial: Config,
        pub history: Vec<Config>,
        pub offline: Rc<Cell<bool>>,
    }

    impl MemoryStore {
        pub fn last(&self) -> Option<&Config> {
            self.history.last()
        }
    }

    impl ConfigStore for MemoryStore {
        fn load(&mut self) -> Config {
            self.initial
        }

        fn store(&mut self, config: &Config) -> Result<()> {
            if self.offline.get() {
                return Err(error_with_location!("Store offline"));
            }
            self.history.push(*config);
            Ok(())
        }
    }

    #[test]
    fn record_is_three_bytes_in_field_order() {
        let config = Config {
            brightness: 180,
            program_index: 5,
            full_brightness: true,
        };
        let bytes = config.to_bytes::<CONFIG_SIZE>().unwrap();
        assert_eq!(&bytes[..], &[180, 5, 1]);
        assert_eq!(Config::from_bytes(&bytes).unwrap(), config);
    }

    #[test]
    fn erased_storage_loads_defaults() {
        let mut store = StorageConfigStore::new(RamStorage::erased(16), 4);
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn store_then_load_at_offset() {
        let mut store = StorageConfigStore::new(RamStorage::erased(16), 4);
        let config = Config {
            brightness: 50,
            program_index: 2,
            full_brightness: false,
        };
        store.store(&config).unwrap();
        assert_eq!(store.load(), config);

        let ram = store.into_inner();
        assert_eq!(&ram.bytes[4..7], &[50, 2, 0]);
        assert!(ram.bytes[..4].iter().all(|b| *b == 0xFF));
    }

    #[test]
    fn write_past_end_is_an_error() {
        let mut store = StorageConfigStore::new(RamStorage::erased(4), 2);
        assert!(store.store(&Config::default()).is_err());
    }

    #[test]
    fn out_of_range_program_is_clamped_on_load() {
        let store = MemoryStore {
            initial: Config {
                brightness: 255,
                program_index: 200,
                full_brightness: true,
            },
            ..Default::default()
        };
        let persistent = PersistentConfig::load(store, 8);
        assert_eq!(persistent.get().program_index, 0);
        // brightness is not validated
        assert_eq!(persistent.get().brightness, 255);
        assert!(persistent.store().history.is_empty());
    }

    #[test]
    fn failed_write_keeps_live_config() {
        let store = MemoryStore::default();
        let offline = store.offline.clone();
        let mut persistent = PersistentConfig::load(store, 8);
        persistent.set_brightness(50).unwrap();

        offline.set(true);
        assert!(persistent.set_brightness(180).is_err());
        assert!(persistent.set_program_index(4).is_err());
        assert_eq!(persistent.get().brightness, 50);
        assert_eq!(persistent.get().program_index, 0);

        offline.set(false);
        persistent.set_brightness(180).unwrap();
        assert_eq!(persistent.get().brightness, 180);
        assert_eq!(persistent.store().history.len(), 2);
    }

    #[test]
    fn every_setter_persists() {
        let mut persistent = PersistentConfig::load(MemoryStore::default(), 8);
        persistent.set_brightness(80).unwrap();
        persistent.set_program_index(3).unwrap();
        persistent.set_full_brightness(true).unwrap();

        let history = &persistent.store().history;
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].brightness, 80);
        assert_eq!(history[1].program_index, 3);
        assert_eq!(
            persistent.store().last(),
            Some(&Config {
                brightness: 80,
                program_index: 3,
                full_brightness: true
            })
        );
    }
}
