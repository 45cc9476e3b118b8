use crate::{
    AddressError, AddressResolver, AddressStore, ByteSink, ByteSource, ChecksumAlgorithm,
    CommandCode, DecoderConfig, FrameValidator, LocalAddress, PinMask, ScannerConfig, Switch,
    SyncScanner, ValidationError,
};

/// Struct for configuring a `Receiver`.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReceiverConfig {
    pub scanner: ScannerConfig,
    pub decoder: DecoderConfig,
    /// Checksum convention of the link. Default is [`ChecksumAlgorithm::Crc8Ibutton`].
    pub algorithm: ChecksumAlgorithm,
}

impl ReceiverConfig {
    pub const fn default() -> Self {
        Self {
            scanner: ScannerConfig::default(),
            decoder: DecoderConfig::default(),
            algorithm: ChecksumAlgorithm::Crc8Ibutton,
        }
    }

    pub const fn with_scanner(mut self, scanner: ScannerConfig) -> Self {
        self.scanner = scanner;
        self
    }

    pub const fn with_decoder(mut self, decoder: DecoderConfig) -> Self {
        self.decoder = decoder;
        self
    }

    pub const fn with_algorithm(mut self, algorithm: ChecksumAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }
}

/// A command addressed to this unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Actuation {
    pub pin_mask: PinMask,
    pub command: u8,
}

impl Actuation {
    /// Output state to drive the selected lines to, `None` for unknown command codes.
    pub fn switch(&self) -> Option<Switch> {
        CommandCode::try_from(self.command)
            .ok()
            .map(CommandCode::switch)
    }
}

/// Outcome of one received frame.
#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reception {
    /// Valid frame for this unit (or broadcast)
    Actuate(Actuation),
    /// Valid frame for another unit
    NotAddressed { address: u16 },
    /// Malformed or corrupted frame
    Rejected(ValidationError),
}

/// Reception counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReceiverStats {
    /// Valid frames addressed to this unit
    pub rx_good: u16,
    /// Frames rejected by the validator
    pub rx_bad: u16,
    /// Valid frames addressed to other units
    pub rx_ignored: u16,
}

/// Slave-side receive loop.
///
/// Pulls bytes from `source`, mirrors them to `echo` and turns every complete frame into
/// a [`Reception`]. The local address is read from the store once, on creation, and
/// again only through [`change_address`](Receiver::change_address).
#[derive(Debug)]
pub struct Receiver<Src, Echo, Store> {
    source: Src,
    echo: Echo,
    resolver: AddressResolver<Store>,
    scanner: SyncScanner,
    validator: FrameValidator,
    algorithm: ChecksumAlgorithm,
    local: LocalAddress,
    stats: ReceiverStats,
}

impl<Src, Echo, Store> Receiver<Src, Echo, Store>
where
    Src: ByteSource,
    Echo: ByteSink,
    Store: AddressStore,
{
    pub fn new(source: Src, echo: Echo, store: Store, config: ReceiverConfig) -> Self {
        let mut resolver = AddressResolver::new(store);
        let local = resolver.load_local_address();

        Self {
            source,
            echo,
            resolver,
            scanner: SyncScanner::new(config.scanner),
            validator: FrameValidator::new(config.decoder),
            algorithm: config.algorithm,
            local,
            stats: ReceiverStats::default(),
        }
    }

    pub fn local_address(&self) -> LocalAddress {
        self.local
    }

    pub fn stats(&self) -> ReceiverStats {
        self.stats
    }

    /// Reads until a frame is complete and reports what it asks of this unit.
    ///
    /// Returns `None` when the source runs out of bytes first.
    pub fn poll(&mut self, blocking: bool) -> Option<Reception> {
        let mut raw = *self
            .scanner
            .scan(&mut self.source, &mut self.echo, blocking)?;

        let frame = match self.validator.validate(&mut raw, self.algorithm) {
            Ok(frame) => frame,
            Err(err) => {
                self.stats.rx_bad = self.stats.rx_bad.wrapping_add(1);
                return Some(Reception::Rejected(err));
            }
        };

        if !self.local.matches(frame.address) {
            trace!("frame for {:#x} ignored", frame.address);
            self.stats.rx_ignored = self.stats.rx_ignored.wrapping_add(1);
            return Some(Reception::NotAddressed {
                address: frame.address,
            });
        }

        self.stats.rx_good = self.stats.rx_good.wrapping_add(1);
        Some(Reception::Actuate(Actuation {
            pin_mask: PinMask::from_bits(frame.pin_mask),
            command: frame.command,
        }))
    }

    /// Moves this unit to `address`.
    ///
    /// Reception stops and any partial frame is dropped. `confirm` is asked before the
    /// store is written; declining leaves the current address in place.
    pub fn change_address<F>(
        &mut self,
        address: u16,
        confirm: F,
    ) -> Result<LocalAddress, AddressError>
    where
        F: FnOnce(u16) -> bool,
    {
        self.scanner.reset();

        if !confirm(address) {
            debug!("address change to {:#x} cancelled", address);
            return Err(AddressError::Cancelled { address });
        }

        self.local = self.resolver.store_local_address(address)?;
        Ok(self.local)
    }

    /// Releases the byte channels and the store.
    pub fn release(self) -> (Src, Echo, Store) {
        (self.source, self.echo, self.resolver.into_store())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        AddressError, AddressResolver, BytesReader, ChecksumAlgorithm, ChecksumError,
        MemoryStore, NoEcho, Receiver, ReceiverConfig, Reception, ScannerConfig, Switch,
        ValidationError,
    };

    fn configured_store(address: u16) -> MemoryStore {
        let mut resolver = AddressResolver::new(MemoryStore::new());
        resolver.store_local_address(address).unwrap();
        resolver.into_store()
    }

    #[test]
    fn test_receiver_actuates_on_own_address() {
        let source = BytesReader::new(b"noisexx0123011:DE");
        let mut receiver = Receiver::new(
            source,
            NoEcho,
            configured_store(0x0123),
            ReceiverConfig::default(),
        );

        let reception = receiver.poll(true).expect("frame expected");
        let Reception::Actuate(actuation) = reception else {
            panic!("actuation expected");
        };

        assert_eq!(actuation.pin_mask.into_bits(), 0x01);
        assert!(actuation.pin_mask.line0());
        assert_eq!(actuation.command, 0x1);
        assert_eq!(actuation.switch(), Some(Switch::On));
        assert_eq!(receiver.stats().rx_good, 1);

        assert!(receiver.poll(true).is_none());
    }

    #[test]
    fn test_receiver_broadcast_and_foreign_frames() {
        let source = BytesReader::new(b"xxFFFF023xx0001011:8Axx0123011:AB");
        let mut receiver = Receiver::new(
            source,
            NoEcho,
            configured_store(0x0123),
            ReceiverConfig::default()
                .with_scanner(ScannerConfig::default().with_frame_len(7)),
        );

        // Broadcast
        assert!(matches!(
            receiver.poll(true),
            Some(Reception::Actuate(actuation)) if actuation.switch() == Some(Switch::Off)
        ));

        // The checksum digits past the seventh byte are skipped as noise
        assert_eq!(
            receiver.poll(true),
            Some(Reception::NotAddressed { address: 0x0001 })
        );
        assert!(matches!(receiver.poll(true), Some(Reception::Actuate(_))));

        let stats = receiver.stats();
        assert_eq!(stats.rx_good, 2);
        assert_eq!(stats.rx_ignored, 1);
        assert_eq!(stats.rx_bad, 0);
    }

    #[test]
    fn test_receiver_rejects_corrupted_frame() {
        let source = BytesReader::new(b"xx0123011:ABxx0123011:DE");
        let mut receiver = Receiver::new(
            source,
            NoEcho,
            configured_store(0x0123),
            ReceiverConfig::default(),
        );

        assert_eq!(
            receiver.poll(true),
            Some(Reception::Rejected(ValidationError::Checksum {
                source: ChecksumError::Mismatch {
                    expected: 0xAB,
                    actual: 0xDE
                }
            }))
        );
        assert!(matches!(receiver.poll(true), Some(Reception::Actuate(_))));
        assert_eq!(receiver.stats().rx_bad, 1);
        assert_eq!(receiver.stats().rx_good, 1);
    }

    #[test]
    fn test_unconfigured_receiver_ignores_everything() {
        let source = BytesReader::new(b"xx0123011:DE\nxxFFFF020\n");
        let mut receiver = Receiver::new(
            source,
            NoEcho,
            MemoryStore::new(),
            ReceiverConfig::default()
                .with_scanner(ScannerConfig::default().with_terminator(Some(b'\n'))),
        );

        assert!(!receiver.local_address().is_configured());
        assert_eq!(
            receiver.poll(true),
            Some(Reception::NotAddressed { address: 0x0123 })
        );
        // Not even broadcasts
        assert_eq!(
            receiver.poll(true),
            Some(Reception::NotAddressed { address: 0xFFFF })
        );
        assert!(receiver.poll(true).is_none());
        assert_eq!(receiver.stats().rx_ignored, 2);
    }

    #[test]
    fn test_receiver_bitwise_link() {
        let source = BytesReader::new(b"xx12340F1:44");
        let mut receiver = Receiver::new(
            source,
            NoEcho,
            configured_store(0x1234),
            ReceiverConfig::default().with_algorithm(ChecksumAlgorithm::BitwiseCrc16),
        );

        let Some(Reception::Actuate(actuation)) = receiver.poll(true) else {
            panic!("actuation expected");
        };
        assert_eq!(actuation.pin_mask.lines(), [true, true, true, true]);
    }

    #[test]
    fn test_change_address() {
        let source = BytesReader::new(b"xx0456011:");
        let mut receiver = Receiver::new(
            source,
            NoEcho,
            configured_store(0x0123),
            ReceiverConfig::default(),
        );

        // Partial frame in flight
        assert!(receiver.poll(true).is_none());

        assert_eq!(
            receiver.change_address(0x0456, |_| false),
            Err(AddressError::Cancelled { address: 0x0456 })
        );
        assert_eq!(receiver.local_address(), 0x0123);

        assert_eq!(
            receiver.change_address(0xFFFF, |_| true),
            Err(AddressError::Reserved { address: 0xFFFF })
        );
        assert_eq!(receiver.local_address(), 0x0123);

        let local = receiver.change_address(0x0456, |address| address == 0x0456);
        assert_eq!(local.map(|local| local.get()), Ok(0x0456));

        let (_, _, store) = receiver.release();
        let mut resolver = AddressResolver::new(store);
        assert_eq!(resolver.load_local_address(), 0x0456);
    }
}
