use embassy_time::{Instant, Ticker};
use heapless::Vec;

use crate::MAX_DEVICES;
use crate::bus::MessageBus;
use crate::config::CentralConfig;
use crate::error::{ConfigError, MkxError};
use crate::hid::HidSink;
use crate::interface::Interface;
use crate::keymap::KeyMap;
use crate::resolver::KeyResolver;
use crate::split::codec::FrameDecoder;
use crate::split::driver::SplitTransport;
use crate::split::message::{DeviceId, Message, MessageBatch, MessageKind};

/// Size of one read from a transport
const RECEIVE_CHUNK_SIZE: usize = 64;
/// Reads from one transport within a frame, a link flooding the central can't stall the frame
const MAX_READS_PER_FRAME: usize = 16;

/// A registered device and the decoder of its byte stream
struct Link {
    interface: Interface,
    decoder: FrameDecoder,
}

/// The central: collects messages from all devices and resolves them once per frame.
///
/// Device links are numbered in registration order, and the transports passed to [`Central::poll`]
/// must be in the same order.
pub struct Central<'k> {
    links: Vec<Link, MAX_DEVICES>,
    bus: MessageBus,
    resolver: KeyResolver<'k>,
    batch: MessageBatch,
    config: CentralConfig,
}

impl<'k> Central<'k> {
    pub fn new(keymap: KeyMap<'k>, default_layer: u8, config: CentralConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            links: Vec::new(),
            bus: MessageBus::new(config.bus),
            resolver: KeyResolver::new(keymap, default_layer)?,
            batch: MessageBatch::new(),
            config,
        })
    }

    /// Register a device, returning its link number
    pub fn add_interface(&mut self, interface: Interface) -> Result<usize, ConfigError> {
        if self.interface(interface.device_id()).is_some() {
            error!("Device {} is registered twice", interface.device_id().as_str());
            return Err(ConfigError::DuplicateDevice);
        }
        interface.validate(self.resolver.keymap().keys_per_layer())?;

        info!("Registered device {}", interface.device_id().as_str());
        self.links
            .push(Link {
                interface,
                decoder: FrameDecoder::new(),
            })
            .map_err(|_| ConfigError::DeviceTableFull)?;
        Ok(self.links.len() - 1)
    }

    pub fn interface(&self, device_id: &DeviceId) -> Option<&Interface> {
        self.links
            .iter()
            .map(|link| &link.interface)
            .find(|interface| interface.device_id() == device_id)
    }

    pub fn resolver(&self) -> &KeyResolver<'k> {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut KeyResolver<'k> {
        &mut self.resolver
    }

    pub fn config(&self) -> &CentralConfig {
        &self.config
    }

    /// Feed bytes received on a link.
    ///
    /// Decoding stops when the frame's batch is full, the remaining frames are kept by the link
    /// and decoded in the next frames. Returns the number of bytes taken, bytes which didn't fit
    /// the link's buffer must be offered again.
    pub fn receive(&mut self, link: usize, bytes: &[u8]) -> usize {
        let Some(Link { decoder, .. }) = self.links.get_mut(link) else {
            warn!("Bytes received on unknown link {}", link);
            return bytes.len();
        };
        let batch = &mut self.batch;
        let room = batch.capacity() - batch.len();
        decoder.feed(bytes, room, |message| push_message(batch, message))
    }

    /// Queue a message for the next frame, e.g. from the central's own matrix.
    ///
    /// Gives the message back when the batch is full.
    pub fn push_message(&mut self, message: Message) -> Result<(), Message> {
        self.batch.push(message)
    }

    /// Drop a device's clock and debounce state, and any bytes buffered from it
    pub fn forget(&mut self, device_id: &DeviceId) {
        self.bus.forget(device_id);
        if let Some(link) = self.links.iter_mut().find(|link| link.interface.device_id() == device_id) {
            link.decoder.clear();
        }
    }

    /// Run one frame on the queued messages: align clocks, debounce, resolve keys, then advance
    /// timers to `now`.
    pub fn tick<H: HidSink>(&mut self, now: u32, hid: &mut H) -> Result<(), MkxError> {
        // Frames left buffered by a full batch
        for link in self.links.iter_mut() {
            let batch = &mut self.batch;
            let room = batch.capacity() - batch.len();
            if room == 0 {
                break;
            }
            link.decoder.drain(room, |message| push_message(batch, message));
        }

        let links = &self.links;
        self.batch.retain(|message| {
            let known = links
                .iter()
                .any(|link| link.interface.device_id() == &message.device_id);
            if !known {
                warn!("Dropping message from unknown device {}", message.device_id.as_str());
            }
            known
        });

        if let Err(e) = self.bus.process(&mut self.batch, now) {
            self.batch.clear();
            return Err(e.into());
        }

        for message in self.batch.iter() {
            let MessageKind::Key(event) = message.kind else {
                continue;
            };
            let Some(link) = self
                .links
                .iter()
                .find(|link| link.interface.device_id() == &message.device_id)
            else {
                continue;
            };
            match link.interface.logical_index(event.col, event.row) {
                Some(index) => {
                    self.resolver
                        .process(&message.device_id, index, event.pressed, message.timestamp, hid)
                }
                None => warn!(
                    "No mapping for ({}, {}) on {}",
                    event.col,
                    event.row,
                    message.device_id.as_str()
                ),
            }
        }
        self.batch.clear();

        self.resolver.update_timers(now, hid);
        Ok(())
    }

    /// Drain every transport without blocking, then run a frame
    pub fn poll<T: SplitTransport, H: HidSink>(
        &mut self,
        now: u32,
        transports: &mut [T],
        hid: &mut H,
    ) -> Result<(), MkxError> {
        let mut buf = [0u8; RECEIVE_CHUNK_SIZE];
        for (link, transport) in transports.iter_mut().enumerate() {
            for _ in 0..MAX_READS_PER_FRAME {
                // Bytes the link can't buffer are left in the transport
                let free = match self.links.get(link) {
                    Some(l) => l.decoder.free().min(RECEIVE_CHUNK_SIZE),
                    None => RECEIVE_CHUNK_SIZE,
                };
                if free == 0 {
                    break;
                }
                match transport.try_receive(&mut buf[..free]) {
                    Ok(0) => break,
                    Ok(n) => {
                        self.receive(link, &buf[..n]);
                    }
                    Err(e) => {
                        debug!("Link {} receive error: {:?}", link, e);
                        break;
                    }
                }
            }
        }
        self.tick(now, hid)
    }

    /// Poll every `frame_interval`, forever. Returns only on a fatal error.
    pub async fn run<T: SplitTransport, H: HidSink>(&mut self, transports: &mut [T], hid: &mut H) -> MkxError {
        info!("Central running with {} devices", self.links.len());
        let mut ticker = Ticker::every(self.config.frame_interval);
        loop {
            let now = Instant::now().as_millis() as u32;
            match self.poll(now, transports, hid) {
                Err(e) if e.is_fatal() => {
                    error!("Central stopped: {:?}", e);
                    return e;
                }
                Err(e) => warn!("Frame error: {:?}", e),
                Ok(()) => (),
            }
            ticker.next().await;
        }
    }
}

fn push_message(batch: &mut MessageBatch, message: Message) {
    // Decoding is bounded by the batch's free room
    if let Err(message) = batch.push(message) {
        error!("Message batch full, dropping message from {}", message.device_id.as_str());
    }
}
