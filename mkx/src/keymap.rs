use crate::MAX_LAYERS;
use crate::action::KeyAction;
use crate::error::ConfigError;
use crate::key::KeyRef;

/// Keymap represents the stack of layers.
///
/// Every layer is a flat list of actions indexed by logical index, and all layers have the same
/// length. Devices translate their local `(col, row)` into a logical index through their
/// [`Interface`](crate::interface::Interface).
pub struct KeyMap<'a> {
    layers: &'a mut [&'a mut [KeyAction]],
    keys_per_layer: u16,
}

impl<'a> KeyMap<'a> {
    /// Wrap the layers, checking that they form a rectangle
    pub fn new(layers: &'a mut [&'a mut [KeyAction]]) -> Result<Self, ConfigError> {
        if layers.len() > MAX_LAYERS {
            error!("Keymap has {} layers, at most {} are supported", layers.len(), MAX_LAYERS);
            return Err(ConfigError::TooManyLayers);
        }
        let expected = match layers.first() {
            Some(first) if !first.is_empty() => first.len(),
            _ => return Err(ConfigError::EmptyKeymap),
        };
        let keys_per_layer = u16::try_from(expected).map_err(|_| ConfigError::EmptyKeymap)?;

        for (i, layer) in layers.iter().enumerate() {
            if layer.len() != expected {
                error!(
                    "Keymap layer {} has {} keys, layer 0 has {}",
                    i,
                    layer.len(),
                    expected
                );
                return Err(ConfigError::NonRectangularLayer {
                    layer: i as u8,
                    expected: keys_per_layer,
                    found: layer.len().min(u16::MAX as usize) as u16,
                });
            }
        }

        Ok(Self { layers, keys_per_layer })
    }

    pub fn num_layers(&self) -> u8 {
        self.layers.len() as u8
    }

    pub fn keys_per_layer(&self) -> u16 {
        self.keys_per_layer
    }

    pub fn get(&self, key: KeyRef) -> Option<&KeyAction> {
        self.layers.get(key.layer as usize)?.get(key.index as usize)
    }

    pub fn get_mut(&mut self, key: KeyRef) -> Option<&mut KeyAction> {
        self.layers.get_mut(key.layer as usize)?.get_mut(key.index as usize)
    }

    /// Replace the action at a position, returns the previous one
    pub fn set(&mut self, key: KeyRef, action: KeyAction) -> Option<KeyAction> {
        self.get_mut(key).map(|slot| core::mem::replace(slot, action))
    }
}
