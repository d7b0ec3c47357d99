use heapless::Vec;

use crate::MAX_LAYERS;
use crate::error::ConfigError;

/// Ordered stack of active layers, bottom to top.
///
/// The default layer is always in the stack and the stack is never empty. The top element is the
/// layer used for new key lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerStack {
    default_layer: u8,
    active: Vec<u8, MAX_LAYERS>,
    num_layers: u8,
}

impl LayerStack {
    pub fn new(default_layer: u8, num_layers: u8) -> Result<Self, ConfigError> {
        if num_layers as usize > MAX_LAYERS {
            return Err(ConfigError::TooManyLayers);
        }
        if default_layer >= num_layers {
            error!("Default layer {} out of {} layers", default_layer, num_layers);
            return Err(ConfigError::InvalidDefaultLayer);
        }
        let mut active = Vec::new();
        active.push(default_layer).map_err(|_| ConfigError::TooManyLayers)?;
        Ok(Self {
            default_layer,
            active,
            num_layers,
        })
    }

    pub fn default_layer(&self) -> u8 {
        self.default_layer
    }

    /// Active layers, bottom to top
    pub fn active(&self) -> &[u8] {
        &self.active
    }

    pub fn is_active(&self, layer: u8) -> bool {
        self.active.contains(&layer)
    }

    /// Layer used for key lookups
    pub fn top(&self) -> u8 {
        self.active.last().copied().unwrap_or(self.default_layer)
    }

    /// Push `layer` if it isn't active. An active layer is moved to the top if `prioritize` is set.
    pub fn activate(&mut self, layer: u8, prioritize: bool) {
        if !self.check(layer) {
            return;
        }
        match self.position(layer) {
            Some(pos) if prioritize => {
                self.active.remove(pos);
                self.push(layer);
            }
            Some(_) => (),
            None => self.push(layer),
        }
        debug!("Activated layer {}, top is now {}", layer, self.top());
    }

    /// Remove `layer` from the stack, the default layer is never removed
    pub fn deactivate(&mut self, layer: u8) {
        if layer == self.default_layer {
            return;
        }
        if let Some(pos) = self.position(layer) {
            self.active.remove(pos);
            debug!("Deactivated layer {}, top is now {}", layer, self.top());
        }
    }

    pub fn toggle(&mut self, layer: u8, prioritize: bool) {
        if self.is_active(layer) {
            self.deactivate(layer);
        } else {
            self.activate(layer, prioritize);
        }
    }

    /// Make `layer` the only layer above the default layer
    pub fn set_active(&mut self, layer: u8) {
        if !self.check(layer) {
            return;
        }
        self.active.clear();
        if layer != self.default_layer {
            self.push(self.default_layer);
        }
        self.push(layer);
        debug!("Active layer set to {}", layer);
    }

    /// Change the default layer. A new default layer enters the stack at the bottom.
    pub fn set_default(&mut self, layer: u8) {
        if !self.check(layer) {
            return;
        }
        self.default_layer = layer;
        if !self.is_active(layer) && self.active.insert(0, layer).is_err() {
            warn!("Layer stack full, can't add default layer {}", layer);
        }
        debug!("Default layer set to {}", layer);
    }

    /// Replace the top layer with `layer`. When only the default layer is on top, `layer` is
    /// activated instead.
    pub fn replace_top(&mut self, layer: u8) {
        if !self.check(layer) || self.top() == layer {
            return;
        }
        if let Some(pos) = self.position(layer) {
            self.active.remove(pos);
        }
        if self.top() == self.default_layer {
            self.push(layer);
        } else if let Some(top) = self.active.last_mut() {
            *top = layer;
        }
        debug!("Replaced top layer with {}", layer);
    }

    fn position(&self, layer: u8) -> Option<usize> {
        self.active.iter().position(|l| *l == layer)
    }

    fn push(&mut self, layer: u8) {
        if self.active.push(layer).is_err() {
            warn!("Layer stack full, can't activate layer {}", layer);
        }
    }

    fn check(&self, layer: u8) -> bool {
        if layer >= self.num_layers {
            warn!(
                "Not a valid layer {}, keyboard supports only {} layers",
                layer, self.num_layers
            );
            return false;
        }
        true
    }
}
