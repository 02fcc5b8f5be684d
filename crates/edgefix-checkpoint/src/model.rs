//! In-memory checkpoint model: an ordered mapping from names to tensor or
//! opaque values.

use crate::error::Result;
use candle_core::{Device, Tensor};

/// One checkpoint entry value.
#[derive(Debug, Clone)]
pub enum Value {
    /// A tensor with shape, dtype and a resident device.
    Tensor(Tensor),
    /// Anything that is not a tensor (an epoch counter, a metadata string).
    /// Treated as opaque and passed through normalization unchanged.
    Opaque(String),
}

impl Value {
    pub fn is_tensor(&self) -> bool {
        matches!(self, Value::Tensor(_))
    }

    pub fn as_tensor(&self) -> Option<&Tensor> {
        match self {
            Value::Tensor(t) => Some(t),
            Value::Opaque(_) => None,
        }
    }

    pub fn as_opaque(&self) -> Option<&str> {
        match self {
            Value::Tensor(_) => None,
            Value::Opaque(s) => Some(s),
        }
    }
}

/// An ordered name → value mapping.
///
/// Order is the serialization order of the source artifact and is preserved
/// by [`Checkpoint::to_host`].
#[derive(Debug, Clone, Default)]
pub struct Checkpoint {
    entries: Vec<(String, Value)>,
}

impl Checkpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<(String, Value)>) -> Self {
        Self { entries }
    }

    pub fn push_tensor(&mut self, name: impl Into<String>, tensor: Tensor) {
        self.entries.push((name.into(), Value::Tensor(tensor)));
    }

    pub fn push_opaque(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), Value::Opaque(value.into())));
    }

    pub fn entries(&self) -> &[(String, Value)] {
        &self.entries
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn tensor_count(&self) -> usize {
        self.entries.iter().filter(|(_, v)| v.is_tensor()).count()
    }

    pub fn opaque_count(&self) -> usize {
        self.len() - self.tensor_count()
    }

    /// Produce an equivalent checkpoint with every tensor resident in host
    /// memory.
    ///
    /// Tensors already on the host are deep-copied as well, so no output
    /// tensor shares storage with its source — mutating one side can never
    /// leak across. Opaque values are carried over as-is.
    pub fn to_host(&self) -> Result<Checkpoint> {
        let mut entries = Vec::with_capacity(self.entries.len());
        for (name, value) in &self.entries {
            let value = match value {
                Value::Tensor(t) => {
                    let host = match t.device() {
                        Device::Cpu => t.copy()?,
                        _ => t.to_device(&Device::Cpu)?,
                    };
                    Value::Tensor(host)
                }
                Value::Opaque(s) => Value::Opaque(s.clone()),
            };
            entries.push((name.clone(), value));
        }
        Ok(Checkpoint { entries })
    }
}
