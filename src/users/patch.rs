use serde::{Deserialize, Deserializer};

/// A field of a partial update: either left alone or explicitly set.
///
/// Use with `#[serde(default)]` so a missing key becomes `Unset`. A present
/// key is decoded as `T`, so `null` is only accepted when `T` is itself an
/// `Option`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    Unset,
    Set(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Unset
    }
}

impl<T> Patch<T> {
    pub fn as_set(&self) -> Option<&T> {
        match self {
            Patch::Set(value) => Some(value),
            Patch::Unset => None,
        }
    }

    /// The new value if set, otherwise a copy of `current`.
    pub fn resolve(&self, current: &T) -> T
    where
        T: Clone,
    {
        self.as_set().unwrap_or(current).clone()
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Patch::Set)
    }
}
