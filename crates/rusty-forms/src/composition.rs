// File: src/composition.rs
// Purpose: Route each field to the domain object that owns it

use crate::model::ModelHandle;

/// Owner key used by forms backed by a single object
pub const DEFAULT_OWNER: &str = "model";

/// The domain objects behind one form, keyed by owner name
///
/// Never empty. The first owner is primary unless [`Composition::primary`]
/// picks another; the primary object is what `Form::model` returns.
#[derive(Debug, Clone)]
pub struct Composition {
    owners: Vec<(String, ModelHandle)>,
    primary: usize,
}

impl Composition {
    pub fn new(key: impl Into<String>, handle: ModelHandle) -> Self {
        Self {
            owners: vec![(key.into(), handle)],
            primary: 0,
        }
    }

    /// A form over one object, under [`DEFAULT_OWNER`]
    pub fn single(handle: ModelHandle) -> Self {
        Self::new(DEFAULT_OWNER, handle)
    }

    /// Adds or replaces an owner
    pub fn with(mut self, key: impl Into<String>, handle: ModelHandle) -> Self {
        let key = key.into();
        match self.owners.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = handle,
            None => self.owners.push((key, handle)),
        }
        self
    }

    /// Unknown keys leave the primary unchanged
    pub fn primary(mut self, key: &str) -> Self {
        if let Some(pos) = self.owners.iter().position(|(k, _)| k == key) {
            self.primary = pos;
        }
        self
    }

    pub fn owner(&self, key: &str) -> Option<&ModelHandle> {
        self.owners.iter().find(|(k, _)| k == key).map(|(_, h)| h)
    }

    pub fn primary_key(&self) -> &str {
        &self.owners[self.primary].0
    }

    pub fn primary_handle(&self) -> &ModelHandle {
        &self.owners[self.primary].1
    }

    /// Resolves a field's owner; fields without `on` belong to the primary
    pub fn resolve(&self, owner: Option<&str>) -> Option<&ModelHandle> {
        match owner {
            Some(key) => self.owner(key),
            None => Some(self.primary_handle()),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.owners.iter().map(|(k, _)| k.as_str())
    }

    /// Owners in save order: secondary owners first, primary last
    pub(crate) fn save_order(&self) -> impl Iterator<Item = (&str, &ModelHandle)> {
        let primary = self.primary;
        self.owners
            .iter()
            .enumerate()
            .filter(move |(i, _)| *i != primary)
            .chain(std::iter::once((primary, &self.owners[primary])))
            .map(|(_, (k, h))| (k.as_str(), h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Record;

    #[test]
    fn test_single_owner_is_primary() {
        let album = Record::new("album").into_handle();
        let composition = Composition::single(album.clone());

        assert_eq!(composition.primary_key(), DEFAULT_OWNER);
        assert!(composition.primary_handle().ptr_eq(&album));
        assert!(composition.resolve(None).unwrap().ptr_eq(&album));
    }

    #[test]
    fn test_routing_by_owner() {
        let album = Record::new("album").into_handle();
        let artist = Record::new("artist").into_handle();
        let composition = Composition::new("album", album.clone()).with("artist", artist.clone());

        assert!(composition.resolve(Some("artist")).unwrap().ptr_eq(&artist));
        assert!(composition.resolve(Some("label")).is_none());
        assert_eq!(composition.keys().collect::<Vec<_>>(), vec!["album", "artist"]);
    }

    #[test]
    fn test_primary_saves_last() {
        let album = Record::new("album").into_handle();
        let artist = Record::new("artist").into_handle();
        let label = Record::new("label").into_handle();
        let composition = Composition::new("album", album)
            .with("artist", artist)
            .with("label", label)
            .primary("artist");

        let order: Vec<&str> = composition.save_order().map(|(k, _)| k).collect();
        assert_eq!(order, vec!["album", "label", "artist"]);
        assert_eq!(composition.primary_key(), "artist");
    }
}
