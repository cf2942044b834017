//! Kind identities and the keeper that owns the capability hierarchy.
//!
//! A [`Kind`] names a concrete or abstract implementation. Kinds are only
//! meaningful once kept by a [`KindKeeper`], which records the family a kind
//! belongs to, its parent in the hierarchy, and for concrete kinds the factory
//! used to construct fresh instances. The keeper stands in for runtime type
//! introspection: assignability and construction are table lookups.

use std::any::Any;
use std::sync::Arc;

// used for printing kinds and families
use std::fmt;

// other keepers use HashMap with a fast hasher
use core::hash::BuildHasherDefault;
use seahash::SeaHasher;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Result, StagehandError};

pub type KindHasher = BuildHasherDefault<SeaHasher>;

lazy_static! {
    static ref KIND_NAME: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_.:#<>-]*$").unwrap();
}

// ------------- Kind -------------
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Kind(Arc<str>);

impl Kind {
    pub fn new(name: &str) -> Result<Self> {
        if !KIND_NAME.is_match(name) {
            return Err(StagehandError::Registry(format!(
                "'{name}' is not a valid kind name"
            )));
        }
        Ok(Self(Arc::from(name)))
    }
    pub fn name(&self) -> &str {
        &self.0
    }
}
impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}
impl Serialize for Kind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

// ------------- Family -------------
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Behavior,
    Model,
}

impl Family {
    pub const ALL: [Family; 2] = [Family::Behavior, Family::Model];

    /// The abstract kind every kind of this family descends from.
    pub fn root(&self) -> Kind {
        // root names are known to be valid
        Kind(Arc::from(self.root_name()))
    }
    fn root_name(&self) -> &'static str {
        match self {
            Self::Behavior => "Behavior",
            Self::Model => "Model",
        }
    }
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Behavior => "behavior",
            Self::Model => "model",
        }
    }
}
impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ------------- Instance -------------
/// A live host object together with the kind it was constructed as.
pub struct Instance {
    kind: Kind,
    state: Box<dyn Any + Send>,
}

impl Instance {
    pub fn new<T: Any + Send>(kind: Kind, state: T) -> Self {
        Self {
            kind,
            state: Box::new(state),
        }
    }
    pub fn kind(&self) -> &Kind {
        &self.kind
    }
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.state.downcast_ref::<T>()
    }
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.state.downcast_mut::<T>()
    }
}
impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Instance").field("kind", &self.kind).finish_non_exhaustive()
    }
}

pub type Factory = Arc<dyn Fn() -> std::result::Result<Box<dyn Any + Send>, String> + Send + Sync>;
pub type Teardown = Arc<dyn Fn(&mut Instance) + Send + Sync>;

// ------------- KindEntry -------------
pub struct KindEntry {
    kind: Kind,
    family: Family,
    parent: Option<Kind>,
    factory: Option<Factory>,
    teardown: Option<Teardown>,
}

impl KindEntry {
    pub fn kind(&self) -> &Kind {
        &self.kind
    }
    pub fn family(&self) -> Family {
        self.family
    }
    pub fn parent(&self) -> Option<&Kind> {
        self.parent.as_ref()
    }
    pub fn is_concrete(&self) -> bool {
        self.factory.is_some()
    }
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
impl fmt::Debug for KindEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("KindEntry")
            .field("kind", &self.kind)
            .field("family", &self.family)
            .field("parent", &self.parent)
            .field("concrete", &self.is_concrete())
            .field("teardown", &self.teardown.is_some())
            .finish()
    }
}

// ------------- KindKeeper -------------
/// Owns every kind known to a host and the hierarchy between them.
///
/// The two family roots are kept on creation. Every other kind is kept with
/// an already kept parent, so a kind's family is inherited down a single
/// chain and the hierarchy can never contain a cycle.
#[derive(Debug)]
pub struct KindKeeper {
    kept: HashMap<Kind, KindEntry, KindHasher>,
}

impl KindKeeper {
    pub fn new() -> Self {
        let mut kept = HashMap::default();
        for family in Family::ALL {
            let root = family.root();
            kept.insert(
                root.clone(),
                KindEntry {
                    kind: root,
                    family,
                    parent: None,
                    factory: None,
                    teardown: None,
                },
            );
        }
        Self { kept }
    }

    fn keep(&mut self, name: &str, parent: &Kind, factory: Option<Factory>) -> Result<Kind> {
        let kind = Kind::new(name)?;
        let family = match self.kept.get(parent) {
            Some(entry) => entry.family,
            None => {
                return Err(StagehandError::Registry(format!(
                    "parent {parent} of {kind} has not been kept"
                )));
            }
        };
        match self.kept.entry(kind.clone()) {
            Entry::Occupied(_) => Err(StagehandError::Registry(format!(
                "{kind} has already been kept"
            ))),
            Entry::Vacant(e) => {
                e.insert(KindEntry {
                    kind: kind.clone(),
                    family,
                    parent: Some(parent.clone()),
                    factory,
                    teardown: None,
                });
                Ok(kind)
            }
        }
    }

    /// Keeps a kind that can be targeted but never installed.
    pub fn keep_abstract(&mut self, name: &str, parent: &Kind) -> Result<Kind> {
        self.keep(name, parent, None)
    }

    /// Keeps an installable kind built by a fallible factory.
    pub fn keep_concrete<T, F>(&mut self, name: &str, parent: &Kind, factory: F) -> Result<Kind>
    where
        T: Any + Send,
        F: Fn() -> std::result::Result<T, String> + Send + Sync + 'static,
    {
        let factory: Factory =
            Arc::new(move || factory().map(|state| Box::new(state) as Box<dyn Any + Send>));
        self.keep(name, parent, Some(factory))
    }

    /// Keeps an installable kind constructed through `T::default()`.
    pub fn keep_default<T>(&mut self, name: &str, parent: &Kind) -> Result<Kind>
    where
        T: Any + Send + Default,
    {
        self.keep_concrete(name, parent, || Ok(T::default()))
    }

    /// Attaches a hook run on instances of `kind` (and its descendants
    /// without a hook of their own) when they are removed from a collection.
    pub fn with_teardown<F>(&mut self, kind: &Kind, teardown: F) -> Result<()>
    where
        F: Fn(&mut Instance) + Send + Sync + 'static,
    {
        match self.kept.get_mut(kind) {
            Some(entry) => {
                entry.teardown = Some(Arc::new(teardown));
                Ok(())
            }
            None => Err(StagehandError::Registry(format!(
                "{kind} has not been kept"
            ))),
        }
    }

    pub fn entry(&self, kind: &Kind) -> Option<&KindEntry> {
        self.kept.get(kind)
    }
    pub fn get(&self, name: &str) -> Option<Kind> {
        let kind = Kind::new(name).ok()?;
        self.kept.get(&kind).map(|entry| entry.kind.clone())
    }
    pub fn contains(&self, kind: &Kind) -> bool {
        self.kept.contains_key(kind)
    }
    pub fn family(&self, kind: &Kind) -> Option<Family> {
        self.kept.get(kind).map(|entry| entry.family)
    }
    pub fn is_root(&self, kind: &Kind) -> bool {
        self.kept.get(kind).is_some_and(KindEntry::is_root)
    }

    /// The kind itself followed by each of its ancestors up to the family root.
    /// Yields only `kind` when it has not been kept.
    pub fn ancestors<'k>(&'k self, kind: &'k Kind) -> impl Iterator<Item = &'k Kind> + 'k {
        let mut next = Some(kind);
        std::iter::from_fn(move || {
            let current = next?;
            next = self.kept.get(current).and_then(|entry| entry.parent.as_ref());
            Some(current)
        })
    }

    /// True when `candidate` is `base` or descends from `base`.
    pub fn is_assignable_from(&self, candidate: &Kind, base: &Kind) -> bool {
        self.ancestors(candidate).any(|kind| kind == base)
    }

    /// Builds a fresh instance of a concrete kind.
    pub fn construct(&self, kind: &Kind) -> Result<Instance> {
        let entry = self.kept.get(kind).ok_or_else(|| StagehandError::Construction {
            kind: kind.clone(),
            message: "kind has not been kept".into(),
        })?;
        let factory = entry.factory.as_ref().ok_or_else(|| StagehandError::Construction {
            kind: kind.clone(),
            message: "kind is abstract".into(),
        })?;
        let state = factory().map_err(|message| StagehandError::Construction {
            kind: kind.clone(),
            message,
        })?;
        Ok(Instance {
            kind: kind.clone(),
            state,
        })
    }

    /// The nearest teardown hook found walking up from `kind`.
    pub fn teardown_for(&self, kind: &Kind) -> Option<Teardown> {
        self.ancestors(kind)
            .filter_map(|k| self.kept.get(k))
            .find_map(|entry| entry.teardown.clone())
    }

    pub fn len(&self) -> usize {
        self.kept.len()
    }
    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }
}

impl Default for KindKeeper {
    fn default() -> Self {
        Self::new()
    }
}
