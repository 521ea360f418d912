use serde::Deserialize;
use serde::Serialize;
use std::fmt::Display;
use std::hash::Hash;
use std::hash::Hasher;
use uuid::Uuid;

/// A person record as it travels between the cache and the durable store.
///
/// The identity is generated once by [`Person::new`] and never changes. Two values are considered the same staging
/// member when their identities match, regardless of the attributes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Person {
    id:   Uuid,
    name: String,
    age:  i32,
}

impl Person {
    /// Create a person with a freshly generated identity.
    pub fn new<S: Into<String>>(name: S, age: i32) -> Self {
        Self::from_parts(Uuid::new_v4(), name, age)
    }

    /// Reassemble a person previously created elsewhere, i.e. loaded from a backend.
    pub fn from_parts<S: Into<String>>(id: Uuid, name: S, age: i32) -> Self {
        Self {
            id,
            name: name.into(),
            age,
        }
    }

    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn age(&self) -> i32 {
        self.age
    }

    /// Key of the cache value entry for this person.
    #[inline]
    pub fn cache_key(&self) -> String {
        cache_key_of(&self.id)
    }

    /// Whether every attribute, not only the identity, matches.
    pub fn same_content(&self, other: &Person) -> bool {
        self.id == other.id && self.name == other.name && self.age == other.age
    }
}

/// The cache value key is the hyphenated string form of the identity.
#[inline]
pub fn cache_key_of(id: &Uuid) -> String {
    id.to_string()
}

impl PartialEq for Person {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Person {}

impl Hash for Person {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Display for Person {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Person(id={}, name={}, age={})", self.id, self.name, self.age)
    }
}
