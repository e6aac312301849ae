//! Class hierarchy, as needed to answer type compatibility questions
//!
//! Type compatibility between object types cannot be decided without knowing the superclasses
//! and interfaces of the classes involved. The [`ClassHierarchy`] trait is the only thing the
//! compatibility checks in [`assignable`] need, so callers that already have some classpath
//! model can plug it in directly. [`ClassGraph`] is a simple in-memory implementation.

use super::{BinaryName, Error, Name};
use std::collections::{HashMap, HashSet};
use std::fmt;

pub mod assignable;
mod java_classes;

pub use assignable::*;

/// Source of superclass and interface information
///
/// Only `lookup_class` is required, the rest have default implementations walking the hierarchy
/// through `lookup_class`. Failed lookups are propagated as `Error::MissingClass`.
pub trait ClassHierarchy {
    /// Find a class or interface by name
    fn lookup_class(&self, name: &BinaryName) -> Result<&ClassData, Error>;

    /// Superclasses of a class, closest first (so `java/lang/Object` is last)
    ///
    /// Interfaces have `java/lang/Object` as their only superclass.
    fn superclasses(&self, name: &BinaryName) -> Result<Vec<BinaryName>, Error> {
        let mut superclasses = vec![];
        let mut seen: HashSet<BinaryName> = HashSet::new();
        seen.insert(name.clone());

        let mut next = self.lookup_class(name)?.superclass.clone();
        while let Some(superclass) = next {
            if !seen.insert(superclass.clone()) {
                break;
            }
            next = self.lookup_class(&superclass)?.superclass.clone();
            superclasses.push(superclass);
        }
        Ok(superclasses)
    }

    /// Does the class (or interface) implement (or extend) the interface?
    ///
    /// This searches through superclasses and superinterfaces.
    fn implementation_of(&self, class: &BinaryName, interface: &BinaryName) -> Result<bool, Error> {
        let mut to_visit: Vec<BinaryName> = vec![class.clone()];
        let mut dont_revisit: HashSet<BinaryName> = HashSet::new();
        dont_revisit.insert(class.clone());

        while let Some(name) = to_visit.pop() {
            if &name == interface {
                return Ok(true);
            }

            let class_data = self.lookup_class(&name)?;
            let supertypes = class_data.superclass.iter().chain(class_data.interfaces.iter());
            for supertype in supertypes {
                if dont_revisit.insert(supertype.clone()) {
                    to_visit.push(supertype.clone());
                }
            }
        }

        Ok(false)
    }

    /// Is the first class the same as or a subclass of the second?
    fn is_subclass_of(&self, class: &BinaryName, superclass: &BinaryName) -> Result<bool, Error> {
        if class == superclass {
            return Ok(true);
        }
        Ok(self.superclasses(class)?.contains(superclass))
    }
}

/// Immediate supertypes of a class or interface
#[derive(Clone, PartialEq, Eq)]
pub struct ClassData {
    /// Name of the class
    pub name: BinaryName,

    /// Superclass is only ever missing for `java/lang/Object` itself
    pub superclass: Option<BinaryName>,

    /// Interfaces implemented (or super-interfaces)
    pub interfaces: Vec<BinaryName>,

    /// Is this an interface?
    pub is_interface: bool,
}

impl ClassData {
    pub fn new(name: BinaryName, superclass: BinaryName, is_interface: bool) -> ClassData {
        ClassData {
            name,
            superclass: Some(superclass),
            interfaces: vec![],
            is_interface,
        }
    }

    /// Add implemented interfaces (or super-interfaces, for an interface)
    pub fn with_interfaces(mut self, interfaces: impl IntoIterator<Item = BinaryName>) -> ClassData {
        self.interfaces.extend(interfaces);
        self
    }
}

impl fmt::Debug for ClassData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name.as_str())
    }
}

/// In-memory class hierarchy
///
/// Classes can be added in any order, but every supertype needs to be present by the time the
/// hierarchy is queried.
#[derive(Default)]
pub struct ClassGraph {
    classes: HashMap<BinaryName, ClassData>,
}

impl ClassGraph {
    /// New empty graph
    pub fn new() -> ClassGraph {
        ClassGraph::default()
    }

    /// Add (or replace) a class in the graph
    pub fn add_class(&mut self, data: ClassData) {
        log::trace!("Adding class {:?} to the class graph", data);
        self.classes.insert(data.name.clone(), data);
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Add `java/lang/Object` and a handful of other standard library types
    pub fn insert_java_library_types(&mut self) {
        for class in java_classes::java_library_types() {
            self.add_class(class);
        }
    }
}

impl ClassHierarchy for ClassGraph {
    fn lookup_class(&self, name: &BinaryName) -> Result<&ClassData, Error> {
        self.classes
            .get(name)
            .ok_or_else(|| Error::MissingClass(name.clone()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn name(name: &str) -> BinaryName {
        BinaryName::from_string(String::from(name)).unwrap()
    }

    #[test]
    fn superclass_chains() {
        let mut graph = ClassGraph::new();
        graph.insert_java_library_types();

        assert_eq!(
            graph.superclasses(&BinaryName::RUNTIMEEXCEPTION).unwrap(),
            vec![
                BinaryName::EXCEPTION,
                BinaryName::THROWABLE,
                BinaryName::OBJECT
            ]
        );
        assert!(graph.superclasses(&BinaryName::OBJECT).unwrap().is_empty());
        assert_eq!(
            graph.superclasses(&BinaryName::CHARSEQUENCE).unwrap(),
            vec![BinaryName::OBJECT]
        );
    }

    #[test]
    fn interfaces() {
        let mut graph = ClassGraph::new();
        graph.insert_java_library_types();

        assert!(graph
            .implementation_of(&BinaryName::STRING, &BinaryName::CHARSEQUENCE)
            .unwrap());
        assert!(graph
            .implementation_of(&BinaryName::INTEGER, &BinaryName::SERIALIZABLE)
            .unwrap());
        assert!(!graph
            .implementation_of(&BinaryName::OBJECT, &BinaryName::SERIALIZABLE)
            .unwrap());
        assert!(graph
            .is_subclass_of(&BinaryName::INTEGER, &BinaryName::NUMBER)
            .unwrap());
        assert!(!graph
            .is_subclass_of(&BinaryName::NUMBER, &BinaryName::INTEGER)
            .unwrap());
    }

    #[test]
    fn missing_classes() {
        let mut graph = ClassGraph::new();
        graph.insert_java_library_types();
        graph.add_class(ClassData::new(name("me/Orphan"), name("me/Missing"), false));

        assert!(matches!(
            graph.superclasses(&name("me/Orphan")),
            Err(Error::MissingClass(missing)) if missing == name("me/Missing")
        ));
        assert!(matches!(
            graph.lookup_class(&name("me/Nowhere")),
            Err(Error::MissingClass(_))
        ));
    }
}
