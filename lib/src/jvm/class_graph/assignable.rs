//! Assignment compatibility between reference types
//!
//! These follow the verifier rules (see `isJavaAssignable` in [the JVM spec][0]). Arrays are
//! covariant, and their only supertypes besides other arrays are `java/lang/Object`,
//! `java/lang/Cloneable`, and `java/io/Serializable`.
//!
//! [0]: https://docs.oracle.com/javase/specs/jvms/se18/html/jvms-4.html#jvms-4.10.1.2

use super::ClassHierarchy;
use crate::jvm::{BinaryName, Error, FieldType, RefType};

/// Type of a reference value, as seen by the verifier
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum ReferenceType {
    /// Type of `null`, which is compatible with every other reference type
    Null,
    Ref(RefType),
}

impl From<RefType> for ReferenceType {
    fn from(ref_type: RefType) -> ReferenceType {
        ReferenceType::Ref(ref_type)
    }
}

impl ReferenceType {
    pub fn object(name: BinaryName) -> ReferenceType {
        ReferenceType::Ref(RefType::Object(name))
    }

    /// Can a value of this type be used where `target` is expected?
    pub fn is_assignment_compatible_with(
        &self,
        target: &ReferenceType,
        hierarchy: &impl ClassHierarchy,
    ) -> Result<bool, Error> {
        match (self, target) {
            (ReferenceType::Null, _) => Ok(true),
            (ReferenceType::Ref(_), ReferenceType::Null) => Ok(false),
            (ReferenceType::Ref(source), ReferenceType::Ref(target)) => {
                is_ref_type_assignable(source, target, hierarchy)
            }
        }
    }

    /// Nearest common superclass of two reference types
    ///
    /// Arrays of references with the same number of dimensions merge into an array of the common
    /// superclass of their components. Any other mix involving arrays or interfaces merges into
    /// `java/lang/Object`.
    pub fn first_common_superclass(
        &self,
        other: &ReferenceType,
        hierarchy: &impl ClassHierarchy,
    ) -> Result<ReferenceType, Error> {
        match (self, other) {
            (ReferenceType::Null, other) => Ok(other.clone()),
            (this, ReferenceType::Null) => Ok(this.clone()),
            (ReferenceType::Ref(ref1), ReferenceType::Ref(ref2)) => {
                first_common_superclass(ref1, ref2, hierarchy).map(ReferenceType::Ref)
            }
        }
    }
}

fn is_ref_type_assignable(
    source: &RefType,
    target: &RefType,
    hierarchy: &impl ClassHierarchy,
) -> Result<bool, Error> {
    match (source, target) {
        (RefType::Object(source), RefType::Object(target)) => {
            is_object_type_assignable(source, target, hierarchy)
        }

        // Special superclass and interfaces of all arrays
        (RefType::Array(_), RefType::Object(target)) => Ok(is_array_supertype(target)),

        // Nothing but `null` is assignable to arrays
        (RefType::Object(_), RefType::Array(_)) => Ok(false),

        // Components must be the same primitive type or assignable reference types
        (RefType::Array(source), RefType::Array(target)) => {
            match (source.component_type(), target.component_type()) {
                (FieldType::Base(base1), FieldType::Base(base2)) => Ok(base1 == base2),
                (FieldType::Ref(ref1), FieldType::Ref(ref2)) => {
                    is_ref_type_assignable(&ref1, &ref2, hierarchy)
                }
                _ => Ok(false),
            }
        }
    }
}

/// Object-to-object assignability
fn is_object_type_assignable(
    source: &BinaryName,
    target: &BinaryName,
    hierarchy: &impl ClassHierarchy,
) -> Result<bool, Error> {
    if source == target || target == &BinaryName::OBJECT {
        return Ok(true);
    }

    if hierarchy.lookup_class(target)?.is_interface {
        hierarchy.implementation_of(source, target)
    } else if hierarchy.lookup_class(source)?.is_interface {
        Ok(false)
    } else {
        hierarchy.is_subclass_of(source, target)
    }
}

/// This bakes in knowledge of the small, finite set of super types arrays have.
fn is_array_supertype(super_type: &BinaryName) -> bool {
    super_type == &BinaryName::OBJECT
        || super_type == &BinaryName::CLONEABLE
        || super_type == &BinaryName::SERIALIZABLE
}

fn first_common_superclass(
    ref1: &RefType,
    ref2: &RefType,
    hierarchy: &impl ClassHierarchy,
) -> Result<RefType, Error> {
    if ref1 == ref2 {
        return Ok(ref1.clone());
    }

    match (ref1, ref2) {
        (RefType::Array(arr1), RefType::Array(arr2)) => {
            match (arr1.component_type(), arr2.component_type()) {
                (FieldType::Ref(comp1), FieldType::Ref(comp2)) => {
                    let component = first_common_superclass(&comp1, &comp2, hierarchy)?;
                    RefType::array(FieldType::Ref(component))
                }
                _ => Ok(RefType::Object(BinaryName::OBJECT)),
            }
        }
        (RefType::Object(name1), RefType::Object(name2)) => {
            common_superclass(name1, name2, hierarchy).map(RefType::Object)
        }
        _ => Ok(RefType::Object(BinaryName::OBJECT)),
    }
}

/// Walk both superclass chains and find the first class in common
fn common_superclass(
    name1: &BinaryName,
    name2: &BinaryName,
    hierarchy: &impl ClassHierarchy,
) -> Result<BinaryName, Error> {
    if hierarchy.lookup_class(name1)?.is_interface || hierarchy.lookup_class(name2)?.is_interface {
        return Ok(BinaryName::OBJECT);
    }

    let mut chain1 = vec![name1.clone()];
    chain1.extend(hierarchy.superclasses(name1)?);
    let mut chain2 = vec![name2.clone()];
    chain2.extend(hierarchy.superclasses(name2)?);

    let common = chain1.into_iter().find(|class| chain2.contains(class));
    Ok(common.unwrap_or(BinaryName::OBJECT))
}
