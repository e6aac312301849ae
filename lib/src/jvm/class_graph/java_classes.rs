use super::ClassData;
use crate::jvm::BinaryName;

/// Standard library classes and interfaces that show up in most method bodies
///
/// This is not meant to be complete. Other classes can be added to the graph as needed.
pub fn java_library_types() -> Vec<ClassData> {
    let object = |name: BinaryName| ClassData::new(name, BinaryName::OBJECT, false);
    let interface = |name: BinaryName| ClassData::new(name, BinaryName::OBJECT, true);
    let class = |name: BinaryName, superclass: BinaryName| ClassData::new(name, superclass, false);

    vec![
        ClassData {
            name: BinaryName::OBJECT,
            superclass: None,
            interfaces: vec![],
            is_interface: false,
        },
        // Interfaces
        interface(BinaryName::CHARSEQUENCE),
        interface(BinaryName::CLONEABLE),
        interface(BinaryName::COMPARABLE),
        interface(BinaryName::SERIALIZABLE),
        // `java.lang`
        object(BinaryName::STRING).with_interfaces(vec![
            BinaryName::SERIALIZABLE,
            BinaryName::COMPARABLE,
            BinaryName::CHARSEQUENCE,
        ]),
        object(BinaryName::CLASS).with_interfaces(vec![BinaryName::SERIALIZABLE]),
        object(BinaryName::NUMBER).with_interfaces(vec![BinaryName::SERIALIZABLE]),
        class(BinaryName::INTEGER, BinaryName::NUMBER)
            .with_interfaces(vec![BinaryName::COMPARABLE]),
        class(BinaryName::LONG, BinaryName::NUMBER).with_interfaces(vec![BinaryName::COMPARABLE]),
        // Exceptions
        object(BinaryName::THROWABLE).with_interfaces(vec![BinaryName::SERIALIZABLE]),
        class(BinaryName::ERROR, BinaryName::THROWABLE),
        class(BinaryName::EXCEPTION, BinaryName::THROWABLE),
        class(BinaryName::RUNTIMEEXCEPTION, BinaryName::EXCEPTION),
        // `java.lang.invoke`
        object(BinaryName::METHODHANDLE),
        object(BinaryName::METHODTYPE).with_interfaces(vec![BinaryName::SERIALIZABLE]),
    ]
}
