//! Assemble JVM method bodies
//!
//! ### Simple example
//!
//! Consider the constructor of the following simple Java class:
//!
//! ```java,ignore,no_run
//! public class Point {
//!     public final int x;
//!     public final int y;
//!
//!     public Point(int x, int y) {
//!         this.x = x;
//!         this.y = y;
//!     }
//! }
//! ```
//!
//! Assembling its body can be done as follows:
//!
//! ```
//! use jbytecode::jvm::class_file::ConstantsPool;
//! use jbytecode::jvm::code::{FieldAccess, InstructionFactory, InvokeType};
//! use jbytecode::jvm::model::MethodBuilder;
//! use jbytecode::jvm::*;
//! use jbytecode::Settings;
//!
//! # fn assemble() -> Result<(), Error> {
//! let settings = Settings::default();
//! let mut pool = ConstantsPool::new();
//! let point = BinaryName::from_string(String::from("me/alec/Point")).unwrap();
//!
//! let mut constructor = MethodBuilder::new(
//!     MethodAccessFlags::PUBLIC,
//!     point.clone(),
//!     UnqualifiedName::INIT,
//!     MethodDescriptor::parse("(II)V").map_err(Error::IoError)?,
//! );
//!
//! // Generate the constructor method body
//! let mut factory = InstructionFactory::new(&mut pool, &settings);
//! let this_type = FieldType::object(point.clone());
//! let no_args = MethodDescriptor::parse("()V").map_err(Error::IoError)?;
//! let code = &mut constructor.code;
//! code.append(factory.load(&this_type, 0)?)?;
//! code.append(factory.invoke(InvokeType::Special, "java/lang/Object", "<init>", &no_args)?)?;
//! for (slot, field) in [(1, "x"), (2, "y")] {
//!     code.append(factory.load(&this_type, 0)?)?;
//!     code.append(factory.load(&FieldType::int(), slot)?)?;
//!     code.append(factory.field_access(FieldAccess::PutField, point.as_str(), field, &FieldType::int())?)?;
//! }
//! code.append(factory.return_(None))?;
//!
//! // Resolve everything into its final form
//! let method = constructor.finish(&mut pool, &settings)?;
//! let body = method.code.unwrap();
//! assert_eq!(body.max_stack, 2);
//! assert_eq!(body.max_locals, 3);
//! assert_eq!(body.code_length, 15);
//! # Ok(())
//! # }
//! # assemble().unwrap();
//! ```

mod access_flags;
mod binary_format;
pub mod class_file;
pub mod class_graph;
pub mod code;
mod descriptors;
mod errors;
pub mod model;
mod names;

pub use access_flags::*;
pub use binary_format::*;
pub use descriptors::*;
pub use errors::*;
pub use names::*;
