use byteorder::{BigEndian, WriteBytesExt};
use std::io::Result;

/// Utility trait for serializing the fixed-width values found in method bodies
///
/// Every multi-byte operand in JVM bytecode (constant pool indices, branch offsets, switch
/// tables) is big-endian, so everything funnels through `byteorder` with `BigEndian`.
pub trait Serialize: Sized {
    /// Serialize construct into a binary output stream
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<()>;
}

impl Serialize for u8 {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(*self)
    }
}

impl Serialize for u16 {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<()> {
        writer.write_u16::<BigEndian>(*self)
    }
}

impl Serialize for i8 {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<()> {
        writer.write_i8(*self)
    }
}

impl Serialize for i16 {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<()> {
        writer.write_i16::<BigEndian>(*self)
    }
}

impl Serialize for i32 {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<()> {
        writer.write_i32::<BigEndian>(*self)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn to_bytes(value: impl Serialize) -> Vec<u8> {
        let mut bytes = vec![];
        value.serialize(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn big_endian_operands() {
        assert_eq!(to_bytes(0x1234u16), vec![0x12, 0x34]);
        assert_eq!(to_bytes(-2i16), vec![0xff, 0xfe]);
        assert_eq!(to_bytes(65536i32), vec![0, 1, 0, 0]);
        assert_eq!(to_bytes(-1i8), vec![0xff]);
    }
}
