//! Static per-opcode metadata
//!
//! Almost everything about an instruction (its mnemonic, its encoded length, how many words it
//! pops and pushes, which exceptions it may throw) depends only on its opcode. All of that lives
//! in one table indexed by opcode byte. The handful of instructions whose stack effect depends on
//! a constant (field accesses, invocations) are marked with `SYMBOLIC_STACK` and special-cased in
//! [`super::Instruction`].

use crate::jvm::Error;
use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Capabilities of an opcode
    pub struct InstructionFlags: u32 {
        /// Pushes at least one word onto the operand stack
        const PRODUCER = 1 << 0;
        /// Pops at least one word off the operand stack
        const CONSUMER = 1 << 1;
        /// Can transfer control somewhere other than the next instruction
        const BRANCH = 1 << 2;
        const CONDITIONAL = 1 << 3;
        const UNCONDITIONAL = 1 << 4;
        const SUBROUTINE = 1 << 5;
        const SWITCH = 1 << 6;
        const RETURN = 1 << 7;
        /// Never falls through to the next instruction (returns, `athrow`, `ret`)
        const TERMINAL = 1 << 8;
        const EXCEPTION_THROWER = 1 << 9;
        /// Has a constants pool index operand
        const INDEXED = 1 << 10;
        const LOCAL_VARIABLE = 1 << 11;
        const VARIABLE_LENGTH = 1 << 12;
        const PUSH_CONSTANT = 1 << 13;
        const INVOKE = 1 << 14;
        const FIELD_ACCESS = 1 << 15;
        /// Stack effect comes from a descriptor in the constants pool
        const SYMBOLIC_STACK = 1 << 16;
    }
}

/// One byte opcode
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Opcode(pub u8);

/// Static information about an opcode
#[derive(Copy, Clone, Debug)]
pub struct OpcodeInfo {
    pub mnemonic: &'static str,

    /// Encoded length, including operands (`None` for `tableswitch`, `lookupswitch`, `wide`)
    pub length: Option<u8>,

    /// Words popped off the operand stack
    pub consume: u8,

    /// Words pushed onto the operand stack
    pub produce: u8,

    pub flags: InstructionFlags,

    /// Exceptions the instruction may throw, as binary class names
    pub exceptions: &'static [&'static str],
}

impl OpcodeInfo {
    const fn new(
        mnemonic: &'static str,
        length: u8,
        consume: u8,
        produce: u8,
        flags: InstructionFlags,
        exceptions: &'static [&'static str],
    ) -> OpcodeInfo {
        let mut bits = flags.bits();
        if produce > 0 {
            bits |= InstructionFlags::PRODUCER.bits();
        }
        if consume > 0 {
            bits |= InstructionFlags::CONSUMER.bits();
        }
        if !exceptions.is_empty() {
            bits |= InstructionFlags::EXCEPTION_THROWER.bits();
        }
        if length == 0 {
            bits |= InstructionFlags::VARIABLE_LENGTH.bits();
        }
        OpcodeInfo {
            mnemonic,
            length: if length == 0 { None } else { Some(length) },
            consume,
            produce,
            flags: InstructionFlags::from_bits_truncate(bits),
            exceptions,
        }
    }
}

impl Opcode {
    /// Metadata for this opcode
    pub fn info(self) -> Result<&'static OpcodeInfo, Error> {
        OPCODE_TABLE[self.0 as usize]
            .as_ref()
            .ok_or(Error::UnknownOpcode(self.0))
    }

    pub fn mnemonic(self) -> Result<&'static str, Error> {
        self.info().map(|info| info.mnemonic)
    }

    pub fn flags(self) -> InstructionFlags {
        self.info()
            .map_or(InstructionFlags::empty(), |info| info.flags)
    }

    /// Find an opcode by its mnemonic (eg. `iadd`)
    pub fn from_mnemonic(mnemonic: &str) -> Option<Opcode> {
        OPCODE_TABLE
            .iter()
            .position(|info| matches!(info, Some(info) if info.mnemonic == mnemonic))
            .map(|code| Opcode(code as u8))
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.info() {
            Ok(info) => f.write_str(info.mnemonic),
            Err(_) => write!(f, "<0x{:02x}>", self.0),
        }
    }
}

const NONE: &[&str] = &[];
const NULL_POINTER: &[&str] = &["java/lang/NullPointerException"];
const ARRAY_ACCESS: &[&str] = &[
    "java/lang/NullPointerException",
    "java/lang/ArrayIndexOutOfBoundsException",
];
const ARRAY_STORE: &[&str] = &[
    "java/lang/NullPointerException",
    "java/lang/ArrayIndexOutOfBoundsException",
    "java/lang/ArrayStoreException",
];
const ARITHMETIC: &[&str] = &["java/lang/ArithmeticException"];
const MONITOR: &[&str] = &[
    "java/lang/NullPointerException",
    "java/lang/IllegalMonitorStateException",
];
const RETURN: &[&str] = &["java/lang/IllegalMonitorStateException"];
const NEGATIVE_SIZE: &[&str] = &["java/lang/NegativeArraySizeException"];
const CLASS_RESOLUTION: &[&str] = &[
    "java/lang/NoClassDefFoundError",
    "java/lang/ClassFormatError",
    "java/lang/ClassCircularityError",
    "java/lang/IllegalAccessError",
    "java/lang/VerifyError",
];
const STATIC_FIELD: &[&str] = &[
    "java/lang/NoClassDefFoundError",
    "java/lang/ClassFormatError",
    "java/lang/ClassCircularityError",
    "java/lang/IllegalAccessError",
    "java/lang/VerifyError",
    "java/lang/NoSuchFieldError",
    "java/lang/IncompatibleClassChangeError",
    "java/lang/ExceptionInInitializerError",
];
const INSTANCE_FIELD: &[&str] = &[
    "java/lang/NoClassDefFoundError",
    "java/lang/ClassFormatError",
    "java/lang/ClassCircularityError",
    "java/lang/IllegalAccessError",
    "java/lang/VerifyError",
    "java/lang/NoSuchFieldError",
    "java/lang/IncompatibleClassChangeError",
    "java/lang/NullPointerException",
];
const INSTANCE_INVOKE: &[&str] = &[
    "java/lang/NoClassDefFoundError",
    "java/lang/ClassFormatError",
    "java/lang/ClassCircularityError",
    "java/lang/IllegalAccessError",
    "java/lang/VerifyError",
    "java/lang/NoSuchMethodError",
    "java/lang/IncompatibleClassChangeError",
    "java/lang/AbstractMethodError",
    "java/lang/UnsatisfiedLinkError",
    "java/lang/NullPointerException",
];
const STATIC_INVOKE: &[&str] = &[
    "java/lang/NoClassDefFoundError",
    "java/lang/ClassFormatError",
    "java/lang/ClassCircularityError",
    "java/lang/IllegalAccessError",
    "java/lang/VerifyError",
    "java/lang/NoSuchMethodError",
    "java/lang/IncompatibleClassChangeError",
    "java/lang/UnsatisfiedLinkError",
    "java/lang/ExceptionInInitializerError",
];
const DYNAMIC_INVOKE: &[&str] = &[
    "java/lang/NoClassDefFoundError",
    "java/lang/ClassFormatError",
    "java/lang/ClassCircularityError",
    "java/lang/IllegalAccessError",
    "java/lang/VerifyError",
    "java/lang/BootstrapMethodError",
];
const NEW: &[&str] = &[
    "java/lang/NoClassDefFoundError",
    "java/lang/ClassFormatError",
    "java/lang/ClassCircularityError",
    "java/lang/IllegalAccessError",
    "java/lang/VerifyError",
    "java/lang/InstantiationError",
    "java/lang/ExceptionInInitializerError",
];
const NEW_REFERENCE_ARRAY: &[&str] = &[
    "java/lang/NoClassDefFoundError",
    "java/lang/ClassFormatError",
    "java/lang/ClassCircularityError",
    "java/lang/IllegalAccessError",
    "java/lang/VerifyError",
    "java/lang/NegativeArraySizeException",
];
const CHECK_CAST: &[&str] = &[
    "java/lang/NoClassDefFoundError",
    "java/lang/ClassFormatError",
    "java/lang/ClassCircularityError",
    "java/lang/IllegalAccessError",
    "java/lang/VerifyError",
    "java/lang/ClassCastException",
];

macro_rules! opcodes {
    ($(
        $konst:ident = $code:literal, $mnemonic:literal, $len:literal,
        $consume:literal, $produce:literal, [$($flag:ident)*], $exceptions:ident;
    )*) => {
        impl Opcode {
            $( pub const $konst: Opcode = Opcode($code); )*
        }

        static OPCODE_TABLE: [Option<OpcodeInfo>; 256] = {
            let mut table: [Option<OpcodeInfo>; 256] = [None; 256];
            $(
                table[$code] = Some(OpcodeInfo::new(
                    $mnemonic,
                    $len,
                    $consume,
                    $produce,
                    InstructionFlags::from_bits_truncate(0 $(| InstructionFlags::$flag.bits())*),
                    $exceptions,
                ));
            )*
            table
        };
    };
}

// Lengths of 0 mark variable length instructions. Stack effects for `SYMBOLIC_STACK` and
// `multianewarray` are nominal: the real effect is computed from the operands.
opcodes! {
    NOP = 0x00, "nop", 1, 0, 0, [], NONE;
    ACONST_NULL = 0x01, "aconst_null", 1, 0, 1, [PUSH_CONSTANT], NONE;
    ICONST_M1 = 0x02, "iconst_m1", 1, 0, 1, [PUSH_CONSTANT], NONE;
    ICONST_0 = 0x03, "iconst_0", 1, 0, 1, [PUSH_CONSTANT], NONE;
    ICONST_1 = 0x04, "iconst_1", 1, 0, 1, [PUSH_CONSTANT], NONE;
    ICONST_2 = 0x05, "iconst_2", 1, 0, 1, [PUSH_CONSTANT], NONE;
    ICONST_3 = 0x06, "iconst_3", 1, 0, 1, [PUSH_CONSTANT], NONE;
    ICONST_4 = 0x07, "iconst_4", 1, 0, 1, [PUSH_CONSTANT], NONE;
    ICONST_5 = 0x08, "iconst_5", 1, 0, 1, [PUSH_CONSTANT], NONE;
    LCONST_0 = 0x09, "lconst_0", 1, 0, 2, [PUSH_CONSTANT], NONE;
    LCONST_1 = 0x0a, "lconst_1", 1, 0, 2, [PUSH_CONSTANT], NONE;
    FCONST_0 = 0x0b, "fconst_0", 1, 0, 1, [PUSH_CONSTANT], NONE;
    FCONST_1 = 0x0c, "fconst_1", 1, 0, 1, [PUSH_CONSTANT], NONE;
    FCONST_2 = 0x0d, "fconst_2", 1, 0, 1, [PUSH_CONSTANT], NONE;
    DCONST_0 = 0x0e, "dconst_0", 1, 0, 2, [PUSH_CONSTANT], NONE;
    DCONST_1 = 0x0f, "dconst_1", 1, 0, 2, [PUSH_CONSTANT], NONE;
    BIPUSH = 0x10, "bipush", 2, 0, 1, [PUSH_CONSTANT], NONE;
    SIPUSH = 0x11, "sipush", 3, 0, 1, [PUSH_CONSTANT], NONE;
    LDC = 0x12, "ldc", 2, 0, 1, [PUSH_CONSTANT INDEXED], CLASS_RESOLUTION;
    LDC_W = 0x13, "ldc_w", 3, 0, 1, [PUSH_CONSTANT INDEXED], CLASS_RESOLUTION;
    LDC2_W = 0x14, "ldc2_w", 3, 0, 2, [PUSH_CONSTANT INDEXED], NONE;
    ILOAD = 0x15, "iload", 2, 0, 1, [LOCAL_VARIABLE], NONE;
    LLOAD = 0x16, "lload", 2, 0, 2, [LOCAL_VARIABLE], NONE;
    FLOAD = 0x17, "fload", 2, 0, 1, [LOCAL_VARIABLE], NONE;
    DLOAD = 0x18, "dload", 2, 0, 2, [LOCAL_VARIABLE], NONE;
    ALOAD = 0x19, "aload", 2, 0, 1, [LOCAL_VARIABLE], NONE;
    ILOAD_0 = 0x1a, "iload_0", 1, 0, 1, [LOCAL_VARIABLE], NONE;
    ILOAD_1 = 0x1b, "iload_1", 1, 0, 1, [LOCAL_VARIABLE], NONE;
    ILOAD_2 = 0x1c, "iload_2", 1, 0, 1, [LOCAL_VARIABLE], NONE;
    ILOAD_3 = 0x1d, "iload_3", 1, 0, 1, [LOCAL_VARIABLE], NONE;
    LLOAD_0 = 0x1e, "lload_0", 1, 0, 2, [LOCAL_VARIABLE], NONE;
    LLOAD_1 = 0x1f, "lload_1", 1, 0, 2, [LOCAL_VARIABLE], NONE;
    LLOAD_2 = 0x20, "lload_2", 1, 0, 2, [LOCAL_VARIABLE], NONE;
    LLOAD_3 = 0x21, "lload_3", 1, 0, 2, [LOCAL_VARIABLE], NONE;
    FLOAD_0 = 0x22, "fload_0", 1, 0, 1, [LOCAL_VARIABLE], NONE;
    FLOAD_1 = 0x23, "fload_1", 1, 0, 1, [LOCAL_VARIABLE], NONE;
    FLOAD_2 = 0x24, "fload_2", 1, 0, 1, [LOCAL_VARIABLE], NONE;
    FLOAD_3 = 0x25, "fload_3", 1, 0, 1, [LOCAL_VARIABLE], NONE;
    DLOAD_0 = 0x26, "dload_0", 1, 0, 2, [LOCAL_VARIABLE], NONE;
    DLOAD_1 = 0x27, "dload_1", 1, 0, 2, [LOCAL_VARIABLE], NONE;
    DLOAD_2 = 0x28, "dload_2", 1, 0, 2, [LOCAL_VARIABLE], NONE;
    DLOAD_3 = 0x29, "dload_3", 1, 0, 2, [LOCAL_VARIABLE], NONE;
    ALOAD_0 = 0x2a, "aload_0", 1, 0, 1, [LOCAL_VARIABLE], NONE;
    ALOAD_1 = 0x2b, "aload_1", 1, 0, 1, [LOCAL_VARIABLE], NONE;
    ALOAD_2 = 0x2c, "aload_2", 1, 0, 1, [LOCAL_VARIABLE], NONE;
    ALOAD_3 = 0x2d, "aload_3", 1, 0, 1, [LOCAL_VARIABLE], NONE;
    IALOAD = 0x2e, "iaload", 1, 2, 1, [], ARRAY_ACCESS;
    LALOAD = 0x2f, "laload", 1, 2, 2, [], ARRAY_ACCESS;
    FALOAD = 0x30, "faload", 1, 2, 1, [], ARRAY_ACCESS;
    DALOAD = 0x31, "daload", 1, 2, 2, [], ARRAY_ACCESS;
    AALOAD = 0x32, "aaload", 1, 2, 1, [], ARRAY_ACCESS;
    BALOAD = 0x33, "baload", 1, 2, 1, [], ARRAY_ACCESS;
    CALOAD = 0x34, "caload", 1, 2, 1, [], ARRAY_ACCESS;
    SALOAD = 0x35, "saload", 1, 2, 1, [], ARRAY_ACCESS;
    ISTORE = 0x36, "istore", 2, 1, 0, [LOCAL_VARIABLE], NONE;
    LSTORE = 0x37, "lstore", 2, 2, 0, [LOCAL_VARIABLE], NONE;
    FSTORE = 0x38, "fstore", 2, 1, 0, [LOCAL_VARIABLE], NONE;
    DSTORE = 0x39, "dstore", 2, 2, 0, [LOCAL_VARIABLE], NONE;
    ASTORE = 0x3a, "astore", 2, 1, 0, [LOCAL_VARIABLE], NONE;
    ISTORE_0 = 0x3b, "istore_0", 1, 1, 0, [LOCAL_VARIABLE], NONE;
    ISTORE_1 = 0x3c, "istore_1", 1, 1, 0, [LOCAL_VARIABLE], NONE;
    ISTORE_2 = 0x3d, "istore_2", 1, 1, 0, [LOCAL_VARIABLE], NONE;
    ISTORE_3 = 0x3e, "istore_3", 1, 1, 0, [LOCAL_VARIABLE], NONE;
    LSTORE_0 = 0x3f, "lstore_0", 1, 2, 0, [LOCAL_VARIABLE], NONE;
    LSTORE_1 = 0x40, "lstore_1", 1, 2, 0, [LOCAL_VARIABLE], NONE;
    LSTORE_2 = 0x41, "lstore_2", 1, 2, 0, [LOCAL_VARIABLE], NONE;
    LSTORE_3 = 0x42, "lstore_3", 1, 2, 0, [LOCAL_VARIABLE], NONE;
    FSTORE_0 = 0x43, "fstore_0", 1, 1, 0, [LOCAL_VARIABLE], NONE;
    FSTORE_1 = 0x44, "fstore_1", 1, 1, 0, [LOCAL_VARIABLE], NONE;
    FSTORE_2 = 0x45, "fstore_2", 1, 1, 0, [LOCAL_VARIABLE], NONE;
    FSTORE_3 = 0x46, "fstore_3", 1, 1, 0, [LOCAL_VARIABLE], NONE;
    DSTORE_0 = 0x47, "dstore_0", 1, 2, 0, [LOCAL_VARIABLE], NONE;
    DSTORE_1 = 0x48, "dstore_1", 1, 2, 0, [LOCAL_VARIABLE], NONE;
    DSTORE_2 = 0x49, "dstore_2", 1, 2, 0, [LOCAL_VARIABLE], NONE;
    DSTORE_3 = 0x4a, "dstore_3", 1, 2, 0, [LOCAL_VARIABLE], NONE;
    ASTORE_0 = 0x4b, "astore_0", 1, 1, 0, [LOCAL_VARIABLE], NONE;
    ASTORE_1 = 0x4c, "astore_1", 1, 1, 0, [LOCAL_VARIABLE], NONE;
    ASTORE_2 = 0x4d, "astore_2", 1, 1, 0, [LOCAL_VARIABLE], NONE;
    ASTORE_3 = 0x4e, "astore_3", 1, 1, 0, [LOCAL_VARIABLE], NONE;
    IASTORE = 0x4f, "iastore", 1, 3, 0, [], ARRAY_ACCESS;
    LASTORE = 0x50, "lastore", 1, 4, 0, [], ARRAY_ACCESS;
    FASTORE = 0x51, "fastore", 1, 3, 0, [], ARRAY_ACCESS;
    DASTORE = 0x52, "dastore", 1, 4, 0, [], ARRAY_ACCESS;
    AASTORE = 0x53, "aastore", 1, 3, 0, [], ARRAY_STORE;
    BASTORE = 0x54, "bastore", 1, 3, 0, [], ARRAY_ACCESS;
    CASTORE = 0x55, "castore", 1, 3, 0, [], ARRAY_ACCESS;
    SASTORE = 0x56, "sastore", 1, 3, 0, [], ARRAY_ACCESS;
    POP = 0x57, "pop", 1, 1, 0, [], NONE;
    POP2 = 0x58, "pop2", 1, 2, 0, [], NONE;
    DUP = 0x59, "dup", 1, 1, 2, [], NONE;
    DUP_X1 = 0x5a, "dup_x1", 1, 2, 3, [], NONE;
    DUP_X2 = 0x5b, "dup_x2", 1, 3, 4, [], NONE;
    DUP2 = 0x5c, "dup2", 1, 2, 4, [], NONE;
    DUP2_X1 = 0x5d, "dup2_x1", 1, 3, 5, [], NONE;
    DUP2_X2 = 0x5e, "dup2_x2", 1, 4, 6, [], NONE;
    SWAP = 0x5f, "swap", 1, 2, 2, [], NONE;
    IADD = 0x60, "iadd", 1, 2, 1, [], NONE;
    LADD = 0x61, "ladd", 1, 4, 2, [], NONE;
    FADD = 0x62, "fadd", 1, 2, 1, [], NONE;
    DADD = 0x63, "dadd", 1, 4, 2, [], NONE;
    ISUB = 0x64, "isub", 1, 2, 1, [], NONE;
    LSUB = 0x65, "lsub", 1, 4, 2, [], NONE;
    FSUB = 0x66, "fsub", 1, 2, 1, [], NONE;
    DSUB = 0x67, "dsub", 1, 4, 2, [], NONE;
    IMUL = 0x68, "imul", 1, 2, 1, [], NONE;
    LMUL = 0x69, "lmul", 1, 4, 2, [], NONE;
    FMUL = 0x6a, "fmul", 1, 2, 1, [], NONE;
    DMUL = 0x6b, "dmul", 1, 4, 2, [], NONE;
    IDIV = 0x6c, "idiv", 1, 2, 1, [], ARITHMETIC;
    LDIV = 0x6d, "ldiv", 1, 4, 2, [], ARITHMETIC;
    FDIV = 0x6e, "fdiv", 1, 2, 1, [], NONE;
    DDIV = 0x6f, "ddiv", 1, 4, 2, [], NONE;
    IREM = 0x70, "irem", 1, 2, 1, [], ARITHMETIC;
    LREM = 0x71, "lrem", 1, 4, 2, [], ARITHMETIC;
    FREM = 0x72, "frem", 1, 2, 1, [], NONE;
    DREM = 0x73, "drem", 1, 4, 2, [], NONE;
    INEG = 0x74, "ineg", 1, 1, 1, [], NONE;
    LNEG = 0x75, "lneg", 1, 2, 2, [], NONE;
    FNEG = 0x76, "fneg", 1, 1, 1, [], NONE;
    DNEG = 0x77, "dneg", 1, 2, 2, [], NONE;
    ISHL = 0x78, "ishl", 1, 2, 1, [], NONE;
    LSHL = 0x79, "lshl", 1, 3, 2, [], NONE;
    ISHR = 0x7a, "ishr", 1, 2, 1, [], NONE;
    LSHR = 0x7b, "lshr", 1, 3, 2, [], NONE;
    IUSHR = 0x7c, "iushr", 1, 2, 1, [], NONE;
    LUSHR = 0x7d, "lushr", 1, 3, 2, [], NONE;
    IAND = 0x7e, "iand", 1, 2, 1, [], NONE;
    LAND = 0x7f, "land", 1, 4, 2, [], NONE;
    IOR = 0x80, "ior", 1, 2, 1, [], NONE;
    LOR = 0x81, "lor", 1, 4, 2, [], NONE;
    IXOR = 0x82, "ixor", 1, 2, 1, [], NONE;
    LXOR = 0x83, "lxor", 1, 4, 2, [], NONE;
    IINC = 0x84, "iinc", 3, 0, 0, [LOCAL_VARIABLE], NONE;
    I2L = 0x85, "i2l", 1, 1, 2, [], NONE;
    I2F = 0x86, "i2f", 1, 1, 1, [], NONE;
    I2D = 0x87, "i2d", 1, 1, 2, [], NONE;
    L2I = 0x88, "l2i", 1, 2, 1, [], NONE;
    L2F = 0x89, "l2f", 1, 2, 1, [], NONE;
    L2D = 0x8a, "l2d", 1, 2, 2, [], NONE;
    F2I = 0x8b, "f2i", 1, 1, 1, [], NONE;
    F2L = 0x8c, "f2l", 1, 1, 2, [], NONE;
    F2D = 0x8d, "f2d", 1, 1, 2, [], NONE;
    D2I = 0x8e, "d2i", 1, 2, 1, [], NONE;
    D2L = 0x8f, "d2l", 1, 2, 2, [], NONE;
    D2F = 0x90, "d2f", 1, 2, 1, [], NONE;
    I2B = 0x91, "i2b", 1, 1, 1, [], NONE;
    I2C = 0x92, "i2c", 1, 1, 1, [], NONE;
    I2S = 0x93, "i2s", 1, 1, 1, [], NONE;
    LCMP = 0x94, "lcmp", 1, 4, 1, [], NONE;
    FCMPL = 0x95, "fcmpl", 1, 2, 1, [], NONE;
    FCMPG = 0x96, "fcmpg", 1, 2, 1, [], NONE;
    DCMPL = 0x97, "dcmpl", 1, 4, 1, [], NONE;
    DCMPG = 0x98, "dcmpg", 1, 4, 1, [], NONE;
    IFEQ = 0x99, "ifeq", 3, 1, 0, [BRANCH CONDITIONAL], NONE;
    IFNE = 0x9a, "ifne", 3, 1, 0, [BRANCH CONDITIONAL], NONE;
    IFLT = 0x9b, "iflt", 3, 1, 0, [BRANCH CONDITIONAL], NONE;
    IFGE = 0x9c, "ifge", 3, 1, 0, [BRANCH CONDITIONAL], NONE;
    IFGT = 0x9d, "ifgt", 3, 1, 0, [BRANCH CONDITIONAL], NONE;
    IFLE = 0x9e, "ifle", 3, 1, 0, [BRANCH CONDITIONAL], NONE;
    IF_ICMPEQ = 0x9f, "if_icmpeq", 3, 2, 0, [BRANCH CONDITIONAL], NONE;
    IF_ICMPNE = 0xa0, "if_icmpne", 3, 2, 0, [BRANCH CONDITIONAL], NONE;
    IF_ICMPLT = 0xa1, "if_icmplt", 3, 2, 0, [BRANCH CONDITIONAL], NONE;
    IF_ICMPGE = 0xa2, "if_icmpge", 3, 2, 0, [BRANCH CONDITIONAL], NONE;
    IF_ICMPGT = 0xa3, "if_icmpgt", 3, 2, 0, [BRANCH CONDITIONAL], NONE;
    IF_ICMPLE = 0xa4, "if_icmple", 3, 2, 0, [BRANCH CONDITIONAL], NONE;
    IF_ACMPEQ = 0xa5, "if_acmpeq", 3, 2, 0, [BRANCH CONDITIONAL], NONE;
    IF_ACMPNE = 0xa6, "if_acmpne", 3, 2, 0, [BRANCH CONDITIONAL], NONE;
    GOTO = 0xa7, "goto", 3, 0, 0, [BRANCH UNCONDITIONAL], NONE;
    JSR = 0xa8, "jsr", 3, 0, 1, [BRANCH SUBROUTINE], NONE;
    RET = 0xa9, "ret", 2, 0, 0, [LOCAL_VARIABLE TERMINAL], NONE;
    TABLESWITCH = 0xaa, "tableswitch", 0, 1, 0, [BRANCH SWITCH], NONE;
    LOOKUPSWITCH = 0xab, "lookupswitch", 0, 1, 0, [BRANCH SWITCH], NONE;
    IRETURN = 0xac, "ireturn", 1, 1, 0, [RETURN TERMINAL], RETURN;
    LRETURN = 0xad, "lreturn", 1, 2, 0, [RETURN TERMINAL], RETURN;
    FRETURN = 0xae, "freturn", 1, 1, 0, [RETURN TERMINAL], RETURN;
    DRETURN = 0xaf, "dreturn", 1, 2, 0, [RETURN TERMINAL], RETURN;
    ARETURN = 0xb0, "areturn", 1, 1, 0, [RETURN TERMINAL], RETURN;
    RETURN = 0xb1, "return", 1, 0, 0, [RETURN TERMINAL], RETURN;
    GETSTATIC = 0xb2, "getstatic", 3, 0, 1, [INDEXED FIELD_ACCESS SYMBOLIC_STACK], STATIC_FIELD;
    PUTSTATIC = 0xb3, "putstatic", 3, 1, 0, [INDEXED FIELD_ACCESS SYMBOLIC_STACK], STATIC_FIELD;
    GETFIELD = 0xb4, "getfield", 3, 1, 1, [INDEXED FIELD_ACCESS SYMBOLIC_STACK], INSTANCE_FIELD;
    PUTFIELD = 0xb5, "putfield", 3, 2, 0, [INDEXED FIELD_ACCESS SYMBOLIC_STACK], INSTANCE_FIELD;
    INVOKEVIRTUAL = 0xb6, "invokevirtual", 3, 1, 0, [INDEXED INVOKE SYMBOLIC_STACK], INSTANCE_INVOKE;
    INVOKESPECIAL = 0xb7, "invokespecial", 3, 1, 0, [INDEXED INVOKE SYMBOLIC_STACK], INSTANCE_INVOKE;
    INVOKESTATIC = 0xb8, "invokestatic", 3, 0, 0, [INDEXED INVOKE SYMBOLIC_STACK], STATIC_INVOKE;
    INVOKEINTERFACE = 0xb9, "invokeinterface", 5, 1, 0, [INDEXED INVOKE SYMBOLIC_STACK], INSTANCE_INVOKE;
    INVOKEDYNAMIC = 0xba, "invokedynamic", 5, 0, 0, [INDEXED INVOKE SYMBOLIC_STACK], DYNAMIC_INVOKE;
    NEW = 0xbb, "new", 3, 0, 1, [INDEXED], NEW;
    NEWARRAY = 0xbc, "newarray", 2, 1, 1, [], NEGATIVE_SIZE;
    ANEWARRAY = 0xbd, "anewarray", 3, 1, 1, [INDEXED], NEW_REFERENCE_ARRAY;
    ARRAYLENGTH = 0xbe, "arraylength", 1, 1, 1, [], NULL_POINTER;
    ATHROW = 0xbf, "athrow", 1, 1, 0, [TERMINAL], MONITOR;
    CHECKCAST = 0xc0, "checkcast", 3, 1, 1, [INDEXED], CHECK_CAST;
    INSTANCEOF = 0xc1, "instanceof", 3, 1, 1, [INDEXED], CLASS_RESOLUTION;
    MONITORENTER = 0xc2, "monitorenter", 1, 1, 0, [], NULL_POINTER;
    MONITOREXIT = 0xc3, "monitorexit", 1, 1, 0, [], MONITOR;
    WIDE = 0xc4, "wide", 0, 0, 0, [], NONE;
    MULTIANEWARRAY = 0xc5, "multianewarray", 4, 1, 1, [INDEXED], NEW_REFERENCE_ARRAY;
    IFNULL = 0xc6, "ifnull", 3, 1, 0, [BRANCH CONDITIONAL], NONE;
    IFNONNULL = 0xc7, "ifnonnull", 3, 1, 0, [BRANCH CONDITIONAL], NONE;
    GOTO_W = 0xc8, "goto_w", 5, 0, 0, [BRANCH UNCONDITIONAL], NONE;
    JSR_W = 0xc9, "jsr_w", 5, 0, 1, [BRANCH SUBROUTINE], NONE;
}
