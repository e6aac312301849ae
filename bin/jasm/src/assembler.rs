//! Line-oriented assembly syntax
//!
//! Every line holds optional labels (`name:`), then either one instruction or one directive.
//! Comments start with a `;` at the beginning of a token (so descriptors like
//! `Ljava/lang/String;` are left alone).
//!
//! ```text
//!         iload_0
//!         .switch other 0=zero 1=one
//! zero:   ldc "zero"
//!         areturn
//! one:    ldc "one"     ; strings are quoted
//!         areturn
//! other:  aconst_null
//!         areturn
//! ```
//!
//! Directives:
//!
//!   - `.catch <class|any> <start> <end> <handler>` protects `start..=end`
//!   - `.line <number> <label>` starts a source line
//!   - `.switch <default> <value>=<label> ...` picks a `tableswitch` or `lookupswitch`

use crate::error::Error;
use jbytecode::jvm::class_file::{Constant, ConstantIndex, ConstantValue, ConstantsPool};
use jbytecode::jvm::code::{
    BranchKind, FieldAccess, Instruction, InstructionFactory, InstructionHandle, InvokeType,
    LocalKind, Opcode,
};
use jbytecode::jvm::model::{Method, MethodBuilder};
use jbytecode::jvm::{
    self, BaseType, BinaryName, FieldType, MethodDescriptor, Name, ParseDescriptor, RefType,
    UnqualifiedName,
};
use jbytecode::Settings;
use std::collections::HashMap;
use std::str::FromStr;

enum Statement {
    Instruction {
        mnemonic: String,
        operands: Vec<String>,
    },
    Catch {
        class: Option<String>,
        start: String,
        end: String,
        handler: String,
    },
    Line {
        number: u16,
        label: String,
    },
    Switch {
        default: String,
        cases: Vec<(i32, String)>,
    },
}

/// Instruction which can only be built once every label is known
enum Fixup {
    Branch(BranchKind, String),
    Switch {
        default: String,
        cases: Vec<(i32, String)>,
    },
}

enum Parsed {
    Ready(Instruction),
    Later(Fixup),
}

/// Finished method along with the pool it refers to
pub struct Assembled {
    pub method: Method,
    pub pool: ConstantsPool,

    /// Resolved listing of the method body
    pub listing: String,
}

/// Assemble the source into the body of `method`
///
/// Instructions referring to labels are first appended as `nop` placeholders and swapped for the
/// real instruction once every label has been seen.
pub fn assemble(
    source: &str,
    mut method: MethodBuilder,
    settings: &Settings,
) -> Result<Assembled, Error> {
    let mut pool = ConstantsPool::new();
    let mut factory = InstructionFactory::new(&mut pool, settings);

    let mut labels: HashMap<String, InstructionHandle> = HashMap::new();
    let mut pending_labels: Vec<(usize, String)> = vec![];
    let mut fixups: Vec<(usize, InstructionHandle, Fixup)> = vec![];
    let mut directives: Vec<(usize, Statement)> = vec![];

    for (idx, text) in source.lines().enumerate() {
        let line = idx + 1;
        let (line_labels, statement) = parse_line(line, text)?;
        pending_labels.extend(line_labels.into_iter().map(|label| (line, label)));

        let handle = match statement {
            None => continue,
            Some(Statement::Instruction { mnemonic, operands }) => {
                match instruction(&mut factory, line, &mnemonic, &operands)? {
                    Parsed::Ready(instruction) => method.code.append(instruction)?,
                    Parsed::Later(fixup) => {
                        let handle = method.code.append(Instruction::NOP)?;
                        fixups.push((line, handle, fixup));
                        handle
                    }
                }
            }
            Some(Statement::Switch { default, cases }) => {
                let handle = method.code.append(Instruction::NOP)?;
                fixups.push((line, handle, Fixup::Switch { default, cases }));
                handle
            }
            Some(directive) => {
                directives.push((line, directive));
                continue;
            }
        };

        for (line, label) in pending_labels.drain(..) {
            if labels.insert(label.clone(), handle).is_some() {
                return Err(Error::BadLabel { line, label });
            }
        }
    }
    if let Some((line, label)) = pending_labels.pop() {
        return Err(Error::BadLabel { line, label });
    }
    log::debug!(
        "Parsed {} instructions ({} to patch) and {} labels",
        method.code.len(),
        fixups.len(),
        labels.len()
    );

    let target = |line: usize, label: &str| -> Result<InstructionHandle, Error> {
        labels.get(label).copied().ok_or_else(|| Error::UnknownLabel {
            line,
            label: label.to_owned(),
        })
    };

    for (line, handle, fixup) in fixups {
        let instruction = match fixup {
            Fixup::Branch(kind, label) => Instruction::Branch(kind, target(line, &label)?),
            Fixup::Switch { default, cases } => {
                let mut matches = vec![];
                for (value, label) in cases {
                    matches.push((value, target(line, &label)?));
                }
                factory.select(matches, target(line, &default)?)?
            }
        };
        method.code.set_instruction(handle, instruction)?;
    }

    for (line, directive) in directives {
        match directive {
            Statement::Catch {
                class,
                start,
                end,
                handler,
            } => {
                let catch_type = class
                    .map(|class| {
                        BinaryName::from_string(class).map_err(|message| Error::Syntax {
                            line,
                            message,
                        })
                    })
                    .transpose()?;
                method.add_exception_handler(
                    target(line, &start)?,
                    target(line, &end)?,
                    target(line, &handler)?,
                    catch_type,
                )?;
            }
            Statement::Line { number, label } => {
                method.add_line_number(target(line, &label)?, number)?;
            }
            Statement::Instruction { .. } | Statement::Switch { .. } => (),
        }
    }

    let finished = method.finish(&mut pool, settings)?;
    let listing = method.code.listing(Some(&pool));
    Ok(Assembled {
        method: finished,
        pool,
        listing,
    })
}

/// One-line description of a pool entry
pub fn describe_constant(
    pool: &ConstantsPool,
    index: ConstantIndex,
    constant: &Constant,
) -> Result<String, jvm::Error> {
    let description = match constant {
        Constant::Utf8(utf8) => format!("{:?}", utf8),
        Constant::Integer(integer) => integer.to_string(),
        Constant::Float(float) => format!("{}f", float),
        Constant::Long(long) => format!("{}L", long),
        Constant::Double(double) => format!("{}d", double),
        Constant::String(utf8) => format!("{:?}", pool.get_utf8(*utf8)?),
        Constant::Class(_) => pool.class_name(index)?.to_owned(),
        Constant::NameAndType { name, descriptor } => {
            format!("{}:{}", pool.get_utf8(*name)?, pool.get_utf8(*descriptor)?)
        }
        Constant::FieldRef(..) | Constant::MethodRef { .. } => {
            let member = pool.member_ref(index)?;
            format!("{}.{}:{}", member.class, member.name, member.descriptor)
        }
        other => format!("{:?}", other),
    };
    let index = format!("#{}", index.0);
    Ok(format!("{:>6} = {:<18} {}", index, constant.kind_name(), description))
}

fn syntax(line: usize, message: impl Into<String>) -> Error {
    Error::Syntax {
        line,
        message: message.into(),
    }
}

/// Split off the labels at the start of a line and parse whatever follows
fn parse_line(line: usize, text: &str) -> Result<(Vec<String>, Option<Statement>), Error> {
    let mut tokens = tokenize(line, text)?;

    let mut labels = vec![];
    while let Some(label) = tokens
        .first()
        .and_then(|token| token.strip_suffix(':'))
        .map(str::to_owned)
    {
        if label.is_empty() || label.starts_with('"') {
            return Err(syntax(line, "malformed label"));
        }
        labels.push(label);
        tokens.remove(0);
    }

    if tokens.is_empty() {
        return Ok((labels, None));
    }
    let mnemonic = tokens.remove(0);
    let operands = tokens;
    if !mnemonic.starts_with('.') {
        return Ok((labels, Some(Statement::Instruction { mnemonic, operands })));
    }
    let arity = |count: usize| -> Result<(), Error> {
        if operands.len() == count {
            Ok(())
        } else {
            let msg = format!("'{}' takes {} operands, not {}", mnemonic, count, operands.len());
            Err(syntax(line, msg))
        }
    };

    let statement = match mnemonic.as_str() {
        ".catch" => {
            arity(4)?;
            let class = match operands[0].as_str() {
                "any" => None,
                class => Some(class.to_owned()),
            };
            Statement::Catch {
                class,
                start: operands[1].clone(),
                end: operands[2].clone(),
                handler: operands[3].clone(),
            }
        }
        ".line" => {
            arity(2)?;
            Statement::Line {
                number: number(line, &operands[0])?,
                label: operands[1].clone(),
            }
        }
        ".switch" => {
            if operands.is_empty() {
                return Err(syntax(line, "'.switch' needs a default label"));
            }
            let mut cases = vec![];
            for case in &operands[1..] {
                let (value, label) = case
                    .split_once('=')
                    .ok_or_else(|| syntax(line, format!("expected <value>=<label>, got '{}'", case)))?;
                cases.push((number(line, value)?, label.to_owned()));
            }
            Statement::Switch {
                default: operands[0].clone(),
                cases,
            }
        }
        directive => {
            return Err(syntax(line, format!("unknown directive '{}'", directive)));
        }
    };
    Ok((labels, Some(statement)))
}

/// Split a line into whitespace separated tokens, dropping comments
///
/// Quoted strings stay quoted (escapes `\n`, `\t`, `\"`, `\\` are already processed).
fn tokenize(line: usize, text: &str) -> Result<Vec<String>, Error> {
    let mut tokens = vec![];
    let mut chars = text.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == ';' {
            break;
        } else if c == '"' {
            chars.next();
            let mut token = String::from('"');
            loop {
                match chars.next() {
                    None => return Err(syntax(line, "unterminated string")),
                    Some('"') => break,
                    Some('\\') => match chars.next() {
                        Some('n') => token.push('\n'),
                        Some('t') => token.push('\t'),
                        Some(c @ ('"' | '\\')) => token.push(c),
                        other => {
                            return Err(syntax(line, format!("unknown escape {:?}", other)));
                        }
                    },
                    Some(c) => token.push(c),
                }
            }
            token.push('"');
            tokens.push(token);
        } else {
            let mut token = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                token.push(c);
                chars.next();
            }
            tokens.push(token);
        }
    }

    Ok(tokens)
}

fn number<T: FromStr>(line: usize, token: &str) -> Result<T, Error> {
    token
        .parse()
        .map_err(|_| syntax(line, format!("'{}' is not a valid number here", token)))
}

fn descriptor<T: ParseDescriptor>(line: usize, token: &str) -> Result<T, Error> {
    T::parse(token).map_err(|err| syntax(line, format!("bad descriptor '{}': {}", token, err)))
}

fn ref_type(line: usize, token: &str) -> Result<RefType, Error> {
    RefType::from_class_name(token).map_err(|err| syntax(line, err.to_string()))
}

/// Parse an `ldc` operand: `"string"`, `12`, `12L`, `1.5f`, `1.5` (or `1.5d`)
fn literal(line: usize, token: &str) -> Result<ConstantValue, Error> {
    if let Some(string) = token
        .strip_prefix('"')
        .and_then(|token| token.strip_suffix('"'))
    {
        return Ok(ConstantValue::String(string.to_owned()));
    }
    let value = if let Some(long) = token.strip_suffix(&['L', 'l'][..]) {
        ConstantValue::Long(number(line, long)?)
    } else if let Some(float) = token.strip_suffix(&['F', 'f'][..]) {
        ConstantValue::Float(number(line, float)?)
    } else if let Some(double) = token.strip_suffix(&['D', 'd'][..]) {
        ConstantValue::Double(number(line, double)?)
    } else if token.contains(&['.', 'e', 'E'][..]) {
        ConstantValue::Double(number(line, token)?)
    } else {
        ConstantValue::Integer(number(line, token)?)
    };
    Ok(value)
}

const LOCAL_KINDS: [LocalKind; 5] = [
    LocalKind::Int,
    LocalKind::Long,
    LocalKind::Float,
    LocalKind::Double,
    LocalKind::Reference,
];

/// Local variable instruction with the slot as an operand (`iload 4`)
fn local_instruction(opcode: Opcode, slot: u16) -> Option<Instruction> {
    let code = opcode.0;
    if (Opcode::ILOAD.0..=Opcode::ALOAD.0).contains(&code) {
        let kind = LOCAL_KINDS[(code - Opcode::ILOAD.0) as usize];
        Some(Instruction::Load(kind, slot))
    } else if (Opcode::ISTORE.0..=Opcode::ASTORE.0).contains(&code) {
        let kind = LOCAL_KINDS[(code - Opcode::ISTORE.0) as usize];
        Some(Instruction::Store(kind, slot))
    } else {
        None
    }
}

/// Local variable instruction with the slot in the mnemonic (`iload_2`)
fn short_local_instruction(opcode: Opcode) -> Option<Instruction> {
    let code = opcode.0;
    if (Opcode::ILOAD_0.0..=Opcode::ALOAD_3.0).contains(&code) {
        let offset = code - Opcode::ILOAD_0.0;
        let kind = LOCAL_KINDS[(offset / 4) as usize];
        Some(Instruction::Load(kind, (offset % 4) as u16))
    } else if (Opcode::ISTORE_0.0..=Opcode::ASTORE_3.0).contains(&code) {
        let offset = code - Opcode::ISTORE_0.0;
        let kind = LOCAL_KINDS[(offset / 4) as usize];
        Some(Instruction::Store(kind, (offset % 4) as u16))
    } else {
        None
    }
}

fn instruction(
    factory: &mut InstructionFactory<'_>,
    line: usize,
    mnemonic: &str,
    operands: &[String],
) -> Result<Parsed, Error> {
    let opcode = Opcode::from_mnemonic(mnemonic)
        .ok_or_else(|| syntax(line, format!("unknown instruction '{}'", mnemonic)))?;
    let arity = |count: usize| -> Result<(), Error> {
        if operands.len() == count {
            Ok(())
        } else {
            let msg = format!("'{}' takes {} operands, not {}", mnemonic, count, operands.len());
            Err(syntax(line, msg))
        }
    };

    if let Some(kind) = BranchKind::from_opcode(opcode) {
        arity(1)?;
        return Ok(Parsed::Later(Fixup::Branch(kind, operands[0].clone())));
    }
    if let Some(instruction) = short_local_instruction(opcode) {
        arity(0)?;
        return Ok(Parsed::Ready(instruction));
    }
    if local_instruction(opcode, 0).is_some() {
        arity(1)?;
        let slot = number(line, &operands[0])?;
        if let Some(instruction) = local_instruction(opcode, slot) {
            return Ok(Parsed::Ready(instruction));
        }
    }

    let instruction = match opcode {
        Opcode::BIPUSH => {
            arity(1)?;
            Instruction::BiPush(number(line, &operands[0])?)
        }
        Opcode::SIPUSH => {
            arity(1)?;
            Instruction::SiPush(number(line, &operands[0])?)
        }
        Opcode::LDC | Opcode::LDC_W | Opcode::LDC2_W => {
            arity(1)?;
            factory.constant(&literal(line, &operands[0])?)?
        }
        Opcode::IINC => {
            arity(2)?;
            let slot = number(line, &operands[0])?;
            factory.increment(slot, number(line, &operands[1])?)?
        }
        Opcode::RET => {
            arity(1)?;
            Instruction::Ret(number(line, &operands[0])?)
        }
        Opcode::GETSTATIC | Opcode::PUTSTATIC | Opcode::GETFIELD | Opcode::PUTFIELD => {
            arity(3)?;
            let access = match opcode {
                Opcode::GETSTATIC => FieldAccess::GetStatic,
                Opcode::PUTSTATIC => FieldAccess::PutStatic,
                Opcode::GETFIELD => FieldAccess::GetField,
                _ => FieldAccess::PutField,
            };
            let field_type: FieldType = descriptor(line, &operands[2])?;
            factory.field_access(access, &operands[0], &operands[1], &field_type)?
        }
        Opcode::INVOKEVIRTUAL
        | Opcode::INVOKESPECIAL
        | Opcode::INVOKESTATIC
        | Opcode::INVOKEINTERFACE => {
            arity(3)?;
            let kind = match opcode {
                Opcode::INVOKEVIRTUAL => InvokeType::Virtual,
                Opcode::INVOKESPECIAL => InvokeType::Special,
                Opcode::INVOKESTATIC => InvokeType::Static,
                _ => InvokeType::Interface,
            };
            let method_descriptor: MethodDescriptor = descriptor(line, &operands[2])?;
            factory.invoke(kind, &operands[0], &operands[1], &method_descriptor)?
        }
        Opcode::INVOKEDYNAMIC => {
            arity(3)?;
            let bootstrap_method = number(line, &operands[0])?;
            let name = UnqualifiedName::from_string(operands[1].clone())
                .map_err(|message| syntax(line, message))?;
            let method_descriptor: MethodDescriptor = descriptor(line, &operands[2])?;
            factory.invoke_dynamic(bootstrap_method, &name, &method_descriptor)?
        }
        Opcode::NEW => {
            arity(1)?;
            factory.new_object(&operands[0])?
        }
        Opcode::NEWARRAY => {
            arity(1)?;
            Instruction::NewArray(descriptor::<BaseType>(line, &operands[0])?)
        }
        Opcode::ANEWARRAY => {
            arity(1)?;
            let component = FieldType::Ref(ref_type(line, &operands[0])?);
            factory.new_array(&component, 1)?
        }
        Opcode::MULTIANEWARRAY => {
            arity(2)?;
            let element_type: FieldType = descriptor(line, &operands[0])?;
            factory.new_array(&element_type, number(line, &operands[1])?)?
        }
        Opcode::CHECKCAST => {
            arity(1)?;
            factory.check_cast(&ref_type(line, &operands[0])?)?
        }
        Opcode::INSTANCEOF => {
            arity(1)?;
            factory.instance_of(&ref_type(line, &operands[0])?)?
        }
        Opcode::TABLESWITCH | Opcode::LOOKUPSWITCH => {
            return Err(syntax(line, "switches are written using '.switch'"));
        }
        _ => {
            arity(0)?;
            Instruction::Simple(opcode)
        }
    };
    Ok(Parsed::Ready(instruction))
}

#[cfg(test)]
mod test {
    use super::*;
    use jbytecode::jvm::MethodAccessFlags;

    fn method(descriptor: &str) -> MethodBuilder {
        MethodBuilder::new(
            MethodAccessFlags::STATIC,
            BinaryName::from_string(String::from("me/Test")).unwrap(),
            UnqualifiedName::from_string(String::from("test")).unwrap(),
            MethodDescriptor::parse(descriptor).unwrap(),
        )
    }

    fn opcodes(assembled: &Assembled) -> Vec<Opcode> {
        let code = assembled.method.code.as_ref().unwrap();
        code.instructions
            .iter()
            .map(|instruction| instruction.opcode)
            .collect()
    }

    #[test]
    fn labels_and_switches() {
        let source = "
                    iload_0
                    .switch other 0=zero 1=one
            zero:   ldc \"zero\"
                    areturn
            one:    ldc \"one\"      ; comment
                    areturn
            other:  aconst_null
                    areturn
        ";
        let settings = Settings::default();
        let assembled =
            assemble(source, method("(I)Ljava/lang/String;"), &settings).unwrap();
        assert_eq!(
            opcodes(&assembled),
            vec![
                Opcode::ILOAD_0,
                Opcode::TABLESWITCH,
                Opcode::LDC,
                Opcode::ARETURN,
                Opcode::LDC,
                Opcode::ARETURN,
                Opcode::ACONST_NULL,
                Opcode::ARETURN,
            ]
        );
        assert!(assembled.pool.lookup_string("zero").is_some());
        let code = assembled.method.code.unwrap();
        assert_eq!(code.max_stack, 1);
        assert_eq!(code.max_locals, 1);
    }

    #[test]
    fn descriptors_are_not_comments() {
        let source = "
            getstatic java/lang/System out Ljava/io/PrintStream;   ; print
            ldc 2.5
            invokevirtual java/io/PrintStream println (D)V
            return
        ";
        let assembled = assemble(source, method("()V"), &Settings::default()).unwrap();
        assert_eq!(
            opcodes(&assembled),
            vec![
                Opcode::GETSTATIC,
                Opcode::LDC2_W,
                Opcode::INVOKEVIRTUAL,
                Opcode::RETURN
            ]
        );
        assert_eq!(assembled.method.code.unwrap().max_stack, 3);
    }

    #[test]
    fn handlers_and_lines() {
        let source = "
            start:  iload_0
                    iconst_2
                    idiv
            end:    ireturn
            catch:  pop
                    iconst_0
                    ireturn
            .catch java/lang/ArithmeticException start end catch
            .line 10 start
        ";
        let assembled = assemble(source, method("(I)I"), &Settings::default()).unwrap();
        let code = assembled.method.code.unwrap();
        assert_eq!(code.exception_table.len(), 1);
        assert_eq!(code.exception_table[0].start_pc, 0);
        assert_eq!(code.exception_table[0].end_pc, 4);
        assert_eq!(code.exception_table[0].handler_pc, 4);
        assert_eq!(code.line_numbers[0].line_number, 10);
        assert_eq!(code.max_stack, 2);
    }

    #[test]
    fn bad_sources() {
        let settings = Settings::default();
        assert!(matches!(
            assemble("goto nowhere", method("()V"), &settings),
            Err(Error::UnknownLabel { line: 1, .. })
        ));
        assert!(matches!(
            assemble("a: nop\na: return", method("()V"), &settings),
            Err(Error::BadLabel { line: 2, .. })
        ));
        assert!(matches!(
            assemble("return\ndangling:", method("()V"), &settings),
            Err(Error::BadLabel { line: 2, .. })
        ));
        assert!(matches!(
            assemble("frobnicate", method("()V"), &settings),
            Err(Error::Syntax { line: 1, .. })
        ));
        assert!(matches!(
            assemble("bipush 1000", method("()V"), &settings),
            Err(Error::Syntax { line: 1, .. })
        ));
    }

    #[test]
    fn literals() {
        assert_eq!(literal(1, "7").unwrap(), ConstantValue::Integer(7));
        assert_eq!(literal(1, "7L").unwrap(), ConstantValue::Long(7));
        assert_eq!(literal(1, "1.5f").unwrap(), ConstantValue::Float(1.5));
        assert_eq!(literal(1, "1.5").unwrap(), ConstantValue::Double(1.5));
        assert_eq!(
            literal(1, "\"a b\"").unwrap(),
            ConstantValue::String(String::from("a b"))
        );
        assert_eq!(
            tokenize(1, "ldc \"a \\\"b\\\"\" ; done").unwrap(),
            vec![String::from("ldc"), String::from("\"a \"b\"\"")]
        );
    }
}
