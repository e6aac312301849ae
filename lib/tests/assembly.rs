use jbytecode::jvm::class_file::{Constant, ConstantValue, ConstantsPool};
use jbytecode::jvm::class_graph::{ClassGraph, ReferenceType};
use jbytecode::jvm::code::{
    BranchKind, Instruction, InstructionFactory, InstructionHandle, InstructionList, InvokeType,
    LocalKind, Opcode, OrdComparison, Select, Targeter,
};
use jbytecode::jvm::model::MethodBuilder;
use jbytecode::jvm::*;
use jbytecode::Settings;

fn method(descriptor: &str, access_flags: MethodAccessFlags) -> MethodBuilder {
    MethodBuilder::new(
        access_flags,
        BinaryName::from_string(String::from("me/Assembled")).unwrap(),
        UnqualifiedName::from_string(String::from("body")).unwrap(),
        MethodDescriptor::parse(descriptor).unwrap(),
    )
}

#[test]
fn constant_deduplication() {
    let mut pool = ConstantsPool::new();
    let first = pool.add_utf8("hello").unwrap();
    pool.add_string("hello").unwrap();
    pool.add_integer(42).unwrap();
    assert_eq!(pool.add_utf8("hello").unwrap(), first);

    pool.add_methodref("me/Counter", "increment", "()V").unwrap();
    pool.add_fieldref("me/Counter", "count", "I").unwrap();
    let classes = pool
        .iter()
        .filter(|(_, constant)| matches!(constant, Constant::Class(_)))
        .count();
    assert_eq!(classes, 1);
}

#[test]
fn stack_depth_across_branches() {
    // iconst_1; iconst_1; iadd; ifeq L; iconst_1; goto L2; L: iconst_1; L2: return
    let mut body = method("()V", MethodAccessFlags::STATIC);
    let code = &mut body.code;
    code.append(Instruction::Simple(Opcode::ICONST_1)).unwrap();
    code.append(Instruction::Simple(Opcode::ICONST_1)).unwrap();
    code.append(Instruction::Simple(Opcode::IADD)).unwrap();
    let ifeq = code.append(Instruction::NOP).unwrap();
    code.append(Instruction::Simple(Opcode::ICONST_1)).unwrap();
    let goto = code.append(Instruction::NOP).unwrap();
    let l = code.append(Instruction::Simple(Opcode::ICONST_1)).unwrap();
    let l2 = code.append(Instruction::RETURN).unwrap();
    code.set_instruction(ifeq, Instruction::Branch(BranchKind::If(OrdComparison::EQ), l))
        .unwrap();
    code.set_instruction(goto, Instruction::Branch(BranchKind::Goto, l2))
        .unwrap();

    let mut pool = ConstantsPool::new();
    let finished = body.finish(&mut pool, &Settings::default()).unwrap();
    let code = finished.code.unwrap();
    assert_eq!(code.max_stack, 2);
    assert_eq!(code.max_locals, 0);
    assert_eq!(
        code.instructions
            .iter()
            .map(|instruction| instruction.opcode)
            .collect::<Vec<_>>(),
        vec![
            Opcode::ICONST_1,
            Opcode::ICONST_1,
            Opcode::IADD,
            Opcode::IFEQ,
            Opcode::ICONST_1,
            Opcode::GOTO,
            Opcode::ICONST_1,
            Opcode::RETURN,
        ]
    );
}

#[test]
fn far_branches_are_widened() {
    let mut body = method("()V", MethodAccessFlags::STATIC);
    let first = body.code.append(Instruction::NOP).unwrap();
    let second = body.code.append(Instruction::NOP).unwrap();
    for _ in 0..100 {
        body.code.append(Instruction::Simple(Opcode::ICONST_0)).unwrap();
        body.code.append(Instruction::Simple(Opcode::POP)).unwrap();
    }
    let ret = body.code.append(Instruction::RETURN).unwrap();
    for branch in [first, second] {
        body.code
            .set_instruction(branch, Instruction::Branch(BranchKind::Goto, ret))
            .unwrap();
    }

    let settings = Settings {
        short_jump_range: -64..=63,
        ..Settings::default()
    };
    let mut pool = ConstantsPool::new();
    let code = body.finish(&mut pool, &settings).unwrap().code.unwrap();

    // Two `goto_w`s, then 200 bytes of filler and the `return`
    assert_eq!(code.code_length, 5 + 5 + 200 + 1);
    assert_eq!(code.instructions[0].opcode, Opcode::GOTO_W);
    assert_eq!(code.instructions[0].operands, 210i32.to_be_bytes().to_vec());
    assert_eq!(code.instructions[1].opcode, Opcode::GOTO_W);
    assert_eq!(code.instructions[1].operands, 205i32.to_be_bytes().to_vec());

    // The filler is unreachable
    assert_eq!(code.max_stack, 0);
}

#[test]
fn conflicting_deletes_leave_the_body_untouched() {
    let mut body = method("(I)I", MethodAccessFlags::STATIC);
    let load = body.code.append(Instruction::Load(LocalKind::Int, 0)).unwrap();
    let ret = body.code.append(Instruction::Simple(Opcode::IRETURN)).unwrap();
    let local = body
        .add_local_variable(
            UnqualifiedName::from_string(String::from("n")).unwrap(),
            FieldType::int(),
            0,
            load,
            ret,
        )
        .unwrap();
    let branch = body
        .code
        .insert(Instruction::Branch(BranchKind::Goto, load))
        .unwrap();

    let conflict = match body.code.delete_range(load, ret) {
        Err(Error::TargeterConflict(conflict)) => conflict,
        other => panic!("expected a targeter conflict, got {:?}", other),
    };
    let mut targeters: Vec<Targeter> = conflict.targeters().copied().collect();
    targeters.sort();
    assert_eq!(
        targeters,
        vec![
            Targeter::Branch(branch),
            Targeter::LocalVariable(local),
            Targeter::LocalVariable(local)
        ]
    );
    assert_eq!(
        body.code.opcodes(),
        vec![Opcode::GOTO, Opcode::ILOAD_0, Opcode::IRETURN]
    );
}

#[test]
fn switch_forms() {
    let mut list = InstructionList::new();
    let targets: Vec<InstructionHandle> = (0..4)
        .map(|_| list.append(Instruction::RETURN).unwrap())
        .collect();
    let default = targets[0];
    let pairs = |values: &[i32]| -> Vec<(i32, InstructionHandle)> {
        values
            .iter()
            .zip(targets.iter())
            .map(|(value, target)| (*value, *target))
            .collect()
    };

    let dense = Select::new(pairs(&[3, 1, 0, 2]), default, 1).unwrap();
    assert_eq!(dense.opcode(), Opcode::TABLESWITCH);

    let sparse = Select::new(pairs(&[0, 100, 500]), default, 1).unwrap();
    assert_eq!(sparse.opcode(), Opcode::LOOKUPSWITCH);

    match Select::new(pairs(&[0, 1, 3]), default, 2).unwrap() {
        Select::Table { low, targets, .. } => {
            assert_eq!(low, 0);
            assert_eq!(targets.len(), 4);
            assert_eq!(targets[2], default);
        }
        other => panic!("expected a tableswitch, got {:?}", other),
    }

    assert!(matches!(
        Select::new(pairs(&[1, 1]), default, 1),
        Err(Error::InvalidInstruction(_))
    ));
}

#[test]
fn factory_built_method() {
    let settings = Settings::default();
    let mut pool = ConstantsPool::new();
    let mut body = method("(J)Ljava/lang/String;", MethodAccessFlags::STATIC);

    let mut factory = InstructionFactory::new(&mut pool, &settings);
    let long = FieldType::long();
    let to_string = MethodDescriptor::parse("(J)Ljava/lang/String;").unwrap();
    body.code.append(factory.load(&long, 0).unwrap()).unwrap();
    body.code
        .append(factory.constant(&ConstantValue::Long(1_000_000)).unwrap())
        .unwrap();
    body.code
        .append(Instruction::Simple(Opcode::LADD))
        .unwrap();
    body.code
        .append(
            factory
                .invoke(InvokeType::Static, "java/lang/Long", "toString", &to_string)
                .unwrap(),
        )
        .unwrap();
    let string = FieldType::object(BinaryName::STRING);
    body.code.append(factory.return_(Some(&string))).unwrap();

    let finished = body.finish(&mut pool, &settings).unwrap();
    let code = finished.code.unwrap();
    assert_eq!(code.max_stack, 4);
    assert_eq!(code.max_locals, 2);
    assert_eq!(
        code.instructions
            .iter()
            .map(|instruction| instruction.opcode)
            .collect::<Vec<_>>(),
        vec![
            Opcode::LLOAD_0,
            Opcode::LDC2_W,
            Opcode::LADD,
            Opcode::INVOKESTATIC,
            Opcode::ARETURN,
        ]
    );
    assert!(pool.lookup_long(1_000_000).is_some());
}

#[test]
fn array_compatibility() {
    let mut graph = ClassGraph::new();
    graph.insert_java_library_types();

    let ints2 = ReferenceType::Ref(RefType::parse("[[I").unwrap());
    let ints1 = ReferenceType::Ref(RefType::parse("[I").unwrap());
    let object = ReferenceType::object(BinaryName::OBJECT);

    assert!(ints2.is_assignment_compatible_with(&ints2, &graph).unwrap());
    assert!(ints2.is_assignment_compatible_with(&object, &graph).unwrap());
    assert!(!ints2.is_assignment_compatible_with(&ints1, &graph).unwrap());
    assert!(!ints1.is_assignment_compatible_with(&ints2, &graph).unwrap());
    assert!(ReferenceType::Null
        .is_assignment_compatible_with(&ints1, &graph)
        .unwrap());
}
