use jbytecode::jvm::model::MethodBuilder;
use jbytecode::jvm::{
    self, BinaryName, MethodAccessFlags, MethodDescriptor, Name, ParseDescriptor, UnqualifiedName,
};
use jbytecode::Settings;

use clap::{value_parser, Arg, ArgAction, Command};
use std::fs;

mod assembler;
mod error;

use error::Error;

fn main() -> Result<(), Error> {
    env_logger::init();

    let matches = Command::new("JVM method assembler")
        .version("0.1.0")
        .about("Assemble a JVM method body and print its resolved bytecode")
        .arg(
            Arg::new("class")
                .long("class")
                .value_name("CLASS_NAME")
                .default_value("Assembled")
                .help("Class containing the method (eg. `foo/bar/Baz`)"),
        )
        .arg(
            Arg::new("name")
                .long("name")
                .value_name("METHOD_NAME")
                .default_value("run")
                .help("Name of the method"),
        )
        .arg(
            Arg::new("descriptor")
                .long("descriptor")
                .value_name("DESCRIPTOR")
                .default_value("()V")
                .help("Method descriptor (eg. `(ILjava/lang/String;)V`)"),
        )
        .arg(
            Arg::new("static")
                .long("static")
                .action(ArgAction::SetTrue)
                .help("Make the method static (no `this` in local 0)"),
        )
        .arg(
            Arg::new("max-switch-gap")
                .long("max-switch-gap")
                .value_name("GAP")
                .value_parser(value_parser!(i32))
                .default_value("1")
                .help("Largest gap between switch values still encoded as a `tableswitch`"),
        )
        .arg(
            Arg::new("remove-nops")
                .long("remove-nops")
                .action(ArgAction::SetTrue)
                .help("Strip `nop` instructions before resolving the method"),
        )
        .arg(
            Arg::new("INPUT")
                .help("Sets the assembly file to use")
                .required(true)
                .index(1),
        )
        .get_matches();

    let string_arg = |id: &str| -> Result<String, Error> {
        matches
            .get_one::<String>(id)
            .cloned()
            .ok_or_else(|| Error::Usage(format!("missing argument '{}'", id)))
    };

    let max_switch_gap = matches.get_one::<i32>("max-switch-gap").copied().unwrap_or(1);
    let mut settings = Settings::new(max_switch_gap)?;
    settings.remove_nops = matches.get_flag("remove-nops");

    let mut access_flags = MethodAccessFlags::PUBLIC;
    if matches.get_flag("static") {
        access_flags |= MethodAccessFlags::STATIC;
    }
    let class_name = BinaryName::from_string(string_arg("class")?).map_err(Error::Usage)?;
    let name = UnqualifiedName::from_string(string_arg("name")?).map_err(Error::Usage)?;
    let descriptor = MethodDescriptor::parse(&string_arg("descriptor")?)
        .map_err(|err| Error::Usage(format!("bad method descriptor: {}", err)))?;

    let input = string_arg("INPUT")?;
    log::info!("Assembling '{}' as {}.{}", &input, class_name, name);
    let source = fs::read_to_string(&input).map_err(jvm::Error::IoError)?;
    let method = MethodBuilder::new(access_flags, class_name, name, descriptor);
    let assembled = assembler::assemble(&source, method, &settings)?;

    print!("{}", assembled.listing);
    if let Some(code) = &assembled.method.code {
        println!();
        println!("max_stack = {}", code.max_stack);
        println!("max_locals = {}", code.max_locals);
        println!("code_length = {}", code.code_length);
        for entry in &code.exception_table {
            let catch_type = match entry.catch_type {
                Some(class) => assembled.pool.class_name(class)?.to_owned(),
                None => String::from("any"),
            };
            println!(
                "catch {} [{}, {}) -> {}",
                catch_type, entry.start_pc, entry.end_pc, entry.handler_pc
            );
        }
        for entry in &code.line_numbers {
            println!("line {} at {}", entry.line_number, entry.start_pc);
        }
    }

    println!();
    println!("Constant pool:");
    for (index, constant) in assembled.pool.iter() {
        println!(
            "{}",
            assembler::describe_constant(&assembled.pool, index, constant)?
        );
    }

    Ok(())
}
