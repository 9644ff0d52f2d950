use tda::jvm::DirectoryClassProvider;
use tda::*;

use clap::{crate_version, Arg, ArgAction, Command};

fn main() -> Result<(), source::Error> {
    env_logger::init();

    let matches = Command::new("Tokenizing JVM disassembler")
        .version(crate_version!())
        .author("Alec Theriault <alec.theriault@gmail.com>")
        .about("Render a JVM class as a pseudo-source listing")
        .arg(
            Arg::new("classpath")
                .long("classpath")
                .value_name("DIR")
                .default_value(".")
                .help("Directory holding the `.class` files, laid out by package"),
        )
        .arg(
            Arg::new("tokens")
                .long("tokens")
                .action(ArgAction::SetTrue)
                .help("After the listing, print every token along with the entry it refers to"),
        )
        .arg(
            Arg::new("CLASS")
                .help("Class to render (eg. `java/lang/String` or `java.lang.String`)")
                .required(true)
                .index(1),
        )
        .get_matches();

    let classpath = matches
        .get_one::<String>("classpath")
        .map(String::as_str)
        .unwrap_or(".");
    let class_name = matches
        .get_one::<String>("CLASS")
        .map(|name| name.replace('.', "/"))
        .unwrap_or_default();

    log::info!("Rendering '{}' from '{}'", &class_name, classpath);
    let disassembler = source::TokenizingDisassembler::new(DirectoryClassProvider::new(classpath));
    let index = disassembler.source(&class_name, None)?.index()?;

    print!("{}", index.text());
    if matches.get_flag("tokens") {
        println!();
        for (token, entry) in index.tokens() {
            println!(
                "{}..{}  {}  {}",
                token.start,
                token.end,
                index.token_text(token),
                entry
            );
        }
    }

    Ok(())
}
