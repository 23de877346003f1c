use std::{env::args_os, fs, io};

use eaip_airspace::{direction::DirectionLookup, token::read_tokens};

fn main() {
    tracing_subscriber::fmt().with_writer(io::stderr).init();
    let path = args_os()
        .nth(1)
        .expect("missing argument: path to paragraph file");
    let paragraphs = read_tokens(&fs::read(path).unwrap()).expect("could not read paragraphs");
    let lookup = DirectionLookup::from_paragraphs(&paragraphs);

    println!("{}", serde_json::to_string(&lookup).unwrap());
}
