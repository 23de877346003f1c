use std::{env::args_os, fs, io};

use eaip_airspace::{
    airspace::parse_airspaces, config::ParserConfig, direction::DirectionLookup,
    token::read_tokens,
};

fn main() {
    tracing_subscriber::fmt().with_writer(io::stderr).init();
    let tokens_path = args_os()
        .nth(1)
        .expect("missing argument: path to token file");
    let tokens = read_tokens(&fs::read(tokens_path).unwrap()).expect("could not read tokens");
    let lookup = args_os().nth(2).map_or_else(DirectionLookup::default, |path| {
        let paragraphs = read_tokens(&fs::read(path).unwrap()).expect("could not read paragraphs");
        DirectionLookup::from_paragraphs(&paragraphs)
    });
    let config = args_os().nth(3).map_or_else(ParserConfig::default, |path| {
        ParserConfig::from_path(path).expect("invalid parser config")
    });

    let parsed = parse_airspaces(&tokens, &lookup, &config).expect("unsuccessful parse");

    println!("{}", serde_json::to_string_pretty(&parsed).unwrap());
}
