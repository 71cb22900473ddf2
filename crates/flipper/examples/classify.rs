//! Classify a few words on the bundled surfaces.
//!
//! Usage:
//!   cargo run -p flipper --example classify
//!   cargo run -p flipper --example classify -- S_1_2 abC
//!
//! Prints the Nielsen–Thurston type of each word and, for pseudo-Anosov
//! classes, the dilatation and the length of the periodic splitting.

use flipper::api::{surface_by_name, ClassifyCfg, NielsenThurston, NoProgress, Number};

fn show(name: &str, word: &str) {
    let result = surface_by_name(name)
        .and_then(|s| s.mapping_class(word))
        .and_then(|f| f.nielsen_thurston_type(ClassifyCfg::default(), &mut NoProgress));
    match result {
        Ok(NielsenThurston::Periodic { order }) => println!("{name} {word}: periodic, order {order}"),
        Ok(NielsenThurston::Reducible(curves)) => {
            println!("{name} {word}: reducible, fixes {:?}", curves.weights())
        }
        Ok(NielsenThurston::PseudoAnosov { dilatation, splitting }) => println!(
            "{name} {word}: pseudo-anosov, dilatation {:.6}, period {}",
            dilatation.to_f64(),
            splitting.periodic.len()
        ),
        Err(e) => println!("{name} {word}: {e}"),
    }
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let [name, word] = args.as_slice() {
        show(name, word);
        return;
    }
    for (name, word) in [
        ("S_1_1", "ab"),
        ("S_1_1", "a"),
        ("S_1_1", "aB"),
        ("S_1_2", "aC"),
        ("S_1_2", "abCb"),
        ("S_0_4", "aB"),
    ] {
        show(name, word);
    }
}
