//! Compile a small error-matching rule against the toy parenthesis grammar
//! and print the generated recognizer.
//!
//! ```sh
//! cargo run --example compile_toy
//! ```

use std::path::PathBuf;

use lrmatch::{compile, parse_source, testing, Ctx};

fn main() {
    let ctx = Ctx::new(testing::paren_grammar());
    let spec = parse_source(
        "rule on_error =\n\
         | _ * ; LPAREN ; ! { \"unclosed parenthesis\".to_string() }\n\
         | X { \"operand in an odd place\".to_string() }\n",
        &PathBuf::from("toy.lrm"),
    )
    .expect("the toy specification is well formed");

    let recognizer = compile(&ctx, &spec).expect("the toy specification resolves");
    println!("{}", recognizer.render());
}
