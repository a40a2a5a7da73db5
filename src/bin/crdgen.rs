//! CRD YAML Generator
//!
//! Prints the Hello CRD manifest.
//!
//! Usage: cargo run --bin crdgen > deploy/crds/hello.yaml

use hello_operator::crd::generate_crds;

fn main() -> anyhow::Result<()> {
    for crd in generate_crds()? {
        println!("---");
        print!("{}", crd);
    }
    Ok(())
}
