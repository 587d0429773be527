//! # CRD Generator
//!
//! Prints the CustomResourceDefinitions of every managed kind as one YAML
//! stream.
//!
//! ## Usage
//!
//! ```bash
//! # Generate CRD YAML
//! cargo run --bin crdgen > config/crd/spinnaker.yaml
//!
//! # Generate and apply directly
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use spinnaker_dcd_controller::runtime::registry::KINDS;

fn main() {
    println!("# This file is auto-generated by crdgen");
    println!("# DO NOT EDIT THIS FILE MANUALLY");
    for registration in KINDS {
        match serde_yaml::to_string(&(registration.crd)()) {
            Ok(yaml) => {
                println!("---");
                print!("{yaml}");
            }
            Err(e) => {
                eprintln!("Failed to serialize {} CRD to YAML: {e}", registration.kind);
                std::process::exit(1);
            }
        }
    }
}
