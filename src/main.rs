//! # pixfolio CLI
//!
//! Command-line front end for a pixfolio library.
//!
//! ## Usage
//! ```bash
//! pixfolio --root ~/Pictures/lib reconcile
//! pixfolio --root ~/Pictures/lib dedup --dry-run
//! RUST_LOG=pixfolio=debug pixfolio clean-cache
//! ```

mod cli;

use pixfolio::Result;

fn main() -> Result<()> {
    pixfolio::init_tracing();
    cli::run()
}
