/*!
Command dispatcher module: declarations and re-exports only.

Layout:
  src/cmd/
    mod.rs      (this file)
    subject.rs  Subject enum for list / get
    list.rs     ListArgs + execute_list
    get.rs      GetArgs  + execute_get
    tx.rs       TxArgs   + execute_tx (synthesized transaction commands)
    custom.rs   hand-written tx commands the generated tree builds on
    shared.rs   manifest loading and name lookup
    format.rs   boxes / tables / color for human output

Conventions:
  - Each subcommand module exposes one public `execute_*` function that
    takes its args plus the global `--manifest` and returns
    `anyhow::Result<()>`.
  - Argument structs derive `clap::Args`.
*/

pub mod custom;
pub mod format;
pub mod get;
pub mod list;
pub mod shared;
pub mod subject;
pub mod tx;

pub use get::{GetArgs, execute_get};
pub use list::{ListArgs, execute_list};
pub use tx::{TxArgs, execute_tx};
