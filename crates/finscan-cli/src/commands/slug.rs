//! Slug command - print the partner slug for a name.

use clap::Args;

use finscan_core::partner_slug;

/// Arguments for the slug command.
#[derive(Args)]
pub struct SlugArgs {
    /// Party name
    name: Vec<String>,
}

pub fn run(args: SlugArgs) -> anyhow::Result<()> {
    let name = args.name.join(" ");
    println!("{}", partner_slug(Some(&name)));
    Ok(())
}
