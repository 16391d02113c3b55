use anyhow::Result;
use std::path::PathBuf;
use std::str::FromStr;

use ChainRescue::{recover_database, Network};

use crate::accept::LocationIndexWriter;

pub fn exec(path: PathBuf, network: String) -> Result<()> {
    let net = Network::from_str(&network)?;
    let db_path = path.join(net.subdir());

    let mut index = LocationIndexWriter::new(&db_path);
    let blocks = recover_database(&path, net, |block, location| index.accept(block, location))?;
    index.finish()?;

    println!(
        "{} blocks read; index rebuilt at {}",
        blocks,
        db_path.display()
    );
    Ok(())
}
