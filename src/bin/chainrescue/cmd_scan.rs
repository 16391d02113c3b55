use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::str::FromStr;

use ChainRescue::consts::BLOCKS_DIR;
use ChainRescue::{scan_blocks_dir, Network};

pub fn exec(path: PathBuf, network: String, json: bool) -> Result<()> {
    let net = Network::from_str(&network)?;
    let blocks_dir = path.join(net.subdir()).join(BLOCKS_DIR);
    if !blocks_dir.exists() {
        return Err(anyhow!("no blocks directory at {}", blocks_dir.display()));
    }

    let stats = scan_blocks_dir(&blocks_dir, net)?;
    if json {
        println!("{}", serde_json::to_string(&stats)?);
    } else {
        println!("files:  {}", stats.files);
        println!("blocks: {}", stats.blocks);
        println!("bytes:  {}", stats.bytes);
        match &stats.tail_corruption {
            Some(msg) => println!("tail corruption: {}", msg),
            None => println!("tail corruption: none"),
        }
    }
    Ok(())
}
