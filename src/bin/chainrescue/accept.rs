//! Встроенный acceptance-колбэк CLI: писатель индекса локаций.
//!
//! Это заглушка на месте настоящего консенсусного движка (шов, куда он
//! подключается): каждый блок принимается, и в перестраиваемую БД дописывается
//! запись [hash 32][file u32 LE][off u32 LE][len u32 LE] — минимальный индекс
//! «хеш блока -> адрес во flat-файлах».
//!
//! Файл открывается лениво: каталог новой БД появляется только после
//! prepare() внутри recover_database.

use anyhow::{Context, Result};
use byteorder::{LittleEndian, WriteBytesExt};
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use ChainRescue::{Block, BlockLocation};

pub const INDEX_FILE: &str = "blockindex.dat";

pub struct LocationIndexWriter {
    path: PathBuf,
    w: Option<BufWriter<std::fs::File>>,
}

impl LocationIndexWriter {
    pub fn new(db_path: &Path) -> Self {
        LocationIndexWriter {
            path: db_path.join(INDEX_FILE),
            w: None,
        }
    }

    pub fn accept(&mut self, block: &Block, location: BlockLocation) -> Result<()> {
        let w = match self.w.as_mut() {
            Some(w) => w,
            None => {
                let f = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)
                    .with_context(|| format!("open index {}", self.path.display()))?;
                self.w.insert(BufWriter::new(f))
            }
        };
        w.write_all(&block.block_hash())?;
        w.write_u32::<LittleEndian>(location.file_num)?;
        w.write_u32::<LittleEndian>(location.file_off)?;
        w.write_u32::<LittleEndian>(location.block_len)?;
        Ok(())
    }

    /// Сбросить буфер и fsync-нуть индекс.
    pub fn finish(mut self) -> Result<()> {
        if let Some(mut w) = self.w.take() {
            w.flush()?;
            w.get_ref().sync_all()?;
        }
        Ok(())
    }
}
