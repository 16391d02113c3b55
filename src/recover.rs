//! recover — верхний уровень: staging, реплей, прогресс, финализация.
//!
//! recover_database — прямолинейное восстановление «с нуля до конца»:
//! без чекпойнтов внутри процесса, без частичного режима. Прерванный запуск
//! опирается только на re-entrant протокол каталогов из staging.
//!
//! scan_blocks_dir — read-only отчёт по flat-файлам живой БД (ничего не
//! переносится и не пишется), для команды scan.

use log::info;
use serde::Serialize;
use std::path::Path;

use crate::block::Block;
use crate::errors::RecoverError;
use crate::lock::acquire_exclusive_lock;
use crate::net::Network;
use crate::progress::ProgressReporter;
use crate::replay::replay;
use crate::scan::{ScanStep, Scanner};
use crate::staging::RecoveryPaths;
use crate::store::{BlockLocation, BlockStore};

/// Перестроить индекс БД {base}/{network}, прогнав каждый блок из её
/// flat-файлов через accept. Возвращает blocks_read (конвенция подсчёта —
/// см. replay).
///
/// accept — внешняя acceptance-функция: вся консенсусная валидация и запись
/// в новый стор на её стороне; генезис она знает заранее и сюда не попадает.
pub fn recover_database<F>(
    base: &Path,
    network: Network,
    mut accept: F,
) -> Result<u32, RecoverError>
where
    F: FnMut(&Block, BlockLocation) -> anyhow::Result<()>,
{
    if !base.exists() {
        return Err(RecoverError::NotFound(base.to_path_buf()));
    }
    let _lock = acquire_exclusive_lock(base)?;

    let paths = RecoveryPaths::new(base, network);
    paths.prepare()?;

    // Место под новую БД (индекс в неё пишет acceptance-сторона).
    std::fs::create_dir_all(&paths.db_path)?;

    let store = BlockStore::new(paths.staged_blocks_dir(), network);
    let (files, total_bytes) = store.total_size()?;
    info!(
        "found database of {} block files, {} bytes",
        files, total_bytes
    );

    let mut progress = ProgressReporter::new(total_bytes);
    let result = replay(&store, |block, location| {
        if let Some(line) = progress.record(location.block_len) {
            info!("{}", line);
        }
        accept(block, location)
    });

    match result {
        Ok(blocks_read) => {
            paths.finalize()?;
            info!("recovery done, {} blocks read", blocks_read);
            Ok(blocks_read)
        }
        Err(e) => {
            paths.rollback();
            Err(e)
        }
    }
}

/// Итог read-only прохода по каталогу flat-файлов.
#[derive(Debug, Serialize)]
pub struct ScanStats {
    /// Файлов в непрерывной последовательности 0..
    pub files: u32,
    /// Целых записей, включая генезис.
    pub blocks: u64,
    /// Байт в этих записях (с обвязкой).
    pub bytes: u64,
    /// Сообщение о повреждении, остановившем проход (если было).
    pub tail_corruption: Option<String>,
}

/// Пройти flat-файлы сканером без staging и без записи.
/// Повреждение хвоста — не ошибка, а поле отчёта; прочие ошибки наверх.
pub fn scan_blocks_dir(blocks_dir: &Path, network: Network) -> Result<ScanStats, RecoverError> {
    let store = BlockStore::new(blocks_dir.to_path_buf(), network);
    let (files, _) = store.total_size()?;

    let mut stats = ScanStats {
        files,
        blocks: 0,
        bytes: 0,
        tail_corruption: None,
    };

    let mut sc = Scanner::new(&store);
    loop {
        match sc.advance() {
            Ok(ScanStep::End) => break,
            Ok(ScanStep::Block { next, location, .. }) => {
                stats.blocks += 1;
                stats.bytes += u64::from(location.block_len);
                sc = next;
            }
            Err(e) if e.is_corruption() => {
                stats.tail_corruption = Some(e.to_string());
                break;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(stats)
}
