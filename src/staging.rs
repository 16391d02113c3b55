//! staging — crash-safe протокол каталогов восстановления.
//!
//! Роли для базового пути P и сети N:
//! - живая БД:      P/N/
//! - staging-корень: P/recovery/
//! - staged БД:      P/recovery/N/  (старые flat-файлы + старый битый индекс)
//!
//! Инвариант: flat-файлы в каждый момент лежат ровно в одном из {живая,
//! staged} — переносятся только rename-ом (единственная точка передачи
//! владения), никаких copy-then-delete и никаких внешних процессов.
//! По наличию/отсутствию каждого корня прерванный запуск продолжается с
//! правильного шага, данные не теряются.

use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::consts::{BLOCKS_DIR, RECOVERY_DIR};
use crate::errors::RecoverError;
use crate::net::Network;

pub struct RecoveryPaths {
    /// Живая БД (и место для перестроенной): {base}/{network}.
    pub db_path: PathBuf,
    /// Staging-корень: {base}/recovery.
    pub staging_root: PathBuf,
    /// Staged БД: {base}/recovery/{network}.
    pub staged_db: PathBuf,
}

impl RecoveryPaths {
    pub fn new(base: &Path, network: Network) -> Self {
        let staging_root = base.join(RECOVERY_DIR);
        RecoveryPaths {
            db_path: base.join(network.subdir()),
            staged_db: staging_root.join(network.subdir()),
            staging_root,
        }
    }

    /// Каталог flat-файлов перестраиваемой БД.
    pub fn blocks_dir(&self) -> PathBuf {
        self.db_path.join(BLOCKS_DIR)
    }

    /// Каталог flat-файлов в staging (откуда идёт реплей).
    pub fn staged_blocks_dir(&self) -> PathBuf {
        self.staged_db.join(BLOCKS_DIR)
    }

    /// Увести живую БД в staging. Повторный запуск после прерывания —
    /// no-op на уже выполненных шагах.
    pub fn prepare(&self) -> Result<(), RecoverError> {
        if !self.staging_root.exists() {
            if !self.db_path.exists() {
                return Err(RecoverError::NotFound(self.db_path.clone()));
            }
            fs::create_dir_all(&self.staging_root).map_err(|e| {
                RecoverError::Staging(format!(
                    "create {}: {}",
                    self.staging_root.display(),
                    e
                ))
            })?;
        }

        if !self.staged_db.exists() {
            // Staging есть, данных в нём нет: источник обязан существовать.
            if !self.db_path.exists() {
                return Err(RecoverError::NotFound(self.db_path.clone()));
            }
            fs::rename(&self.db_path, &self.staged_db).map_err(|e| {
                RecoverError::Staging(format!(
                    "move {} -> {}: {}",
                    self.db_path.display(),
                    self.staged_db.display(),
                    e
                ))
            })?;
            debug!("staged {} -> {}", self.db_path.display(), self.staged_db.display());
        }

        // Остаток на месте источника (частичный прошлый запуск) — убрать,
        // место нужно под новую БД.
        if self.db_path.exists() {
            fs::remove_dir_all(&self.db_path).map_err(|e| {
                RecoverError::Staging(format!("remove remnant {}: {}", self.db_path.display(), e))
            })?;
        }

        Ok(())
    }

    /// Успех: вернуть flat-файлы rename-ом в новую БД, подчистить опустевший
    /// staging. Непустые остатки (старый индекс) не трогаем — оставляем для
    /// ручного осмотра.
    pub fn finalize(&self) -> Result<(), RecoverError> {
        let from = self.staged_blocks_dir();
        if from.exists() {
            let to = self.blocks_dir();
            fs::rename(&from, &to).map_err(|e| {
                RecoverError::Staging(format!(
                    "move blocks back {} -> {}: {}",
                    from.display(),
                    to.display(),
                    e
                ))
            })?;
        }

        for dir in [&self.staged_db, &self.staging_root] {
            match fs::remove_dir(dir) {
                Ok(()) => debug!("removed empty {}", dir.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(_) => info!(
                    "leftovers kept in {} (old index?), remove manually",
                    dir.display()
                ),
            }
        }
        Ok(())
    }

    /// Провал: убрать частично созданную новую БД, чтобы повтор начинался
    /// с чистого места. Staged-оригинал не трогаем. Best-effort.
    pub fn rollback(&self) {
        if self.db_path.exists() {
            if let Err(e) = fs::remove_dir_all(&self.db_path) {
                warn!("rollback: remove {}: {}", self.db_path.display(), e);
            }
        }
    }
}
