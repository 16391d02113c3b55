//! Типизированные ошибки восстановления.
//!
//! Таксономия:
//! - NotFound        — обязательный путь отсутствует (источник БД, flat-файл
//!                     посреди последовательности). Наверх без повторов.
//! - Corruption      — запись flat-файла не прошла проверку целостности.
//!                     Единственная «мягкая» ошибка: реплей останавливается
//!                     успешно, валидный префикс уже проигран, хвост отброшен.
//! - Deserialize     — запись структурно цела, но не декодируется как блок.
//!                     Фатально: это несовпадение формата, а не повреждение диска.
//! - Rejected        — внешний валидатор отверг блок. Фатально: порядок
//!                     консенсуса нельзя прерывать посреди последовательности.
//! - Staging         — ошибки переноса/создания/удаления каталогов. Фатально,
//!                     но данные остаются в одном из определённых состояний.
//! - UnknownNetwork  — конфигурационная ошибка CLI.
//! - Io              — прочие ошибки ввода-вывода. Фатально.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecoverError {
    #[error("not found: {0}")]
    NotFound(PathBuf),

    #[error("corrupt record in block file {file_num} at offset {file_off}: {reason}")]
    Corruption {
        file_num: u32,
        file_off: u32,
        reason: String,
    },

    #[error("block deserialize failed in file {file_num} at offset {file_off}: {reason}")]
    Deserialize {
        file_num: u32,
        file_off: u32,
        reason: String,
    },

    #[error("block rejected by validator: {0}")]
    Rejected(#[source] anyhow::Error),

    #[error("staging: {0}")]
    Staging(String),

    #[error("unrecognized network {0:?} (expected \"mainnet\" or \"testnet\")")]
    UnknownNetwork(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RecoverError {
    /// true только для структурного повреждения записи flat-файла.
    /// Драйвер реплея трактует его как «потерян хвост», а не как провал.
    pub fn is_corruption(&self) -> bool {
        matches!(self, RecoverError::Corruption { .. })
    }
}
