//! scan — чистый сканер последовательности flat-файлов.
//!
//! Сканер восстанавливает границы записей только по раскладке на диске:
//! длина файла — единственная граница валидных данных, переход на следующий
//! файл происходит ровно тогда, когда очередная запись заканчивается на
//! конце текущего файла. Никакого (возможно битого) индекса.
//!
//! Сканер — неизменяемое значение: advance(self) возвращает НОВЫЙ сканер
//! вместе с только что прочитанным блоком и его адресом. Способность чтения
//! инжектируется через RecordSource, скрытого разделяемого состояния нет.

use crate::block::Block;
use crate::errors::RecoverError;
use crate::store::{BlockLocation, RecordSource};
use crate::consts::REC_OVERHEAD;

/// Позиция «читать дальше отсюда». file_len == 0 — длина файла ещё не
/// известна и будет определена пробой файловой системы на следующем advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanCursor {
    pub file_num: u32,
    pub file_off: u32,
    pub file_len: u32,
}

impl ScanCursor {
    /// Начало последовательности: файл 0, смещение 0, длина неизвестна.
    pub fn start() -> Self {
        ScanCursor {
            file_num: 0,
            file_off: 0,
            file_len: 0,
        }
    }
}

/// Результат одного шага сканера.
pub enum ScanStep<'a, S: RecordSource> {
    /// Очередной блок: next — сканер для продолжения, location — адрес
    /// только что прочитанной записи (block_len уже с обвязкой).
    Block {
        next: Scanner<'a, S>,
        block: Block,
        location: BlockLocation,
    },
    /// Конец данных: следующего файла нет (или сканер не привязан к стору).
    End,
}

/// Значение-сканер: ссылка на стор + курсор.
pub struct Scanner<'a, S: RecordSource> {
    src: Option<&'a S>,
    pub cursor: ScanCursor,
}

impl<'a, S: RecordSource> Clone for Scanner<'a, S> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<'a, S: RecordSource> Copy for Scanner<'a, S> {}

impl<'a, S: RecordSource> Scanner<'a, S> {
    pub fn new(src: &'a S) -> Self {
        Scanner {
            src: Some(src),
            cursor: ScanCursor::start(),
        }
    }

    pub fn with_cursor(src: &'a S, cursor: ScanCursor) -> Self {
        Scanner {
            src: Some(src),
            cursor,
        }
    }

    /// Единообразное «пустое» значение: непривязанный сканер сразу даёт End.
    pub fn unbound() -> Self {
        Scanner {
            src: None,
            cursor: ScanCursor::start(),
        }
    }

    /// Один шаг: прочитать запись под курсором и вернуть сканер для следующей.
    ///
    /// End — штатное завершение (нет следующего файла). Corruption и прочие
    /// ошибки различимы для драйвера через RecoverError.
    pub fn advance(self) -> Result<ScanStep<'a, S>, RecoverError> {
        let src = match self.src {
            Some(s) => s,
            None => return Ok(ScanStep::End),
        };

        let mut cur = self.cursor;
        if cur.file_len == 0 {
            match src.file_len(cur.file_num)? {
                // Файла нет — дошли до конца списка.
                None => return Ok(ScanStep::End),
                Some(len) => {
                    cur.file_len = u32::try_from(len).map_err(|_| RecoverError::Corruption {
                        file_num: cur.file_num,
                        file_off: 0,
                        reason: format!("file length {} exceeds u32 range", len),
                    })?;
                }
            }
        }

        // Проверка хеша здесь не запрошена: сверять не с чем, индекс мёртв.
        let payload = src.read_record(cur.file_num, cur.file_off, None)?;

        let block = Block::deserialize(&payload).map_err(|e| RecoverError::Deserialize {
            file_num: cur.file_num,
            file_off: cur.file_off,
            reason: format!("{:#}", e),
        })?;

        let location = BlockLocation {
            file_num: cur.file_num,
            file_off: cur.file_off,
            block_len: payload.len() as u32 + REC_OVERHEAD,
        };

        let next_off = cur.file_off + location.block_len;
        let next = if next_off == cur.file_len {
            // Запись закончилась ровно на конце файла — переходим к следующему,
            // его длину узнаем при следующем advance.
            ScanCursor {
                file_num: cur.file_num + 1,
                file_off: 0,
                file_len: 0,
            }
        } else {
            ScanCursor {
                file_num: cur.file_num,
                file_off: next_off,
                file_len: cur.file_len,
            }
        };

        Ok(ScanStep::Block {
            next: Scanner {
                src: Some(src),
                cursor: next,
            },
            block,
            location,
        })
    }
}
