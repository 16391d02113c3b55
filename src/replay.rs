//! replay — драйвер восстановления: прогнать каждый блок через
//! инжектированный acceptance-колбэк в физическом порядке flat-файлов.
//!
//! Политика ошибок:
//! - End — успех;
//! - Corruption — тоже успех: доверенный префикс уже проигран, подозрительный
//!   хвост отбрасывается (вызывающий может отдельно усечь flat-файлы);
//! - всё остальное, включая отказ валидатора, — фатально, порядок консенсуса
//!   нельзя прерывать посреди последовательности и перескакивать блок.
//!
//! Конвенция подсчёта (зафиксирована тестами): blocks_read считает ПОПЫТКИ
//! advance после пропуска генезиса, включая попытку, завершившую скан.
//! N корректных записей => blocks_read = N при N-1 вызовах accept;
//! повреждение записи k (1-based) => blocks_read = k-1.

use log::{debug, info};

use crate::block::Block;
use crate::errors::RecoverError;
use crate::scan::{ScanStep, Scanner};
use crate::store::{BlockLocation, RecordSource};

/// Прогнать все блоки из src через accept. Первая запись (сетевой генезис)
/// пропускается: acceptance-сторона знает его заранее и не должна увидеть
/// повторно.
pub fn replay<S, F>(src: &S, mut accept: F) -> Result<u32, RecoverError>
where
    S: RecordSource,
    F: FnMut(&Block, BlockLocation) -> anyhow::Result<()>,
{
    // Пропуск генезиса. Ошибка на этом шаге фатальна всегда, включая
    // повреждение: без читаемого генезиса последовательность не начать.
    let mut sc = match Scanner::new(src).advance()? {
        ScanStep::Block { next, .. } => next,
        ScanStep::End => return Ok(0),
    };

    let mut blocks_read = 0u32;
    loop {
        blocks_read += 1;
        match sc.advance() {
            Ok(ScanStep::End) => break,
            Ok(ScanStep::Block {
                next,
                block,
                location,
            }) => {
                accept(&block, location).map_err(RecoverError::Rejected)?;
                sc = next;
            }
            Err(e) if e.is_corruption() => {
                // Хвост повреждён: останавливаемся успешно на последней
                // целой записи.
                info!("stopping at corrupt tail: {}", e);
                break;
            }
            Err(e) => return Err(e),
        }
    }

    debug!("replay finished, {} advance attempts", blocks_read);
    Ok(blocks_read)
}
